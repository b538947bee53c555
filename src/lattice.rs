//! Lattice storage: the square grid of cell states and the per-cell duration counters.
//!
//! States live in a [`Grid`], which doubles as the snapshot type handed to callers and to the
//! fractal estimator. Counters are kept as separate arrays alongside it and are meaningful only
//! while the cell is in the matching state.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::LatticeError;

/// The state of one lattice cell. `Susceptible` is the zero state every cell starts in.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CellState {
    #[default]
    Susceptible,
    Exposed,
    Infected,
    Recovered,
    Empty,
}

impl CellState {
    /// Numeric code used when a grid is written out as a matrix.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            CellState::Susceptible => 0,
            CellState::Exposed => 1,
            CellState::Infected => 2,
            CellState::Recovered => 3,
            CellState::Empty => 4,
        }
    }

    /// Whether the cell holds an individual.
    #[must_use]
    pub fn is_occupied(self) -> bool {
        self != CellState::Empty
    }
}

/// A square grid of cell states in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    size: usize,
    cells: Vec<CellState>,
}

// Deserialized form of `Grid`, checked before it becomes one.
#[derive(Deserialize)]
struct RawGrid {
    size: usize,
    cells: Vec<CellState>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = LatticeError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        if raw.size.checked_mul(raw.size) != Some(raw.cells.len()) {
            return Err(LatticeError::LatticeError(format!(
                "a {0}x{0} grid cannot hold {1} cells",
                raw.size,
                raw.cells.len()
            )));
        }
        Ok(Grid {
            size: raw.size,
            cells: raw.cells,
        })
    }
}

impl Grid {
    /// A `size × size` grid of susceptible cells.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Grid {
            size,
            cells: vec![CellState::default(); size * size],
        }
    }

    /// Builds a grid from its rows.
    ///
    /// # Errors
    ///
    /// Returns an error unless every row is as long as there are rows.
    pub fn from_rows(rows: Vec<Vec<CellState>>) -> Result<Self, LatticeError> {
        let size = rows.len();
        if let Some(row) = rows.iter().position(|r| r.len() != size) {
            return Err(LatticeError::LatticeError(format!(
                "row {row} of a {size}-row grid has {} cells",
                rows[row].len()
            )));
        }
        Ok(Grid {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Side length.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells, `size²`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    #[inline]
    #[must_use]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.size, index % self.size)
    }

    /// Get the state at `(row, col)`. Panics if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> CellState {
        self.cells[self.index(row, col)]
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize, state: CellState) {
        self.cells[index] = state;
    }

    /// Get the Grid's cell slice in row-major order.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Iterate over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        // `max(1)` keeps `chunks` well defined on a zero-sized grid.
        self.cells.chunks(self.size.max(1))
    }

    #[must_use]
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&s| s == state).count()
    }

    /// Coordinates of every cell in `state`, in row-major order.
    pub fn positions_of(&self, state: CellState) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, &s)| s == state)
            .map(move |(ix, _)| self.coords(ix))
    }

    /// Indices of the up-to-8 cells around `index`, clipped at the lattice boundary. The cell
    /// itself is not included.
    pub fn moore_neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let size = self.size;
        let (row, col) = self.coords(index);
        let rows = row.saturating_sub(1)..(row + 2).min(size);
        rows.flat_map(move |r| {
            let cols = col.saturating_sub(1)..(col + 2).min(size);
            cols.map(move |c| (r, c))
        })
        .filter(move |&(r, c)| (r, c) != (row, col))
        .map(move |(r, c)| r * size + c)
    }
}

/// Cell states plus the duration counters the transition rules need.
#[derive(Clone, Debug)]
pub struct Lattice {
    grid: Grid,
    infected_duration: Vec<u32>,
    exposed_duration: Vec<u32>,
    immune_duration: Vec<u32>,
}

impl Lattice {
    /// A lattice of susceptible cells with all counters at zero.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let cells = size * size;
        Lattice {
            grid: Grid::new(size),
            infected_duration: vec![0; cells],
            exposed_duration: vec![0; cells],
            immune_duration: vec![0; cells],
        }
    }

    #[inline]
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    #[inline]
    #[must_use]
    pub fn state(&self, index: usize) -> CellState {
        self.grid.cells[index]
    }

    #[inline]
    #[must_use]
    pub fn infected_duration(&self, index: usize) -> u32 {
        self.infected_duration[index]
    }

    #[inline]
    #[must_use]
    pub fn exposed_duration(&self, index: usize) -> u32 {
        self.exposed_duration[index]
    }

    #[inline]
    #[must_use]
    pub fn immune_duration(&self, index: usize) -> u32 {
        self.immune_duration[index]
    }

    /// Puts `index` into `state`, zeroing the counter of the state it leaves and of the one it
    /// enters.
    pub(crate) fn enter_state(&mut self, index: usize, state: CellState) {
        let previous = self.grid.cells[index];
        self.reset_counter_for(index, previous);
        self.grid.set(index, state);
        self.reset_counter_for(index, state);
    }

    pub(crate) fn reset_counter_for(&mut self, index: usize, state: CellState) {
        match state {
            CellState::Infected => self.infected_duration[index] = 0,
            CellState::Exposed => self.exposed_duration[index] = 0,
            CellState::Recovered => self.immune_duration[index] = 0,
            CellState::Susceptible | CellState::Empty => {}
        }
    }

    /// Increments the counter for `state` at `index` and returns its new value.
    pub(crate) fn tick(&mut self, index: usize, state: CellState) -> u32 {
        let counter = match state {
            CellState::Infected => &mut self.infected_duration[index],
            CellState::Exposed => &mut self.exposed_duration[index],
            CellState::Recovered => &mut self.immune_duration[index],
            CellState::Susceptible | CellState::Empty => return 0,
        };
        *counter += 1;
        *counter
    }

    /// Moves the individual at `from` into the empty cell `to`, carrying its state and counters.
    /// `from` becomes empty with zeroed counters.
    pub(crate) fn relocate(&mut self, from: usize, to: usize) {
        debug_assert!(self.grid.cells[from].is_occupied());
        debug_assert_eq!(self.grid.cells[to], CellState::Empty);

        self.grid.cells[to] = self.grid.cells[from];
        self.grid.cells[from] = CellState::Empty;
        for counters in [
            &mut self.infected_duration,
            &mut self.exposed_duration,
            &mut self.immune_duration,
        ] {
            counters[to] = counters[from];
            counters[from] = 0;
        }
    }

    /// Replaces every state at once with `next`. The grid sizes must match.
    pub(crate) fn commit(&mut self, next: Grid) {
        debug_assert_eq!(next.size, self.grid.size);
        self.grid = next;
    }

    /// Sets `index` to empty and zeroes all of its counters.
    pub(crate) fn clear(&mut self, index: usize) {
        self.grid.set(index, CellState::Empty);
        self.infected_duration[index] = 0;
        self.exposed_duration[index] = 0;
        self.immune_duration[index] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moore_neighbors_clip_at_corners_and_edges() {
        let grid = Grid::new(5);
        assert_eq!(grid.moore_neighbors(grid.index(0, 0)).count(), 3);
        assert_eq!(grid.moore_neighbors(grid.index(4, 4)).count(), 3);
        assert_eq!(grid.moore_neighbors(grid.index(0, 2)).count(), 5);
        assert_eq!(grid.moore_neighbors(grid.index(2, 2)).count(), 8);

        let mut neighbors: Vec<_> = grid
            .moore_neighbors(grid.index(0, 0))
            .map(|ix| grid.coords(ix))
            .collect();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn single_cell_grid_has_no_neighbors() {
        let grid = Grid::new(1);
        assert_eq!(grid.moore_neighbors(0).count(), 0);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        use CellState::{Empty as E, Susceptible as S};
        assert!(Grid::from_rows(vec![vec![S, E], vec![S]]).is_err());
        let grid = Grid::from_rows(vec![vec![S, E], vec![E, S]]).unwrap();
        assert_eq!(grid.get(0, 1), E);
        assert_eq!(grid.count(E), 2);
    }

    #[test]
    fn deserialized_grids_must_be_square() {
        let grid = Grid::from_rows(vec![
            vec![CellState::Infected, CellState::Empty],
            vec![CellState::Susceptible, CellState::Recovered],
        ])
        .unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), grid);

        let short = r#"{"size":3,"cells":["infected","empty"]}"#;
        assert!(serde_json::from_str::<Grid>(short).is_err());
    }

    #[test]
    fn relocate_carries_counters() {
        let mut lattice = Lattice::new(3);
        lattice.clear(4);
        lattice.enter_state(0, CellState::Infected);
        lattice.tick(0, CellState::Infected);
        lattice.tick(0, CellState::Infected);

        lattice.relocate(0, 4);
        assert_eq!(lattice.state(0), CellState::Empty);
        assert_eq!(lattice.infected_duration(0), 0);
        assert_eq!(lattice.state(4), CellState::Infected);
        assert_eq!(lattice.infected_duration(4), 2);
    }

    #[test]
    fn entering_a_state_zeroes_the_counter_left_behind() {
        let mut lattice = Lattice::new(1);
        lattice.enter_state(0, CellState::Recovered);
        lattice.tick(0, CellState::Recovered);
        lattice.tick(0, CellState::Recovered);
        assert_eq!(lattice.immune_duration(0), 2);

        lattice.enter_state(0, CellState::Infected);
        assert_eq!(lattice.immune_duration(0), 0);
        assert_eq!(lattice.infected_duration(0), 0);
    }

    #[test]
    fn state_names_are_snake_case() {
        assert_eq!(CellState::Susceptible.to_string(), "susceptible");
        let name: &'static str = CellState::Empty.into();
        assert_eq!(name, "empty");
    }
}
