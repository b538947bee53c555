//! The epidemic automaton: a lattice of individuals, a rule set and the generator that drives
//! both movement and transitions.
//!
//! ```rust
//! use ixa_lattice::automaton::EpidemicAutomaton;
//! use ixa_lattice::lattice::CellState;
//! use ixa_lattice::parameters::ParametersBuilder;
//!
//! let parameters = ParametersBuilder::default()
//!     .grid_size(20)
//!     .random_seed(42)
//!     .build()
//!     .unwrap();
//! let mut automaton = EpidemicAutomaton::new(&parameters).unwrap();
//! automaton.initialize_random_infection(3).unwrap();
//! for _ in 0..10 {
//!     automaton.step();
//! }
//! assert_eq!(automaton.get_state_counts().total(), 400);
//! ```
use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::error::LatticeError;
use crate::lattice::{CellState, Grid, Lattice};
use crate::movement::move_individuals;
use crate::parameters::{Flavor, Parameters};
use crate::random::{sample_multiple_from_known_length, seeded_rng, LatticeRng};
use crate::transition::TransitionRules;

/// Number of cells in each state defined for a flavor. Always sums to `grid_size²`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateCounts(BTreeMap<CellState, usize>);

impl StateCounts {
    /// Counts the states of `grid` that exist in `flavor`.
    #[must_use]
    pub fn from_grid(grid: &Grid, flavor: Flavor) -> Self {
        let mut counts: BTreeMap<CellState, usize> = flavor_states(flavor)
            .into_iter()
            .map(|state| (state, 0))
            .collect();
        for &state in grid.cells() {
            *counts.entry(state).or_insert(0) += 1;
        }
        StateCounts(counts)
    }

    /// Count for `state`; zero for states the flavor does not define.
    #[must_use]
    pub fn get(&self, state: CellState) -> usize {
        self.0.get(&state).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellState, usize)> + '_ {
        self.0.iter().map(|(&state, &count)| (state, count))
    }
}

/// The states an automaton of `flavor` can hold, in report column order.
#[must_use]
pub fn flavor_states(flavor: Flavor) -> Vec<CellState> {
    CellState::iter()
        .filter(|&state| flavor == Flavor::Seir || state != CellState::Exposed)
        .collect()
}

pub struct EpidemicAutomaton {
    parameters: Parameters,
    rules: TransitionRules,
    lattice: Lattice,
    rng: LatticeRng,
    steps_taken: usize,
}

impl EpidemicAutomaton {
    /// Builds an automaton whose generator is seeded from `parameters.random_seed` (or from the
    /// operating system when no seed is set) and places the population.
    ///
    /// # Errors
    ///
    /// Returns `LatticeError::InvalidParameter` if the parameters fail validation.
    pub fn new(parameters: &Parameters) -> Result<Self, LatticeError> {
        Self::with_rng(parameters, seeded_rng(parameters.random_seed))
    }

    /// Builds an automaton that draws from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `LatticeError::InvalidParameter` if the parameters fail validation.
    pub fn with_rng(parameters: &Parameters, rng: LatticeRng) -> Result<Self, LatticeError> {
        parameters.validate()?;
        let mut automaton = EpidemicAutomaton {
            parameters: parameters.clone(),
            rules: TransitionRules::from_parameters(parameters),
            lattice: Lattice::new(parameters.grid_size),
            rng,
            steps_taken: 0,
        };
        automaton.initialize_population();
        debug!(
            "created {:?} automaton: {}x{} lattice, {} individuals",
            automaton.flavor(),
            parameters.grid_size,
            parameters.grid_size,
            automaton.population()
        );
        Ok(automaton)
    }

    /// Empties `round(size² × (1 − population_density))` cells chosen uniformly without
    /// replacement. Every other cell holds a susceptible individual. Calling this again discards
    /// the current lattice, including any seeded infections.
    pub fn initialize_population(&mut self) {
        self.lattice = Lattice::new(self.parameters.grid_size);
        let cells = self.lattice.grid().len();
        let empty = self.parameters.empty_cells();
        for index in sample_multiple_from_known_length(&mut self.rng, 0..cells, empty) {
            self.lattice.clear(index);
        }
    }

    /// Puts `num_infected` individuals, chosen uniformly without replacement, into the seed state
    /// (infected for SIR, exposed for SEIR).
    ///
    /// # Errors
    ///
    /// Returns `LatticeError::InsufficientPopulation` without touching the lattice if
    /// `num_infected` exceeds the number of individuals.
    pub fn initialize_random_infection(&mut self, num_infected: usize) -> Result<(), LatticeError> {
        let individuals: Vec<usize> = (0..self.lattice.grid().len())
            .filter(|&ix| self.lattice.state(ix).is_occupied())
            .collect();
        if num_infected > individuals.len() {
            return Err(LatticeError::InsufficientPopulation {
                requested: num_infected,
                available: individuals.len(),
            });
        }

        let seed_state = self.rules.infection_entry_state();
        let chosen =
            sample_multiple_from_known_length(&mut self.rng, individuals.into_iter(), num_infected);
        for index in chosen {
            self.lattice.enter_state(index, seed_state);
        }
        debug!("seeded {num_infected} individuals as {seed_state}");
        Ok(())
    }

    /// Puts the individual at `(row, col)` into the seed state.
    ///
    /// # Errors
    ///
    /// Returns `LatticeError::InvalidCell` if the coordinate is outside the lattice or empty.
    pub fn seed_infection_at(&mut self, row: usize, col: usize) -> Result<(), LatticeError> {
        let size = self.lattice.size();
        if row >= size || col >= size {
            return Err(LatticeError::InvalidCell { row, col });
        }
        let index = self.lattice.grid().index(row, col);
        if !self.lattice.state(index).is_occupied() {
            return Err(LatticeError::InvalidCell { row, col });
        }
        self.lattice.enter_state(index, self.rules.infection_entry_state());
        Ok(())
    }

    /// Advances one step: a movement pass, then a synchronous transition pass.
    pub fn step(&mut self) {
        move_individuals(
            &mut self.lattice,
            self.parameters.movement_rate,
            &mut self.rng,
        );
        self.rules.apply(&mut self.lattice, &mut self.rng);
        self.steps_taken += 1;
    }

    #[must_use]
    pub fn get_state_counts(&self) -> StateCounts {
        StateCounts::from_grid(self.lattice.grid(), self.flavor())
    }

    /// Borrow the current state grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.lattice.grid()
    }

    /// An owned copy of the current state grid.
    #[must_use]
    pub fn snapshot(&self) -> Grid {
        self.lattice.grid().clone()
    }

    #[must_use]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn flavor(&self) -> Flavor {
        self.rules.flavor()
    }

    /// Number of individuals (non-empty cells). Fixed for the automaton's lifetime.
    #[must_use]
    pub fn population(&self) -> usize {
        self.lattice.grid().len() - self.parameters.empty_cells()
    }

    #[must_use]
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParametersBuilder;

    fn parameters(density: f64) -> Parameters {
        ParametersBuilder::default()
            .grid_size(10)
            .population_density(density)
            .random_seed(7)
            .build()
            .unwrap()
    }

    #[test]
    fn population_matches_density() {
        let automaton = EpidemicAutomaton::new(&parameters(0.75)).unwrap();
        let counts = automaton.get_state_counts();
        assert_eq!(counts.get(CellState::Empty), 25);
        assert_eq!(counts.get(CellState::Susceptible), 75);
        assert_eq!(automaton.population(), 75);
        assert_eq!(counts.total(), 100);
    }

    #[test]
    fn sir_counts_omit_exposed() {
        let automaton = EpidemicAutomaton::new(&parameters(0.5)).unwrap();
        let states: Vec<_> = automaton.get_state_counts().iter().map(|(s, _)| s).collect();
        assert_eq!(
            states,
            vec![
                CellState::Susceptible,
                CellState::Infected,
                CellState::Recovered,
                CellState::Empty
            ]
        );
    }

    #[test]
    fn seeding_checks_population_first() {
        let mut automaton = EpidemicAutomaton::new(&parameters(0.5)).unwrap();
        let before = automaton.snapshot();
        let err = automaton.initialize_random_infection(51).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::InsufficientPopulation {
                requested: 51,
                available: 50
            }
        ));
        assert_eq!(automaton.grid(), &before);

        automaton.initialize_random_infection(50).unwrap();
        assert_eq!(automaton.get_state_counts().get(CellState::Infected), 50);
    }

    #[test]
    fn seeding_zero_is_a_no_op() {
        let mut automaton = EpidemicAutomaton::new(&parameters(0.5)).unwrap();
        let before = automaton.snapshot();
        automaton.initialize_random_infection(0).unwrap();
        assert_eq!(automaton.grid(), &before);
    }

    #[test]
    fn seir_seeds_exposed() {
        let parameters = ParametersBuilder::default()
            .grid_size(10)
            .exposed_time(2)
            .random_seed(3)
            .build()
            .unwrap();
        let mut automaton = EpidemicAutomaton::new(&parameters).unwrap();
        automaton.initialize_random_infection(4).unwrap();
        let counts = automaton.get_state_counts();
        assert_eq!(counts.get(CellState::Exposed), 4);
        assert_eq!(counts.get(CellState::Infected), 0);
    }

    #[test]
    fn reseeding_a_recovered_individual_clears_its_immunity() {
        let parameters = ParametersBuilder::default()
            .grid_size(1)
            .population_density(1.0)
            .movement_rate(0.0)
            .recovery_time(1)
            .immunity_loss_rate(0.1)
            .random_seed(2)
            .build()
            .unwrap();

        let mut random = EpidemicAutomaton::new(&parameters).unwrap();
        let mut targeted = EpidemicAutomaton::new(&parameters).unwrap();
        for automaton in [&mut random, &mut targeted] {
            automaton.initialize_random_infection(1).unwrap();
            for _ in 0..3 {
                automaton.step();
            }
            assert_eq!(automaton.grid().get(0, 0), CellState::Recovered);
            assert_eq!(automaton.lattice().immune_duration(0), 2);
        }

        random.initialize_random_infection(1).unwrap();
        targeted.seed_infection_at(0, 0).unwrap();
        for automaton in [&random, &targeted] {
            assert_eq!(automaton.grid().get(0, 0), CellState::Infected);
            assert_eq!(automaton.lattice().infected_duration(0), 0);
            assert_eq!(automaton.lattice().immune_duration(0), 0);
        }
    }

    #[test]
    fn seed_infection_at_rejects_bad_cells() {
        let mut automaton = EpidemicAutomaton::new(&parameters(0.5)).unwrap();
        assert!(matches!(
            automaton.seed_infection_at(10, 0),
            Err(LatticeError::InvalidCell { row: 10, col: 0 })
        ));
        let (row, col) = automaton
            .grid()
            .positions_of(CellState::Empty)
            .next()
            .unwrap();
        assert!(automaton.seed_infection_at(row, col).is_err());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let parameters = ParametersBuilder::default().grid_size(0).build().unwrap();
        assert!(matches!(
            EpidemicAutomaton::new(&parameters),
            Err(LatticeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn same_seed_same_run() {
        let run = || {
            let mut automaton = EpidemicAutomaton::new(&parameters(0.8)).unwrap();
            automaton.initialize_random_infection(5).unwrap();
            for _ in 0..20 {
                automaton.step();
            }
            automaton.snapshot()
        };
        assert_eq!(run(), run());
    }
}
