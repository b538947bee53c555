//! Box-counting estimate of the fractal dimension of the infected cells in a grid snapshot.
//!
//! For each box size `s` the lattice is cut into disjoint `s × s` boxes and `N(s)` is the number
//! of boxes holding at least one infected cell. The dimension is the least-squares slope of
//! `log N(s)` against `log(1/s)`.
use rustc_hash::FxHashSet;

use crate::lattice::{CellState, Grid};

/// Box sizes used when the caller has no preference, finest first.
pub const DEFAULT_BOX_SIZES: [usize; 5] = [1, 2, 4, 8, 16];

/// Number of boxes of side `box_size` that contain at least one infected cell. Zero-sized boxes
/// hold nothing.
#[must_use]
pub fn count_occupied_boxes(grid: &Grid, box_size: usize) -> usize {
    if box_size == 0 {
        return 0;
    }
    grid.positions_of(CellState::Infected)
        .map(|(row, col)| (row / box_size, col / box_size))
        .collect::<FxHashSet<_>>()
        .len()
}

/// Estimates the box-counting dimension of the infected cells in `grid`.
///
/// Returns 0 when the grid has no infected cells, and when fewer than two usable
/// `(log(1/s), log N(s))` points exist.
#[must_use]
pub fn estimate_dimension(grid: &Grid, box_sizes: &[usize]) -> f64 {
    if grid.positions_of(CellState::Infected).next().is_none() {
        return 0.0;
    }

    let points: Vec<(f64, f64)> = box_sizes
        .iter()
        .filter(|&&size| size > 0)
        .map(|&size| {
            let boxes = count_occupied_boxes(grid, size);
            ((1.0 / size as f64).ln(), (boxes as f64).ln())
        })
        .collect();

    if points.len() < 2 {
        return 0.0;
    }
    least_squares_slope(&points).unwrap_or(0.0)
}

/// Ordinary least-squares slope through `points`. `None` if all x values coincide.
#[must_use]
pub fn least_squares_slope(points: &[(f64, f64)]) -> Option<f64> {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|&(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|&(_, y)| y).sum::<f64>() / n;

    let (covariance, variance) = points
        .iter()
        .fold((0.0, 0.0), |(cov, var), &(x, y)| {
            let dx = x - mean_x;
            (cov + dx * (y - mean_y), var + dx * dx)
        });

    (variance > 0.0).then(|| covariance / variance)
}
