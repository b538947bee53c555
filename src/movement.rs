//! Individual movement. Once per step every individual may hop into an empty cell of its
//! Moore neighborhood.
//!
//! Individuals are visited one at a time in a fresh random order, and each move is applied
//! immediately: a cell vacated earlier in the pass is a valid destination for anyone visited
//! later in the same pass.
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::lattice::{CellState, Lattice};
use crate::random::sample_single_from_known_length;

/// Runs one movement pass over `lattice` and returns the number of individuals that moved.
pub fn move_individuals<R: Rng>(lattice: &mut Lattice, movement_rate: f64, rng: &mut R) -> usize {
    let mut movers: Vec<usize> = (0..lattice.grid().len())
        .filter(|&ix| lattice.state(ix).is_occupied())
        .collect();
    movers.shuffle(rng);

    let mut moves = 0;
    let mut empty_neighbors = Vec::with_capacity(8);
    for from in movers {
        if rng.random::<f64>() >= movement_rate {
            continue;
        }

        empty_neighbors.clear();
        empty_neighbors.extend(
            lattice
                .grid()
                .moore_neighbors(from)
                .filter(|&ix| lattice.state(ix) == CellState::Empty),
        );

        if let Some(&to) = sample_single_from_known_length(rng, empty_neighbors.iter()) {
            lattice.relocate(from, to);
            moves += 1;
        }
    }

    trace!("movement pass moved {moves} individuals");
    moves
}
