//! Random number generation for the lattice model.
//!
//! Every automaton owns exactly one generator. Runs are reproducible when the generator is
//! seeded from `Parameters::random_seed`; independent automata never share a generator.
mod sampling_algorithms;

pub use sampling_algorithms::{sample_multiple_from_known_length, sample_single_from_known_length};

use log::trace;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// The generator type owned by an `EpidemicAutomaton`.
pub type LatticeRng = SmallRng;

/// Creates the generator for one simulation. A `Some` seed gives a reproducible stream; `None`
/// draws the seed from the operating system.
pub fn seeded_rng(seed: Option<u64>) -> LatticeRng {
    match seed {
        Some(seed) => {
            trace!("creating new RNG (seed={seed})");
            LatticeRng::seed_from_u64(seed)
        }
        None => {
            trace!("creating new RNG from OS entropy");
            LatticeRng::from_os_rng()
        }
    }
}
