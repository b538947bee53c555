//! A stochastic lattice model of epidemic spread
//!
//! Each cell of an `N × N` grid is either empty or holds one individual who is susceptible,
//! exposed, infected or recovered. Every step has two phases:
//! * Movement: individuals visit in random order and may hop to an empty neighboring cell.
//! * Transitions: every cell's next state is computed from the lattice as it stood before the
//!   phase, so all cells change at once. Susceptible cells are infected by infected neighbors,
//!   infections clear after a fixed number of steps, and recovered cells may lose immunity.
//!
//! Around the automaton sit the analysis tools:
//! * [`simulation`] runs a parameter set to completion and keeps every snapshot and count.
//! * [`fractal`] estimates the box-counting dimension of the infected cells in a snapshot.
//! * [`sensitivity`] measures that dimension at the infection peak while one parameter varies.
//! * [`report`] writes results as CSV files, and [`runner`] exposes everything on the command
//!   line.
//!
//! ```rust
//! use ixa_lattice::prelude::*;
//!
//! let parameters = ParametersBuilder::default()
//!     .grid_size(20)
//!     .num_steps(10)
//!     .random_seed(42)
//!     .build()
//!     .unwrap();
//! let output = run_simulation(&parameters).unwrap();
//! assert_eq!(output.history.len(), 10);
//! ```
pub mod automaton;
pub mod error;
pub mod fractal;
pub mod lattice;
pub mod log;
pub mod movement;
pub mod parameters;
pub mod prelude;
pub mod random;
pub mod report;
pub mod runner;
pub mod sensitivity;
pub mod simulation;
pub mod transition;

pub use automaton::{EpidemicAutomaton, StateCounts};
pub use error::LatticeError;
pub use lattice::{CellState, Grid};
pub use parameters::{Flavor, Parameters, ParametersBuilder};
