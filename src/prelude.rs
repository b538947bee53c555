pub use crate::automaton::{EpidemicAutomaton, StateCounts};
pub use crate::error::LatticeError;
pub use crate::fractal::{estimate_dimension, DEFAULT_BOX_SIZES};
pub use crate::lattice::{CellState, Grid};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{load_parameters, Flavor, Parameters, ParametersBuilder};
pub use crate::report::save_results;
pub use crate::sensitivity::{run_sensitivity, SensitivityResult, SweepParameter};
pub use crate::simulation::{run_simulation, SimulationOutput};
