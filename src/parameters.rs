//! Model configuration. A `Parameters` value is usually loaded from a JSON file with
//! [`load_parameters`] or assembled in code with [`ParametersBuilder`].
//!
//! ```json
//! {
//!     "grid_size": 50,
//!     "infection_rate": 0.3,
//!     "recovery_time": 5,
//!     "exposed_time": 2,
//!     "immunity_loss_rate": 0.05,
//!     "population_density": 0.8,
//!     "movement_rate": 0.2,
//!     "initial_infected": 5,
//!     "num_steps": 100,
//!     "random_seed": 42
//! }
//! ```
use std::fs;
use std::path::Path;

use derive_builder::Builder;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::LatticeError;

/// Which compartment model the automaton runs. The trailing "S" (waning immunity) is
/// orthogonal to the flavor and is switched on by a positive `immunity_loss_rate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    /// Susceptible, infected, recovered.
    Sir,
    /// Susceptible, exposed, infected, recovered.
    Seir,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
pub struct Parameters {
    /// Side length of the square lattice.
    #[builder(default = "50")]
    pub grid_size: usize,

    /// Per-infected-neighbor transmission probability per step.
    #[builder(default = "0.3")]
    pub infection_rate: f64,

    /// Steps an individual stays infected before recovering.
    #[builder(default = "5")]
    pub recovery_time: u32,

    /// Steps an individual stays exposed before becoming infectious. Its presence selects the
    /// SEIR flavor.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub exposed_time: Option<u32>,

    /// Rate at which recovered individuals lose immunity; 0 makes recovery permanent.
    #[builder(default = "0.0")]
    #[serde(default)]
    pub immunity_loss_rate: f64,

    /// Fraction of cells holding an individual.
    #[builder(default = "0.8")]
    pub population_density: f64,

    /// Per-step probability that an individual tries to move.
    #[builder(default = "0.2")]
    pub movement_rate: f64,

    #[builder(default = "5")]
    pub initial_infected: usize,

    #[builder(default = "100")]
    pub num_steps: usize,

    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for Parameters {
    fn default() -> Self {
        ParametersBuilder::default()
            .build()
            .expect("every builder field has a default")
    }
}

impl Parameters {
    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns `LatticeError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), LatticeError> {
        fn invalid(msg: String) -> Result<(), LatticeError> {
            Err(LatticeError::InvalidParameter(msg))
        }

        if self.grid_size == 0 {
            return invalid("grid_size must be positive".to_string());
        }
        if self.grid_size.checked_mul(self.grid_size).is_none() {
            return invalid(format!(
                "grid_size {} is too large: its cell count overflows",
                self.grid_size
            ));
        }
        if !(self.infection_rate > 0.0 && self.infection_rate <= 1.0) {
            return invalid(format!(
                "infection_rate must be in (0, 1], got {}",
                self.infection_rate
            ));
        }
        if self.recovery_time == 0 {
            return invalid("recovery_time must be positive".to_string());
        }
        if self.exposed_time == Some(0) {
            return invalid("exposed_time must be positive".to_string());
        }
        if !(self.immunity_loss_rate >= 0.0 && self.immunity_loss_rate.is_finite()) {
            return invalid(format!(
                "immunity_loss_rate must be a finite value >= 0, got {}",
                self.immunity_loss_rate
            ));
        }
        if !(self.population_density > 0.0 && self.population_density <= 1.0) {
            return invalid(format!(
                "population_density must be in (0, 1], got {}",
                self.population_density
            ));
        }
        if !(0.0..=1.0).contains(&self.movement_rate) {
            return invalid(format!(
                "movement_rate must be in [0, 1], got {}",
                self.movement_rate
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn flavor(&self) -> Flavor {
        if self.exposed_time.is_some() {
            Flavor::Seir
        } else {
            Flavor::Sir
        }
    }

    /// Number of steps a recovered individual stays immune, as a real-valued threshold.
    /// `None` when immunity is permanent.
    #[must_use]
    pub fn immunity_threshold(&self) -> Option<f64> {
        (self.immunity_loss_rate > 0.0).then(|| 1.0 / self.immunity_loss_rate)
    }

    /// Number of cells left empty on a lattice built from these parameters.
    #[must_use]
    pub fn empty_cells(&self) -> usize {
        let cells = self.grid_size * self.grid_size;
        let empty = (cells as f64 * (1.0 - self.population_density)).round() as usize;
        empty.min(cells)
    }
}

/// Reads a JSON parameter file and validates it.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON for `Parameters`, or holds an
/// out-of-range value.
pub fn load_parameters(path: &Path) -> Result<Parameters, LatticeError> {
    debug!("loading parameters from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let parameters: Parameters = serde_json::from_str(&contents)?;
    parameters.validate()?;
    Ok(parameters)
}
