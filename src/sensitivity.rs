//! Parameter sensitivity of outbreak geometry.
//!
//! For each candidate value of one parameter a fresh automaton is built from the base
//! parameters with that single field replaced, run to completion, and the fractal dimension of
//! the infected cells is measured at the step where the infected count peaks. Every run uses the
//! same seed, so differences between runs come from the parameter alone.
use std::str::FromStr;

use log::{debug, info, warn};
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::LatticeError;
use crate::fractal::estimate_dimension;
use crate::lattice::{CellState, Grid};
use crate::parameters::Parameters;
use crate::simulation::{run_simulation_with, seeded_automaton};

/// Seed used for every run of a sweep whose base parameters do not set one.
pub const DEFAULT_SWEEP_SEED: u64 = 0;

/// The fields of `Parameters` a sweep can vary.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SweepParameter {
    GridSize,
    InfectionRate,
    RecoveryTime,
    ExposedTime,
    ImmunityLossRate,
    PopulationDensity,
    MovementRate,
    InitialInfected,
}

impl SweepParameter {
    /// Parses a parameter name such as `"movement_rate"`.
    ///
    /// # Errors
    ///
    /// Returns `LatticeError::UnknownParameter` for names that are not sweepable fields.
    pub fn parse(name: &str) -> Result<Self, LatticeError> {
        SweepParameter::from_str(name).map_err(|_| LatticeError::UnknownParameter(name.to_string()))
    }

    /// Returns a copy of `base` with this field set to `value`.
    ///
    /// # Errors
    ///
    /// Returns `LatticeError::InvalidParameter` if an integer field gets a negative or
    /// fractional value.
    pub fn apply(self, base: &Parameters, value: f64) -> Result<Parameters, LatticeError> {
        let mut parameters = base.clone();
        match self {
            SweepParameter::GridSize => parameters.grid_size = self.as_integer(value)?,
            SweepParameter::InfectionRate => parameters.infection_rate = value,
            SweepParameter::RecoveryTime => parameters.recovery_time = self.as_integer(value)?,
            SweepParameter::ExposedTime => parameters.exposed_time = Some(self.as_integer(value)?),
            SweepParameter::ImmunityLossRate => parameters.immunity_loss_rate = value,
            SweepParameter::PopulationDensity => parameters.population_density = value,
            SweepParameter::MovementRate => parameters.movement_rate = value,
            SweepParameter::InitialInfected => {
                parameters.initial_infected = self.as_integer(value)?;
            }
        }
        Ok(parameters)
    }

    fn as_integer<T: TryFrom<u64>>(self, value: f64) -> Result<T, LatticeError> {
        let invalid = || {
            LatticeError::InvalidParameter(format!(
                "{self} takes non-negative integer values, got {value}"
            ))
        };
        if !(value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64) {
            return Err(invalid());
        }
        T::try_from(value as u64).map_err(|_| invalid())
    }
}

/// Parallel arrays of the values tried and what each produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensitivityResult {
    pub parameter: SweepParameter,
    pub values: Vec<f64>,
    pub dimensions: Vec<f64>,
    /// Zero-based step index of the infection peak, `None` for runs of zero steps.
    pub peak_steps: Vec<Option<usize>>,
}

/// Runs one simulation per entry of `values` and measures the box-counting dimension at each
/// run's infection peak.
///
/// # Errors
///
/// Returns the first error from applying a value or running a simulation; no partial result
/// is returned.
pub fn run_sensitivity(
    base: &Parameters,
    parameter: SweepParameter,
    values: &[f64],
    box_sizes: &[usize],
) -> Result<SensitivityResult, LatticeError> {
    if values.is_empty() {
        warn!("sensitivity sweep over {parameter} has no values");
    }

    let mut base = base.clone();
    let seed = *base.random_seed.get_or_insert(DEFAULT_SWEEP_SEED);
    info!(
        "sweeping {parameter} over {} values (seed {seed})",
        values.len()
    );

    let mut result = SensitivityResult {
        parameter,
        values: Vec::with_capacity(values.len()),
        dimensions: Vec::with_capacity(values.len()),
        peak_steps: Vec::with_capacity(values.len()),
    };
    for &value in values {
        let parameters = parameter.apply(&base, value)?;
        let (peak_step, peak_grid) = find_peak(&parameters)?;
        let dimension = estimate_dimension(&peak_grid, box_sizes);
        debug!("{parameter} = {value}: peak at step {peak_step:?}, dimension {dimension}");

        result.values.push(value);
        result.dimensions.push(dimension);
        result.peak_steps.push(peak_step);
    }
    Ok(result)
}

/// Runs `parameters` and returns the first step at which the infected count is largest with the
/// snapshot at that step. Only the current best snapshot is kept. With zero steps the seeded
/// lattice is returned.
///
/// # Errors
///
/// Returns an error if the automaton cannot be built or seeded.
pub fn find_peak(parameters: &Parameters) -> Result<(Option<usize>, Grid), LatticeError> {
    if parameters.num_steps == 0 {
        return Ok((None, seeded_automaton(parameters)?.snapshot()));
    }

    let mut peak: Option<(usize, usize, Grid)> = None;
    run_simulation_with(parameters, |step, automaton| {
        let infected = automaton.get_state_counts().get(CellState::Infected);
        if peak.as_ref().is_none_or(|(_, max, _)| infected > *max) {
            peak = Some((step, infected, automaton.snapshot()));
        }
    })?;

    match peak {
        Some((step, _, grid)) => Ok((Some(step), grid)),
        None => Err("a run with steps recorded no peak".into()),
    }
}
