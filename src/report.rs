//! CSV output for simulation results: per-step state counts, grid snapshots, and sensitivity
//! sweeps. Plots and animations are produced elsewhere from these files.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;
use serde::Serialize;

use crate::automaton::{flavor_states, StateCounts};
use crate::error::LatticeError;
use crate::lattice::Grid;
use crate::parameters::Flavor;
use crate::sensitivity::SensitivityResult;
use crate::simulation::SimulationOutput;

/// Counts file written by [`save_results`].
pub const COUNTS_FILE: &str = "data.csv";
/// Final grid file written by [`save_results`].
pub const FINAL_GRID_FILE: &str = "final_grid.csv";

// Checks that the path is valid. Creates the file and all parent directories if they do not
// exist. Returns the file if successful.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, LatticeError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            if !overwrite && path.exists() {
                return Err(LatticeError::ReportError(format!(
                    "{} already exists; pass `overwrite` to replace it",
                    path.display()
                )));
            }
            Ok(File::create(path)?)
        }
        _ => Err(LatticeError::ReportError(format!(
            "report output files must be CSVs, got {}",
            path.display()
        ))),
    }
}

fn open_writer(path: &Path, overwrite: bool) -> Result<Writer<File>, LatticeError> {
    let file = generate_validate_filepath(path, overwrite)?;
    Ok(Writer::from_writer(file))
}

/// Writes one row per step: `step` followed by the count of every state `flavor` defines.
/// Steps are numbered from 1.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_counts(
    path: &Path,
    flavor: Flavor,
    counts: &[StateCounts],
    overwrite: bool,
) -> Result<(), LatticeError> {
    let states = flavor_states(flavor);
    let mut writer = open_writer(path, overwrite)?;

    let mut header = vec!["step".to_string()];
    header.extend(states.iter().map(ToString::to_string));
    writer.write_record(&header)?;

    for (step, step_counts) in counts.iter().enumerate() {
        let mut record = vec![(step + 1).to_string()];
        record.extend(states.iter().map(|&state| step_counts.get(state).to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `grid` as a matrix of state codes, one CSV row per lattice row.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_grid(path: &Path, grid: &Grid, overwrite: bool) -> Result<(), LatticeError> {
    let mut writer = open_writer(path, overwrite)?;
    for row in grid.rows() {
        writer.write_record(row.iter().map(|state| state.code().to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct SensitivityRow {
    value: f64,
    dimension: f64,
    peak_step: Option<usize>,
}

/// Writes `value,dimension,peak_step` rows for a sweep.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_sensitivity(
    path: &Path,
    result: &SensitivityResult,
    overwrite: bool,
) -> Result<(), LatticeError> {
    let mut writer = open_writer(path, overwrite)?;
    for ((&value, &dimension), &peak_step) in result
        .values
        .iter()
        .zip(&result.dimensions)
        .zip(&result.peak_steps)
    {
        writer.serialize(SensitivityRow {
            value,
            dimension,
            peak_step,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the counts and the final grid of a run into `<output_dir>/simulation_<id>/` and returns
/// that directory.
///
/// # Errors
///
/// Returns an error if any file cannot be created or written.
pub fn save_results(
    output_dir: &Path,
    simulation_id: &str,
    output: &SimulationOutput,
    overwrite: bool,
) -> Result<PathBuf, LatticeError> {
    let results_path = output_dir.join(format!("simulation_{simulation_id}"));
    write_counts(
        &results_path.join(COUNTS_FILE),
        output.flavor,
        &output.counts,
        overwrite,
    )?;
    write_grid(
        &results_path.join(FINAL_GRID_FILE),
        output.final_grid(),
        overwrite,
    )?;
    info!("results of simulation {simulation_id} saved to {}", results_path.display());
    Ok(results_path)
}
