//! Command-line front end.
//!
//! ```text
//! ixa-lattice run --config params.json --output-dir results
//! ixa-lattice sweep --config params.json --parameter movement_rate --values 0,0.25,0.5
//! ```
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};

use crate::automaton::StateCounts;
use crate::error::LatticeError;
use crate::fractal::DEFAULT_BOX_SIZES;
use crate::log::{set_log_level, set_module_filters};
use crate::parameters::{load_parameters, Parameters};
use crate::report::{save_results, write_sensitivity};
use crate::sensitivity::{run_sensitivity, SweepParameter};
use crate::simulation::run_simulation;

#[derive(Parser, Debug)]
#[command(name = "ixa-lattice", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by every subcommand
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Path to a JSON parameter file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Random seed; overrides `random_seed` from the parameter file
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Optional directory for report output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Replace report files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Log level, e.g. `info`, or `module=level` pairs separated by commas
    #[arg(long, default_value = "")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one simulation
    Run {
        #[command(flatten)]
        base: BaseArgs,

        /// Identifier used to name the results directory
        #[arg(long, default_value = "1")]
        id: String,
    },
    /// Measure the fractal dimension at the infection peak across values of one parameter
    Sweep {
        #[command(flatten)]
        base: BaseArgs,

        /// Name of the parameter to vary, e.g. `infection_rate`
        #[arg(short, long)]
        parameter: String,

        /// Comma-separated values to try
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true, allow_negative_numbers = true)]
        values: Vec<f64>,

        /// Comma-separated box sizes for the box-counting estimate
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        box_sizes: Vec<usize>,
    },
}

/// Parses a `--log-level` value. A bare level sets the global level; `module=level` pairs set
/// per-module filters. Both may be mixed: `info,ixa_lattice::movement=trace`.
///
/// # Errors
///
/// Returns `LatticeError::InvalidParameter` for an unrecognized level name.
pub fn parse_log_level(
    value: &str,
) -> Result<(Option<LevelFilter>, Vec<(String, LevelFilter)>), LatticeError> {
    fn level(name: &str) -> Result<LevelFilter, LatticeError> {
        name.trim()
            .parse()
            .map_err(|_| LatticeError::InvalidParameter(format!("unknown log level `{name}`")))
    }

    let mut global = None;
    let mut modules = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            Some((module, name)) => modules.push((module.trim().to_string(), level(name)?)),
            None => global = Some(level(part)?),
        }
    }
    Ok((global, modules))
}

fn configure_logging(value: &str) -> Result<(), LatticeError> {
    let (global, modules) = parse_log_level(value)?;
    if let Some(level) = global {
        set_log_level(level);
    }
    if !modules.is_empty() {
        set_module_filters(&modules);
    }
    Ok(())
}

fn load(base: &BaseArgs) -> Result<Parameters, LatticeError> {
    configure_logging(&base.log_level)?;
    info!("loading parameters from {}", base.config.display());
    let mut parameters = load_parameters(&base.config)?;
    if let Some(seed) = base.random_seed {
        parameters.random_seed = Some(seed);
    }
    Ok(parameters)
}

fn run_command(base: &BaseArgs, id: &str) -> Result<(), LatticeError> {
    let parameters = load(base)?;
    let output = run_simulation(&parameters)?;

    let final_counts = StateCounts::from_grid(output.final_grid(), output.flavor);
    let summary: Vec<String> = final_counts
        .iter()
        .map(|(state, count)| format!("{state}={count}"))
        .collect();
    println!(
        "final counts after {} steps: {}",
        output.history.len(),
        summary.join(" ")
    );
    match output.peak_infection_step() {
        Some(step) => println!("infection peaked at step {}", step + 1),
        None => println!("no steps were run"),
    }

    if let Some(output_dir) = &base.output_dir {
        let path = save_results(output_dir, id, &output, base.overwrite)?;
        println!("results written to {}", path.display());
    }
    Ok(())
}

fn sweep_command(
    base: &BaseArgs,
    parameter: &str,
    values: &[f64],
    box_sizes: &[usize],
) -> Result<(), LatticeError> {
    let parameter = SweepParameter::parse(parameter)?;
    let parameters = load(base)?;
    let box_sizes = if box_sizes.is_empty() {
        &DEFAULT_BOX_SIZES[..]
    } else {
        box_sizes
    };

    let result = run_sensitivity(&parameters, parameter, values, box_sizes)?;
    println!("{parameter}\tdimension");
    for (value, dimension) in result.values.iter().zip(&result.dimensions) {
        println!("{value}\t{dimension:.4}");
    }

    if let Some(output_dir) = &base.output_dir {
        let path = sensitivity_path(output_dir, parameter);
        write_sensitivity(&path, &result, base.overwrite)?;
        println!("results written to {}", path.display());
    }
    Ok(())
}

fn sensitivity_path(output_dir: &Path, parameter: SweepParameter) -> PathBuf {
    output_dir.join(format!("sensitivity_{parameter}.csv"))
}

/// Executes a parsed command line.
///
/// # Errors
///
/// Returns the first error raised while loading parameters, simulating, or writing reports.
pub fn run_with_args(cli: Cli) -> Result<(), LatticeError> {
    match cli.command {
        Command::Run { base, id } => run_command(&base, &id),
        Command::Sweep {
            base,
            parameter,
            values,
            box_sizes,
        } => sweep_command(&base, &parameter, &values, &box_sizes),
    }
}

/// Parses the process arguments and runs the requested command.
///
/// # Errors
///
/// See [`run_with_args`].
pub fn run() -> Result<(), LatticeError> {
    run_with_args(Cli::parse())
}
