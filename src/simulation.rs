//! Full runs: build an automaton from a `Parameters` value, seed it, and step it `num_steps`
//! times while collecting what reports and plots consume.
use log::{info, warn};
use serde::Serialize;

use crate::automaton::{EpidemicAutomaton, StateCounts};
use crate::error::LatticeError;
use crate::lattice::{CellState, Grid};
use crate::parameters::{Flavor, Parameters};

/// Everything a full run produces. `history[i]` and `counts[i]` describe the lattice after
/// step `i + 1`; `initial` is the seeded lattice before the first step.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationOutput {
    pub flavor: Flavor,
    pub initial: Grid,
    pub history: Vec<Grid>,
    pub counts: Vec<StateCounts>,
}

impl SimulationOutput {
    /// Infected count after every step.
    #[must_use]
    pub fn infected_series(&self) -> Vec<usize> {
        self.counts
            .iter()
            .map(|counts| counts.get(CellState::Infected))
            .collect()
    }

    /// Index into `history` of the first step with the most infected cells.
    #[must_use]
    pub fn peak_infection_step(&self) -> Option<usize> {
        peak_step(&self.infected_series())
    }

    /// The last snapshot, or the seeded lattice for a run of zero steps.
    #[must_use]
    pub fn final_grid(&self) -> &Grid {
        self.history.last().unwrap_or(&self.initial)
    }
}

/// Index of the first maximum of `series`; `None` for an empty series.
#[must_use]
pub fn peak_step(series: &[usize]) -> Option<usize> {
    series
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, usize)>, (ix, &value)| match best {
            Some((_, max)) if value <= max => best,
            _ => Some((ix, value)),
        })
        .map(|(ix, _)| ix)
}

/// Builds and seeds an automaton for `parameters`.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or `initial_infected` exceeds the population.
pub fn seeded_automaton(parameters: &Parameters) -> Result<EpidemicAutomaton, LatticeError> {
    let mut automaton = EpidemicAutomaton::new(parameters)?;
    if parameters.initial_infected == 0 {
        warn!("initial_infected is 0; the epidemic cannot start");
    }
    automaton.initialize_random_infection(parameters.initial_infected)?;
    Ok(automaton)
}

/// Runs `parameters.num_steps` steps, calling `observer` with the zero-based step index and the
/// automaton after every step. Nothing is stored.
///
/// # Errors
///
/// Returns an error if the automaton cannot be built or seeded.
pub fn run_simulation_with<F>(
    parameters: &Parameters,
    observer: F,
) -> Result<EpidemicAutomaton, LatticeError>
where
    F: FnMut(usize, &EpidemicAutomaton),
{
    let automaton = seeded_automaton(parameters)?;
    Ok(run_steps(automaton, parameters.num_steps, observer))
}

fn run_steps<F>(mut automaton: EpidemicAutomaton, steps: usize, mut observer: F) -> EpidemicAutomaton
where
    F: FnMut(usize, &EpidemicAutomaton),
{
    for step in 0..steps {
        automaton.step();
        observer(step, &automaton);
    }
    automaton
}

/// Runs a full simulation and keeps a snapshot and the state counts of every step.
///
/// # Errors
///
/// Returns an error if the automaton cannot be built or seeded.
pub fn run_simulation(parameters: &Parameters) -> Result<SimulationOutput, LatticeError> {
    let automaton = seeded_automaton(parameters)?;
    let initial = automaton.snapshot();

    let mut history = Vec::with_capacity(parameters.num_steps);
    let mut counts = Vec::with_capacity(parameters.num_steps);
    let automaton = run_steps(automaton, parameters.num_steps, |_, automaton| {
        history.push(automaton.snapshot());
        counts.push(automaton.get_state_counts());
    });

    let output = SimulationOutput {
        flavor: automaton.flavor(),
        initial,
        history,
        counts,
    };
    info!(
        "simulation finished after {} steps; infection peaked at step {:?}",
        automaton.steps_taken(),
        output.peak_infection_step()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParametersBuilder;

    #[test]
    fn peak_step_takes_first_maximum() {
        assert_eq!(peak_step(&[]), None);
        assert_eq!(peak_step(&[0, 0, 0]), Some(0));
        assert_eq!(peak_step(&[1, 5, 3, 5, 2]), Some(1));
        assert_eq!(peak_step(&[1, 2, 3]), Some(2));
    }

    #[test]
    fn records_every_step() {
        let parameters = ParametersBuilder::default()
            .grid_size(15)
            .num_steps(12)
            .random_seed(99)
            .build()
            .unwrap();
        let output = run_simulation(&parameters).unwrap();
        assert_eq!(output.history.len(), 12);
        assert_eq!(output.counts.len(), 12);
        for (grid, counts) in output.history.iter().zip(&output.counts) {
            assert_eq!(counts.get(CellState::Infected), grid.count(CellState::Infected));
            assert_eq!(counts.total(), 225);
        }
        assert_eq!(output.initial.count(CellState::Infected), 5);
    }

    #[test]
    fn zero_steps_keeps_seeded_lattice() {
        let parameters = ParametersBuilder::default()
            .grid_size(10)
            .num_steps(0)
            .initial_infected(3)
            .random_seed(1)
            .build()
            .unwrap();
        let output = run_simulation(&parameters).unwrap();
        assert!(output.history.is_empty());
        assert_eq!(output.peak_infection_step(), None);
        assert_eq!(output.final_grid().count(CellState::Infected), 3);
    }

    #[test]
    fn too_many_seeds_fail() {
        let parameters = ParametersBuilder::default()
            .grid_size(4)
            .population_density(0.5)
            .initial_infected(9)
            .build()
            .unwrap();
        assert!(matches!(
            run_simulation(&parameters),
            Err(LatticeError::InsufficientPopulation {
                requested: 9,
                available: 8
            })
        ));
    }
}
