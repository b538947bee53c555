//! State transitions. Every cell's next state is decided from one snapshot of the lattice taken
//! after movement; the results are written into a second grid that replaces the lattice's states
//! when the pass ends, so no decision in a step sees another decision of the same step.
//!
//! Duration counters are updated on the live lattice while the pass runs. Each counter is only
//! ever read by its own cell, so this does not leak information between cells.
use log::trace;
use rand::Rng;

use crate::lattice::{CellState, Lattice};
use crate::parameters::{Flavor, Parameters};

/// The rule set derived from a `Parameters` value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionRules {
    pub infection_rate: f64,
    pub recovery_time: u32,
    /// `Some` in the SEIR flavor.
    pub exposed_time: Option<u32>,
    /// Steps of immunity as a real-valued threshold; `None` when immunity is permanent.
    pub immunity_threshold: Option<f64>,
}

impl TransitionRules {
    #[must_use]
    pub fn from_parameters(parameters: &Parameters) -> Self {
        TransitionRules {
            infection_rate: parameters.infection_rate,
            recovery_time: parameters.recovery_time,
            exposed_time: parameters.exposed_time,
            immunity_threshold: parameters.immunity_threshold(),
        }
    }

    #[must_use]
    pub fn flavor(&self) -> Flavor {
        if self.exposed_time.is_some() {
            Flavor::Seir
        } else {
            Flavor::Sir
        }
    }

    /// The state a susceptible cell enters on infection, and the state infection is seeded in.
    #[must_use]
    pub fn infection_entry_state(&self) -> CellState {
        match self.flavor() {
            Flavor::Sir => CellState::Infected,
            Flavor::Seir => CellState::Exposed,
        }
    }

    /// Probability that a susceptible cell with `infected_neighbors` infected neighbors is
    /// infected this step.
    #[must_use]
    pub fn infection_probability(&self, infected_neighbors: usize) -> f64 {
        if infected_neighbors == 0 {
            return 0.0;
        }
        let exponent = i32::try_from(infected_neighbors).unwrap_or(i32::MAX);
        1.0 - (1.0 - self.infection_rate).powi(exponent)
    }

    /// Runs one synchronous transition pass over `lattice` and returns the number of cells whose
    /// state changed.
    pub fn apply<R: Rng>(&self, lattice: &mut Lattice, rng: &mut R) -> usize {
        let snapshot = lattice.grid().clone();
        let mut next = snapshot.clone();
        let mut changes = 0;

        for (index, &state) in snapshot.cells().iter().enumerate() {
            let new_state = match state {
                CellState::Susceptible => {
                    let infected_neighbors = snapshot
                        .moore_neighbors(index)
                        .filter(|&ix| snapshot.cells()[ix] == CellState::Infected)
                        .count();
                    let p = self.infection_probability(infected_neighbors);
                    if infected_neighbors > 0 && rng.random::<f64>() < p {
                        Some(self.infection_entry_state())
                    } else {
                        None
                    }
                }
                CellState::Exposed => match self.exposed_time {
                    Some(exposed_time) if lattice.tick(index, state) >= exposed_time => {
                        Some(CellState::Infected)
                    }
                    _ => None,
                },
                CellState::Infected => {
                    (lattice.tick(index, state) >= self.recovery_time).then_some(CellState::Recovered)
                }
                CellState::Recovered => match self.immunity_threshold {
                    Some(threshold) if f64::from(lattice.tick(index, state)) >= threshold => {
                        Some(CellState::Susceptible)
                    }
                    _ => None,
                },
                CellState::Empty => None,
            };

            if let Some(new_state) = new_state {
                // Leaving a state zeroes its counter; entering one starts from zero.
                lattice.reset_counter_for(index, state);
                lattice.reset_counter_for(index, new_state);
                next.set(index, new_state);
                changes += 1;
            }
        }

        lattice.commit(next);
        trace!("transition pass changed {changes} cells");
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParametersBuilder;
    use crate::random::seeded_rng;
    use approx::assert_relative_eq;

    fn sir_rules(infection_rate: f64, recovery_time: u32) -> TransitionRules {
        TransitionRules::from_parameters(
            &ParametersBuilder::default()
                .infection_rate(infection_rate)
                .recovery_time(recovery_time)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn infection_probability_compounds() {
        let rules = sir_rules(0.25, 3);
        assert_eq!(rules.infection_probability(0), 0.0);
        assert_relative_eq!(rules.infection_probability(1), 0.25);
        assert_relative_eq!(rules.infection_probability(2), 1.0 - 0.75 * 0.75);
        assert_relative_eq!(sir_rules(1.0, 3).infection_probability(1), 1.0);
    }

    #[test]
    fn infected_recovers_after_exactly_recovery_time() {
        let rules = sir_rules(0.5, 4);
        let mut lattice = Lattice::new(1);
        lattice.enter_state(0, CellState::Infected);
        let mut rng = seeded_rng(Some(0));

        for _ in 0..3 {
            rules.apply(&mut lattice, &mut rng);
            assert_eq!(lattice.state(0), CellState::Infected);
        }
        rules.apply(&mut lattice, &mut rng);
        assert_eq!(lattice.state(0), CellState::Recovered);
        assert_eq!(lattice.infected_duration(0), 0);

        // Permanent immunity.
        for _ in 0..100 {
            rules.apply(&mut lattice, &mut rng);
        }
        assert_eq!(lattice.state(0), CellState::Recovered);
        assert_eq!(lattice.immune_duration(0), 0);
    }

    #[test]
    fn immunity_wanes_at_real_threshold() {
        // 1 / 0.3 = 3.33.., so immunity is lost on the 4th recovered step.
        let rules = TransitionRules {
            immunity_threshold: Some(1.0 / 0.3),
            ..sir_rules(0.5, 1)
        };
        let mut lattice = Lattice::new(1);
        lattice.enter_state(0, CellState::Recovered);
        let mut rng = seeded_rng(Some(0));

        for step in 1..=3 {
            rules.apply(&mut lattice, &mut rng);
            assert_eq!(lattice.state(0), CellState::Recovered, "step {step}");
            assert_eq!(lattice.immune_duration(0), step);
        }
        rules.apply(&mut lattice, &mut rng);
        assert_eq!(lattice.state(0), CellState::Susceptible);
        assert_eq!(lattice.immune_duration(0), 0);
    }

    #[test]
    fn exposed_becomes_infected_after_exposed_time() {
        let rules = TransitionRules {
            exposed_time: Some(2),
            ..sir_rules(0.5, 3)
        };
        assert_eq!(rules.infection_entry_state(), CellState::Exposed);

        let mut lattice = Lattice::new(1);
        lattice.enter_state(0, CellState::Exposed);
        let mut rng = seeded_rng(Some(0));

        rules.apply(&mut lattice, &mut rng);
        assert_eq!(lattice.state(0), CellState::Exposed);
        rules.apply(&mut lattice, &mut rng);
        assert_eq!(lattice.state(0), CellState::Infected);
        assert_eq!(lattice.exposed_duration(0), 0);
        assert_eq!(lattice.infected_duration(0), 0);
    }

    #[test]
    fn seir_susceptible_enters_exposed() {
        let rules = TransitionRules {
            exposed_time: Some(5),
            ..sir_rules(1.0, 3)
        };
        let mut lattice = Lattice::new(2);
        lattice.enter_state(0, CellState::Infected);
        let mut rng = seeded_rng(Some(0));

        rules.apply(&mut lattice, &mut rng);
        assert_eq!(lattice.grid().count(CellState::Exposed), 3);
        assert_eq!(lattice.grid().count(CellState::Infected), 1);
    }

    // A line of infection must not spread more than one cell per step, which would happen if
    // transitions were committed cell by cell in raster order.
    #[test]
    fn update_is_synchronous() {
        let rules = sir_rules(1.0, 10);
        let mut lattice = Lattice::new(5);
        lattice.enter_state(0, CellState::Infected);
        let mut rng = seeded_rng(Some(0));

        rules.apply(&mut lattice, &mut rng);
        let infected: Vec<_> = lattice.grid().positions_of(CellState::Infected).collect();
        assert_eq!(infected, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn empty_cells_never_change() {
        let rules = sir_rules(1.0, 1);
        let mut lattice = Lattice::new(3);
        lattice.clear(4);
        lattice.enter_state(0, CellState::Infected);
        let mut rng = seeded_rng(Some(0));
        for _ in 0..5 {
            rules.apply(&mut lattice, &mut rng);
            assert_eq!(lattice.state(4), CellState::Empty);
        }
    }
}
