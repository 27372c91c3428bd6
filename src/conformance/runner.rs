//! Sequence enumeration and the suite runner.

use super::model::{Action, ModelState};
use super::SuiteConfig;
use tracing::debug;

/// An ordered list of actions run against a single fresh state.
pub type Sequence = Vec<Action>;

/// Receives the progress of a suite run.
///
/// Every hook has an empty default, so a driver only implements the ones it
/// cares about.
pub trait Driver {
    /// Called once with every sequence before any is run.
    fn pre_suite(&mut self, _sequences: &[Sequence]) {}

    /// Called before the first action of a sequence.
    fn start_sequence(&mut self, _sequence: &[Action]) {}

    /// Called before the model evaluates `action`.
    fn start_action(&mut self, _action: Action) {}

    /// Called after the model evaluated `action`; `errored` is the model's
    /// verdict and `state` its contents afterwards.
    fn end_action(&mut self, _action: Action, _key: &str, _state: &ModelState, _errored: bool) {}

    /// Called after the last action of a sequence.
    fn end_sequence(&mut self, _sequence: &[Action], _key: &str, _state: &ModelState) {}

    /// Called once after every sequence has run.
    fn post_suite(&mut self, _sequences: &[Sequence]) {}
}

/// Enumerates every sequence of `length` drawn from `actions` in which no
/// action appears more than `duplicates` times.
///
/// The result is sorted and free of repeats.
pub fn sequences(actions: &[Action], length: usize, duplicates: usize) -> Vec<Sequence> {
    let mut actions = actions.to_vec();
    actions.sort();
    actions.dedup();

    if actions.is_empty() || length == 0 {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut digits = vec![0usize; length];

    'outer: loop {
        let counts_ok = digits
            .iter()
            .all(|d| digits.iter().filter(|other| *other == d).count() <= duplicates);
        if counts_ok {
            result.push(digits.iter().map(|&d| actions[d]).collect());
        }

        // Odometer increment, least significant position last
        for position in (0..length).rev() {
            digits[position] += 1;
            if digits[position] < actions.len() {
                continue 'outer;
            }
            digits[position] = 0;
        }
        break;
    }

    result
}

/// Name of a sequence as used in listings, e.g. `test_add_add_delay_add`.
pub fn test_name(sequence: &[Action]) -> String {
    let names: Vec<&str> = sequence.iter().map(Action::name).collect();
    format!("test_{}", names.join("_"))
}

/// Runs every sequence described by `config` through the model, reporting
/// progress to `driver`.
pub fn run_suite<D: Driver>(config: &SuiteConfig, driver: &mut D) {
    let all = sequences(&config.actions, config.length, config.duplicates);
    debug!(sequences = all.len(), length = config.length, "Running conformance suite");

    driver.pre_suite(&all);
    for sequence in &all {
        let mut state = ModelState::new();
        driver.start_sequence(sequence);
        for &action in sequence {
            driver.start_action(action);
            let errored = action.evaluate(&config.key, &mut state);
            driver.end_action(action, &config.key, &state, errored);
        }
        driver.end_sequence(sequence, &config.key, &state);
    }
    driver.post_suite(&all);
}
