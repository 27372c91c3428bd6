//! Runs conformance sequences against a live [`Engine`].

use super::model::{Action, ModelState, APPEND_SUFFIX, PREPEND_PREFIX, STORED_VALUE};
use super::runner::{test_name, Driver, Sequence};
use crate::clock::ManualClock;
use crate::config::EngineConfig;
use crate::engine::{Engine, EngineError};
use crate::reporter::{self, ReportError};
use crate::storage::Expiry;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// One failed assertion inside a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Position of the action, or `None` for the final value check
    pub step: Option<usize>,
    pub action: Option<Action>,
    pub error: ReportError,
}

/// A sequence in which at least one assertion failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub sequence: Sequence,
    pub steps: Vec<StepFailure>,
}

impl Failure {
    pub fn name(&self) -> String {
        test_name(&self.sequence)
    }
}

/// Summary of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<Failure>,
}

impl SuiteReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a fresh engine on a [`ManualClock`] through each sequence and
/// checks every outcome against the model.
#[derive(Debug)]
pub struct EngineDriver {
    config: EngineConfig,
    key: Bytes,
    expiry: u32,
    engine: Option<Engine>,
    last: Result<(), EngineError>,
    step: usize,
    steps: Vec<StepFailure>,
    report: SuiteReport,
}

impl EngineDriver {
    /// `expiry` is the TTL given to every stored item; `delay` moves the
    /// clock `expiry + 1` seconds.
    pub fn new(config: EngineConfig, key: impl Into<Bytes>, expiry: u32) -> Self {
        Self {
            config,
            key: key.into(),
            expiry,
            engine: None,
            last: Ok(()),
            step: 0,
            steps: Vec::new(),
            report: SuiteReport::default(),
        }
    }

    /// The accumulated report.
    pub fn report(&self) -> &SuiteReport {
        &self.report
    }

    pub fn into_report(self) -> SuiteReport {
        self.report
    }

    fn engine(&mut self) -> &Engine {
        let config = &self.config;
        self.engine
            .get_or_insert_with(|| Engine::new(config.clone(), Arc::new(ManualClock::new())))
    }

    fn perform(&mut self, action: Action) -> Result<(), EngineError> {
        let key = self.key.clone();
        let ttl = u64::from(self.expiry);
        let delay = i64::from(self.expiry) + 1;
        let engine = self.engine();
        let expiry = Expiry::after(engine.now(), ttl);
        let stored = || Bytes::from_static(STORED_VALUE.as_bytes());

        match action {
            Action::Set => engine.set(key, stored(), expiry),
            Action::Add => engine.add(key, stored(), expiry),
            Action::Delete => engine.delete(&key),
            Action::Flush => {
                engine.flush();
                Ok(())
            }
            Action::Delay => engine.advance_clock(delay).map(|_| ()),
            Action::Append => engine.append(&key, APPEND_SUFFIX.as_bytes()).map(|_| ()),
            Action::Prepend => engine.prepend(&key, PREPEND_PREFIX.as_bytes()).map(|_| ()),
            Action::Incr => engine.incr(&key, 1).map(|_| ()),
            Action::Decr => engine.decr(&key, 1).map(|_| ()),
            Action::IncrWithDefault => engine.incr_with_default(&key, 1, 0, expiry).map(|_| ()),
            Action::DecrWithDefault => engine.decr_with_default(&key, 1, 0, expiry).map(|_| ()),
        }
    }

    fn record(&mut self, step: Option<usize>, action: Option<Action>, error: ReportError) {
        self.steps.push(StepFailure {
            step,
            action,
            error,
        });
    }
}

impl Driver for EngineDriver {
    fn pre_suite(&mut self, sequences: &[Sequence]) {
        self.report = SuiteReport {
            total: sequences.len(),
            ..Default::default()
        };
    }

    fn start_sequence(&mut self, _sequence: &[Action]) {
        self.engine = None;
        self.step = 0;
        self.steps.clear();
    }

    fn start_action(&mut self, action: Action) {
        self.last = self.perform(action);
    }

    fn end_action(&mut self, action: Action, _key: &str, _state: &ModelState, errored: bool) {
        let verdict = if errored {
            reporter::assert_has_error(&self.last)
        } else {
            reporter::assert_has_no_error(&self.last)
        };
        if let Err(error) = verdict {
            self.record(Some(self.step), Some(action), error);
        }
        self.step += 1;
    }

    fn end_sequence(&mut self, sequence: &[Action], key: &str, state: &ModelState) {
        let engine_key = self.key.clone();
        let engine = self.engine();
        let verdict = match state.get(key) {
            Some(expected) => reporter::check_value(engine, &engine_key, expected.as_bytes()),
            None => reporter::assert_not_exists(engine, &engine_key),
        };
        if let Err(error) = verdict {
            self.record(None, None, error);
        }

        if self.steps.is_empty() {
            self.report.passed += 1;
        } else {
            let failure = Failure {
                sequence: sequence.to_vec(),
                steps: std::mem::take(&mut self.steps),
            };
            warn!(
                test = %failure.name(),
                failures = failure.steps.len(),
                "Conformance sequence failed"
            );
            self.report.failures.push(failure);
        }
    }

    fn post_suite(&mut self, _sequences: &[Sequence]) {
        info!(
            total = self.report.total,
            passed = self.report.passed,
            failed = self.report.failures.len(),
            "Conformance suite finished"
        );
    }
}
