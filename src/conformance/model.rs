//! The reference model that conformance sequences are checked against.
//!
//! The model state is a plain `key → value` map. Each [`Action`] carries
//! preconditions, an [`Effect`] and postconditions; evaluating an action
//! against the model tells whether the engine is expected to report an error
//! for it and what the key should hold afterwards.

use std::collections::BTreeMap;
use thiserror::Error;

/// Expected contents of the engine, by key.
pub type ModelState = BTreeMap<String, String>;

/// Value written by store effects.
pub const STORED_VALUE: &str = "0";

/// Value an arithmetic effect installs on a missing key.
pub const ARITHMETIC_DEFAULT: &str = "0";

/// Suffix written by `append`.
pub const APPEND_SUFFIX: &str = "-suffix";

/// Prefix written by `prepend`.
pub const PREPEND_PREFIX: &str = "prefix-";

fn as_number(value: &str) -> Option<i128> {
    value.parse::<i128>().ok()
}

/// Something asserted about the model before or after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Exists,
    DoesNotExist,
    /// Exists and parses as an integer
    ExistsAsNumber,
    /// Either absent, or present and numeric
    MaybeExistsAsNumber,
    /// The whole model is empty
    NothingExists,
}

impl Condition {
    pub fn holds(&self, key: &str, state: &ModelState) -> bool {
        match self {
            Condition::Exists => state.contains_key(key),
            Condition::DoesNotExist => !state.contains_key(key),
            Condition::ExistsAsNumber => state.get(key).and_then(|v| as_number(v)).is_some(),
            Condition::MaybeExistsAsNumber => match state.get(key) {
                None => true,
                Some(v) => as_number(v).is_some(),
            },
            Condition::NothingExists => state.is_empty(),
        }
    }
}

/// An effect could not be applied to the model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("key {0:?} is not in the model")]
    MissingKey(String),

    #[error("value {0:?} is not a number")]
    NotANumber(String),
}

/// How an action changes the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Store(&'static str),
    Delete,
    Flush,
    Append(&'static str),
    Prepend(&'static str),
    /// Adds `by`, flooring at zero; a missing key takes `default`
    Arithmetic { by: i64, default: &'static str },
}

impl Effect {
    pub fn apply(&self, key: &str, state: &mut ModelState) -> Result<(), ModelError> {
        let missing = || ModelError::MissingKey(key.to_string());
        match *self {
            Effect::Store(value) => {
                state.insert(key.to_string(), value.to_string());
            }
            Effect::Delete => {
                state.remove(key).ok_or_else(missing)?;
            }
            Effect::Flush => state.clear(),
            Effect::Append(suffix) => {
                state.get_mut(key).ok_or_else(missing)?.push_str(suffix);
            }
            Effect::Prepend(prefix) => {
                let value = state.get_mut(key).ok_or_else(missing)?;
                value.insert_str(0, prefix);
            }
            Effect::Arithmetic { by, default } => {
                let next = match state.get(key) {
                    Some(current) => {
                        let n = as_number(current)
                            .ok_or_else(|| ModelError::NotANumber(current.clone()))?;
                        (n + i128::from(by)).max(0).to_string()
                    }
                    None => default.to_string(),
                };
                state.insert(key.to_string(), next);
            }
        }
        Ok(())
    }
}

/// The operations conformance sequences are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Set,
    Add,
    Delete,
    Flush,
    /// Moves the clock past every item's expiry
    Delay,
    Append,
    Prepend,
    Incr,
    Decr,
    IncrWithDefault,
    DecrWithDefault,
}

impl Action {
    /// Every action, in sequence order.
    pub const ALL: [Action; 11] = [
        Action::Set,
        Action::Add,
        Action::Delete,
        Action::Flush,
        Action::Delay,
        Action::Append,
        Action::Prepend,
        Action::Incr,
        Action::Decr,
        Action::IncrWithDefault,
        Action::DecrWithDefault,
    ];

    /// Name used in test names and listings.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Set => "set",
            Action::Add => "add",
            Action::Delete => "delete",
            Action::Flush => "flush",
            Action::Delay => "delay",
            Action::Append => "append",
            Action::Prepend => "prepend",
            Action::Incr => "incr",
            Action::Decr => "decr",
            Action::IncrWithDefault => "incrWithDefault",
            Action::DecrWithDefault => "decrWithDefault",
        }
    }

    /// Looks an action up by its [`name`](Action::name), ignoring case.
    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }

    pub fn preconditions(&self) -> &'static [Condition] {
        match self {
            Action::Set | Action::Flush | Action::Delay => &[],
            Action::Add => &[Condition::DoesNotExist],
            Action::Delete | Action::Append | Action::Prepend => &[Condition::Exists],
            Action::Incr | Action::Decr => &[Condition::ExistsAsNumber],
            Action::IncrWithDefault | Action::DecrWithDefault => {
                &[Condition::MaybeExistsAsNumber]
            }
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Action::Set | Action::Add => Effect::Store(STORED_VALUE),
            Action::Delete => Effect::Delete,
            Action::Flush | Action::Delay => Effect::Flush,
            Action::Append => Effect::Append(APPEND_SUFFIX),
            Action::Prepend => Effect::Prepend(PREPEND_PREFIX),
            Action::Incr | Action::IncrWithDefault => Effect::Arithmetic {
                by: 1,
                default: ARITHMETIC_DEFAULT,
            },
            Action::Decr | Action::DecrWithDefault => Effect::Arithmetic {
                by: -1,
                default: ARITHMETIC_DEFAULT,
            },
        }
    }

    pub fn postconditions(&self) -> &'static [Condition] {
        match self {
            Action::Set | Action::Add => &[Condition::Exists],
            Action::Delete => &[Condition::DoesNotExist],
            Action::Flush | Action::Delay => &[Condition::NothingExists],
            Action::Append | Action::Prepend => &[],
            Action::Incr
            | Action::Decr
            | Action::IncrWithDefault
            | Action::DecrWithDefault => &[Condition::ExistsAsNumber],
        }
    }

    /// Evaluates this action against the model.
    ///
    /// Returns `true` if the engine is expected to report an error. When a
    /// precondition fails the effect is skipped and the model is unchanged.
    pub fn evaluate(&self, key: &str, state: &mut ModelState) -> bool {
        if !self.preconditions().iter().all(|c| c.holds(key, state)) {
            return true;
        }
        if self.effect().apply(key, state).is_err() {
            return true;
        }
        !self.postconditions().iter().all(|c| c.holds(key, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "testkey";

    fn run(actions: &[Action]) -> (Vec<bool>, ModelState) {
        let mut state = ModelState::new();
        let errored = actions.iter().map(|a| a.evaluate(KEY, &mut state)).collect();
        (errored, state)
    }

    #[test]
    fn test_add_add_delay_add() {
        let (errored, state) = run(&[Action::Add, Action::Add, Action::Delay, Action::Add]);
        assert_eq!(errored, vec![false, true, false, false]);
        assert_eq!(state.get(KEY).map(String::as_str), Some("0"));
    }

    #[test]
    fn test_append_prepend() {
        let (errored, state) = run(&[Action::Append, Action::Set, Action::Append, Action::Prepend]);
        assert_eq!(errored, vec![true, false, false, false]);
        assert_eq!(state.get(KEY).map(String::as_str), Some("prefix-0-suffix"));
    }

    #[test]
    fn test_arithmetic() {
        let (errored, state) = run(&[Action::Incr, Action::IncrWithDefault, Action::Incr, Action::Decr]);
        assert_eq!(errored, vec![true, false, false, false]);
        assert_eq!(state.get(KEY).map(String::as_str), Some("0"));

        let (errored, _) = run(&[Action::Set, Action::Append, Action::IncrWithDefault]);
        assert_eq!(errored, vec![false, false, true]);
    }

    #[test]
    fn test_decr_floors_at_zero() {
        let (errored, state) = run(&[Action::Set, Action::Decr, Action::Decr]);
        assert_eq!(errored, vec![false, false, false]);
        assert_eq!(state.get(KEY).map(String::as_str), Some("0"));
    }

    #[test]
    fn test_delete() {
        let (errored, state) = run(&[Action::Delete, Action::Set, Action::Delete]);
        assert_eq!(errored, vec![true, false, false]);
        assert!(state.is_empty());
    }

    #[test]
    fn test_failed_precondition_leaves_model_alone() {
        let mut state = ModelState::new();
        state.insert(KEY.into(), "0-suffix".into());

        assert!(Action::Incr.evaluate(KEY, &mut state));
        assert_eq!(state.get(KEY).map(String::as_str), Some("0-suffix"));
    }

    #[test]
    fn test_effect_errors() {
        let mut state = ModelState::new();
        assert_eq!(
            Effect::Append("x").apply(KEY, &mut state),
            Err(ModelError::MissingKey(KEY.into()))
        );

        state.insert(KEY.into(), "abc".into());
        assert!(matches!(
            Effect::Arithmetic { by: 1, default: "0" }.apply(KEY, &mut state),
            Err(ModelError::NotANumber(_))
        ));
    }

    #[test]
    fn test_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.name()), Some(action));
        }
        assert_eq!(Action::from_name("INCRWITHDEFAULT"), Some(Action::IncrWithDefault));
        assert_eq!(Action::from_name("nope"), None);
    }
}
