//! Renders conformance sequences as a readable listing.
//!
//! Each sequence becomes a block naming the actions in order, the signal the
//! model expects from each, the value the model holds afterwards and the
//! final check:
//!
//! ```text
//! test_add_add_delay_add:
//!     add(testkey);             assert_has_no_error(); // value is "0"
//!     add(testkey);             assert_has_error(); // value is "0"
//!     delay(expiry+1);          assert_has_no_error(); // value is not defined
//!     add(testkey);             assert_has_no_error(); // value is "0"
//!     check_value(testkey, "0");
//! ```

use super::model::{Action, ModelState};
use super::runner::{test_name, Driver, Sequence};
use std::fmt::Write;

/// Collects the listing of a suite run into a string.
#[derive(Debug, Default)]
pub struct ListingDriver {
    out: String,
}

impl ListingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The listing produced so far.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn call(action: Action, key: &str) -> String {
        match action {
            Action::Delay => "delay(expiry+1);".to_string(),
            Action::Flush => "flush();".to_string(),
            other => format!("{}({});", other.name(), key),
        }
    }
}

impl Driver for ListingDriver {
    fn pre_suite(&mut self, sequences: &[Sequence]) {
        let _ = writeln!(self.out, "# {} sequences", sequences.len());
        let _ = writeln!(self.out);
    }

    fn start_sequence(&mut self, sequence: &[Action]) {
        let _ = writeln!(self.out, "{}:", test_name(sequence));
    }

    fn end_action(&mut self, action: Action, key: &str, state: &ModelState, errored: bool) {
        let assertion = if errored {
            "assert_has_error();"
        } else {
            "assert_has_no_error();"
        };
        let comment = match state.get(key) {
            Some(value) => format!("// value is {:?}", value),
            None => "// value is not defined".to_string(),
        };
        let _ = writeln!(
            self.out,
            "    {:<25} {} {}",
            Self::call(action, key),
            assertion,
            comment
        );
    }

    fn end_sequence(&mut self, _sequence: &[Action], key: &str, state: &ModelState) {
        let _ = match state.get(key) {
            Some(value) => writeln!(self.out, "    check_value({}, {:?});", key, value),
            None => writeln!(self.out, "    assert_not_exists({});", key),
        };
        let _ = writeln!(self.out);
    }

    fn post_suite(&mut self, sequences: &[Sequence]) {
        let _ = writeln!(self.out, "# index");
        for sequence in sequences {
            let names: Vec<&str> = sequence.iter().map(Action::name).collect();
            let _ = writeln!(self.out, "{:<60} {}", names.join(", "), test_name(sequence));
        }
    }
}
