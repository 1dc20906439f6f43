//! Text correction: generic misrecognition rules plus card-specific fixes.

mod fields;
mod rules;
mod table;

use thiserror::Error;

pub use fields::{CorrectionOutcome, correct_field};
pub use rules::{CorrectionRule, CorrectionRuleSet};
pub use table::{CardCorrections, ConsumedSet, CorrectionTable, Directive, FULL_TEXT_FIELD, InsertedAbility};

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("'{key}' refers to {list} index {index}, but there are only {len}")]
    IndexOutOfRange {
        key: &'static str,
        list: &'static str,
        index: usize,
        len: usize,
    },
    #[error("correction '{key}' is malformed: {reason}")]
    MalformedEntry { key: String, reason: String },
    #[error("correction pattern {pattern:?} is not a valid regex")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("field '{field}' holds {found}, which can't be corrected")]
    UnsupportedFieldType { field: String, found: &'static str },
    #[error("built-in correction rule '{name}' doesn't compile")]
    InvalidRule {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}
