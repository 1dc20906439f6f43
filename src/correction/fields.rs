use regex::Regex;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::CorrectionError;

/// What a single `(match, replacement)` pair did to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOutcome {
    Changed,
    Inserted,
    Removed,
    Appended,
    /// The pattern matched, but the substitution produced the same text.
    Unchanged,
    NoMatch,
    MissingField,
    /// Tried to add a field that already has a value.
    AlreadyPresent,
    /// Appending a value of a different type than the list holds.
    TypeMismatch,
    /// Numeric fields only get corrected when they hold the expected value.
    UnexpectedValue,
}

impl CorrectionOutcome {
    /// Whether the card was modified. Anything else means the correction is stale.
    pub fn applied(self) -> bool {
        matches!(
            self,
            CorrectionOutcome::Changed | CorrectionOutcome::Inserted | CorrectionOutcome::Removed | CorrectionOutcome::Appended
        )
    }
}

/// Applies one correction pair to `field` of a card.
///
/// A `null` matcher means "no match needed": it inserts a missing field,
/// appends to a list, or removes the field when the replacement is `null` too.
/// String matchers are regexes, applied with `.` matching newlines.
pub fn correct_field(
    card: &mut Map<String, Value>,
    field: &str,
    matcher: &Value,
    replacement: &Value,
) -> Result<CorrectionOutcome, CorrectionError> {
    if !card.contains_key(field) {
        let outcome = match (matcher, replacement) {
            (Value::Null, Value::Null) => {
                warn!("Trying to remove field '{}', but it doesn't exist", field);
                CorrectionOutcome::MissingField
            }
            (Value::Null, value) => {
                info!("Adding field '{}' with value {}", field, value);
                card.insert(field.to_string(), value.clone());
                CorrectionOutcome::Inserted
            }
            _ => {
                warn!(
                    "Trying to correct field '{}' from {} to {}, but the field doesn't exist. Use a null match to add it",
                    field, matcher, replacement
                );
                CorrectionOutcome::MissingField
            }
        };
        return Ok(outcome);
    }

    if matcher.is_null() {
        if replacement.is_null() {
            let removed = card.remove(field);
            info!("Removed field '{}' (value {:?})", field, removed);
            return Ok(CorrectionOutcome::Removed);
        }
        return Ok(add_to_existing(card, field, replacement));
    }

    let Some(current) = card.get_mut(field) else {
        return Ok(CorrectionOutcome::MissingField);
    };
    let outcome = match current {
        Value::String(text) => {
            let regex = compile(matcher)?;
            let corrected = regex.replace_all(text, replacement_text(field, replacement)?).into_owned();
            if !regex.is_match(text) {
                warn!("Correction {} for field '{}' didn't match {:?}", matcher, field, text);
                CorrectionOutcome::NoMatch
            } else if corrected == *text {
                warn!("Correcting field '{}' with {} didn't change anything, value is still {:?}", field, matcher, text);
                CorrectionOutcome::Unchanged
            } else {
                info!("Corrected field '{}' from {:?} to {:?}", field, text, corrected);
                *text = corrected;
                CorrectionOutcome::Changed
            }
        }
        Value::Array(items) => correct_list(field, items, matcher, replacement)?,
        Value::Bool(value) => {
            if Value::Bool(*value) == *replacement {
                warn!("Boolean field '{}' already has value {}", field, value);
                CorrectionOutcome::Unchanged
            } else {
                info!("Corrected boolean field '{}' from {} to {}", field, value, replacement);
                *current = replacement.clone();
                CorrectionOutcome::Changed
            }
        }
        Value::Number(_) => {
            if *current != *matcher {
                warn!(
                    "Expected field '{}' to be {}, but it is {}, skipping correction",
                    field, matcher, current
                );
                CorrectionOutcome::UnexpectedValue
            } else {
                info!("Corrected numeric field '{}' from {} to {}", field, current, replacement);
                *current = replacement.clone();
                CorrectionOutcome::Changed
            }
        }
        Value::Object(entries) => {
            let regex = compile(matcher)?;
            let replacement = replacement_text(field, replacement)?;
            let matched = entries.iter_mut().find_map(|(key, value)| match value {
                Value::String(text) if regex.is_match(text) => Some((key.clone(), text)),
                _ => None,
            });
            match matched {
                Some((key, text)) => {
                    let corrected = regex.replace_all(text, replacement).into_owned();
                    if corrected == *text {
                        warn!("Correcting key '{}' of field '{}' didn't change anything", key, field);
                        CorrectionOutcome::Unchanged
                    } else {
                        info!("Corrected key '{}' of field '{}' from {:?} to {:?}", key, field, text, corrected);
                        *text = corrected;
                        CorrectionOutcome::Changed
                    }
                }
                None => {
                    warn!("Correction {} for field '{}' didn't match any of its values", matcher, field);
                    CorrectionOutcome::NoMatch
                }
            }
        }
        Value::Null => {
            return Err(CorrectionError::UnsupportedFieldType {
                field: field.to_string(),
                found: "null",
            });
        }
    };

    if card.get(field).is_some_and(|value| value.as_array().is_some_and(Vec::is_empty)) {
        info!("List field '{}' is empty after correction, removing it", field);
        card.remove(field);
    }
    Ok(outcome)
}

fn add_to_existing(card: &mut Map<String, Value>, field: &str, value: &Value) -> CorrectionOutcome {
    match card.get_mut(field) {
        Some(Value::Array(items)) => {
            if items.first().is_none_or(|first| same_kind(first, value)) {
                info!("Appending {} to list field '{}'", value, field);
                items.push(value.clone());
                CorrectionOutcome::Appended
            } else {
                warn!("Can't add {} to list field '{}' holding other types, skipping", value, field);
                CorrectionOutcome::TypeMismatch
            }
        }
        Some(existing) => {
            warn!("Trying to add field '{}', but it already exists with value {}", field, existing);
            CorrectionOutcome::AlreadyPresent
        }
        None => CorrectionOutcome::MissingField,
    }
}

fn correct_list(
    field: &str,
    items: &mut Vec<Value>,
    matcher: &Value,
    replacement: &Value,
) -> Result<CorrectionOutcome, CorrectionError> {
    let regex = compile(matcher)?;
    let mut matched = false;
    let mut changed = false;

    // Backwards, so removals keep earlier indexes valid
    for index in (0..items.len()).rev() {
        match &mut items[index] {
            Value::String(text) => {
                if !regex.is_match(text) {
                    continue;
                }
                matched = true;
                if replacement.is_null() {
                    info!("Removing index {} value {:?} from field '{}'", index, text, field);
                    items.remove(index);
                    changed = true;
                } else {
                    let corrected = regex.replace_all(text, replacement_text(field, replacement)?).into_owned();
                    if corrected == *text {
                        warn!("Correcting index {} of field '{}' didn't change anything", index, field);
                    } else {
                        info!("Corrected index {} of field '{}' from {:?} to {:?}", index, field, text, corrected);
                        *text = corrected;
                        changed = true;
                    }
                }
            }
            Value::Object(entry) => {
                for (key, value) in entry.iter_mut() {
                    let Value::String(text) = value else {
                        continue;
                    };
                    if !regex.is_match(text) {
                        continue;
                    }
                    matched = true;
                    let corrected = regex.replace_all(text, replacement_text(field, replacement)?).into_owned();
                    if corrected == *text {
                        warn!("Correcting '{}' at index {} of field '{}' didn't change anything", key, index, field);
                    } else {
                        info!(
                            "Corrected '{}' at index {} of field '{}' from {:?} to {:?}",
                            key, index, field, text, corrected
                        );
                        *text = corrected;
                        changed = true;
                    }
                }
            }
            other => {
                return Err(CorrectionError::UnsupportedFieldType {
                    field: field.to_string(),
                    found: value_kind(other),
                });
            }
        }
    }

    Ok(if !matched {
        warn!("Correction {} for field '{}' didn't match any of its entries", matcher, field);
        CorrectionOutcome::NoMatch
    } else if changed {
        CorrectionOutcome::Changed
    } else {
        CorrectionOutcome::Unchanged
    })
}

fn compile(matcher: &Value) -> Result<Regex, CorrectionError> {
    let Value::String(pattern) = matcher else {
        return Err(CorrectionError::MalformedEntry {
            key: matcher.to_string(),
            reason: "match value must be a regex string".to_string(),
        });
    };
    Regex::new(&format!("(?s){}", pattern)).map_err(|source| CorrectionError::InvalidPattern {
        pattern: pattern.clone(),
        source,
    })
}

fn replacement_text<'a>(field: &str, replacement: &'a Value) -> Result<&'a str, CorrectionError> {
    replacement.as_str().ok_or_else(|| CorrectionError::MalformedEntry {
        key: field.to_string(),
        reason: format!("replacement {} for a text field must be a string", replacement),
    })
}

fn same_kind(a: &Value, b: &Value) -> bool {
    value_kind(a) == value_kind(b)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
