//! Card-specific corrections, loaded from a JSON table keyed by card id.
//!
//! Each card entry maps a field name to a flat `[match, replacement, ...]`
//! list, or a `_directive` name to its arguments:
//!
//! ```json
//! {
//!   "262": {
//!     "_moveKeywordsLast": true,
//!     "_effectAtIndexIsAbility": [0, "PLAY WITH ME"],
//!     "version": ["Fax", "Fox"],
//!     "subtypes": [null, "Sorcerer"]
//!   }
//! }
//! ```
//!
//! A language-specific table next to the main one (`corrections_de.json` for
//! `corrections.json`) is merged in on load.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::fields::correct_field;
use super::CorrectionError;
use crate::language::Language;
use crate::reconstruct::AbilityKind;

/// Field whose corrections run after the full text is assembled.
pub const FULL_TEXT_FIELD: &str = "fullText";

#[derive(Debug, Clone, PartialEq)]
pub struct InsertedAbility {
    pub index: usize,
    pub effect: String,
    pub name: Option<String>,
}

/// Structural fixes that can't be expressed as a text substitution.
#[derive(Debug, Clone)]
pub enum Directive {
    /// Keyword text got read as the tail of the last named ability.
    MoveKeywordsLast,
    InsertAbilities(Vec<InsertedAbility>),
    RemoveAbilities(Vec<usize>),
    ForceAbilityType { index: usize, kind: AbilityKind },
    AddNameToAbility { index: usize, name: String },
    EffectIsAbility { index: usize, name: Option<String> },
    EffectIsFlavorText(usize),
    MergeEffectWithPrevious(usize),
    MoveAbility { from: usize, to: usize },
    NewlineAfterLabel(usize),
    SkipFullTextSectionMerge(usize),
    SplitAbilityName { index: usize, pattern: Regex },
}

impl Directive {
    /// The table key this directive was read from.
    pub fn key(&self) -> &'static str {
        match self {
            Directive::MoveKeywordsLast => "_moveKeywordsLast",
            Directive::InsertAbilities(_) => "_insertAbilityAtIndex",
            Directive::RemoveAbilities(_) => "_removeAbilitiesAtIndexes",
            Directive::ForceAbilityType { kind, .. } => match kind {
                AbilityKind::Activated => "_forceAbilityIndexToActivated",
                AbilityKind::Keyword => "_forceAbilityIndexToKeyword",
                AbilityKind::Static => "_forceAbilityIndexToStatic",
                AbilityKind::Triggered => "_forceAbilityIndexToTriggered",
            },
            Directive::AddNameToAbility { .. } => "_addNameToAbilityAtIndex",
            Directive::EffectIsAbility { .. } => "_effectAtIndexIsAbility",
            Directive::EffectIsFlavorText(_) => "_effectAtIndexIsFlavorText",
            Directive::MergeEffectWithPrevious(_) => "_mergeEffectIndexWithPrevious",
            Directive::MoveAbility { .. } => "_moveAbilityAtIndexToIndex",
            Directive::NewlineAfterLabel(_) => "_newlineAfterLabelIndex",
            Directive::SkipFullTextSectionMerge(_) => "_skipFullTextSectionMergeAtIndex",
            Directive::SplitAbilityName { .. } => "_splitAbilityNameAtIndex",
        }
    }

    fn parse(key: &str, value: &Value) -> Result<Self, CorrectionError> {
        let malformed = |reason: &str| CorrectionError::MalformedEntry {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let index = || value.as_u64().map(|i| i as usize).ok_or_else(|| malformed("expected an index"));
        let list = || value.as_array().map(Vec::as_slice).ok_or_else(|| malformed("expected a list"));
        let index_at = |items: &[Value], position: usize| {
            items
                .get(position)
                .and_then(Value::as_u64)
                .map(|i| i as usize)
                .ok_or_else(|| malformed("expected an index"))
        };
        let text_at = |items: &[Value], position: usize| {
            items
                .get(position)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| malformed("expected text"))
        };
        let force = |kind: AbilityKind| -> Result<Directive, CorrectionError> {
            Ok(Directive::ForceAbilityType { index: index()?, kind })
        };

        match key {
            "_moveKeywordsLast" => match value.as_bool() {
                Some(true) => Ok(Directive::MoveKeywordsLast),
                _ => Err(malformed("expected true")),
            },
            "_insertAbilityAtIndex" => {
                let items = list()?;
                let mut inserted = Vec::new();
                let mut position = 0;
                while position < items.len() {
                    let index = index_at(items, position)?;
                    let effect = text_at(items, position + 1)?;
                    position += 2;
                    // An optional name follows the text; the next index never is a string
                    let name = items.get(position).and_then(Value::as_str).map(str::to_string);
                    if name.is_some() {
                        position += 1;
                    }
                    inserted.push(InsertedAbility { index, effect, name });
                }
                Ok(Directive::InsertAbilities(inserted))
            }
            "_removeAbilitiesAtIndexes" => {
                let items = list()?;
                let indexes = (0..items.len()).map(|i| index_at(items, i)).collect::<Result<_, _>>()?;
                Ok(Directive::RemoveAbilities(indexes))
            }
            "_forceAbilityIndexToActivated" => force(AbilityKind::Activated),
            "_forceAbilityIndexToKeyword" => force(AbilityKind::Keyword),
            "_forceAbilityIndexToStatic" => force(AbilityKind::Static),
            "_forceAbilityIndexToTriggered" => force(AbilityKind::Triggered),
            "_addNameToAbilityAtIndex" => {
                let items = list()?;
                Ok(Directive::AddNameToAbility {
                    index: index_at(items, 0)?,
                    name: text_at(items, 1)?,
                })
            }
            "_effectAtIndexIsAbility" => match value {
                Value::Array(items) => Ok(Directive::EffectIsAbility {
                    index: index_at(items.as_slice(), 0)?,
                    name: Some(text_at(items.as_slice(), 1)?),
                }),
                _ => Ok(Directive::EffectIsAbility { index: index()?, name: None }),
            },
            "_effectAtIndexIsFlavorText" => Ok(Directive::EffectIsFlavorText(index()?)),
            "_mergeEffectIndexWithPrevious" => {
                let index = index()?;
                if index == 0 {
                    return Err(malformed("the first effect has no previous effect"));
                }
                Ok(Directive::MergeEffectWithPrevious(index))
            }
            "_moveAbilityAtIndexToIndex" => {
                let items = list()?;
                Ok(Directive::MoveAbility {
                    from: index_at(items, 0)?,
                    to: index_at(items, 1)?,
                })
            }
            "_newlineAfterLabelIndex" => Ok(Directive::NewlineAfterLabel(index()?)),
            "_skipFullTextSectionMergeAtIndex" => Ok(Directive::SkipFullTextSectionMerge(index()?)),
            "_splitAbilityNameAtIndex" => {
                let items = list()?;
                let pattern = text_at(items, 1)?;
                let pattern = Regex::new(&pattern).map_err(|source| CorrectionError::InvalidPattern { pattern, source })?;
                Ok(Directive::SplitAbilityName {
                    index: index_at(items, 0)?,
                    pattern,
                })
            }
            _ => Err(malformed("unknown directive")),
        }
    }

    /// Combines two entries for the same key, as happens when a language table
    /// adds to the main one. List directives concatenate, others get replaced.
    fn merge(self, other: Directive) -> Directive {
        match (self, other) {
            (Directive::InsertAbilities(mut first), Directive::InsertAbilities(second)) => {
                first.extend(second);
                Directive::InsertAbilities(first)
            }
            (Directive::RemoveAbilities(mut first), Directive::RemoveAbilities(second)) => {
                first.extend(second);
                Directive::RemoveAbilities(first)
            }
            (_, other) => {
                warn!("Language-specific '{}' replaces the general one", other.key());
                other
            }
        }
    }
}

/// A field's ordered `(match, replacement)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCorrection {
    pub field: String,
    pub pairs: Vec<(Value, Value)>,
}

impl FieldCorrection {
    fn parse(field: &str, value: &Value) -> Result<Self, CorrectionError> {
        let items = value
            .as_array()
            .filter(|items| !items.is_empty() && items.len() % 2 == 0)
            .ok_or_else(|| CorrectionError::MalformedEntry {
                key: field.to_string(),
                reason: "expected a list of match/replacement pairs".to_string(),
            })?;
        Ok(Self {
            field: field.to_string(),
            pairs: items.chunks(2).map(|pair| (pair[0].clone(), pair[1].clone())).collect(),
        })
    }

    fn consumed_key(&self, position: usize) -> String {
        if self.pairs.len() == 1 {
            self.field.clone()
        } else {
            format!("{}#{}", self.field, position)
        }
    }
}

/// Correction keys a card has, and which of them have been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumedSet {
    expected: BTreeSet<String>,
    consumed: BTreeSet<String>,
}

impl ConsumedSet {
    pub fn expect(&mut self, key: impl Into<String>) {
        self.expected.insert(key.into());
    }

    pub fn consume(&mut self, key: &str) {
        if self.expected.contains(key) {
            self.consumed.insert(key.to_string());
        }
    }

    /// Keys that never applied, in key order.
    pub fn leftovers(&self) -> Vec<String> {
        self.expected.difference(&self.consumed).cloned().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.expected.len() == self.consumed.len()
    }
}

/// The corrections for a single card, plus the record of which ones applied.
#[derive(Debug, Clone, Default)]
pub struct CardCorrections {
    directives: Vec<Directive>,
    fields: Vec<FieldCorrection>,
    consumed: ConsumedSet,
}

impl CardCorrections {
    fn parse(card_id: u32, entries: &Map<String, Value>) -> Result<Self, CorrectionError> {
        let mut corrections = Self::default();
        for (key, value) in entries {
            let with_card = |err: CorrectionError| match err {
                CorrectionError::MalformedEntry { key, reason } => CorrectionError::MalformedEntry {
                    key: format!("{}/{}", card_id, key),
                    reason,
                },
                other => other,
            };
            if key.starts_with('_') {
                corrections.add_directive(Directive::parse(key, value).map_err(with_card)?);
            } else {
                corrections.add_field(FieldCorrection::parse(key, value).map_err(with_card)?);
            }
        }
        Ok(corrections)
    }

    fn add_directive(&mut self, directive: Directive) {
        let key = directive.key();
        match self.directives.iter().position(|existing| existing.key() == key) {
            Some(position) => {
                let existing = self.directives.remove(position);
                self.directives.insert(position, existing.merge(directive));
            }
            None => {
                self.consumed.expect(key);
                self.directives.push(directive);
            }
        }
    }

    fn add_field(&mut self, correction: FieldCorrection) {
        match self.fields.iter_mut().find(|existing| existing.field == correction.field) {
            Some(existing) => existing.pairs.extend(correction.pairs),
            None => self.fields.push(correction),
        }
    }

    fn merge(&mut self, other: CardCorrections) {
        for directive in other.directives {
            self.add_directive(directive);
        }
        for field in other.fields {
            self.add_field(field);
        }
    }

    fn register_field_keys(&mut self) {
        let keys: Vec<String> = self
            .fields
            .iter()
            .flat_map(|field| (0..field.pairs.len()).map(|position| field.consumed_key(position)))
            .collect();
        for key in keys {
            self.consumed.expect(key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.fields.is_empty()
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn mark_applied(&mut self, directive: &Directive) {
        self.consumed.consume(directive.key());
    }

    /// Applies all field corrections except the full-text ones to a card draft.
    pub fn apply_fields(&mut self, card: &mut Map<String, Value>) {
        let fields: Vec<&FieldCorrection> = self.fields.iter().filter(|f| f.field != FULL_TEXT_FIELD).collect();
        let applied = apply(card, fields);
        for key in applied {
            self.consumed.consume(&key);
        }
    }

    /// Applies the full-text corrections; these only make sense after assembly.
    pub fn apply_full_text(&mut self, card: &mut Map<String, Value>) {
        let fields: Vec<&FieldCorrection> = self.fields.iter().filter(|f| f.field == FULL_TEXT_FIELD).collect();
        let applied = apply(card, fields);
        for key in applied {
            self.consumed.consume(&key);
        }
    }

    pub fn has_field_correction(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    pub fn consumed(&self) -> &ConsumedSet {
        &self.consumed
    }

    pub fn into_consumed(self) -> ConsumedSet {
        self.consumed
    }
}

fn apply(card: &mut Map<String, Value>, fields: Vec<&FieldCorrection>) -> Vec<String> {
    let mut applied = Vec::new();
    for correction in fields {
        for (position, (matcher, replacement)) in correction.pairs.iter().enumerate() {
            match correct_field(card, &correction.field, matcher, replacement) {
                Ok(outcome) if outcome.applied() => applied.push(correction.consumed_key(position)),
                Ok(outcome) => warn!("Correction for '{}' had no effect ({:?})", correction.field, outcome),
                Err(err) => error!("Correction for '{}' failed: {}", correction.field, err),
            }
        }
    }
    applied
}

/// All card corrections for a run. Cards take their own slice out of it;
/// whatever is left at the end belongs to cards that were never parsed.
#[derive(Debug, Default)]
pub struct CorrectionTable {
    cards: BTreeMap<u32, CardCorrections>,
}

impl CorrectionTable {
    /// Loads `path`, plus the table for `language` next to it when present.
    pub fn load(path: &Path, language: Language) -> Result<Self> {
        let mut table = Self::read(path)?;
        let language_path = language_table_path(path, language);
        if language_path.is_file() {
            table.merge(Self::read(&language_path)?);
        } else {
            info!("No language-specific corrections at {}", language_path.display());
        }
        info!("Loaded corrections for {} cards", table.len());
        Ok(table)
    }

    fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| format!("Failed to read corrections file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid corrections file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Map<String, Value>> = serde_json::from_str(json)?;
        let mut cards = BTreeMap::new();
        for (id, entries) in raw {
            let card_id: u32 = id
                .trim()
                .parse()
                .map_err(|_| CorrectionError::MalformedEntry {
                    key: id.clone(),
                    reason: "card ids must be numbers".to_string(),
                })?;
            cards.insert(card_id, CardCorrections::parse(card_id, &entries)?);
        }
        Ok(Self { cards })
    }

    fn merge(&mut self, other: CorrectionTable) {
        for (id, corrections) in other.cards {
            match self.cards.get_mut(&id) {
                Some(existing) => existing.merge(corrections),
                None => {
                    self.cards.insert(id, corrections);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Removes and returns one card's corrections; empty if it has none.
    pub fn take(&mut self, card_id: u32) -> CardCorrections {
        let mut corrections = self.cards.remove(&card_id).unwrap_or_default();
        corrections.register_field_keys();
        corrections
    }

    /// Card ids with corrections that no card took.
    pub fn remaining_ids(&self) -> Vec<u32> {
        self.cards.keys().copied().collect()
    }
}

fn language_table_path(path: &Path, language: Language) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("corrections");
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    path.with_file_name(format!("{}_{}.{}", stem, language.code(), extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const TABLE: &str = r#"{
        "262": {
            "_moveKeywordsLast": true,
            "_insertAbilityAtIndex": [0, "Evasive", 2, "Draw a card.", "GIFT"],
            "_forceAbilityIndexToTriggered": 1,
            "version": ["Fax", "Fox"],
            "subtypes": [null, "Sorcerer", "^Hero$", null]
        },
        "12": {"fullText": ["Bodyquard", "Bodyguard"]}
    }"#;

    #[test]
    fn test_parse_directives_and_fields() {
        let mut table = CorrectionTable::from_json(TABLE).unwrap();
        assert_eq!(table.remaining_ids(), vec![12, 262]);

        let corrections = table.take(262);
        assert_eq!(corrections.directives().len(), 3);
        let inserted = corrections
            .directives()
            .iter()
            .find_map(|directive| match directive {
                Directive::InsertAbilities(inserted) => Some(inserted),
                _ => None,
            })
            .unwrap();
        assert_eq!(inserted.len(), 2);
        assert_eq!(inserted[1].index, 2);
        assert_eq!(inserted[1].name.as_deref(), Some("GIFT"));
        assert_eq!(inserted[0].name, None);
        assert!(corrections.has_field_correction("subtypes"));
        assert_eq!(
            corrections.consumed().leftovers(),
            vec![
                "_forceAbilityIndexToTriggered",
                "_insertAbilityAtIndex",
                "_moveKeywordsLast",
                "subtypes#0",
                "subtypes#1",
                "version"
            ]
        );
        assert_eq!(table.remaining_ids(), vec![12]);
    }

    #[test]
    fn test_applied_entries_are_consumed() {
        let mut table = CorrectionTable::from_json(TABLE).unwrap();
        let mut corrections = table.take(262);
        let mut card = json!({"version": "Fax", "subtypes": ["Storyborn", "Villain"]})
            .as_object()
            .cloned()
            .unwrap();

        corrections.apply_fields(&mut card);
        let directive = corrections
            .directives()
            .iter()
            .find(|directive| matches!(directive, Directive::MoveKeywordsLast))
            .cloned()
            .unwrap();
        corrections.mark_applied(&directive);

        assert_eq!(card["version"], "Fox");
        assert_eq!(card["subtypes"], json!(["Storyborn", "Villain", "Sorcerer"]));
        let leftovers = corrections.into_consumed().leftovers();
        assert_eq!(leftovers, vec!["_forceAbilityIndexToTriggered", "_insertAbilityAtIndex", "subtypes#1"]);
    }

    #[test]
    fn test_full_text_held_back() {
        let mut table = CorrectionTable::from_json(TABLE).unwrap();
        let mut corrections = table.take(12);
        let mut card = json!({"fullText": "Bodyquard"}).as_object().cloned().unwrap();

        corrections.apply_fields(&mut card);
        assert_eq!(card["fullText"], "Bodyquard");
        corrections.apply_full_text(&mut card);
        assert_eq!(card["fullText"], "Bodyguard");
        assert!(corrections.consumed().is_complete());
    }

    #[test]
    fn test_unknown_card_has_no_corrections() {
        let mut table = CorrectionTable::from_json(TABLE).unwrap();
        let corrections = table.take(999);
        assert!(corrections.is_empty());
        assert!(corrections.consumed().is_complete());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        assert!(CorrectionTable::from_json(r#"{"abc": {}}"#).is_err());
        assert!(CorrectionTable::from_json(r#"{"1": {"name": ["only a match"]}}"#).is_err());
        assert!(CorrectionTable::from_json(r#"{"1": {"_unknownThing": 1}}"#).is_err());
        assert!(CorrectionTable::from_json(r#"{"1": {"_mergeEffectIndexWithPrevious": 0}}"#).is_err());
        assert!(CorrectionTable::from_json(r#"{"1": {"_splitAbilityNameAtIndex": [0, "("]}}"#).is_err());
    }

    #[test]
    fn test_language_table_is_merged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrections.json");
        fs::write(&path, r#"{"5": {"name": ["a", "b"], "_removeAbilitiesAtIndexes": [1]}}"#).unwrap();
        fs::write(
            dir.path().join("corrections_de.json"),
            r#"{"5": {"name": ["c", "d"], "_removeAbilitiesAtIndexes": [3]}, "6": {"version": ["x", "y"]}}"#,
        )
        .unwrap();

        let mut table = CorrectionTable::load(&path, Language::German).unwrap();
        assert_eq!(table.remaining_ids(), vec![5, 6]);
        let corrections = table.take(5);
        assert!(matches!(&corrections.directives()[0], Directive::RemoveAbilities(indexes) if *indexes == vec![1, 3]));
        assert_eq!(corrections.consumed().leftovers(), vec!["_removeAbilitiesAtIndexes", "name#0", "name#1"]);

        let english = CorrectionTable::load(&path, Language::English).unwrap();
        assert_eq!(english.remaining_ids(), vec![5]);
    }
}
