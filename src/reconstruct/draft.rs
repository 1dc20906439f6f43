use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ability::AbilityDraft;
use super::ReconstructError;
use crate::correction::{CardCorrections, FULL_TEXT_FIELD};

/// A card while its fields are still being corrected. The JSON field names
/// are the ones the correction table refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub cost: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub willpower: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_cost: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<AbilityDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtypes: Vec<String>,
    #[serde(default)]
    pub artists_text: String,
    #[serde(default)]
    pub full_identifier: String,
}

impl CardDraft {
    pub fn full_name(&self) -> String {
        match &self.version {
            Some(version) => format!("{} - {}", self.name, version),
            None => self.name.clone(),
        }
    }

    /// Runs the card's field corrections (all but the full text) over its JSON form.
    pub fn apply_field_corrections(&mut self, corrections: &mut CardCorrections) -> Result<(), ReconstructError> {
        let mut value = serde_json::to_value(&*self)?;
        if let Some(fields) = value.as_object_mut() {
            corrections.apply_fields(fields);
        }
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}

/// Runs the full-text corrections on the assembled text.
pub fn correct_full_text(full_text: String, corrections: &mut CardCorrections) -> String {
    if !corrections.has_field_correction(FULL_TEXT_FIELD) {
        return full_text;
    }
    let mut fields = Map::new();
    fields.insert(FULL_TEXT_FIELD.to_string(), Value::String(full_text.clone()));
    corrections.apply_full_text(&mut fields);
    match fields.remove(FULL_TEXT_FIELD) {
        Some(Value::String(corrected)) => corrected,
        _ => full_text,
    }
}
