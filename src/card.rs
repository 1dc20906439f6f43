//! Card records going in (manifest metadata) and coming out (parsed card).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::language::Language;
use crate::layout::ParseOverrides;
use crate::reconstruct::Ability;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Action,
    #[default]
    Character,
    Item,
    Location,
}

impl CardType {
    /// Reads the main type from the start of the type bar.
    pub fn from_type_bar(text: &str, language: Language) -> Option<Self> {
        let names = language.type_names();
        let first = text.split(crate::symbols::SEPARATOR).next()?.trim();
        [
            (names.action, CardType::Action),
            (names.item, CardType::Item),
            (names.location, CardType::Location),
            (names.character, CardType::Character),
        ]
        .into_iter()
        .find(|(name, _)| first.starts_with(name))
        .map(|(_, card_type)| card_type)
    }

    pub fn name(self, language: Language) -> &'static str {
        let names = language.type_names();
        match self {
            CardType::Action => names.action,
            CardType::Character => names.character,
            CardType::Item => names.item,
            CardType::Location => names.location,
        }
    }
}

/// What is known about a card before its image is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMetadata {
    pub id: u32,
    /// Image file relative to the image directory; `<id>.png` when absent.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "type")]
    pub card_type: Option<CardType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub enchanted: Option<bool>,
    #[serde(default)]
    pub has_rules_text: Option<bool>,
    #[serde(default)]
    pub has_flavor_text: Option<bool>,
    /// Printed identifier line, e.g. `12/204 • EN • 3`.
    #[serde(default)]
    pub identifier: Option<String>,
    /// The card text as published, used to check ability names and dashes.
    #[serde(default)]
    pub rules_text: Option<String>,
    #[serde(default)]
    pub parse_settings: Option<ParseOverrides>,
}

impl CardMetadata {
    pub fn image_file_name(&self) -> String {
        self.image.clone().unwrap_or_else(|| format!("{}.png", self.id))
    }
}

pub fn load_manifest(path: &Path) -> Result<Vec<CardMetadata>> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read card manifest {}", path.display()))?;
    let cards: Vec<CardMetadata> =
        serde_json::from_str(&json).with_context(|| format!("Invalid card manifest {}", path.display()))?;
    Ok(cards)
}

/// The structured result for one card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCard {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub full_name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub cost: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub willpower: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_cost: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtypes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<Ability>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keyword_abilities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor_text: Option<String>,
    pub full_text: String,
    pub full_text_sections: Vec<String>,
    pub artists_text: String,
    pub artists: Vec<String>,
    pub full_identifier: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_type_from_type_bar() {
        assert_eq!(CardType::from_type_bar("Action • Song", Language::English), Some(CardType::Action));
        assert_eq!(CardType::from_type_bar("Storyborn • Hero", Language::English), None);
        assert_eq!(CardType::from_type_bar("Lieu", Language::French), Some(CardType::Location));
        assert_eq!(CardType::Item.name(Language::German), "Gegenstand");
    }

    #[test]
    fn test_load_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.json");
        fs::write(
            &path,
            r#"[
                {"id": 1, "type": "character", "name": "Ariel", "version": "On Human Legs", "hasFlavorText": true},
                {"id": 2, "image": "two.jpg", "parseSettings": {"labelMethod": "none"}}
            ]"#,
        )
        .unwrap();

        let cards = load_manifest(&path).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].card_type, Some(CardType::Character));
        assert_eq!(cards[0].has_flavor_text, Some(true));
        assert_eq!(cards[0].image_file_name(), "1.png");
        assert_eq!(cards[1].image_file_name(), "two.jpg");
        assert!(cards[1].parse_settings.is_some());
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.json");
        fs::write(&path, "{}").unwrap();
        assert!(load_manifest(&path).is_err());
    }
}
