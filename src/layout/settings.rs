//! Per-card parse settings: which layouts to use and how to find ability labels.
//!
//! Most cards use the defaults. Promo groupings, quest sets and the later
//! enchanted designs print their text box differently and get their own
//! settings. Individual cards can still override fields through the manifest.

use serde::{Deserialize, Serialize};

use super::area::TextPolarity;
use super::template::{self, CardLayout};
use crate::identifier::Identifier;

/// Label offset shared by several promo designs that have a frame inside the text box.
const OPTIONAL_TEXTBOX_OFFSET: u32 = 41;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelParsingMethod {
    /// Scan down the left edge of the text box for dark label blocks.
    #[default]
    Default,
    /// Labels are not drawn as blocks; split the recognized text at uppercase runs instead.
    WhiteAbilityText,
    /// Find label edges as horizontal lines.
    ByLines,
    /// The card has no labels worth looking for.
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskColor {
    White,
    Black,
}

impl MaskColor {
    pub fn luma(self) -> u8 {
        match self {
            MaskColor::White => 255,
            MaskColor::Black => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParseSettings {
    pub card_layout: CardLayout,
    pub character_layout: CardLayout,
    pub location_layout: CardLayout,
    /// Column scanned for labels, and left inset of the remainder and flavor crops.
    pub textbox_offset: u32,
    pub textbox_right_offset: u32,
    pub label_method: LabelParsingMethod,
    pub text_polarity: TextPolarity,
    pub label_polarity: TextPolarity,
    pub label_mask: MaskColor,
    pub identifier_from_card: bool,
    pub has_flavor_text_override: Option<bool>,
    pub is_location_override: Option<bool>,
    pub is_item_override: Option<bool>,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            card_layout: template::DEFAULT,
            character_layout: template::DEFAULT_CHARACTER,
            location_layout: template::DEFAULT_LOCATION,
            textbox_offset: 0,
            textbox_right_offset: 0,
            label_method: LabelParsingMethod::Default,
            text_polarity: TextPolarity::Black,
            label_polarity: TextPolarity::White,
            label_mask: MaskColor::White,
            identifier_from_card: false,
            has_flavor_text_override: None,
            is_location_override: None,
            is_item_override: None,
        }
    }
}

impl ParseSettings {
    fn enchanted() -> Self {
        Self {
            card_layout: template::ENCHANTED,
            character_layout: template::ENCHANTED_CHARACTER,
            location_layout: template::ENCHANTED_LOCATION,
            ..Self::default()
        }
    }

    fn new_enchanted(label_method: LabelParsingMethod, text_polarity: TextPolarity) -> Self {
        Self {
            card_layout: template::NEW_ENCHANTED,
            character_layout: template::NEW_ENCHANTED_CHARACTER,
            location_layout: template::NEW_ENCHANTED_LOCATION,
            label_method,
            text_polarity,
            label_polarity: TextPolarity::WhiteOnLight,
            ..Self::default()
        }
    }

    fn quest(textbox_offset: u32, textbox_right_offset: u32) -> Self {
        Self {
            card_layout: template::QUEST,
            character_layout: template::QUEST_CHARACTER,
            textbox_offset,
            textbox_right_offset,
            label_method: LabelParsingMethod::WhiteAbilityText,
            text_polarity: TextPolarity::White,
            label_mask: MaskColor::Black,
            ..Self::default()
        }
    }

    fn for_grouping(grouping: &str) -> Option<Self> {
        match grouping {
            "C1" => Some(Self {
                textbox_offset: OPTIONAL_TEXTBOX_OFFSET,
                ..Self::default()
            }),
            "D23" => Some(Self {
                identifier_from_card: true,
                textbox_offset: OPTIONAL_TEXTBOX_OFFSET,
                label_method: LabelParsingMethod::ByLines,
                ..Self::default()
            }),
            "P1" => Some(Self {
                identifier_from_card: true,
                ..Self::default()
            }),
            _ => None,
        }
    }

    fn for_set(set_code: &str) -> Option<Self> {
        match set_code {
            "Q1" => Some(Self::quest(0, 0)),
            "Q2" => Some(Self::quest(26, 24)),
            _ => None,
        }
    }

    fn for_enchanted_set(set_code: &str) -> Option<Self> {
        use LabelParsingMethod::{ByLines, WhiteAbilityText};
        match set_code {
            "5" | "7" | "8" => Some(Self::new_enchanted(WhiteAbilityText, TextPolarity::WhiteOnLight)),
            "6" => Some(Self::new_enchanted(ByLines, TextPolarity::Black)),
            _ => None,
        }
    }

    /// Picks settings for a card: grouping, then set, then enchanted design, then defaults.
    /// Manifest overrides are applied on top of whichever was picked.
    pub fn resolve(
        identifier: Option<&Identifier>,
        is_enchanted: bool,
        overrides: Option<&ParseOverrides>,
    ) -> Self {
        let base = identifier
            .and_then(|id| {
                id.is_promo()
                    .then(|| Self::for_grouping(&id.grouping))
                    .flatten()
                    .or_else(|| id.is_quest().then(|| Self::for_set(&id.set_code)).flatten())
                    .or_else(|| {
                        if is_enchanted {
                            Self::for_enchanted_set(&id.set_code)
                        } else {
                            None
                        }
                    })
            })
            .unwrap_or_else(|| {
                if is_enchanted {
                    Self::enchanted()
                } else {
                    Self::default()
                }
            });

        match overrides {
            Some(overrides) => overrides.apply(base),
            None => base,
        }
    }

    pub fn layout_for(&self, is_character: bool, is_location: bool) -> &CardLayout {
        if is_character {
            &self.character_layout
        } else if is_location {
            &self.location_layout
        } else {
            &self.card_layout
        }
    }
}

/// Per-card adjustments read from the manifest. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOverrides {
    pub textbox_offset: Option<u32>,
    pub textbox_right_offset: Option<u32>,
    pub label_method: Option<LabelParsingMethod>,
    pub text_polarity: Option<TextPolarity>,
    pub label_polarity: Option<TextPolarity>,
    pub label_mask: Option<MaskColor>,
    pub identifier_from_card: Option<bool>,
    pub has_flavor_text: Option<bool>,
    pub is_location: Option<bool>,
    pub is_item: Option<bool>,
}

impl ParseOverrides {
    fn apply(&self, mut settings: ParseSettings) -> ParseSettings {
        if let Some(offset) = self.textbox_offset {
            settings.textbox_offset = offset;
        }
        if let Some(offset) = self.textbox_right_offset {
            settings.textbox_right_offset = offset;
        }
        if let Some(method) = self.label_method {
            settings.label_method = method;
        }
        if let Some(polarity) = self.text_polarity {
            settings.text_polarity = polarity;
        }
        if let Some(polarity) = self.label_polarity {
            settings.label_polarity = polarity;
        }
        if let Some(mask) = self.label_mask {
            settings.label_mask = mask;
        }
        if let Some(from_card) = self.identifier_from_card {
            settings.identifier_from_card = from_card;
        }
        settings.has_flavor_text_override = self.has_flavor_text.or(settings.has_flavor_text_override);
        settings.is_location_override = self.is_location.or(settings.is_location_override);
        settings.is_item_override = self.is_item.or(settings.is_item_override);
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = ParseSettings::resolve(Some(&id("12/204 • EN • 3")), false, None);
        assert_eq!(settings, ParseSettings::default());

        let settings = ParseSettings::resolve(None, false, None);
        assert_eq!(settings.label_method, LabelParsingMethod::Default);
    }

    #[test]
    fn test_resolve_grouping_beats_enchanted() {
        let settings = ParseSettings::resolve(Some(&id("3/D23 • EN • 1")), true, None);
        assert_eq!(settings.label_method, LabelParsingMethod::ByLines);
        assert_eq!(settings.textbox_offset, OPTIONAL_TEXTBOX_OFFSET);
        assert!(settings.identifier_from_card);
    }

    #[test]
    fn test_resolve_enchanted_by_set() {
        let settings = ParseSettings::resolve(Some(&id("210/204 • EN • 6")), true, None);
        assert_eq!(settings.label_method, LabelParsingMethod::ByLines);
        assert_eq!(settings.card_layout, template::NEW_ENCHANTED);

        let settings = ParseSettings::resolve(Some(&id("205/204 • EN • 2")), true, None);
        assert_eq!(settings.card_layout, template::ENCHANTED);
        assert_eq!(settings.label_method, LabelParsingMethod::Default);
    }

    #[test]
    fn test_resolve_quest_set() {
        let settings = ParseSettings::resolve(Some(&id("4/31 • EN • Q2")), false, None);
        assert_eq!(settings.textbox_offset, 26);
        assert_eq!(settings.textbox_right_offset, 24);
        assert_eq!(settings.label_mask, MaskColor::Black);
    }

    #[test]
    fn test_overrides_apply_on_top() {
        let overrides: ParseOverrides =
            serde_json::from_str(r#"{"textboxOffset": 24, "labelMethod": "none", "hasFlavorText": false}"#).unwrap();
        let settings = ParseSettings::resolve(Some(&id("12/204 • EN • 3")), false, Some(&overrides));
        assert_eq!(settings.textbox_offset, 24);
        assert_eq!(settings.label_method, LabelParsingMethod::None);
        assert_eq!(settings.has_flavor_text_override, Some(false));
        assert_eq!(settings.is_location_override, None);
    }
}
