//! Which fixed regions make up each card archetype.

use super::area::{self, ImageArea};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardLayout {
    pub name: ImageArea,
    pub types: ImageArea,
    pub textbox: ImageArea,
    /// Subtitle, only on characters and locations.
    pub version: Option<ImageArea>,
    pub strength: Option<ImageArea>,
    pub willpower: Option<ImageArea>,
    pub move_cost: Option<ImageArea>,
    pub artist: ImageArea,
    pub identifier: ImageArea,
}

impl CardLayout {
    const fn basic(name: ImageArea, types: ImageArea, textbox: ImageArea) -> Self {
        Self {
            name,
            types,
            textbox,
            version: None,
            strength: None,
            willpower: None,
            move_cost: None,
            artist: area::ARTIST,
            identifier: area::CARD_IDENTIFIER,
        }
    }

    const fn with_textbox(mut self, textbox: ImageArea) -> Self {
        self.textbox = textbox;
        self
    }
}

pub const DEFAULT: CardLayout = CardLayout::basic(area::CARD_NAME, area::TYPE, area::FULL_WIDTH_TEXT_BOX);

pub const DEFAULT_CHARACTER: CardLayout = CardLayout {
    version: Some(area::CHARACTER_VERSION),
    strength: Some(area::STRENGTH),
    willpower: Some(area::WILLPOWER),
    ..CardLayout::basic(area::CHARACTER_NAME, area::TYPE, area::CHARACTER_TEXT_BOX)
};

pub const DEFAULT_LOCATION: CardLayout = CardLayout {
    version: Some(area::LOCATION_VERSION),
    willpower: Some(area::LOCATION_WILLPOWER),
    move_cost: Some(area::LOCATION_MOVE_COST),
    artist: area::LOCATION_ARTIST,
    identifier: area::LOCATION_IDENTIFIER,
    ..CardLayout::basic(area::LOCATION_NAME, area::LOCATION_TYPE, area::LOCATION_TEXT_BOX)
};

pub const ENCHANTED: CardLayout = DEFAULT.with_textbox(area::ENCHANTED_FULL_WIDTH_TEXT_BOX);
pub const ENCHANTED_CHARACTER: CardLayout = DEFAULT_CHARACTER.with_textbox(area::ENCHANTED_CHARACTER_TEXT_BOX);
pub const ENCHANTED_LOCATION: CardLayout = DEFAULT_LOCATION.with_textbox(area::ENCHANTED_LOCATION_TEXT_BOX);

pub const QUEST: CardLayout = DEFAULT.with_textbox(area::QUEST_FULL_WIDTH_TEXT_BOX);
pub const QUEST_CHARACTER: CardLayout = DEFAULT.with_textbox(area::QUEST_TEXT_BOX);

pub const NEW_ENCHANTED: CardLayout = CardLayout::basic(
    area::NEW_ENCHANTED_CARD_NAME,
    area::NEW_ENCHANTED_TYPE,
    area::NEW_ENCHANTED_FULL_WIDTH_TEXT_BOX,
);

pub const NEW_ENCHANTED_CHARACTER: CardLayout = CardLayout {
    version: Some(area::NEW_ENCHANTED_VERSION),
    strength: Some(area::STRENGTH),
    willpower: Some(area::WILLPOWER),
    ..CardLayout::basic(
        area::NEW_ENCHANTED_CHARACTER_NAME,
        area::NEW_ENCHANTED_TYPE,
        area::NEW_ENCHANTED_CHARACTER_TEXT_BOX,
    )
};

pub const NEW_ENCHANTED_LOCATION: CardLayout = CardLayout {
    types: area::NEW_ENCHANTED_LOCATION_TYPE,
    ..ENCHANTED_LOCATION.with_textbox(area::NEW_ENCHANTED_LOCATION_TEXT_BOX)
};
