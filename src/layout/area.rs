//! Fixed card regions, in pixels of the canonical card image.
//!
//! Coordinates are `left, top, right, bottom` against a 1468×2048 portrait
//! image. Location regions are against the same image rotated 90° clockwise.

use serde::{Deserialize, Serialize};

pub const IMAGE_WIDTH: u32 = 1468;
pub const IMAGE_HEIGHT: u32 = 2048;

/// How text in a region separates from its background, and the binarisation that isolates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextPolarity {
    /// Light text on a dark background.
    White,
    /// Light text on a light background, needs a high cut-off.
    WhiteOnLight,
    /// Dark text on a light background.
    Black,
    /// Dark text on a mid-tone background.
    Middle,
}

impl TextPolarity {
    pub fn threshold(self) -> u8 {
        match self {
            TextPolarity::White => 148,
            TextPolarity::WhiteOnLight => 233,
            TextPolarity::Black => 50,
            TextPolarity::Middle => 127,
        }
    }

    /// Inverted polarities turn the light text dark, since the recognizer wants dark on light.
    pub fn is_inverted(self) -> bool {
        matches!(self, TextPolarity::White | TextPolarity::WhiteOnLight)
    }
}

/// Pixel rectangle, `right` and `bottom` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageArea {
    pub key: &'static str,
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub polarity: TextPolarity,
    pub is_numeric: bool,
}

impl ImageArea {
    const fn new(key: &'static str, coords: (u32, u32, u32, u32), polarity: TextPolarity) -> Self {
        Self {
            key,
            left: coords.0,
            top: coords.1,
            right: coords.2,
            bottom: coords.3,
            polarity,
            is_numeric: false,
        }
    }

    const fn numeric(mut self) -> Self {
        self.is_numeric = true;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }
}

use TextPolarity::{Black, Middle, White, WhiteOnLight};

pub const TYPE: ImageArea = ImageArea::new("type", (168, 1300, 1298, 1360), White);
pub const INK_COST: ImageArea = ImageArea::new("inkCost", (101, 116, 191, 197), White).numeric();
pub const CHARACTER_NAME: ImageArea = ImageArea::new("characterName", (60, 1111, 1026, 1213), WhiteOnLight);
pub const CARD_NAME: ImageArea = ImageArea::new("cardName", (88, 1124, 1393, 1245), WhiteOnLight);
pub const CHARACTER_VERSION: ImageArea = ImageArea::new("characterVersion", (60, 1213, 1026, 1287), WhiteOnLight);
pub const STRENGTH: ImageArea = ImageArea::new("strength", (1099, 1146, 1188, 1244), Black).numeric();
pub const WILLPOWER: ImageArea = ImageArea::new("willpower", (1273, 1146, 1362, 1244), White).numeric();
pub const CHARACTER_TEXT_BOX: ImageArea = ImageArea::new("textbox", (66, 1378, 1311, 1901), Middle);
pub const ENCHANTED_CHARACTER_TEXT_BOX: ImageArea = ImageArea::new("textbox", (36, 1395, 1309, 1901), Middle);
pub const FULL_WIDTH_TEXT_BOX: ImageArea = ImageArea::new("textbox", (66, 1378, 1400, 1901), Middle);
pub const ENCHANTED_FULL_WIDTH_TEXT_BOX: ImageArea = ImageArea::new("textbox", (35, 1378, 1435, 1901), Middle);
pub const ARTIST: ImageArea = ImageArea::new("artist", (109, 1925, 652, 1969), White);
pub const CARD_IDENTIFIER: ImageArea = ImageArea::new("identifier", (54, 1969, 359, 2020), White);

pub const LOCATION_NAME: ImageArea = ImageArea::new("locationName", (424, 740, 1700, 849), WhiteOnLight);
pub const LOCATION_VERSION: ImageArea = ImageArea::new("locationVersion", (424, 846, 1700, 918), WhiteOnLight);
pub const LOCATION_TYPE: ImageArea = ImageArea::new("locationType", (210, 934, 1855, 998), White);
pub const LOCATION_TEXT_BOX: ImageArea = ImageArea::new("textbox", (65, 1017, 1818, 1317), Middle);
pub const ENCHANTED_LOCATION_TEXT_BOX: ImageArea = ImageArea::new("textbox", (20, 1017, 1818, 1317), Middle);
pub const LOCATION_MOVE_COST: ImageArea = ImageArea::new("moveCost", (152, 767, 227, 860), WhiteOnLight).numeric();
pub const LOCATION_WILLPOWER: ImageArea = ImageArea::new("locationWillpower", (1827, 767, 1919, 873), WhiteOnLight).numeric();
pub const LOCATION_ARTIST: ImageArea = ImageArea::new("locationArtist", (112, 1331, 948, 1381), White);
pub const LOCATION_IDENTIFIER: ImageArea = ImageArea::new("locationIdentifier", (54, 1381, 365, 1431), White);

pub const QUEST_TEXT_BOX: ImageArea = ImageArea::new("textbox", (78, 1378, 1311, 1882), White);
pub const QUEST_FULL_WIDTH_TEXT_BOX: ImageArea = ImageArea::new("textbox", (78, 1378, 1400, 1861), White);

pub const NEW_ENCHANTED_TYPE: ImageArea = ImageArea::new("newEnchantedType", (138, 1320, 979, 1376), Middle);
pub const NEW_ENCHANTED_LOCATION_TYPE: ImageArea = ImageArea::new("newEnchantedLocationType", (622, 891, 1487, 944), Middle);
pub const NEW_ENCHANTED_CARD_NAME: ImageArea = ImageArea::new("newEnchantedCardName", (287, 1213, 1215, 1290), White);
pub const NEW_ENCHANTED_CHARACTER_NAME: ImageArea = ImageArea::new("newEnchantedCharacterName", (68, 1162, 1087, 1238), White);
pub const NEW_ENCHANTED_VERSION: ImageArea = ImageArea::new("newEnchantedVersion", (68, 1238, 1087, 1300), White);
pub const NEW_ENCHANTED_CHARACTER_TEXT_BOX: ImageArea = ImageArea::new("textbox", (134, 1388, 1261, 1869), WhiteOnLight);
pub const NEW_ENCHANTED_FULL_WIDTH_TEXT_BOX: ImageArea = ImageArea::new("textbox", (134, 1406, 1375, 1843), White);
pub const NEW_ENCHANTED_LOCATION_TEXT_BOX: ImageArea = ImageArea::new("textbox", (127, 954, 1686, 1286), White);

/// Sample area: the thick black bottom border of a location card, seen before rotation.
pub const IS_LOCATION_CHECK: ImageArea = ImageArea::new("isLocation", (1330, 414, 1392, 848), Middle);
/// Sample area: regular cards have a black left border, borderless (enchanted) art doesn't.
pub const IS_BORDERLESS_CHECK: ImageArea = ImageArea::new("isBorderless", (5, 260, 40, 1290), Middle);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_thresholds() {
        assert_eq!(White.threshold(), 148);
        assert!(White.is_inverted());
        assert!(WhiteOnLight.is_inverted());
        assert!(!Black.is_inverted());
        assert_eq!(Middle.threshold(), 127);
    }

    #[test]
    fn test_portrait_regions_fit_canonical_image() {
        for area in [
            TYPE, INK_COST, CHARACTER_NAME, CARD_NAME, CHARACTER_VERSION, STRENGTH, WILLPOWER,
            CHARACTER_TEXT_BOX, FULL_WIDTH_TEXT_BOX, ENCHANTED_FULL_WIDTH_TEXT_BOX, ARTIST,
            CARD_IDENTIFIER, QUEST_TEXT_BOX, IS_LOCATION_CHECK, IS_BORDERLESS_CHECK,
        ] {
            assert!(area.right <= IMAGE_WIDTH, "{} too wide", area.key);
            assert!(area.bottom <= IMAGE_HEIGHT, "{} too tall", area.key);
            assert!(!area.rect().is_empty());
        }
    }

    #[test]
    fn test_location_regions_fit_rotated_image() {
        for area in [LOCATION_NAME, LOCATION_TYPE, LOCATION_TEXT_BOX, LOCATION_WILLPOWER, LOCATION_IDENTIFIER] {
            assert!(area.right <= IMAGE_HEIGHT, "{} too wide", area.key);
            assert!(area.bottom <= IMAGE_WIDTH, "{} too tall", area.key);
        }
    }
}
