//! Reads every region of one card image into raw text.

use anyhow::{Context, Result};
use image::{GrayImage, RgbaImage};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::{TextRecognizer, preprocess, recognize_region};
use crate::card::{CardMetadata, CardType};
use crate::identifier::Identifier;
use crate::language::Language;
use crate::layout::{ImageArea, LabelParsingMethod, ParseSettings, area};
use crate::locator::{self, FixedRegion, LocateFlags, RegionSet};
use crate::reconstruct::split_white_ability_text;
use crate::symbols::SEPARATOR_STRING;

/// The type bar separator dot is rarely read as-is.
static TYPE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" (\S )?").expect("type separator regex is valid"));

/// Raw recognized text of one card, before any correction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrResult {
    pub card_type: CardType,
    /// Subtypes part of the type bar, with the main type removed.
    pub type_bar: String,
    pub cost: String,
    pub name: String,
    pub version: Option<String>,
    pub strength: Option<String>,
    pub willpower: Option<String>,
    pub move_cost: Option<String>,
    pub artists: String,
    pub identifier: String,
    /// Labels and their texts, top to bottom. Both lists have the same length.
    pub ability_labels: Vec<String>,
    pub ability_texts: Vec<String>,
    pub remaining_text: Option<String>,
    pub flavor_text: Option<String>,
}

/// Loads `<image_dir>/<image>` and reads it. An unreadable image is fatal for the card.
pub fn read_card(
    recognizer: &mut dyn TextRecognizer,
    card: &CardMetadata,
    image_dir: &Path,
    language: Language,
    debug_dir: Option<&Path>,
) -> Result<OcrResult> {
    let path = image_dir.join(card.image_file_name());
    let image = image::open(&path)
        .with_context(|| format!("Failed to open image {} for card {}", path.display(), card.id))?
        .to_rgba8();
    read_card_image(recognizer, card, image, language, debug_dir)
}

/// Reads an already loaded card image.
pub fn read_card_image(
    recognizer: &mut dyn TextRecognizer,
    card: &CardMetadata,
    image: RgbaImage,
    language: Language,
    debug_dir: Option<&Path>,
) -> Result<OcrResult> {
    let mut image = preprocess::normalize_size(image);
    let dump = DebugDump::new(debug_dir, card.id);

    // The cost sits in the top left whether or not the card gets rotated
    let cost_region = locator::crop_fixed(&preprocess::to_gray(&image), area::INK_COST);
    dump.save(&cost_region.image, cost_region.area.key);
    let cost = recognize_region(recognizer, &cost_region)?;

    let overrides = card.parse_settings.as_ref();
    let is_location = match (overrides.and_then(|o| o.is_location), card.card_type) {
        (Some(forced), _) => forced,
        (None, Some(card_type)) => card_type == CardType::Location,
        // Locations have a thick black border along what is the right edge before rotating
        (None, None) => preprocess::is_image_black(&preprocess::crop(&image, area::IS_LOCATION_CHECK.rect())),
    };
    if is_location {
        debug!("Card {} is a location, rotating", card.id);
        image = preprocess::rotate_clockwise(&image);
    }
    let gray = preprocess::to_gray(&image);

    let is_enchanted = card
        .enchanted
        .unwrap_or_else(|| !preprocess::is_image_black(&preprocess::crop(&image, area::IS_BORDERLESS_CHECK.rect())));

    let known_identifier = card.identifier.as_deref().and_then(Identifier::parse);
    let mut identifier_text = None;
    if known_identifier.is_none() {
        let area = if is_location { area::LOCATION_IDENTIFIER } else { area::CARD_IDENTIFIER };
        identifier_text = Some(read_fixed(recognizer, &gray, area, &dump)?);
    }
    let identifier = known_identifier.or_else(|| identifier_text.as_deref().and_then(Identifier::parse));
    let settings = ParseSettings::resolve(identifier.as_ref(), is_enchanted, overrides);
    debug!(
        "Card {}: location={}, enchanted={}, label method {:?}",
        card.id, is_location, is_enchanted, settings.label_method
    );

    let types_area = settings.layout_for(false, is_location).types;
    let type_region = FixedRegion {
        area: types_area,
        image: preprocess::threshold(&preprocess::crop(&gray, types_area.rect()), types_area.polarity),
    };
    dump.save(&type_region.image, types_area.key);
    let raw_types = recognize_region(recognizer, &type_region)?;
    let (card_type, type_bar) = split_type_bar(&raw_types, card, is_location, &settings, language);
    debug!("Card {} type {:?}, subtypes {:?}", card.id, card_type, type_bar);

    let layout = *settings.layout_for(card_type == CardType::Character, is_location);
    let flags = LocateFlags {
        has_rules_text: card.has_rules_text,
        has_flavor_text: card.has_flavor_text,
    };
    let regions = locator::locate(&gray, &layout, &settings, flags);
    for region in &regions.fixed {
        dump.save(&region.image, region.area.key);
    }

    let name = read_optional(recognizer, &regions, Some(layout.name))?.unwrap_or_default();
    let version = read_optional(recognizer, &regions, layout.version)?;
    let strength = read_optional(recognizer, &regions, layout.strength)?;
    let willpower = read_optional(recognizer, &regions, layout.willpower)?;
    let move_cost = read_optional(recognizer, &regions, layout.move_cost)?;
    let artists = read_optional(recognizer, &regions, Some(layout.artist))?.unwrap_or_default();
    if identifier_text.is_none() && settings.identifier_from_card {
        identifier_text = read_optional(recognizer, &regions, Some(layout.identifier))?;
    }
    let identifier = match (&card.identifier, identifier_text) {
        (_, Some(text)) => text,
        (Some(known), None) => known.clone(),
        (None, None) => String::new(),
    };

    let mut result = OcrResult {
        card_type,
        type_bar,
        cost,
        name,
        version,
        strength,
        willpower,
        move_cost,
        artists,
        identifier,
        ..OcrResult::default()
    };
    read_textbox(recognizer, &regions, &settings, &dump, &mut result)?;
    info!(
        "Read card {}: {} labels, remaining text: {}, flavor text: {}",
        card.id,
        result.ability_labels.len(),
        result.remaining_text.is_some(),
        result.flavor_text.is_some()
    );
    Ok(result)
}

fn read_optional(recognizer: &mut dyn TextRecognizer, regions: &RegionSet, area: Option<ImageArea>) -> Result<Option<String>> {
    match area.and_then(|area| regions.fixed(area.key)) {
        Some(region) => Ok(Some(recognize_region(recognizer, region)?)),
        None => Ok(None),
    }
}

fn read_fixed(recognizer: &mut dyn TextRecognizer, gray: &GrayImage, area: ImageArea, dump: &DebugDump) -> Result<String> {
    let region = locator::crop_fixed(gray, area);
    dump.save(&region.image, area.key);
    recognize_region(recognizer, &region)
}

/// Decides the card type and strips the main type from the type bar text.
fn split_type_bar(
    raw: &str,
    card: &CardMetadata,
    is_location: bool,
    settings: &ParseSettings,
    language: Language,
) -> (CardType, String) {
    let mut text = raw.trim_matches(|c| "\"'‘-1|{} \n".contains(c));
    if let Some((_, last)) = text.rsplit_once('\n') {
        debug!("Removing part before newline from type bar {:?}", text);
        text = last;
    }
    let names = language.type_names();
    let text = if names.is_non_character(text) {
        String::new()
    } else {
        TYPE_SEPARATOR.replace_all(text, SEPARATOR_STRING).into_owned()
    };

    let recognized = CardType::from_type_bar(&text, language);
    let card_type = match card.card_type {
        Some(card_type) => card_type,
        None if is_location => CardType::Location,
        None if settings.is_item_override == Some(true) => CardType::Item,
        None => recognized.unwrap_or_else(|| {
            if raw.contains(names.action) {
                CardType::Action
            } else if raw.contains(names.item) {
                CardType::Item
            } else {
                CardType::Character
            }
        }),
    };

    let subtypes = match recognized {
        Some(main) => text
            .strip_prefix(main.name(language))
            .map(|rest| rest.trim_start_matches(SEPARATOR_STRING).trim().to_string())
            .unwrap_or_default(),
        None => text,
    };
    (card_type, subtypes)
}

fn read_textbox(
    recognizer: &mut dyn TextRecognizer,
    regions: &RegionSet,
    settings: &ParseSettings,
    dump: &DebugDump,
    result: &mut OcrResult,
) -> Result<()> {
    let textbox = &regions.textbox;
    for (index, (label, body)) in textbox.labels.iter().zip(&textbox.bodies).enumerate() {
        dump.save(label, &format!("label_{index}"));
        dump.save(body, &format!("body_{index}"));
        let label_text = recognizer.recognize(label, false)?;
        let body_text = recognizer.recognize(body, false)?;
        debug!("Label {}: {:?}, text: {:?}", index, label_text.trim(), body_text.trim());
        result.ability_labels.push(label_text.trim().to_string());
        result.ability_texts.push(body_text.trim().to_string());
    }

    if let Some(remainder) = &textbox.remainder {
        dump.save(remainder, "remainder");
        let mut text = recognizer.recognize(remainder, false)?.trim().to_string();
        if settings.label_method == LabelParsingMethod::WhiteAbilityText
            && let Some(split) = split_white_ability_text(&text)
        {
            debug!("Split {} labels out of white ability text", split.labels.len());
            result.ability_labels.extend(split.labels);
            result.ability_texts.extend(split.effects);
            text = split.remaining;
        }
        if !text.is_empty() {
            result.remaining_text = Some(text);
        }
    }

    if let Some(flavor) = &textbox.flavor {
        dump.save(flavor, "flavor");
        let text = recognizer.recognize(flavor, false)?.trim().to_string();
        if !text.is_empty() {
            result.flavor_text = Some(text);
        }
    }
    Ok(())
}

/// Writes region bitmaps to `<debug dir>/<card id>/` when enabled.
struct DebugDump {
    dir: Option<std::path::PathBuf>,
}

impl DebugDump {
    fn new(debug_dir: Option<&Path>, card_id: u32) -> Self {
        let dir = debug_dir.map(|dir| dir.join(card_id.to_string()));
        if let Some(dir) = &dir
            && let Err(e) = fs::create_dir_all(dir)
        {
            warn!("Failed to create debug directory {}: {}", dir.display(), e);
            return Self { dir: None };
        }
        Self { dir }
    }

    fn save(&self, image: &GrayImage, name: &str) {
        let Some(dir) = &self.dir else {
            return;
        };
        let path = dir.join(format!("{name}.png"));
        if let Err(e) = image.save(&path) {
            warn!("Failed to save region image {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ParseOverrides;
    use crate::ocr::testing::FakeRecognizer;
    use image::{ImageBuffer, Rgba};
    use tempfile::tempdir;

    fn white_card() -> RgbaImage {
        ImageBuffer::from_pixel(area::IMAGE_WIDTH, area::IMAGE_HEIGHT, Rgba([230, 230, 230, 255]))
    }

    fn character() -> CardMetadata {
        CardMetadata {
            id: 7,
            card_type: Some(CardType::Character),
            enchanted: Some(false),
            identifier: Some("7/204 • EN • 1".to_string()),
            has_flavor_text: Some(false),
            ..CardMetadata::default()
        }
    }

    #[test]
    fn test_split_type_bar() {
        let card = CardMetadata::default();
        let settings = ParseSettings::default();
        let english = Language::English;

        assert_eq!(
            split_type_bar("Storyborn - Hero\n", &card, false, &settings, english),
            (CardType::Character, "Storyborn • Hero".to_string())
        );
        assert_eq!(
            split_type_bar("Action • Song", &card, false, &settings, english),
            (CardType::Action, "Song".to_string())
        );
        assert_eq!(split_type_bar("'Item", &card, false, &settings, english), (CardType::Item, String::new()));
        assert_eq!(
            split_type_bar("noise\nLocation", &card, true, &settings, english),
            (CardType::Location, String::new())
        );
    }

    #[test]
    fn test_item_override() {
        let card = CardMetadata::default();
        let settings = ParseSettings::resolve(
            None,
            false,
            Some(&ParseOverrides {
                is_item: Some(true),
                ..ParseOverrides::default()
            }),
        );
        let (card_type, _) = split_type_bar("Floodborn • Ally", &card, false, &settings, Language::English);
        assert_eq!(card_type, CardType::Item);
    }

    #[test]
    fn test_read_character_regions_in_order() {
        // cost, type bar, name, version, strength, willpower, artist, remainder
        let mut recognizer = FakeRecognizer::new([
            "3\n",
            "Storyborn • Hero\n",
            "Mickey Mouse\n",
            "Brave Little Tailor\n",
            "2\n",
            "O\n",
            "Jane Doe\n",
            "Evasive\n",
        ]);

        let result = read_card_image(&mut recognizer, &character(), white_card(), Language::English, None).unwrap();

        assert_eq!(result.card_type, CardType::Character);
        assert_eq!(result.cost, "3");
        assert_eq!(result.type_bar, "Storyborn • Hero");
        assert_eq!(result.name, "Mickey Mouse");
        assert_eq!(result.version.as_deref(), Some("Brave Little Tailor"));
        assert_eq!(result.strength.as_deref(), Some("2"));
        assert_eq!(result.willpower.as_deref(), Some("0"));
        assert_eq!(result.move_cost, None);
        assert_eq!(result.artists, "Jane Doe");
        assert_eq!(result.identifier, "7/204 • EN • 1");
        assert!(result.ability_labels.is_empty());
        assert_eq!(result.remaining_text.as_deref(), Some("Evasive"));
        assert_eq!(result.flavor_text, None);
        // Only the cost and the two stats are numeric
        assert_eq!(recognizer.calls.iter().filter(|call| call.2).count(), 3);
    }

    #[test]
    fn test_unknown_identifier_is_read_from_card() {
        let card = CardMetadata {
            identifier: None,
            ..character()
        };
        let mut recognizer = FakeRecognizer::new(["3", "12/204 • EN • 2"]);

        let result = read_card_image(&mut recognizer, &card, white_card(), Language::English, None).unwrap();
        assert_eq!(result.identifier, "12/204 • EN • 2");
    }

    #[test]
    fn test_debug_regions_are_saved() {
        let dir = tempdir().unwrap();
        let mut recognizer = FakeRecognizer::default();

        read_card_image(&mut recognizer, &character(), white_card(), Language::English, Some(dir.path())).unwrap();

        let card_dir = dir.path().join("7");
        assert!(card_dir.join("inkCost.png").exists());
        assert!(card_dir.join("characterName.png").exists());
        assert!(card_dir.join("remainder.png").exists());
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let dir = tempdir().unwrap();
        let mut recognizer = FakeRecognizer::default();
        let result = read_card(&mut recognizer, &character(), dir.path(), Language::English, None);
        assert!(result.is_err());
    }
}
