//! Region Locator: fixed crops from the layout, plus the ability labels and
//! flavor separator that move around from card to card.

pub mod labels;
pub mod lines;
pub mod separator;
pub mod zones;

use image::GrayImage;
use tracing::debug;

use crate::layout::{CardLayout, ImageArea, LabelParsingMethod, ParseSettings, Rect, TextPolarity};
use crate::ocr::preprocess;
pub use labels::LabelBlock;
pub use zones::{AbilityZone, TextboxGeometry};

/// What the caller already knows about the card's text. `None` means unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocateFlags {
    pub has_rules_text: Option<bool>,
    pub has_flavor_text: Option<bool>,
}

/// A fixed region crop, ready for recognition.
#[derive(Clone, Debug)]
pub struct FixedRegion {
    pub area: ImageArea,
    pub image: GrayImage,
}

/// Crops of the text box, ready for recognition. Labels and bodies pair up by index.
#[derive(Clone, Debug, Default)]
pub struct TextboxRegions {
    pub geometry: TextboxGeometry,
    pub labels: Vec<GrayImage>,
    pub bodies: Vec<GrayImage>,
    pub remainder: Option<GrayImage>,
    pub flavor: Option<GrayImage>,
}

#[derive(Clone, Debug)]
pub struct RegionSet {
    pub fixed: Vec<FixedRegion>,
    pub textbox: TextboxRegions,
}

impl RegionSet {
    pub fn fixed(&self, key: &str) -> Option<&FixedRegion> {
        self.fixed.iter().find(|region| region.area.key == key)
    }
}

/// Crops one fixed area. Numeric and white-on-light areas read better binarized.
pub fn crop_fixed(card: &GrayImage, area: ImageArea) -> FixedRegion {
    let crop = preprocess::crop(card, area.rect());
    let image = if area.is_numeric || area.polarity == TextPolarity::WhiteOnLight {
        preprocess::threshold(&crop, area.polarity)
    } else {
        crop
    };
    FixedRegion { area, image }
}

/// Crops every fixed region of `layout` (except the type bar, which decides the
/// layout and is read before this) and locates the text box regions.
pub fn locate(card: &GrayImage, layout: &CardLayout, settings: &ParseSettings, flags: LocateFlags) -> RegionSet {
    let fixed = [
        Some(layout.name),
        layout.version,
        layout.strength,
        layout.willpower,
        layout.move_cost,
        Some(layout.artist),
        Some(layout.identifier),
    ]
    .into_iter()
    .flatten()
    .map(|area| crop_fixed(card, area))
    .collect();

    let textbox = preprocess::crop(card, layout.textbox.rect());
    let geometry = locate_textbox(&textbox, settings, flags);
    let textbox = crop_textbox_regions(&textbox, geometry, settings);

    RegionSet { fixed, textbox }
}

/// Finds label blocks and the separator in a greyscale text box crop.
pub fn locate_textbox(textbox: &GrayImage, settings: &ParseSettings, flags: LocateFlags) -> TextboxGeometry {
    let (width, height) = textbox.dimensions();
    if flags.has_rules_text == Some(false) {
        debug!("Card has no rules text, skipping label detection");
        return TextboxGeometry::default();
    }

    let labels = match settings.label_method {
        LabelParsingMethod::Default => {
            labels::scan_label_blocks(textbox, settings.textbox_offset, settings.textbox_right_offset)
        }
        LabelParsingMethod::ByLines => labels::labels_from_lines(textbox, flags.has_flavor_text == Some(true)),
        // White ability text puts labels in the remainder, split after recognition
        LabelParsingMethod::WhiteAbilityText | LabelParsingMethod::None => Vec::new(),
    };
    debug!("Found {} ability labels: {:?}", labels.len(), labels);

    let look_for_separator = match settings.has_flavor_text_override {
        Some(forced) => forced,
        None => flags.has_flavor_text != Some(false),
    } && settings.label_method != LabelParsingMethod::ByLines;

    let separator = if look_for_separator {
        separator::find_separator(
            textbox,
            labels.last().map(|label| label.bottom),
            settings.textbox_offset,
            settings.textbox_right_offset,
            flags.has_flavor_text == Some(true),
        )
    } else {
        None
    };

    zones::slice_zones(
        width,
        height,
        labels,
        separator,
        settings.textbox_offset,
        settings.textbox_right_offset,
        !look_for_separator && flags.has_flavor_text == Some(true),
    )
}

/// Crops and binarizes every zone. The label area is masked in each body so
/// threshold leftovers don't turn into phantom letters.
pub fn crop_textbox_regions(textbox: &GrayImage, geometry: TextboxGeometry, settings: &ParseSettings) -> TextboxRegions {
    let text = |rect: Rect| preprocess::threshold(&preprocess::crop(textbox, rect), settings.text_polarity);

    let labels = geometry
        .zones
        .iter()
        .map(|zone| preprocess::threshold(&preprocess::crop(textbox, zone.label), settings.label_polarity))
        .collect();
    let bodies = geometry
        .zones
        .iter()
        .map(|zone| {
            let masked = preprocess::mask(textbox, zone.label_mask, settings.label_mask.luma());
            preprocess::threshold(&preprocess::crop(&masked, zone.body), settings.text_polarity)
        })
        .collect();
    let remainder = geometry.remainder.map(text);
    let flavor = geometry.flavor.map(text);

    TextboxRegions {
        geometry,
        labels,
        bodies,
        remainder,
        flavor,
    }
}
