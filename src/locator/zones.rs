//! Slicing the text box into per-ability zones.

use tracing::{debug, warn};

use super::labels::{LABEL_MARGIN, LabelBlock};
use crate::layout::Rect;

/// Flavor text starts this far below the separator.
pub const FLAVOR_MARGIN: u32 = 14;
/// Remainder zones this short only hold the top edge of the first label.
const MIN_REMAINDER_HEIGHT: u32 = 35;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbilityZone {
    pub label: Rect,
    pub body: Rect,
    /// Filled with the mask colour before the body is cropped.
    pub label_mask: Rect,
}

/// Text box geometry, in text box coordinates. Zones are ordered top to bottom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextboxGeometry {
    pub labels: Vec<LabelBlock>,
    pub separator: Option<u32>,
    pub zones: Vec<AbilityZone>,
    pub remainder: Option<Rect>,
    pub flavor: Option<Rect>,
}

/// Turns labels and the separator into crop rectangles.
///
/// Works bottom-up: each label's body runs from the label top down to the top
/// of the block below it, and whatever sits above the highest label is the
/// unlabeled remainder. `unsearched_flavor_text` marks a card known to have
/// flavor text whose separator wasn't looked for; its margin is still kept
/// clear of the last body.
pub fn slice_zones(
    width: u32,
    height: u32,
    labels: Vec<LabelBlock>,
    separator: Option<u32>,
    left_inset: u32,
    right_inset: u32,
    unsearched_flavor_text: bool,
) -> TextboxGeometry {
    let inset_right = width.saturating_sub(right_inset);

    let flavor = separator.and_then(|y| {
        if y + FLAVOR_MARGIN >= height {
            warn!("Flavor separator at y={} leaves no room for flavor text in a {} pixel text box", y, height);
            None
        } else {
            Some(Rect::new(left_inset, y + FLAVOR_MARGIN, inset_right, height))
        }
    });

    let mut previous_top = match (separator, flavor) {
        (Some(y), Some(_)) => y.saturating_sub(FLAVOR_MARGIN + 1),
        // A separator too low for flavor text still ends the ability text
        (Some(y), None) => y,
        (None, _) if unsearched_flavor_text => height.saturating_sub(FLAVOR_MARGIN + 1),
        (None, _) => height,
    };

    let mut zones = Vec::with_capacity(labels.len());
    for label in labels.iter().rev() {
        let body_bottom = previous_top.max(label.top);
        zones.push(AbilityZone {
            label: Rect::new(0, label.top, label.right, label.bottom),
            body: Rect::new(0, label.top, width, body_bottom),
            label_mask: Rect::new(0, 0, label.right + LABEL_MARGIN, label.bottom),
        });
        previous_top = label.top;
    }
    zones.reverse();

    let remainder = if previous_top > MIN_REMAINDER_HEIGHT {
        Some(Rect::new(left_inset, 0, inset_right, previous_top))
    } else {
        debug!("No text above the ability labels, highest label is at y={}", previous_top);
        None
    };

    TextboxGeometry {
        labels,
        separator,
        zones,
        remainder,
        flavor,
    }
}
