//! Ability label detection.
//!
//! Labels are dark blocks hugging the left edge of the text box. The default
//! method walks one pixel column looking for them; the line method looks for
//! their horizontal top or bottom edge instead, for designs where the block
//! doesn't reach the scanned column.

use image::GrayImage;
use tracing::{debug, warn};

use super::lines::{self, EdgeMap};

/// Column pixels darker than this open a label.
const LABEL_START_MAX: u8 = 105;
/// Column pixels lighter than this close an open label.
const LABEL_END_MIN: u8 = 110;
/// Pixels lighter than this count toward the end of the label's width.
const LIGHT_PIXEL_MIN: u8 = 120;
/// Accented capitals can poke through the top of a label, so the width only
/// ends after more than this many light pixels in a row.
const LIGHT_RUN: u32 = 5;
const MIN_LABEL_RIGHT: u32 = 100;
const MIN_LABEL_HEIGHT: u32 = 50;
/// Kept clear between the label and its text, both when cropping and masking.
pub const LABEL_MARGIN: u32 = 12;
const LABEL_RIGHT_EXTRA: u32 = 6;

const LINE_MIN_LENGTH: u32 = 125;
const LINE_RETRY_MIN_LENGTH: u32 = 100;
const LINE_MAX_GAP: u32 = 3;
const LINE_MIN_Y: u32 = 10;
const SAME_LABEL_DISTANCE: u32 = 80;
const SEPARATOR_CONFUSION_DISTANCE: u32 = 10;
/// Font size varies a little, but measuring the real height isn't worth it.
const ASSUMED_LABEL_HEIGHT: u32 = 73;

/// One ability label in text box coordinates.
/// `bottom` is the last dark row; crops use `top..bottom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelBlock {
    pub top: u32,
    pub bottom: u32,
    pub right: u32,
}

/// Walks `column` top to bottom, collecting dark label blocks.
pub fn scan_label_blocks(textbox: &GrayImage, column: u32, right_offset: u32) -> Vec<LabelBlock> {
    let (width, height) = textbox.dimensions();
    let mut labels = Vec::new();
    if column >= width {
        warn!("Label scan column {} is outside the {} pixel wide text box", column, width);
        return labels;
    }

    let mut open: Option<(u32, u32)> = None;
    for y in 0..height {
        let value = textbox.get_pixel(column, y)[0];
        if let Some((top, right)) = open {
            if value > LABEL_END_MIN {
                open = None;
                if y - top < MIN_LABEL_HEIGHT {
                    debug!("Skipping possible label from y={} to y={}, not high enough", top, y);
                } else {
                    labels.push(LabelBlock { top, bottom: y - 1, right });
                }
            }
        } else if value < LABEL_START_MAX {
            open = label_right_edge(textbox, y, column, right_offset).map(|right| (y, right));
        }
    }

    if let Some((top, _)) = open {
        warn!("Still inside a label starting at y={} when the text box ended", top);
    }

    labels
}

/// Finds where the label starting at row `top` turns light again.
/// `None` disqualifies the candidate: too narrow, or as wide as the box.
fn label_right_edge(textbox: &GrayImage, top: u32, column: u32, right_offset: u32) -> Option<u32> {
    let (width, height) = textbox.dimensions();
    // One row down avoids the anti-aliased top edge of the block
    let y = (top + 1).min(height - 1);
    let mut light_run = 0;
    for x in column..width.saturating_sub(right_offset) {
        if textbox.get_pixel(x, y)[0] > LIGHT_PIXEL_MIN {
            light_run += 1;
            if light_run > LIGHT_RUN {
                if x < MIN_LABEL_RIGHT {
                    debug!("Skipping label at y={}, only {} pixels wide", top, x);
                    return None;
                }
                return Some(x - LABEL_MARGIN - LABEL_RIGHT_EXTRA);
            }
        } else {
            light_run = 0;
        }
    }
    debug!("Reached the right side of the text box at y={}, not a label", top);
    None
}

/// Finds labels from their horizontal edges.
///
/// A line with lighter pixels above it is a label top, one with lighter
/// pixels below is a label bottom; the other edge is assumed.
pub fn labels_from_lines(textbox: &GrayImage, expects_flavor_text: bool) -> Vec<LabelBlock> {
    let edges = EdgeMap::from_image(textbox);
    let mut segments = lines::find_horizontal_segments(&edges, LINE_MIN_LENGTH, LINE_MAX_GAP);
    if segments.is_empty() {
        debug!("No label lines found, trying a shorter minimum length");
        segments = lines::find_horizontal_segments(&edges, LINE_RETRY_MIN_LENGTH, LINE_MAX_GAP);
    }
    if segments.is_empty() {
        warn!("Expected label lines in the text box but found none");
        return Vec::new();
    }
    debug!("Found {} label line candidates", segments.len());

    let height = textbox.height();
    let mut labels: Vec<LabelBlock> = Vec::new();
    let mut last_bottom: Option<u32> = None;
    for segment in segments {
        let (x, y) = (segment.x2, segment.y);
        if y < LINE_MIN_Y || y + 1 >= height {
            debug!("Skipping line at x={} y={}, too close to the edge", x, y);
            continue;
        }
        if let Some(bottom) = last_bottom {
            if y.saturating_sub(bottom) < SAME_LABEL_DISTANCE {
                // Other edge of the label we already have, or the flavor separator right below it
                if expects_flavor_text && y.saturating_sub(bottom) < SEPARATOR_CONFUSION_DISTANCE && labels.pop().is_some() {
                    debug!("Line at y={} looks like the flavor separator, dropping the label above it", y);
                }
                continue;
            }
        }

        // Sampled mid-segment, the ends can curl around the block corner
        let mid = segment.middle();
        let is_top_line = textbox.get_pixel(mid, y - 1)[0] > textbox.get_pixel(mid, y + 1)[0];
        let label = if is_top_line {
            LabelBlock {
                top: y,
                bottom: y + ASSUMED_LABEL_HEIGHT,
                right: x,
            }
        } else {
            LabelBlock {
                top: y.saturating_sub(ASSUMED_LABEL_HEIGHT),
                bottom: y,
                right: x + LABEL_MARGIN,
            }
        };
        last_bottom = Some(label.bottom);
        labels.push(label);
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    const LIGHT: u8 = 225;
    const DARK: u8 = 40;

    fn textbox(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_pixel(width, height, Luma([LIGHT]))
    }

    fn fill(img: &mut GrayImage, left: u32, top: u32, right: u32, bottom: u32, value: u8) {
        for y in top..bottom {
            for x in left..right {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }

    /// Right boundary reported for a dark block ending at `block_right` (exclusive).
    fn expected_right(block_right: u32) -> u32 {
        block_right + LIGHT_RUN - LABEL_MARGIN - LABEL_RIGHT_EXTRA
    }

    #[test]
    fn test_finds_each_dark_block() {
        let mut img = textbox(1000, 600);
        let blocks = [(20, 95, 300), (200, 270, 450), (400, 480, 180)];
        for &(top, bottom, right) in &blocks {
            fill(&mut img, 0, top, right, bottom, DARK);
        }

        let labels = scan_label_blocks(&img, 0, 0);

        assert_eq!(labels.len(), blocks.len());
        for (label, &(top, bottom, right)) in labels.iter().zip(&blocks) {
            assert!(label.top.abs_diff(top) <= 1, "{:?}", label);
            assert!(label.bottom.abs_diff(bottom - 1) <= 1, "{:?}", label);
            assert_eq!(label.right, expected_right(right));
        }
    }

    #[test]
    fn test_light_text_inside_label_does_not_end_width() {
        let mut img = textbox(1000, 200);
        fill(&mut img, 0, 50, 400, 120, DARK);
        // A few light letter pixels on the row used for the width scan
        fill(&mut img, 150, 51, 154, 52, LIGHT);

        let labels = scan_label_blocks(&img, 0, 0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].right, expected_right(400));
    }

    #[test]
    fn test_short_and_narrow_blocks_are_noise() {
        let mut img = textbox(1000, 400);
        // Too short
        fill(&mut img, 0, 10, 300, 40, DARK);
        // Too narrow
        fill(&mut img, 0, 100, 60, 200, DARK);

        assert!(scan_label_blocks(&img, 0, 0).is_empty());
    }

    #[test]
    fn test_full_width_block_is_not_a_label() {
        let mut img = textbox(500, 300);
        fill(&mut img, 0, 100, 500, 180, DARK);
        assert!(scan_label_blocks(&img, 0, 0).is_empty());
    }

    #[test]
    fn test_truncated_label_is_dropped() {
        let mut img = textbox(1000, 200);
        fill(&mut img, 0, 120, 300, 200, DARK);
        assert!(scan_label_blocks(&img, 0, 0).is_empty());
    }

    #[test]
    fn test_scan_column_offset() {
        let mut img = textbox(1000, 300);
        fill(&mut img, 41, 60, 400, 140, DARK);

        assert!(scan_label_blocks(&img, 0, 0).is_empty());
        let labels = scan_label_blocks(&img, 41, 0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].top, 60);
    }

    #[test]
    fn test_empty_textbox_has_no_labels() {
        let img = textbox(800, 400);
        assert!(scan_label_blocks(&img, 0, 0).is_empty());
        assert!(labels_from_lines(&img, false).is_empty());
    }

    #[test]
    fn test_labels_from_top_lines() {
        let mut img = textbox(1000, 500);
        // Labels printed as blocks away from the left edge; only their edges are visible lines
        fill(&mut img, 30, 100, 400, 173, DARK);
        fill(&mut img, 30, 300, 500, 373, DARK);

        let labels = labels_from_lines(&img, false);
        assert_eq!(labels.len(), 2, "{:?}", labels);
        assert!(labels[0].top.abs_diff(100) <= 1);
        assert_eq!(labels[0].bottom, labels[0].top + ASSUMED_LABEL_HEIGHT);
        assert!(labels[1].top.abs_diff(300) <= 1);
    }
}
