//! Flavor text separator detection.

use image::{GrayImage, imageops};
use tracing::debug;

use super::lines::{self, EdgeMap};

const SEARCH_BELOW_LABEL: u32 = 5;
const MIN_LENGTH: u32 = 70;
const RETRY_MIN_LENGTH: u32 = 25;
/// Candidates this close to the left or top of the search area are label edges.
const MIN_X: u32 = 80;
const MIN_Y: u32 = 20;

/// Searches for the separator line below `search_top`, inside the horizontal
/// insets. Returns its y in text box coordinates.
///
/// A miss is normal: plenty of cards have no flavor text, and the line isn't
/// always drawn clearly enough.
pub fn find_separator(
    textbox: &GrayImage,
    last_label_bottom: Option<u32>,
    left_inset: u32,
    right_inset: u32,
    expects_flavor_text: bool,
) -> Option<u32> {
    let (width, height) = textbox.dimensions();
    let search_top = last_label_bottom.map_or(0, |bottom| (bottom + SEARCH_BELOW_LABEL).min(height));
    let left = left_inset.min(width);
    let search_width = width.saturating_sub(right_inset).saturating_sub(left);
    let area = imageops::crop_imm(textbox, left, search_top, search_width, height - search_top).to_image();

    let edges = EdgeMap::from_image(&area);
    let mut candidates = lines::find_horizontal_segments(&edges, MIN_LENGTH, 0);
    if candidates.is_empty() && expects_flavor_text {
        // Ornaments sometimes break the line up, a piece of it is enough
        debug!("No full separator line found, looking for a shorter piece");
        candidates = lines::find_horizontal_segments(&edges, RETRY_MIN_LENGTH, 0);
    }

    let separator = candidates
        .iter()
        .filter(|segment| {
            let keep = segment.x1 >= MIN_X && segment.y >= MIN_Y;
            if !keep {
                debug!("Skipping line at {:?}, too close to the edge", segment);
            }
            keep
        })
        .map(|segment| segment.y)
        .max();

    match separator {
        Some(y) => Some(y + search_top),
        None => {
            debug!("No flavor text separator found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn textbox_with_line(line_y: u32, x1: u32, x2: u32) -> GrayImage {
        let mut img: GrayImage = ImageBuffer::from_pixel(1000, 500, Luma([230]));
        for y in line_y..line_y + 3 {
            for x in x1..x2 {
                img.put_pixel(x, y, Luma([30]));
            }
        }
        img
    }

    #[test]
    fn test_finds_separator_below_labels() {
        let img = textbox_with_line(350, 200, 800);
        let y = find_separator(&img, Some(150), 0, 0, true).unwrap();
        // Lowest edge of the line is reported
        assert!(y.abs_diff(353) <= 1, "{}", y);
    }

    #[test]
    fn test_no_separator_on_blank_box() {
        let img: GrayImage = ImageBuffer::from_pixel(1000, 500, Luma([230]));
        assert_eq!(find_separator(&img, None, 0, 0, true), None);
    }

    #[test]
    fn test_lines_near_left_edge_are_ignored() {
        let img = textbox_with_line(350, 10, 300);
        assert_eq!(find_separator(&img, None, 0, 0, false), None);
    }

    #[test]
    fn test_lines_above_search_area_are_ignored() {
        let img = textbox_with_line(100, 200, 800);
        assert_eq!(find_separator(&img, Some(300), 0, 0, false), None);
    }

    #[test]
    fn test_short_piece_only_when_flavor_expected() {
        let img = textbox_with_line(300, 400, 450);
        assert_eq!(find_separator(&img, None, 0, 0, false), None);
        assert!(find_separator(&img, None, 0, 0, true).is_some());
    }
}
