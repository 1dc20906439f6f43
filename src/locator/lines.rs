//! Near-horizontal line segments in a greyscale bitmap.
//!
//! Edges come from Canny. A row segment is a run of edge columns, tolerating
//! one row of wobble and short gaps. Rows that report the same line are
//! collapsed into one segment.

use image::GrayImage;
use imageproc::edges::canny;

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub x1: u32,
    pub x2: u32,
    pub y: u32,
}

impl Segment {
    pub fn len(&self) -> u32 {
        self.x2 - self.x1 + 1
    }

    pub fn middle(&self) -> u32 {
        self.x1 + (self.x2 - self.x1) / 2
    }
}

/// Canny edge map. Edge pixels are 255.
pub struct EdgeMap {
    edges: GrayImage,
}

impl EdgeMap {
    pub fn from_image(img: &GrayImage) -> Self {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Self { edges: GrayImage::new(width, height) };
        }
        Self { edges: canny(img, CANNY_LOW, CANNY_HIGH) }
    }

    pub fn width(&self) -> u32 {
        self.edges.width()
    }

    pub fn height(&self) -> u32 {
        self.edges.height()
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.edges.get_pixel(x, y)[0] > 0
    }

    fn is_edge_near(&self, x: u32, y: u32) -> bool {
        self.is_edge(x, y) || (y > 0 && self.is_edge(x, y - 1)) || self.is_edge(x, y + 1)
    }
}

/// Finds horizontal segments at least `min_len` long, bridging gaps of up to `max_gap` columns.
/// Returned top to bottom.
pub fn find_horizontal_segments(edges: &EdgeMap, min_len: u32, max_gap: u32) -> Vec<Segment> {
    let mut row_segments: Vec<Segment> = Vec::new();

    for y in 0..edges.height() {
        let mut start: Option<u32> = None;
        let mut last_on = 0u32;
        for x in 0..edges.width() {
            if edges.is_edge_near(x, y) {
                if start.is_none() {
                    start = Some(x);
                }
                last_on = x;
            } else if let Some(s) = start {
                if x - last_on > max_gap {
                    push_if_long(&mut row_segments, s, last_on, y, min_len);
                    start = None;
                }
            }
        }
        if let Some(s) = start {
            push_if_long(&mut row_segments, s, last_on, y, min_len);
        }
    }

    collapse_adjacent_rows(row_segments)
}

fn push_if_long(segments: &mut Vec<Segment>, x1: u32, x2: u32, y: u32, min_len: u32) {
    let segment = Segment { x1, x2, y };
    if segment.len() >= min_len {
        segments.push(segment);
    }
}

/// The one-row tolerance makes a single line show up on up to three rows.
/// Keeps the longest row of each group, the middle one on ties.
fn collapse_adjacent_rows(segments: Vec<Segment>) -> Vec<Segment> {
    let mut groups: Vec<Vec<Segment>> = Vec::new();
    for segment in segments {
        let joined = groups.iter_mut().rev().find(|group| {
            group.last().is_some_and(|last| {
                last.y + 1 == segment.y && last.x1 <= segment.x2 && segment.x1 <= last.x2
            })
        });
        match joined {
            Some(group) => group.push(segment),
            None => groups.push(vec![segment]),
        }
    }

    let mut result: Vec<Segment> = groups
        .into_iter()
        .filter_map(|group| {
            let longest = group.iter().map(Segment::len).max()?;
            let best: Vec<&Segment> = group.iter().filter(|s| s.len() == longest).collect();
            Some(*best[best.len() / 2])
        })
        .collect();
    result.sort_by_key(|s| (s.y, s.x1));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn light(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_pixel(width, height, Luma([230]))
    }

    fn draw_hline(img: &mut GrayImage, x1: u32, x2: u32, y: u32, thickness: u32) {
        for yy in y..y + thickness {
            for x in x1..x2 {
                img.put_pixel(x, yy, Luma([20]));
            }
        }
    }

    #[test]
    fn test_blank_image_has_no_segments() {
        let img = light(200, 100);
        let edges = EdgeMap::from_image(&img);
        assert!(find_horizontal_segments(&edges, 10, 0).is_empty());
    }

    #[test]
    fn test_thick_line_gives_top_and_bottom_edge() {
        let mut img = light(300, 100);
        draw_hline(&mut img, 50, 250, 40, 6);
        let edges = EdgeMap::from_image(&img);

        let segments = find_horizontal_segments(&edges, 70, 0);
        assert_eq!(segments.len(), 2, "{:?}", segments);
        assert!(segments[0].y.abs_diff(40) <= 1, "{:?}", segments);
        assert!(segments[1].y.abs_diff(46) <= 1, "{:?}", segments);
        assert!(segments[0].x1.abs_diff(50) <= 3, "{:?}", segments);
        assert!(segments[0].x2.abs_diff(249) <= 3, "{:?}", segments);
    }

    #[test]
    fn test_short_lines_are_ignored() {
        let mut img = light(300, 100);
        draw_hline(&mut img, 10, 40, 30, 3);
        let edges = EdgeMap::from_image(&img);
        assert!(find_horizontal_segments(&edges, 70, 0).is_empty());
        assert!(!find_horizontal_segments(&edges, 25, 0).is_empty());
    }

    #[test]
    fn test_gap_bridging() {
        let mut img = light(300, 60);
        draw_hline(&mut img, 20, 60, 30, 4);
        draw_hline(&mut img, 70, 110, 30, 4);
        let edges = EdgeMap::from_image(&img);

        assert!(find_horizontal_segments(&edges, 70, 0).is_empty());
        let bridged = find_horizontal_segments(&edges, 70, 12);
        assert!(!bridged.is_empty());
        assert!(bridged[0].x1.abs_diff(20) <= 3, "{:?}", bridged);
        assert!(bridged[0].x2.abs_diff(109) <= 3, "{:?}", bridged);
    }

    #[test]
    fn test_one_row_step_is_tolerated() {
        let mut img = light(300, 60);
        draw_hline(&mut img, 20, 100, 30, 4);
        draw_hline(&mut img, 100, 180, 31, 4);
        let edges = EdgeMap::from_image(&img);
        let segments = find_horizontal_segments(&edges, 150, 2);
        assert!(!segments.is_empty(), "slightly tilted line should be found");
    }

    #[test]
    fn test_empty_image_has_no_edges() {
        let edges = EdgeMap::from_image(&GrayImage::new(0, 0));
        assert!(!edges.is_edge(0, 0));
        assert!(find_horizontal_segments(&edges, 1, 0).is_empty());
    }
}
