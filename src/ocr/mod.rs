pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::TesseractEngine;
pub use extract::{OcrResult, read_card};
pub use setup::{ensure_language, locate_tesseract};

use anyhow::Result;
use image::GrayImage;
use tracing::{error, info};

use crate::locator::FixedRegion;

/// Turns a region bitmap into text.
///
/// Implementations may keep per-instance state and are not expected to be
/// shareable; each worker owns its own. Empty and garbled text are normal
/// results, only a broken engine is an error.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &GrayImage, numeric_only: bool) -> Result<String>;
}

/// Recognizes a fixed region, fixing up numeric areas.
pub fn recognize_region(recognizer: &mut dyn TextRecognizer, region: &FixedRegion) -> Result<String> {
    let text = recognizer.recognize(&region.image, region.area.is_numeric)?;
    let text = text.trim_end_matches('\n').to_string();
    if region.area.is_numeric {
        return Ok(fix_numeric(&text, region.area.key));
    }
    Ok(text)
}

/// Restricting the engine to digits often gives nothing at all, so numeric
/// areas are read freely and common lookalikes are mapped back here.
/// Unfixable results become "-1".
pub fn fix_numeric(text: &str, area_name: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.to_string();
    }

    let fixed = match trimmed {
        "O" => "0",
        "l" | "|" | "]" => "1",
        "A" => "4",
        "b" => "6",
        "Q" => "9",
        _ => {
            error!(
                "Expected a number in image area '{}' but found non-numeric '{}'",
                area_name, trimmed
            );
            return "-1".to_string();
        }
    };
    info!("Corrected non-numeric '{}' to '{}' for image area '{}'", trimmed, fixed, area_name);
    fixed.to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Hands out canned answers in call order, then empty strings.
    #[derive(Default)]
    pub struct FakeRecognizer {
        pub answers: VecDeque<String>,
        pub calls: Vec<(u32, u32, bool)>,
    }

    impl FakeRecognizer {
        pub fn new<I, S>(answers: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                answers: answers.into_iter().map(Into::into).collect(),
                calls: Vec::new(),
            }
        }
    }

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&mut self, image: &GrayImage, numeric_only: bool) -> Result<String> {
            self.calls.push((image.width(), image.height(), numeric_only));
            Ok(self.answers.pop_front().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeRecognizer;
    use super::*;
    use crate::layout::area;
    use crate::locator::crop_fixed;
    use image::{ImageBuffer, Luma};

    #[test]
    fn test_fix_numeric() {
        assert_eq!(fix_numeric("7", "inkCost"), "7");
        assert_eq!(fix_numeric(" 12 ", "strength"), "12");
        assert_eq!(fix_numeric("O", "inkCost"), "0");
        assert_eq!(fix_numeric("|", "inkCost"), "1");
        assert_eq!(fix_numeric("Q", "willpower"), "9");
        assert_eq!(fix_numeric("x?", "willpower"), "-1");
        assert_eq!(fix_numeric("", "willpower"), "-1");
    }

    #[test]
    fn test_recognize_region_passes_numeric_flag() {
        let card: GrayImage = ImageBuffer::from_pixel(1468, 2048, Luma([0]));
        let mut recognizer = FakeRecognizer::new(["b\n", "Mickey Mouse\n"]);

        let cost = recognize_region(&mut recognizer, &crop_fixed(&card, area::INK_COST)).unwrap();
        let name = recognize_region(&mut recognizer, &crop_fixed(&card, area::CHARACTER_NAME)).unwrap();

        assert_eq!(cost, "6");
        assert_eq!(name, "Mickey Mouse");
        assert!(recognizer.calls[0].2);
        assert!(!recognizer.calls[1].2);
    }
}
