use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use tempfile::NamedTempFile;
use tracing::debug;

use super::TextRecognizer;
use super::setup::{TesseractPaths, tesseract_command};
use crate::language::Language;

/// Engine variables that keep Tesseract from "improving" card text:
/// no table or vertical-text detection, no bigram or hyphen fixing.
const TESSERACT_VARIABLES: &[(&str, &str)] = &[
    ("textord_tabfind_find_tables", "0"),
    ("textord_tabfind_vertical_text", "0"),
    ("textord_disable_pitch_test", "1"),
    ("textord_restore_underlines", "0"),
    ("tessedit_single_match", "1"),
    ("il1_adaption_test", "0"),
    ("permute_only_top", "1"),
    ("tessedit_enable_bigram_correction", "0"),
    ("enable_noise_removal", "0"),
    ("tessedit_fix_fuzzy_spaces", "0"),
    ("tessedit_fix_hyphens", "0"),
    ("crunch_early_convert_bad_unlv_chs", "1"),
];

/// One recognized line with its average word confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
    /// (block, paragraph) the line belongs to; a change means a blank line in the text.
    pub paragraph: (i32, i32),
}

/// Runs the Tesseract executable once per region.
///
/// Each worker owns one of these. It holds no process state between calls,
/// but the trait contract stays `&mut self` so stateful engines fit the same slot.
pub struct TesseractEngine {
    paths: TesseractPaths,
    language: Language,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, language: Language) -> Self {
        Self { paths, language }
    }

    fn run_tsv(&self, img: &GrayImage, numeric_only: bool) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write region image for Tesseract")?;

        let mut command = tesseract_command(&self.paths);
        command
            .arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(self.language.three_letter_code())
            .arg("--psm")
            // Numeric regions hold a single number on one line
            .arg(if numeric_only { "7" } else { "6" });
        for (name, value) in TESSERACT_VARIABLES {
            command.arg("-c").arg(format!("{}={}", name, value));
        }
        let output = command.arg("tsv").output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&mut self, image: &GrayImage, numeric_only: bool) -> Result<String> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(String::new());
        }
        let tsv = self.run_tsv(image, numeric_only)?;
        let lines = parse_tsv_output(&tsv);
        if let Some(worst) = lines.iter().map(|l| l.confidence).reduce(f32::min) {
            debug!("Recognized {} lines, lowest confidence {:.1}", lines.len(), worst);
        }
        Ok(lines_to_text(&lines))
    }
}

/// Parses Tesseract TSV output into lines, keeping paragraph membership.
pub fn parse_tsv_output(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<&str> = Vec::new();
    let mut current_conf_sum: f32 = 0.0;

    let mut flush = |key: (i32, i32, i32), words: &mut Vec<&str>, conf_sum: &mut f32| {
        if !words.is_empty() {
            lines.push(OcrLine {
                text: words.join(" "),
                confidence: *conf_sum / words.len() as f32,
                paragraph: (key.0, key.1),
            });
        }
        words.clear();
        *conf_sum = 0.0;
    };

    // Skip header
    for row in tsv.lines().skip(1) {
        // level, page_num, block_num, par_num, line_num, word_num,
        // left, top, width, height, conf, text
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // Level 5 = word
        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }
        let text = fields[11].trim();
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        if let Some(previous) = current_key {
            if previous != key {
                flush(previous, &mut current_words, &mut current_conf_sum);
            }
        }
        current_key = Some(key);
        current_words.push(text);
        current_conf_sum += conf;
    }

    if let Some(last) = current_key {
        flush(last, &mut current_words, &mut current_conf_sum);
    }

    lines
}

/// Joins lines with newlines, and paragraphs with a blank line.
pub fn lines_to_text(lines: &[OcrLine]) -> String {
    let mut text = String::new();
    let mut previous_paragraph = None;
    for line in lines {
        if let Some(previous) = previous_paragraph {
            text.push('\n');
            if previous != line.paragraph {
                text.push('\n');
            }
        }
        text.push_str(&line.text);
        previous_paragraph = Some(line.paragraph);
    }
    text
}
