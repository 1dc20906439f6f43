//! Some card designs print ability labels as plain white text, so no label
//! blocks can be found and all the text comes out as one remainder. The
//! uppercase runs in it are the labels.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static HAS_UPPERCASE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{2,}").expect("uppercase regex is valid"));
static LABEL_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([AÀÈI] |I['’]M )?[A-ZÈÉÊÜ]{2}").expect("label start regex is valid"));
static EFFECT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)(([A-Z]|[ÀI|] )[a-z]|[0-9{}@©&]|G,)", crate::symbols::EXERT)).expect("effect start regex is valid")
});
static NEXT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n([AÀÈI] |I['’]M )?[A-ZÉÊÜ]{2}").expect("next label regex is valid"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhiteTextSplit {
    /// Text before the first label.
    pub remaining: String,
    pub labels: Vec<String>,
    pub effects: Vec<String>,
}

/// Splits remainder text into the unlabeled part and label/effect pairs.
/// Returns `None` when the text has no uppercase run to split on.
pub fn split_white_ability_text(text: &str) -> Option<WhiteTextSplit> {
    if !HAS_UPPERCASE_RUN.is_match(text) {
        return None;
    }
    let first_label = LABEL_START.find(text)?;

    let mut split = WhiteTextSplit {
        remaining: text[..first_label.start()].trim_end().to_string(),
        ..WhiteTextSplit::default()
    };
    let mut rest = text[first_label.start()..].to_string();
    while !rest.is_empty() {
        let (label, effect) = match EFFECT_START.find(&rest) {
            Some(found) => (rest[..found.start()].to_string(), rest[found.start()..].to_string()),
            None => (String::new(), String::new()),
        };
        match NEXT_LABEL.find(&effect) {
            Some(next) => {
                debug!("Splitting white ability text at the next label");
                rest = effect[next.start()..].trim_start().to_string();
                split.labels.push(label);
                split.effects.push(effect[..next.start()].trim_end().to_string());
            }
            None => {
                rest = String::new();
                split.labels.push(label);
                split.effects.push(effect);
            }
        }
    }
    Some(split)
}
