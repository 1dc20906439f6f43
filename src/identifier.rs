//! Card identifier as printed in the bottom-left corner, e.g. `12/204 • EN • 3`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::symbols::SEPARATOR;

/// Tolerates the separator glyph being read as `-`, `+`, `<` or any single stray character.
static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<number>\d+)(?P<variant>[a-z])?[/1](?P<grouping>[A-Z]?\d+)(?: ?[-+<]{1,2} ?| (?:. )?)(?P<language>\w+)(?: ?[-+<]{1,2} ?| (?:. )?)(?P<set>\S+)$",
    )
    .expect("identifier regex is valid")
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub number: u32,
    pub variant: Option<String>,
    /// `204` for regular cards, `P1`, `D23`, `C1`, ... for promos.
    pub grouping: String,
    pub language: String,
    pub set_code: String,
}

impl Identifier {
    /// Parses the recognized identifier line. Returns `None` when it doesn't look like one.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = IDENTIFIER_REGEX.captures(text.trim())?;
        let number = caps["number"].parse().ok()?;
        let mut set_code = caps["set"].to_string();
        // Quest set code is often read with a zero
        if set_code == "01" {
            set_code = "Q1".to_string();
        }
        Some(Self {
            number,
            variant: caps.name("variant").map(|m| m.as_str().to_string()),
            grouping: caps["grouping"].to_string(),
            language: caps["language"].to_string(),
            set_code,
        })
    }

    pub fn is_promo(&self) -> bool {
        !self.grouping.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_quest(&self) -> bool {
        self.set_code.starts_with('Q')
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{} {} {} {} {}",
            self.number,
            self.variant.as_deref().unwrap_or(""),
            self.grouping,
            SEPARATOR,
            self.language,
            SEPARATOR,
            self.set_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regular_identifier() {
        let id = Identifier::parse("12/204 • EN • 3").unwrap();
        assert_eq!(id.number, 12);
        assert_eq!(id.grouping, "204");
        assert_eq!(id.language, "EN");
        assert_eq!(id.set_code, "3");
        assert!(!id.is_promo());
        assert_eq!(id.to_string(), "12/204 • EN • 3");
    }

    #[test]
    fn test_parse_noisy_separators() {
        let id = Identifier::parse("7a/P1 - FR + 2").unwrap();
        assert_eq!(id.variant.as_deref(), Some("a"));
        assert_eq!(id.grouping, "P1");
        assert!(id.is_promo());

        // Slash read as a 1, separator read as a stray character
        let id = Identifier::parse("10131 x DE x 01").unwrap();
        assert_eq!(id.number, 10);
        assert_eq!(id.grouping, "31");
        assert_eq!(id.set_code, "Q1");
        assert!(id.is_quest());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Identifier::parse("").is_none());
        assert!(Identifier::parse("Artist Name").is_none());
    }
}
