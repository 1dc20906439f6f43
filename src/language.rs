//! Card languages and the few translated words the parser depends on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    English,
    French,
    German,
    Italian,
}

/// Main card type names as printed in the type bar.
#[derive(Debug, Clone, Copy)]
pub struct TypeNames {
    pub action: &'static str,
    pub character: &'static str,
    pub item: &'static str,
    pub location: &'static str,
}

impl TypeNames {
    /// Whether `text` is one of the non-character main types.
    pub fn is_non_character(&self, text: &str) -> bool {
        text == self.action || text == self.item || text == self.location
    }
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::French,
        Language::German,
        Language::Italian,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
        }
    }

    /// Tesseract language code.
    pub fn three_letter_code(self) -> &'static str {
        match self {
            Language::English => "eng",
            Language::French => "fra",
            Language::German => "deu",
            Language::Italian => "ita",
        }
    }

    /// Code as printed in the card identifier line (`EN`, `FR`, ...).
    pub fn uppercase_code(self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::French => "FR",
            Language::German => "DE",
            Language::Italian => "IT",
        }
    }

    pub fn type_names(self) -> TypeNames {
        match self {
            Language::English => TypeNames {
                action: "Action",
                character: "Character",
                item: "Item",
                location: "Location",
            },
            Language::French => TypeNames {
                action: "Action",
                character: "Personnage",
                item: "Objet",
                location: "Lieu",
            },
            Language::German => TypeNames {
                action: "Aktion",
                character: "Charakter",
                item: "Gegenstand",
                location: "Ort",
            },
            Language::Italian => TypeNames {
                action: "Azione",
                character: "Personaggio",
                item: "Oggetto",
                location: "Luogo",
            },
        }
    }

    /// The translated name of the Shift keyword.
    pub fn shift_keyword(self) -> &'static str {
        match self {
            Language::English => "Shift",
            Language::French => "Alter",
            Language::German => "Gestaltwandel",
            Language::Italian => "Trasformazione",
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == lower || lang.three_letter_code() == lower)
            .ok_or_else(|| anyhow!("Unsupported language '{}', expected one of en, fr, de, it", s))
    }
}

impl TryFrom<String> for Language {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
