use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityKind {
    Keyword,
    Static,
    Triggered,
    Activated,
}

/// A finished ability, as printed on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Ability {
    Keyword(KeywordAbility),
    Static(NamedAbility),
    Triggered(NamedAbility),
    Activated(ActivatedAbility),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordAbility {
    pub keyword: String,
    /// `5` in "Shift 5", `+2` in "Challenger +2".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_value_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_text: Option<String>,
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedAbility {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub effect: String,
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatedAbility {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub costs_text: String,
    pub costs: Vec<String>,
    pub effect: String,
    pub full_text: String,
}

impl Ability {
    pub fn kind(&self) -> AbilityKind {
        match self {
            Ability::Keyword(_) => AbilityKind::Keyword,
            Ability::Static(_) => AbilityKind::Static,
            Ability::Triggered(_) => AbilityKind::Triggered,
            Ability::Activated(_) => AbilityKind::Activated,
        }
    }

    pub fn full_text(&self) -> &str {
        match self {
            Ability::Keyword(ability) => &ability.full_text,
            Ability::Static(ability) | Ability::Triggered(ability) => &ability.full_text,
            Ability::Activated(ability) => &ability.full_text,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Ability::Keyword(_) => None,
            Ability::Static(ability) | Ability::Triggered(ability) => ability.name.as_deref(),
            Ability::Activated(ability) => ability.name.as_deref(),
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        match self {
            Ability::Keyword(ability) => Some(&ability.keyword),
            _ => None,
        }
    }
}

/// An ability while the card is still being put together. Corrections work on
/// its JSON form, so the field names match the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AbilityKind>,
}

impl AbilityDraft {
    pub fn effect(effect: impl Into<String>) -> Self {
        Self {
            effect: Some(effect.into()),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            effect: Some(effect.into()),
            ..Self::default()
        }
    }

    pub fn keyword(full_text: impl Into<String>) -> Self {
        Self {
            full_text: Some(full_text.into()),
            kind: Some(AbilityKind::Keyword),
            ..Self::default()
        }
    }

    /// The text that decides what this ability is: the full text when set, else the effect.
    pub fn text(&self) -> &str {
        self.full_text.as_deref().or(self.effect.as_deref()).unwrap_or("")
    }

    pub(super) fn text_mut(&mut self) -> &mut String {
        if self.full_text.is_some() {
            self.full_text.get_or_insert_default()
        } else {
            self.effect.get_or_insert_default()
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }
}
