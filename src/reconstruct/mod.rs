//! Ability Reconstructor: turns the recognized text of a card's regions into
//! typed abilities and the card's full text.
//!
//! The flow per card is: clean up the fixed fields, sort the unlabeled text
//! into keywords and effects, pair labels with their bodies, apply the card's
//! corrections, then classify every ability and join it all back up in
//! printed order.

mod ability;
mod assemble;
mod card_fields;
mod classify;
mod directives;
mod draft;
mod keyword;
mod labels;
mod remaining;
mod white_text;

use thiserror::Error;
use tracing::{error, info, warn};

pub use ability::{Ability, AbilityDraft, AbilityKind, ActivatedAbility, KeywordAbility, NamedAbility};
pub use assemble::{AssembledText, CardContext, assemble};
pub use classify::{Classification, classify};
pub use directives::{LayoutDirectives, apply_directives};
pub use draft::CardDraft;
pub use keyword::split_keyword;
pub use white_text::{WhiteTextSplit, split_white_ability_text};

use crate::card::{CardMetadata, CardType, ParsedCard};
use crate::correction::{CardCorrections, CorrectionRuleSet};
use crate::identifier::Identifier;
use crate::ocr::OcrResult;

/// Labels and effects shorter than this together are noise.
const MIN_LABEL_LENGTH: usize = 3;
const MIN_LABELED_EFFECT_LENGTH: usize = 5;

#[derive(Debug, Error)]
pub enum ReconstructError {
    #[error("ability {index} has cost {costs_text:?} and a separator, but no effect text after it")]
    MissingEffect { index: usize, costs_text: String },
    #[error("card draft doesn't survive its field corrections")]
    Draft(#[from] serde_json::Error),
}

/// Builds the structured card from its recognized regions.
pub fn reconstruct(
    card: &CardMetadata,
    ocr: &OcrResult,
    rules: &CorrectionRuleSet,
    corrections: &mut CardCorrections,
) -> Result<ParsedCard, ReconstructError> {
    let language = rules.language();
    let card_type = ocr.card_type;

    let name = match &card.name {
        Some(name) => name.replace('’', "'"),
        None => card_fields::clean_name(&ocr.name, card_type, rules),
    };
    let version = card
        .version
        .clone()
        .or_else(|| ocr.version.as_deref().map(|v| rules.correct_punctuation(v.trim())))
        .map(|v| v.replace('’', "'"))
        .filter(|v| !v.is_empty());

    let identifier = card
        .identifier
        .as_deref()
        .and_then(Identifier::parse)
        .or_else(|| Identifier::parse(&ocr.identifier));
    let full_identifier = match &identifier {
        Some(identifier) => {
            if identifier.language != language.uppercase_code() {
                warn!(
                    "Card {} identifier says language {}, but the batch is {}",
                    card.id,
                    identifier.language,
                    language.uppercase_code()
                );
            }
            identifier.to_string()
        }
        None => {
            error!("Unable to parse identifier {:?} of card {}", ocr.identifier, card.id);
            ocr.identifier.trim().to_string()
        }
    };

    let flavor_text = ocr
        .flavor_text
        .as_deref()
        .map(|text| card_fields::clean_flavor_text(text, rules))
        .filter(|text| !text.is_empty());

    let remaining = ocr
        .remaining_text
        .as_deref()
        .map(|text| remaining::parse_remaining_text(text, rules, card_type == CardType::Item))
        .unwrap_or_default();
    let mut abilities = remaining.abilities;
    abilities.extend(labeled_abilities(card, ocr, rules));

    let mut draft = CardDraft {
        name,
        version,
        cost: parse_number("cost", &ocr.cost, card.id).unwrap_or(-1),
        strength: ocr.strength.as_deref().map(|s| parse_number("strength", s, card.id).unwrap_or(-1)),
        willpower: ocr.willpower.as_deref().map(|s| parse_number("willpower", s, card.id).unwrap_or(-1)),
        move_cost: ocr.move_cost.as_deref().map(|s| parse_number("move cost", s, card.id).unwrap_or(-1)),
        abilities,
        effects: remaining.effects,
        flavor_text,
        subtypes: card_fields::parse_subtypes(&ocr.type_bar, language),
        artists_text: card_fields::clean_artists_text(&ocr.artists),
        full_identifier,
    };

    let layout = apply_directives(&mut draft, corrections, rules)?;
    let context = CardContext {
        name: &draft.name,
        card_type,
        language,
        set_code: identifier.as_ref().map(|identifier| identifier.set_code.as_str()),
        rules_text: card.rules_text.as_deref().filter(|text| !text.is_empty()),
    };
    let assembled = assemble(draft.abilities.clone(), &draft.effects, &context, &layout, corrections)?;

    Ok(ParsedCard {
        id: card.id,
        full_name: draft.full_name(),
        name: draft.name,
        version: draft.version,
        card_type,
        cost: draft.cost,
        strength: draft.strength,
        willpower: draft.willpower,
        move_cost: draft.move_cost,
        subtypes: draft.subtypes,
        abilities: assembled.abilities,
        keyword_abilities: assembled.keyword_abilities,
        effects: draft.effects,
        flavor_text: draft.flavor_text,
        full_text: assembled.full_text,
        full_text_sections: assembled.full_text_sections,
        artists: draft.artists_text.split(" / ").map(str::to_string).collect(),
        artists_text: draft.artists_text,
        full_identifier: draft.full_identifier,
    })
}

fn parse_number(field: &str, text: &str, card_id: u32) -> Option<i32> {
    match text.trim().parse() {
        Ok(number) => Some(number),
        Err(_) => {
            error!("Card {} has {} {:?}, which isn't a number", card_id, field, text);
            None
        }
    }
}

/// Pairs every cleaned label with its body text.
fn labeled_abilities(card: &CardMetadata, ocr: &OcrResult, rules: &CorrectionRuleSet) -> Vec<AbilityDraft> {
    let rules_text = card.rules_text.as_deref().filter(|text| !text.is_empty());
    let mut printed_names: Option<Vec<String>> = None;
    let mut drafts = Vec::with_capacity(ocr.ability_labels.len());

    for (index, (raw_label, raw_effect)) in ocr.ability_labels.iter().zip(&ocr.ability_texts).enumerate() {
        let mut name = labels::clean_label(raw_label, rules);
        if let Some(rules_text) = rules_text.filter(|text| !text.contains(&name)) {
            let printed = printed_names.get_or_insert_with(|| labels::label_names_in_rules_text(rules_text));
            name = labels::restore_missing_spaces(&name, index, printed);
        }
        if name != raw_label.trim() {
            info!("Corrected ability name from {:?} to {:?}", raw_label.trim(), name);
        }

        let effect = rules.correct(&rules.correct_punctuation(raw_effect)).replace('‘', "");
        if name.chars().count() < MIN_LABEL_LENGTH && effect.chars().count() < MIN_LABELED_EFFECT_LENGTH {
            info!("Skipping ability {}, name {:?} and effect {:?} are too short", index, name, effect);
            continue;
        }
        drafts.push(AbilityDraft::named(name, effect));
    }
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::CorrectionTable;
    use crate::language::Language;

    fn english() -> CorrectionRuleSet {
        CorrectionRuleSet::for_language(Language::English).unwrap()
    }

    fn metadata() -> CardMetadata {
        CardMetadata {
            id: 42,
            name: Some("Mickey Mouse".to_string()),
            version: Some("Brave Little Tailor".to_string()),
            ..CardMetadata::default()
        }
    }

    fn ocr() -> OcrResult {
        OcrResult {
            card_type: CardType::Character,
            type_bar: "Storyborn • Hero".to_string(),
            cost: "8".to_string(),
            name: "MICKEY MOUSE".to_string(),
            version: Some("Brave Little Tailor".to_string()),
            strength: Some("5".to_string()),
            willpower: Some("5".to_string()),
            artists: "Jane Doe".to_string(),
            identifier: "115/204 • EN • 1".to_string(),
            ..OcrResult::default()
        }
    }

    fn parse(ocr: &OcrResult, corrections: &mut CardCorrections) -> ParsedCard {
        reconstruct(&metadata(), ocr, &english(), corrections).unwrap()
    }

    #[test]
    fn test_bare_keyword() {
        let mut ocr = ocr();
        ocr.remaining_text = Some("Bodyguard".to_string());
        let card = parse(&ocr, &mut CardCorrections::default());

        let Ability::Keyword(keyword) = &card.abilities[0] else {
            panic!("expected a keyword, got {:?}", card.abilities[0]);
        };
        assert_eq!(keyword.keyword, "Bodyguard");
        assert_eq!(keyword.keyword_value, None);
        assert_eq!(keyword.reminder_text, None);
        assert_eq!(card.full_text, "Bodyguard");
    }

    #[test]
    fn test_keyword_with_value_and_reminder() {
        let mut ocr = ocr();
        ocr.remaining_text =
            Some("Sing Together 5 (Any number of your characters with total cost 5 or more may ⟳ to sing this song for free.)".to_string());
        let card = parse(&ocr, &mut CardCorrections::default());

        let Ability::Keyword(keyword) = &card.abilities[0] else {
            panic!("expected a keyword, got {:?}", card.abilities[0]);
        };
        assert_eq!(keyword.keyword, "Sing Together");
        assert_eq!(keyword.keyword_value.as_deref(), Some("5"));
        assert_eq!(keyword.keyword_value_number, Some(5));
        assert!(keyword.reminder_text.as_deref().is_some_and(|text| text.starts_with("Any number")));
    }

    #[test]
    fn test_labeled_abilities() {
        let mut ocr = ocr();
        ocr.ability_labels = vec!["WHAT A DEAL".to_string(), "STAR POWER".to_string()];
        ocr.ability_texts = vec![
            "Once per turn, you may ⟳ — Deal 1 damage.".to_string(),
            "At the start of your turn, gain 1 lore.".to_string(),
        ];
        let card = parse(&ocr, &mut CardCorrections::default());

        let Ability::Activated(activated) = &card.abilities[0] else {
            panic!("expected an activated ability, got {:?}", card.abilities[0]);
        };
        assert_eq!(activated.costs_text, "Once per turn, you may ⟳");
        assert_eq!(activated.effect, "Deal 1 damage.");
        assert_eq!(card.abilities[1].kind(), AbilityKind::Triggered);
        assert_eq!(card.abilities[1].name(), Some("STAR POWER"));
        assert_eq!(card.full_text_sections.len(), 2);
        assert_eq!(card.full_name, "Mickey Mouse - Brave Little Tailor");
        assert_eq!(card.subtypes, vec!["Storyborn", "Hero"]);
        assert_eq!(card.cost, 8);
        assert_eq!(card.full_identifier, "115/204 • EN • 1");
    }

    #[test]
    fn test_empty_text_box() {
        let card = parse(&ocr(), &mut CardCorrections::default());
        assert!(card.abilities.is_empty());
        assert!(card.effects.is_empty());
        assert_eq!(card.flavor_text, None);
        assert_eq!(card.full_text, "");
        assert!(card.full_text_sections.is_empty());
    }

    #[test]
    fn test_noise_labels_are_dropped() {
        let mut ocr = ocr();
        ocr.ability_labels = vec!["i".to_string()];
        ocr.ability_texts = vec!["..".to_string()];
        let card = parse(&ocr, &mut CardCorrections::default());
        assert!(card.abilities.is_empty());
    }

    #[test]
    fn test_corrections_are_consumed() {
        let mut table = CorrectionTable::from_json(
            r#"{"42": {"version": ["Tailor", "Tailor!"], "_effectAtIndexIsFlavorText": 0, "cost": [8, 6]}}"#,
        )
        .unwrap();
        let mut corrections = table.take(42);
        let mut ocr = ocr();
        ocr.remaining_text = Some("The stories say he was very brave.".to_string());

        let card = parse(&ocr, &mut corrections);
        assert_eq!(card.full_name, "Mickey Mouse - Brave Little Tailor!");
        assert_eq!(card.cost, 6);
        assert!(card.effects.is_empty());
        assert_eq!(card.flavor_text.as_deref(), Some("The stories say he was very brave."));
        assert!(corrections.consumed().leftovers().is_empty());
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let mut ocr = ocr();
        ocr.remaining_text = Some("Evasive, Ward\n\nWhen you play this character, draw a card.".to_string());
        let first = parse(&ocr, &mut CardCorrections::default());
        let second = parse(&ocr, &mut CardCorrections::default());
        assert_eq!(first, second);
        assert_eq!(first.full_text, "Evasive, Ward\nWhen you play this character, draw a card.");
        assert_eq!(first.keyword_abilities, vec!["Evasive", "Ward"]);
    }

    #[test]
    fn test_unparsed_numbers() {
        let mut ocr = ocr();
        ocr.cost = "-1".to_string();
        ocr.strength = Some("x".to_string());
        let card = parse(&ocr, &mut CardCorrections::default());
        assert_eq!(card.cost, -1);
        assert_eq!(card.strength, Some(-1));
    }
}
