use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::ability::AbilityDraft;
use super::keyword::{KEYWORD_REGEX, KEYWORD_WITHOUT_REMINDER_REGEX};
use crate::correction::CorrectionRuleSet;

const MIN_LENGTH: usize = 4;
const MIN_EFFECT_LENGTH: usize = 10;

static STARTS_LOWERCASE_OR_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z(]").expect("line start regex is valid"));

/// Text above the labels, sorted into unlabeled abilities, keyword drafts and one-off effects.
#[derive(Debug, Default, PartialEq)]
pub struct RemainingText {
    pub abilities: Vec<AbilityDraft>,
    pub effects: Vec<String>,
}

/// Splits the unlabeled text into blocks and sorts them.
///
/// `is_item` cards print their unlabeled abilities there, so every block
/// becomes an ability.
pub fn parse_remaining_text(text: &str, rules: &CorrectionRuleSet, is_item: bool) -> RemainingText {
    let mut result = RemainingText::default();
    let text = text.trim_start_matches(['“', '‘']).trim_end_matches([' ', '\n', '|']);
    // Nothing ends with a colon, it's the start of a choice list
    let text = text.replace(":\n\n", ":\n");
    // A closing bracket ends a section
    let text = text.replace(".)\n", ".)\n\n");
    let text = text.replace(".)\n\n\n", ".)\n\n");

    for block in merge_split_blocks(text.split("\n\n").map(str::to_string).collect()) {
        let block = rules.correct(&rules.correct_punctuation(&block)).replace('‘', "");
        if block.chars().count() < MIN_LENGTH {
            info!("Remaining text {:?} is too short, discarding", block);
            continue;
        }
        if is_item || (block.starts_with('(') && text.contains(')')) {
            // Song reminder text and item abilities have no label
            result.abilities.push(AbilityDraft::effect(block));
            continue;
        }

        let keyword_lines = keyword_lines(&block);
        if !keyword_lines.is_empty() {
            for line in keyword_lines {
                result.abilities.push(AbilityDraft::keyword(rules.correct(line.trim_end())));
            }
        } else if block.chars().count() > MIN_EFFECT_LENGTH {
            result.effects.push(block);
        } else {
            debug!("Remaining text {:?} is too short to be an effect, discarding", block);
        }
    }
    result
}

/// Joins blocks that the recognizer split in the middle of a sentence or list.
fn merge_split_blocks(mut blocks: Vec<String>) -> Vec<String> {
    for index in (1..blocks.len()).rev() {
        let block = &blocks[index];
        let previous = &blocks[index - 1];
        let continues = block.starts_with('-')
            || (STARTS_LOWERCASE_OR_BRACKET.is_match(block) && !previous.ends_with(')'))
            || block.matches(')').count() > block.matches('(').count();
        if continues {
            info!("Merging accidentally split line {:?} with previous line {:?}", block, previous);
            let block = blocks.remove(index);
            blocks[index - 1].push('\n');
            blocks[index - 1].push_str(&block);
        }
    }
    blocks
}

/// The keyword abilities in a block: one with reminder text, a comma-separated
/// list of bare keywords, or a single bare keyword. Empty when it's no keyword.
fn keyword_lines(block: &str) -> Vec<&str> {
    if KEYWORD_REGEX.is_match(block) {
        return vec![block];
    }
    if block.contains(", ") && !block.ends_with('.') {
        let parts: Vec<&str> = block.split(", ").collect();
        if parts.iter().all(|part| KEYWORD_WITHOUT_REMINDER_REGEX.is_match(part.trim_end())) {
            return parts;
        }
        return Vec::new();
    }
    if KEYWORD_WITHOUT_REMINDER_REGEX.is_match(block) {
        return vec![block];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::reconstruct::AbilityKind;

    fn english() -> CorrectionRuleSet {
        CorrectionRuleSet::for_language(Language::English).unwrap()
    }

    #[test]
    fn test_keywords_and_effects() {
        let text = "Bodyguard\n\nEvasive, Ward\n\nChosen character gets +2 ¤ this turn.";
        let result = parse_remaining_text(text, &english(), false);

        let keywords: Vec<&str> = result.abilities.iter().map(AbilityDraft::text).collect();
        assert_eq!(keywords, vec!["Bodyguard", "Evasive", "Ward"]);
        assert!(result.abilities.iter().all(|a| a.kind == Some(AbilityKind::Keyword)));
        assert_eq!(result.effects, vec!["Chosen character gets +2 ¤ this turn."]);
    }

    #[test]
    fn test_split_lines_are_merged() {
        let text = "Choose one:\n\n• Draw a card.\n\nand then discard a card.";
        let result = parse_remaining_text(text, &english(), false);
        assert_eq!(result.effects, vec!["Choose one:\n• Draw a card.\nand then discard a card."]);
    }

    #[test]
    fn test_song_reminder_becomes_ability() {
        let text = "(A character with cost 2 or more can ⟳ to sing this song for free.)\nDeal 2 damage to chosen character.";
        let result = parse_remaining_text(text, &english(), false);
        assert_eq!(result.abilities.len(), 1);
        assert!(result.abilities[0].text().starts_with("(A character"));
        assert_eq!(result.effects, vec!["Deal 2 damage to chosen character."]);
    }

    #[test]
    fn test_items_and_noise() {
        let result = parse_remaining_text("Your characters get +1 ◊.\n\nx.", &english(), true);
        assert_eq!(result.abilities.len(), 1);
        assert!(result.effects.is_empty());

        let result = parse_remaining_text("Gain lore", &english(), false);
        assert!(result.abilities.is_empty() && result.effects.is_empty());
    }
}
