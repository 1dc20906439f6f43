use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::ability::KeywordAbility;

/// A capitalized keyword followed by bracketed reminder text.
pub static KEYWORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\n?([A-ZÀ][^.]+)\s\([A-Z]").expect("keyword regex is valid"));

/// One or two words, maybe a number, no closing period: "Evasive", "Challenger +2", "Shift 5".
pub static KEYWORD_WITHOUT_REMINDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-ZÀ][^ ]{2,}|À)( ([dl]['’])?[A-Zasu][^ ]{2,})?( \d+)?( .)?$").expect("bare keyword regex is valid")
});

static REMINDER_START_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s\(").expect("reminder regex is valid"));
static GLUED_VALUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+?)(\d+)$").expect("glued value regex is valid"));
static COLON_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ?: ?").expect("colon regex is valid"));

pub fn is_keyword_text(text: &str) -> bool {
    KEYWORD_REGEX.is_match(text) || KEYWORD_WITHOUT_REMINDER_REGEX.is_match(text)
}

pub fn is_bare_keyword(text: &str) -> bool {
    KEYWORD_WITHOUT_REMINDER_REGEX.is_match(text)
}

/// Splits keyword text into keyword, value and reminder text.
pub fn split_keyword(full_text: &str) -> KeywordAbility {
    let mut keyword = full_text.to_string();
    let mut reminder_text = None;
    if keyword.contains('(') {
        let without_bracket = keyword.trim_end_matches(')');
        match REMINDER_START_REGEX.find(without_bracket) {
            Some(start) => {
                reminder_text = Some(without_bracket[start.end()..].replace('\n', " "));
                keyword = without_bracket[..start.start()].to_string();
            }
            None => warn!("Keyword text {:?} has a bracket but no reminder text after it", full_text),
        }
    }

    let mut keyword_value = None;
    let last = keyword.chars().last();
    let third_last = keyword.chars().rev().nth(2);
    if last.is_some_and(char::is_numeric) {
        if let Some((name, value)) = keyword.rsplit_once(' ') {
            keyword_value = Some(value.to_string());
            keyword = name.to_string();
        } else if let Some(caps) = GLUED_VALUE_REGEX.captures(&keyword) {
            debug!("No space between keyword and value in {:?}, splitting on the digits", keyword);
            keyword_value = Some(caps[2].to_string());
            keyword = caps[1].to_string();
        }
    } else if third_last.is_some_and(char::is_numeric) {
        // "Shift 5 ⬡"
        let parts: Vec<&str> = keyword.rsplitn(3, ' ').collect();
        if let [_symbol, value, name] = parts.as_slice() {
            keyword_value = Some(value.to_string());
            keyword = name.to_string();
        }
    } else if keyword.contains(':') {
        let parts: Vec<String> = COLON_REGEX.splitn(&keyword, 2).map(str::to_string).collect();
        if let [name, value] = parts.as_slice() {
            keyword_value = Some(value.clone());
            keyword = name.clone();
        }
    }

    let keyword_value_number = keyword_value
        .as_deref()
        .filter(|value| value.chars().last().is_some_and(char::is_numeric))
        .and_then(|value| value.trim_start_matches('+').parse().ok());

    KeywordAbility {
        keyword,
        keyword_value,
        keyword_value_number,
        reminder_text,
        full_text: full_text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_keyword() {
        assert!(is_keyword_text("Bodyguard"));
        let ability = split_keyword("Bodyguard");
        assert_eq!(ability.keyword, "Bodyguard");
        assert_eq!(ability.keyword_value, None);
        assert_eq!(ability.reminder_text, None);
    }

    #[test]
    fn test_keyword_with_value_and_reminder() {
        let text = "Sing Together 5 (Any number of your or your teammates' characters with total cost 5 or\nmore may ⟳ to sing this song for free.)";
        assert!(is_keyword_text(text));
        let ability = split_keyword(text);
        assert_eq!(ability.keyword, "Sing Together");
        assert_eq!(ability.keyword_value.as_deref(), Some("5"));
        assert_eq!(ability.keyword_value_number, Some(5));
        assert_eq!(
            ability.reminder_text.as_deref(),
            Some("Any number of your or your teammates' characters with total cost 5 or more may ⟳ to sing this song for free.")
        );
        assert_eq!(ability.full_text, text);
    }

    #[test]
    fn test_value_variants() {
        let challenger = split_keyword("Challenger +2 (While challenging, this character gets +2 ¤.)");
        assert_eq!(challenger.keyword, "Challenger");
        assert_eq!(challenger.keyword_value.as_deref(), Some("+2"));
        assert_eq!(challenger.keyword_value_number, Some(2));

        let glued = split_keyword("Singer5");
        assert_eq!(glued.keyword, "Singer");
        assert_eq!(glued.keyword_value.as_deref(), Some("5"));

        let shift_with_ink = split_keyword("Shift 6 ⬡ (You may pay 6 ⬡ to play this on top of one of your characters named Elsa.)");
        assert_eq!(shift_with_ink.keyword, "Shift");
        assert_eq!(shift_with_ink.keyword_value.as_deref(), Some("6"));

        let colon = split_keyword("Shift: Discard a song card (You may discard a song card to play this.)");
        assert_eq!(colon.keyword, "Shift");
        assert_eq!(colon.keyword_value.as_deref(), Some("Discard a song card"));
        assert_eq!(colon.keyword_value_number, None);
    }

    #[test]
    fn test_sentences_are_not_keywords() {
        assert!(!is_keyword_text("Draw a card."));
        assert!(!is_keyword_text("When you play this character, draw a card."));
        assert!(is_bare_keyword("Shift 5"));
        assert!(!is_bare_keyword("Resist +1 (Damage dealt to this character is reduced by 1.)"));
    }
}
