//! Name, flavor text, subtypes and artist cleanup.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::card::CardType;
use crate::correction::CorrectionRuleSet;
use crate::language::Language;
use crate::symbols::{SEPARATOR, SEPARATOR_STRING};

static TITLE_CASE_WORD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^| |\n|\(|-| '| d')([a-z])('?)").expect("title case regex is valid"));
static ENGLISH_ITALIC_T: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\W)I([ehiow]\w)").expect("italic T regex is valid"));
static SUBTYPE_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("[^A-Za-zàäèéöü{SEPARATOR} ]")).expect("subtype junk regex is valid"));
static FLOODBORN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[EF][il][aeo][aeo]d[^b]?b?[^b]?[aeo](r[an][es+-]?|m)$").expect("floodborn regex is valid"));
static HERO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^e?H[eo]r[aeos]").expect("hero regex is valid"));
static ILLUSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^I?Hl?usion").expect("illusion regex is valid"));
static HAS_VOWEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[aeiouAEIOU]").expect("vowel regex is valid"));
static ARTIST_TRAILING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#" [a-z0-9ÿI|(\\_+.”—-]{1,2}$"#).expect("artist junk regex is valid"));
static ARTIST_LEADING_I: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[l\[]").expect("artist start regex is valid"));

/// Names that are printed in capitals on purpose.
const UPPERCASE_NAMES: &[&str] = &["B.E.N.", "I2I"];

/// Cleans up the card name; all-caps names get title-cased.
pub fn clean_name(raw: &str, card_type: CardType, rules: &CorrectionRuleSet) -> String {
    let name = rules
        .correct_punctuation(raw.trim())
        .replace(['’', '‘'], "'")
        .replace("''", "'");
    if !is_all_caps(&name) || UPPERCASE_NAMES.contains(&name.as_str()) {
        return name;
    }

    let language = rules.language();
    if card_type != CardType::Character && language == Language::French {
        // French title case is complicated, only the first letter stays capital
        let mut chars = name.chars();
        return match chars.next() {
            Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
            None => name,
        };
    }
    to_title_case(&name, language)
}

fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

pub fn to_title_case(text: &str, language: Language) -> String {
    let lower = text.to_lowercase();
    let mut titled = String::with_capacity(lower.len());
    let mut last = 0;
    let mut search_from = 0;
    // Word starts may share a character with the previous match, so search step by step
    while let Some(caps) = TITLE_CASE_WORD_START.captures_at(&lower, search_from) {
        let (Some(prefix), Some(letter)) = (caps.get(1), caps.get(2)) else {
            break;
        };
        // "l'" and "d'" stay lowercase
        if caps.get(3).is_none_or(|quote| quote.is_empty()) {
            titled.push_str(&lower[last..prefix.end()]);
            titled.push_str(&letter.as_str().to_uppercase());
            last = letter.end();
        }
        search_from = letter.end();
    }
    titled.push_str(&lower[last..]);

    let lowercase_words: &[&str] = match language {
        Language::English => &[" A ", " At ", " In ", " Into ", " Of ", " The ", " To "],
        Language::French => &[" D'", " De ", " Des ", " Du "],
        _ => &[],
    };
    lowercase_words
        .iter()
        .fold(titled, |text, word| text.replace(word, &word.to_lowercase()))
}

pub fn clean_flavor_text(raw: &str, rules: &CorrectionRuleSet) -> String {
    let flavor = rules.correct_punctuation(&rules.correct(raw));
    match rules.language() {
        // The italic T reads as an I
        Language::English if flavor.contains('I') => ENGLISH_ITALIC_T.replace_all(&flavor, "${1}T${2}").into_owned(),
        Language::French if flavor.contains('-') => flavor.replace("\n-", "\n–").replace("” -", "” –"),
        Language::German => flavor
            .strip_suffix(" |")
            .unwrap_or(&flavor)
            .replace("\nInschrift", "\n—Inschrift"),
        _ => flavor,
    }
}

/// Splits the type bar into subtypes, dropping the main type on non-character cards.
pub fn parse_subtypes(type_bar: &str, language: Language) -> Vec<String> {
    let cleaned = SUBTYPE_JUNK.replace_all(type_bar, "");
    let mut subtypes: Vec<String> = cleaned.split(SEPARATOR_STRING).map(str::to_string).collect();
    for subtype in subtypes.iter_mut().filter(|s| *s == "ltem") {
        *subtype = "Item".to_string();
    }

    let (first, second) = match language {
        Language::English => ("Seven", "Dwarfs"),
        Language::French => ("Sept", "Nains"),
        Language::German => ("Sieben", "Zwerge"),
        Language::Italian => ("Sette", "Nani"),
    };
    if subtypes.iter().any(|s| s == first) && subtypes.iter().any(|s| s == second) {
        subtypes.retain(|s| s != second);
        if let Some(subtype) = subtypes.iter_mut().find(|s| *s == first) {
            *subtype = format!("{} {}", first, second);
        }
    }

    let min_length = if language == Language::English { 4 } else { 3 };
    let mut kept = Vec::with_capacity(subtypes.len());
    for subtype in subtypes {
        let corrected = if matches!(language, Language::English | Language::French)
            && subtype != "Floodborn"
            && FLOODBORN.is_match(&subtype)
        {
            debug!("Correcting {:?} to 'Floodborn'", subtype);
            "Floodborn".to_string()
        } else if language == Language::English && subtype != "Hero" && HERO.is_match(&subtype) {
            "Hero".to_string()
        } else if ILLUSION.is_match(&subtype) {
            "Illusion".to_string()
        } else if language == Language::Italian && subtype == "lena" {
            "Iena".to_string()
        } else if subtype == "Hros" {
            "Héros".to_string()
        } else if subtype == "toryborn" || subtype == "Storyhorn" {
            "Storyborn".to_string()
        } else if subtype.chars().count() < min_length && subtype != "Re" {
            // 'Re' is Italian for 'King'
            debug!("Removing subtype {:?}, too short", subtype);
            continue;
        } else if !HAS_VOWEL.is_match(&subtype) {
            debug!("Removing subtype {:?}, no vowels", subtype);
            continue;
        } else {
            subtype
        };
        kept.push(corrected);
    }

    let types = language.type_names();
    if kept.first().is_some_and(|first| types.is_non_character(first)) {
        kept.remove(0);
    }
    kept
}

/// Strips stray characters the recognizer adds around the artist line.
pub fn clean_artists_text(raw: &str) -> String {
    let text = raw.trim().trim_start_matches(['.', ' ']).replace('’', "'").replace('|', "l");
    let mut text = ARTIST_LEADING_I.replace(&text, "I").into_owned();
    while ARTIST_TRAILING_JUNK.is_match(&text) {
        match text.rsplit_once(' ') {
            Some((rest, _)) => text = rest.to_string(),
            None => break,
        }
    }
    let text = text
        .trim_end_matches('.')
        .replace("Haggman-Sund", "Häggman-Sund")
        .replace(['“', '”'], "\"");
    if text != raw.trim() {
        info!("Corrected artist name from {:?} to {:?}", raw.trim(), text);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(language: Language) -> CorrectionRuleSet {
        CorrectionRuleSet::for_language(language).unwrap()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(to_title_case("BEAST'S MIRROR", Language::English), "Beast's Mirror");
        assert_eq!(to_title_case("SWORD IN THE STONE", Language::English), "Sword in the Stone");
        assert_eq!(to_title_case("CHAPEAU DE MAGICIEN", Language::French), "Chapeau de Magicien");
    }

    #[test]
    fn test_clean_name() {
        let english = rules(Language::English);
        assert_eq!(clean_name("Maleficent’s Staff", CardType::Item, &english), "Maleficent's Staff");
        assert_eq!(clean_name("LEFOU", CardType::Character, &english), "Lefou");
        assert_eq!(clean_name("B.E.N.", CardType::Character, &english), "B.E.N.");
        let french = rules(Language::French);
        assert_eq!(clean_name("CHAPEAU DE MAGICIEN", CardType::Item, &french), "Chapeau de magicien");
    }

    #[test]
    fn test_subtypes() {
        assert_eq!(
            parse_subtypes("Storyborn • Hero • Princess", Language::English),
            vec!["Storyborn", "Hero", "Princess"]
        );
        assert_eq!(
            parse_subtypes("Dreamborn • Seven • Dwarfs", Language::English),
            vec!["Dreamborn", "Seven Dwarfs"]
        );
        assert_eq!(parse_subtypes("ltem", Language::English), Vec::<String>::new());
        assert_eq!(parse_subtypes("Action • Song", Language::English), vec!["Song"]);
        assert_eq!(parse_subtypes("Fioodborn • Ally • Xz", Language::English), vec!["Floodborn", "Ally"]);
        assert_eq!(parse_subtypes("Re • Sognatore", Language::Italian), vec!["Re", "Sognatore"]);
    }

    #[test]
    fn test_flavor_text() {
        let english = rules(Language::English);
        assert_eq!(clean_flavor_text("Ihe sea is calm.", &english), "The sea is calm.");
        let french = rules(Language::French);
        assert!(clean_flavor_text("“Bonjour.”\n-Belle", &french).contains("\n–Belle"));
    }

    #[test]
    fn test_artists() {
        assert_eq!(clean_artists_text(". lan Smith a"), "Ian Smith");
        assert_eq!(clean_artists_text("Jane Doe / John Roe"), "Jane Doe / John Roe");
    }
}
