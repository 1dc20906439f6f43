//! Cleanup of recognized ability labels.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, info};

use crate::correction::CorrectionRuleSet;
use crate::language::Language;
use crate::symbols::GLYPHS;

static LEADING_DIGIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d ").expect("leading digit regex is valid"));
static TRAILING_JUNK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w) ?[.;7|>»”©("=~_]{1,2}$"#).expect("trailing junk regex is valid"));

static ENGLISH_FIXES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"^l", "I"),
        (r"\b[IL]M\b", "I'M"),
        (r"(^|\s)['’IP]?LL\b", "${1}I'LL"),
        (r"ITLL", "IT'LL"),
        // Plural possessive uses a plain quote
        (r"([A-Z]S)’(\s)", "${1}'${2}"),
    ])
});

static FRENCH_FIXES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"A ?!(.{3,})", "AI${1}"),
        // French puts a space before ! and ?
        (r"(^|[^?! ])([!?])", "${1} ${2}"),
        (r"\bCA\b", "ÇA"),
        (r"\bCAVA\b", "ÇA VA"),
        (r"\bTRES\b", "TRÈS"),
        (r"\bJY\b", "J'Y"),
    ])
});

static ITALIAN_FIXES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| compile(&[(r"[1I]0", "IO")]));

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).expect("label fix is valid"), *replacement))
        .collect()
}

fn apply_all(text: String, fixes: &[(Regex, &'static str)]) -> String {
    fixes
        .iter()
        .fold(text, |text, (pattern, replacement)| pattern.replace_all(&text, *replacement).into_owned())
}

/// Turns a recognized label into an uppercase ability name.
pub fn clean_label(raw: &str, rules: &CorrectionRuleSet) -> String {
    let punctuated = rules.correct_punctuation(&raw.replace("''", "'").replace('ß', "ẞ"));
    let mut name = punctuated
        .trim_matches(GLYPHS)
        .trim_start_matches(['-', '+', '*', '_', '.', '…', ' '])
        .trim_end_matches([' ', '%', ':'])
        .to_uppercase();

    name = LEADING_DIGIT_REGEX.replace(&name, "").into_owned();
    name = TRAILING_JUNK_REGEX.replace(&name, "${1}").into_owned();

    match rules.language() {
        Language::English => apply_all(name.replace('|', "I"), &ENGLISH_FIXES),
        Language::French => apply_all(name, &FRENCH_FIXES),
        Language::German => {
            // Periods at the end are misreads, ellipses are real
            let name = if name.ends_with('.') && !name.ends_with("...") {
                name.trim_end_matches('.').to_string()
            } else {
                name
            };
            name.replace('’', "'")
        }
        Language::Italian => apply_all(name.replace('|', "I"), &ITALIAN_FIXES).replace('’', "'"),
    }
}

/// The uppercase word runs in the printed rules text, which are the ability names.
///
/// Some cards print their names in mixed case with a `\ ` between name and
/// effect; the part before the backslash counts as uppercase then.
pub fn label_names_in_rules_text(rules_text: &str) -> Vec<String> {
    let normalized = match rules_text.find("\\ ") {
        Some(index) => format!("{}{}", rules_text[..index].to_uppercase(), &rules_text[index + 1..]),
        None => rules_text.to_string(),
    };

    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in normalized.split_whitespace() {
        if is_upper(word) {
            current.push(word);
        } else if !current.is_empty() {
            names.push(current.join(" "));
            current.clear();
        }
    }
    names
}

/// Uppercase with at least one cased character, like Python's `str.isupper`.
fn is_upper(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

/// Puts back spaces the recognizer dropped, using the printed name at the same
/// position. Gives up after a few mismatching characters, since the printed
/// name may belong to a different ability.
pub fn restore_missing_spaces(name: &str, index: usize, printed_names: &[String]) -> String {
    let Some(printed) = printed_names.get(index) else {
        error!(
            "Trying to read printed ability name index {} but there are only {} names",
            index,
            printed_names.len()
        );
        return name.to_string();
    };

    let printed: Vec<char> = printed.chars().collect();
    let mut corrected: Vec<char> = name.chars().collect();
    let mut mismatches = 0;
    let mut position = 0;
    while position < printed.len().min(corrected.len()) {
        let expected = printed[position];
        let actual = corrected[position];
        if expected == ' ' && actual != ' ' {
            corrected.insert(position, ' ');
        } else if expected != actual {
            mismatches += 1;
            if mismatches == 4 {
                info!(
                    "Too many mismatches between printed ability name {:?} and {:?}, not restoring spaces",
                    printed.iter().collect::<String>(),
                    name
                );
                return name.to_string();
            }
        }
        position += 1;
    }
    corrected.into_iter().collect()
}
