//! Decides whether a labeled ability is static, triggered or activated.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::ability::AbilityKind;
use crate::language::Language;

/// Cost, dash, effect. Text inside a quoted ability grant never counts, so the
/// prefix may not contain an opening quote. The greedy prefix makes the last dash win.
static COST_SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^"“„«]+(\s)([-–—])(\s)"#).expect("cost separator regex is valid"));

/// The pieces around an activated ability's cost dash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSplit<'a> {
    pub costs_text: &'a str,
    pub space_before: &'a str,
    pub dash: &'a str,
    pub space_after: &'a str,
    pub effect: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub kind: AbilityKind,
    pub cost_split: Option<CostSplit<'a>>,
}

/// Finds the cost separator, unless the dash belongs to the card's own name
/// ("Dalmatian Puppy - Tail Wagger") appearing before it.
pub fn find_cost_separator<'a>(effect: &'a str, card_name: &str) -> Option<CostSplit<'a>> {
    let caps = COST_SEPARATOR_REGEX.captures(effect)?;
    let before = caps.get(1)?;
    let dash = caps.get(2)?;
    let after = caps.get(3)?;

    if !card_name.is_empty() {
        if let Some(name_position) = effect.find(card_name) {
            debug!(
                "Card name {:?} appears at {} in an ability with a dash at {}",
                card_name,
                name_position,
                before.start()
            );
            if name_position <= before.start() {
                return None;
            }
        }
    }

    Some(CostSplit {
        costs_text: &effect[..before.start()],
        space_before: before.as_str(),
        dash: dash.as_str(),
        space_after: after.as_str(),
        effect: &effect[after.end()..],
    })
}

pub fn classify<'a>(effect: &'a str, card_name: &str, language: Language) -> Classification<'a> {
    if let Some(split) = find_cost_separator(effect, card_name) {
        return Classification {
            kind: AbilityKind::Activated,
            cost_split: Some(split),
        };
    }
    Classification {
        kind: openers(language).kind_of(effect),
        cost_split: None,
    }
}

struct Openers {
    activated: Regex,
    /// A capture group named `veto` that takes part in the match cancels it.
    triggered: Vec<Regex>,
}

impl Openers {
    fn new(activated: &str, triggered: &[&str]) -> Self {
        Self {
            activated: Regex::new(activated).expect("activated opener is valid"),
            triggered: triggered
                .iter()
                .map(|pattern| Regex::new(pattern).expect("triggered opener is valid"))
                .collect(),
        }
    }

    fn kind_of(&self, effect: &str) -> AbilityKind {
        if self.activated.is_match(effect) {
            return AbilityKind::Activated;
        }
        let triggered = self.triggered.iter().any(|pattern| {
            pattern
                .captures(effect)
                .is_some_and(|caps| caps.name("veto").is_none())
        });
        if triggered {
            AbilityKind::Triggered
        } else {
            AbilityKind::Static
        }
    }
}

static ENGLISH: LazyLock<Openers> = LazyLock::new(|| {
    Openers::new(
        r"^Once (during your|per) turn, you may",
        &[
            r"^At the start of",
            r"^At the end of",
            r"(^W|,[ \n]w)hen(ever)?[ \n]",
            r"when (he|she|it|they) enters play",
        ],
    )
});

static FRENCH: LazyLock<Openers> = LazyLock::new(|| {
    Openers::new(
        r"^Une\sfois\s(durant\svotre|par)\stour,\svous\spouvez",
        &[
            r"^Au début de chacun",
            r"^Au\sdébut\sd[eu](\svotre)?\stour\b",
            r"^À\sla\sfin\sd",
            r"(^L|\bl)orsqu(e|'une?|'il)\b",
            r"(^À c|^C|,\sc)haque\sfois",
            r"^Si (?P<veto>vous avez|un personnage)?",
            r"gagnez .+ pour chaque",
            r"une carte est\splacée",
        ],
    )
});

static GERMAN: LazyLock<Openers> = LazyLock::new(|| {
    Openers::new(
        r"^Einmal\s(pro|während\sdeines)\sZug(es)?,?\sdarfst\sdu",
        &[
            r"^Wenn(\sdu)?\sdiese",
            r"^Wenn\seiner\sdeiner\sCharaktere",
            r"(^J|\bj)edes\sMal\b",
            r"^Einmal\swährend\sdeines\sZuges\b",
            r"^Einmal pro Zug, wenn",
            r"(^Z|\bz)u\sBeginn\s(deines|von\s\w+)\sZug",
            r"^Am\sEnde\s(deines|des)\sZuges",
            r"^Falls\sdu\sGestaltwandel\sbenutzt\shas",
            r"wenn du eine Karte ziehst",
            r"\bwährend\ser\seinen?(\s|\w)+herausfordert\b",
            r"wenn\sdieser\sCharakter\szu\seinem\sOrt\sbewegt",
            r"^Wenn\s\w+\sdiese[nrs]\s\w+\sausspielt",
            r"(?s)^Wenn\sdu\seine.+ausspielst",
        ],
    )
});

static ITALIAN: LazyLock<Openers> = LazyLock::new(|| {
    Openers::new(
        r"^Una\svolta\s(durante\sil\stuo|per)\sturno,\spuoi\b",
        &[
            r"^Quando\sgiochi",
            r"(^Q|\sq)uando\s(questo|sposti)",
            r"(^O|\so)gni\svolta\sche",
            r"^All'inizio\sdel\stuo\sturno",
            r"^Alla\sfine\sdel(\stuo)?\sturno",
            r"quando\saggiungi\suna\scarta\sal\stuo\scalamaio",
            r"^Quando\sun\savversario",
        ],
    )
});

fn openers(language: Language) -> &'static Openers {
    match language {
        Language::English => &ENGLISH,
        Language::French => &FRENCH,
        Language::German => &GERMAN,
        Language::Italian => &ITALIAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activated_cost_split() {
        let effect = "Once per turn, you may ⟳ — Deal 1 damage.";
        let result = classify(effect, "Goofy", Language::English);
        assert_eq!(result.kind, AbilityKind::Activated);
        let split = result.cost_split.unwrap();
        assert_eq!(split.costs_text, "Once per turn, you may ⟳");
        assert_eq!(split.dash, "—");
        assert_eq!(split.effect, "Deal 1 damage.");
    }

    #[test]
    fn test_triggered_openers() {
        let english = classify("At the start of your turn, gain 1 lore.", "Goofy", Language::English);
        assert_eq!(english.kind, AbilityKind::Triggered);
        assert!(english.cost_split.is_none());

        assert_eq!(
            classify("Whenever this character quests, draw a card.", "", Language::English).kind,
            AbilityKind::Triggered
        );
        assert_eq!(
            classify("Lorsque vous jouez ce personnage, piochez une carte.", "", Language::French).kind,
            AbilityKind::Triggered
        );
        assert_eq!(
            classify("Zu Beginn deines Zuges, ziehe eine Karte.", "", Language::German).kind,
            AbilityKind::Triggered
        );
        assert_eq!(
            classify("Quando giochi questo personaggio, pesca una carta.", "", Language::Italian).kind,
            AbilityKind::Triggered
        );
    }

    #[test]
    fn test_static_default_and_french_veto() {
        assert_eq!(
            classify("Your other characters get +1 ¤.", "Goofy", Language::English).kind,
            AbilityKind::Static
        );
        assert_eq!(
            classify("Si un personnage est exclu, piochez.", "", Language::French).kind,
            AbilityKind::Static
        );
        assert_eq!(
            classify("Si c'est votre tour, piochez.", "", Language::French).kind,
            AbilityKind::Triggered
        );
        assert_eq!(
            classify("Une fois par tour, vous pouvez piocher.", "", Language::French).kind,
            AbilityKind::Activated
        );
    }

    #[test]
    fn test_quoted_grant_is_not_a_cost() {
        let effect = "Your characters gain \"⟳ — Draw a card.\"";
        assert_eq!(classify(effect, "", Language::English).kind, AbilityKind::Static);
    }

    #[test]
    fn test_dash_in_card_name() {
        let effect = "Your characters named Dalmatian Puppy - Tail Wagger get +1 ◊.";
        assert_eq!(find_cost_separator(effect, "Dalmatian Puppy"), None);
        // Name after the dash doesn't protect it
        let effect = "⟳ - Ready a character named Dalmatian Puppy.";
        assert!(find_cost_separator(effect, "Dalmatian Puppy").is_some());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let effect = "1 ⬡ - Chosen character gets +2 ¤ this turn.";
        let first = classify(effect, "Goofy", Language::English);
        for _ in 0..5 {
            assert_eq!(classify(effect, "Goofy", Language::English), first);
        }
    }
}
