//! Turns ability drafts into typed abilities and puts the card text back together.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

use super::ability::{Ability, AbilityDraft, AbilityKind, ActivatedAbility, NamedAbility};
use super::classify::{classify, CostSplit};
use super::directives::{check_index, LayoutDirectives};
use super::draft::correct_full_text;
use super::keyword::{is_bare_keyword, is_keyword_text, split_keyword};
use super::ReconstructError;
use crate::card::CardType;
use crate::correction::{CardCorrections, Directive};
use crate::language::Language;

/// Past this many characters on the first line, the label spans the whole text box.
const LONG_FIRST_LINE: usize = 70;

static PRINTED_COST_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([-–—])\s").expect("printed dash regex is valid"));

/// What finalization needs to know about the card itself.
#[derive(Debug, Clone, Copy)]
pub struct CardContext<'a> {
    pub name: &'a str,
    pub card_type: CardType,
    pub language: Language,
    pub set_code: Option<&'a str>,
    /// Published rules text, when known.
    pub rules_text: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledText {
    pub abilities: Vec<Ability>,
    pub keyword_abilities: Vec<String>,
    pub full_text: String,
    pub full_text_sections: Vec<String>,
}

pub fn assemble(
    drafts: Vec<AbilityDraft>,
    effects: &[String],
    context: &CardContext,
    layout: &LayoutDirectives,
    corrections: &mut CardCorrections,
) -> Result<AssembledText, ReconstructError> {
    let mut abilities = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.into_iter().enumerate() {
        abilities.push(finalize(index, draft, context, layout, corrections)?);
    }

    if let Some((from, to)) = layout.move_ability {
        let len = abilities.len();
        if check_index("_moveAbilityAtIndexToIndex", "ability", from, len)
            && check_index("_moveAbilityAtIndexToIndex", "ability", to, len)
        {
            info!("Moving ability at index {} to index {}", from, to);
            let ability = abilities.remove(from);
            abilities.insert(to, ability);
            corrections.mark_applied(&Directive::MoveAbility { from, to });
        }
    }

    let keyword_abilities = abilities.iter().filter_map(Ability::keyword).map(str::to_string).collect();
    let mut sections = full_text_sections(&abilities, layout.skip_merge, corrections);
    sections.extend(effects.iter().cloned());
    let full_text = correct_full_text(sections.join("\n"), corrections);

    Ok(AssembledText {
        abilities,
        keyword_abilities,
        full_text,
        full_text_sections: sections,
    })
}

/// Keywords without reminder text printed on one line are separate
/// abilities, but share one section.
fn full_text_sections(abilities: &[Ability], skip_merge: Option<usize>, corrections: &mut CardCorrections) -> Vec<String> {
    let mut sections: Vec<String> = Vec::with_capacity(abilities.len());
    let mut previous_was_bare_keyword = false;
    for (index, ability) in abilities.iter().enumerate() {
        let full_text = ability.full_text();
        let skipped = skip_merge == Some(index);
        if skipped {
            debug!("Not joining ability {} with the previous line", index);
            corrections.mark_applied(&Directive::SkipFullTextSectionMerge(index));
        }
        let is_bare = ability.kind() == AbilityKind::Keyword && is_bare_keyword(full_text);
        match sections.last_mut() {
            Some(section) if is_bare && previous_was_bare_keyword && !skipped => {
                section.push_str(", ");
                section.push_str(full_text);
            }
            _ => sections.push(full_text.to_string()),
        }
        previous_was_bare_keyword = is_bare;
    }
    sections
}

fn finalize(
    index: usize,
    draft: AbilityDraft,
    context: &CardContext,
    layout: &LayoutDirectives,
    corrections: &mut CardCorrections,
) -> Result<Ability, ReconstructError> {
    let forced = layout.forced.get(&index).copied();
    let is_keyword = match forced {
        Some(kind) => kind == AbilityKind::Keyword,
        None => {
            draft.kind == Some(AbilityKind::Keyword) || (draft.kind.is_none() && !draft.has_name() && is_keyword_text(draft.text()))
        }
    };

    if is_keyword {
        if forced.is_some() {
            if draft.kind == Some(AbilityKind::Keyword) {
                warn!("Ability {} is forced to be a keyword, but it already is one", index);
            } else {
                info!("Forcing ability {} to be a keyword", index);
                corrections.mark_applied(&Directive::ForceAbilityType { index, kind: AbilityKind::Keyword });
            }
        }
        if layout.newline_after == Some(index) {
            error!("Ability {} should get a newline after its name, but it is a keyword and has no name", index);
        }
        return Ok(Ability::Keyword(split_keyword(draft.text())));
    }

    let raw_effect = draft.effect.clone().unwrap_or_else(|| draft.text().to_string());
    let classification = classify(&raw_effect, context.name, context.language);
    let mut kind = classification.kind;
    if let Some(forced) = forced {
        if forced == kind {
            warn!("Ability {} should be forced to {:?}, but it already is that type", index, forced);
        } else {
            info!("Forcing ability {} from {:?} to {:?}", index, kind, forced);
            kind = forced;
            corrections.mark_applied(&Directive::ForceAbilityType { index, kind: forced });
        }
    }
    let cost_split = classification.cost_split.filter(|_| kind == AbilityKind::Activated);

    let name = draft.name.filter(|name| !name.is_empty());
    let mut full_text = String::new();
    if let Some(name) = &name {
        full_text.push_str(name);
        if layout.newline_after == Some(index) {
            info!("Adding newline after ability label {}", index);
            full_text.push('\n');
            corrections.mark_applied(&Directive::NewlineAfterLabel(index));
        } else {
            full_text.push(' ');
        }
    } else if layout.newline_after == Some(index) {
        error!("Ability {} should get a newline after its name, but it has no name", index);
    }

    let mut costs_text = String::new();
    let effect_text = match &cost_split {
        Some(split) => {
            if split.effect.trim().is_empty() {
                return Err(ReconstructError::MissingEffect {
                    index,
                    costs_text: split.costs_text.to_string(),
                });
            }
            full_text.push_str(split.costs_text);
            full_text.push_str(split.space_before);
            full_text.push_str(&cost_dash(context, split));
            full_text.push_str(split.space_after);
            costs_text = split.costs_text.replace('\n', " ");
            split.effect
        }
        None => raw_effect.as_str(),
    };
    full_text.push_str(effect_text);

    let mut effect = effect_text.replace('\n', " ");
    if effect.starts_with('(') {
        // Song reminder text keeps its brackets in the full text only
        effect = effect.trim_matches(['(', ')']).to_string();
    }

    if let Some(name) = &name {
        let first_line = full_text.split('\n').next().unwrap_or_default();
        if context.card_type != CardType::Location && first_line.chars().count() >= LONG_FIRST_LINE {
            info!("Adding newline after long ability label {}", index);
            full_text.replace_range(name.len()..name.len() + 1, "\n");
        }
    }

    Ok(match kind {
        AbilityKind::Activated => Ability::Activated(ActivatedAbility {
            name,
            costs: if costs_text.is_empty() { Vec::new() } else { costs_text.split(", ").map(str::to_string).collect() },
            costs_text,
            effect,
            full_text,
        }),
        AbilityKind::Triggered => Ability::Triggered(NamedAbility { name, effect, full_text }),
        AbilityKind::Static | AbilityKind::Keyword => Ability::Static(NamedAbility { name, effect, full_text }),
    })
}

/// The dash between cost and effect. Some German sets always use one kind;
/// otherwise the published rules text knows better than the recognizer.
fn cost_dash(context: &CardContext, split: &CostSplit) -> String {
    if context.language == Language::German {
        match context.set_code {
            Some("1") => return "–".to_string(),
            Some("5") => return "—".to_string(),
            _ => {}
        }
    }
    if let Some(rules_text) = context.rules_text {
        match PRINTED_COST_DASH.captures(rules_text) {
            Some(caps) => return caps[1].to_string(),
            None => error!("No cost separator dash in the published rules text {:?}", rules_text),
        }
    }
    split.dash.to_string()
}
