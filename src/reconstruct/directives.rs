//! Structural corrections from the card table, applied to a card draft.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

use super::ability::{AbilityDraft, AbilityKind};
use super::draft::CardDraft;
use super::keyword::is_keyword_text;
use super::ReconstructError;
use crate::correction::{CardCorrections, CorrectionError, CorrectionRuleSet, Directive};
use crate::symbols::SEPARATOR;

static KEYWORD_AT_LINE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n([A-ZÀ][^.]+) \(").expect("trailing keyword regex is valid"));

/// Directives that only matter while the abilities are finalized and assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDirectives {
    pub forced: BTreeMap<usize, AbilityKind>,
    pub newline_after: Option<usize>,
    pub skip_merge: Option<usize>,
    pub move_ability: Option<(usize, usize)>,
}

pub(super) fn check_index(key: &'static str, list: &'static str, index: usize, len: usize) -> bool {
    if index < len {
        return true;
    }
    error!("{}", CorrectionError::IndexOutOfRange { key, list, index, len });
    false
}

/// Applies the card's directives and field corrections to `card`, in a fixed
/// order. Directives that point outside the lists are logged and skipped, and
/// stay unconsumed.
pub fn apply_directives(
    card: &mut CardDraft,
    corrections: &mut CardCorrections,
    rules: &CorrectionRuleSet,
) -> Result<LayoutDirectives, ReconstructError> {
    let directives = corrections.directives().to_vec();
    let mut layout = LayoutDirectives::default();
    let mut removals: Option<Vec<usize>> = None;
    let mut add_name = None;
    let mut effect_is_ability = None;
    let mut effect_is_flavor = None;
    let mut merge_effect = None;
    let mut split_name = None;

    if directives.iter().any(|d| matches!(d, Directive::MoveKeywordsLast)) && move_keywords_last(card) {
        corrections.mark_applied(&Directive::MoveKeywordsLast);
    }
    for directive in &directives {
        if let Directive::InsertAbilities(inserted) = directive {
            for ability in inserted {
                if !check_index(directive.key(), "ability", ability.index, card.abilities.len() + 1) {
                    continue;
                }
                info!("Inserting ability {:?} at index {}", ability.effect, ability.index);
                let draft = AbilityDraft {
                    name: ability.name.clone(),
                    effect: Some(ability.effect.clone()),
                    full_text: Some(ability.effect.clone()),
                    kind: None,
                };
                card.abilities.insert(ability.index, draft);
            }
            corrections.mark_applied(directive);
        }
    }

    for directive in directives {
        match directive {
            Directive::RemoveAbilities(indexes) => {
                if card.abilities.is_empty() {
                    warn!("Correction to remove abilities {:?}, but the card has no abilities", indexes);
                } else {
                    removals = Some(indexes);
                }
            }
            Directive::ForceAbilityType { index, kind } => {
                if let Some(previous) = layout.forced.insert(index, kind) {
                    error!("Ability at index {} is being forced to two types: {:?} and {:?}", index, previous, kind);
                }
            }
            Directive::AddNameToAbility { index, name } => add_name = Some((index, name)),
            Directive::EffectIsAbility { index, name } => effect_is_ability = Some((index, name)),
            Directive::EffectIsFlavorText(index) => effect_is_flavor = Some(index),
            Directive::MergeEffectWithPrevious(index) => merge_effect = Some(index),
            Directive::MoveAbility { from, to } => layout.move_ability = Some((from, to)),
            Directive::NewlineAfterLabel(index) => layout.newline_after = Some(index),
            Directive::SkipFullTextSectionMerge(index) => layout.skip_merge = Some(index),
            Directive::SplitAbilityName { index, pattern } => split_name = Some((index, pattern)),
            Directive::MoveKeywordsLast | Directive::InsertAbilities(_) => {}
        }
    }

    let abilities_corrected = corrections.has_field_correction("abilities");
    let effects_corrected = corrections.has_field_correction("effects");
    card.apply_field_corrections(corrections)?;

    if !card.abilities.is_empty() && (abilities_corrected || removals.is_some()) {
        split_abilities(card, corrections, removals);
    }
    if effects_corrected && !card.effects.is_empty() {
        split_effects(card);
    }

    if let Some((index, pattern)) = split_name {
        if check_index("_splitAbilityNameAtIndex", "ability", index, card.abilities.len()) {
            let ability = &mut card.abilities[index];
            let effect = ability.effect.clone().unwrap_or_default();
            let parts: Vec<String> = pattern.splitn(&effect, 2).map(str::to_string).collect();
            match parts.as_slice() {
                [name, rest] => {
                    info!("Split ability {} into name {:?} and effect {:?}", index, name, rest);
                    ability.name = Some(name.to_string());
                    ability.effect = Some(rest.to_string());
                    corrections.mark_applied(&Directive::SplitAbilityName { index, pattern });
                }
                _ => error!("Pattern {:?} doesn't split the effect of ability {}", pattern.as_str(), index),
            }
        }
    }

    if let Some((index, name)) = add_name {
        if check_index("_addNameToAbilityAtIndex", "ability", index, card.abilities.len()) {
            let ability = &mut card.abilities[index];
            if ability.has_name() {
                error!(
                    "Can't add name {:?} to ability {}, it already has name {:?}",
                    name, index, ability.name
                );
            } else {
                info!("Adding ability name {:?} to ability {}", name, index);
                ability.name = Some(name.clone());
                corrections.mark_applied(&Directive::AddNameToAbility { index, name });
            }
        }
    }

    // Before moving effects to abilities, so the merged effect moves as a whole
    if let Some(index) = merge_effect {
        if check_index("_mergeEffectIndexWithPrevious", "effect", index, card.effects.len()) {
            info!("Merging effect {} with the previous one", index);
            let effect = card.effects.remove(index);
            card.effects[index - 1].push('\n');
            card.effects[index - 1].push_str(&effect);
            corrections.mark_applied(&Directive::MergeEffectWithPrevious(index));
        }
    }

    if let Some((index, name)) = effect_is_ability {
        if check_index("_effectAtIndexIsAbility", "effect", index, card.effects.len()) {
            let mut effect = card.effects.remove(index);
            if let Some(label) = name.as_deref().filter(|label| !label.is_empty()) {
                if let Some(rest) = effect.strip_prefix(label) {
                    info!("Removing duplicate label {:?} from the start of the effect", label);
                    let mut rest = rest.chars();
                    rest.next();
                    effect = rest.as_str().to_string();
                }
            }
            info!("Moving effect {} to the abilities", index);
            card.abilities.push(AbilityDraft {
                name: name.clone(),
                effect: Some(effect),
                ..AbilityDraft::default()
            });
            corrections.mark_applied(&Directive::EffectIsAbility { index, name });
        }
    }

    if let Some(index) = effect_is_flavor.filter(|&index| {
        check_index("_effectAtIndexIsFlavorText", "effect", index, card.effects.len())
    }) {
        if card.flavor_text.is_some() {
            error!("Can't move effect {} to the flavor text, the card already has flavor text", index);
        } else {
            info!("Moving effect {} to the flavor text", index);
            card.flavor_text = Some(rules.correct_punctuation(&card.effects.remove(index)));
            corrections.mark_applied(&Directive::EffectIsFlavorText(index));
        }
    }

    merge_split_effects(&mut card.effects);
    Ok(layout)
}

/// Keyword text printed below a named ability gets read as part of it.
fn move_keywords_last(card: &mut CardDraft) -> bool {
    let Some(last) = card.abilities.last_mut() else {
        error!("Keywords should move last, but the card has no abilities");
        return false;
    };
    let Some(effect) = last.effect.as_mut() else {
        error!("Keywords should move last, but the last ability has no effect");
        return false;
    };
    let Some(found) = KEYWORD_AT_LINE_START.find(effect) else {
        error!("Keywords should move last, but no keyword was found in {:?}", effect);
        return false;
    };
    debug!("Splitting the last ability at {} to move its keyword last", found.start());
    let keyword = effect[found.start() + 1..].to_string();
    effect.truncate(found.start());
    card.abilities.push(AbilityDraft::keyword(keyword));
    true
}

/// Removes abilities marked for removal or left empty, and splits abilities
/// that corrections gave a blank line.
fn split_abilities(card: &mut CardDraft, corrections: &mut CardCorrections, removals: Option<Vec<usize>>) {
    if let Some(indexes) = &removals {
        for &index in indexes {
            check_index("_removeAbilitiesAtIndexes", "ability", index, card.abilities.len());
        }
    }
    let mut removed_any = false;
    for index in (0..card.abilities.len()).rev() {
        if removals.as_ref().is_some_and(|indexes| indexes.contains(&index)) {
            info!("Removing ability at index {}", index);
            card.abilities.remove(index);
            removed_any = true;
            continue;
        }
        if card.abilities[index].text().is_empty() {
            info!("Removing empty ability at index {}", index);
            card.abilities.remove(index);
            continue;
        }
        loop {
            let text = card.abilities[index].text_mut();
            let Some((first, second)) = text.rsplit_once("\n\n") else {
                break;
            };
            info!("Splitting ability at index {} in two at a blank line", index);
            let second = second.to_string();
            text.truncate(first.len());
            card.abilities.insert(index + 1, AbilityDraft::effect(second));
        }
    }
    if let Some(indexes) = removals.filter(|_| removed_any) {
        corrections.mark_applied(&Directive::RemoveAbilities(indexes));
    }
}

/// Splits effects that corrections gave a blank line; parts that read as
/// keywords move to the front of the abilities.
fn split_effects(card: &mut CardDraft) {
    for index in (0..card.effects.len()).rev() {
        while let Some((first, second)) = card.effects[index].rsplit_once("\n\n") {
            info!("Splitting effect at index {} in two at a blank line", index);
            let (first, second) = (first.to_string(), second.to_string());
            card.effects[index] = first;
            card.effects.insert(index + 1, second);
        }
    }
    for index in (0..card.effects.len()).rev() {
        if is_keyword_text(&card.effects[index]) {
            info!("Effect at index {} is a keyword, moving it to the abilities", index);
            let text = card.effects.remove(index);
            card.abilities.insert(
                0,
                AbilityDraft {
                    effect: Some(text.clone()),
                    full_text: Some(text),
                    kind: Some(AbilityKind::Keyword),
                    name: None,
                },
            );
        }
    }
}

/// Effects never start with a separator or a number; those are the rest of
/// the previous effect's option list.
pub fn merge_split_effects(effects: &mut Vec<String>) {
    for index in (1..effects.len()).rev() {
        let effect = &effects[index];
        if effect.starts_with(SEPARATOR) || effect.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            debug!("Joining effect {} with the previous one", index);
            let effect = effects.remove(index);
            effects[index - 1].push('\n');
            effects[index - 1].push_str(&effect);
        }
    }
}
