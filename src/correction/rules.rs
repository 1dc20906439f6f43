//! Ordered find/replace rules that undo common misrecognitions.
//!
//! Card text is full of glyphs Tesseract doesn't know (ink, exert, lore,
//! strength, willpower) and of typography it gets slightly wrong. Each rule
//! fixes one such mistake. A rule set is built per language and passed to
//! whoever needs it; it's shared between workers, so hit counters are atomic.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use super::CorrectionError;
use crate::language::Language;
use crate::symbols::{EXERT, INK, LORE, STRENGTH, WILLPOWER};

/// Passes over the rule list before giving up on reaching a fixed point.
const MAX_PASSES: usize = 6;

pub enum Replacement {
    /// Replacement template, `${1}` style.
    Template(String),
    Function(fn(&Captures) -> String),
}

pub struct CorrectionRule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
    hits: AtomicUsize,
}

impl CorrectionRule {
    pub fn new(name: &'static str, pattern: &str, replacement: impl Into<String>) -> Result<Self, CorrectionError> {
        Self::build(name, pattern, Replacement::Template(replacement.into()))
    }

    pub fn with_fn(name: &'static str, pattern: &str, replacement: fn(&Captures) -> String) -> Result<Self, CorrectionError> {
        Self::build(name, pattern, Replacement::Function(replacement))
    }

    fn build(name: &'static str, pattern: &str, replacement: Replacement) -> Result<Self, CorrectionError> {
        let pattern = Regex::new(pattern).map_err(|source| CorrectionError::InvalidRule { name, source })?;
        Ok(Self {
            name,
            pattern,
            replacement,
            hits: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Applies the rule once. Only an actual change counts as a hit.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let result = match &self.replacement {
            Replacement::Template(template) => self.pattern.replace_all(text, template.as_str()),
            Replacement::Function(f) => self.pattern.replace_all(text, |caps: &Captures| f(caps)),
        };
        if let Cow::Owned(ref changed) = result {
            if changed == text {
                return Cow::Borrowed(text);
            }
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

/// All correction rules for one language, in application order.
pub struct CorrectionRuleSet {
    language: Language,
    text_rules: Vec<CorrectionRule>,
    punctuation_rules: Vec<CorrectionRule>,
}

impl CorrectionRuleSet {
    pub fn for_language(language: Language) -> Result<Self, CorrectionError> {
        let mut text_rules = generic_text_rules(language)?;
        text_rules.extend(match language {
            Language::English => english_text_rules()?,
            Language::French => french_text_rules()?,
            Language::German => german_text_rules()?,
            Language::Italian => italian_text_rules()?,
        });
        if language != Language::French {
            text_rules.push(CorrectionRule::new(
                "long_dash",
                &format!(r"(?m)(^|[^\w{LORE}{STRENGTH}])[-—~]+(\D|$)"),
                "${1}—${2}",
            )?);
        }

        Ok(Self {
            language,
            text_rules,
            punctuation_rules: punctuation_rules(language)?,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Fixes recognized card text. Applying it to its own output changes nothing.
    pub fn correct(&self, text: &str) -> String {
        let corrected = run_to_fixed_point(&self.text_rules, text, |t| collapse_blank_lines(t.trim()));
        if corrected != text {
            info!("Corrected card text from {:?} to {:?}", text, corrected);
        }
        corrected
    }

    /// Fixes punctuation: contractions, ellipses, quote marks. Mostly for flavor text.
    pub fn correct_punctuation(&self, text: &str) -> String {
        let corrected = run_to_fixed_point(&self.punctuation_rules, text, |t| t.trim().to_string());
        if corrected != text {
            info!("Corrected punctuation from {:?} to {:?}", text, corrected);
        }
        corrected
    }

    pub fn rules(&self) -> impl Iterator<Item = &CorrectionRule> {
        self.text_rules.iter().chain(&self.punctuation_rules)
    }

    /// (rule name, hits), most-used first.
    pub fn hit_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<_> = self.rules().map(|rule| (rule.name(), rule.hits())).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        counts
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for line in text.split('\n') {
        if !result.is_empty() && !line.is_empty() {
            result.push('\n');
        }
        result.push_str(line);
    }
    result
}

/// Rules can leave a trailing space or an empty line behind, so `normalize`
/// runs after every pass and the loop only stops on normalized text.
fn run_to_fixed_point(rules: &[CorrectionRule], text: &str, normalize: impl Fn(&str) -> String) -> String {
    let mut current = normalize(text);
    for pass in 0..MAX_PASSES {
        let mut next = current.clone();
        for rule in rules {
            let changed = match rule.apply(&next) {
                Cow::Owned(changed) => changed,
                Cow::Borrowed(_) => continue,
            };
            debug!("Rule '{}' changed {:?} to {:?}", rule.name(), next, changed);
            next = changed;
        }
        let next = normalize(&next);
        if next == current {
            return current;
        }
        if pass + 1 == MAX_PASSES {
            warn!("Text corrections didn't settle after {} passes, last result {:?}", MAX_PASSES, next);
        }
        current = next;
    }
    current
}

fn capitalize_match(caps: &Captures) -> String {
    caps[0].to_uppercase()
}

fn generic_text_rules(language: Language) -> Result<Vec<CorrectionRule>, CorrectionError> {
    let shift = language.shift_keyword();
    Ok(vec![
        CorrectionRule::new("comma_space", r"(?m),([^ ’”\n])", ", ${1}")?,
        CorrectionRule::new("exert_read_as_six", r"^(?:G?6|fà)? ?,", format!("{EXERT},"))?,
        CorrectionRule::new(
            "ink_before_dash",
            r"(?m)(^| )(\d) ?[0OÒQ©]{0,2}( ?[-—]|,)",
            format!("${{1}}${{2}} {INK}${{3}}"),
        )?,
        CorrectionRule::new("period_before_closing_quote", r"([^.,'!?’])”(\z|[^, ]| \W| \z)", "${1}.”${2}")?,
        CorrectionRule::new("space_after_bracket", r"\( ", "(")?,
        CorrectionRule::new("splotch_after_quote", r"(?m)([”’)])\s.$", "${1}")?,
        CorrectionRule::new(
            "exert_read_as_at",
            r#"(?m)(^|^["“„ ]|[^0-9s]["“„ ])[(@Gg©€]{1,3}[89]?([ ,])"#,
            format!("${{1}}{EXERT}${{2}}"),
        )?,
        CorrectionRule::new("exert_before_dash", r"^(?:[(&f]+[Àà]?)? ?[-—](\s)", format!("{EXERT} —${{1}}"))?,
        CorrectionRule::new("bullet_list", r"(?m)^[-+*«»¢.,‚]{1,2}( \w{2,} \w)", "•${1}")?,
        CorrectionRule::new("lore_read_as_a_grave", r"(\d )À\b", format!("${{1}}{LORE}"))?,
        CorrectionRule::new(
            "strength_from_symbols",
            r"(^|[^\d])[ÇX]?[&@©%$*<>{}€£¥Ÿ]{1,2}[0-9yFÌX+*%#“»]*",
            format!("${{1}}{STRENGTH}"),
        )?,
        CorrectionRule::new("strength_from_letters", r"(\d )[CÇDIQX]{1,2}\b", format!("${{1}}{STRENGTH}"))?,
        CorrectionRule::new("period_before_bracket", &format!(r"([^.,'!?’{STRENGTH}])\)"), "${1}.)")?,
        CorrectionRule::new("trailing_junk", r"(?m) [‘;]$", "")?,
        CorrectionRule::new("lore_read_as_four", r"(\d) ?[4è]([ \n.])", format!("${{1}} {LORE}${{2}}"))?,
        CorrectionRule::new("missing_strength_plus", r"(?m)^\+(\d)(\.\)?)$", format!("+${{1}} {STRENGTH}${{2}}"))?,
        CorrectionRule::new("strength_read_as_zero", r"(?m)^([-+]\d)0(\.\)?)$", format!("${{1}} {STRENGTH}${{2}}"))?,
        CorrectionRule::new("seven_read_as_slash", " / ", " 7 ")?,
        CorrectionRule::new("space_after_ink", &format!("{INK}([-—])"), format!("{INK} ${{1}}"))?,
        CorrectionRule::new(
            "negative_strength",
            &format!(r"(?m)( )(-\d)(?: [^{STRENGTH}{LORE}a-z .]{{1,2}})?( \w|$)"),
            format!("${{1}}${{2}} {STRENGTH}${{3}}"),
        )?,
        CorrectionRule::new("two_numbers", r"(\d) [0-9DGOQ]{1,2}[%{}°]?(\W)", format!("${{1}} {STRENGTH}${{2}}"))?,
        CorrectionRule::with_fn("capital_after_quote", r"(?m)^“[a-z]", capitalize_match)?,
        CorrectionRule::new("trailing_single_character", r"(\S{2}) [^?!.…”“0-9\n]\z", "${1}")?,
        CorrectionRule::new("te_ka", r"\b(Te[ -]K)a\b", "${1}ā")?,
        CorrectionRule::new(
            "drip_above_shift",
            &format!(r"^[^\n]{{0,15}}\n((?:[A-Z]\w+[ -])?{shift})"),
            "${1}",
        )?,
        CorrectionRule::new("shift_ink", &format!(r"^({shift} \d) ?[OÒ{STRENGTH}]"), format!("${{1}} {INK}"))?,
    ])
}

fn english_text_rules() -> Result<Vec<CorrectionRule>, CorrectionError> {
    Ok(vec![
        CorrectionRule::new("en_opening_quote", "(?m)^‘", "“")?,
        CorrectionRule::new("en_bodyguard", "Bodyqg?uard", "Bodyguard")?,
        CorrectionRule::new("en_minus_pipe", r"-\|", "-1")?,
        CorrectionRule::new("en_pipe", r"\|", "I")?,
        CorrectionRule::new("en_quoted_i", r"“[LT\[]([ '’])", "“I${1}")?,
        CorrectionRule::new("en_dash_l", "—l", "—I")?,
        CorrectionRule::new("en_exclamation_as_l", r"(\w)!(,? ?[a-z])", "${1}l${2}")?,
        CorrectionRule::new("en_exclamation_as_i", r"^(“)?! ", "${1}I ")?,
        CorrectionRule::new("en_contracted_i", r"(?m)(^| |“)[lIL!]([dlmM]l?)\b", "${1}I'${2}")?,
        CorrectionRule::new("en_leading_l", "^l", "I")?,
        CorrectionRule::new(
            "en_plural_possessive",
            r"(?m)\b(teammates|players|opponents|Illumineers)’(\s|$)",
            "${1}'${2}",
        )?,
        CorrectionRule::new("en_pay_to", r"\b(pay\s)(\d)0? .?to\b", format!("${{1}}${{2}} {INK} to"))?,
        CorrectionRule::new("en_pay_less", &format!(r"pay(\s)(\d) [^{INK}] less"), format!("pay${{1}}${{2}} {INK} less"))?,
        CorrectionRule::new("en_pay_less_zero", r"\b(pay\s)(\d+)O?(\sless)\b", format!("${{1}}${{2}} {INK}${{3}}"))?,
        CorrectionRule::new("en_exert_and_pay", r"^\(20 ", format!("{EXERT}, 2 {INK} "))?,
        CorrectionRule::new("en_location_lore", r"location's \.", format!("location's {LORE}."))?,
        CorrectionRule::new("en_challenger", r"(?m)\(They get \+(\d)$", format!("(They get +${{1}} {STRENGTH}"))?,
        CorrectionRule::new("en_shift_to", &format!(r"pay (\d+) {INK} play this"), format!("pay ${{1}} {INK} to play this"))?,
        CorrectionRule::new(
            "en_song_exert",
            &format!(r"(can|may)(?: [^{EXERT}]{{1,2}})?(\sto sing this)"),
            format!("${{1}} {EXERT}${{2}}"),
        )?,
        CorrectionRule::new(
            "en_support_first_line",
            &format!(r"(?m)(^|\badd )their [^{STRENGTH}]{{1,2}} to"),
            format!("${{1}}their {STRENGTH} to"),
        )?,
        CorrectionRule::new(
            "en_support_second_line",
            &format!(r"(?m)^(?:[^{STRENGTH}of+]{{1,2}} )?this turn\.?\)$"),
            format!("{STRENGTH} this turn.)"),
        )?,
        CorrectionRule::new(
            "en_support_strength",
            &format!(r"chosen character's(?: [^{LORE}{STRENGTH}])? this turn"),
            format!("chosen character's {STRENGTH} this turn"),
        )?,
        CorrectionRule::new("en_illuminary", r"\bluminary\b", "Illuminary")?,
        CorrectionRule::new("en_illu", "I/lu", "Illu")?,
        CorrectionRule::new("en_draw_a_card", r"([Dd])rawa ?card", "${1}raw a card")?,
        CorrectionRule::new("en_it", r"\bLt\b", "It")?,
        CorrectionRule::new("en_hed", r"\b([Hh])ed\b", "${1}e'd")?,
        CorrectionRule::new("en_in_a", r"\bina\b", "in a")?,
        CorrectionRule::new("en_a_card", r"\bacard\b", "a card")?,
    ])
}

fn french_text_rules() -> Result<Vec<CorrectionRule>, CorrectionError> {
    Ok(vec![
        CorrectionRule::new(
            "fr_payment",
            &format!(r"\bpa(yer|ie) (\d+) (?:\W|D|O|Ô|Q|{STRENGTH})"),
            format!("pa${{1}} ${{2}} {INK}"),
        )?,
        CorrectionRule::new(
            "fr_discount",
            &format!(r"(?m)^(\d) ?[{STRENGTH}O0](\s)(pour|de moins)\b"),
            format!("${{1}} {INK}${{2}}${{3}}"),
        )?,
        CorrectionRule::new("fr_support_singular", r"(ajouter sa )\W+( à celle)", format!("${{1}}{STRENGTH}${{2}}"))?,
        CorrectionRule::new(
            "fr_support_plural",
            &format!(r"(ajouter leur )[^{STRENGTH}]( à celle)"),
            format!("${{1}}{STRENGTH}${{2}}"),
        )?,
        CorrectionRule::new("fr_challenger", r"gagne \+(\d+) \.\)", format!("gagne +${{1}} {STRENGTH}.)"))?,
        CorrectionRule::new("fr_cost_zero", r"coûte (\d)0 de moins", format!("coûte ${{1}} {INK} de moins"))?,
        CorrectionRule::new(
            "fr_cost",
            &format!(r"(coûte(?:nt)? )(\d+) [^{INK} \nou]+"),
            format!("${{1}}${{2}} {INK}"),
        )?,
        CorrectionRule::new("fr_ellipsis", r"…?\.{2,}…?", "…")?,
        CorrectionRule::new("fr_ellipsis_before_lowercase", r"\.+ ([a-z])", "… ${1}")?,
        CorrectionRule::new("fr_opening_quote", "(?m)^‘", "“")?,
        CorrectionRule::new("fr_il", r"(^|[^A-Z])[I|/!\[][!|/]", "${1}Il")?,
        CorrectionRule::new("fr_illumin", r"(^|\s|')[/\[I]+l+umin(arium|eur)", "${1}Illumin${2}")?,
        CorrectionRule::new("fr_space_before_exclamation", r"([^? ])!", "${1} !")?,
        CorrectionRule::new("fr_space_after_exclamation", r"!(\w)", "! ${1}")?,
        CorrectionRule::new(
            "fr_gains_strength",
            &format!(r"((?:\bce personnage|\bil) gagne )\+(\d) [^{LORE}{STRENGTH}{WILLPOWER}]?\."),
            format!("${{1}}+${{2}} {STRENGTH}."),
        )?,
        CorrectionRule::new("fr_challenger_second_line", r"(?m)^\+(\d) ?[^.]{0,2}\.\)$", format!("+${{1}} {STRENGTH}.)"))?,
        CorrectionRule::new("fr_one_damage", r"\b[l|] dommage", "1 dommage")?,
        CorrectionRule::new("fr_il_y", "Ily", "Il y")?,
        CorrectionRule::new("fr_ca", r"\bCa\b", "Ça")?,
        CorrectionRule::new("fr_personnage", "personhage", "personnage")?,
    ])
}

fn german_text_rules() -> Result<Vec<CorrectionRule>, CorrectionError> {
    Ok(vec![
        CorrectionRule::new("de_leading_exert", r"^ ?[-–—]+", format!("{EXERT} —"))?,
        CorrectionRule::new("de_diesen", r"diese[nh] ?.\n", "diesen\n")?,
        CorrectionRule::new(
            "de_payment",
            &format!(r"(\d)[ .]?(?:\W|0|D|O|Ô|Q|{STRENGTH}){{0,2}} (mehr )?(be)?zahl(en|t)\b"),
            format!("${{1}} {INK} ${{2}}${{3}}zahl${{4}}"),
        )?,
        CorrectionRule::new(
            "de_zahlst",
            &format!(r"(?m)zahlst(\sdu)?(\s)(\d) ?[0{STRENGTH}©]?($| [^{INK}])"),
            format!("zahlst${{1}}${{2}}${{3}} {INK}${{4}}"),
        )?,
        CorrectionRule::new(
            "de_challenger",
            r"herausfordert, erhält er \+(\d+) \S+\.\)",
            format!("herausfordert, erhält er +${{1}} {STRENGTH}.)"),
        )?,
        CorrectionRule::new(
            "de_support",
            r"(seine|ihre)(\s)(?:\S{1,2} )?in diesem Zug zur(\s)\S{1,2}",
            format!("${{1}}${{2}}{STRENGTH} in diesem Zug zur${{3}}{STRENGTH}"),
        )?,
        CorrectionRule::new(
            "de_song_exert",
            &format!(r"(oder mehr kostet, )[^{EXERT}](, damit)"),
            format!("${{1}}{EXERT}${{2}}"),
        )?,
        CorrectionRule::new("de_lore_read_as_plus", r"(\d+) \+", format!("${{1}} {LORE}"))?,
        CorrectionRule::new("de_exert_read_as_letters", r"^[CG][A-Z0]?( )", format!("{EXERT}${{1}}"))?,
        CorrectionRule::new(
            "de_strength_has",
            &format!(r"oder mehr [^{LORE}{STRENGTH}{WILLPOWER}] hat"),
            format!("oder mehr {STRENGTH} hat"),
        )?,
        CorrectionRule::new("de_dotless_i", "ı", "i")?,
        CorrectionRule::new("de_final_comma", ",$", ".")?,
        CorrectionRule::new("de_trailing_period_junk", r"(^|[^.])\. [.|]$", "${1}.")?,
        CorrectionRule::new("de_double_dash", "—-", "—")?,
        CorrectionRule::new("de_en_dash", r"(\s)[-—](\s[a-z])", "${1}–${2}")?,
        CorrectionRule::new("de_auch_du", r"\(auch du\.\)", "(auch du)")?,
        CorrectionRule::new("de_double_quote_mark", "[’‘']{2,}", "'")?,
    ])
}

fn italian_text_rules() -> Result<Vec<CorrectionRule>, CorrectionError> {
    Ok(vec![
        CorrectionRule::new("it_pipe", r"\|", "I")?,
        CorrectionRule::new("it_payment", r"(paga(?:re)? \d) (in|per)", format!("${{1}} {INK} ${{2}}"))?,
        CorrectionRule::new(
            "it_payment_symbol",
            &format!(r"(\b[Pp]ag(?:a(?:re)?|hi)\s\d )[^{INK} .]+"),
            format!("${{1}}{INK}"),
        )?,
        CorrectionRule::new("it_payment_zero", r"(\b[Pp]aga(?:re)?\s\d)[0Q]", format!("${{1}} {INK}"))?,
        CorrectionRule::new(
            "it_support",
            r"(aggiungere\sla\ssua\s)\S+(\salla\s)\S+(\sdi\sun)",
            format!("${{1}}{STRENGTH}${{2}}{STRENGTH}${{3}}"),
        )?,
        CorrectionRule::new(
            "it_support_second_line",
            &format!(r"(puoi aggiungere la sua )(?:. )?alla(\n[^{STRENGTH}])"),
            format!("${{1}}{STRENGTH} alla {STRENGTH}${{2}}"),
        )?,
        CorrectionRule::new("it_evasive", r"^S.fuggente\b", "Sfuggente")?,
        CorrectionRule::new("it_cost_or", r"(con costo \d)0( [^o])", "${1} o${2}")?,
        CorrectionRule::new(
            "it_song_exert",
            r"(\d\so superiore può ).( per\scantare questa canzone gratis)",
            format!("${{1}}{EXERT}${{2}}"),
        )?,
        CorrectionRule::new("it_gains_strength", r"(Riceve \+\d)\n", format!("${{1}} {STRENGTH}\n"))?,
        CorrectionRule::new("it_double_x", "XX", STRENGTH)?,
        CorrectionRule::new("it_percent", r"\d?%", format!(" {STRENGTH}"))?,
        CorrectionRule::new("it_strength_bracket", &format!(r"{STRENGTH}\)"), STRENGTH)?,
        CorrectionRule::new("it_exert_bracket", r"\(uno", format!("{EXERT} uno"))?,
        CorrectionRule::new("it_iena", r"\blena", "Iena")?,
        CorrectionRule::new("it_volta", r"(ogni\n)V(olta)", "${1}v${2}")?,
        CorrectionRule::new("it_o_piu", r"(\suna\s)0(\spiù\s)", "${1}o${2}")?,
        CorrectionRule::new("it_il", r"[1!][!/l]", "Il")?,
        CorrectionRule::new("it_li", "Îì", "lì")?,
        CorrectionRule::new("it_ce", r"\bcè\b", "c'è")?,
        CorrectionRule::new("it_sfidarli", r"\bsfidatr?li\b", "sfidarli")?,
        CorrectionRule::new("it_leading_i", r"^i I", "I")?,
        CorrectionRule::new("it_leading_l", "^l'", "L'")?,
        CorrectionRule::new("it_io", r"(^|\. )lo", "${1}Io")?,
        CorrectionRule::new("it_cost_lower", r"(costo \d)0(\sinferiore)", "${1} o${2}")?,
        CorrectionRule::new("it_illumi", "Ilumi", "Illumi")?,
    ])
}

fn punctuation_rules(language: Language) -> Result<Vec<CorrectionRule>, CorrectionError> {
    let ellipsis = if language == Language::English { "..." } else { "…" };
    let mut rules = vec![
        CorrectionRule::new("contraction_quote", r"(\w)['‘’]+(\w)", "${1}'${2}")?,
        CorrectionRule::new("attribution_dash", r"\n([A-Z]\w+)$", "\n—${1}")?,
        CorrectionRule::new("spaced_ellipsis", r"(?:[\x{a0} ]?\.[\x{a0} ]?){3}", ellipsis)?,
        CorrectionRule::new("ellipsis_periods", r"\.*…(?: ?\.+)?", "…")?,
        CorrectionRule::new("non_breaking_space", r"\x{a0}", " ")?,
        CorrectionRule::new("leading_single_quote", "^‘", "“")?,
        CorrectionRule::new("trailing_comma", ",$", ".")?,
    ];

    rules.extend(match language {
        Language::English => vec![
            CorrectionRule::new("en_contraction", r"\b([Tt]hey|[Yy]ou)(ll|re)\b", "${1}'${2}")?,
            CorrectionRule::new(
                "en_shortening_start",
                r"(?i)(\s)[‘’]((?:cause|em|til)(?:[,.?!]|\s|$))",
                "${1}'${2}",
            )?,
            CorrectionRule::new("en_shortening_in", r"(?i)(\win)[‘’]([,.?!]|\s|$)", "${1}'${2}")?,
            CorrectionRule::new("en_shortening_ol", r"(?i)(\sol)[‘’](\s|$)", "${1}'${2}")?,
        ],
        Language::German => vec![
            CorrectionRule::new("de_space_before_ellipsis", r"(\w)…", "${1} …")?,
            CorrectionRule::new("de_space_after_ellipsis", r"…(\w)", "… ${1}")?,
            CorrectionRule::new("de_closing_quote", "”", "“")?,
            CorrectionRule::new(
                "de_elision",
                r"(?i)((?:^|\s)h(?:ab|ätt|ör))[‘’](\s|$)",
                "${1}'${2}",
            )?,
            CorrectionRule::new("de_elision_nen", r"(\s)[‘’](ne[nm]?\s)", "${1}'${2}")?,
        ],
        Language::Italian => vec![
            CorrectionRule::new("it_space_after_ellipsis", r"…(\w)", "… ${1}")?,
            CorrectionRule::new("it_attribution_space", r"(”\s—) ([A-Z])", "${1}${2}")?,
            CorrectionRule::new("it_exclamation", r" ?\.””", "!”")?,
            CorrectionRule::new("it_po", r"(\spo)’(\.|\s)", "${1}'${2}")?,
        ],
        Language::French => Vec::new(),
    });

    rules.extend([
        CorrectionRule::new("trailing_dashes", r"[ \-_]+$", "")?,
        CorrectionRule::new("double_opening_quote", "““", "“")?,
        CorrectionRule::new("straight_opening_quote", "^\"", "“")?,
    ]);
    Ok(rules)
}
