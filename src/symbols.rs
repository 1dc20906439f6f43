//! Glyphs printed on cards that have no plain-text equivalent.
//!
//! The recognizer has no training for these, so it reports them as digits,
//! punctuation or stray letters. Correction rules restore them.

pub const EXERT: char = '⟳';
pub const INK: char = '⬡';
pub const LORE: char = '◊';
pub const STRENGTH: char = '¤';
pub const WILLPOWER: char = '⛉';
pub const INKWELL: char = '◉';
pub const SEPARATOR: char = '•';

/// Every game glyph. None of them can appear in an ability name.
pub const GLYPHS: [char; 6] = [EXERT, INK, LORE, STRENGTH, WILLPOWER, INKWELL];

/// Separator with its surrounding spaces, as used between subtypes and in identifiers.
pub const SEPARATOR_STRING: &str = " • ";
