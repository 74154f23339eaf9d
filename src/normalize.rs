//! Text canonicalization used for every area comparison.
//!
//! [`normalize_text()`] produces the comparison key stored in the derived
//! `area_norm` column and applied to every requested area, so both sides of a
//! match go through the exact same pipeline. [`normalize_column_name()`] turns
//! raw header labels into the snake-cased names the column resolver expects.

use std::{borrow::Cow, sync::OnceLock};

use itertools::Itertools;
use regex::Regex;

/// Zero-width space plus a stray byte-order mark. Joiners (U+200C/U+200D) are
/// kept: they change the spelling of Indic locality names.
const ZERO_WIDTH: &[char] = &['\u{200b}', '\u{feff}'];

/// Canonical comparison form: zero-width characters removed, whitespace trimmed
/// and collapsed to single spaces, lowercased.
///
/// Zero-width characters are stripped first so that a sequence such as
/// `"a \u{200b} b"` collapses in one pass, which keeps the function idempotent.
pub fn normalize_text(input: &str) -> String {
    let visible = strip_zero_width(input);
    visible.split_whitespace().join(" ").to_lowercase()
}

/// Null-aware variant; missing input normalizes to the empty string.
pub fn normalize_optional(input: Option<&str>) -> String {
    input.map(normalize_text).unwrap_or_default()
}

fn strip_zero_width(input: &str) -> Cow<'_, str> {
    if input.contains(ZERO_WIDTH) {
        Cow::Owned(input.chars().filter(|ch| !ZERO_WIDTH.contains(ch)).collect())
    } else {
        Cow::Borrowed(input)
    }
}

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"[^\w_]").expect("static pattern compiles"))
}

/// Snake-cases a raw header: trimmed, lowercased, spaces and hyphens turned
/// into underscores, any remaining non-word characters dropped.
pub fn normalize_column_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace([' ', '-'], "_");
    non_word().replace_all(&lowered, "").into_owned()
}
