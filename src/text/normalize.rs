//! Diacritic stripping for accent-insensitive comparison
//!
//! The output is only ever used as a comparison key. Rendered text always
//! comes from the original string.

use unicode_normalization::UnicodeNormalization;

/// Remove diacritical marks, keeping base letters and every other character.
///
/// - "Câmara" → "Camara"
/// - "educação" → "educacao"
/// - "São Paulo" → "Sao Paulo"
///
/// Case and whitespace are left alone; callers match case-insensitively.
#[must_use]
pub fn strip_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_stripped(c, &mut out);
    }
    out
}

/// Append the stripped form of a single character to `out`.
///
/// Returns the number of characters appended. This is usually 1, 0 for a
/// bare combining mark, and more than 1 for the rare canonical decompositions
/// into several base characters (Hangul syllables, for instance).
pub fn push_stripped(c: char, out: &mut String) -> usize {
    if c.is_ascii() {
        out.push(c);
        return 1;
    }
    let mut pushed = 0;
    for decomposed in std::iter::once(c).nfd() {
        if !is_diacritic(decomposed) {
            out.push(decomposed);
            pushed += 1;
        }
    }
    pushed
}

/// Check if a character is a combining diacritical mark.
///
/// Only the Latin-oriented combining blocks are removed. Combining marks that
/// carry meaning in other scripts (Devanagari vowel signs, for example) stay.
#[must_use]
pub fn is_diacritic(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}' |  // Combining Diacritical Marks
        '\u{1AB0}'..='\u{1AFF}' |  // Combining Diacritical Marks Extended
        '\u{1DC0}'..='\u{1DFF}' |  // Combining Diacritical Marks Supplement
        '\u{20D0}'..='\u{20FF}' |  // Combining Diacritical Marks for Symbols
        '\u{FE20}'..='\u{FE2F}'    // Combining Half Marks
    )
}
