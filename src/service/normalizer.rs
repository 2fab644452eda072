//! Canonical keys for identifiers that arrive with inconsistent formatting
//! from the docs batches and the cartola ledger.

use crate::models::MatchKey;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical decomposition with the combining marks dropped: `ş` -> `s`,
/// `Ñ` -> `N`.
fn fold_chars(raw: &str) -> impl Iterator<Item = char> + '_ {
    raw.nfd().filter(|c| !is_combining_mark(*c))
}

/// Normalize one identifier component.
///
/// Trims, folds accents, drops every non-alphanumeric character, strips
/// leading zeros and upper-cases. Returns `None` when nothing is left.
pub fn normalize_component(raw: &str) -> Option<String> {
    let cleaned: String = fold_chars(raw.trim())
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let stripped = cleaned.trim_start_matches('0');
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_ascii_uppercase())
    }
}

/// Build the join key from raw document and operation numbers.
/// `None` means the pair is unmatchable.
pub fn match_key(doc: Option<&str>, operation: Option<&str>) -> Option<MatchKey> {
    let doc = normalize_component(doc?)?;
    let operation = normalize_component(operation?)?;
    Some(MatchKey { doc, operation })
}

/// Canonical form of a RUT: `76.107.905-0`, `76107905-0` and `761079050`
/// all map to `761079050`; the verifier `k` is upper-cased.
pub fn rut_key(raw: &str) -> String {
    normalize_component(raw).unwrap_or_default()
}

/// Upper-case ASCII words separated by single spaces, for name and field
/// key matching. Anything that does not fold to an ASCII letter or digit is
/// a separator.
pub fn fold_text(raw: &str) -> String {
    fold_chars(raw)
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
