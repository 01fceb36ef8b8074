//! Edit distance.

/// Levenshtein distance between `a` and `b`, counted in chars.
///
/// Case-sensitive; insertions, deletions and substitutions all cost 1.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Whether `a` and `b` are within 30% of the longer string's length.
#[must_use]
pub fn is_fuzzy_match(a: &str, b: &str) -> bool {
    let longest = a.chars().count().max(b.chars().count());
    levenshtein(a, b) * 10 <= longest * 3
}
