//! Normalized edit-distance similarity between two strings.

/// Similarity in `[0, 1]` between `a` and `b`.
///
/// Computed as `1 - levenshtein(a, b) / max(len(a), len(b))` over the
/// case-folded inputs, with lengths counted in characters. Two empty strings
/// are identical and score `1.0`.
///
/// # Examples
///
/// ```
/// use risa::similarity::similarity;
///
/// assert_eq!(similarity("Chrome", "chrome"), 1.0);
/// assert!(similarity("chroem", "chrome") > 0.5);
/// assert_eq!(similarity("", ""), 1.0);
/// ```
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}
