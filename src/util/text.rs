use std::collections::HashSet;

/// Returns the value if it contains anything other than whitespace.
///
/// # Examples
///
/// ```
/// use pulse_account::util::non_blank;
///
/// assert_eq!(non_blank(Some("Maya")), Some("Maya"));
/// assert_eq!(non_blank(Some("   ")), None);
/// assert_eq!(non_blank(None), None);
/// ```
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Picks `value` unless it is missing or blank, else clones `fallback`.
pub fn string_or(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

/// Removes repeated entries while keeping the first occurrence's position.
///
/// Used for set-like lists (focus roles, genres) where the backend may send
/// duplicates but consumers expect each tag once.
pub fn dedupe_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Clamps a value into `[min, max]`.
///
/// Returns `None` when the bounds are inverted instead of panicking like
/// [`f64::clamp`]. NaN inputs clamp to `min`.
pub fn clamp(value: f64, min: f64, max: f64) -> Option<f64> {
    if min > max {
        return None;
    }
    if value.is_nan() {
        return Some(min);
    }
    Some(value.max(min).min(max))
}
