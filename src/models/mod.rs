//! Models module for the SDK
//!
//! Defines the canonical feature-type structures produced by every extractor
//! and consumed by every renderer. Instances are built once per conversion
//! run and treated as read-only afterwards.

pub mod attribute;
pub mod feature_type;

pub use attribute::{Attribute, ListedValue, ValueDomain};
pub use feature_type::{Association, FeatureType, Geometry, Relationships};

/// Format a multiplicity as the canonical `min..max` string.
///
/// Empty bounds default to `0` and `1`; the upper bound spellings `-1`, `*`
/// and `n` all mean unbounded and render as `*`. Equal bounds collapse to the
/// single value (`"1"` rather than `"1..1"`).
pub fn format_cardinality(lower: &str, upper: &str) -> String {
    let mut lower_value = lower.trim();
    let mut upper_value = upper.trim();

    if lower_value.is_empty() {
        lower_value = "0";
    }
    if upper_value.is_empty() {
        upper_value = "1";
    }
    if matches!(upper_value, "-1" | "*" | "n") {
        upper_value = "*";
    }

    if lower_value == upper_value {
        lower_value.to_string()
    } else {
        format!("{}..{}", lower_value, upper_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cardinality_defaults() {
        assert_eq!(format_cardinality("", ""), "0..1");
        assert_eq!(format_cardinality("1", ""), "1");
        assert_eq!(format_cardinality("", "*"), "0..*");
    }

    #[test]
    fn test_format_cardinality_unbounded_aliases() {
        assert_eq!(format_cardinality("0", "-1"), "0..*");
        assert_eq!(format_cardinality("1", "n"), "1..*");
        assert_eq!(format_cardinality("0", "*"), "0..*");
    }

    #[test]
    fn test_format_cardinality_collapses_equal_bounds() {
        assert_eq!(format_cardinality("1", "1"), "1");
        assert_eq!(format_cardinality("2", "2"), "2");
    }

    #[test]
    fn test_format_cardinality_keeps_bounded_upper() {
        assert_eq!(format_cardinality("0", "3"), "0..3");
    }
}
