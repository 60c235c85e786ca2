//! Display/storage conversion for percent-displayed fields.
//!
//! Two settings are stored as fractions but shown to users as percentages:
//! `risk.correlation_limit` and `engine.min_confidence_threshold`. The UI
//! boundary converts with exactly one multiply/divide pair; `set_field`
//! itself always receives the storage representation. Keeping both
//! directions here is what guards against the off-by-×100 class of bug.

use serde_json::Value;

/// Paths whose stored fraction is displayed as a percentage.
pub const PERCENT_DISPLAYED_PATHS: [&str; 2] =
    ["risk.correlation_limit", "engine.min_confidence_threshold"];

/// Whether `path` is displayed in percent while stored as a fraction.
pub fn is_percent_displayed(path: &str) -> bool {
    PERCENT_DISPLAYED_PATHS.contains(&path)
}

/// Storage → display: fractions become percentages, everything else passes
/// through unchanged.
pub fn to_display(path: &str, storage: f64) -> f64 {
    if is_percent_displayed(path) {
        storage * 100.0
    } else {
        storage
    }
}

/// Display → storage: the inverse of [`to_display`].
pub fn to_storage(path: &str, display: f64) -> f64 {
    if is_percent_displayed(path) {
        display / 100.0
    } else {
        display
    }
}

/// Human-readable rendering of a field value for logs and alerts, applying
/// the display conversion for percent-displayed paths.
pub fn describe(path: &str, value: &Value) -> String {
    match value.as_f64() {
        Some(n) if is_percent_displayed(path) => format!("{}%", to_display(path, n)),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_percent_displayed_fields() {
        assert!(is_percent_displayed("risk.correlation_limit"));
        assert!(is_percent_displayed("engine.min_confidence_threshold"));
        assert!(!is_percent_displayed("risk.stop_loss_percent"));
    }

    #[test]
    fn test_fraction_to_percent_and_back() {
        assert_eq!(to_display("engine.min_confidence_threshold", 0.65), 65.0);
        assert_eq!(to_storage("engine.min_confidence_threshold", 65.0), 0.65);
        assert_eq!(to_display("risk.correlation_limit", 0.7), 70.0);
        assert_eq!(to_storage("risk.correlation_limit", 70.0), 0.7);
    }

    #[test]
    fn test_other_paths_pass_through() {
        assert_eq!(to_display("risk.stop_loss_percent", 3.5), 3.5);
        assert_eq!(to_storage("risk.max_leverage", 10.0), 10.0);
    }

    #[test]
    fn test_describe_formats_display_units() {
        assert_eq!(
            describe("engine.min_confidence_threshold", &json!(0.75)),
            "75%"
        );
        assert_eq!(describe("risk.max_leverage", &json!(10.0)), "10.0");
        assert_eq!(describe("strategies.rsi.enabled", &json!(true)), "true");
    }
}
