//! CLI configuration from environment.

use dispatch_core::PlannerRules;
use std::env;

pub const DEFAULT_LOG_FILTER: &str = "dispatch=info";

/// Corridor margin as given on the command line or in the environment.
///
/// `off` disables the search corridor; anything else must be a
/// non-negative number of degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorridorMargin(pub Option<f64>);

impl std::str::FromStr for CorridorMargin {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("off") {
            return Ok(CorridorMargin(None));
        }
        match raw.parse::<f64>() {
            Ok(margin) if margin.is_finite() && margin >= 0.0 => Ok(CorridorMargin(Some(margin))),
            _ => Err(format!("expected `off` or a non-negative number, got {raw:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub max_expansions: usize,
    pub corridor_margin: Option<f64>,
    pub log_filter: String,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = PlannerRules::default();
        Self {
            max_expansions: lookup("DISPATCH_MAX_EXPANSIONS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.max_expansions),
            corridor_margin: lookup("DISPATCH_CORRIDOR_MARGIN")
                .and_then(|s| s.parse::<CorridorMargin>().ok())
                .map(|margin| margin.0)
                .unwrap_or(defaults.corridor_margin),
            log_filter: lookup("DISPATCH_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_json: lookup("DISPATCH_LOG_FORMAT")
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        max_expansions: Option<usize>,
        corridor_margin: Option<CorridorMargin>,
    ) -> Self {
        if let Some(max_expansions) = max_expansions {
            self.max_expansions = max_expansions;
        }
        if let Some(CorridorMargin(margin)) = corridor_margin {
            self.corridor_margin = margin;
        }
        self
    }

    pub fn rules(&self) -> PlannerRules {
        PlannerRules::default()
            .with_max_expansions(self.max_expansions)
            .with_corridor_margin(self.corridor_margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.max_expansions, 1_000_000);
        assert_eq!(config.corridor_margin, Some(0.01));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(!config.log_json);
    }

    #[test]
    fn environment_values_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("DISPATCH_MAX_EXPANSIONS", "5000"),
            ("DISPATCH_CORRIDOR_MARGIN", "off"),
            ("DISPATCH_LOG", "dispatch_core=trace"),
            ("DISPATCH_LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.max_expansions, 5000);
        assert_eq!(config.corridor_margin, None);
        assert_eq!(config.log_filter, "dispatch_core=trace");
        assert!(config.log_json);
    }

    #[test]
    fn bad_environment_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("DISPATCH_MAX_EXPANSIONS", "lots"),
            ("DISPATCH_CORRIDOR_MARGIN", "-1"),
        ]));
        assert_eq!(config.max_expansions, 1_000_000);
        assert_eq!(config.corridor_margin, Some(0.01));
    }

    #[test]
    fn flags_override_environment() {
        let config = Config::from_lookup(lookup(&[("DISPATCH_MAX_EXPANSIONS", "5000")]))
            .with_overrides(Some(42), Some(CorridorMargin(Some(0.05))));
        let rules = config.rules();
        assert_eq!(rules.max_expansions, 42);
        assert_eq!(rules.corridor_margin, Some(0.05));
        assert_eq!(rules.unit_length, dispatch_core::UNIT_LENGTH);
    }

    #[test]
    fn corridor_margin_parses_off_and_numbers() {
        assert_eq!("OFF".parse::<CorridorMargin>(), Ok(CorridorMargin(None)));
        assert_eq!("0.02".parse::<CorridorMargin>(), Ok(CorridorMargin(Some(0.02))));
        assert!("wide".parse::<CorridorMargin>().is_err());
    }
}
