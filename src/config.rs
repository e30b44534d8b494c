//! Engine limits and weights, read from `FLUORITE_*` environment variables.
//!
//! Every knob has a default and invalid values fall back silently (with a
//! warning) rather than failing the call: configuration is advisory, the
//! caps it feeds are what actually bound work.
use std::env;
use std::str::FromStr;

pub const DEFAULT_LIST_LIMIT: usize = 200;
pub const DEFAULT_GENERATED_LIMIT: usize = 1000;
pub const DEFAULT_METADATA_MULTIPLIER: usize = 4;
pub const DEFAULT_AUTO_BATCH: usize = 40;
pub const DEFAULT_AUTO_TOP: usize = 5;
pub const DEFAULT_AUTO_THRESHOLD: f64 = 0.6;
pub const DEFAULT_ALIAS_BOOST: f64 = 1.5;

/// Limits and weights read once at call time and passed by value.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on any enumeration (`FLUORITE_SPIKE_LIST_LIMIT`).
    pub list_limit: usize,
    /// Cap on bulk materialization (`FLUORITE_GENERATED_SPIKES_LIMIT`).
    pub generated_limit: usize,
    /// Coarse-scan universe size relative to the requested limit
    /// (`FLUORITE_SPIKE_METADATA_MULTIPLIER`).
    pub metadata_multiplier: usize,
    /// Discovery batch used by auto-selection (`FLUORITE_AUTO_SPIKE_BATCH`).
    pub auto_batch: usize,
    /// Candidates scored against the full task (`FLUORITE_AUTO_SPIKE_TOP`).
    pub auto_top: usize,
    /// Minimum coverage for a confident selection
    /// (`FLUORITE_AUTO_SPIKE_THRESHOLD`).
    pub auto_threshold: f64,
    /// Whether alias candidates join discovery (`FLUORITE_ALIAS_ENABLE`).
    pub alias_enable: bool,
    /// Score multiplier for alias candidates (`FLUORITE_ALIAS_BOOST`).
    pub alias_boost: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            list_limit: DEFAULT_LIST_LIMIT,
            generated_limit: DEFAULT_GENERATED_LIMIT,
            metadata_multiplier: DEFAULT_METADATA_MULTIPLIER,
            auto_batch: DEFAULT_AUTO_BATCH,
            auto_top: DEFAULT_AUTO_TOP,
            auto_threshold: DEFAULT_AUTO_THRESHOLD,
            alias_enable: true,
            alias_boost: DEFAULT_ALIAS_BOOST,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> EngineConfig {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Tests inject maps here
    /// instead of mutating process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            list_limit: parsed(&get, "FLUORITE_SPIKE_LIST_LIMIT", defaults.list_limit),
            generated_limit: parsed(
                &get,
                "FLUORITE_GENERATED_SPIKES_LIMIT",
                defaults.generated_limit,
            ),
            metadata_multiplier: parsed(
                &get,
                "FLUORITE_SPIKE_METADATA_MULTIPLIER",
                defaults.metadata_multiplier,
            )
            .max(1),
            auto_batch: parsed(&get, "FLUORITE_AUTO_SPIKE_BATCH", defaults.auto_batch).max(1),
            auto_top: parsed(&get, "FLUORITE_AUTO_SPIKE_TOP", defaults.auto_top).max(1),
            auto_threshold: parsed(
                &get,
                "FLUORITE_AUTO_SPIKE_THRESHOLD",
                defaults.auto_threshold,
            ),
            alias_enable: parsed_bool(&get, "FLUORITE_ALIAS_ENABLE", defaults.alias_enable),
            alias_boost: parsed(&get, "FLUORITE_ALIAS_BOOST", defaults.alias_boost),
        }
    }
}

fn parsed<T: FromStr + Copy>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    let Some(raw) = get(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, raw = %raw, "ignoring unparsable config value");
            default
        }
    }
}

fn parsed_bool(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = get(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(key, raw = %raw, "ignoring unparsable boolean config value");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[]));
        assert_eq!(config.list_limit, DEFAULT_LIST_LIMIT);
        assert!(config.alias_enable);
        assert_eq!(config.auto_threshold, DEFAULT_AUTO_THRESHOLD);
    }

    #[test]
    fn overrides_and_fallbacks() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("FLUORITE_SPIKE_LIST_LIMIT", "25"),
            ("FLUORITE_AUTO_SPIKE_THRESHOLD", "0.8"),
            ("FLUORITE_ALIAS_ENABLE", "off"),
            ("FLUORITE_AUTO_SPIKE_TOP", "not-a-number"),
        ]));
        assert_eq!(config.list_limit, 25);
        assert_eq!(config.auto_threshold, 0.8);
        assert!(!config.alias_enable);
        assert_eq!(config.auto_top, DEFAULT_AUTO_TOP);
    }

    #[test]
    fn multiplier_never_drops_below_one() {
        let config =
            EngineConfig::from_lookup(lookup(&[("FLUORITE_SPIKE_METADATA_MULTIPLIER", "0")]));
        assert_eq!(config.metadata_multiplier, 1);
    }
}
