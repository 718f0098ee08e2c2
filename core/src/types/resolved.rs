//! Fully layered plugin configuration handed to a content source.

use std::time::Duration;

use serde_yaml::Value;

use super::config::ConfigMap;


/// Result of `global defaults → plugin type defaults → instance overrides`.
///
/// Lookups never fail: every accessor takes a fallback, and a value of the
/// wrong type is treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPluginConfig {
    values: ConfigMap,
}


impl ResolvedPluginConfig {
    /// Shallow merge, later layers overwriting earlier ones key by key.
    pub fn layered(layers: &[&ConfigMap]) -> ResolvedPluginConfig {
        let mut values = ConfigMap::new();
        for layer in layers {
            for (key, value) in layer.iter() {
                values.insert(key.clone(), value.clone());
            }
        }
        ResolvedPluginConfig { values }
    }

    pub fn from_map(values: ConfigMap) -> ResolvedPluginConfig {
        ResolvedPluginConfig { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn as_map(&self) -> &ConfigMap {
        &self.values
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        match self.values.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }

    /// A list of strings; a single string counts as a one-element list.
    pub fn str_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Seconds as a `Duration`. Non-positive or non-finite values, and values
    /// too large for a `Duration`, use the fallback.
    pub fn secs_or(&self, key: &str, default_secs: f64) -> Duration {
        let fallback = Duration::try_from_secs_f64(default_secs).unwrap_or_default();
        let secs = self.f64_or(key, default_secs);
        if !(secs.is_finite() && secs > 0.0) {
            return fallback;
        }
        Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
            tracing::warn!(key, secs, "duration out of range, using default");
            fallback
        })
    }

    /// Optional RNG seed for deterministic output.
    pub fn seed(&self) -> Option<u64> {
        self.contains("seed").then(|| self.u64_or("seed", 0))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn later_layers_win_key_by_key() {
        let global = cfg("refresh_rate: 0.3\ncolor_scheme: matrix\nfont: monospace");
        let typed = cfg("refresh_rate: 0.2\ncolumns: 16");
        let instance = cfg("color_scheme: amber");
        let resolved = ResolvedPluginConfig::layered(&[&global, &typed, &instance]);
        assert_eq!(resolved.f64_or("refresh_rate", 0.0), 0.2);
        assert_eq!(resolved.str_or("color_scheme", ""), "amber");
        assert_eq!(resolved.str_or("font", ""), "monospace");
        assert_eq!(resolved.u64_or("columns", 0), 16);
        assert_eq!(resolved.as_map().len(), 4);
    }

    #[test]
    fn merge_is_shallow() {
        let typed = cfg("palette: { fg: green, bg: black }");
        let instance = cfg("palette: { fg: red }");
        let resolved = ResolvedPluginConfig::layered(&[&typed, &instance]);
        let palette = resolved.get("palette").unwrap().as_mapping().unwrap();
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn mistyped_values_fall_back() {
        let resolved = ResolvedPluginConfig::from_map(cfg("columns: lots\nrefresh_rate: -1"));
        assert_eq!(resolved.u64_or("columns", 16), 16);
        assert_eq!(resolved.secs_or("refresh_rate", 0.5), Duration::from_millis(500));
    }

    #[test]
    fn oversized_seconds_fall_back() {
        let resolved = ResolvedPluginConfig::from_map(cfg("target_interval: 1.0e+300"));
        assert_eq!(resolved.secs_or("target_interval", 5.0), Duration::from_secs(5));
    }

    #[test]
    fn numeric_strings_are_read() {
        let resolved = ResolvedPluginConfig::from_map(cfg("density: '0.25'"));
        assert_eq!(resolved.f64_or("density", 0.1), 0.25);
    }

    #[test]
    fn str_list_accepts_scalar() {
        let resolved = ResolvedPluginConfig::from_map(cfg("effects: glitch"));
        assert_eq!(resolved.str_list("effects"), vec!["glitch".to_string()]);
        let resolved = ResolvedPluginConfig::from_map(cfg("effects: [glitch, pulse]"));
        assert_eq!(resolved.str_list("effects").len(), 2);
    }
}
