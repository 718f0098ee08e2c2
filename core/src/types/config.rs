//! Configuration document and the structured model derived from it.
//!
//! `ConfigDocument` mirrors the YAML file one-to-one (serde). The config
//! model turns it into `LayoutDirective` and `WindowSlotSpec` values, which
//! are what the layout engine and tiles consume.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Flat key/value mapping used at every configuration layer.
pub type ConfigMap = BTreeMap<String, Value>;

pub const DEFAULT_PLUGIN_TYPE: &str = "HexScroll";


// ---------------------------------------------------------------------------
// Layout family
// ---------------------------------------------------------------------------

/// The layout families a configuration can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutFamily {
    Single,
    Grid2x2,
    Big2x2,
    Grid3x3,
    /// Balanced recursive split over every configured window.
    Auto,
}


impl LayoutFamily {
    pub const ALL: [LayoutFamily; 5] = [
        LayoutFamily::Single,
        LayoutFamily::Grid2x2,
        LayoutFamily::Big2x2,
        LayoutFamily::Grid3x3,
        LayoutFamily::Auto,
    ];

    pub fn parse(name: &str) -> Option<LayoutFamily> {
        match name.trim() {
            "single" => Some(LayoutFamily::Single),
            "2x2" => Some(LayoutFamily::Grid2x2),
            "2x2_big" => Some(LayoutFamily::Big2x2),
            "3x3" => Some(LayoutFamily::Grid3x3),
            "auto" => Some(LayoutFamily::Auto),
            _ => None,
        }
    }

    /// Parse a family name, falling back to `2x2` for anything unrecognized.
    pub fn parse_or_default(name: &str) -> LayoutFamily {
        LayoutFamily::parse(name).unwrap_or_else(|| {
            tracing::warn!(layout_type = name, "unrecognized layout type, using 2x2");
            LayoutFamily::Grid2x2
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutFamily::Single => "single",
            LayoutFamily::Grid2x2 => "2x2",
            LayoutFamily::Big2x2 => "2x2_big",
            LayoutFamily::Grid3x3 => "3x3",
            LayoutFamily::Auto => "auto",
        }
    }

    /// Number of leaves a fixed family always produces. `None` for `Auto`,
    /// which produces one leaf per configured window.
    pub fn fixed_leaf_count(self) -> Option<usize> {
        match self {
            LayoutFamily::Single => Some(1),
            LayoutFamily::Grid2x2 | LayoutFamily::Big2x2 => Some(4),
            LayoutFamily::Grid3x3 => Some(9),
            LayoutFamily::Auto => None,
        }
    }

    /// Human-readable label used in notices.
    pub fn label(self) -> &'static str {
        match self {
            LayoutFamily::Single => "single window",
            LayoutFamily::Grid2x2 => "2x2 grid",
            LayoutFamily::Big2x2 => "2x2 big window",
            LayoutFamily::Grid3x3 => "3x3 grid",
            LayoutFamily::Auto => "auto tiling",
        }
    }
}


impl std::fmt::Display for LayoutFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}


// ---------------------------------------------------------------------------
// Structured model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDirective {
    pub family: LayoutFamily,
    pub border_style: String,
    pub focus_color: String,
    pub unfocus_color: String,
}


impl Default for LayoutDirective {
    fn default() -> Self {
        LayoutDirective {
            family: LayoutFamily::Grid2x2,
            border_style: default_border_style(),
            focus_color: default_focus_color(),
            unfocus_color: default_unfocus_color(),
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct PluginRef {
    pub type_name: String,
    pub overrides: ConfigMap,
    /// Only consulted for weighted cycling.
    pub weight: f64,
}


impl PluginRef {
    pub fn named(type_name: impl Into<String>) -> PluginRef {
        PluginRef {
            type_name: type_name.into(),
            overrides: ConfigMap::new(),
            weight: 1.0,
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlotSpec {
    pub id: String,
    pub plugins: Vec<PluginRef>,
    /// Zero disables auto-cycling.
    pub cycle_interval: Duration,
    pub min_size: (u16, u16),
}


impl WindowSlotSpec {
    /// The slot used to pad layouts that need more windows than configured.
    pub fn padding() -> WindowSlotSpec {
        WindowSlotSpec {
            id: "default".into(),
            plugins: vec![PluginRef::named(DEFAULT_PLUGIN_TYPE)],
            cycle_interval: Duration::ZERO,
            min_size: (default_min_width(), default_min_height()),
        }
    }
}


// ---------------------------------------------------------------------------
// Raw document
// ---------------------------------------------------------------------------

/// The on-disk YAML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigDocument {
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<ConfigMap>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugin_defaults: BTreeMap<String, ConfigMap>,
    #[serde(default)]
    pub windows: Vec<WindowSection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keys: BTreeMap<String, String>,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutSection {
    #[serde(default = "default_layout_type")]
    pub layout_type: String,
    #[serde(default = "default_border_style")]
    pub border_style: String,
    #[serde(default = "default_focus_color")]
    pub focus_color: String,
    #[serde(default = "default_unfocus_color")]
    pub unfocus_color: String,
}


impl Default for LayoutSection {
    fn default() -> Self {
        LayoutSection {
            layout_type: default_layout_type(),
            border_style: default_border_style(),
            focus_color: default_focus_color(),
            unfocus_color: default_unfocus_color(),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowSection {
    #[serde(default = "default_window_id")]
    pub id: String,
    #[serde(default)]
    pub plugins: Vec<PluginSection>,
    #[serde(default)]
    pub cycle_interval: f64,
    #[serde(default = "default_min_width")]
    pub min_width: u16,
    #[serde(default = "default_min_height")]
    pub min_height: u16,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginSection {
    #[serde(rename = "type", default = "default_plugin_type")]
    pub plugin_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: ConfigMap,
    #[serde(default = "default_weight")]
    pub weight: f64,
}


fn default_layout_type() -> String {
    "2x2".into()
}

fn default_border_style() -> String {
    "solid".into()
}

fn default_focus_color() -> String {
    "$primary".into()
}

fn default_unfocus_color() -> String {
    "$surface-lighten-1".into()
}

fn default_window_id() -> String {
    "window".into()
}

fn default_min_width() -> u16 {
    10
}

fn default_min_height() -> u16 {
    3
}

fn default_plugin_type() -> String {
    DEFAULT_PLUGIN_TYPE.into()
}

fn default_weight() -> f64 {
    1.0
}


/// Global plugin defaults used when a document has no `defaults` section.
pub fn builtin_global_defaults() -> ConfigMap {
    map([
        ("refresh_rate", Value::from(0.3)),
        ("color_scheme", Value::from("matrix")),
        ("font", Value::from("monospace")),
    ])
}


impl ConfigDocument {
    /// The document written to disk when no configuration exists yet.
    pub fn builtin() -> ConfigDocument {
        let mut plugin_defaults = BTreeMap::new();
        plugin_defaults.insert(
            "HexScroll".to_string(),
            map([("refresh_rate", Value::from(0.2)), ("columns", Value::from(16))]),
        );
        plugin_defaults.insert(
            "MatrixRain".to_string(),
            map([("refresh_rate", Value::from(0.1)), ("density", Value::from(0.1))]),
        );
        plugin_defaults.insert(
            "SystemMonitor".to_string(),
            map([("refresh_rate", Value::from(1.0))]),
        );
        plugin_defaults.insert(
            "LogScroll".to_string(),
            map([("refresh_rate", Value::from(0.5))]),
        );
        plugin_defaults.insert(
            "TacticalMap".to_string(),
            map([
                ("target_interval", Value::from(5.0)),
                ("num_coordinates", Value::from(3)),
            ]),
        );

        let window = |id: &str, plugin: PluginSection| WindowSection {
            id: id.into(),
            plugins: vec![plugin],
            cycle_interval: 0.0,
            min_width: default_min_width(),
            min_height: default_min_height(),
        };
        let plugin = |name: &str, config: ConfigMap| PluginSection {
            plugin_type: name.into(),
            config,
            weight: default_weight(),
        };

        ConfigDocument {
            layout: LayoutSection::default(),
            defaults: Some(builtin_global_defaults()),
            plugin_defaults,
            windows: vec![
                window("map", plugin("TacticalMap", ConfigMap::new())),
                window("monitor", plugin("SystemMonitor", ConfigMap::new())),
                window("logs", plugin("LogScroll", ConfigMap::new())),
                window(
                    "data",
                    plugin("HexScroll", map([("color_scheme", Value::from("amber"))])),
                ),
            ],
            keys: BTreeMap::new(),
        }
    }
}


fn map<const N: usize>(entries: [(&str, Value); N]) -> ConfigMap {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
