//! Plugin registry: type name to content source constructor.
//!
//! Built-ins are registered first, then external plugins, which overwrite a
//! built-in of the same name. External plugins come from two places:
//! implementations of `ExternalPlugin` linked into the binary, and YAML
//! manifests found in the plugin directory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::plugins::{
    BoxedSource, HexScroll, LogScroll, MatrixRain, NetworkMonitor, SystemMonitor, TacticalMap,
    TextTicker,
};
use crate::types::config::ConfigMap;
use crate::types::resolved::ResolvedPluginConfig;

pub const DEFAULT_PLUGIN_DIR: &str = "plugins";


pub type Constructor = Arc<dyn Fn(&ResolvedPluginConfig) -> BoxedSource + Send + Sync>;


/// A registered type: how to build it, and config layered under the user's.
#[derive(Clone)]
pub struct PluginEntry {
    constructor: Constructor,
    preset: ConfigMap,
}


impl PluginEntry {
    pub fn construct(&self, config: &ResolvedPluginConfig) -> BoxedSource {
        (self.constructor)(config)
    }

    pub fn preset(&self) -> &ConfigMap {
        &self.preset
    }
}


/// Explicit registration entry point for plugins supplied outside the core.
pub trait ExternalPlugin {
    fn name(&self) -> &str;

    fn register(&self, registry: &mut PluginRegistry) -> Result<()>;
}


#[derive(Clone, Default)]
pub struct PluginRegistry {
    entries: HashMap<String, PluginEntry>,
}


impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = PluginRegistry::new();
        registry.register_fn("HexScroll", |c| Box::new(HexScroll::new(c)));
        registry.register_fn("MatrixRain", |c| Box::new(MatrixRain::new(c)));
        registry.register_fn("SystemMonitor", |c| Box::new(SystemMonitor::new(c)));
        registry.register_fn("LogScroll", |c| Box::new(LogScroll::new(c)));
        registry.register_fn("NetworkMonitor", |c| Box::new(NetworkMonitor::new(c)));
        registry.register_fn("TacticalMap", |c| Box::new(TacticalMap::new(c)));
        registry
    }

    /// Register `type_name`, replacing any existing entry.
    pub fn register(&mut self, type_name: impl Into<String>, constructor: Constructor) {
        self.register_with_preset(type_name, constructor, ConfigMap::new());
    }

    pub fn register_fn<F>(&mut self, type_name: impl Into<String>, f: F)
    where
        F: Fn(&ResolvedPluginConfig) -> BoxedSource + Send + Sync + 'static,
    {
        self.register(type_name, Arc::new(f));
    }

    pub fn register_with_preset(
        &mut self,
        type_name: impl Into<String>,
        constructor: Constructor,
        preset: ConfigMap,
    ) {
        let type_name = type_name.into();
        let replaced = self
            .entries
            .insert(type_name.clone(), PluginEntry { constructor, preset })
            .is_some();
        if replaced {
            tracing::info!(type_name = %type_name, "plugin registration replaced");
        } else {
            tracing::debug!(type_name = %type_name, "plugin registered");
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&PluginEntry> {
        self.entries.get(type_name)
    }

    pub fn resolve(&self, type_name: &str) -> Result<&PluginEntry> {
        self.get(type_name).ok_or_else(|| Error::PluginResolution {
            type_name: type_name.to_string(),
        })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Every registered type name, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Let each candidate register itself. Failures are logged and returned;
    /// the remaining candidates still run.
    pub fn install(&mut self, candidates: &[Box<dyn ExternalPlugin>]) -> Vec<Error> {
        let mut failures = Vec::new();
        for candidate in candidates {
            if let Err(err) = candidate.register(self) {
                tracing::warn!(candidate = candidate.name(), error = %err, "skipping plugin");
                failures.push(err);
            }
        }
        failures
    }

    /// Install every manifest in `dir`. A missing directory is not an error.
    pub fn discover(&mut self, dir: &Path) -> Vec<Error> {
        let manifests = match scan_manifests(dir) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "no plugin directory");
                return Vec::new();
            }
        };
        let mut candidates: Vec<Box<dyn ExternalPlugin>> = Vec::new();
        let mut failures = Vec::new();
        for path in manifests {
            match ManifestPlugin::load(&path) {
                Ok(plugin) => candidates.push(Box::new(plugin)),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping plugin manifest");
                    failures.push(err);
                }
            }
        }
        failures.extend(self.install(&candidates));
        failures
    }
}


impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("types", &self.list())
            .finish()
    }
}


/// `*.yaml` / `*.yml` files in `dir`, skipping names that start with `_`,
/// in name order.
fn scan_manifests(dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut found: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('_'));
            is_yaml && !hidden && path.is_file()
        })
        .collect();
    found.sort();
    Ok(found)
}


// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PluginManifest {
    /// A registered type under a new name, with preset config.
    Alias {
        name: String,
        base: String,
        #[serde(default)]
        config: ConfigMap,
    },
    /// A text ticker cycling through fixed lines.
    Ticker {
        name: String,
        lines: Vec<String>,
        #[serde(default)]
        refresh_rate: Option<f64>,
        #[serde(default)]
        title: Option<String>,
    },
}


pub struct ManifestPlugin {
    source: String,
    manifest: PluginManifest,
}


impl ManifestPlugin {
    pub fn load(path: &Path) -> Result<ManifestPlugin> {
        let source = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| Error::discovery(&source, e))?;
        let manifest = serde_yaml::from_str(&text).map_err(|e| Error::discovery(&source, e))?;
        Ok(ManifestPlugin { source, manifest })
    }
}


impl ExternalPlugin for ManifestPlugin {
    fn name(&self) -> &str {
        match &self.manifest {
            PluginManifest::Alias { name, .. } | PluginManifest::Ticker { name, .. } => name,
        }
    }

    fn register(&self, registry: &mut PluginRegistry) -> Result<()> {
        match &self.manifest {
            PluginManifest::Alias { name, base, config } => {
                let entry = registry.get(base).cloned().ok_or_else(|| {
                    Error::discovery(&self.source, format!("unknown base type '{base}'"))
                })?;
                let mut preset = entry.preset.clone();
                preset.extend(config.iter().map(|(k, v)| (k.clone(), v.clone())));
                registry.register_with_preset(name.clone(), entry.constructor, preset);
            }
            PluginManifest::Ticker {
                name,
                lines,
                refresh_rate,
                title,
            } => {
                let mut preset = ConfigMap::new();
                preset.insert(
                    "lines".into(),
                    serde_yaml::Value::Sequence(lines.iter().map(|l| l.as_str().into()).collect()),
                );
                if let Some(rate) = refresh_rate {
                    preset.insert("refresh_rate".into(), (*rate).into());
                }
                if let Some(title) = title {
                    preset.insert("title".into(), title.as_str().into());
                }
                let constructor: Constructor =
                    Arc::new(|c: &ResolvedPluginConfig| -> BoxedSource { Box::new(TextTicker::new(c)) });
                registry.register_with_preset(name.clone(), constructor, preset);
            }
        }
        tracing::info!(name = self.name(), source = %self.source, "plugin manifest registered");
        Ok(())
    }
}
