//! Configuration model: load, reload and layered plugin config resolution.
//!
//! The model always holds a complete `ConfigSnapshot`. Loading never fails:
//! a missing document is replaced by the built-in one (and written to disk),
//! a malformed one is moved aside and replaced the same way. Reload builds a
//! fresh snapshot and swaps the `Arc`, so a consumer holding the previous
//! snapshot keeps a consistent view.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::types::config::{
    builtin_global_defaults, ConfigDocument, ConfigMap, LayoutDirective, LayoutFamily, PluginRef,
    WindowSlotSpec,
};
use crate::types::resolved::ResolvedPluginConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";


/// One immutable, versioned view of the configuration.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub source: PathBuf,
    pub layout: LayoutDirective,
    pub windows: Vec<WindowSlotSpec>,
    pub global_defaults: ConfigMap,
    pub plugin_defaults: BTreeMap<String, ConfigMap>,
    pub key_bindings: BTreeMap<String, Command>,
}


impl ConfigSnapshot {
    pub fn from_document(doc: &ConfigDocument, source: PathBuf, version: u64) -> ConfigSnapshot {
        let layout = LayoutDirective {
            family: LayoutFamily::parse_or_default(&doc.layout.layout_type),
            border_style: doc.layout.border_style.clone(),
            focus_color: doc.layout.focus_color.clone(),
            unfocus_color: doc.layout.unfocus_color.clone(),
        };

        let mut seen: HashMap<String, usize> = HashMap::new();
        let windows = doc
            .windows
            .iter()
            .map(|w| {
                let count = seen.entry(w.id.clone()).or_insert(0);
                *count += 1;
                let id = if *count == 1 {
                    w.id.clone()
                } else {
                    let renamed = format!("{}-{}", w.id, count);
                    tracing::warn!(id = %w.id, renamed = %renamed, "duplicate window id");
                    renamed
                };
                WindowSlotSpec {
                    id,
                    plugins: w
                        .plugins
                        .iter()
                        .map(|p| PluginRef {
                            type_name: p.plugin_type.clone(),
                            overrides: p.config.clone(),
                            weight: p.weight,
                        })
                        .collect(),
                    cycle_interval: seconds(w.cycle_interval),
                    min_size: (w.min_width, w.min_height),
                }
            })
            .collect();

        let key_bindings = doc
            .keys
            .iter()
            .filter_map(|(key, name)| match Command::from_name(name) {
                Some(cmd) => Some((key.clone(), cmd)),
                None => {
                    tracing::warn!(key = %key, command = %name, "unknown command in key bindings");
                    None
                }
            })
            .collect();

        ConfigSnapshot {
            version,
            source,
            layout,
            windows,
            global_defaults: doc.defaults.clone().unwrap_or_else(builtin_global_defaults),
            plugin_defaults: doc.plugin_defaults.clone(),
            key_bindings,
        }
    }

    /// Merge `global → plugin type → instance` for one plugin reference.
    pub fn resolve_plugin_config(
        &self,
        type_name: &str,
        overrides: &ConfigMap,
    ) -> ResolvedPluginConfig {
        self.resolve_with_preset(type_name, &ConfigMap::new(), overrides)
    }

    /// As `resolve_plugin_config`, with a registry preset slotted between
    /// the global defaults and the type defaults.
    pub fn resolve_with_preset(
        &self,
        type_name: &str,
        preset: &ConfigMap,
        overrides: &ConfigMap,
    ) -> ResolvedPluginConfig {
        let empty = ConfigMap::new();
        let typed = self.plugin_defaults.get(type_name).unwrap_or(&empty);
        ResolvedPluginConfig::layered(&[&self.global_defaults, preset, typed, overrides])
    }

    /// The slot sequence a layout family consumes: every configured window,
    /// padded up to a fixed family's leaf count (or to one for `Auto`).
    pub fn slots_for(&self, family: LayoutFamily) -> Vec<WindowSlotSpec> {
        let wanted = family.fixed_leaf_count().unwrap_or(1).max(self.windows.len());
        if family.fixed_leaf_count().is_some_and(|fixed| self.windows.len() > fixed) {
            tracing::debug!(
                configured = self.windows.len(),
                family = %family,
                "more windows than the layout holds, using a balanced split"
            );
        }
        let mut slots: Vec<WindowSlotSpec> = self.windows.clone();
        while slots.len() < wanted {
            slots.push(WindowSlotSpec::padding());
        }
        slots
    }
}


/// Non-positive, non-finite and out-of-range values all mean zero.
fn seconds(value: f64) -> Duration {
    if !(value.is_finite() && value > 0.0) {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or_else(|_| {
        tracing::warn!(secs = value, "cycle interval out of range, cycling disabled");
        Duration::ZERO
    })
}


/// Owner of the current configuration snapshot.
pub struct ConfigModel {
    requested: PathBuf,
    active: PathBuf,
    fallbacks: Vec<PathBuf>,
    snapshot: Arc<ConfigSnapshot>,
    next_version: u64,
    problems: Vec<Error>,
    memory: Option<ConfigDocument>,
}


impl ConfigModel {
    /// Load from `path`, trying `config.yaml` and `config/default.yaml` when
    /// it is missing, and synthesizing the built-in document as a last resort.
    pub fn open(path: impl Into<PathBuf>) -> ConfigModel {
        let requested = path.into();
        let fallbacks = vec![PathBuf::from("config.yaml"), PathBuf::from(DEFAULT_CONFIG_PATH)];
        Self::open_with_fallbacks(requested, fallbacks)
    }

    pub fn open_with_fallbacks(requested: PathBuf, fallbacks: Vec<PathBuf>) -> ConfigModel {
        let placeholder = ConfigSnapshot::from_document(
            &ConfigDocument::builtin(),
            requested.clone(),
            0,
        );
        let mut model = ConfigModel {
            active: requested.clone(),
            requested,
            fallbacks,
            snapshot: Arc::new(placeholder),
            next_version: 1,
            problems: Vec::new(),
            memory: None,
        };
        let (path, doc) = model.load_initial();
        model.active = path.clone();
        model.publish(&doc, path);
        model
    }

    /// A model that never touches the filesystem.
    pub fn in_memory(doc: &ConfigDocument) -> ConfigModel {
        let source = PathBuf::from("<memory>");
        ConfigModel {
            requested: source.clone(),
            active: source.clone(),
            fallbacks: Vec::new(),
            snapshot: Arc::new(ConfigSnapshot::from_document(doc, source, 1)),
            next_version: 2,
            problems: Vec::new(),
            memory: Some(doc.clone()),
        }
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn path(&self) -> &Path {
        &self.active
    }

    /// Re-read the last-used document and publish a new snapshot.
    ///
    /// A read or parse failure keeps the previous snapshot. A document that
    /// has disappeared is recreated from the built-in default.
    pub fn reload(&mut self) -> Arc<ConfigSnapshot> {
        if let Some(doc) = self.memory.clone() {
            self.publish(&doc, self.active.clone());
            return self.snapshot();
        }
        if !self.active.exists() {
            let (path, doc) = self.load_initial();
            self.active = path.clone();
            self.publish(&doc, path);
            return self.snapshot();
        }
        match read_document(&self.active) {
            Ok(doc) => {
                let path = self.active.clone();
                self.publish(&doc, path);
                tracing::info!(path = %self.active.display(), version = self.snapshot.version, "configuration reloaded");
            }
            Err(err) => {
                tracing::warn!(error = %err, "reload failed, keeping previous configuration");
                self.problems.push(err);
            }
        }
        self.snapshot()
    }

    /// Publish a snapshot that differs only in its layout family.
    pub fn set_layout_family(&mut self, family: LayoutFamily) -> Arc<ConfigSnapshot> {
        let mut next = (*self.snapshot).clone();
        next.layout.family = family;
        next.version = self.bump_version();
        self.snapshot = Arc::new(next);
        self.snapshot()
    }

    pub fn resolve_plugin_config(
        &self,
        type_name: &str,
        overrides: &ConfigMap,
    ) -> ResolvedPluginConfig {
        self.snapshot.resolve_plugin_config(type_name, overrides)
    }

    /// Errors recorded since the last call, for surfacing as notices.
    pub fn take_problems(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.problems)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn locate(&self) -> Option<PathBuf> {
        if self.requested.exists() {
            return Some(self.requested.clone());
        }
        self.fallbacks.iter().find(|p| p.exists()).cloned()
    }

    fn load_initial(&mut self) -> (PathBuf, ConfigDocument) {
        let Some(path) = self.locate() else {
            tracing::info!(path = %self.requested.display(), "no configuration found, writing default");
            let path = self.requested.clone();
            let doc = ConfigDocument::builtin();
            self.persist(&path, &doc);
            return (path, doc);
        };

        match read_document(&path) {
            Ok(doc) => {
                tracing::info!(path = %path.display(), "configuration loaded");
                (path, doc)
            }
            Err(err) => {
                tracing::warn!(error = %err, "configuration unreadable, using default");
                self.problems.push(err);
                let doc = ConfigDocument::builtin();
                if quarantine(&path) {
                    self.persist(&path, &doc);
                }
                (path, doc)
            }
        }
    }

    fn persist(&mut self, path: &Path, doc: &ConfigDocument) {
        if let Err(err) = write_document(path, doc) {
            tracing::error!(error = %err, "continuing with in-memory default configuration");
            self.problems.push(err);
        }
    }

    fn publish(&mut self, doc: &ConfigDocument, source: PathBuf) {
        let version = self.bump_version();
        self.snapshot = Arc::new(ConfigSnapshot::from_document(doc, source, version));
    }

    fn bump_version(&mut self) -> u64 {
        let v = self.next_version;
        self.next_version += 1;
        v
    }
}


/// Read and parse a configuration document. An empty file is an empty
/// document, not an error.
pub fn read_document(path: &Path) -> Result<ConfigDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::config_load(path, e))?;
    if text.trim().is_empty() {
        return Ok(ConfigDocument::default());
    }
    serde_yaml::from_str(&text).map_err(|e| Error::config_load(path, e))
}


/// Write a document, creating parent directories as needed.
pub fn write_document(path: &Path, doc: &ConfigDocument) -> Result<()> {
    let persist_err = |source| Error::ConfigPersist {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(persist_err)?;
    }
    let yaml = serde_yaml::to_string(doc)
        .map_err(|e| persist_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    std::fs::write(path, yaml).map_err(persist_err)
}


/// Move a malformed document out of the way. Returns false when the file
/// could not be moved, in which case it must not be overwritten.
fn quarantine(path: &Path) -> bool {
    let mut name = path.as_os_str().to_owned();
    name.push(".invalid");
    let target = PathBuf::from(name);
    match std::fs::rename(path, &target) {
        Ok(()) => {
            tracing::warn!(from = %path.display(), to = %target.display(), "moved malformed configuration aside");
            true
        }
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "could not move malformed configuration");
            false
        }
    }
}


/// Parse `key=value` command-line overrides.
///
/// Values without a `.` that parse as integers become integers, values with
/// a `.` that parse as floats become floats, anything else stays a string.
/// A pair without `=` is skipped with a warning.
pub fn parse_overrides<S: AsRef<str>>(pairs: &[S]) -> ConfigMap {
    pairs
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_ref();
            let Some((key, raw)) = pair.split_once('=') else {
                tracing::warn!(pair, "ignoring plugin config without '='");
                return None;
            };
            Some((key.trim().to_string(), override_value(raw.trim())))
        })
        .collect()
}


fn override_value(raw: &str) -> serde_yaml::Value {
    use serde_yaml::Value;
    if raw.contains('.') {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::from(f);
        }
    } else if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    Value::from(raw)
}
