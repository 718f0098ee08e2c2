use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::command::Command;
use crate::config::{ConfigModel, ConfigSnapshot};
use crate::error::{Error, Result};
use crate::layout::tree::Orientation;
use crate::layout::WindowManager;
use crate::registry::PluginRegistry;
use crate::response::{Notice, NoticeLevel, Response};
use crate::tile::TileView;
use crate::types::config::{
    ConfigDocument, ConfigMap, LayoutDirective, LayoutFamily, LayoutSection, PluginSection,
    WindowSection,
};


/// Central runtime for blinken. Owns the configuration, the plugin registry
/// and the window manager, and dispatches every `Command`.
pub struct Sys {
    config: ConfigModel,
    registry: PluginRegistry,
    windows: WindowManager,
    notices: Vec<Notice>,
    now_ms: u64,
    show_help: bool,
    quit: bool,
}


impl Sys {
    /// Load the configuration at `config_path`, register the built-in
    /// sources plus any manifests in `plugin_dir`, and build the layout.
    pub fn open(config_path: &Path, plugin_dir: &Path, width: u16, height: u16) -> Sys {
        let mut registry = PluginRegistry::with_builtins();
        let discovery = registry.discover(plugin_dir);
        let mut sys = Sys::new(ConfigModel::open(config_path), registry, width, height);
        for err in discovery {
            sys.notify(err.to_string(), NoticeLevel::Warning);
        }
        sys
    }

    pub fn new(config: ConfigModel, registry: PluginRegistry, width: u16, height: u16) -> Sys {
        let mut sys = Sys {
            config,
            registry,
            windows: WindowManager::new(width, height),
            notices: Vec::new(),
            now_ms: 0,
            show_help: false,
            quit: false,
        };
        let snapshot = sys.config.snapshot();
        sys.windows.build(&snapshot, &sys.registry, 0);
        sys.surface_problems();
        sys
    }

    /// A session that shows exactly one source full screen.
    ///
    /// Fails with `PluginResolution` when `type_name` is not registered.
    pub fn single_plugin(
        type_name: &str,
        overrides: ConfigMap,
        registry: PluginRegistry,
        width: u16,
        height: u16,
    ) -> Result<Sys> {
        registry.resolve(type_name)?;
        let doc = ConfigDocument {
            layout: LayoutSection {
                layout_type: LayoutFamily::Single.as_str().into(),
                ..LayoutSection::default()
            },
            windows: vec![WindowSection {
                id: type_name.to_string(),
                plugins: vec![PluginSection {
                    plugin_type: type_name.to_string(),
                    config: overrides,
                    weight: 1.0,
                }],
                cycle_interval: 0.0,
                min_width: 0,
                min_height: 0,
            }],
            keys: BTreeMap::new(),
            ..ConfigDocument::builtin()
        };
        tracing::info!(plugin = type_name, "single plugin mode");
        Ok(Sys::new(ConfigModel::in_memory(&doc), registry, width, height))
    }

    /// The single dispatch method.
    pub fn execute(&mut self, cmd: Command) -> Response {
        tracing::debug!(?cmd, "execute");
        match cmd {
            Command::ReloadConfig => self.cmd_reload(),
            Command::Quit => self.cmd_quit(),
            Command::Help => self.cmd_help(),
            Command::FocusNext => self.cmd_focus(true),
            Command::FocusPrevious => self.cmd_focus(false),
            Command::SplitHorizontal => {
                let result = self.windows.split_focused_window(Orientation::Horizontal);
                self.unsupported(result)
            }
            Command::SplitVertical => {
                let result = self.windows.split_focused_window(Orientation::Vertical);
                self.unsupported(result)
            }
            Command::CloseWindow => {
                let result = self.windows.close_focused_window();
                self.unsupported(result)
            }
            Command::LayoutSingle => self.cmd_layout(LayoutFamily::Single),
            Command::Layout2x2 => self.cmd_layout(LayoutFamily::Grid2x2),
            Command::Layout2x2Big => self.cmd_layout(LayoutFamily::Big2x2),
            Command::Layout3x3 => self.cmd_layout(LayoutFamily::Grid3x3),
            Command::LayoutAuto => self.cmd_layout(LayoutFamily::Auto),
        }
    }

    /// Fire due timers and drop expired notices.
    pub fn advance(&mut self, now_ms: u64) -> usize {
        self.now_ms = now_ms;
        self.notices.retain(|n| !n.is_expired(now_ms));
        self.windows.advance(now_ms)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.windows.resize(width, height);
    }

    // -----------------------------------------------------------------------
    // Session commands
    // -----------------------------------------------------------------------

    fn cmd_reload(&mut self) -> Response {
        let snapshot = self.config.reload();
        self.windows.build(&snapshot, &self.registry, self.now_ms);
        if self.surface_problems() {
            return Response::error("Configuration reload failed, keeping previous configuration");
        }
        self.notify("Configuration reloaded", NoticeLevel::Info);
        Response::ok(format!("Configuration reloaded (version {})", snapshot.version))
    }

    fn cmd_quit(&mut self) -> Response {
        self.quit = true;
        Response::ok("Quitting")
    }

    fn cmd_help(&mut self) -> Response {
        self.show_help = !self.show_help;
        Response::ok(crate::help::help_text())
    }

    // -----------------------------------------------------------------------
    // Layout commands
    // -----------------------------------------------------------------------

    fn cmd_layout(&mut self, family: LayoutFamily) -> Response {
        let snapshot = self.config.set_layout_family(family);
        self.windows.build(&snapshot, &self.registry, self.now_ms);
        let message = format!("Switched to {} layout", family.label());
        self.notify(message.clone(), NoticeLevel::Info);
        Response::ok(message)
    }

    fn cmd_focus(&mut self, forward: bool) -> Response {
        if forward {
            self.windows.focus_next();
        } else {
            self.windows.focus_previous();
        }
        match self.windows.focused_tile() {
            Some(tile) => Response::ok(format!("Focused {}", tile.id())),
            None => Response::error("No windows"),
        }
    }

    fn unsupported(&mut self, result: Result<()>) -> Response {
        match result {
            Ok(()) => Response::ok(""),
            Err(err) => {
                let message = err.to_string();
                self.notify(message.clone(), NoticeLevel::Warning);
                Response::error(message)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Notices
    // -----------------------------------------------------------------------

    fn notify(&mut self, message: impl Into<String>, level: NoticeLevel) {
        self.notices.push(Notice::new(message, level, self.now_ms));
    }

    /// Turn recorded configuration errors into notices. Returns whether
    /// there were any.
    fn surface_problems(&mut self) -> bool {
        let problems = self.config.take_problems();
        let any = !problems.is_empty();
        for err in problems {
            let level = match err {
                Error::ConfigPersist { .. } => NoticeLevel::Error,
                _ => NoticeLevel::Warning,
            };
            self.notify(err.to_string(), level);
        }
        any
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn views(&self) -> Vec<TileView> {
        self.windows.views()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn help_visible(&self) -> bool {
        self.show_help
    }

    pub fn directive(&self) -> &LayoutDirective {
        self.windows.directive()
    }

    pub fn key_bindings(&self) -> BTreeMap<String, Command> {
        self.config.snapshot().key_bindings.clone()
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.config.snapshot()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    /// Milliseconds until the next timer is due, relative to the last
    /// `advance`.
    pub fn next_due_in_ms(&self) -> Option<u64> {
        self.windows
            .next_due_ms()
            .map(|due| due.saturating_sub(self.now_ms))
    }
}
