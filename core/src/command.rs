//! Command: the typed interface for every operation the dashboard accepts.
//!
//! Commands are input-agnostic: the terminal shell binds keys to them, and the
//! `keys` section of the configuration document names them by string.

use serde::{Deserialize, Serialize};

use crate::types::config::LayoutFamily;


#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Command {
    // -----------------------------------------------------------------
    // Session commands
    // -----------------------------------------------------------------

    #[serde(rename = "config.reload")]
    ReloadConfig,

    #[serde(rename = "quit")]
    Quit,

    #[serde(rename = "help")]
    Help,

    // -----------------------------------------------------------------
    // Focus commands
    // -----------------------------------------------------------------

    #[serde(rename = "focus.next")]
    FocusNext,

    #[serde(rename = "focus.prev")]
    FocusPrevious,

    // -----------------------------------------------------------------
    // Window commands (unsupported under fixed layouts)
    // -----------------------------------------------------------------

    #[serde(rename = "window.split_horizontal")]
    SplitHorizontal,

    #[serde(rename = "window.split_vertical")]
    SplitVertical,

    #[serde(rename = "window.close")]
    CloseWindow,

    // -----------------------------------------------------------------
    // Layout switches
    // -----------------------------------------------------------------

    #[serde(rename = "layout.single")]
    LayoutSingle,

    #[serde(rename = "layout.2x2")]
    Layout2x2,

    #[serde(rename = "layout.2x2_big")]
    Layout2x2Big,

    #[serde(rename = "layout.3x3")]
    Layout3x3,

    #[serde(rename = "layout.auto")]
    LayoutAuto,
}


impl Command {
    /// Look a command up by its configuration name (e.g. `focus.next`).
    pub fn from_name(name: &str) -> Option<Command> {
        serde_yaml::from_value(serde_yaml::Value::String(name.trim().to_string())).ok()
    }

    /// The layout family a layout-switch command selects.
    pub fn layout_family(self) -> Option<LayoutFamily> {
        match self {
            Command::LayoutSingle => Some(LayoutFamily::Single),
            Command::Layout2x2 => Some(LayoutFamily::Grid2x2),
            Command::Layout2x2Big => Some(LayoutFamily::Big2x2),
            Command::Layout3x3 => Some(LayoutFamily::Grid3x3),
            Command::LayoutAuto => Some(LayoutFamily::Auto),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve() {
        assert_eq!(Command::from_name("config.reload"), Some(Command::ReloadConfig));
        assert_eq!(Command::from_name(" focus.prev "), Some(Command::FocusPrevious));
        assert_eq!(Command::from_name("layout.2x2_big"), Some(Command::Layout2x2Big));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(Command::from_name("window.maximize"), None);
        assert_eq!(Command::from_name(""), None);
    }

    #[test]
    fn serializes_as_plain_string() {
        let yaml = serde_yaml::to_string(&Command::SplitVertical).unwrap();
        assert_eq!(yaml.trim(), "window.split_vertical");
    }

    #[test]
    fn layout_switches_map_to_families() {
        assert_eq!(Command::Layout3x3.layout_family(), Some(LayoutFamily::Grid3x3));
        assert_eq!(Command::LayoutAuto.layout_family(), Some(LayoutFamily::Auto));
        assert_eq!(Command::Quit.layout_family(), None);
    }
}
