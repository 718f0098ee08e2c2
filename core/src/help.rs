//! Help text for the dashboard's commands and key bindings.

use std::collections::BTreeMap;

use crate::command::Command;


/// The overlay text listing the default keys.
pub fn help_text() -> String {
    "\
blinken — tiled procedural-content dashboard

Keys:
  q                Quit
  Ctrl-C           Quit (always)
  r                Reload configuration
  Tab              Focus next window
  Shift-Tab        Focus previous window
  h / v            Split horizontally / vertically
  x                Close focused window
  1 2 3 4 5        Layout: single, 2x2, 2x2 big, 3x3, auto
  ?                Toggle this help

Keys can be rebound in the 'keys' section of the configuration,
e.g.  keys: { n: focus.next, R: config.reload }"
        .into()
}


/// One `key  command` line per binding, sorted by key.
pub fn binding_lines(bindings: &BTreeMap<String, Command>) -> Vec<String> {
    bindings
        .iter()
        .map(|(key, cmd)| format!("  {:<16} {}", key, command_name(*cmd)))
        .collect()
}


/// The configuration name of `cmd`, e.g. `focus.next`.
pub fn command_name(cmd: Command) -> String {
    match serde_yaml::to_value(cmd) {
        Ok(serde_yaml::Value::String(name)) => name,
        _ => format!("{:?}", cmd),
    }
}
