//! Key bindings: crossterm key events to core commands.

use std::collections::{BTreeMap, HashMap};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use blinken_core::command::Command;


/// A key plus the modifiers that matter for binding (Ctrl and Alt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}


impl KeyChord {
    pub fn plain(code: KeyCode) -> Self {
        KeyChord {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Parse a binding name such as `q`, `tab`, `shift+tab`, `ctrl+r` or `f5`.
    pub fn parse(name: &str) -> Option<KeyChord> {
        let mut modifiers = KeyModifiers::NONE;
        let mut parts: Vec<&str> = name.split('+').collect();
        // "+" on its own, or a trailing "ctrl++", names the plus key.
        if name.ends_with("++") || name == "+" {
            parts.retain(|p| !p.is_empty());
            parts.push("+");
        }
        let key = parts.pop()?;
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key.to_ascii_lowercase().as_str() {
            "tab" if modifiers.contains(KeyModifiers::SHIFT) => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "space" => KeyCode::Char(' '),
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "backspace" => KeyCode::Backspace,
            "delete" => KeyCode::Delete,
            lower if lower.len() > 1 && lower.starts_with('f') => {
                KeyCode::F(lower[1..].parse().ok()?)
            }
            _ => {
                let mut chars = key.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                KeyCode::Char(c)
            }
        };
        Some(KeyChord { code, modifiers })
    }

    fn from_event(event: &KeyEvent) -> KeyChord {
        // Shift is already folded into the character and into BackTab.
        let modifiers = event.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT);
        let code = match event.code {
            KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => {
                KeyCode::Char(c.to_ascii_lowercase())
            }
            other => other,
        };
        KeyChord { code, modifiers }
    }
}


pub struct Keymap {
    bindings: HashMap<KeyChord, Command>,
}


impl Keymap {
    /// The built-in bindings.
    pub fn defaults() -> Keymap {
        let table = [
            ('q', Command::Quit),
            ('r', Command::ReloadConfig),
            ('h', Command::SplitHorizontal),
            ('v', Command::SplitVertical),
            ('x', Command::CloseWindow),
            ('1', Command::LayoutSingle),
            ('2', Command::Layout2x2),
            ('3', Command::Layout2x2Big),
            ('4', Command::Layout3x3),
            ('5', Command::LayoutAuto),
            ('?', Command::Help),
        ];
        let mut bindings: HashMap<KeyChord, Command> = table
            .into_iter()
            .map(|(c, cmd)| (KeyChord::plain(KeyCode::Char(c)), cmd))
            .collect();
        bindings.insert(KeyChord::plain(KeyCode::Tab), Command::FocusNext);
        bindings.insert(KeyChord::plain(KeyCode::BackTab), Command::FocusPrevious);
        Keymap { bindings }
    }

    /// Defaults with the `keys` section of the configuration layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, Command>) -> Keymap {
        let mut keymap = Keymap::defaults();
        for (name, cmd) in overrides {
            match KeyChord::parse(name) {
                Some(chord) => {
                    keymap.bindings.insert(chord, *cmd);
                }
                None => tracing::warn!(key = %name, "unrecognized key name in bindings"),
            }
        }
        keymap
    }

    /// The command for a key press. Ctrl-C always quits.
    pub fn lookup(&self, event: &KeyEvent) -> Option<Command> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        let chord = KeyChord::from_event(event);
        if chord.code == KeyCode::Char('c') && chord.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Command::Quit);
        }
        self.bindings.get(&chord).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn default_bindings() {
        let keymap = Keymap::defaults();
        assert_eq!(keymap.len(), 13);
        assert_eq!(keymap.lookup(&press(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Command::Quit));
        assert_eq!(keymap.lookup(&press(KeyCode::Tab, KeyModifiers::NONE)), Some(Command::FocusNext));
        assert_eq!(
            keymap.lookup(&press(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(Command::FocusPrevious)
        );
        assert_eq!(keymap.lookup(&press(KeyCode::Char('?'), KeyModifiers::SHIFT)), Some(Command::Help));
        assert_eq!(keymap.lookup(&press(KeyCode::Char('3'), KeyModifiers::NONE)), Some(Command::Layout2x2Big));
        assert_eq!(keymap.lookup(&press(KeyCode::Char('z'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut overrides = BTreeMap::new();
        overrides.insert("ctrl+c".to_string(), Command::ReloadConfig);
        let keymap = Keymap::with_overrides(&overrides);
        assert_eq!(keymap.lookup(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(Command::Quit));
        assert_eq!(keymap.lookup(&press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn overrides_replace_and_add() {
        let mut overrides = BTreeMap::new();
        overrides.insert("q".to_string(), Command::Help);
        overrides.insert("ctrl+r".to_string(), Command::ReloadConfig);
        overrides.insert("f5".to_string(), Command::LayoutAuto);
        overrides.insert("hyper+q".to_string(), Command::Quit);
        let keymap = Keymap::with_overrides(&overrides);
        assert_eq!(keymap.lookup(&press(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Command::Help));
        assert_eq!(
            keymap.lookup(&press(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Command::ReloadConfig)
        );
        assert_eq!(keymap.lookup(&press(KeyCode::F(5), KeyModifiers::NONE)), Some(Command::LayoutAuto));
        assert_eq!(keymap.len(), 15);
    }

    #[test]
    fn chord_names_parse() {
        assert_eq!(KeyChord::parse("shift+tab"), Some(KeyChord::plain(KeyCode::BackTab)));
        assert_eq!(KeyChord::parse("space"), Some(KeyChord::plain(KeyCode::Char(' '))));
        assert_eq!(KeyChord::parse("Q"), Some(KeyChord::plain(KeyCode::Char('Q'))));
        assert_eq!(KeyChord::parse("+"), Some(KeyChord::plain(KeyCode::Char('+'))));
        assert_eq!(
            KeyChord::parse("ctrl++"),
            Some(KeyChord {
                code: KeyCode::Char('+'),
                modifiers: KeyModifiers::CONTROL,
            })
        );
        assert_eq!(KeyChord::parse("fx"), None);
        assert_eq!(KeyChord::parse("ab"), None);
    }

    #[test]
    fn releases_are_ignored() {
        let keymap = Keymap::defaults();
        let mut event = press(KeyCode::Char('q'), KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(keymap.lookup(&event), None);
    }
}
