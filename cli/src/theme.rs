//! Mapping from core tones and layout directives to ratatui styles.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

use blinken_core::plugins::Tone;
use blinken_core::response::NoticeLevel;


pub fn tone_style(tone: Tone) -> Style {
    let base = Style::default();
    match tone {
        Tone::Default => base,
        Tone::Dim => base.fg(Color::DarkGray),
        Tone::Bright => base.fg(Color::White).add_modifier(Modifier::BOLD),
        Tone::Green => base.fg(Color::Green),
        Tone::DimGreen => base.fg(Color::Green).add_modifier(Modifier::DIM),
        Tone::Amber => base.fg(Color::Rgb(255, 176, 0)),
        Tone::Cyan => base.fg(Color::Cyan),
        Tone::Red => base.fg(Color::Red),
        Tone::Yellow => base.fg(Color::Yellow),
        Tone::BoldCyan => base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
    }
}


/// Resolve a colour name from the layout section. The two theme variables
/// the default document uses are understood; anything else goes through
/// ratatui's parser (`red`, `light-blue`, `#00ff88`, `42`).
pub fn parse_color(name: &str, fallback: Color) -> Color {
    match name.trim() {
        "$primary" | "$accent" => Color::Cyan,
        "$surface-lighten-1" | "$surface" => Color::DarkGray,
        "$warning" => Color::Yellow,
        "$error" => Color::Red,
        other => Color::from_str(other).unwrap_or_else(|_| {
            tracing::warn!(color = other, "unrecognized colour");
            fallback
        }),
    }
}


/// `None` means no border at all.
pub fn border_type(style: &str) -> Option<BorderType> {
    match style.trim() {
        "none" => None,
        "rounded" | "round" => Some(BorderType::Rounded),
        "double" => Some(BorderType::Double),
        "thick" | "heavy" => Some(BorderType::Thick),
        _ => Some(BorderType::Plain),
    }
}


pub fn notice_style(level: NoticeLevel) -> Style {
    let color = match level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    };
    Style::default().fg(color)
}
