//! Content sources: the procedural generators that fill tiles.
//!
//! A source owns its simulation state and produces a renderer-neutral
//! `Frame` on demand. The tile drives it: `resize` whenever the inner area
//! changes, `tick` from the scheduler at `tick_interval`, `render` on every
//! repaint.

pub mod effects;
pub mod hex_scroll;
pub mod log_scroll;
pub mod matrix_rain;
pub mod network_monitor;
pub mod system_monitor;
pub mod tactical_map;
pub mod ticker;

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::types::resolved::ResolvedPluginConfig;

pub use hex_scroll::HexScroll;
pub use log_scroll::LogScroll;
pub use matrix_rain::MatrixRain;
pub use network_monitor::NetworkMonitor;
pub use system_monitor::SystemMonitor;
pub use tactical_map::TacticalMap;
pub use ticker::TextTicker;


pub trait ContentSource {
    /// Advance the simulation by `elapsed` wall time.
    fn tick(&mut self, elapsed: Duration);

    fn render(&self) -> Frame;

    /// Fit the source to a new inner area. Sources reinitialize their state
    /// only when the dimensions actually change.
    fn resize(&mut self, width: u16, height: u16);

    fn tick_interval(&self) -> Duration;
}


pub type BoxedSource = Box<dyn ContentSource>;


/// Deterministic when the config carries a `seed`, entropy-seeded otherwise.
pub fn rng_for(config: &ResolvedPluginConfig) -> SmallRng {
    match config.seed() {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}


// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Renderer-neutral colour and emphasis tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Tone {
    #[default]
    Default,
    Dim,
    Bright,
    Green,
    DimGreen,
    Amber,
    Cyan,
    Red,
    Yellow,
    BoldCyan,
}


#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}


#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub spans: Vec<Span>,
}


impl Line {
    pub fn raw(text: impl Into<String>) -> Line {
        Line::styled(text, Tone::Default)
    }

    pub fn styled(text: impl Into<String>, tone: Tone) -> Line {
        Line {
            spans: vec![Span {
                text: text.into(),
                tone,
            }],
        }
    }

    pub fn push(&mut self, text: impl Into<String>, tone: Tone) -> &mut Self {
        let text = text.into();
        match self.spans.last_mut() {
            Some(last) if last.tone == tone => last.text.push_str(&text),
            _ => self.spans.push(Span { text, tone }),
        }
        self
    }

    /// Concatenated span text without styling.
    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.chars().count()).sum()
    }
}


#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub lines: Vec<Line>,
}


impl Frame {
    /// One default-toned line per `\n`-separated row.
    pub fn text(text: &str) -> Frame {
        Frame {
            lines: text.lines().map(Line::raw).collect(),
        }
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// Re-tone every span.
    pub fn tinted(mut self, tone: Tone) -> Frame {
        for span in self.lines.iter_mut().flat_map(|l| l.spans.iter_mut()) {
            span.tone = tone;
        }
        self
    }

    pub fn plain(&self) -> String {
        self.lines
            .iter()
            .map(Line::plain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
