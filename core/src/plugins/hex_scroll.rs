//! Scrolling hexadecimal dump.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::effects::Effect;
use super::{rng_for, ContentSource, Frame, Line, Tone};
use crate::types::resolved::ResolvedPluginConfig;


pub struct HexScroll {
    columns_wanted: usize,
    columns: usize,
    tone: Tone,
    effects: Vec<Effect>,
    interval: Duration,
    lines: Vec<String>,
    height: usize,
    frame_no: u64,
    effect_seed: u64,
    rng: SmallRng,
}


impl HexScroll {
    pub fn new(config: &ResolvedPluginConfig) -> Self {
        let mut rng = rng_for(config);
        HexScroll {
            columns_wanted: config.u64_or("columns", 16) as usize,
            columns: 0,
            tone: scheme_tone(config.str_or("color_scheme", "matrix")),
            effects: Effect::parse_list(&config.str_list("effects")),
            interval: config.secs_or("refresh_rate", 0.2),
            lines: Vec::new(),
            height: 0,
            frame_no: 0,
            effect_seed: rng.random(),
            rng,
        }
    }

    fn hex_line(&mut self) -> String {
        (0..self.columns)
            .map(|_| format!("{:02X}", self.rng.random::<u8>()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}


fn scheme_tone(scheme: &str) -> Tone {
    match scheme {
        "amber" => Tone::Yellow,
        "blue" => Tone::Cyan,
        "matrix" => Tone::Green,
        _ => Tone::Default,
    }
}


impl ContentSource for HexScroll {
    fn tick(&mut self, _elapsed: Duration) {
        self.frame_no += 1;
        if self.lines.is_empty() {
            return;
        }
        self.lines.remove(0);
        let line = self.hex_line();
        self.lines.push(line);
    }

    fn render(&self) -> Frame {
        let mut frame = Frame {
            lines: self
                .lines
                .iter()
                .map(|l| Line::styled(l.clone(), self.tone))
                .collect(),
        };
        if !self.effects.is_empty() {
            // Effects draw from a per-frame stream so render stays `&self`.
            let mut rng = SmallRng::seed_from_u64(self.effect_seed ^ self.frame_no);
            for effect in &self.effects {
                frame = effect.apply(frame, self.frame_no, &mut rng);
            }
        }
        frame
    }

    fn resize(&mut self, width: u16, height: u16) {
        let columns = self.columns_wanted.min(width as usize / 3);
        let height = height as usize;
        if columns == self.columns && height == self.height {
            return;
        }
        let regenerate = columns != self.columns;
        self.columns = columns;
        self.height = height;
        if regenerate {
            self.lines.clear();
        }
        while self.lines.len() < height {
            let line = self.hex_line();
            self.lines.push(line);
        }
        self.lines.truncate(height);
    }

    fn tick_interval(&self) -> Duration {
        self.interval
    }
}
