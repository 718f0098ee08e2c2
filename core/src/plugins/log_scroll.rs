//! Synthetic application log tail.

use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;

use super::{rng_for, ContentSource, Frame, Line, Tone};
use crate::types::resolved::ResolvedPluginConfig;

const MAX_LINES: usize = 100;

const MODULES: [&str; 9] = [
    "core.engine",
    "network.handler",
    "auth.validator",
    "data.processor",
    "cache.manager",
    "queue.worker",
    "api.gateway",
    "db.connector",
    "security.scanner",
];

const MESSAGES: [&str; 10] = [
    "Connection established",
    "Processing request",
    "Authentication successful",
    "Cache updated",
    "Query executed",
    "Task completed",
    "Handshake initiated",
    "Buffer flushed",
    "Checksum verified",
    "Pipeline activated",
];

const LEVELS: [&str; 4] = ["INFO", "WARN", "DEBUG", "ERROR"];

const FUNCTIONS: [&str; 4] = ["init", "process", "handle", "execute"];


pub struct LogScroll {
    interval: Duration,
    entries: VecDeque<Line>,
    height: usize,
    primed: bool,
    rng: SmallRng,
}


impl LogScroll {
    pub fn new(config: &ResolvedPluginConfig) -> Self {
        LogScroll {
            interval: config.secs_or("refresh_rate", 0.5),
            entries: VecDeque::with_capacity(MAX_LINES),
            height: 0,
            primed: false,
            rng: rng_for(config),
        }
    }

    fn entry(&mut self) -> Line {
        let pick = |rng: &mut SmallRng, items: &[&'static str]| -> &'static str {
            items.choose(rng).copied().unwrap_or_default()
        };
        let level = pick(&mut self.rng, &LEVELS);
        let module = pick(&mut self.rng, &MODULES);
        let message = pick(&mut self.rng, &MESSAGES);
        let function = pick(&mut self.rng, &FUNCTIONS);
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let template = [0usize, 1, 2].choose(&mut self.rng).copied().unwrap_or(0);
        let text = match template {
            0 => format!("[{level}] {timestamp} - {module}: {message}"),
            1 => format!("{timestamp} [{level}] {module} - {message}"),
            _ => format!("[{timestamp}] {module}.{function}() - {level}: {message}"),
        };
        Line::styled(text, level_tone(level))
    }

    fn append(&mut self) {
        let line = self.entry();
        self.entries.push_back(line);
        while self.entries.len() > MAX_LINES {
            self.entries.pop_front();
        }
    }
}


fn level_tone(level: &str) -> Tone {
    match level {
        "ERROR" => Tone::Red,
        "WARN" => Tone::Yellow,
        "DEBUG" => Tone::Dim,
        _ => Tone::Green,
    }
}


impl ContentSource for LogScroll {
    fn tick(&mut self, _elapsed: Duration) {
        self.append();
    }

    fn render(&self) -> Frame {
        let skip = self.entries.len().saturating_sub(self.height);
        Frame {
            lines: self.entries.iter().skip(skip).cloned().collect(),
        }
    }

    fn resize(&mut self, _width: u16, height: u16) {
        self.height = height as usize;
        if !self.primed {
            self.primed = true;
            for _ in 0..self.height.min(20) {
                self.append();
            }
        }
    }

    fn tick_interval(&self) -> Duration {
        self.interval
    }
}
