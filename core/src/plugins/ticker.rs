//! Rotating text lines, declared by plugin manifests.

use std::time::Duration;

use super::{ContentSource, Frame, Line, Tone};
use crate::types::resolved::ResolvedPluginConfig;


pub struct TextTicker {
    title: Option<String>,
    lines: Vec<String>,
    offset: usize,
    height: usize,
    interval: Duration,
}


impl TextTicker {
    pub fn new(config: &ResolvedPluginConfig) -> Self {
        TextTicker {
            title: config.get("title").and_then(|v| v.as_str()).map(str::to_string),
            lines: config.str_list("lines"),
            offset: 0,
            height: 0,
            interval: config.secs_or("refresh_rate", 1.0),
        }
    }
}


impl ContentSource for TextTicker {
    fn tick(&mut self, _elapsed: Duration) {
        if !self.lines.is_empty() {
            self.offset = (self.offset + 1) % self.lines.len();
        }
    }

    fn render(&self) -> Frame {
        let mut frame = Frame::default();
        let mut room = self.height;
        if let Some(title) = &self.title {
            frame.push(Line::styled(title.clone(), Tone::BoldCyan));
            room = room.saturating_sub(1);
        }
        let shown = room.min(self.lines.len());
        for i in 0..shown {
            let text = &self.lines[(self.offset + i) % self.lines.len()];
            frame.push(Line::styled(text.clone(), Tone::Green));
        }
        frame
    }

    fn resize(&mut self, _width: u16, height: u16) {
        self.height = height as usize;
    }

    fn tick_interval(&self) -> Duration {
        self.interval
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_rotate_under_title() {
        let cfg = ResolvedPluginConfig::from_map(
            serde_yaml::from_str("title: STATUS\nlines: [one, two, three]").unwrap(),
        );
        let mut ticker = TextTicker::new(&cfg);
        ticker.resize(40, 3);
        assert_eq!(ticker.render().plain(), "STATUS\none\ntwo");
        ticker.tick(Duration::from_secs(1));
        ticker.tick(Duration::from_secs(1));
        assert_eq!(ticker.render().plain(), "STATUS\nthree\none");
    }

    #[test]
    fn empty_ticker_renders_nothing() {
        let mut ticker = TextTicker::new(&ResolvedPluginConfig::default());
        ticker.resize(10, 5);
        ticker.tick(Duration::from_secs(1));
        assert!(ticker.render().lines.is_empty());
    }
}
