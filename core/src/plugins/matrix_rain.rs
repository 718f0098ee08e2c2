//! Falling-glyph "digital rain".

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::{rng_for, ContentSource, Frame, Line, Tone};
use crate::types::resolved::ResolvedPluginConfig;

const GLYPHS: &str = "ｱｲｳｴｵｶｷｸｹｺｻｼｽｾｿﾀﾁﾂﾃﾄﾅﾆﾇﾈﾉﾊﾋﾌﾍﾎﾏﾐﾑﾒﾓﾔﾕﾖﾗﾘﾙﾚﾛﾜﾝ0123456789";


struct Drop {
    x: usize,
    y: f64,
    speed: f64,
    trail: Vec<char>,
}


pub struct MatrixRain {
    density: f64,
    interval: Duration,
    width: usize,
    height: usize,
    drops: Vec<Drop>,
    glyphs: Vec<char>,
    rng: SmallRng,
}


impl MatrixRain {
    pub fn new(config: &ResolvedPluginConfig) -> Self {
        MatrixRain {
            density: config.f64_or("density", 0.1).max(0.0),
            interval: config.secs_or("refresh_rate", 0.1),
            width: 0,
            height: 0,
            drops: Vec::new(),
            glyphs: GLYPHS.chars().collect(),
            rng: rng_for(config),
        }
    }

    fn spawn(&mut self) -> Drop {
        let length = self.rng.random_range(5..=15);
        let mut drop = Drop {
            x: self.rng.random_range(0..self.width.max(1)),
            y: -self.rng.random_range(0.0..=self.height as f64),
            speed: self.rng.random_range(0.5..2.0),
            trail: Vec::with_capacity(length),
        };
        self.fill_trail(&mut drop, length);
        drop
    }

    fn fill_trail(&mut self, drop: &mut Drop, length: usize) {
        drop.trail.clear();
        for _ in 0..length {
            drop.trail.push(*self.glyphs.choose(&mut self.rng).unwrap_or(&'0'));
        }
    }

    fn drop_count(&self) -> usize {
        ((self.width as f64 * self.density) as usize).max(1)
    }
}


impl ContentSource for MatrixRain {
    fn tick(&mut self, _elapsed: Duration) {
        let mut drops = std::mem::take(&mut self.drops);
        for drop in &mut drops {
            drop.y += drop.speed;
            if drop.y - drop.trail.len() as f64 > self.height as f64 {
                *drop = self.spawn();
            } else {
                let length = drop.trail.len();
                self.fill_trail(drop, length);
            }
        }
        self.drops = drops;
    }

    fn render(&self) -> Frame {
        // 0 = empty, 1 = dim, 2 = green, 3 = head
        let mut cells = vec![vec![(' ', 0u8); self.width]; self.height];
        for drop in &self.drops {
            for (i, glyph) in drop.trail.iter().enumerate() {
                let y = (drop.y - i as f64).floor();
                if y < 0.0 || y >= self.height as f64 || drop.x >= self.width {
                    continue;
                }
                let level = match i {
                    0 => 3,
                    1 | 2 => 2,
                    _ => 1,
                };
                cells[y as usize][drop.x] = (*glyph, level);
            }
        }

        let mut frame = Frame::default();
        for row in cells {
            let mut line = Line::default();
            for (glyph, level) in row {
                let tone = match level {
                    3 => Tone::Bright,
                    2 => Tone::Green,
                    1 => Tone::DimGreen,
                    _ => Tone::Default,
                };
                line.push(glyph.to_string(), tone);
            }
            frame.push(line);
        }
        frame
    }

    fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = (width as usize, height as usize);
        if width == self.width && height == self.height && !self.drops.is_empty() {
            return;
        }
        self.width = width;
        self.height = height;
        let count = self.drop_count();
        self.drops = (0..count).map(|_| self.spawn()).collect();
    }

    fn tick_interval(&self) -> Duration {
        self.interval
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn rain(yaml: &str) -> MatrixRain {
        MatrixRain::new(&ResolvedPluginConfig::from_map(serde_yaml::from_str(yaml).unwrap()))
    }

    #[test]
    fn drop_count_follows_density() {
        let mut r = rain("density: 0.25\nseed: 3");
        r.resize(40, 10);
        assert_eq!(r.drops.len(), 10);
        let mut sparse = rain("density: 0.0\nseed: 3");
        sparse.resize(40, 10);
        assert_eq!(sparse.drops.len(), 1);
    }

    #[test]
    fn frame_matches_area() {
        let mut r = rain("seed: 4");
        r.resize(20, 6);
        for _ in 0..30 {
            r.tick(Duration::from_millis(100));
        }
        let frame = r.render();
        assert_eq!(frame.lines.len(), 6);
        assert!(frame.lines.iter().all(|l| l.width() == 20));
    }

    #[test]
    fn drops_respawn_above_the_top() {
        let mut r = rain("seed: 5");
        r.resize(10, 4);
        for _ in 0..200 {
            r.tick(Duration::from_millis(100));
        }
        for drop in &r.drops {
            assert!(drop.y - drop.trail.len() as f64 <= 4.0 + 2.0);
            assert!((5..=15).contains(&drop.trail.len()));
        }
    }
}
