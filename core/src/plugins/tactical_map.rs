//! Procedural tactical map with a roving crosshair.
//!
//! The map is generated against a 60×30 reference layout and scaled to the
//! tile: a continent and three islands built from jittered ellipses, outline
//! glyphs on every coast cell, seven named landmarks and a queue of targets
//! sampled on land. The crosshair moves to the next target every
//! `target_interval` seconds.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;

use super::{rng_for, ContentSource, Frame, Line, Tone};
use crate::types::resolved::ResolvedPluginConfig;

const REFERENCE_WIDTH: usize = 60;
const REFERENCE_HEIGHT: usize = 30;

/// Header and footer rows around the map body.
const CHROME_ROWS: u16 = 8;

const TARGET_MARGIN: usize = 5;
const TARGET_ATTEMPTS: usize = 100;

/// `(x, y, width, height)` on the reference grid.
const LANDMASSES: [(usize, usize, usize, usize); 4] = [
    (20, 15, 30, 20),
    (45, 8, 12, 10),
    (8, 22, 10, 6),
    (50, 20, 8, 6),
];

const LANDMARKS: [(usize, usize, &str); 7] = [
    (18, 10, "ALPHA"),
    (28, 18, "BRAVO"),
    (45, 8, "CHARLIE"),
    (10, 22, "DELTA"),
    (35, 14, "ECHO"),
    (22, 20, "FOXTROT"),
    (50, 20, "GOLF"),
];

const PULSE: [char; 4] = ['⊕', '⊗', '⊙', '◉'];
const STATUS: [&str; 3] = ["TRACKING", "LOCKED", "SCANNING"];
const PROGRESS_CELLS: usize = 10;


#[derive(Debug, Clone, PartialEq, Eq)]
struct Landmark {
    x: usize,
    y: usize,
    name: &'static str,
}


pub struct TacticalMap {
    target_interval: Duration,
    num_coordinates: usize,
    width: usize,
    height: usize,
    land: Vec<Vec<bool>>,
    boundaries: Vec<Vec<Option<char>>>,
    landmarks: Vec<Landmark>,
    targets: Vec<(usize, usize)>,
    current: usize,
    since_switch: Duration,
    clock: Duration,
    rng: SmallRng,
}


impl TacticalMap {
    pub fn new(config: &ResolvedPluginConfig) -> Self {
        let mut map = TacticalMap {
            target_interval: config.secs_or("target_interval", 5.0),
            num_coordinates: config.u64_or("num_coordinates", 3) as usize,
            width: REFERENCE_WIDTH,
            height: REFERENCE_HEIGHT,
            land: Vec::new(),
            boundaries: Vec::new(),
            landmarks: Vec::new(),
            targets: Vec::new(),
            current: 0,
            since_switch: Duration::ZERO,
            clock: Duration::ZERO,
            rng: rng_for(config),
        };
        map.generate();
        map
    }

    pub fn target_interval(&self) -> Duration {
        self.target_interval
    }

    /// Map body dimensions in cells.
    pub fn map_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn targets(&self) -> &[(usize, usize)] {
        &self.targets
    }

    pub fn current_target(&self) -> Option<(usize, usize)> {
        self.targets.get(self.current).copied()
    }

    pub fn is_land(&self, x: usize, y: usize) -> bool {
        self.land.get(y).and_then(|row| row.get(x)).copied().unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    fn generate(&mut self) {
        self.land = vec![vec![false; self.width]; self.height];
        for (x, y, w, h) in LANDMASSES {
            let (x, y) = self.scale(x, y);
            let (w, h) = self.scale(w, h);
            self.stamp_landmass(x, y, w.max(2), h.max(2));
        }
        self.landmarks = LANDMARKS
            .iter()
            .map(|&(x, y, name)| {
                let (x, y) = self.scale(x, y);
                Landmark { x, y, name }
            })
            .collect();
        self.boundaries = self.trace_boundaries();
        self.sample_targets();
        self.current = 0;
        self.since_switch = Duration::ZERO;
        tracing::debug!(
            width = self.width,
            height = self.height,
            targets = self.targets.len(),
            "generated tactical map"
        );
    }

    fn scale(&self, x: usize, y: usize) -> (usize, usize) {
        (x * self.width / REFERENCE_WIDTH, y * self.height / REFERENCE_HEIGHT)
    }

    /// Three overlapping ellipses around a jittered centre.
    fn stamp_landmass(&mut self, x: usize, y: usize, w: usize, h: usize) {
        let (jx, jy) = ((w / 4) as i64, (h / 4) as i64);
        let (half_w, half_h) = (w as f64 / 2.0, h as f64 / 2.0);
        for _ in 0..3 {
            let cx = x as i64 + self.rng.random_range(-jx..=jx);
            let cy = y as i64 + self.rng.random_range(-jy..=jy);
            let rows = (cy - (h / 2) as i64).max(0)..(cy + (h / 2) as i64).min(self.height as i64);
            let cols = (cx - (w / 2) as i64).max(0)..(cx + (w / 2) as i64).min(self.width as i64);
            for dy in rows {
                for dx in cols.clone() {
                    let ex = (dx - cx).abs() as f64 / half_w;
                    let ey = (dy - cy).abs() as f64 / half_h;
                    let dist = (ex * ex + ey * ey).sqrt();
                    if dist < 1.0 + self.rng.random_range(-0.3..0.1) {
                        self.land[dy as usize][dx as usize] = true;
                    }
                }
            }
        }
    }

    fn land_at(&self, x: i64, y: i64) -> Option<bool> {
        if x < 0 || y < 0 {
            return None;
        }
        self.land.get(y as usize).and_then(|row| row.get(x as usize)).copied()
    }

    fn trace_boundaries(&self) -> Vec<Vec<Option<char>>> {
        let mut out = vec![vec![None; self.width]; self.height];
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.land[y][x] {
                    continue;
                }
                let (xi, yi) = (x as i64, y as i64);
                let coastal = NEIGHBOURS
                    .iter()
                    .any(|(dx, dy)| self.land_at(xi + dx, yi + dy) == Some(false));
                if !coastal {
                    continue;
                }
                let at = |dx: i64, dy: i64| self.land_at(xi + dx, yi + dy).unwrap_or(false);
                out[y][x] = Some(boundary_glyph(
                    Cardinals {
                        n: at(0, -1),
                        s: at(0, 1),
                        e: at(1, 0),
                        w: at(-1, 0),
                    },
                    Diagonals {
                        ne: at(1, -1),
                        nw: at(-1, -1),
                        se: at(1, 1),
                        sw: at(-1, 1),
                    },
                ));
            }
        }
        out
    }

    /// Rejection-sample land cells inside the margin. A partial set is kept
    /// when the attempts run out.
    fn sample_targets(&mut self) {
        self.targets.clear();
        let max_x = self.width.saturating_sub(TARGET_MARGIN);
        let max_y = self.height.saturating_sub(TARGET_MARGIN);
        if max_x < TARGET_MARGIN || max_y < TARGET_MARGIN {
            return;
        }
        for _ in 0..TARGET_ATTEMPTS {
            if self.targets.len() >= self.num_coordinates {
                break;
            }
            let x = self.rng.random_range(TARGET_MARGIN..=max_x);
            let y = self.rng.random_range(TARGET_MARGIN..=max_y);
            if self.is_land(x, y) {
                self.targets.push((x, y));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    fn cell(&self, x: usize, y: usize, phase: usize) -> (char, Tone) {
        if let Some((tx, ty)) = self.current_target() {
            if x == tx && y == ty {
                return (PULSE[phase % PULSE.len()], Tone::Red);
            }
            if x == tx {
                let glyph = if y.abs_diff(ty) == 1 { '║' } else { '│' };
                return (glyph, Tone::Red);
            }
            if y == ty {
                let glyph = if x.abs_diff(tx) == 1 { '═' } else { '─' };
                return (glyph, Tone::Red);
            }
        }
        if self.landmarks.iter().any(|l| l.x == x && l.y == y) {
            return ('◉', Tone::Yellow);
        }
        match self.boundaries[y][x] {
            Some(glyph) => (glyph, Tone::Green),
            None => (' ', Tone::Default),
        }
    }

    fn status_line(&self) -> String {
        let secs = self.target_interval.as_secs_f64();
        let remaining = (secs - self.since_switch.as_secs_f64()).max(0.0);
        let filled = (((1.0 - remaining / secs) * PROGRESS_CELLS as f64) as usize).min(PROGRESS_CELLS);
        let progress = format!("[{}{}]", "█".repeat(filled), "░".repeat(PROGRESS_CELLS - filled));
        let (coords, status) = match self.current_target() {
            Some((x, y)) => (format!("[{x:02},{y:02}]"), STATUS[self.current % STATUS.len()]),
            None => ("[--,--]".to_string(), "SCANNING"),
        };
        format!("TARGET: {coords} | STATUS: {status} | NEXT: {remaining:.1}s {progress}")
    }
}


const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];


#[derive(Debug, Clone, Copy, Default)]
struct Cardinals {
    n: bool,
    s: bool,
    e: bool,
    w: bool,
}


#[derive(Debug, Clone, Copy, Default)]
struct Diagonals {
    ne: bool,
    nw: bool,
    se: bool,
    sw: bool,
}


/// Outline glyph for a coast cell from its land neighbours.
fn boundary_glyph(c: Cardinals, d: Diagonals) -> char {
    match (c.n, c.s, c.e, c.w) {
        (true, true, true, true) => '┼',
        (true, true, true, false) => '├',
        (true, true, false, true) => '┤',
        (true, false, true, true) => '┴',
        (false, true, true, true) => '┬',
        (true, true, false, false) => '│',
        (false, false, true, true) => '─',
        (true, false, true, false) => '└',
        (true, false, false, true) => '┘',
        (false, true, true, false) => '┌',
        (false, true, false, true) => '┐',
        (true, false, false, false) => '╵',
        (false, true, false, false) => '╷',
        (false, false, true, false) => '╶',
        (false, false, false, true) => '╴',
        (false, false, false, false) => {
            if (d.ne || d.se) && (d.nw || d.sw) {
                '─'
            } else if (d.ne || d.nw) && (d.se || d.sw) {
                '│'
            } else {
                '·'
            }
        }
    }
}


impl ContentSource for TacticalMap {
    fn tick(&mut self, elapsed: Duration) {
        self.clock += elapsed;
        self.since_switch += elapsed;
        if self.since_switch >= self.target_interval {
            self.since_switch = Duration::ZERO;
            if !self.targets.is_empty() {
                self.current = (self.current + 1) % self.targets.len();
            }
        }
    }

    fn render(&self) -> Frame {
        let clock = self.clock.as_secs_f64();
        let blink = if (clock * 2.0) as u64 % 2 == 1 { '●' } else { '○' };
        let phase = (clock * 4.0) as usize;
        let mut frame = Frame::default();

        frame.push(Line::styled(format!("TACTICAL MAP DISPLAY - SECTOR 7G {blink}"), Tone::BoldCyan));
        frame.push(Line::styled("═".repeat(self.width), Tone::Cyan));
        frame.push(Line::styled(self.status_line(), Tone::Yellow));
        frame.push(Line::styled("─".repeat(self.width), Tone::Dim));

        for y in 0..self.height {
            let mut line = Line::default();
            for x in 0..self.width {
                let (glyph, tone) = self.cell(x, y, phase);
                line.push(glyph.to_string(), tone);
            }
            frame.push(line);
        }

        frame.push(Line::styled("─".repeat(self.width), Tone::Dim));
        frame.push(Line::styled(
            "LEGEND: ◉ City │ ⊕ Target │ ─│ Crosshair │ Land boundaries shown",
            Tone::Dim,
        ));
        let (tx, ty) = self.current_target().unwrap_or((0, 0));
        let distances: Vec<String> = self
            .landmarks
            .iter()
            .take(4)
            .map(|l| {
                let dx = l.x as f64 - tx as f64;
                let dy = l.y as f64 - ty as f64;
                format!("{}:{}km", l.name, (dx * dx + dy * dy).sqrt() as u64)
            })
            .collect();
        frame.push(Line::raw(format!("CITIES: {}", distances.join(" │ "))));
        if self.targets.len() > 1 {
            let prev = (self.current + self.targets.len() - 1) % self.targets.len();
            let (px, py) = self.targets[prev];
            frame.push(Line::raw(format!(
                "PREV TARGET: [{px:02},{py:02}] │ TARGETS IN QUEUE: {}",
                self.targets.len() - 1
            )));
        }
        frame
    }

    fn resize(&mut self, width: u16, height: u16) {
        let w = width.clamp(40, 80) as usize;
        let h = height.saturating_sub(CHROME_ROWS).clamp(15, 35) as usize;
        if (w, h) != (self.width, self.height) {
            self.width = w;
            self.height = h;
            self.generate();
        }
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(100)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn map(yaml: &str) -> TacticalMap {
        TacticalMap::new(&ResolvedPluginConfig::from_map(serde_yaml::from_str(yaml).unwrap()))
    }

    #[test]
    fn defaults() {
        let m = map("seed: 1");
        assert_eq!(m.target_interval(), Duration::from_secs(5));
        assert_eq!(m.map_size(), (60, 30));
        assert!(m.targets().len() <= 3);
    }

    #[test]
    fn float_target_interval() {
        let m = map("target_interval: 2.0\nseed: 1");
        assert_eq!(m.target_interval(), Duration::from_secs(2));
    }

    #[test]
    fn resize_clamps_map_body() {
        let mut m = map("seed: 2");
        m.resize(200, 100);
        assert_eq!(m.map_size(), (80, 35));
        m.resize(10, 10);
        assert_eq!(m.map_size(), (40, 15));
        m.resize(50, 30);
        assert_eq!(m.map_size(), (50, 22));
    }

    #[test]
    fn targets_are_land_inside_margin() {
        for seed in 0..20 {
            let mut m = map(&format!("seed: {seed}\nnum_coordinates: 6"));
            m.resize(70, 34);
            let (w, h) = m.map_size();
            for &(x, y) in m.targets() {
                assert!(m.is_land(x, y));
                assert!((5..=w - 5).contains(&x));
                assert!((5..=h - 5).contains(&y));
            }
        }
    }

    #[test]
    fn boundaries_only_on_coast() {
        let m = map("seed: 3");
        for y in 0..m.height {
            for x in 0..m.width {
                if m.boundaries[y][x].is_some() {
                    assert!(m.land[y][x]);
                }
            }
        }
    }

    #[test]
    fn glyph_table() {
        let none = Diagonals::default();
        let c = |n, s, e, w| Cardinals { n, s, e, w };
        assert_eq!(boundary_glyph(c(true, true, true, true), none), '┼');
        assert_eq!(boundary_glyph(c(true, true, false, false), none), '│');
        assert_eq!(boundary_glyph(c(false, true, true, false), none), '┌');
        assert_eq!(boundary_glyph(c(false, false, false, true), none), '╴');
        let d = Diagonals { ne: true, sw: true, ..Diagonals::default() };
        assert_eq!(boundary_glyph(Cardinals::default(), d), '─');
        let d = Diagonals { ne: true, nw: true, ..Diagonals::default() };
        assert_eq!(boundary_glyph(Cardinals::default(), d), '─');
        let d = Diagonals { ne: true, se: true, ..Diagonals::default() };
        assert_eq!(boundary_glyph(Cardinals::default(), d), '│');
        let d = Diagonals { sw: true, ..Diagonals::default() };
        assert_eq!(boundary_glyph(Cardinals::default(), d), '·');
    }

    #[test]
    fn target_advances_each_interval() {
        let mut m = map("target_interval: 2.0\nseed: 4");
        m.targets = vec![(10, 10), (20, 12), (30, 14)];
        m.current = 0;
        for _ in 0..19 {
            m.tick(Duration::from_millis(100));
        }
        assert_eq!(m.current_target(), Some((10, 10)));
        m.tick(Duration::from_millis(100));
        assert_eq!(m.current_target(), Some((20, 12)));
        for _ in 0..40 {
            m.tick(Duration::from_millis(100));
        }
        assert_eq!(m.current_target(), Some((10, 10)));
    }

    #[test]
    fn render_layout() {
        let mut m = map("seed: 5");
        m.targets = vec![(10, 10), (20, 12)];
        let frame = m.render();
        assert_eq!(frame.lines.len(), 4 + 30 + 4);
        assert!(frame.lines[0].plain().starts_with("TACTICAL MAP DISPLAY"));
        assert!(frame.lines[2].plain().starts_with("TARGET: [10,10] | STATUS: TRACKING"));
        let row = frame.lines[4 + 10].plain();
        let chars: Vec<char> = row.chars().collect();
        assert_eq!(chars[10], '⊕');
        assert_eq!(chars[9], '═');
        assert_eq!(chars[0], '─');
        assert_eq!(frame.lines[4 + 9].plain().chars().nth(10), Some('║'));
        assert!(frame.lines.last().unwrap().plain().contains("TARGETS IN QUEUE: 1"));
    }

    #[test]
    fn no_targets_means_scanning_without_crosshair() {
        let mut m = map("seed: 6");
        m.targets.clear();
        m.tick(Duration::from_secs(10));
        let frame = m.render();
        assert!(frame.lines[2].plain().contains("STATUS: SCANNING"));
        assert!(frame.lines[4..34].iter().all(|l| !l.plain().contains('⊕')));
        assert_eq!(frame.lines.len(), 4 + 30 + 3);
    }
}
