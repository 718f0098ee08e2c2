//! Synthetic system statistics panel.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;

use super::{rng_for, ContentSource, Frame, Line, Tone};
use crate::types::resolved::ResolvedPluginConfig;


#[derive(Debug, Clone, Copy, PartialEq)]
struct Stats {
    cpu: u32,
    memory: u32,
    network_rx: u64,
    network_tx: u64,
    disk_read: u64,
    disk_write: u64,
    processes: u32,
    threads: u32,
}


pub struct SystemMonitor {
    interval: Duration,
    stats: Stats,
    uptime: Duration,
    rng: SmallRng,
}


impl SystemMonitor {
    pub fn new(config: &ResolvedPluginConfig) -> Self {
        let mut rng = rng_for(config);
        let stats = sample(&mut rng);
        SystemMonitor {
            interval: config.secs_or("refresh_rate", 1.0),
            stats,
            uptime: Duration::ZERO,
            rng,
        }
    }
}


fn sample(rng: &mut impl Rng) -> Stats {
    Stats {
        cpu: rng.random_range(10..=90),
        memory: rng.random_range(30..=80),
        network_rx: rng.random_range(1_000..=9_999_999),
        network_tx: rng.random_range(1_000..=9_999_999),
        disk_read: rng.random_range(100..=999_999),
        disk_write: rng.random_range(100..=999_999),
        processes: rng.random_range(100..=500),
        threads: rng.random_range(500..=2_000),
    }
}


/// Move 30% of the way from `old` towards `new`.
fn smooth(old: u32, new: u32) -> u32 {
    (old as f64 + (new as f64 - old as f64) * 0.3) as u32
}


fn bar(percent: u32) -> String {
    let filled = (percent / 10).min(10) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(10 - filled))
}


/// Thousands separators, e.g. `1234567` → `1,234,567`.
fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}


fn label_line(label: &str, tone: Tone, rest: String) -> Line {
    let mut line = Line::styled(label, tone);
    line.push(rest, Tone::Default);
    line
}


impl ContentSource for SystemMonitor {
    fn tick(&mut self, elapsed: Duration) {
        self.uptime += elapsed;
        let next = sample(&mut self.rng);
        self.stats = Stats {
            cpu: smooth(self.stats.cpu, next.cpu),
            memory: smooth(self.stats.memory, next.memory),
            ..next
        };
    }

    fn render(&self) -> Frame {
        let s = &self.stats;
        let secs = self.uptime.as_secs();
        let mut frame = Frame::default();
        frame.push(Line::styled("SYSTEM MONITOR", Tone::BoldCyan));
        frame.push(Line::styled("━".repeat(38), Tone::Dim));
        frame.push(Line::default());
        frame.push(label_line("CPU Usage:", Tone::Green, format!("      {:3}% {}", s.cpu, bar(s.cpu))));
        frame.push(label_line("Memory Usage:", Tone::Green, format!("   {:3}% {}", s.memory, bar(s.memory))));
        frame.push(Line::default());
        frame.push(Line::styled("Network:", Tone::Yellow));
        frame.push(Line::raw(format!("  RX: {:>10} bytes/s", grouped(s.network_rx))));
        frame.push(Line::raw(format!("  TX: {:>10} bytes/s", grouped(s.network_tx))));
        frame.push(Line::default());
        frame.push(Line::styled("Disk I/O:", Tone::Yellow));
        frame.push(Line::raw(format!("  Read:  {:>10} bytes/s", grouped(s.disk_read))));
        frame.push(Line::raw(format!("  Write: {:>10} bytes/s", grouped(s.disk_write))));
        frame.push(Line::default());
        frame.push(label_line("Processes:", Tone::Cyan, format!(" {:>5}", s.processes)));
        frame.push(label_line("Threads:", Tone::Cyan, format!("   {:>5}", s.threads)));
        frame.push(Line::default());
        frame.push(label_line(
            "Uptime:",
            Tone::Dim,
            format!(" {:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60),
        ));
        frame
    }

    fn resize(&mut self, _width: u16, _height: u16) {}

    fn tick_interval(&self) -> Duration {
        self.interval
    }
}
