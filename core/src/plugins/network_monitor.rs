//! Synthetic network interface counters.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;

use super::{rng_for, ContentSource, Frame, Line, Tone};
use crate::types::resolved::ResolvedPluginConfig;


pub struct NetworkMonitor {
    interface: String,
    interval: Duration,
    uptime: Duration,
    counters: [u64; 4],
    rng: SmallRng,
}


impl NetworkMonitor {
    pub fn new(config: &ResolvedPluginConfig) -> Self {
        let mut monitor = NetworkMonitor {
            interface: config.str_or("interface", "eth0").to_string(),
            interval: config.secs_or("refresh_rate", 1.0),
            uptime: Duration::ZERO,
            counters: [0; 4],
            rng: rng_for(config),
        };
        monitor.sample();
        monitor
    }

    fn sample(&mut self) {
        self.counters = [
            self.rng.random_range(1_000_000..=9_999_999),
            self.rng.random_range(500_000..=5_000_000),
            self.rng.random_range(1_000..=9_999),
            self.rng.random_range(800..=8_000),
        ];
    }
}


impl ContentSource for NetworkMonitor {
    fn tick(&mut self, elapsed: Duration) {
        self.uptime += elapsed;
        self.sample();
    }

    fn render(&self) -> Frame {
        let [rx_bytes, tx_bytes, rx_packets, tx_packets] = self.counters;
        let mut frame = Frame::default();
        frame.push(Line::styled(format!("NETWORK MONITOR - {}", self.interface), Tone::BoldCyan));
        frame.push(Line::styled("━".repeat(34), Tone::Dim));
        frame.push(Line::raw(format!("Uptime: {:>8}s", self.uptime.as_secs())));
        frame.push(Line::raw(format!("RX Bytes: {rx_bytes:>10}")));
        frame.push(Line::raw(format!("TX Bytes: {tx_bytes:>10}")));
        frame.push(Line::raw(format!("RX Packets: {rx_packets:>8}")));
        frame.push(Line::raw(format!("TX Packets: {tx_packets:>8}")));
        let mut status = Line::raw("Status: ");
        status.push("CONNECTED", Tone::Green);
        frame.push(status);
        frame
    }

    fn resize(&mut self, _width: u16, _height: u16) {}

    fn tick_interval(&self) -> Duration {
        self.interval
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_interface() {
        let cfg = ResolvedPluginConfig::from_map(
            serde_yaml::from_str("interface: wlan0\nseed: 1\nrefresh_rate: 2").unwrap(),
        );
        let mut net = NetworkMonitor::new(&cfg);
        net.tick(Duration::from_secs(2));
        let text = net.render().plain();
        assert!(text.starts_with("NETWORK MONITOR - wlan0"));
        assert!(text.contains("Uptime:        2s"));
        assert!(text.ends_with("Status: CONNECTED"));
        assert_eq!(net.tick_interval(), Duration::from_secs(2));
    }
}
