//! Frame post-processing effects shared by text sources.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::{Frame, Line, Tone};

const GLITCH_GLYPHS: [char; 6] = ['█', '▀', '▄', '░', '▒', '▓'];


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Glitch,
    Pulse,
    Wave,
    MatrixFade,
}


impl Effect {
    pub fn parse(name: &str) -> Option<Effect> {
        match name.trim() {
            "glitch" => Some(Effect::Glitch),
            "pulse" => Some(Effect::Pulse),
            "wave" => Some(Effect::Wave),
            "matrix_fade" => Some(Effect::MatrixFade),
            _ => None,
        }
    }

    /// Parse a list of names, dropping unknown ones with a warning.
    pub fn parse_list(names: &[String]) -> Vec<Effect> {
        names
            .iter()
            .filter_map(|n| {
                let effect = Effect::parse(n);
                if effect.is_none() {
                    tracing::warn!(effect = %n, "unknown effect ignored");
                }
                effect
            })
            .collect()
    }

    pub fn apply(self, frame: Frame, frame_no: u64, rng: &mut impl Rng) -> Frame {
        match self {
            Effect::Glitch => glitch(frame, 0.1, rng),
            Effect::Pulse => pulse(frame, frame_no, 0.1),
            Effect::Wave => wave(frame, frame_no, 0.1),
            Effect::MatrixFade => matrix_fade(frame, frame_no, 0.05),
        }
    }
}


/// Substitute random block glyphs. With probability `1 - intensity` the
/// frame passes through untouched.
pub fn glitch(mut frame: Frame, intensity: f64, rng: &mut impl Rng) -> Frame {
    if rng.random::<f64>() > intensity {
        return frame;
    }
    for line in &mut frame.lines {
        if rng.random::<f64>() >= intensity {
            continue;
        }
        for span in &mut line.spans {
            span.text = span
                .text
                .chars()
                .map(|c| {
                    if rng.random::<f64>() < intensity {
                        *GLITCH_GLYPHS.choose(rng).unwrap_or(&c)
                    } else {
                        c
                    }
                })
                .collect();
        }
    }
    frame
}


/// Dim or brighten the whole frame on a sine cycle.
pub fn pulse(frame: Frame, frame_no: u64, speed: f64) -> Frame {
    let brightness = ((frame_no as f64 * speed).sin() + 1.0) / 2.0;
    if brightness < 0.3 {
        frame.tinted(Tone::Dim)
    } else if brightness < 0.7 {
        frame
    } else {
        frame.tinted(Tone::Bright)
    }
}


/// Indent each line by `3·sin`, clamped at zero.
pub fn wave(mut frame: Frame, frame_no: u64, speed: f64) -> Frame {
    for (i, line) in frame.lines.iter_mut().enumerate() {
        let offset = (3.0 * ((frame_no as f64 * speed + i as f64) * 0.5).sin()) as i64;
        if offset > 0 {
            let tone = line.spans.first().map(|s| s.tone).unwrap_or_default();
            let mut shifted = Line::styled(" ".repeat(offset as usize), tone);
            for span in line.spans.drain(..) {
                shifted.push(span.text, span.tone);
            }
            *line = shifted;
        }
    }
    frame
}


/// Fade cells out in a diagonal sine pattern.
pub fn matrix_fade(mut frame: Frame, frame_no: u64, speed: f64) -> Frame {
    for (y, line) in frame.lines.iter_mut().enumerate() {
        let mut x = 0usize;
        for span in &mut line.spans {
            span.text = span
                .text
                .chars()
                .map(|c| {
                    let fade = (((frame_no as f64 * speed + x as f64 + y as f64) * 0.3).sin() + 1.0) / 2.0;
                    x += 1;
                    if fade < 0.3 {
                        ' '
                    } else if fade < 0.6 {
                        '░'
                    } else if fade < 0.8 {
                        '▒'
                    } else {
                        c
                    }
                })
                .collect();
        }
    }
    frame
}
