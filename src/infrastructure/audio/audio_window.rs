use std::ops::Range;

use super::audio_decoder::TARGET_SAMPLE_RATE;

/// Whisper decodes fixed 30 second windows.
pub const WINDOW_SECS: usize = 30;
pub const WINDOW_SAMPLES: usize = WINDOW_SECS * TARGET_SAMPLE_RATE as usize;

/// Windows quieter than this RMS are treated as non-speech when VAD is on.
pub const SILENCE_RMS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioWindow {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl AudioWindow {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn start_secs(&self) -> f64 {
        self.start as f64 / TARGET_SAMPLE_RATE as f64
    }

    pub fn end_secs(&self) -> f64 {
        self.end as f64 / TARGET_SAMPLE_RATE as f64
    }
}

/// Splits PCM into decode windows, dropping near-silent ones when `vad_filter` is set.
pub fn plan_windows(samples: &[f32], vad_filter: bool) -> Vec<AudioWindow> {
    samples
        .chunks(WINDOW_SAMPLES)
        .enumerate()
        .filter(|(_, chunk)| !vad_filter || rms(chunk) >= SILENCE_RMS)
        .map(|(index, chunk)| {
            let start = index * WINDOW_SAMPLES;
            AudioWindow {
                index,
                start,
                end: start + chunk.len(),
            }
        })
        .collect()
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Picks the most likely token and its log-probability from raw logits.
pub fn greedy_token(logits: &[f32]) -> Option<(u32, f64)> {
    let (best, max) = logits
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let max = max as f64;
    let sum_exp: f64 = logits
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| (v as f64 - max).exp())
        .sum();

    Some((best as u32, -sum_exp.ln()))
}
