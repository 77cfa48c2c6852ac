use std::sync::{Mutex, PoisonError};

pub const DEFAULT_RTF_ESTIMATE: f64 = 1.0;
pub const DEFAULT_RTF_ALPHA: f64 = 0.2;

/// Exponentially weighted moving average of the real-time factor
/// (processing wall time / audio duration) across completed requests.
///
/// The lock is only held for the read or the update itself, never across
/// engine work.
#[derive(Debug)]
pub struct RtfEstimator {
    default_estimate: f64,
    alpha: f64,
    average: Mutex<Option<f64>>,
}

impl RtfEstimator {
    pub fn new(default_estimate: f64, alpha: f64) -> Self {
        Self {
            default_estimate,
            alpha,
            average: Mutex::new(None),
        }
    }

    /// Current smoothed RTF, or the configured default before any observation.
    pub fn estimate(&self) -> f64 {
        let average = self.average.lock().unwrap_or_else(PoisonError::into_inner);
        average.unwrap_or(self.default_estimate)
    }

    pub fn update(&self, observed_rtf: f64) {
        let mut average = self.average.lock().unwrap_or_else(PoisonError::into_inner);
        *average = Some(match *average {
            None => observed_rtf,
            Some(prev) => self.alpha * observed_rtf + (1.0 - self.alpha) * prev,
        });
    }

    /// Forecast of processing seconds for `audio_duration` seconds of audio.
    pub fn estimate_processing_secs(&self, audio_duration: f64) -> f64 {
        audio_duration * self.estimate()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for RtfEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_RTF_ESTIMATE, DEFAULT_RTF_ALPHA)
    }
}
