use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::StreamExt;

use crate::application::ports::{
    TranscribeOptions, Transcription, TranscriptionEngine, TranscriptionError, TranscriptionInfo,
};
use crate::domain::{TranscriptResponse, TranscriptSegment};
use crate::infrastructure::audio::{process_env, resolve_model_cache_dir};
use crate::infrastructure::observability::{format_bytes, format_seconds};

use super::rtf_estimator::RtfEstimator;
use super::transcript_mapper::map_segment;

/// An upload already spooled to disk, plus what the client told us about it.
#[derive(Debug, Clone, Copy)]
pub struct AudioUpload<'a> {
    pub path: &'a Path,
    pub filename: &'a str,
    pub content_type: Option<&'a str>,
    pub size_bytes: u64,
    /// When the request arrived; elapsed time for the RTF is measured from here.
    pub received_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeRequest {
    pub language: Option<String>,
    pub beam_size: u8,
    pub vad_filter: bool,
}

#[derive(Debug, Clone)]
pub struct TranscriptionServiceConfig {
    pub model_name: String,
    /// Confidence, word timings, estimate logging and model details.
    pub verbose: bool,
    pub timeout: Option<Duration>,
}

pub struct TranscriptionService {
    engine: Arc<dyn TranscriptionEngine>,
    config: TranscriptionServiceConfig,
    rtf: RtfEstimator,
    model_details_logged: Mutex<bool>,
}

impl TranscriptionService {
    pub fn new(
        engine: Arc<dyn TranscriptionEngine>,
        config: TranscriptionServiceConfig,
        rtf: RtfEstimator,
    ) -> Self {
        tracing::debug!(
            model = %config.model_name,
            verbose = config.verbose,
            rtf_default = rtf.estimate(),
            rtf_alpha = rtf.alpha(),
            "Transcription service configured"
        );

        Self {
            engine,
            config,
            rtf,
            model_details_logged: Mutex::new(false),
        }
    }

    pub fn rtf_estimator(&self) -> &RtfEstimator {
        &self.rtf
    }

    /// Transcribes a spooled upload. Failures are logged here and returned unchanged.
    pub async fn transcribe(
        &self,
        upload: &AudioUpload<'_>,
        request: TranscribeRequest,
    ) -> Result<TranscriptResponse, TranscriptionError> {
        match self.run(upload, request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    details = ?e,
                    filename = %upload.filename,
                    "Transcribe failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        upload: &AudioUpload<'_>,
        request: TranscribeRequest,
    ) -> Result<TranscriptResponse, TranscriptionError> {
        if self.config.verbose {
            self.log_model_details_once();
        }

        tracing::info!(
            filename = %upload.filename,
            content_type = ?upload.content_type,
            size = %format_bytes(upload.size_bytes),
            model = %self.config.model_name,
            language = ?request.language,
            beam_size = request.beam_size,
            vad_filter = request.vad_filter,
            "Transcribe request"
        );

        let options = TranscribeOptions {
            language: request.language,
            beam_size: request.beam_size,
            vad_filter: request.vad_filter,
            word_timestamps: self.config.verbose,
        };

        let (info, segments) = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.collect(upload.path, &options))
                .await
                .map_err(|_| TranscriptionError::TimedOut(limit.as_secs()))??,
            None => self.collect(upload.path, &options).await?,
        };

        let elapsed = upload.received_at.elapsed().as_secs_f64();
        match known_duration(&info) {
            Some(duration) => {
                let rtf = elapsed / duration;
                if rtf > 0.0 {
                    self.rtf.update(rtf);
                }
                tracing::info!(
                    elapsed = %format_seconds(elapsed),
                    rtf = %format!("{:.2}", rtf),
                    "Transcribe complete"
                );
            }
            None => {
                tracing::info!(elapsed = %format_seconds(elapsed), "Transcribe complete");
            }
        }

        Ok(TranscriptResponse::from_segments(info.language, segments))
    }

    /// Runs the engine and drains its segment stream.
    async fn collect(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<(TranscriptionInfo, Vec<TranscriptSegment>), TranscriptionError> {
        let Transcription { info, mut segments } =
            self.engine.transcribe(audio_path, options).await?;

        if self.config.verbose {
            self.log_estimate(&info);
        }

        let mut out = Vec::new();
        while let Some(segment) = segments.next().await {
            out.push(map_segment(segment?, self.config.verbose));
        }

        Ok((info, out))
    }

    fn log_estimate(&self, info: &TranscriptionInfo) {
        match known_duration(info) {
            Some(duration) => {
                tracing::info!(
                    audio_duration = %format!("{:.2}s", duration),
                    rtf_estimate = %format!("{:.2}", self.rtf.estimate()),
                    estimated_time = %format_seconds(self.rtf.estimate_processing_secs(duration)),
                    "Transcribe estimate"
                );
            }
            None => tracing::info!("Transcribe estimate: audio_duration unavailable"),
        }
    }

    /// Logs which model is in use, once per service; concurrent first calls
    /// race on the flag under one lock so only the winner logs.
    fn log_model_details_once(&self) {
        {
            let mut logged = self
                .model_details_logged
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *logged {
                return;
            }
            *logged = true;
        }

        let model = Path::new(&self.config.model_name);
        if model.exists() {
            let path = std::path::absolute(model).unwrap_or_else(|_| model.to_path_buf());
            tracing::info!(model_path = %path.display(), "Whisper model (local path)");
        } else {
            tracing::info!(model = %self.config.model_name, "Whisper model");
            tracing::info!(
                cache_dir = %resolve_model_cache_dir(process_env).display(),
                "Hugging Face cache dir"
            );
        }
    }
}

fn known_duration(info: &TranscriptionInfo) -> Option<f64> {
    info.duration.filter(|d| d.is_finite() && *d > 0.0)
}
