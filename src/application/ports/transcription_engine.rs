use std::io;
use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Decoding parameters passed through to the engine for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeOptions {
    pub language: Option<String>,
    pub beam_size: u8,
    pub vad_filter: bool,
    pub word_timestamps: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: None,
            beam_size: 5,
            vad_filter: true,
            word_timestamps: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedWord {
    pub start: f64,
    pub end: f64,
    pub word: String,
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Mean token log-probability, when the engine reports one.
    pub avg_logprob: Option<f64>,
    pub words: Option<Vec<RecognizedWord>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptionInfo {
    pub language: Option<String>,
    /// Total audio duration in seconds.
    pub duration: Option<f64>,
}

/// Single-pass sequence of segments, produced as the engine decodes.
pub type SegmentStream = BoxStream<'static, Result<RecognizedSegment, TranscriptionError>>;

pub struct Transcription {
    pub info: TranscriptionInfo,
    pub segments: SegmentStream,
}

#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Starts transcribing the audio file at `audio_path`.
    ///
    /// The file must stay on disk until the returned segment stream is drained.
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Transcription, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("transcription timed out after {0}s")]
    TimedOut(u64),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
