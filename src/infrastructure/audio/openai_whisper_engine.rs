use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{
    RecognizedSegment, RecognizedWord, TranscribeOptions, Transcription, TranscriptionEngine,
    TranscriptionError, TranscriptionInfo,
};

pub const DEFAULT_MODEL: &str = "whisper-1";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any server exposing the OpenAI `/audio/transcriptions` endpoint
/// with `verbose_json` output.
pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: Option<String>, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerboseTranscription {
    pub language: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub segments: Vec<VerboseSegment>,
    pub words: Option<Vec<VerboseWord>>,
}

#[derive(Debug, Deserialize)]
pub struct VerboseSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub avg_logprob: Option<f64>,
    pub words: Option<Vec<VerboseWord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerboseWord {
    pub start: f64,
    pub end: f64,
    pub word: String,
    pub probability: Option<f64>,
}

impl From<VerboseWord> for RecognizedWord {
    fn from(w: VerboseWord) -> Self {
        Self {
            start: w.start,
            end: w.end,
            word: w.word,
            probability: w.probability,
        }
    }
}

/// Converts a `verbose_json` body into segments.
///
/// Servers that only return a top-level word list get each word assigned to
/// the segment its start time falls in.
pub fn into_segments(
    body: VerboseTranscription,
    word_timestamps: bool,
) -> (TranscriptionInfo, Vec<RecognizedSegment>) {
    let info = TranscriptionInfo {
        language: body.language,
        duration: body.duration,
    };

    let mut loose_words = body.words.unwrap_or_default().into_iter().peekable();
    let segment_count = body.segments.len();

    let segments = body
        .segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| {
            let is_last = i + 1 == segment_count;
            let mut words: Option<Vec<RecognizedWord>> = segment
                .words
                .map(|ws| ws.into_iter().map(RecognizedWord::from).collect());

            let mut assigned = Vec::new();
            while let Some(word) =
                loose_words.next_if(|w| is_last || w.start < segment.end)
            {
                assigned.push(RecognizedWord::from(word));
            }
            if words.is_none() && !assigned.is_empty() {
                words = Some(assigned);
            }

            RecognizedSegment {
                start: segment.start,
                end: segment.end,
                text: segment.text,
                avg_logprob: segment.avg_logprob,
                words: if word_timestamps { words } else { None },
            }
        })
        .collect();

    (info, segments)
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Transcription, TranscriptionError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let audio_data = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let file_part = multipart::Part::bytes(audio_data)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", file_part);
        if options.word_timestamps {
            form = form.text("timestamp_granularities[]", "word");
        }
        if let Some(language) = &options.language {
            form = form.text("language", language.clone());
        }

        tracing::debug!(
            model = %self.model,
            beam_size = options.beam_size,
            vad_filter = options.vad_filter,
            "Sending audio to OpenAI-compatible transcription API"
        );

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("body: {}", e)))?;

        let (info, segments) = into_segments(body, options.word_timestamps);

        tracing::info!(
            segments = segments.len(),
            language = ?info.language,
            "OpenAI-compatible transcription received"
        );

        Ok(Transcription {
            info,
            segments: stream::iter(segments.into_iter().map(Ok)).boxed(),
        })
    }
}
