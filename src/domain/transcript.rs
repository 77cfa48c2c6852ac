use serde::Serialize;

/// A single recognized word with its timing, in seconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptWord {
    pub start: f64,
    pub end: f64,
    pub word: String,
    /// In `[0, 1]`. `null` when the engine does not score words, as with
    /// OpenAI-compatible servers.
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: Option<f64>,
    pub words: Option<Vec<TranscriptWord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptResponse {
    pub text: String,
    pub language: Option<String>,
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptResponse {
    /// Builds the response, deriving the top-level text from the segments.
    ///
    /// Segment texts are expected to be trimmed already; empty ones are skipped
    /// so the joined text never carries doubled separators.
    pub fn from_segments(language: Option<String>, segments: Vec<TranscriptSegment>) -> Self {
        let text = join_segment_texts(segments.iter().map(|s| s.text.as_str()));
        Self {
            text,
            language,
            segments,
        }
    }
}

pub fn join_segment_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
