use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;

use crate::application::ports::{
    RecognizedSegment, TranscribeOptions, Transcription, TranscriptionEngine, TranscriptionError,
    TranscriptionInfo,
};

/// Replays a fixed transcript, optionally failing part-way through the stream.
#[derive(Debug, Clone, Default)]
pub struct MockTranscriptionEngine {
    info: TranscriptionInfo,
    segments: Vec<RecognizedSegment>,
    fail_after: Option<usize>,
}

impl MockTranscriptionEngine {
    pub fn new(info: TranscriptionInfo, segments: Vec<RecognizedSegment>) -> Self {
        Self {
            info,
            segments,
            fail_after: None,
        }
    }

    /// Yields `count` segments, then an error instead of the rest.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// A short canned transcript used when running the server in mock mode.
    pub fn scaffold() -> Self {
        Self::new(
            TranscriptionInfo {
                language: Some("en".to_string()),
                duration: Some(2.0),
            },
            vec![RecognizedSegment {
                start: 0.0,
                end: 2.0,
                text: " This is a mock transcription.".to_string(),
                avg_logprob: Some(-0.1),
                words: None,
            }],
        )
    }
}

#[async_trait]
impl TranscriptionEngine for MockTranscriptionEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Transcription, TranscriptionError> {
        tokio::fs::metadata(audio_path).await?;

        tracing::debug!(
            path = %audio_path.display(),
            segments = self.segments.len(),
            "Mock engine transcribing"
        );

        let mut items: Vec<Result<RecognizedSegment, TranscriptionError>> = self
            .segments
            .iter()
            .cloned()
            .map(|mut segment| {
                if !options.word_timestamps {
                    segment.words = None;
                }
                Ok(segment)
            })
            .collect();

        if let Some(count) = self.fail_after {
            items.truncate(count);
            items.push(Err(TranscriptionError::TranscriptionFailed(
                "mock engine failure".to_string(),
            )));
        }

        let info = TranscriptionInfo {
            language: options.language.clone().or_else(|| self.info.language.clone()),
            duration: self.info.duration,
        };

        Ok(Transcription {
            info,
            segments: stream::iter(items).boxed(),
        })
    }
}
