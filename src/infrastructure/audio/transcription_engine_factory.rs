use std::sync::Arc;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::presentation::config::{TranscriptionProviderSetting, TranscriptionSettings};

use super::candle_whisper_engine::CandleWhisperEngine;
use super::mock_transcription_engine::MockTranscriptionEngine;
use super::openai_whisper_engine::OpenAiWhisperEngine;

pub struct TranscriptionEngineFactory;

impl TranscriptionEngineFactory {
    /// Builds the configured engine. Loading a local model blocks.
    pub fn create(
        settings: &TranscriptionSettings,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        match settings.provider {
            TranscriptionProviderSetting::Local => {
                let engine = CandleWhisperEngine::new(settings.model())?;
                Ok(Arc::new(engine))
            }
            TranscriptionProviderSetting::OpenAi => {
                if settings.api_key.is_none() && settings.base_url.is_none() {
                    return Err(TranscriptionError::ModelLoadFailed(
                        "API key required for OpenAI Whisper".to_string(),
                    ));
                }
                let engine = OpenAiWhisperEngine::new(
                    settings.api_key.clone(),
                    settings.base_url.clone(),
                    settings.model.clone(),
                );
                Ok(Arc::new(engine))
            }
            TranscriptionProviderSetting::Mock => {
                tracing::warn!("Using mock transcription engine");
                Ok(Arc::new(MockTranscriptionEngine::scaffold()))
            }
        }
    }
}
