pub mod audio_decoder;
pub mod audio_window;
mod candle_whisper_engine;
mod mock_transcription_engine;
mod model_cache;
pub mod openai_whisper_engine;
mod transcription_engine_factory;

pub use candle_whisper_engine::{CandleWhisperEngine, hub_repo_id};
pub use mock_transcription_engine::MockTranscriptionEngine;
pub use model_cache::{process_env, resolve_model_cache_dir};
pub use openai_whisper_engine::OpenAiWhisperEngine;
pub use transcription_engine_factory::TranscriptionEngineFactory;
