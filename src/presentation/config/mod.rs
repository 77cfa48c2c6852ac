mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    LoggingSettings, RtfSettings, ServerSettings, Settings, TranscriptionProviderSetting,
    TranscriptionSettings,
};
