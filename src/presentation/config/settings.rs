use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;
use crate::infrastructure::audio::openai_whisper_engine;

/// Variables read directly, ahead of the `APP__` namespace.
const LEGACY_OVERRIDES: [(&str, &str); 4] = [
    ("WHISPER_MODEL", "transcription.model"),
    ("TRANSCRIBE_RTF_ESTIMATE", "rtf.default_estimate"),
    ("TRANSCRIBE_RTF_ALPHA", "rtf.alpha"),
    ("SERVER_PORT", "server.port"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub transcription: TranscriptionSettings,
    pub rtf: RtfSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    /// Model identifier or local path; see [`TranscriptionSettings::model`].
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Confidence scores, word timings, estimate logs and model details.
    pub verbose: bool,
    pub max_upload_mb: usize,
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TranscriptionSettings {
    /// The configured model, or the provider's default when none is set.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    Local,
    #[serde(rename = "openai")]
    OpenAi,
    Mock,
}

impl TranscriptionProviderSetting {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Local => "base",
            Self::OpenAi => openai_whisper_engine::DEFAULT_MODEL,
            Self::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RtfSettings {
    pub default_estimate: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Loads settings from defaults, `appsettings.<env>` and the process environment.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Self::load_from(environment, std::env::vars().collect())
    }

    pub fn load_from(
        environment: Environment,
        vars: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("transcription.provider", "local")?
            .set_default("transcription.verbose", true)?
            .set_default("transcription.max_upload_mb", 100)?
            .set_default("rtf.default_estimate", 1.0)?
            .set_default("rtf.alpha", 0.2)?
            .set_default("logging.level", "info")?
            .set_default("logging.enable_json", false)?
            .add_source(
                File::with_name(&format!(
                    "appsettings.{}",
                    environment.as_str().to_lowercase()
                ))
                .required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (var, key) in LEGACY_OVERRIDES {
            builder = builder.set_override_option(key, vars.get(var).cloned())?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let rtf = &self.rtf;
        if !(rtf.alpha > 0.0 && rtf.alpha <= 1.0) {
            return Err(ConfigError::Message(format!(
                "rtf.alpha must be in (0, 1], got {}",
                rtf.alpha
            )));
        }
        if !(rtf.default_estimate.is_finite() && rtf.default_estimate > 0.0) {
            return Err(ConfigError::Message(format!(
                "rtf.default_estimate must be positive, got {}",
                rtf.default_estimate
            )));
        }
        if self.transcription.max_upload_mb == 0 {
            return Err(ConfigError::Message(
                "transcription.max_upload_mb must be greater than 0".to_string(),
            ));
        }
        if self.transcription.model().trim().is_empty() {
            return Err(ConfigError::Message(
                "transcription.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
