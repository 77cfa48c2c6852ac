use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::TranscriptionService;
use crate::presentation::config::TranscriptionSettings;

#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Where uploads are spooled; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl From<&TranscriptionSettings> for UploadSettings {
    fn from(settings: &TranscriptionSettings) -> Self {
        Self {
            temp_dir: settings.temp_dir.clone(),
            max_upload_bytes: settings.max_upload_bytes(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub transcription_service: Arc<TranscriptionService>,
    pub uploads: UploadSettings,
}
