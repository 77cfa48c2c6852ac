use std::io;
use std::time::Instant;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::application::ports::TranscriptionError;
use crate::application::services::{AudioUpload, TranscribeRequest};
use crate::domain::TranscriptResponse;
use crate::infrastructure::storage::{TempAudioFile, UploadError};
use crate::presentation::state::AppState;

const FILE_FIELD: &str = "file";
const MIN_BEAM_SIZE: i64 = 1;
const MAX_BEAM_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct TranscribeQuery {
    pub language: Option<String>,
    #[serde(default = "default_beam_size")]
    pub beam_size: i64,
    #[serde(default = "default_vad_filter")]
    pub vad_filter: bool,
}

fn default_beam_size() -> i64 {
    5
}

fn default_vad_filter() -> bool {
    true
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscribeApiError {
    #[error("No file provided")]
    MissingFile,
    #[error("beam_size must be between {MIN_BEAM_SIZE} and {MAX_BEAM_SIZE}")]
    InvalidBeamSize(i64),
    #[error("Failed to read multipart: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}

impl IntoResponse for TranscribeApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingFile | Self::InvalidBeamSize(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
            Self::Upload(_) | Self::Transcription(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error = if status.is_server_error() {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[tracing::instrument(skip(state, multipart), fields(beam_size = query.beam_size, vad_filter = query.vad_filter))]
pub async fn transcribe_segment_handler(
    State(state): State<AppState>,
    Query(query): Query<TranscribeQuery>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptResponse>, TranscribeApiError> {
    let received_at = Instant::now();

    if !(MIN_BEAM_SIZE..=MAX_BEAM_SIZE).contains(&query.beam_size) {
        tracing::warn!(beam_size = query.beam_size, "Rejected out-of-range beam size");
        return Err(TranscribeApiError::InvalidBeamSize(query.beam_size));
    }

    let mut staged = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => break,
        };
        let content_type = field.content_type().map(str::to_string);

        let stream = field.map_err(io::Error::other).boxed();
        let audio = TempAudioFile::spool(state.uploads.temp_dir.as_deref(), &filename, stream)
            .await
            .inspect_err(|e| tracing::error!(error = %e, filename = %filename, "Transcribe failed"))?;

        staged = Some((filename, content_type, audio));
        break;
    }

    let Some((filename, content_type, audio)) = staged else {
        tracing::warn!("Transcribe request with no file");
        return Err(TranscribeApiError::MissingFile);
    };

    let upload = AudioUpload {
        path: audio.path(),
        filename: &filename,
        content_type: content_type.as_deref(),
        size_bytes: audio.size(),
        received_at,
    };
    let request = TranscribeRequest {
        language: query.language.filter(|l| !l.trim().is_empty()),
        beam_size: query.beam_size as u8,
        vad_filter: query.vad_filter,
    };

    let result = state
        .transcription_service
        .transcribe(&upload, request)
        .await;

    if let Err(e) = audio.close() {
        tracing::warn!(error = %e, filename = %filename, "Failed to remove temp audio file");
    }

    Ok(Json(result?))
}
