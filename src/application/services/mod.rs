mod rtf_estimator;
mod transcript_mapper;
mod transcription_service;

pub use rtf_estimator::{DEFAULT_RTF_ALPHA, DEFAULT_RTF_ESTIMATE, RtfEstimator};
pub use transcript_mapper::{map_segment, segment_confidence};
pub use transcription_service::{
    AudioUpload, TranscribeRequest, TranscriptionService, TranscriptionServiceConfig,
};
