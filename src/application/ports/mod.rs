mod transcription_engine;

pub use transcription_engine::{
    RecognizedSegment, RecognizedWord, SegmentStream, TranscribeOptions, Transcription,
    TranscriptionEngine, TranscriptionError, TranscriptionInfo,
};
