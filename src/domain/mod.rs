mod transcript;

pub use transcript::{TranscriptResponse, TranscriptSegment, TranscriptWord, join_segment_texts};
