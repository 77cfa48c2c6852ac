mod health;
mod hello;
mod transcribe;

pub use health::health_handler;
pub use hello::hello_handler;
pub use transcribe::{TranscribeApiError, TranscribeQuery, transcribe_segment_handler};
