mod human_format;
mod init_tracing;
mod request_id;
mod tracing_config;

pub use human_format::{format_bytes, format_seconds};
pub use init_tracing::init_tracing;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use tracing_config::TracingConfig;
