// YouTube Data API Library
//
// This crate provides an HTTP façade over YouTube: video titles, thumbnails and
// caption transcripts (listing, fetching and machine translation).
// Handlers depend on two provider traits so the upstream clients can be swapped.

pub mod config;
pub mod config_loader;
pub mod config_validator;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod video_id;

// Re-export common types for easier access
pub use config::{AppConfig, AuthConfig, MetricsConfig, ProviderConfig, ServerConfig};
pub use error::ApiError;
pub use handlers::{
    get_thumbnail, get_title, get_transcript, health, list_transcripts, metrics_handler,
    translate_transcript, Authentication,
};
pub use metrics::Metrics;
pub use models::{ErrorResponse, Transcript, TranscriptLanguageEntry, TranscriptSegment};
pub use providers::{MetadataProvider, ProviderError, TranscriptProvider};
pub use video_id::{InvalidIdentifier, VideoId, VideoReference};
