// YouTube Data API HTTP handlers
//
// This module contains the HTTP handlers for the YouTube Data API.
// It provides the interface between HTTP requests and the upstream providers.

pub mod authentication;
pub mod query;
pub mod routes;

// Re-export handlers for easier access
pub use self::routes::{
    get_thumbnail, get_title, get_transcript, health, list_transcripts, metrics_handler,
    translate_transcript,
};
// Re-export authentication middleware
pub use self::authentication::Authentication;
pub use self::query::query_config;
