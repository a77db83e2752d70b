// Provider error types
//
// Errors raised at the boundary with the upstream services. They describe what
// went wrong upstream; the HTTP layer decides which status code each one maps to.

use thiserror::Error;

/// Errors returned by the metadata and transcript providers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The video does not exist, is private, or has been removed
    #[error("Video not found: {0}")]
    VideoNotFound(String),

    /// The video exists but has no caption tracks
    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    /// No caption track exists for the requested language
    #[error("No transcript in language '{requested}' for video {video_id}. Available: {}", .available.join(", "))]
    LanguageUnavailable {
        video_id: String,
        requested: String,
        available: Vec<String>,
    },

    /// The source caption track cannot be translated
    #[error("Transcript '{language_code}' of video {video_id} is not translatable")]
    NotTranslatable {
        video_id: String,
        language_code: String,
    },

    /// The source caption track cannot be translated into the target language
    #[error("Transcript of video {video_id} cannot be translated to '{target}'")]
    TranslationLanguageUnavailable { video_id: String, target: String },

    /// Upstream refused the request because of quota, rate limiting or bot detection
    #[error("Upstream throttled the request: {0}")]
    Throttled(String),

    /// Upstream refuses to serve the video or its captions (age gate, PO token, unplayable)
    #[error("Upstream refused to serve video: {0}")]
    Restricted(String),

    /// Upstream rejected the configured credentials
    #[error("Upstream rejected credentials: {0}")]
    Unauthorized(String),

    /// Network failure or non-success HTTP status
    #[error("Upstream request failed: {0}")]
    Transport(String),

    /// Upstream answered with something that could not be decoded
    #[error("Unexpected upstream response: {0}")]
    UnexpectedResponse(String),
}

impl ProviderError {
    /// Short label used for upstream call metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            ProviderError::VideoNotFound(_) | ProviderError::TranscriptsDisabled(_) => "not_found",
            ProviderError::LanguageUnavailable { .. }
            | ProviderError::NotTranslatable { .. }
            | ProviderError::TranslationLanguageUnavailable { .. } => "unavailable_option",
            ProviderError::Throttled(_) => "throttled",
            ProviderError::Restricted(_) => "restricted",
            ProviderError::Unauthorized(_) => "unauthorized",
            ProviderError::Transport(_) => "transport_error",
            ProviderError::UnexpectedResponse(_) => "bad_response",
        }
    }
}

/// Convert reqwest errors into transport errors
///
/// The URL is stripped first because Data API URLs carry the API key.
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            ProviderError::UnexpectedResponse(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}
