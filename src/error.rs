// Error handling for YouTube Data API
//
// This module defines the errors surfaced by the HTTP handlers and how each of
// them maps to a status code. Provider errors are converted here so handlers
// can simply use `?`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::providers::ProviderError;
use crate::video_id::InvalidIdentifier;

/// Errors that can occur in the API handlers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The video ID or URL could not be parsed
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    /// A query parameter is missing or malformed
    #[error("Invalid query parameters: {0}")]
    InvalidParameter(String),

    /// The video or its transcripts do not exist upstream
    #[error("{0}")]
    NotFound(String),

    /// The requested transcript language is not offered
    #[error("{0}")]
    LanguageUnavailable(String),

    /// The requested translation is not offered
    #[error("{0}")]
    TranslationUnavailable(String),

    /// Upstream failed (transport, credentials, unexpected response)
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// Upstream refused because of quota or rate limiting
    #[error("{0}")]
    UpstreamThrottled(String),
}

impl ApiError {
    /// Create a new InvalidParameter error
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Stable name of the error kind, returned alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidIdentifier(_) => "InvalidIdentifier",
            ApiError::InvalidParameter(_) => "InvalidParameter",
            ApiError::NotFound(_) => "NotFound",
            ApiError::LanguageUnavailable(_) => "LanguageUnavailable",
            ApiError::TranslationUnavailable(_) => "TranslationUnavailable",
            ApiError::UpstreamUnavailable(_) | ApiError::UpstreamThrottled(_) => {
                "UpstreamUnavailable"
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier(_) | ApiError::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_)
            | ApiError::LanguageUnavailable(_)
            | ApiError::TranslationUnavailable(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamThrottled(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            kind: Some(self.kind()),
        })
    }
}

/// Convert ProviderError to ApiError
impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        let message = err.to_string();
        match err {
            ProviderError::VideoNotFound(_) | ProviderError::TranscriptsDisabled(_) => {
                ApiError::NotFound(message)
            }
            ProviderError::LanguageUnavailable { .. } => ApiError::LanguageUnavailable(message),
            ProviderError::NotTranslatable { .. }
            | ProviderError::TranslationLanguageUnavailable { .. } => {
                ApiError::TranslationUnavailable(message)
            }
            ProviderError::Throttled(_) => ApiError::UpstreamThrottled(message),
            ProviderError::Restricted(_)
            | ProviderError::Unauthorized(_)
            | ProviderError::Transport(_)
            | ProviderError::UnexpectedResponse(_) => ApiError::UpstreamUnavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video_id::VideoReference;

    fn status_of(err: ProviderError) -> StatusCode {
        ApiError::from(err).status_code()
    }

    #[test]
    fn test_invalid_identifier_is_bad_request() {
        let err: ApiError = VideoReference::parse("nope").unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "InvalidIdentifier");
    }

    #[test]
    fn test_provider_error_status_mapping() {
        assert_eq!(status_of(ProviderError::VideoNotFound("v".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ProviderError::TranscriptsDisabled("v".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ProviderError::LanguageUnavailable {
                video_id: "v".into(),
                requested: "fr".into(),
                available: vec![]
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ProviderError::NotTranslatable {
                video_id: "v".into(),
                language_code: "en".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ProviderError::Throttled("q".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(ProviderError::Transport("t".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(ProviderError::Unauthorized("k".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(ProviderError::Restricted("r".into())), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_translation_errors_keep_their_kind() {
        let err = ApiError::from(ProviderError::TranslationLanguageUnavailable {
            video_id: "v".into(),
            target: "ja".into(),
        });
        assert_eq!(err.kind(), "TranslationUnavailable");
        assert_eq!(err.to_string(), "Transcript of video v cannot be translated to 'ja'");
    }

    #[actix_web::test]
    async fn test_error_response_body() {
        let response = ApiError::NotFound("Video not found: abc".into()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Video not found: abc");
        assert_eq!(value["kind"], "NotFound");
    }
}
