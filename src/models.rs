// YouTube Data API data models
//
// This module contains the data models shared by the providers and the HTTP handlers.
// Every entity is built per request from a provider response and dropped afterwards.

use serde::Serialize;

use crate::video_id::VideoId;

/// One timed caption unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSegment {
    /// Caption text
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

/// A fetched transcript for one video in one language
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub video_id: VideoId,
    /// Human-readable language name (e.g., "English (auto-generated)")
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub segments: Vec<TranscriptSegment>,
}

/// A language a caption track can be translated into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationLanguage {
    pub language_code: String,
    pub name: String,
}

/// One entry of a transcript listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLanguageEntry {
    pub language_code: String,
    pub name: String,
    pub is_generated: bool,
    pub is_translatable: bool,
    pub translation_languages: Vec<TranslationLanguage>,
}

/// A single thumbnail image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Thumbnails of a video, keyed by the resolutions the Data API defines
///
/// The provider omits resolutions it does not have (`maxres` is frequently missing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailSet {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
    pub maxres: Option<Thumbnail>,
}

impl ThumbnailSet {
    pub fn is_empty(&self) -> bool {
        self.default.is_none()
            && self.medium.is_none()
            && self.high.is_none()
            && self.standard.is_none()
            && self.maxres.is_none()
    }

    /// Resolution label to URL view used by the `/get_thumbnail` response
    pub fn urls(&self) -> ThumbnailUrls {
        let url = |thumbnail: &Option<Thumbnail>| thumbnail.as_ref().map(|t| t.url.clone());
        ThumbnailUrls {
            default: url(&self.default),
            medium: url(&self.medium),
            high: url(&self.high),
            standard: url(&self.standard),
            maxres: url(&self.maxres),
        }
    }
}

/// Response for thumbnail requests
#[derive(Debug, Serialize)]
pub struct ThumbnailUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxres: Option<String>,
}

/// Response for title requests
#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub title: String,
}

/// Error response for API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error kind, stable across message wording changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

/// Response for the health endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
