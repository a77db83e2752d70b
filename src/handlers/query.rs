// Query string parameters of the API endpoints
//
// Parameter names are camelCase; `videoId` also accepts `video_id`.
// Language parameters take a comma-separated priority list such as `ja,es,en`.
// Extraction failures (missing or malformed parameters) are turned into
// `ApiError::InvalidParameter` by the handler installed with `query_config`.

use actix_web::{error::QueryPayloadError, web, HttpRequest};
use log::debug;
use serde::Deserialize;

use crate::error::ApiError;
use crate::video_id::{VideoId, VideoReference};

/// Parameters of `/get_title`, `/get_thumbnail` and `/list_transcripts`
#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    #[serde(rename = "videoId", alias = "video_id")]
    pub video_id: String,
}

/// Parameters of `/get_transcript`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptQuery {
    #[serde(alias = "video_id")]
    pub video_id: String,
    #[serde(default, alias = "languages")]
    pub language: Option<String>,
    #[serde(default, alias = "preserve_formatting")]
    pub preserve_formatting: bool,
}

/// Parameters of `/translate_transcript`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateQuery {
    #[serde(alias = "video_id")]
    pub video_id: String,
    #[serde(alias = "source_language", alias = "sourceLanguages", alias = "source_languages")]
    pub source_language: String,
    #[serde(alias = "target_language")]
    pub target_language: String,
    #[serde(default, alias = "preserve_formatting")]
    pub preserve_formatting: bool,
}

impl TranscriptQuery {
    /// Requested languages in priority order, empty when none were requested
    pub fn languages(&self) -> Vec<&str> {
        self.language.as_deref().map(language_list).unwrap_or_default()
    }
}

impl TranslateQuery {
    /// Source languages in priority order and the target language, both required
    pub fn languages(&self) -> Result<(Vec<&str>, &str), ApiError> {
        let sources = language_list(&self.source_language);
        if sources.is_empty() {
            return Err(ApiError::invalid_parameter(
                "parameter 'sourceLanguage' must not be empty",
            ));
        }
        let target = required(&self.target_language, "targetLanguage")?;
        Ok((sources, target))
    }
}

/// Split a comma-separated language list, dropping blank entries
fn language_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .collect()
}

fn required<'a>(value: &'a str, name: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::invalid_parameter(format!(
            "parameter '{}' must not be empty",
            name
        )));
    }
    Ok(value)
}

/// Validate the raw `videoId` parameter
pub fn parse_video_id(raw: &str) -> Result<VideoId, ApiError> {
    let reference = VideoReference::parse(raw)?;
    if let Some(url) = &reference.source_url {
        debug!("Extracted video ID {} from {}", reference.id, url);
    }
    Ok(reference.id)
}

/// Query extractor configuration mapping deserialization failures to 400 responses
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}

fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected query string for {}: {}", req.path(), err);
    ApiError::invalid_parameter(err.to_string()).into()
}
