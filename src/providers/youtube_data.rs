// YouTube Data API v3 client
//
// Fetches video snippets (title and thumbnails) from `videos.list`.
// Responses are decoded into typed structs here so nothing past this module
// ever handles raw JSON from Google.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::models::{Thumbnail, ThumbnailSet};
use crate::providers::{MetadataProvider, ProviderError};
use crate::video_id::VideoId;

/// Error reasons Google uses for quota and rate limiting
const THROTTLING_REASONS: [&str; 4] = [
    "quotaExceeded",
    "rateLimitExceeded",
    "dailyLimitExceeded",
    "userRateLimitExceeded",
];

/// Error reasons Google uses for bad or restricted API keys
const CREDENTIAL_REASONS: [&str; 4] = [
    "keyInvalid",
    "keyExpired",
    "accessNotConfigured",
    "forbidden",
];

/// `videos.list` response
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: ApiThumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct ApiThumbnails {
    default: Option<ApiThumbnail>,
    medium: Option<ApiThumbnail>,
    high: Option<ApiThumbnail>,
    standard: Option<ApiThumbnail>,
    maxres: Option<ApiThumbnail>,
}

#[derive(Debug, Deserialize)]
struct ApiThumbnail {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl From<ApiThumbnail> for Thumbnail {
    fn from(t: ApiThumbnail) -> Self {
        Thumbnail {
            url: t.url,
            width: t.width,
            height: t.height,
        }
    }
}

impl From<ApiThumbnails> for ThumbnailSet {
    fn from(t: ApiThumbnails) -> Self {
        ThumbnailSet {
            default: t.default.map(Thumbnail::from),
            medium: t.medium.map(Thumbnail::from),
            high: t.high.map(Thumbnail::from),
            standard: t.standard.map(Thumbnail::from),
            maxres: t.maxres.map(Thumbnail::from),
        }
    }
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Map a non-success Data API response onto a provider error
fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let (message, reasons) = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => (
            envelope.error.message,
            envelope
                .error
                .errors
                .into_iter()
                .map(|e| e.reason)
                .collect::<Vec<_>>(),
        ),
        Err(_) => (
            status.canonical_reason().unwrap_or("Unknown error").to_string(),
            Vec::new(),
        ),
    };
    let detail = format!("HTTP {}: {}", status.as_u16(), message);

    let has_reason = |known: &[&str]| reasons.iter().any(|r| known.contains(&r.as_str()));

    if status == StatusCode::TOO_MANY_REQUESTS || has_reason(&THROTTLING_REASONS) {
        ProviderError::Throttled(detail)
    } else if status == StatusCode::UNAUTHORIZED
        || has_reason(&CREDENTIAL_REASONS)
        || message.contains("API key not valid")
    {
        ProviderError::Unauthorized(detail)
    } else {
        ProviderError::Transport(detail)
    }
}

/// Metadata provider backed by the YouTube Data API v3
pub struct YouTubeDataClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YouTubeDataClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        if config.youtube_api_key.is_none() {
            warn!("YOUTUBE_API_KEY is not set; title and thumbnail requests will fail");
        }

        Ok(Self {
            client,
            api_key: config.youtube_api_key.clone(),
            base_url: config.data_api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the snippet part of a single video
    async fn fetch_snippet(&self, video_id: &VideoId) -> Result<Snippet, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Unauthorized("YOUTUBE_API_KEY is not configured".to_string())
        })?;

        debug!("Fetching snippet for video {} from the Data API", video_id);
        let response = self
            .client
            .get(format!("{}/videos", self.base_url))
            .query(&[("part", "snippet"), ("id", video_id.as_str()), ("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_error(status, &body);
            warn!("Data API request for video {} failed: {}", video_id, err);
            return Err(err);
        }

        let list: VideoListResponse = response.json().await?;
        list.items
            .into_iter()
            .next()
            .map(|item| item.snippet)
            .ok_or_else(|| ProviderError::VideoNotFound(video_id.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for YouTubeDataClient {
    async fn get_title(&self, video_id: &VideoId) -> Result<String, ProviderError> {
        Ok(self.fetch_snippet(video_id).await?.title)
    }

    async fn get_thumbnails(&self, video_id: &VideoId) -> Result<ThumbnailSet, ProviderError> {
        Ok(self.fetch_snippet(video_id).await?.thumbnails.into())
    }
}
