// Upstream providers for YouTube Data API
//
// This module defines the two provider seams the handlers depend on and the
// reqwest-backed implementations that talk to YouTube.

pub mod error;
pub mod timedtext;
pub mod transcripts;
pub mod youtube_data;

use async_trait::async_trait;

use crate::models::{ThumbnailSet, Transcript, TranscriptLanguageEntry};
use crate::video_id::VideoId;

pub use self::error::ProviderError;
pub use self::transcripts::YouTubeTranscriptClient;
pub use self::youtube_data::YouTubeDataClient;

/// Video metadata source (titles and thumbnails)
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Title of the video
    async fn get_title(&self, video_id: &VideoId) -> Result<String, ProviderError>;

    /// Every thumbnail resolution the provider offers for the video
    async fn get_thumbnails(&self, video_id: &VideoId) -> Result<ThumbnailSet, ProviderError>;
}

/// Caption track source (listing, fetching and translating transcripts)
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Caption tracks of the video, manually created ones first
    ///
    /// Fails with `TranscriptsDisabled` rather than returning an empty list.
    async fn list_transcripts(
        &self,
        video_id: &VideoId,
    ) -> Result<Vec<TranscriptLanguageEntry>, ProviderError>;

    /// Transcript in the first of `languages` the video offers
    ///
    /// An empty list selects the provider's default language.
    async fn get_transcript(
        &self,
        video_id: &VideoId,
        languages: &[&str],
        preserve_formatting: bool,
    ) -> Result<Transcript, ProviderError>;

    /// Transcript in the first offered of `source_languages`, machine-translated to `target_language`
    async fn translate_transcript(
        &self,
        video_id: &VideoId,
        source_languages: &[&str],
        target_language: &str,
        preserve_formatting: bool,
    ) -> Result<Transcript, ProviderError>;
}
