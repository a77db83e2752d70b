// Transcript provider for YouTube Data API
//
// Caption tracks are not exposed by the Data API without OAuth, so this client
// follows the same path a browser does:
//
// 1. load the watch page and pull the InnerTube API key out of it
// 2. ask the InnerTube `player` endpoint for the caption track list
// 3. download the timedtext document of the chosen track
//
// No retries and no caching: every call goes to YouTube.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::models::{Transcript, TranscriptLanguageEntry, TranslationLanguage};
use crate::providers::timedtext::TimedTextParser;
use crate::providers::{ProviderError, TranscriptProvider};
use crate::video_id::VideoId;

/// InnerTube client identity used for player requests
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Marker of the cookie consent interstitial served to EU visitors
const CONSENT_FORM_MARKER: &str = "action=\"https://consent.youtube.com/s\"";

lazy_static! {
    static ref INNERTUBE_API_KEY_RE: Regex =
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid api key regex");
    static ref CONSENT_VALUE_RE: Regex =
        Regex::new(r#"name="v" value="(.*?)""#).expect("valid consent regex");
}

// InnerTube player response, reduced to the fields this service reads.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    #[serde(default)]
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<ApiCaptionTrack>,
    #[serde(default)]
    translation_languages: Vec<ApiTranslationLanguage>,
    #[serde(default)]
    audio_tracks: Vec<AudioTrack>,
    default_audio_track_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TextRuns>,
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTranslationLanguage {
    language_code: String,
    language_name: Option<TextRuns>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioTrack {
    default_caption_track_index: Option<usize>,
}

/// Localized text, either as `runs` or as `simpleText`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextRuns {
    #[serde(default)]
    runs: Vec<TextRun>,
    simple_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TextRuns {
    fn text(&self) -> Option<String> {
        self.runs
            .first()
            .map(|run| run.text.clone())
            .or_else(|| self.simple_text.clone())
    }
}

/// A downloadable caption track
#[derive(Debug, Clone, PartialEq)]
struct CaptionTrack {
    language_code: String,
    name: String,
    is_generated: bool,
    is_translatable: bool,
    base_url: String,
    translation_languages: Vec<TranslationLanguage>,
}

impl CaptionTrack {
    fn entry(&self) -> TranscriptLanguageEntry {
        TranscriptLanguageEntry {
            language_code: self.language_code.clone(),
            name: self.name.clone(),
            is_generated: self.is_generated,
            is_translatable: self.is_translatable,
            translation_languages: self.translation_languages.clone(),
        }
    }
}

/// Caption tracks of one video, split the way lookups prefer them
#[derive(Debug)]
struct CaptionCatalog {
    video_id: String,
    manual: Vec<CaptionTrack>,
    generated: Vec<CaptionTrack>,
    /// Language of the track the player would show by default
    default_language: String,
}

impl CaptionCatalog {
    fn from_player_response(video_id: &str, response: PlayerResponse) -> Result<Self, ProviderError> {
        check_playability(video_id, response.playability_status.as_ref())?;

        let renderer = response
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .ok_or_else(|| ProviderError::TranscriptsDisabled(video_id.to_string()))?;

        let translation_languages: Vec<TranslationLanguage> = renderer
            .translation_languages
            .into_iter()
            .map(|lang| TranslationLanguage {
                name: lang
                    .language_name
                    .and_then(|n| n.text())
                    .unwrap_or_else(|| lang.language_code.clone()),
                language_code: lang.language_code,
            })
            .collect();

        let default_index = renderer
            .audio_tracks
            .get(renderer.default_audio_track_index.unwrap_or(0))
            .and_then(|audio| audio.default_caption_track_index)
            .filter(|index| *index < renderer.caption_tracks.len())
            .unwrap_or(0);
        let default_language = renderer
            .caption_tracks
            .get(default_index)
            .map(|track| track.language_code.clone())
            .ok_or_else(|| ProviderError::TranscriptsDisabled(video_id.to_string()))?;

        let mut manual = Vec::new();
        let mut generated = Vec::new();
        for track in renderer.caption_tracks {
            let is_generated = track.kind.as_deref() == Some("asr");
            let caption = CaptionTrack {
                name: track
                    .name
                    .and_then(|n| n.text())
                    .unwrap_or_else(|| track.language_code.clone()),
                language_code: track.language_code,
                is_generated,
                is_translatable: track.is_translatable,
                base_url: track.base_url.replace("&fmt=srv3", ""),
                translation_languages: if track.is_translatable {
                    translation_languages.clone()
                } else {
                    Vec::new()
                },
            };
            if is_generated {
                generated.push(caption);
            } else {
                manual.push(caption);
            }
        }

        Ok(Self {
            video_id: video_id.to_string(),
            manual,
            generated,
            default_language,
        })
    }

    /// Track for a language code, manually created tracks winning over generated ones
    fn lookup(&self, language_code: &str) -> Option<&CaptionTrack> {
        self.manual
            .iter()
            .chain(self.generated.iter())
            .find(|track| track.language_code == language_code)
    }

    /// Track of the first code in `language_codes` the video offers
    fn find(&self, language_codes: &[&str]) -> Result<&CaptionTrack, ProviderError> {
        language_codes
            .iter()
            .find_map(|code| self.lookup(code))
            .ok_or_else(|| ProviderError::LanguageUnavailable {
                video_id: self.video_id.clone(),
                requested: language_codes.join(", "),
                available: self.available_codes(),
            })
    }

    /// Track served when no language is requested
    ///
    /// Resolved through `find` so it always matches an explicit request for the same code.
    fn default_track(&self) -> Result<&CaptionTrack, ProviderError> {
        self.find(&[self.default_language.as_str()])
    }

    fn available_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for track in self.manual.iter().chain(self.generated.iter()) {
            if !codes.contains(&track.language_code) {
                codes.push(track.language_code.clone());
            }
        }
        codes
    }

    fn entries(&self) -> Vec<TranscriptLanguageEntry> {
        self.manual
            .iter()
            .chain(self.generated.iter())
            .map(CaptionTrack::entry)
            .collect()
    }
}

/// Turn a non-OK playability status into the matching provider error
fn check_playability(video_id: &str, status: Option<&PlayabilityStatus>) -> Result<(), ProviderError> {
    let status = match status {
        Some(status) if status.status != "OK" && !status.status.is_empty() => status,
        _ => return Ok(()),
    };
    let reason = status.reason.clone().unwrap_or_default();

    match status.status.as_str() {
        "ERROR" if reason.contains("unavailable") => {
            Err(ProviderError::VideoNotFound(video_id.to_string()))
        }
        "LOGIN_REQUIRED" if reason.contains("private") => {
            Err(ProviderError::VideoNotFound(video_id.to_string()))
        }
        "LOGIN_REQUIRED" if reason.contains("not a bot") => Err(ProviderError::Throttled(format!(
            "YouTube requires a bot check for video {}",
            video_id
        ))),
        other => Err(ProviderError::Restricted(format!(
            "video {} is not playable ({}): {}",
            video_id, other, reason
        ))),
    }
}

fn extract_innertube_api_key(html: &str, video_id: &str) -> Result<String, ProviderError> {
    if let Some(captures) = INNERTUBE_API_KEY_RE.captures(html) {
        return Ok(captures[1].to_string());
    }
    if html.contains("class=\"g-recaptcha\"") {
        return Err(ProviderError::Throttled(format!(
            "YouTube answered the watch page of {} with a captcha",
            video_id
        )));
    }
    Err(ProviderError::UnexpectedResponse(format!(
        "watch page of {} has no InnerTube API key",
        video_id
    )))
}

/// Transcript provider scraping YouTube's public caption tracks
pub struct YouTubeTranscriptClient {
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeTranscriptClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
            ProviderError::Transport(format!(
                "Invalid Accept-Language '{}': {}",
                config.accept_language, e
            ))
        })?;
        headers.insert(ACCEPT_LANGUAGE, accept_language);

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.youtube_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send a request and reject non-success statuses
    async fn send_checked(&self, request: RequestBuilder) -> Result<reqwest::Response, ProviderError> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Throttled(
                "YouTube answered HTTP 429 Too Many Requests".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }
        Ok(response)
    }

    async fn fetch_watch_page(&self, video_id: &VideoId) -> Result<String, ProviderError> {
        let url = format!("{}/watch", self.base_url);
        let query = [("v", video_id.as_str())];

        let html = self
            .send_checked(self.client.get(&url).query(&query))
            .await?
            .text()
            .await?;
        if !html.contains(CONSENT_FORM_MARKER) {
            return Ok(html);
        }

        debug!("Watch page of {} is behind the consent form, accepting it", video_id);
        let consent_value = CONSENT_VALUE_RE
            .captures(&html)
            .map(|captures| captures[1].to_string())
            .ok_or_else(|| {
                ProviderError::UnexpectedResponse(format!(
                    "consent form for {} has no consent value",
                    video_id
                ))
            })?;

        let html = self
            .send_checked(
                self.client
                    .get(&url)
                    .query(&query)
                    .header(COOKIE, format!("CONSENT=YES+{}", consent_value)),
            )
            .await?
            .text()
            .await?;
        if html.contains(CONSENT_FORM_MARKER) {
            return Err(ProviderError::UnexpectedResponse(format!(
                "consent form for {} was served again after accepting it",
                video_id
            )));
        }
        Ok(html)
    }

    async fn fetch_player_response(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<PlayerResponse, ProviderError> {
        let url = format!("{}/youtubei/v1/player", self.base_url);
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id.as_str()
        });

        let response = self
            .send_checked(self.client.post(&url).query(&[("key", api_key)]).json(&body))
            .await?;
        Ok(response.json().await?)
    }

    async fn fetch_catalog(&self, video_id: &VideoId) -> Result<CaptionCatalog, ProviderError> {
        let result = async {
            let html = self.fetch_watch_page(video_id).await?;
            let api_key = extract_innertube_api_key(&html, video_id.as_str())?;
            let player = self.fetch_player_response(video_id, &api_key).await?;
            CaptionCatalog::from_player_response(video_id.as_str(), player)
        }
        .await;

        if let Err(e) = &result {
            warn!("Failed to list caption tracks of {}: {}", video_id, e);
        }
        result
    }

    async fn fetch_track(
        &self,
        video_id: &VideoId,
        track: &CaptionTrack,
        translation: Option<&TranslationLanguage>,
        preserve_formatting: bool,
    ) -> Result<Transcript, ProviderError> {
        let mut url = track.base_url.clone();
        if let Some(target) = translation {
            url.push_str("&tlang=");
            url.push_str(&target.language_code);
        }
        if url.contains("&exp=xpe") {
            return Err(ProviderError::Restricted(format!(
                "caption track '{}' of {} requires a PO token",
                track.language_code, video_id
            )));
        }

        debug!(
            "Fetching caption track '{}' of {}{}",
            track.language_code,
            video_id,
            translation
                .map(|t| format!(" translated to '{}'", t.language_code))
                .unwrap_or_default()
        );
        let document = self.send_checked(self.client.get(&url)).await?.text().await?;
        let segments = TimedTextParser::new(preserve_formatting).parse(&document)?;

        Ok(match translation {
            Some(target) => Transcript {
                video_id: video_id.clone(),
                language: target.name.clone(),
                language_code: target.language_code.clone(),
                is_generated: true,
                segments,
            },
            None => Transcript {
                video_id: video_id.clone(),
                language: track.name.clone(),
                language_code: track.language_code.clone(),
                is_generated: track.is_generated,
                segments,
            },
        })
    }
}

/// Pick the translation target of a source track
fn translation_target<'a>(
    catalog: &CaptionCatalog,
    source: &'a CaptionTrack,
    target_language: &str,
) -> Result<&'a TranslationLanguage, ProviderError> {
    if !source.is_translatable {
        return Err(ProviderError::NotTranslatable {
            video_id: catalog.video_id.clone(),
            language_code: source.language_code.clone(),
        });
    }
    source
        .translation_languages
        .iter()
        .find(|lang| lang.language_code == target_language)
        .ok_or_else(|| ProviderError::TranslationLanguageUnavailable {
            video_id: catalog.video_id.clone(),
            target: target_language.to_string(),
        })
}

#[async_trait]
impl TranscriptProvider for YouTubeTranscriptClient {
    async fn list_transcripts(
        &self,
        video_id: &VideoId,
    ) -> Result<Vec<TranscriptLanguageEntry>, ProviderError> {
        Ok(self.fetch_catalog(video_id).await?.entries())
    }

    async fn get_transcript(
        &self,
        video_id: &VideoId,
        languages: &[&str],
        preserve_formatting: bool,
    ) -> Result<Transcript, ProviderError> {
        let catalog = self.fetch_catalog(video_id).await?;
        let track = if languages.is_empty() {
            catalog.default_track()?
        } else {
            catalog.find(languages)?
        };
        self.fetch_track(video_id, track, None, preserve_formatting)
            .await
    }

    async fn translate_transcript(
        &self,
        video_id: &VideoId,
        source_languages: &[&str],
        target_language: &str,
        preserve_formatting: bool,
    ) -> Result<Transcript, ProviderError> {
        let catalog = self.fetch_catalog(video_id).await?;
        let source = catalog.find(source_languages)?;
        let target = translation_target(&catalog, source, target_language)?;
        self.fetch_track(video_id, source, Some(target), preserve_formatting)
            .await
    }
}
