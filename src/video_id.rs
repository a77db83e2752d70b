// Video identifier parsing for YouTube Data API
//
// This module normalizes the `videoId` query parameter. Clients may send either
// a bare 11-character video ID or any of the common YouTube URL forms.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Length of a canonical YouTube video ID
pub const VIDEO_ID_LENGTH: usize = 11;

lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex");
}

/// Path prefixes that carry the video ID as the next path segment
const ID_PATH_PREFIXES: [&str; 4] = ["embed", "shorts", "live", "v"];

/// Error returned when the input is not a recognizable video identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid video identifier: '{input}'. Expected an 11-character video ID or a YouTube URL")]
pub struct InvalidIdentifier {
    pub input: String,
}

impl InvalidIdentifier {
    fn new<S: Into<String>>(input: S) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// A canonical 11-character YouTube video ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a bare video ID
    pub fn new(candidate: &str) -> Result<Self, InvalidIdentifier> {
        if VIDEO_ID_RE.is_match(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(InvalidIdentifier::new(candidate))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated video ID together with the URL it was extracted from, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    pub id: VideoId,
    pub source_url: Option<String>,
}

impl VideoReference {
    /// Parse a bare video ID or a YouTube URL
    ///
    /// Accepted URL forms (scheme optional, `www.`, `m.` and `music.` hosts included):
    /// - `youtube.com/watch?v=<id>`
    /// - `youtu.be/<id>`
    /// - `youtube.com/embed/<id>`, `/shorts/<id>`, `/live/<id>`, `/v/<id>`
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(InvalidIdentifier::new(raw));
        }

        if let Ok(id) = VideoId::new(input) {
            return Ok(Self {
                id,
                source_url: None,
            });
        }

        let url = parse_youtube_url(input).ok_or_else(|| InvalidIdentifier::new(raw))?;
        let candidate = extract_id_from_url(&url).ok_or_else(|| InvalidIdentifier::new(raw))?;
        let id = VideoId::new(&candidate).map_err(|_| InvalidIdentifier::new(raw))?;

        Ok(Self {
            id,
            source_url: Some(input.to_string()),
        })
    }
}

/// Parse the input as a URL on a YouTube host, adding a scheme when missing
fn parse_youtube_url(input: &str) -> Option<Url> {
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).ok()?;
    match base_host(&url)?.as_str() {
        "youtube.com" | "youtu.be" | "youtube-nocookie.com" => Some(url),
        _ => None,
    }
}

/// Lowercased host without its `www.`, `m.` or `music.` prefix
fn base_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let base = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(&host);
    Some(base.to_string())
}

fn extract_id_from_url(url: &Url) -> Option<String> {
    let host = base_host(url)?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if host == "youtu.be" {
        return segments.next().map(str::to_string);
    }

    match segments.next() {
        Some("watch") => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        Some(prefix) if ID_PATH_PREFIXES.contains(&prefix) => segments.next().map(str::to_string),
        _ => None,
    }
}
