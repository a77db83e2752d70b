// API route handlers for YouTube Data API
//
// Every handler validates the video identifier, calls one provider, and
// answers with JSON. Failures are `ApiError`s, rendered by actix through
// `ResponseError`. Request and upstream metrics are recorded for every call.

use std::future::Future;
use std::time::Instant;

use actix_web::{get, web, HttpResponse, ResponseError};
use log::{info, warn};

use crate::error::ApiError;
use crate::handlers::query::{parse_video_id, TranscriptQuery, TranslateQuery, VideoQuery};
use crate::metrics::Metrics;
use crate::models::{HealthResponse, TitleResponse};
use crate::providers::{MetadataProvider, ProviderError, TranscriptProvider};

const METADATA_PROVIDER: &str = "youtube_data";
const TRANSCRIPT_PROVIDER: &str = "youtube_transcripts";

/// Handler for `/get_title`
#[get("/get_title")]
pub async fn get_title(
    query: web::Query<VideoQuery>,
    metadata: web::Data<dyn MetadataProvider>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();
    let result = async {
        let video_id = parse_video_id(&query.video_id)?;
        let title = upstream(&metrics, METADATA_PROVIDER, "get_title", metadata.get_title(&video_id))
            .await?;
        info!("Fetched title of video {}", video_id);
        Ok::<_, ApiError>(HttpResponse::Ok().json(TitleResponse { title }))
    }
    .await;

    finish(&metrics, "/get_title", start_time, result).await
}

/// Handler for `/get_thumbnail`
///
/// Answers with every resolution the provider offers, keyed by resolution name.
#[get("/get_thumbnail")]
pub async fn get_thumbnail(
    query: web::Query<VideoQuery>,
    metadata: web::Data<dyn MetadataProvider>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();
    let result = async {
        let video_id = parse_video_id(&query.video_id)?;
        let thumbnails = upstream(
            &metrics,
            METADATA_PROVIDER,
            "get_thumbnails",
            metadata.get_thumbnails(&video_id),
        )
        .await?;
        if thumbnails.is_empty() {
            warn!("Video {} has no thumbnails", video_id);
        }
        Ok::<_, ApiError>(HttpResponse::Ok().json(thumbnails.urls()))
    }
    .await;

    finish(&metrics, "/get_thumbnail", start_time, result).await
}

/// Handler for `/get_transcript`
///
/// `language` is a priority list; without it the provider's default caption
/// language is used.
#[get("/get_transcript")]
pub async fn get_transcript(
    query: web::Query<TranscriptQuery>,
    transcripts: web::Data<dyn TranscriptProvider>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();
    let result = async {
        let video_id = parse_video_id(&query.video_id)?;
        let languages = query.languages();
        let transcript = upstream(
            &metrics,
            TRANSCRIPT_PROVIDER,
            "get_transcript",
            transcripts.get_transcript(&video_id, &languages, query.preserve_formatting),
        )
        .await?;
        info!(
            "Fetched {} transcript of video {} ({} segments)",
            transcript.language_code,
            video_id,
            transcript.segments.len()
        );
        Ok::<_, ApiError>(HttpResponse::Ok().json(transcript))
    }
    .await;

    finish(&metrics, "/get_transcript", start_time, result).await
}

/// Handler for `/list_transcripts`
#[get("/list_transcripts")]
pub async fn list_transcripts(
    query: web::Query<VideoQuery>,
    transcripts: web::Data<dyn TranscriptProvider>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();
    let result = async {
        let video_id = parse_video_id(&query.video_id)?;
        let entries = upstream(
            &metrics,
            TRANSCRIPT_PROVIDER,
            "list_transcripts",
            transcripts.list_transcripts(&video_id),
        )
        .await?;
        info!("Video {} offers {} transcripts", video_id, entries.len());
        Ok::<_, ApiError>(HttpResponse::Ok().json(entries))
    }
    .await;

    finish(&metrics, "/list_transcripts", start_time, result).await
}

/// Handler for `/translate_transcript`
#[get("/translate_transcript")]
pub async fn translate_transcript(
    query: web::Query<TranslateQuery>,
    transcripts: web::Data<dyn TranscriptProvider>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();
    let result = async {
        let video_id = parse_video_id(&query.video_id)?;
        let (sources, target) = query.languages()?;
        let transcript = upstream(
            &metrics,
            TRANSCRIPT_PROVIDER,
            "translate_transcript",
            transcripts.translate_transcript(&video_id, &sources, target, query.preserve_formatting),
        )
        .await?;
        info!(
            "Translated {} transcript of video {} to {}",
            sources.join(","),
            video_id,
            target
        );
        Ok::<_, ApiError>(HttpResponse::Ok().json(transcript))
    }
    .await;

    finish(&metrics, "/translate_transcript", start_time, result).await
}

/// Liveness probe, exempt from authentication
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

/// Metrics endpoint handler
#[get("/metrics")]
pub async fn metrics_handler(metrics: web::Data<Metrics>) -> HttpResponse {
    match metrics.export().await {
        Ok(data) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4; charset=utf-8")
            .body(data),
        Err(e) => {
            warn!("Failed to export metrics: {}", e);
            HttpResponse::InternalServerError().json(format!("Failed to export metrics: {}", e))
        }
    }
}

/// Time a provider call and record its outcome
async fn upstream<T, F>(
    metrics: &Metrics,
    provider: &str,
    operation: &str,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let start_time = Instant::now();
    let result = call.await;
    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => {
            warn!("{} {} failed: {}", provider, operation, e);
            e.outcome()
        }
    };
    metrics
        .record_upstream_call(provider, operation, outcome, start_time.elapsed().as_secs_f64())
        .await;
    result
}

/// Record request metrics for a finished handler
async fn finish(
    metrics: &Metrics,
    endpoint: &str,
    start_time: Instant,
    result: Result<HttpResponse, ApiError>,
) -> Result<HttpResponse, ApiError> {
    let status = match &result {
        Ok(response) => response.status(),
        Err(e) => e.status_code(),
    };
    metrics
        .record_http_request(
            endpoint,
            "GET",
            status.as_str(),
            start_time.elapsed().as_secs_f64(),
        )
        .await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::query::query_config;
    use crate::metrics::create_metrics_exporter;
    use crate::config::MetricsConfig;
    use crate::models::{
        Thumbnail, ThumbnailSet, Transcript, TranscriptLanguageEntry, TranscriptSegment,
        TranslationLanguage,
    };
    use crate::video_id::VideoId;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const RICK_ROLL: &str = "dQw4w9WgXcQ";
    const RICK_ROLL_TITLE: &str = "Rick Astley - Never Gonna Give You Up (Official Video)";
    const NO_CAPTIONS: &str = "noCaptions1";
    const THROTTLED: &str = "throttled01";

    struct FakeMetadata;

    #[async_trait]
    impl MetadataProvider for FakeMetadata {
        async fn get_title(&self, video_id: &VideoId) -> Result<String, ProviderError> {
            match video_id.as_str() {
                RICK_ROLL => Ok(RICK_ROLL_TITLE.to_string()),
                THROTTLED => Err(ProviderError::Throttled("quotaExceeded".to_string())),
                other => Err(ProviderError::VideoNotFound(other.to_string())),
            }
        }

        async fn get_thumbnails(&self, video_id: &VideoId) -> Result<ThumbnailSet, ProviderError> {
            if video_id.as_str() != RICK_ROLL {
                return Err(ProviderError::Transport("HTTP 500: backend error".to_string()));
            }
            Ok(ThumbnailSet {
                default: Some(Thumbnail {
                    url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg".to_string(),
                    width: Some(120),
                    height: Some(90),
                }),
                maxres: Some(Thumbnail {
                    url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string(),
                    width: Some(1280),
                    height: Some(720),
                }),
                ..ThumbnailSet::default()
            })
        }
    }

    /// Offers a manual English track (translatable to French) and a generated Spanish track
    struct FakeTranscripts;

    impl FakeTranscripts {
        fn transcript(video_id: &VideoId, code: &str, name: &str, generated: bool, text: &str) -> Transcript {
            Transcript {
                video_id: video_id.clone(),
                language: name.to_string(),
                language_code: code.to_string(),
                is_generated: generated,
                segments: vec![TranscriptSegment {
                    text: text.to_string(),
                    start: 18.8,
                    duration: 1.7,
                }],
            }
        }

        fn check_video(video_id: &VideoId) -> Result<(), ProviderError> {
            match video_id.as_str() {
                RICK_ROLL => Ok(()),
                NO_CAPTIONS => Err(ProviderError::TranscriptsDisabled(video_id.to_string())),
                other => Err(ProviderError::VideoNotFound(other.to_string())),
            }
        }

        fn first_offered<'a>(video_id: &VideoId, languages: &[&'a str]) -> Result<&'a str, ProviderError> {
            languages
                .iter()
                .copied()
                .find(|code| matches!(*code, "en" | "es"))
                .ok_or_else(|| Self::unavailable(video_id, &languages.join(", ")))
        }

        fn unavailable(video_id: &VideoId, requested: &str) -> ProviderError {
            ProviderError::LanguageUnavailable {
                video_id: video_id.to_string(),
                requested: requested.to_string(),
                available: vec!["en".to_string(), "es".to_string()],
            }
        }
    }

    #[async_trait]
    impl TranscriptProvider for FakeTranscripts {
        async fn list_transcripts(
            &self,
            video_id: &VideoId,
        ) -> Result<Vec<TranscriptLanguageEntry>, ProviderError> {
            Self::check_video(video_id)?;
            Ok(vec![
                TranscriptLanguageEntry {
                    language_code: "en".to_string(),
                    name: "English".to_string(),
                    is_generated: false,
                    is_translatable: true,
                    translation_languages: vec![TranslationLanguage {
                        language_code: "fr".to_string(),
                        name: "French".to_string(),
                    }],
                },
                TranscriptLanguageEntry {
                    language_code: "es".to_string(),
                    name: "Spanish (auto-generated)".to_string(),
                    is_generated: true,
                    is_translatable: false,
                    translation_languages: vec![],
                },
            ])
        }

        async fn get_transcript(
            &self,
            video_id: &VideoId,
            languages: &[&str],
            preserve_formatting: bool,
        ) -> Result<Transcript, ProviderError> {
            Self::check_video(video_id)?;
            let text = if preserve_formatting {
                "We're no strangers to <i>love</i>"
            } else {
                "We're no strangers to love"
            };
            let code = if languages.is_empty() {
                "en"
            } else {
                Self::first_offered(video_id, languages)?
            };
            if code == "en" {
                Ok(Self::transcript(video_id, "en", "English", false, text))
            } else {
                Ok(Self::transcript(
                    video_id,
                    "es",
                    "Spanish (auto-generated)",
                    true,
                    "No somos extraños al amor",
                ))
            }
        }

        async fn translate_transcript(
            &self,
            video_id: &VideoId,
            source_languages: &[&str],
            target_language: &str,
            _preserve_formatting: bool,
        ) -> Result<Transcript, ProviderError> {
            Self::check_video(video_id)?;
            match (Self::first_offered(video_id, source_languages)?, target_language) {
                ("en", "fr") => Ok(Self::transcript(
                    video_id,
                    "fr",
                    "French",
                    true,
                    "Nous ne sommes pas étrangers à l'amour",
                )),
                ("en", target) => Err(ProviderError::TranslationLanguageUnavailable {
                    video_id: video_id.to_string(),
                    target: target.to_string(),
                }),
                ("es", _) => Err(ProviderError::NotTranslatable {
                    video_id: video_id.to_string(),
                    language_code: "es".to_string(),
                }),
                (other, _) => Err(Self::unavailable(video_id, other)),
            }
        }
    }

    fn test_metrics() -> Metrics {
        let config = MetricsConfig {
            enabled: true,
            namespace: None,
        };
        Metrics::new(create_metrics_exporter(&config).unwrap())
    }

    macro_rules! test_app {
        ($metrics:expr) => {
            test::init_service(
                App::new()
                    .app_data(query_config())
                    .app_data(web::Data::from(Arc::new(FakeMetadata) as Arc<dyn MetadataProvider>))
                    .app_data(web::Data::from(
                        Arc::new(FakeTranscripts) as Arc<dyn TranscriptProvider>
                    ))
                    .app_data(web::Data::new($metrics))
                    .service(get_title)
                    .service(get_thumbnail)
                    .service(get_transcript)
                    .service(list_transcripts)
                    .service(translate_transcript)
                    .service(health)
                    .service(metrics_handler),
            )
            .await
        };
    }

    macro_rules! get_json {
        ($app:expr, $uri:expr) => {{
            let req = test::TestRequest::get().uri($uri).to_request();
            let resp = test::call_service(&$app, req).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn test_get_title() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/get_title?videoId=dQw4w9WgXcQ");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "title": RICK_ROLL_TITLE }));
    }

    #[actix_web::test]
    async fn test_get_title_accepts_urls_and_snake_case() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(
            app,
            "/get_title?video_id=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ"
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], RICK_ROLL_TITLE);
    }

    #[actix_web::test]
    async fn test_invalid_identifier_is_bad_request() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/get_title?videoId=tooShort");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "InvalidIdentifier");
    }

    #[actix_web::test]
    async fn test_missing_parameter_is_bad_request() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/get_transcript");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "InvalidParameter");
    }

    #[actix_web::test]
    async fn test_unknown_video_is_not_found() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/get_title?videoId=aaaaaaaaaaa");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NotFound");
    }

    #[actix_web::test]
    async fn test_upstream_failures() {
        let app = test_app!(test_metrics());

        let (status, body) = get_json!(app, "/get_title?videoId=throttled01");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "UpstreamUnavailable");

        let (status, body) = get_json!(app, "/get_thumbnail?videoId=aaaaaaaaaaa");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "UpstreamUnavailable");
    }

    #[actix_web::test]
    async fn test_get_thumbnail() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/get_thumbnail?videoId=dQw4w9WgXcQ");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "default": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg",
                "maxres": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
            })
        );
    }

    #[actix_web::test]
    async fn test_get_transcript_default_language_matches_explicit() {
        let app = test_app!(test_metrics());
        let (status, implicit) = get_json!(app, "/get_transcript?videoId=dQw4w9WgXcQ");
        assert_eq!(status, StatusCode::OK);

        let (_, explicit) = get_json!(app, "/get_transcript?videoId=dQw4w9WgXcQ&language=en");
        assert_eq!(implicit, explicit);
        assert_eq!(implicit["videoId"], RICK_ROLL);
        assert_eq!(implicit["languageCode"], "en");
        assert_eq!(implicit["isGenerated"], false);
        assert_eq!(implicit["segments"][0]["text"], "We're no strangers to love");
        assert_eq!(implicit["segments"][0]["start"], 18.8);
    }

    #[actix_web::test]
    async fn test_get_transcript_options() {
        let app = test_app!(test_metrics());

        let (_, body) = get_json!(
            app,
            "/get_transcript?videoId=dQw4w9WgXcQ&preserveFormatting=true"
        );
        assert_eq!(body["segments"][0]["text"], "We're no strangers to <i>love</i>");

        let (status, body) = get_json!(app, "/get_transcript?videoId=dQw4w9WgXcQ&language=de");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "LanguageUnavailable");
    }

    #[actix_web::test]
    async fn test_get_transcript_language_priority_list() {
        let app = test_app!(test_metrics());

        let (status, body) = get_json!(app, "/get_transcript?videoId=dQw4w9WgXcQ&language=ja,es");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["languageCode"], "es");

        let (status, body) = get_json!(app, "/get_transcript?videoId=dQw4w9WgXcQ&language=ja,de");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "LanguageUnavailable");

        let (status, body) = get_json!(
            app,
            "/translate_transcript?videoId=dQw4w9WgXcQ&sourceLanguage=pt,en&targetLanguage=fr"
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["languageCode"], "fr");
    }

    #[actix_web::test]
    async fn test_list_transcripts() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/list_transcripts?videoId=dQw4w9WgXcQ");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["languageCode"], "en");
        assert_eq!(body[0]["isTranslatable"], true);
        assert_eq!(body[0]["translationLanguages"][0]["languageCode"], "fr");
        assert_eq!(body[1]["isGenerated"], true);
    }

    #[actix_web::test]
    async fn test_list_transcripts_disabled_is_not_found() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/list_transcripts?videoId=noCaptions1");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NotFound");
    }

    #[actix_web::test]
    async fn test_translate_transcript() {
        let app = test_app!(test_metrics());

        let (status, body) = get_json!(
            app,
            "/translate_transcript?videoId=dQw4w9WgXcQ&sourceLanguage=en&targetLanguage=fr"
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["languageCode"], "fr");
        assert_eq!(body["isGenerated"], true);

        let (status, body) = get_json!(
            app,
            "/translate_transcript?videoId=dQw4w9WgXcQ&sourceLanguage=en&targetLanguage=ja"
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "TranslationUnavailable");

        let (status, body) = get_json!(
            app,
            "/translate_transcript?videoId=dQw4w9WgXcQ&sourceLanguage=es&targetLanguage=fr"
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "TranslationUnavailable");

        let (status, body) = get_json!(
            app,
            "/translate_transcript?videoId=dQw4w9WgXcQ&sourceLanguage=&targetLanguage=fr"
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "InvalidParameter");
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test_app!(test_metrics());
        let (status, body) = get_json!(app, "/health");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[actix_web::test]
    async fn test_requests_are_metered() {
        let app = test_app!(test_metrics());
        let _ = get_json!(app, "/get_title?videoId=dQw4w9WgXcQ");
        let _ = get_json!(app, "/list_transcripts?videoId=noCaptions1");

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains(
            "http_requests_total{endpoint=\"/get_title\",method=\"GET\",status=\"200\"} 1"
        ));
        assert!(text.contains(
            "http_requests_total{endpoint=\"/list_transcripts\",method=\"GET\",status=\"404\"} 1"
        ));
        assert!(text.contains(
            "upstream_requests_total{operation=\"get_title\",outcome=\"success\",provider=\"youtube_data\"} 1"
        ));
        assert!(text.contains(
            "upstream_requests_total{operation=\"list_transcripts\",outcome=\"not_found\",provider=\"youtube_transcripts\"} 1"
        ));
    }
}
