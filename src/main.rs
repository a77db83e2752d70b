use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use youtube_data_api::config_loader::{config_file_path, load_config};
use youtube_data_api::config_validator::validate_config;
use youtube_data_api::handlers::{
    get_thumbnail, get_title, get_transcript, health, list_transcripts, metrics_handler,
    query_config, translate_transcript, Authentication,
};
use youtube_data_api::metrics::{create_metrics_exporter, Metrics};
use youtube_data_api::providers::{
    MetadataProvider, TranscriptProvider, YouTubeDataClient, YouTubeTranscriptClient,
};
use youtube_data_api::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Load configuration file into the environment, then validate it
    if !load_config() {
        info!(
            "No configuration file loaded from {}, using environment and defaults",
            config_file_path().display()
        );
    }
    if validate_config().is_err() {
        error!("Invalid configuration, aborting startup");
        std::process::exit(1);
    }
    let config = AppConfig::from_env();

    // Initialize metrics
    let metrics = match create_metrics_exporter(&config.metrics) {
        Ok(exporter) => Metrics::new(exporter),
        Err(e) => {
            warn!("Failed to initialize metrics exporter, metrics disabled: {}", e);
            Metrics::disabled()
        }
    };

    // Initialize the upstream providers
    let metadata: Arc<dyn MetadataProvider> = Arc::new(
        YouTubeDataClient::new(&config.providers).map_err(std::io::Error::other)?,
    );
    let transcripts: Arc<dyn TranscriptProvider> = Arc::new(
        YouTubeTranscriptClient::new(&config.providers).map_err(std::io::Error::other)?,
    );

    let server = config.server.clone();
    let workers = server.effective_workers();
    info!("Starting YouTube Data API server on http://{}", server.bind_address());
    info!("YouTube Data API base URL: {}", config.providers.data_api_base_url);
    info!("YouTube base URL: {}", config.providers.youtube_base_url);
    info!("Upstream timeout: {}s", config.providers.upstream_timeout);
    info!("HTTP workers: {}", workers);
    info!(
        "Authentication: {}, metrics: {}",
        if config.auth.enabled { "enabled" } else { "disabled" },
        if config.metrics.enabled { "enabled" } else { "disabled" }
    );
    let auth_config = config.auth.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Authentication::new(auth_config.clone(), metrics.clone()))
            .wrap(Logger::default())
            .app_data(query_config())
            .app_data(web::Data::from(Arc::clone(&metadata)))
            .app_data(web::Data::from(Arc::clone(&transcripts)))
            .app_data(web::Data::new(metrics.clone()))
            .service(get_title)
            .service(get_thumbnail)
            .service(get_transcript)
            .service(list_transcripts)
            .service(translate_transcript)
            .service(health)
            .service(metrics_handler)
    })
    .workers(workers)
    .bind(server.bind_address())?
    .keep_alive(Duration::from_secs(server.keep_alive))
    .run()
    .await
}
