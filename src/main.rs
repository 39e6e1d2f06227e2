use std::sync::Arc;
use studysauce_backend::controllers::podcast::PodcastController;
use studysauce_backend::domain::podcast::{JobProcessor, PodcastService};
use studysauce_backend::infrastructure::config::{Config, LogFormat};
use studysauce_backend::infrastructure::http::{build_router, start_http_server};
use studysauce_backend::infrastructure::repositories::{
    ArtifactRepository, ElevenLabsVoiceRepository, GeminiContentRepository, JobRepository,
    PdfDocumentRepository,
};
use studysauce_backend::infrastructure::repositories::job_repository::HOUSEKEEPING_PERIOD;
use studysauce_backend::infrastructure::shutdown::install_shutdown_handler;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting StudySauce Backend on {}:{}",
        config.host,
        config.port
    );

    let shutdown = install_shutdown_handler()?;

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let artifact_repo = Arc::new(ArtifactRepository::new(config.output_dir.clone()));
    artifact_repo.ensure_dir().await?;
    tracing::info!(output_dir = %config.output_dir.display(), "Artifact directory ready");

    let job_repo = Arc::new(JobRepository::new(
        config.job_retention,
        artifact_repo.clone(),
    ));
    tokio::spawn(
        job_repo
            .clone()
            .run_housekeeping(HOUSEKEEPING_PERIOD, shutdown.clone()),
    );
    let document_repo = Arc::new(PdfDocumentRepository::new());
    let content_repo = Arc::new(GeminiContentRepository::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
        config.service_timeout,
    )?);
    let voice_repo = Arc::new(ElevenLabsVoiceRepository::new(
        config.elevenlabs_api_key.clone(),
        config.elevenlabs_model.clone(),
        config.elevenlabs_base_url.clone(),
        config.service_timeout,
    )?);
    tracing::info!(
        gemini_model = %config.gemini_model,
        elevenlabs_model = %config.elevenlabs_model,
        timeout_secs = config.service_timeout.as_secs(),
        "AI provider clients initialized"
    );

    // 2. Start the job processor
    tracing::info!("Starting job processor...");
    let (job_sender, job_receiver) = mpsc::channel(config.job_queue_capacity);
    let processor = Arc::new(JobProcessor::new(
        job_repo.clone(),
        artifact_repo.clone(),
        document_repo,
        content_repo,
        voice_repo,
        config.processor_settings(),
    ));
    let dispatcher = tokio::spawn(processor.run(
        job_receiver,
        config.job_concurrency,
        shutdown.clone(),
    ));

    // 3. Instantiate services
    tracing::info!("Instantiating services...");
    let podcast_service = Arc::new(PodcastService::new(
        job_repo,
        artifact_repo,
        job_sender,
        shutdown.clone(),
        config.max_upload_bytes,
    ));

    // 4. Instantiate controllers
    tracing::info!("Instantiating controllers...");
    let podcast_controller = Arc::new(PodcastController::new(podcast_service.clone()));

    // Start HTTP server with all routes
    let app = build_router(podcast_service, podcast_controller, config.max_upload_bytes);
    start_http_server(&config.host, config.port, app, shutdown.clone()).await?;

    shutdown.cancel();
    if let Err(e) = dispatcher.await {
        tracing::error!(error = %e, "Job dispatcher terminated abnormally");
    }

    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.default_log_filter().into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
