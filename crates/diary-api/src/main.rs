use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diary_api::{router, AppState, IngestionPipeline, ServerConfig, TelegramClient};
use diary_db::{Database, FilesystemBackend, StorageBackend};
use diary_inference::{
    EventExtractor, GenerationBackend, OpenAIBackend, TranscriptionBackend, WhisperBackend,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "diary_api=debug,diary_db=info,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "diary_api=debug,diary_db=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("diary-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env();

    let db = Database::connect(&config.database_url).await?;
    if config.run_migrations {
        db.migrate().await?;
        info!("Database migrations applied");
    }

    let store = FilesystemBackend::new(config.storage_path.clone());
    store.validate().await?;
    let storage: Arc<dyn StorageBackend> = Arc::new(store);
    info!(path = %config.storage_path.display(), "Object store ready");

    let transcription: Option<Arc<dyn TranscriptionBackend>> = match WhisperBackend::from_env() {
        Some(backend) => {
            info!(model = backend.model_name(), "Transcription backend configured");
            Some(Arc::new(backend))
        }
        None => {
            warn!("WHISPER_BASE_URL not set; voice notes will not be transcribed");
            None
        }
    };

    let extractor = match OpenAIBackend::from_env()? {
        Some(backend) => {
            info!(model = backend.model_name(), "Extraction backend configured");
            let backend: Arc<dyn GenerationBackend> = Arc::new(backend);
            Some(EventExtractor::new(backend))
        }
        None => {
            warn!("OPENAI_BASE_URL/OPENAI_API_KEY not set; event extraction disabled");
            None
        }
    };

    let mut state =
        AppState::new(db.clone(), storage.clone()).with_transcription(transcription.clone());

    if let Some(telegram) = &config.telegram {
        let client = TelegramClient::new(&telegram.api_base_url, &telegram.bot_token)?;
        let pipeline = IngestionPipeline::new(
            Arc::new(client),
            storage.clone(),
            Arc::new(db.events.clone()),
            Arc::new(db.debug_logs.clone()),
        )
        .with_transcription(transcription)
        .with_extractor(extractor);
        state = state.with_ingestion(Some(Arc::new(pipeline)), telegram.webhook_secret.clone());
        info!(
            secret_configured = telegram.webhook_secret.is_some(),
            "Telegram ingestion enabled"
        );
    } else {
        warn!("TELEGRAM_BOT_TOKEN not set; webhook will answer 500");
    }

    let app = router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
