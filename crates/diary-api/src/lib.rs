//! # diary-api
//!
//! HTTP API for the life diary backend: CRUD for people, tags, notes,
//! photos and habits, the Telegram voice-ingestion webhook, and the
//! object-store proxies.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use diary_db::{Database, StorageBackend};
use diary_inference::TranscriptionBackend;

pub use config::ServerConfig;
pub use error::ApiError;
pub use services::{IngestionPipeline, TelegramApi, TelegramClient};

/// Shared state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub storage: Arc<dyn StorageBackend>,
    /// Used by habit voice notes; `None` yields an empty transcription.
    pub transcription: Option<Arc<dyn TranscriptionBackend>>,
    /// `None` when no bot token is configured.
    pub ingestion: Option<Arc<IngestionPipeline>>,
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(db: Database, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            db,
            storage,
            transcription: None,
            ingestion: None,
            webhook_secret: None,
        }
    }

    pub fn with_transcription(mut self, backend: Option<Arc<dyn TranscriptionBackend>>) -> Self {
        self.transcription = backend;
        self
    }

    pub fn with_ingestion(
        mut self,
        pipeline: Option<Arc<IngestionPipeline>>,
        webhook_secret: Option<String>,
    ) -> Self {
        self.ingestion = pipeline;
        self.webhook_secret = webhook_secret;
        self
    }
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router with all routes and middleware.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    use handlers::*;

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        // Auth
        .route("/api/login", post(session::login))
        .route("/api/me", get(session::me))
        // People
        .route("/api/people", get(people::list_people).post(people::create_person))
        .route(
            "/api/people/:id",
            get(people::get_person)
                .put(people::update_person)
                .delete(people::delete_person),
        )
        // Tags
        .route("/api/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/api/tags/:id",
            put(tags::update_tag).delete(tags::delete_tag),
        )
        // Notes and photos
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/api/notes/:id/photos", post(photos::upload_photo))
        .route("/api/photo/*key", get(photos::serve_photo))
        .route("/api/photos/:id", delete(photos::delete_photo))
        .route("/api/search", get(search::search))
        .route("/api/categories", get(search::categories))
        // Habits
        .route("/api/default-habits", get(habits::list_default_habits))
        .route(
            "/api/people/:id/habits",
            get(habits::list_habits).post(habits::create_habit),
        )
        .route(
            "/api/people/:id/habits/init-defaults",
            post(habits::init_default_habits),
        )
        .route(
            "/api/habits/:id",
            put(habits::update_habit).delete(habits::delete_habit),
        )
        .route("/api/people/:id/habit-logs", get(habit_logs::list_logs))
        .route("/api/people/:id/habits/today", get(habit_logs::today_status))
        .route("/api/people/:id/habit-stats", get(habit_logs::stats))
        .route("/api/family-habits-summary", get(habit_logs::family_summary))
        .route("/api/habits/:id/log", post(habit_logs::log_habit))
        .route("/api/habits/:id/toggle", post(habit_logs::toggle_habit))
        .route("/api/habits/:id/voice-note", post(habit_logs::voice_note))
        // Ingested events
        .route("/api/events", get(events::list_events))
        .route("/api/event-data", get(events::list_event_data))
        .route("/api/telegram-debug", get(events::telegram_debug))
        .route("/api/audio/*key", get(events::serve_audio))
        .route("/api/telegram-webhook", post(telegram::webhook))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(axum::extract::DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state)
}
