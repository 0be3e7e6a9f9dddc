//! HTTP API server
//!
//! Stateless per request: conversation history and identifiers are
//! caller-supplied and never retained. The only shared state is an
//! immutable [`ApiState`] built once at startup.

pub mod chat;
pub mod health;
pub mod transcribe;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::Result;

/// Largest accepted request body; transcription uploads dominate
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for API handlers, read-only after construction
pub struct ApiState {
    pub settings: Settings,
    pub gemini: GeminiClient,
}

impl ApiState {
    /// # Errors
    ///
    /// Returns a configuration error if the Gemini API key is missing;
    /// the web surface requires it for both chat and transcription.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let gemini = GeminiClient::from_settings(&settings)?;
        Ok(Self { settings, gemini })
    }
}

/// Build the full API router
pub fn router(state: Arc<ApiState>) -> Router {
    let api = Router::new()
        .route("/chat", post(chat::chat))
        .route("/transcribe", post(transcribe::transcribe))
        .with_state(state.clone());

    let mut router = Router::new().merge(health::router()).nest("/api", api);

    if let Some(dir) = &state.settings.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Run the HTTP server until interrupted
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the listener
/// cannot bind.
pub async fn serve(settings: Settings, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(ApiState::from_settings(settings)?);
    let app = router(state);

    let listener = TcpListener::bind((host, port)).await?;
    tracing::info!(%host, port, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// API error carried to the client as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct ErrorBody {
            detail: String,
        }

        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
