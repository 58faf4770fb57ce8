//! HTTP surface: the gateway entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use quill_core::{GenerateRequest, ProviderKey};

use crate::gate;
use crate::state::AppState;

/// Successful generation response
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub provider: String,
    pub model_used: String,
    pub is_html: bool,
    pub content: String,
}

/// Model listing response
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub provider: String,
    pub count: usize,
    pub models: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query parameters for the model listing endpoint
#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    pub provider: Option<String>,
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Create the router with all routes and gates.
///
/// The IP gate wraps everything; the shared-secret gate wraps the API
/// routes but not `/health`.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/generate", post(generate_handler))
        .route("/models", get(models_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_api_key,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::ip_allowlist,
        ))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Generation handler - POST /generate
async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> impl IntoResponse {
    if request.prompt.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "prompt must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let provider = match state.registry.resolve(&request.provider) {
        Ok(provider) => provider,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    info!(
        "Generation request for provider '{}' ({} mode)",
        provider.name(),
        if request.output_mode.is_html() { "html" } else { "plain-text" }
    );

    match provider.generate(&request).await {
        Ok(content) => {
            let model_used = request.resolved_model(provider.default_model()).to_string();
            (
                StatusCode::OK,
                Json(GenerateResponse {
                    provider: provider.name().to_string(),
                    model_used,
                    is_html: request.output_mode.is_html(),
                    content,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Generation via '{}' failed: {}", provider.name(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Generation failed: {e}"),
                }),
            )
                .into_response()
        }
    }
}

/// Model listing handler - GET /models?provider=...
async fn models_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelsQuery>,
) -> impl IntoResponse {
    let key = query
        .provider
        .unwrap_or_else(|| ProviderKey::Google.as_str().to_string());

    let provider = match state.registry.resolve(&key) {
        Ok(provider) => provider,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    match provider.list_models().await {
        Ok(models) => (
            StatusCode::OK,
            Json(ModelsResponse {
                provider: provider.name().to_string(),
                count: models.len(),
                models,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Model listing via '{}' failed: {}", provider.name(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Model listing failed: {e}"),
                }),
            )
                .into_response()
        }
    }
}
