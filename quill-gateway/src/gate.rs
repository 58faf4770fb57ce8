//! Request gates applied before any handler runs: the IP allow-list and
//! the shared-secret header check.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::server::ErrorResponse;
use crate::state::AppState;

/// Wildcard entry that disables the IP gate.
const ALLOW_ALL: &str = "*";

/// IP allow-list gate. Runs before authentication.
///
/// The client address comes from `X-Forwarded-For` when a proxy set it,
/// otherwise from the connection itself. A request whose address cannot
/// be determined passes through; the shared-secret gate still applies.
pub async fn ip_allowlist(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.allowed_ips.iter().any(|entry| entry == ALLOW_ALL) {
        return next.run(request).await;
    }

    if let Some(ip) = client_ip(&request) {
        let ip = fold_loopback(ip);
        if !state.allowed_ips.iter().any(|entry| *entry == ip) {
            warn!("Rejected request from unlisted address {}", ip);
            return (
                StatusCode::FORBIDDEN,
                format!("Access denied: address {ip} is not allowed"),
            )
                .into_response();
        }
    }

    next.run(request).await
}

/// Shared-secret gate: `x-api-key` must match the configured secret.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    if provided != Some(state.api_key.as_str()) {
        warn!("Rejected request with invalid or missing API key");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized: invalid or missing API key".to_string(),
            }),
        )
            .into_response();
    }

    next.run(request).await
}

fn client_ip(request: &Request) -> Option<String> {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next().map(str::trim)
        && first.parse::<IpAddr>().is_ok()
    {
        return Some(first.to_string());
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
}

/// IPv6 loopback folds to IPv4 so one allow-list entry covers both.
fn fold_loopback(ip: String) -> String {
    if ip == "::1" {
        "127.0.0.1".to_string()
    } else {
        ip
    }
}
