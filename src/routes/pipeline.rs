use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::jobs::daily_pipeline_job::run_daily_pipeline;
use crate::models::RunStatus;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/daily", get(trigger_daily))
}

async fn trigger_daily(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> axum::response::Response {
    if !authorized(&headers, &addr, &state.config.cron_secret) {
        warn!("unauthorized pipeline trigger from {}", addr);
        return AppError::Unauthorized.into_response();
    }

    info!("GET /api/cron/daily - Pipeline trigger from {}", addr);
    match run_daily_pipeline(&state.pool, &state.sources).await {
        Ok(outcome) => {
            let status = match outcome.status {
                RunStatus::Success => StatusCode::OK,
                RunStatus::Partial => StatusCode::MULTI_STATUS,
                RunStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(outcome)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Bearer-token check against the shared secret; loopback callers are
/// exempt for local development.
fn authorized(headers: &HeaderMap, addr: &SocketAddr, secret: &str) -> bool {
    if addr.ip().is_loopback() {
        return true;
    }
    if secret.is_empty() {
        return false;
    }
    let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return false;
    };
    constant_time_eq(token.as_bytes(), secret.as_bytes())
}

/// Compare without short-circuiting on the first mismatching byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn remote_addr() -> SocketAddr {
        "203.0.113.10:443".parse().unwrap()
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secrex"));
        assert!(!constant_time_eq(b"secret", b"secre"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn bearer_token_required_for_remote_callers() {
        let mut headers = HeaderMap::new();
        assert!(!authorized(&headers, &remote_addr(), "s3cret"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong"),
        );
        assert!(!authorized(&headers, &remote_addr(), "s3cret"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer s3cret"),
        );
        assert!(authorized(&headers, &remote_addr(), "s3cret"));
    }

    #[test]
    fn loopback_is_exempt() {
        let headers = HeaderMap::new();
        let local: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert!(authorized(&headers, &local, "s3cret"));
    }

    #[test]
    fn empty_secret_rejects_remote_callers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(!authorized(&headers, &remote_addr(), ""));
    }
}
