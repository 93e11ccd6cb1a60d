//! Authentication helpers and rate limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use interop_core::{require_principal, AccessError, Principal};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::state::AppState;

pub const SESSION_TOKEN_HEADER: &str = "x-interop-token";

/// Extract a session token from headers.
/// Accepts `Authorization: Bearer <token>` or `X-Interop-Token: <token>`.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(text) = value.to_str() {
            if let Some(token) = text.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolve the caller, failing with `Unauthenticated` when there is none.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, AccessError> {
    let principal = extract_session_token(headers)
        .and_then(|token| state.identity().principal_for_token(&token));
    require_principal(principal)
}

/// Only read-only fetches are served.
pub fn require_get(method: &Method) -> Result<(), AccessError> {
    if *method == Method::GET {
        Ok(())
    } else {
        Err(AccessError::MethodNotAllowed(method.to_string()))
    }
}

pub fn require_superuser(principal: &Principal, action: &'static str) -> Result<(), AccessError> {
    if principal.is_superuser {
        Ok(())
    } else {
        Err(AccessError::Unauthorized(action))
    }
}

/// Sliding one-second window per client address.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<DashMap<String, Vec<Instant>>>,
    last_cleanup: Arc<Mutex<Instant>>,
    max_rps: u32,
    enabled: bool,
    trust_proxy: bool,
}

const RATE_WINDOW: Duration = Duration::from_secs(1);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

impl RateLimiter {
    pub fn new(max_rps: u32, enabled: bool, trust_proxy: bool) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            last_cleanup: Arc::new(Mutex::new(Instant::now())),
            max_rps,
            enabled,
            trust_proxy,
        }
    }

    /// Returns true if the request should be allowed.
    pub fn check(&self, client: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        if self.cleanup_due(now) {
            self.requests
                .retain(|_, stamps| stamps.iter().any(|t| now.duration_since(*t) < RATE_WINDOW));
        }

        let mut entry = self.requests.entry(client.to_string()).or_default();
        let stamps = entry.value_mut();
        stamps.retain(|t| now.duration_since(*t) < RATE_WINDOW);

        if stamps.len() < self.max_rps as usize {
            stamps.push(now);
            true
        } else {
            false
        }
    }

    fn cleanup_due(&self, now: Instant) -> bool {
        match self.last_cleanup.lock() {
            Ok(mut last) if now.duration_since(*last) >= CLEANUP_INTERVAL => {
                *last = now;
                true
            }
            _ => false,
        }
    }

    fn client_key(&self, request: &Request) -> String {
        let forwarded = if self.trust_proxy {
            request
                .headers()
                .get("X-Forwarded-For")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
        } else {
            None
        };

        forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Rate limiting middleware for the polling endpoints.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = limiter.client_key(&request);
    if limiter.check(&client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "retry_after": "1 second"
            })),
        )
            .into_response()
    }
}
