//! REST API routes.

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use std::sync::Arc;

use crate::api::auth::{self, RateLimiter};
use crate::api::{admin, obstacles, request_id, server_info};
use crate::config::Config;
use crate::state::AppState;

/// Create the API router.
///
/// Interop endpoints accept any verb at the routing layer so that non-GET
/// requests get the same 400 response as other client errors.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let rate_limiter = RateLimiter::new(
        config.rate_limit_rps,
        config.rate_limit_enabled,
        config.trust_proxy,
    );

    let interop_routes = Router::new()
        .route("/api/interop/obstacles", any(obstacles::get_obstacles))
        .route("/api/interop/server_info", any(server_info::get_server_info))
        .layer(middleware::from_fn_with_state(rate_limiter, auth::rate_limit));

    let admin_routes =
        Router::new().route("/api/admin/access_rates", any(admin::get_access_rates));

    Router::new()
        .merge(interop_routes)
        .merge(admin_routes)
        .route("/health", get(|| async { "OK" }))
        .layer(middleware::from_fn(request_id::ensure_request_id))
}
