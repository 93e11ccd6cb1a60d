//! Obstacle query endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, Method},
    Json,
};
use interop_core::{
    build_snapshot, resolve_logging, AccessError, ObstacleAccessLog, ObstacleSnapshot,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::auth;
use crate::api::error::ApiError;
use crate::persistence::{access_logs, obstacles};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// `true` or `false`; absent means the access is logged.
    pub log: Option<String>,
}

impl LogQuery {
    /// The `log` value of an extracted query. A query string that does not
    /// parse (a repeated `log`, for one) is reported as an invalid parameter,
    /// so it is only checked after the caller is authenticated.
    pub fn log_param(
        query: Result<Query<LogQuery>, QueryRejection>,
    ) -> Result<Option<String>, AccessError> {
        match query {
            Ok(Query(query)) => Ok(query.log),
            Err(rejection) => Err(AccessError::InvalidParameter {
                name: "log",
                value: rejection.body_text(),
            }),
        }
    }
}

/// Current obstacle snapshot.
///
/// Authenticate, check the verb and `log` parameter, resolve every obstacle
/// at one instant, then record the access before the response is built.
pub async fn get_obstacles(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<ObstacleSnapshot>, ApiError> {
    let principal = auth::authenticate(&state, &headers)?;
    auth::require_get(&method)?;
    let log = LogQuery::log_param(query)?;
    let log_access = resolve_logging(&principal, log.as_deref())?;

    let pool = state.db().pool();
    let now = state.now();
    let (stationary, moving) = obstacles::load_obstacles(pool).await?;
    let snapshot = build_snapshot(&stationary, &moving, now, state.obstacle_epoch());

    if log_access {
        let entry = ObstacleAccessLog {
            user_id: principal.user_id,
            timestamp: state.now(),
        };
        access_logs::record_obstacle_access(pool, &entry).await?;
        tracing::debug!(user = %principal.username, "Logged obstacle access");
    } else {
        tracing::debug!(user = %principal.username, "Obstacle access logging suppressed");
    }

    Ok(Json(snapshot))
}
