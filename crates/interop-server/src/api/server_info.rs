//! Server info endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, Method},
    Json,
};
use interop_core::{resolve_logging, ServerInfoAccessLog, ServerInfoResponse};
use std::sync::Arc;

use crate::api::auth;
use crate::api::error::ApiError;
use crate::api::obstacles::LogQuery;
use crate::persistence::{access_logs, server_info};
use crate::state::AppState;

/// Latest team message. Follows the same access and logging rules as the
/// obstacle endpoint.
pub async fn get_server_info(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<ServerInfoResponse>, ApiError> {
    let principal = auth::authenticate(&state, &headers)?;
    auth::require_get(&method)?;
    let log = LogQuery::log_param(query)?;
    let log_access = resolve_logging(&principal, log.as_deref())?;

    let pool = state.db().pool();
    let info = server_info::latest_server_info(pool)
        .await?
        .ok_or(ApiError::NotFound("server info"))?;

    if log_access {
        let entry = ServerInfoAccessLog {
            user_id: principal.user_id,
            timestamp: state.now(),
        };
        access_logs::record_server_info_access(pool, &entry).await?;
        tracing::debug!(user = %principal.username, "Logged server info access");
    }

    Ok(Json(info.to_response()))
}
