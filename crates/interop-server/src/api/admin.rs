//! Superuser-only audit views.

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    Json,
};
use std::sync::Arc;

use crate::api::auth;
use crate::api::error::ApiError;
use crate::persistence::access_logs::{self, AccessRateSummary};
use crate::state::AppState;

/// Per-user obstacle polling statistics.
pub async fn get_access_rates(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
) -> Result<Json<Vec<AccessRateSummary>>, ApiError> {
    let principal = auth::authenticate(&state, &headers)?;
    auth::require_get(&method)?;
    auth::require_superuser(&principal, "view access rates")?;

    let summaries = access_logs::obstacle_access_rates(state.db().pool()).await?;
    Ok(Json(summaries))
}
