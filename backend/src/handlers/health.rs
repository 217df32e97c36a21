//! Health check handler

use axum::extract::State;

use crate::error::AppResult;
use crate::AppState;

/// Health check that also verifies database connectivity
pub async fn health_check(State(state): State<AppState>) -> AppResult<&'static str> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await?;
    Ok("OK")
}
