//! HTTP handlers for loss-rate configuration

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::loss_config::{
    CreateLossConfigInput, LossConfigService, LossRateConfig, UpdateLossConfigInput,
};
use crate::AppState;
use shared::types::ProductCategory;

/// Query string for the effective-rate lookup
#[derive(Debug, Deserialize)]
pub struct EffectiveRateQuery {
    pub store_id: Uuid,
    pub category: ProductCategory,
    pub date: Option<NaiveDate>,
}

/// List all configs of a store
pub async fn list_loss_configs_by_store(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<LossRateConfig>>> {
    current_user.0.ensure_store_access(store_id)?;
    let service = LossConfigService::new(state.db);
    let configs = service.find_by_store(store_id).await?;
    Ok(Json(configs))
}

/// List all configs across stores
pub async fn list_all_loss_configs(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<LossRateConfig>>> {
    let service = LossConfigService::new(state.db);
    let configs = service.find_all().await?;
    Ok(Json(configs))
}

/// Configs of a store effective today
pub async fn current_loss_configs(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<LossRateConfig>>> {
    current_user.0.ensure_store_access(store_id)?;
    let service = LossConfigService::new(state.db);
    let configs = service
        .current_configs(store_id, Utc::now().date_naive())
        .await?;
    Ok(Json(configs))
}

/// Loss rate effective at a date (today when omitted)
pub async fn get_effective_rate(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<EffectiveRateQuery>,
) -> AppResult<Json<Decimal>> {
    current_user.0.ensure_store_access(query.store_id)?;
    let service = LossConfigService::new(state.db);
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let rate = service
        .get_effective_rate(query.store_id, query.category, date)
        .await?;
    Ok(Json(rate))
}

/// Get one config
pub async fn get_loss_config(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(config_id): Path<Uuid>,
) -> AppResult<Json<LossRateConfig>> {
    let service = LossConfigService::new(state.db);
    let config = service.find_by_id(config_id).await?;
    Ok(Json(config))
}

/// Create a config, auto-closing the preceding open-ended window
pub async fn create_loss_config(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateLossConfigInput>,
) -> AppResult<Json<LossRateConfig>> {
    current_user.0.ensure_store_access(input.store_id)?;
    let service = LossConfigService::new(state.db);
    let config = service.create(input, Some(current_user.0.user_id)).await?;
    Ok(Json(config))
}

/// Update a config
pub async fn update_loss_config(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(config_id): Path<Uuid>,
    Json(input): Json<UpdateLossConfigInput>,
) -> AppResult<Json<LossRateConfig>> {
    let service = LossConfigService::new(state.db);
    let config = service.update(config_id, input).await?;
    Ok(Json(config))
}

/// Delete a config
pub async fn delete_loss_config(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(config_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = LossConfigService::new(state.db);
    service.delete(config_id).await?;
    Ok(Json(()))
}
