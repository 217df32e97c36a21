//! HTTP handlers for period closing and the segmented report

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::closing::{
    ClosingPeriod, ClosingRequest, InventoryClosing, InventoryClosingService,
};
use crate::services::report::{InventoryReportService, SegmentedReport};
use crate::AppState;
use crate::models::ClosingPreview;

/// Query string identifying one closing period of a store
#[derive(Debug, Deserialize)]
pub struct ClosingPeriodQuery {
    pub store_id: Uuid,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
}

/// Query string for the segmented report
#[derive(Debug, Deserialize)]
pub struct ReportRangeQuery {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// Preview a closing without persisting anything
pub async fn preview_closing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ClosingPeriodQuery>,
) -> AppResult<Json<ClosingPreview>> {
    current_user.0.ensure_store_access(query.store_id)?;
    let service = InventoryClosingService::new(state.db);
    let preview = service
        .preview_closing(&ClosingRequest {
            store_id: query.store_id,
            period_from: query.period_from,
            period_to: query.period_to,
            notes: None,
        })
        .await?;
    Ok(Json(preview))
}

/// Execute a closing, persisting one snapshot row per tank
pub async fn execute_closing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ClosingRequest>,
) -> AppResult<Json<Vec<InventoryClosing>>> {
    current_user.0.ensure_store_access(request.store_id)?;
    let service = InventoryClosingService::new(state.db);
    let closings = service
        .execute_closing(&request, Some(current_user.0.user_id))
        .await?;
    Ok(Json(closings))
}

/// Distinct closed periods of a store
pub async fn list_closing_periods(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<ClosingPeriod>>> {
    current_user.0.ensure_store_access(store_id)?;
    let service = InventoryClosingService::new(state.db);
    let periods = service.list_closing_periods(store_id).await?;
    Ok(Json(periods))
}

/// Segmented CLOSED/OPEN report over an arbitrary range
pub async fn get_segmented_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<ReportRangeQuery>,
) -> AppResult<Json<SegmentedReport>> {
    current_user.0.ensure_store_access(store_id)?;
    let service = InventoryReportService::new(state.db);
    let report = service
        .get_segmented_report(store_id, query.from_date, query.to_date)
        .await?;
    Ok(Json(report))
}

/// Delete the most recently closed period of a store
pub async fn delete_closing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ClosingPeriodQuery>,
) -> AppResult<Json<()>> {
    current_user.0.ensure_store_access(query.store_id)?;
    let service = InventoryClosingService::new(state.db);
    service
        .delete_closing(query.store_id, query.period_from, query.period_to)
        .await?;
    Ok(Json(()))
}
