//! HTTP handlers for inventory documents and stock queries

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    CreateDocumentInput, CreateTruckDocumentInput, DocumentDetail, DocumentListQuery,
    InitialStockInput, InventoryDocument, InventoryService, TruckDocumentResult,
};
use crate::services::stock_calculator::{
    CapacityCheck, ExportCheck, ProductStock, StockCalculatorService, TankProductStock, TankStock,
};
use crate::AppState;

/// Query string carrying a quantity for the advisory guards
#[derive(Debug, Deserialize)]
pub struct QuantityQuery {
    pub quantity: Decimal,
}

/// Optional upper time bound for balance queries
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<DateTime<Utc>>,
}

/// Post an import/export/transfer/adjustment document
pub async fn create_document(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateDocumentInput>,
) -> AppResult<Json<InventoryDocument>> {
    let service = InventoryService::new(state.db);
    let document = service
        .create_document(current_user.0.user_id, input)
        .await?;
    Ok(Json(document))
}

/// Post a tanker-truck receiving document with temperature compensation
pub async fn create_truck_document(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTruckDocumentInput>,
) -> AppResult<Json<TruckDocumentResult>> {
    let service = InventoryService::new(state.db);
    let result = service
        .create_truck_document(current_user.0.user_id, input)
        .await?;
    Ok(Json(result))
}

/// List documents with optional filters
pub async fn list_documents(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<DocumentListQuery>,
) -> AppResult<Json<Vec<InventoryDocument>>> {
    let service = InventoryService::new(state.db);
    let documents = service.list_documents(&query).await?;
    Ok(Json(documents))
}

/// Get one document with items and compartments
pub async fn get_document(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentDetail>> {
    let service = InventoryService::new(state.db);
    let detail = service.get_document(document_id).await?;
    Ok(Json(detail))
}

/// Administrative reversal of a whole document
pub async fn delete_document(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = InventoryService::new(state.db);
    service.delete_document(document_id).await?;
    Ok(Json(()))
}

/// Initial-stock workflow for a tank baseline
pub async fn set_initial_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<InitialStockInput>,
) -> AppResult<Json<()>> {
    let service = InventoryService::new(state.db);
    service.set_initial_stock(input).await?;
    Ok(Json(()))
}

/// Current stock of one tank
pub async fn get_tank_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(tank_id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Decimal>> {
    let service = StockCalculatorService::new(state.db);
    let stock = service.get_tank_stock(tank_id, query.as_of).await?;
    Ok(Json(stock))
}

/// Advisory export check for a tank
pub async fn check_can_export(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(tank_id): Path<Uuid>,
    Query(query): Query<QuantityQuery>,
) -> AppResult<Json<ExportCheck>> {
    let service = StockCalculatorService::new(state.db);
    let check = service.can_export(tank_id, query.quantity).await?;
    Ok(Json(check))
}

/// Advisory capacity check for a tank
pub async fn check_capacity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(tank_id): Path<Uuid>,
    Query(query): Query<QuantityQuery>,
) -> AppResult<Json<CapacityCheck>> {
    let service = StockCalculatorService::new(state.db);
    let check = service.will_exceed_capacity(tank_id, query.quantity).await?;
    Ok(Json(check))
}

/// All product balances in a warehouse
pub async fn get_warehouse_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProductStock>>> {
    let service = StockCalculatorService::new(state.db);
    let stock = service.get_warehouse_stock(warehouse_id).await?;
    Ok(Json(stock))
}

/// Warehouse balances broken down by tank
pub async fn get_warehouse_stock_by_tank(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<Vec<TankProductStock>>> {
    let service = StockCalculatorService::new(state.db);
    let stock = service.get_warehouse_stock_by_tank(warehouse_id).await?;
    Ok(Json(stock))
}

/// Stock of one product in one warehouse
pub async fn get_warehouse_product_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((warehouse_id, product_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Decimal>> {
    let service = StockCalculatorService::new(state.db);
    let stock = service
        .get_warehouse_product_stock(warehouse_id, product_id, query.as_of)
        .await?;
    Ok(Json(stock))
}

/// Stock of every active tank in a store with capacity utilisation
pub async fn get_store_tanks_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<TankStock>>> {
    current_user.0.ensure_store_access(store_id)?;
    let service = StockCalculatorService::new(state.db);
    let stock = service.get_store_tanks_stock(store_id).await?;
    Ok(Json(stock))
}
