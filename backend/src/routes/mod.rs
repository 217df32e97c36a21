//! Route definitions for the Fuel Depot Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - inventory documents and stock
        .nest("/inventory", inventory_routes())
        // Protected routes - period closing and segmented reporting
        .nest("/inventory-closing", closing_routes())
        // Protected routes - loss-rate configuration
        .nest("/loss-config", loss_config_routes())
        // Protected routes - petroleum calculator
        .nest("/petroleum", petroleum_routes())
}

/// Inventory document and stock routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Documents
        .route(
            "/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route("/documents/truck", post(handlers::create_truck_document))
        .route(
            "/documents/:document_id",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        // Initial stock (tank baseline)
        .route("/initial-stock", post(handlers::set_initial_stock))
        // Tank stock and advisory guards
        .route("/tanks/:tank_id/stock", get(handlers::get_tank_stock))
        .route("/tanks/:tank_id/can-export", get(handlers::check_can_export))
        .route("/tanks/:tank_id/capacity-check", get(handlers::check_capacity))
        // Warehouse stock
        .route(
            "/warehouses/:warehouse_id/stock",
            get(handlers::get_warehouse_stock),
        )
        .route(
            "/warehouses/:warehouse_id/stock/by-tank",
            get(handlers::get_warehouse_stock_by_tank),
        )
        .route(
            "/warehouses/:warehouse_id/products/:product_id/stock",
            get(handlers::get_warehouse_product_stock),
        )
        // Store-wide tank stock
        .route(
            "/stores/:store_id/tanks/stock",
            get(handlers::get_store_tanks_stock),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Period-closing routes (protected)
fn closing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::execute_closing).delete(handlers::delete_closing),
        )
        .route("/preview", get(handlers::preview_closing))
        .route("/periods/:store_id", get(handlers::list_closing_periods))
        .route("/report/:store_id", get(handlers::get_segmented_report))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Loss-rate configuration routes (protected)
fn loss_config_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_all_loss_configs).post(handlers::create_loss_config),
        )
        .route("/effective", get(handlers::get_effective_rate))
        .route("/store/:store_id", get(handlers::list_loss_configs_by_store))
        .route("/current/:store_id", get(handlers::current_loss_configs))
        .route(
            "/:config_id",
            get(handlers::get_loss_config)
                .put(handlers::update_loss_config)
                .delete(handlers::delete_loss_config),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Petroleum calculator routes (protected)
fn petroleum_routes() -> Router<AppState> {
    Router::new()
        .route("/compartment", post(handlers::calculate_compartment_handler))
        .route("/document", post(handlers::calculate_document_handler))
        .route_layer(middleware::from_fn(auth_middleware))
}
