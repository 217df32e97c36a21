//! HTTP handlers for the petroleum temperature-compensation calculator
//!
//! Pure calculations exposed for the receiving form: no persistence happens
//! here.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::AppState;
use shared::petroleum::{
    calculate_compartment, calculate_document, CompartmentCalculation, DocumentCalculation,
    DocumentCompartment,
};
use shared::validation::{validate_quantity, validate_temperature};

/// Input for a single-compartment calculation
#[derive(Debug, Deserialize)]
pub struct CompartmentCalcRequest {
    pub truck_volume: Decimal,
    pub truck_temperature: Decimal,
    pub actual_temperature: Decimal,
    pub product_code: String,
}

/// Input for a document-level calculation
#[derive(Debug, Deserialize)]
pub struct DocumentCalcRequest {
    pub compartments: Vec<DocumentCompartment>,
}

/// Temperature compensation for one truck compartment
pub async fn calculate_compartment_handler(
    State(_state): State<AppState>,
    _current_user: CurrentUser,
    Json(request): Json<CompartmentCalcRequest>,
) -> AppResult<Json<CompartmentCalculation>> {
    if let Err(msg) = validate_quantity(request.truck_volume) {
        return Err(AppError::Validation {
            field: "truck_volume".to_string(),
            message: msg.to_string(),
            message_vi: "Thể tích tại xe phải là số dương".to_string(),
        });
    }
    for (field, temperature) in [
        ("truck_temperature", request.truck_temperature),
        ("actual_temperature", request.actual_temperature),
    ] {
        if let Err(msg) = validate_temperature(temperature) {
            return Err(AppError::Validation {
                field: field.to_string(),
                message: msg.to_string(),
                message_vi: "Nhiệt độ ngoài khoảng hợp lý".to_string(),
            });
        }
    }

    let calculation = calculate_compartment(
        request.truck_volume,
        request.truck_temperature,
        request.actual_temperature,
        &request.product_code,
    );
    Ok(Json(calculation))
}

/// Document-level totals and excess/shortage status
pub async fn calculate_document_handler(
    State(_state): State<AppState>,
    _current_user: CurrentUser,
    Json(request): Json<DocumentCalcRequest>,
) -> AppResult<Json<DocumentCalculation>> {
    let calculation =
        calculate_document(&request.compartments).map_err(|_| AppError::BusinessRuleViolation {
            message: "A truck document must have at least one measured compartment".to_string(),
            message_vi: "Phiếu nhập xe téc phải có ít nhất một ngăn đo đạc".to_string(),
        })?;
    Ok(Json(calculation))
}
