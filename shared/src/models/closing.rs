//! Period-closing data shapes

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-tank line of a closing preview, an executed closing, or a report
/// segment.
///
/// Invariant: `closing_balance = opening_balance + import_quantity
/// − export_quantity − loss_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingItem {
    pub tank_id: Uuid,
    pub tank_code: String,
    pub tank_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_category: String,
    pub opening_balance: Decimal,
    pub import_quantity: Decimal,
    pub export_quantity: Decimal,
    pub loss_rate: Decimal,
    pub loss_amount: Decimal,
    pub closing_balance: Decimal,
    pub loss_config_id: Option<Uuid>,
}

/// Unpersisted preview of a period closing for one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingPreview {
    pub store_id: Uuid,
    pub store_name: String,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub items: Vec<ClosingItem>,
}
