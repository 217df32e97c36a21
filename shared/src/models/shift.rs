//! Shift-related data shapes

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One product's opening stock at the start of a shift.
///
/// A list of these is materialized into the shift's opening-stock snapshot by
/// the shift-chain backfiller. It is a derived cache: the same values must be
/// recomputable from the ledger and prior shifts at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningStockItem {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub opening_stock: Decimal,
}

impl OpeningStockItem {
    /// Parse a persisted opening-stock snapshot, rejecting malformed entries
    /// instead of trusting the blob.
    pub fn parse_snapshot(value: &serde_json::Value) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}

/// Shift lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_round_trips_through_json() {
        let items = vec![OpeningStockItem {
            product_id: Uuid::nil(),
            product_code: "XD95".to_string(),
            product_name: "Xăng RON 95".to_string(),
            opening_stock: Decimal::new(2000, 0),
        }];

        let value = serde_json::to_value(&items).unwrap();
        let parsed = OpeningStockItem::parse_snapshot(&value).unwrap();
        assert_eq!(parsed, items);
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        let value = json!([{ "product_id": "not-a-uuid" }]);
        assert!(OpeningStockItem::parse_snapshot(&value).is_err());
    }
}
