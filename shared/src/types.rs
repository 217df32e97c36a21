//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fuel product categories, used for coefficient and loss-rate lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Gasoline,
    Diesel,
    Kerosene,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Gasoline => "GASOLINE",
            ProductCategory::Diesel => "DIESEL",
            ProductCategory::Kerosene => "KEROSENE",
        }
    }

    /// Classify a product code (XD95, E5RON92, DO, DHO, ...)
    ///
    /// Unrecognized codes fall back to gasoline.
    pub fn from_code(product_code: &str) -> Self {
        let code = product_code.to_uppercase();

        if code.contains("XD") || code.contains("RON") || code.contains("E5") {
            return ProductCategory::Gasoline;
        }

        if code.contains("DO") || code.contains("DIESEL") {
            return ProductCategory::Diesel;
        }

        if code.contains("KEROSENE") || code.contains("DHO") {
            return ProductCategory::Kerosene;
        }

        ProductCategory::Gasoline
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GASOLINE" => Ok(ProductCategory::Gasoline),
            "DIESEL" => Ok(ProductCategory::Diesel),
            "KEROSENE" => Ok(ProductCategory::Kerosene),
            _ => Err("unknown product category"),
        }
    }
}

/// Outcome of comparing received volume against allowed transport loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExcessShortageStatus {
    Excess,
    Shortage,
    Normal,
}

impl ExcessShortageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcessShortageStatus::Excess => "EXCESS",
            ExcessShortageStatus::Shortage => "SHORTAGE",
            ExcessShortageStatus::Normal => "NORMAL",
        }
    }

    /// Positive volume → excess, negative → shortage, zero → normal
    pub fn from_volume(excess_shortage: Decimal) -> Self {
        if excess_shortage > Decimal::ZERO {
            ExcessShortageStatus::Excess
        } else if excess_shortage < Decimal::ZERO {
            ExcessShortageStatus::Shortage
        } else {
            ExcessShortageStatus::Normal
        }
    }
}

/// Kind of a report segment: frozen by a closing snapshot, or live from the
/// ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentType {
    Closed,
    Open,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_gasoline_codes() {
        assert_eq!(ProductCategory::from_code("XD95"), ProductCategory::Gasoline);
        assert_eq!(ProductCategory::from_code("xd92"), ProductCategory::Gasoline);
        assert_eq!(ProductCategory::from_code("E5RON92"), ProductCategory::Gasoline);
    }

    #[test]
    fn classifies_diesel_and_kerosene_codes() {
        assert_eq!(ProductCategory::from_code("DO"), ProductCategory::Diesel);
        assert_eq!(ProductCategory::from_code("DIESEL-B5"), ProductCategory::Diesel);
        assert_eq!(ProductCategory::from_code("DHO"), ProductCategory::Kerosene);
        assert_eq!(ProductCategory::from_code("KEROSENE"), ProductCategory::Kerosene);
    }

    #[test]
    fn unknown_codes_fall_back_to_gasoline() {
        assert_eq!(ProductCategory::from_code("ABC123"), ProductCategory::Gasoline);
    }

    #[test]
    fn status_from_volume_sign() {
        assert_eq!(
            ExcessShortageStatus::from_volume(Decimal::new(1, 2)),
            ExcessShortageStatus::Excess
        );
        assert_eq!(
            ExcessShortageStatus::from_volume(Decimal::new(-1, 2)),
            ExcessShortageStatus::Shortage
        );
        assert_eq!(
            ExcessShortageStatus::from_volume(Decimal::ZERO),
            ExcessShortageStatus::Normal
        );
    }
}
