//! Petroleum temperature compensation and transport-loss calculations
//!
//! Pure functions, no persistence. Volumes are normalized to the 15 °C
//! standard temperature before cross-temperature comparison, and each
//! product category carries a fixed expansion coefficient (β) and transport
//! loss coefficient (α).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ExcessShortageStatus, ProductCategory};

/// Standard reference temperature (°C)
pub const STANDARD_TEMPERATURE: Decimal = Decimal::from_parts(15, 0, 0, false, 0);

/// Average volumetric expansion coefficient β per product category
pub fn expansion_coefficient(category: ProductCategory) -> Decimal {
    match category {
        ProductCategory::Gasoline => Decimal::new(13, 4), // 0.0013
        ProductCategory::Diesel => Decimal::new(9, 4),    // 0.0009
        ProductCategory::Kerosene => Decimal::new(1, 3),  // 0.001
    }
}

/// Average transport loss coefficient α per product category
///
/// The reference table carries no kerosene row; kerosene shipments use the
/// gasoline coefficient.
pub fn loss_coefficient(category: ProductCategory) -> Decimal {
    match category {
        ProductCategory::Diesel => Decimal::new(3, 4), // 0.0003
        ProductCategory::Gasoline | ProductCategory::Kerosene => Decimal::new(75, 5), // 0.00075
    }
}

/// V15 = Vt / (1 + β·(t − 15))
pub fn to_standard_temperature(volume: Decimal, temperature: Decimal, beta: Decimal) -> Decimal {
    let denominator = Decimal::ONE + beta * (temperature - STANDARD_TEMPERATURE);
    volume / denominator
}

/// Vt = V15 · (1 + β·(t − 15))
pub fn from_standard_temperature(
    volume_at_15: Decimal,
    temperature: Decimal,
    beta: Decimal,
) -> Decimal {
    volume_at_15 * (Decimal::ONE + beta * (temperature - STANDARD_TEMPERATURE))
}

/// Allowed transport loss for a shipped volume
pub fn allowed_loss(volume: Decimal, alpha: Decimal) -> Decimal {
    volume * alpha
}

/// Excess/shortage = received − actual loss − allowed loss
pub fn excess_shortage(
    received_volume: Decimal,
    actual_loss: Decimal,
    allowed: Decimal,
) -> Decimal {
    received_volume - actual_loss - allowed
}

/// Result of the per-compartment temperature compensation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentCalculation {
    pub volume_at_15: Decimal,
    pub actual_volume: Decimal,
    pub allowed_loss: Decimal,
    pub expansion_coefficient: Decimal,
    pub loss_coefficient: Decimal,
}

/// Convert a truck-measured volume to the warehouse-measured temperature via
/// the 15 °C standard, and compute the allowed transport loss for the
/// compartment.
pub fn calculate_compartment(
    truck_volume: Decimal,
    truck_temperature: Decimal,
    actual_temperature: Decimal,
    product_code: &str,
) -> CompartmentCalculation {
    let category = ProductCategory::from_code(product_code);
    let beta = expansion_coefficient(category);
    let alpha = loss_coefficient(category);

    let volume_at_15 = to_standard_temperature(truck_volume, truck_temperature, beta);
    let actual_volume = from_standard_temperature(volume_at_15, actual_temperature, beta);

    CompartmentCalculation {
        volume_at_15,
        actual_volume,
        allowed_loss: allowed_loss(truck_volume, alpha),
        expansion_coefficient: beta,
        loss_coefficient: alpha,
    }
}

/// One measured truck compartment, as entered on the receiving report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCompartment {
    pub truck_volume: Decimal,
    pub actual_volume: Decimal,
    pub received_volume: Decimal,
    pub product_code: String,
}

/// Document-level totals for a tanker truck delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCalculation {
    pub expansion_coefficient: Decimal,
    pub loss_coefficient: Decimal,
    pub total_truck_volume: Decimal,
    pub total_actual_volume: Decimal,
    pub total_received_volume: Decimal,
    pub total_loss_volume: Decimal,
    pub allowed_loss_volume: Decimal,
    pub excess_shortage_volume: Decimal,
    pub temperature_adjustment_volume: Decimal,
    pub status: ExcessShortageStatus,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PetroleumError {
    /// A receiving report without measured compartments has no coefficients
    /// to apply and no quantity to post.
    #[error("document has no compartments")]
    NoCompartments,
}

/// Aggregate compartments into document totals.
///
/// Coefficients come from the first compartment; truck loads are assumed to
/// carry a single product.
pub fn calculate_document(
    compartments: &[DocumentCompartment],
) -> Result<DocumentCalculation, PetroleumError> {
    let first = compartments.first().ok_or(PetroleumError::NoCompartments)?;
    let category = ProductCategory::from_code(&first.product_code);
    let beta = expansion_coefficient(category);
    let alpha = loss_coefficient(category);

    let mut total_truck_volume = Decimal::ZERO;
    let mut total_actual_volume = Decimal::ZERO;
    let mut total_received_volume = Decimal::ZERO;
    let mut allowed_loss_volume = Decimal::ZERO;

    for compartment in compartments {
        total_truck_volume += compartment.truck_volume;
        total_actual_volume += compartment.actual_volume;
        total_received_volume += compartment.received_volume;
        allowed_loss_volume += allowed_loss(compartment.truck_volume, alpha);
    }

    let total_loss_volume = total_truck_volume - total_received_volume;
    let excess_shortage_volume =
        excess_shortage(total_received_volume, total_loss_volume, allowed_loss_volume);

    Ok(DocumentCalculation {
        expansion_coefficient: beta,
        loss_coefficient: alpha,
        total_truck_volume,
        total_actual_volume,
        total_received_volume,
        total_loss_volume,
        allowed_loss_volume,
        excess_shortage_volume,
        temperature_adjustment_volume: total_actual_volume - total_truck_volume,
        status: ExcessShortageStatus::from_volume(excess_shortage_volume),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn standard_temperature_conversion() {
        // 10 000 L of gasoline at 30 °C → 10 000 / (1 + 0.0013 × 15)
        let v15 = to_standard_temperature(dec("10000"), dec("30"), dec("0.0013"));
        assert_eq!(v15.round_dp(2), dec("9808.73"));
    }

    #[test]
    fn actual_volume_equals_v15_at_standard_temperature() {
        let calc = calculate_compartment(dec("10000"), dec("30"), dec("15"), "XD95");
        assert_eq!(calc.actual_volume.round_dp(6), calc.volume_at_15.round_dp(6));
    }

    #[test]
    fn empty_document_is_rejected() {
        assert_eq!(calculate_document(&[]), Err(PetroleumError::NoCompartments));
    }

    #[test]
    fn document_totals_and_status() {
        let compartments = vec![
            DocumentCompartment {
                truck_volume: dec("5000"),
                actual_volume: dec("5010"),
                received_volume: dec("4998"),
                product_code: "XD95".to_string(),
            },
            DocumentCompartment {
                truck_volume: dec("5000"),
                actual_volume: dec("5012"),
                received_volume: dec("4997"),
                product_code: "XD95".to_string(),
            },
        ];

        let calc = calculate_document(&compartments).unwrap();
        assert_eq!(calc.total_truck_volume, dec("10000"));
        assert_eq!(calc.total_received_volume, dec("9995"));
        assert_eq!(calc.total_loss_volume, dec("5"));
        // allowed loss = 10 000 × 0.00075 = 7.5
        assert_eq!(calc.allowed_loss_volume, dec("7.5"));
        // 9995 − 5 − 7.5 = 9982.5 → excess
        assert_eq!(calc.excess_shortage_volume, dec("9982.5"));
        assert_eq!(calc.status, ExcessShortageStatus::Excess);
        assert_eq!(calc.temperature_adjustment_volume, dec("22"));
    }
}
