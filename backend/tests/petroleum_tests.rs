//! Petroleum calculator tests
//!
//! Covers temperature compensation, allowed transport loss, and the
//! document-level excess/shortage calculation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::petroleum::{
    allowed_loss, calculate_compartment, calculate_document, expansion_coefficient,
    from_standard_temperature, loss_coefficient, to_standard_temperature, DocumentCompartment,
    PetroleumError, STANDARD_TEMPERATURE,
};
use shared::types::{ExcessShortageStatus, ProductCategory};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Coefficient table values
    #[test]
    fn test_coefficient_table() {
        assert_eq!(expansion_coefficient(ProductCategory::Gasoline), dec("0.0013"));
        assert_eq!(expansion_coefficient(ProductCategory::Diesel), dec("0.0009"));
        assert_eq!(expansion_coefficient(ProductCategory::Kerosene), dec("0.001"));

        assert_eq!(loss_coefficient(ProductCategory::Gasoline), dec("0.00075"));
        assert_eq!(loss_coefficient(ProductCategory::Diesel), dec("0.0003"));
        // No kerosene row in the loss table; falls back to gasoline
        assert_eq!(loss_coefficient(ProductCategory::Kerosene), dec("0.00075"));
    }

    /// 10 000 L of gasoline measured at 30 °C normalizes to ≈ 9 808.73 L
    #[test]
    fn test_volume_at_standard_temperature() {
        let v15 = to_standard_temperature(dec("10000"), dec("30"), dec("0.0013"));
        assert_eq!(v15.round_dp(2), dec("9808.73"));
    }

    /// At 15 °C the conversion is the identity
    #[test]
    fn test_conversion_identity_at_standard() {
        let volume = dec("8000");
        assert_eq!(
            to_standard_temperature(volume, STANDARD_TEMPERATURE, dec("0.0013")),
            volume
        );
        assert_eq!(
            from_standard_temperature(volume, STANDARD_TEMPERATURE, dec("0.0013")),
            volume
        );
    }

    /// Warehouse temperature equal to 15 °C means actual volume == V15
    #[test]
    fn test_compartment_at_standard_actual_temperature() {
        let calc = calculate_compartment(dec("10000"), dec("30"), dec("15"), "XD95");
        assert_eq!(calc.actual_volume.round_dp(6), calc.volume_at_15.round_dp(6));
        assert_eq!(calc.expansion_coefficient, dec("0.0013"));
        assert_eq!(calc.loss_coefficient, dec("0.00075"));
    }

    /// Allowed loss is volume × α
    #[test]
    fn test_allowed_loss() {
        assert_eq!(allowed_loss(dec("10000"), dec("0.00075")), dec("7.5"));
        assert_eq!(allowed_loss(dec("10000"), dec("0.0003")), dec("3"));
    }

    /// Zero compartments must be rejected
    #[test]
    fn test_empty_document_rejected() {
        assert_eq!(calculate_document(&[]), Err(PetroleumError::NoCompartments));
    }

    /// Document totals, loss, and status
    #[test]
    fn test_document_aggregation() {
        let compartments = vec![
            DocumentCompartment {
                truck_volume: dec("6000"),
                actual_volume: dec("6010"),
                received_volume: dec("5995"),
                product_code: "DO".to_string(),
            },
            DocumentCompartment {
                truck_volume: dec("4000"),
                actual_volume: dec("4004"),
                received_volume: dec("3998"),
                product_code: "DO".to_string(),
            },
        ];

        let calc = calculate_document(&compartments).unwrap();
        // Diesel coefficients from the first compartment
        assert_eq!(calc.expansion_coefficient, dec("0.0009"));
        assert_eq!(calc.loss_coefficient, dec("0.0003"));

        assert_eq!(calc.total_truck_volume, dec("10000"));
        assert_eq!(calc.total_actual_volume, dec("10014"));
        assert_eq!(calc.total_received_volume, dec("9993"));
        // actual loss = truck − received
        assert_eq!(calc.total_loss_volume, dec("7"));
        // allowed = 10 000 × 0.0003
        assert_eq!(calc.allowed_loss_volume, dec("3"));
        // received − actual loss − allowed loss
        assert_eq!(calc.excess_shortage_volume, dec("9983"));
        assert_eq!(calc.status, ExcessShortageStatus::Excess);
        assert_eq!(calc.temperature_adjustment_volume, dec("14"));
    }

    /// Status is derived from the sign of the excess/shortage volume
    #[test]
    fn test_status_sign() {
        assert_eq!(
            ExcessShortageStatus::from_volume(dec("0.001")),
            ExcessShortageStatus::Excess
        );
        assert_eq!(
            ExcessShortageStatus::from_volume(dec("-0.001")),
            ExcessShortageStatus::Shortage
        );
        assert_eq!(
            ExcessShortageStatus::from_volume(Decimal::ZERO),
            ExcessShortageStatus::Normal
        );
    }

    /// Product code classification drives coefficient selection
    #[test]
    fn test_code_classification() {
        assert_eq!(ProductCategory::from_code("XD95"), ProductCategory::Gasoline);
        assert_eq!(ProductCategory::from_code("E5RON92"), ProductCategory::Gasoline);
        assert_eq!(ProductCategory::from_code("DO"), ProductCategory::Diesel);
        assert_eq!(ProductCategory::from_code("DHO"), ProductCategory::Kerosene);
        // Unrecognized codes fall back to gasoline
        assert_eq!(ProductCategory::from_code("LPG"), ProductCategory::Gasoline);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for volumes between 100.0 and 50 000.0 litres
    fn volume_strategy() -> impl Strategy<Value = Decimal> {
        (1_000i64..=500_000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for plausible fuel temperatures (−10.0 to 45.0 °C)
    fn temperature_strategy() -> impl Strategy<Value = Decimal> {
        (-100i64..=450i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for the three product categories
    fn category_strategy() -> impl Strategy<Value = ProductCategory> {
        prop_oneof![
            Just(ProductCategory::Gasoline),
            Just(ProductCategory::Diesel),
            Just(ProductCategory::Kerosene),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// from_standard(to_standard(v)) == v within rounding tolerance
        #[test]
        fn prop_temperature_round_trip(
            volume in volume_strategy(),
            temperature in temperature_strategy(),
            category in category_strategy()
        ) {
            let beta = expansion_coefficient(category);
            let v15 = to_standard_temperature(volume, temperature, beta);
            let back = from_standard_temperature(v15, temperature, beta);

            let tolerance = dec("0.000001");
            prop_assert!((back - volume).abs() < tolerance);
        }

        /// Volumes shrink when normalized from above 15 °C and grow from below
        #[test]
        fn prop_normalization_direction(
            volume in volume_strategy(),
            category in category_strategy()
        ) {
            let beta = expansion_coefficient(category);

            let from_hot = to_standard_temperature(volume, dec("30"), beta);
            prop_assert!(from_hot < volume);

            let from_cold = to_standard_temperature(volume, dec("5"), beta);
            prop_assert!(from_cold > volume);
        }

        /// Allowed loss scales linearly with volume
        #[test]
        fn prop_allowed_loss_linear(
            volume in volume_strategy(),
            category in category_strategy()
        ) {
            let alpha = loss_coefficient(category);
            let single = allowed_loss(volume, alpha);
            let double = allowed_loss(volume + volume, alpha);
            prop_assert_eq!(double, single + single);
        }

        /// Document totals are the sums of their compartments
        #[test]
        fn prop_document_totals(
            volumes in prop::collection::vec(volume_strategy(), 1..7)
        ) {
            let compartments: Vec<DocumentCompartment> = volumes
                .iter()
                .map(|v| DocumentCompartment {
                    truck_volume: *v,
                    actual_volume: *v,
                    received_volume: *v,
                    product_code: "XD95".to_string(),
                })
                .collect();

            let calc = calculate_document(&compartments).unwrap();
            let expected: Decimal = volumes.iter().sum();

            prop_assert_eq!(calc.total_truck_volume, expected);
            prop_assert_eq!(calc.total_received_volume, expected);
            // received == truck → actual loss is zero
            prop_assert_eq!(calc.total_loss_volume, Decimal::ZERO);
        }
    }
}
