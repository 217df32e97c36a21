//! Shift-chain backfill tests
//!
//! Each shift opens at the previous shift's closing stock (opening + import
//! − export); the first shift of a store's chain opens at the tank baseline.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Ledger movement of one shift for one product
#[derive(Debug, Clone, Copy)]
struct ShiftMovement {
    import: Decimal,
    export: Decimal,
}

/// Chain the opening stock across shifts, as the backfiller does
fn chain_openings(baseline: Decimal, movements: &[ShiftMovement]) -> Vec<Decimal> {
    let mut openings = Vec::with_capacity(movements.len());
    let mut opening = baseline;
    for movement in movements {
        openings.push(opening);
        opening = opening + movement.import - movement.export;
    }
    openings
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Baseline 2000, shift 1 nets −300 → shift 2 opens at 1700
    #[test]
    fn test_two_shift_chain() {
        let movements = [
            ShiftMovement {
                import: dec("0"),
                export: dec("300"),
            },
            ShiftMovement {
                import: dec("0"),
                export: dec("0"),
            },
        ];

        let openings = chain_openings(dec("2000"), &movements);
        assert_eq!(openings[0], dec("2000"));
        assert_eq!(openings[1], dec("1700"));
    }

    /// The first shift of a chain opens at the baseline even when zero
    #[test]
    fn test_first_shift_opens_at_baseline() {
        let openings = chain_openings(Decimal::ZERO, &[ShiftMovement {
            import: dec("500"),
            export: dec("100"),
        }]);
        assert_eq!(openings[0], Decimal::ZERO);
    }

    /// Imports and exports both propagate into the next opening
    #[test]
    fn test_mixed_movement_chain() {
        let movements = [
            ShiftMovement {
                import: dec("1000"),
                export: dec("400"),
            },
            ShiftMovement {
                import: dec("0"),
                export: dec("250.5"),
            },
            ShiftMovement {
                import: dec("300"),
                export: dec("0"),
            },
        ];

        let openings = chain_openings(dec("500"), &movements);
        assert_eq!(openings, vec![dec("500"), dec("1100"), dec("849.5")]);
    }

    /// Persistence rule: zero-stock products are skipped except on the first
    /// shift of a store's chain
    #[test]
    fn test_zero_stock_persistence_rule() {
        let persist = |opening: Decimal, is_first_in_store: bool| {
            opening != Decimal::ZERO || is_first_in_store
        };

        assert!(persist(Decimal::ZERO, true));
        assert!(!persist(Decimal::ZERO, false));
        assert!(persist(dec("10"), false));
    }

    /// Backward scan finds the nearest earlier shift of the same store
    #[test]
    fn test_previous_shift_scan() {
        // (store, shift index) in chronological processing order
        let shifts = [("A", 1), ("A", 2), ("B", 1), ("A", 3), ("B", 2)];

        let previous_of = |index: usize| {
            shifts[..index]
                .iter()
                .rev()
                .find(|(store, _)| *store == shifts[index].0)
                .copied()
        };

        assert_eq!(previous_of(0), None);
        assert_eq!(previous_of(1), Some(("A", 1)));
        assert_eq!(previous_of(2), None);
        assert_eq!(previous_of(3), Some(("A", 2)));
        assert_eq!(previous_of(4), Some(("B", 1)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for quantities between 0 and 1 000.0
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn movement_strategy() -> impl Strategy<Value = ShiftMovement> {
        (quantity_strategy(), quantity_strategy())
            .prop_map(|(import, export)| ShiftMovement { import, export })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The n-th opening equals baseline plus the net of all earlier
        /// shifts
        #[test]
        fn prop_opening_is_cumulative_net(
            baseline in quantity_strategy(),
            movements in prop::collection::vec(movement_strategy(), 1..15)
        ) {
            let openings = chain_openings(baseline, &movements);

            for (index, opening) in openings.iter().enumerate() {
                let net: Decimal = movements[..index]
                    .iter()
                    .map(|m| m.import - m.export)
                    .sum();
                prop_assert_eq!(*opening, baseline + net);
            }
        }

        /// Chaining is associative: recomputing from any intermediate shift
        /// gives the same tail
        #[test]
        fn prop_chain_restart_consistency(
            baseline in quantity_strategy(),
            movements in prop::collection::vec(movement_strategy(), 2..15),
            split in 1usize..14
        ) {
            let split = split % movements.len();
            let full = chain_openings(baseline, &movements);

            // Restart the chain from the opening computed at `split`
            let tail = chain_openings(full[split], &movements[split..]);

            prop_assert_eq!(&full[split..], &tail[..]);
        }
    }
}
