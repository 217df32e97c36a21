//! Ledger and balance-derivation tests
//!
//! The ledger is the single source of truth: balance = baseline +
//! Σ(quantity_in − quantity_out) over non-superseded entries only.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A ledger entry reduced to what balance derivation reads
#[derive(Debug, Clone)]
struct Entry {
    quantity_in: Decimal,
    quantity_out: Decimal,
    superseded: bool,
}

impl Entry {
    fn incoming(quantity: Decimal) -> Self {
        Self {
            quantity_in: quantity,
            quantity_out: Decimal::ZERO,
            superseded: false,
        }
    }

    fn outgoing(quantity: Decimal) -> Self {
        Self {
            quantity_in: Decimal::ZERO,
            quantity_out: quantity,
            superseded: false,
        }
    }

    fn net(&self) -> Decimal {
        self.quantity_in - self.quantity_out
    }
}

/// Balance derivation as the stock calculator performs it
fn balance(baseline: Decimal, entries: &[Entry]) -> Decimal {
    baseline
        + entries
            .iter()
            .filter(|e| !e.superseded)
            .map(Entry::net)
            .sum::<Decimal>()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Balance from an empty ledger is the baseline
    #[test]
    fn test_empty_ledger_is_baseline() {
        assert_eq!(balance(dec("1000"), &[]), dec("1000"));
        assert_eq!(balance(Decimal::ZERO, &[]), Decimal::ZERO);
    }

    /// Balance accumulates in-minus-out
    #[test]
    fn test_balance_accumulation() {
        let entries = vec![
            Entry::incoming(dec("500")),
            Entry::outgoing(dec("200")),
            Entry::incoming(dec("50.5")),
        ];
        assert_eq!(balance(dec("1000"), &entries), dec("1350.5"));
    }

    /// Superseded entries never affect the sum
    #[test]
    fn test_superseded_entries_excluded() {
        let mut entries = vec![
            Entry::incoming(dec("500")),
            Entry::outgoing(dec("200")),
        ];
        let before = balance(dec("1000"), &entries);

        entries[0].superseded = true;
        let after = balance(dec("1000"), &entries);

        // Toggling supersede changes the balance by exactly the entry's net
        assert_eq!(before - after, dec("500"));
        assert_eq!(after, dec("800"));
    }

    /// Advisory export guard: shortage is requested minus current, floored
    /// at zero
    #[test]
    fn test_export_guard_shortage() {
        let current = dec("300");
        let requested = dec("450");
        let shortage = if current >= requested {
            Decimal::ZERO
        } else {
            requested - current
        };
        assert_eq!(shortage, dec("150"));

        let requested_ok = dec("250");
        let shortage_ok = if current >= requested_ok {
            Decimal::ZERO
        } else {
            requested_ok - current
        };
        assert_eq!(shortage_ok, Decimal::ZERO);
    }

    /// Advisory capacity guard: projected balance against capacity
    #[test]
    fn test_capacity_guard() {
        let current = dec("9000");
        let capacity = dec("10000");
        let incoming = dec("1500");

        assert!(current + incoming > capacity);
        assert_eq!(capacity - current, dec("1000"));
    }

    /// Fill percentage falls back to 0 for zero capacity
    #[test]
    fn test_fill_percentage() {
        let stock = dec("2500");
        let capacity = dec("10000");
        let fill = if capacity > Decimal::ZERO {
            stock / capacity * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        assert_eq!(fill, dec("25"));

        let no_capacity = Decimal::ZERO;
        let fill_zero = if no_capacity > Decimal::ZERO {
            stock / no_capacity * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        assert_eq!(fill_zero, Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for quantities between 0.1 and 1 000.0
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn entry_strategy() -> impl Strategy<Value = Entry> {
        (quantity_strategy(), any::<bool>(), any::<bool>()).prop_map(|(qty, outgoing, superseded)| {
            let mut entry = if outgoing {
                Entry::outgoing(qty)
            } else {
                Entry::incoming(qty)
            };
            entry.superseded = superseded;
            entry
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// balance == baseline + Σ net over non-superseded entries
        #[test]
        fn prop_balance_identity(
            baseline in quantity_strategy(),
            entries in prop::collection::vec(entry_strategy(), 0..30)
        ) {
            let expected = baseline
                + entries
                    .iter()
                    .filter(|e| !e.superseded)
                    .map(Entry::net)
                    .sum::<Decimal>();

            prop_assert_eq!(balance(baseline, &entries), expected);
        }

        /// Toggling supersede on one entry moves the balance by exactly its
        /// net quantity
        #[test]
        fn prop_supersede_toggle_delta(
            baseline in quantity_strategy(),
            mut entries in prop::collection::vec(entry_strategy(), 1..20),
            index in 0usize..20
        ) {
            let index = index % entries.len();
            entries[index].superseded = false;
            let active = balance(baseline, &entries);

            entries[index].superseded = true;
            let without = balance(baseline, &entries);

            prop_assert_eq!(active - without, entries[index].net());
        }

        /// Ledger order never matters for the balance
        #[test]
        fn prop_balance_order_independent(
            baseline in quantity_strategy(),
            entries in prop::collection::vec(entry_strategy(), 0..20)
        ) {
            let mut reversed = entries.clone();
            reversed.reverse();

            prop_assert_eq!(balance(baseline, &entries), balance(baseline, &reversed));
        }
    }
}
