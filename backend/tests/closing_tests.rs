//! Period-closing tests
//!
//! Covers the closing-balance identity, the opening-balance chain, the
//! effective-dated loss-rate window, and the latest-period-only delete rule.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The closing computation performed per tank
fn close(
    opening: Decimal,
    import: Decimal,
    export: Decimal,
    loss_rate: Decimal,
) -> (Decimal, Decimal) {
    let loss_amount = export * loss_rate;
    let closing_balance = opening + import - export - loss_amount;
    (loss_amount, closing_balance)
}

/// An effective-dated loss-rate window
#[derive(Debug, Clone)]
struct RateWindow {
    loss_rate: Decimal,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
}

/// Window selection: containing window, latest effective_from wins
fn effective_rate(windows: &[RateWindow], at: NaiveDate) -> Decimal {
    windows
        .iter()
        .filter(|w| w.effective_from <= at && w.effective_to.map_or(true, |to| to >= at))
        .max_by_key(|w| w.effective_from)
        .map(|w| w.loss_rate)
        .unwrap_or(Decimal::ZERO)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Baseline 1000, +500 and −200 in period, rate 0.0003:
    /// loss = 0.06, closing = 1299.94 exactly
    #[test]
    fn test_scenario_first_closing() {
        let opening = dec("1000");
        let (loss_amount, closing_balance) =
            close(opening, dec("500"), dec("200"), dec("0.0003"));

        assert_eq!(loss_amount, dec("0.06"));
        assert_eq!(closing_balance, dec("1299.94"));
    }

    /// The snapshot identity holds with exact decimal arithmetic
    #[test]
    fn test_closing_identity() {
        let opening = dec("12345.678");
        let import = dec("1000.001");
        let export = dec("999.999");
        let rate = dec("0.000750");

        let (loss_amount, closing_balance) = close(opening, import, export, rate);
        assert_eq!(
            closing_balance,
            opening + import - export - loss_amount
        );
    }

    /// Zero export means zero loss regardless of rate
    #[test]
    fn test_no_export_no_loss() {
        let (loss_amount, closing_balance) =
            close(dec("500"), dec("100"), Decimal::ZERO, dec("0.0013"));
        assert_eq!(loss_amount, Decimal::ZERO);
        assert_eq!(closing_balance, dec("600"));
    }

    /// Chaining: with adjacent closings, the later period opens at the
    /// earlier period's closing balance before any ledger deltas
    #[test]
    fn test_chained_opening_balance() {
        let (_, first_closing) = close(dec("2000"), dec("800"), dec("500"), dec("0.0003"));

        // The next period starts the day after the first closed period ends
        let opening_of_next = first_closing;
        let (_, second_closing) =
            close(opening_of_next, dec("300"), dec("100"), dec("0.0003"));

        assert_eq!(first_closing, dec("2299.85"));
        assert_eq!(second_closing, dec("2499.82"));
    }

    /// Effective window selection at a date
    #[test]
    fn test_effective_rate_window() {
        let windows = vec![
            RateWindow {
                loss_rate: dec("0.0005"),
                effective_from: date(2025, 1, 1),
                effective_to: Some(date(2025, 3, 31)),
            },
            RateWindow {
                loss_rate: dec("0.0003"),
                effective_from: date(2025, 4, 1),
                effective_to: None,
            },
        ];

        assert_eq!(effective_rate(&windows, date(2025, 2, 15)), dec("0.0005"));
        assert_eq!(effective_rate(&windows, date(2025, 4, 1)), dec("0.0003"));
        assert_eq!(effective_rate(&windows, date(2025, 12, 31)), dec("0.0003"));
        // No window covers dates before the first config
        assert_eq!(effective_rate(&windows, date(2024, 12, 31)), Decimal::ZERO);
    }

    /// Defensive tie-break: latest effective_from wins when windows overlap
    #[test]
    fn test_effective_rate_tie_break() {
        let windows = vec![
            RateWindow {
                loss_rate: dec("0.0005"),
                effective_from: date(2025, 1, 1),
                effective_to: None,
            },
            RateWindow {
                loss_rate: dec("0.0007"),
                effective_from: date(2025, 2, 1),
                effective_to: None,
            },
        ];

        assert_eq!(effective_rate(&windows, date(2025, 3, 1)), dec("0.0007"));
    }

    /// Auto-close: a new config ends the open window the day before it
    /// starts
    #[test]
    fn test_auto_close_day_before() {
        let new_effective_from = date(2025, 4, 1);
        let closed_to = new_effective_from.pred_opt().unwrap();
        assert_eq!(closed_to, date(2025, 3, 31));
    }

    /// Delete rule: only the period matching MAX(period_to) may be deleted
    #[test]
    fn test_delete_latest_only() {
        let closed_period_ends = [date(2025, 1, 31), date(2025, 2, 28), date(2025, 3, 31)];
        let latest = *closed_period_ends.iter().max().unwrap();

        let deletable = |period_to: NaiveDate| latest <= period_to;

        assert!(deletable(date(2025, 3, 31)));
        assert!(!deletable(date(2025, 2, 28)));
        assert!(!deletable(date(2025, 1, 31)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for quantities between 0.1 and 10 000.0
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for loss rates between 0 and 0.01
    fn rate_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100i64).prop_map(|n| Decimal::new(n, 4))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// closing == opening + import − export − loss, exactly
        #[test]
        fn prop_closing_identity(
            opening in quantity_strategy(),
            import in quantity_strategy(),
            export in quantity_strategy(),
            rate in rate_strategy()
        ) {
            let (loss_amount, closing_balance) = close(opening, import, export, rate);

            prop_assert_eq!(loss_amount, export * rate);
            prop_assert_eq!(closing_balance, opening + import - export - loss_amount);
        }

        /// Loss grows monotonically with the rate
        #[test]
        fn prop_loss_monotone_in_rate(
            export in quantity_strategy(),
            rate in rate_strategy()
        ) {
            let (loss_low, _) = close(Decimal::ZERO, Decimal::ZERO, export, rate);
            let higher = rate + Decimal::new(1, 4);
            let (loss_high, _) = close(Decimal::ZERO, Decimal::ZERO, export, higher);

            prop_assert!(loss_high > loss_low);
        }

        /// A chain of closings equals one closing over the whole span when
        /// no loss applies
        #[test]
        fn prop_chain_equals_total_without_loss(
            opening in quantity_strategy(),
            movements in prop::collection::vec((quantity_strategy(), quantity_strategy()), 1..10)
        ) {
            let zero = Decimal::ZERO;

            // Close period by period, carrying the balance forward
            let mut carried = opening;
            for (import, export) in &movements {
                let (_, closing_balance) = close(carried, *import, *export, zero);
                carried = closing_balance;
            }

            // One closing over the union of all periods
            let total_import: Decimal = movements.iter().map(|(i, _)| *i).sum();
            let total_export: Decimal = movements.iter().map(|(_, e)| *e).sum();
            let (_, direct) = close(opening, total_import, total_export, zero);

            prop_assert_eq!(carried, direct);
        }
    }
}
