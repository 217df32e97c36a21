//! Validation helpers shared across the platform

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Validate that a reporting or closing range is well-formed
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> Result<(), &'static str> {
    if from > to {
        return Err("fromDate must not be after toDate");
    }
    Ok(())
}

/// Validate a movement quantity (strictly positive)
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a loss rate, a fraction of exported volume in [0, 1)
pub fn validate_loss_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err("Loss rate must be in [0, 1)");
    }
    Ok(())
}

/// Validate a measured fuel temperature (°C) is physically plausible
pub fn validate_temperature(temperature: Decimal) -> Result<(), &'static str> {
    if temperature < Decimal::from(-50) || temperature > Decimal::from(100) {
        return Err("Temperature out of plausible range");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        assert!(validate_date_range(date(2025, 1, 1), date(2025, 1, 1)).is_ok());
        assert!(validate_date_range(date(2025, 1, 2), date(2025, 1, 1)).is_err());
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(Decimal::new(1, 3)).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::new(-5, 0)).is_err());
    }

    #[test]
    fn loss_rate_bounds() {
        assert!(validate_loss_rate(Decimal::ZERO).is_ok());
        assert!(validate_loss_rate(Decimal::new(3, 4)).is_ok());
        assert!(validate_loss_rate(Decimal::ONE).is_err());
        assert!(validate_loss_rate(Decimal::new(-1, 4)).is_err());
    }

    #[test]
    fn temperature_bounds() {
        assert!(validate_temperature(Decimal::from(30)).is_ok());
        assert!(validate_temperature(Decimal::from(150)).is_err());
    }
}
