//! Time-value adjustment between cost-basis years.

/// Future value of `value` after `periods` compounding periods at `rate`.
///
/// Negative `periods` deflate: a cost quoted in a later year is brought back
/// to an earlier basis.
pub fn inflation_adjusted(value: f64, rate: f64, periods: i32) -> f64 {
    value * (1.0 + rate).powi(periods)
}

/// Adjust a cost quoted in `from_year` dollars to `to_year` dollars.
pub fn to_cost_year(value: f64, rate: f64, from_year: i32, to_year: i32) -> f64 {
    inflation_adjusted(value, rate, to_year - from_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compounds_forward() {
        let v = inflation_adjusted(100.0, 0.025, 5);
        assert!((v - 100.0 * 1.025_f64.powi(5)).abs() < 1e-12);
    }

    #[test]
    fn zero_periods_is_identity() {
        assert_eq!(to_cost_year(42.0, 0.1, 2025, 2025), 42.0);
    }

    #[test]
    fn later_basis_deflates() {
        let v = to_cost_year(110.0, 0.1, 2023, 2022);
        assert!((v - 100.0).abs() < 1e-9);
    }
}
