//! Shared helpers for built-in models.

use std::f64::consts::PI;

use pf_core::{HOURS_PER_YEAR, Value};
use pf_core::units::{Power, Velocity};
use uom::si::f64::{Area, MassDensity};
use uom::si::power::kilowatt;

use crate::error::{ModelError, ModelResult};

pub fn check_finite(model: &str, field: &str, value: f64) -> ModelResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::invalid_config(
            model,
            format!("{field} must be finite, got {value}"),
        ))
    }
}

pub fn check_positive(model: &str, field: &str, value: f64) -> ModelResult<f64> {
    check_finite(model, field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ModelError::invalid_config(
            model,
            format!("{field} must be positive, got {value}"),
        ))
    }
}

pub fn check_non_negative(model: &str, field: &str, value: f64) -> ModelResult<f64> {
    check_finite(model, field, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(ModelError::invalid_config(
            model,
            format!("{field} must be non-negative, got {value}"),
        ))
    }
}

/// A fraction in `[0, 1]`.
pub fn check_fraction(model: &str, field: &str, value: f64) -> ModelResult<f64> {
    check_finite(model, field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ModelError::invalid_config(
            model,
            format!("{field} must lie in [0, 1], got {value}"),
        ))
    }
}

/// Deterministic hourly wind speed with a diurnal swing around `mean`.
pub fn diurnal_wind_speed(mean: Velocity, swing: f64) -> Vec<Velocity> {
    (0..HOURS_PER_YEAR)
        .map(|h| {
            let phase = 2.0 * PI * (h % 24) as f64 / 24.0;
            mean * (1.0 + swing * phase.sin()).max(0.0)
        })
        .collect()
}

/// Deterministic hourly solar availability in `[0, 1]`: a half-sine
/// between 06:00 and 18:00, scaled by a seasonal factor.
pub fn solar_availability() -> Vec<f64> {
    (0..HOURS_PER_YEAR)
        .map(|h| {
            let hour_of_day = (h % 24) as f64;
            let day = (h / 24) as f64;
            let seasonal = 0.75 + 0.25 * (2.0 * PI * (day - 80.0) / 365.0).sin();
            if (6.0..18.0).contains(&hour_of_day) {
                seasonal * (PI * (hour_of_day - 6.0) / 12.0).sin()
            } else {
                0.0
            }
        })
        .collect()
}

/// Aerodynamic rotor power `P = 0.5 * Cp * rho * A * v^3`, in kW.
pub fn rotor_power_kw(cp: f64, rho: MassDensity, area: Area, v: Velocity) -> f64 {
    let power: Power = (rho * area * v * v * v) * (0.5 * cp);
    power.get::<kilowatt>()
}

/// Sum of an hourly rate series over one-hour steps.
///
/// Works for any per-hour rate (kg/h to kg, kW to kWh).
pub fn hourly_total(series: &[f64]) -> f64 {
    series.iter().sum()
}

/// Capital recovery factor `r(1+r)^n / ((1+r)^n - 1)`; `1/n` at zero rate.
pub fn capital_recovery_factor(rate: f64, years: u32) -> f64 {
    let n = f64::from(years.max(1));
    if rate.abs() < 1e-12 {
        return 1.0 / n;
    }
    let growth = (1.0 + rate).powf(n);
    rate * growth / (growth - 1.0)
}

/// Yearly total of an hourly rate; a scalar counts as a constant rate.
pub fn annual_total(value: &Value) -> f64 {
    match value {
        Value::Scalar(v) => v * HOURS_PER_YEAR as f64,
        Value::Series(v) => hourly_total(v),
    }
}
