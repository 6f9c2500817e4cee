// pf-core/src/units.rs

use core::fmt;
use core::str::FromStr;

use uom::si::f64::{
    Energy as UomEnergy, Mass as UomMass, MassRate as UomMassRate, Power as UomPower,
    Time as UomTime, Velocity as UomVelocity,
};

use crate::error::{CoreError, CoreResult};

// Public canonical unit types (SI, f64)
pub type Energy = UomEnergy;
pub type Mass = UomMass;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Time = UomTime;
pub type Velocity = UomVelocity;

#[inline]
pub fn kw(v: f64) -> Power {
    use uom::si::power::kilowatt;
    Power::new::<kilowatt>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn hours(v: f64) -> Time {
    use uom::si::time::hour;
    Time::new::<hour>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

/// One calendar (non-leap) operating year.
#[inline]
pub fn operating_year() -> Time {
    use uom::si::time::day;
    Time::new::<day>(365.0)
}

/// Physical (or monetary) dimension of a port unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Power,
    Energy,
    Mass,
    MassRate,
    Velocity,
    Currency,
    CurrencyRate,
    CurrencyPerMass,
    Dimensionless,
}

/// Units accepted on ports.
///
/// Each unit belongs to one [`Dimension`] and knows its factor to the
/// dimension's base unit (W, J, kg, kg/s, m/s, USD, USD/year, USD/kg).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Watt,
    Kilowatt,
    Megawatt,
    KilowattHour,
    MegawattHour,
    Kilogram,
    Tonne,
    KilogramPerSecond,
    KilogramPerHour,
    KilogramPerYear,
    TonnePerYear,
    MeterPerSecond,
    Usd,
    MillionUsd,
    UsdPerYear,
    MillionUsdPerYear,
    UsdPerKilogram,
    Unitless,
}

impl Unit {
    pub const ALL: [Unit; 18] = [
        Unit::Watt,
        Unit::Kilowatt,
        Unit::Megawatt,
        Unit::KilowattHour,
        Unit::MegawattHour,
        Unit::Kilogram,
        Unit::Tonne,
        Unit::KilogramPerSecond,
        Unit::KilogramPerHour,
        Unit::KilogramPerYear,
        Unit::TonnePerYear,
        Unit::MeterPerSecond,
        Unit::Usd,
        Unit::MillionUsd,
        Unit::UsdPerYear,
        Unit::MillionUsdPerYear,
        Unit::UsdPerKilogram,
        Unit::Unitless,
    ];

    /// Canonical symbol, as written in configuration and port declarations.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Watt => "W",
            Unit::Kilowatt => "kW",
            Unit::Megawatt => "MW",
            Unit::KilowattHour => "kWh",
            Unit::MegawattHour => "MWh",
            Unit::Kilogram => "kg",
            Unit::Tonne => "t",
            Unit::KilogramPerSecond => "kg/s",
            Unit::KilogramPerHour => "kg/h",
            Unit::KilogramPerYear => "kg/year",
            Unit::TonnePerYear => "t/year",
            Unit::MeterPerSecond => "m/s",
            Unit::Usd => "USD",
            Unit::MillionUsd => "MUSD",
            Unit::UsdPerYear => "USD/year",
            Unit::MillionUsdPerYear => "MUSD/year",
            Unit::UsdPerKilogram => "USD/kg",
            Unit::Unitless => "unitless",
        }
    }

    pub fn dimension(self) -> Dimension {
        match self {
            Unit::Watt | Unit::Kilowatt | Unit::Megawatt => Dimension::Power,
            Unit::KilowattHour | Unit::MegawattHour => Dimension::Energy,
            Unit::Kilogram | Unit::Tonne => Dimension::Mass,
            Unit::KilogramPerSecond
            | Unit::KilogramPerHour
            | Unit::KilogramPerYear
            | Unit::TonnePerYear => Dimension::MassRate,
            Unit::MeterPerSecond => Dimension::Velocity,
            Unit::Usd | Unit::MillionUsd => Dimension::Currency,
            Unit::UsdPerYear | Unit::MillionUsdPerYear => Dimension::CurrencyRate,
            Unit::UsdPerKilogram => Dimension::CurrencyPerMass,
            Unit::Unitless => Dimension::Dimensionless,
        }
    }

    /// Factor that converts a value in this unit to the dimension's base unit.
    pub fn to_base(self) -> f64 {
        use uom::si::energy::joule;
        use uom::si::mass::kilogram;
        use uom::si::mass_rate::kilogram_per_second;
        use uom::si::power::watt;
        use uom::si::velocity::meter_per_second;

        match self {
            Unit::Watt => 1.0,
            Unit::Kilowatt => kw(1.0).get::<watt>(),
            Unit::Megawatt => {
                use uom::si::power::megawatt;
                Power::new::<megawatt>(1.0).get::<watt>()
            }
            Unit::KilowattHour => {
                use uom::si::energy::kilowatt_hour;
                Energy::new::<kilowatt_hour>(1.0).get::<joule>()
            }
            Unit::MegawattHour => {
                use uom::si::energy::megawatt_hour;
                Energy::new::<megawatt_hour>(1.0).get::<joule>()
            }
            Unit::Kilogram => 1.0,
            Unit::Tonne => {
                use uom::si::mass::ton;
                Mass::new::<ton>(1.0).get::<kilogram>()
            }
            Unit::KilogramPerSecond => 1.0,
            Unit::KilogramPerHour => {
                let rate: MassRate = kg(1.0) / hours(1.0);
                rate.get::<kilogram_per_second>()
            }
            Unit::KilogramPerYear => {
                let rate: MassRate = kg(1.0) / operating_year();
                rate.get::<kilogram_per_second>()
            }
            Unit::TonnePerYear => {
                use uom::si::mass::ton;
                let rate: MassRate = Mass::new::<ton>(1.0) / operating_year();
                rate.get::<kilogram_per_second>()
            }
            Unit::MeterPerSecond => mps(1.0).get::<meter_per_second>(),
            Unit::Usd | Unit::UsdPerYear | Unit::UsdPerKilogram => 1.0,
            Unit::MillionUsd | Unit::MillionUsdPerYear => 1.0e6,
            Unit::Unitless => 1.0,
        }
    }

    /// True when values in `self` can be converted to `other`.
    pub fn convertible_to(self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }

    /// Multiplicative factor converting a value in `self` to `other`.
    pub fn factor_to(self, other: Unit) -> CoreResult<f64> {
        if !self.convertible_to(other) {
            return Err(CoreError::IncompatibleUnits {
                from: self.symbol().to_string(),
                to: other.symbol().to_string(),
            });
        }
        if self == other {
            return Ok(1.0);
        }
        Ok(self.to_base() / other.to_base())
    }
}

impl FromStr for Unit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Unit::Unitless);
        }
        Unit::ALL
            .iter()
            .copied()
            .find(|u| u.symbol() == trimmed)
            .ok_or_else(|| CoreError::UnknownUnit {
                unit: trimmed.to_string(),
            })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
