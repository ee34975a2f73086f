// cf-core/src/units.rs

use uom::si::f64::{
    ElectricCharge as UomElectricCharge, ElectricCurrent as UomElectricCurrent,
    ElectricPotential as UomElectricPotential, Energy as UomEnergy, Power as UomPower,
    Time as UomTime,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Public canonical unit types (SI, f64)
pub type Charge = UomElectricCharge;
pub type Current = UomElectricCurrent;
pub type Energy = UomEnergy;
pub type Potential = UomElectricPotential;
pub type Power = UomPower;
pub type Time = UomTime;

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn kw(v: f64) -> Power {
    use uom::si::power::kilowatt;
    Power::new::<kilowatt>(v)
}

#[inline]
pub fn volts(v: f64) -> Potential {
    use uom::si::electric_potential::volt;
    Potential::new::<volt>(v)
}

#[inline]
pub fn amps(v: f64) -> Current {
    use uom::si::electric_current::ampere;
    Current::new::<ampere>(v)
}

#[inline]
pub fn kwh(v: f64) -> Energy {
    use uom::si::energy::kilowatt_hour;
    Energy::new::<kilowatt_hour>(v)
}

#[inline]
pub fn hours(v: f64) -> Time {
    use uom::si::time::hour;
    Time::new::<hour>(v)
}

#[inline]
pub fn as_watts(p: Power) -> f64 {
    use uom::si::power::watt;
    p.get::<watt>()
}

#[inline]
pub fn as_amps(i: Current) -> f64 {
    use uom::si::electric_current::ampere;
    i.get::<ampere>()
}

#[inline]
pub fn as_wh(e: Energy) -> f64 {
    use uom::si::energy::watt_hour;
    e.get::<watt_hour>()
}

#[inline]
pub fn as_ah(q: Charge) -> f64 {
    use uom::si::electric_charge::ampere_hour;
    q.get::<ampere_hour>()
}

#[inline]
pub fn as_seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

/// Unit a caller expresses power targets in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PowerUnit {
    Watt,
    #[default]
    Kilowatt,
}

impl PowerUnit {
    /// Interpret a raw value in this unit.
    pub fn quantity(self, value: f64) -> Power {
        match self {
            PowerUnit::Watt => w(value),
            PowerUnit::Kilowatt => kw(value),
        }
    }

    /// Express a power quantity in this unit.
    pub fn value_of(self, power: Power) -> f64 {
        match self {
            PowerUnit::Watt => as_watts(power),
            PowerUnit::Kilowatt => as_watts(power) / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = kw(3.0);
        let _v = volts(400.0);
        let _i = amps(7.5);
        let _e = kwh(10.0);
        let _t = hours(2.0);
    }

    #[test]
    fn derived_dimensions() {
        let i: Current = kw(4.0) / volts(400.0);
        assert!((as_amps(i) - 10.0).abs() < 1e-12);

        let q: Charge = kwh(10.0) / volts(400.0);
        assert!((as_ah(q) - 25.0).abs() < 1e-9);

        assert!((as_seconds(hours(0.5)) - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn power_unit_round_trip() {
        let p = PowerUnit::Watt.quantity(1500.0);
        assert!((PowerUnit::Kilowatt.value_of(p) - 1.5).abs() < 1e-12);
        assert!((PowerUnit::Watt.value_of(p) - 1500.0).abs() < 1e-9);
    }
}
