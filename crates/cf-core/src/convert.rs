//! Power <-> control signal conversion.
//!
//! Solvers integrate a current (or C-rate), not a power. The conversion uses
//! the nominal voltage: `I = P / V_nom`, and `C = I / Q_nom` where
//! `Q_nom = E_rated / V_nom`. Positive values discharge, negative charge.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::units::{self, Current, PowerUnit};

/// Control variable a solver integrates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ControlMode {
    /// Current in amperes.
    #[default]
    Current,
    /// Current normalized by the nominal charge capacity (1/h).
    CRate,
}

/// A control value tagged with the mode it is expressed in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlSignal {
    pub mode: ControlMode,
    pub value: f64,
}

impl ControlSignal {
    pub fn current(amps: f64) -> Self {
        Self {
            mode: ControlMode::Current,
            value: amps,
        }
    }

    pub fn c_rate(rate: f64) -> Self {
        Self {
            mode: ControlMode::CRate,
            value: rate,
        }
    }

    /// Current (A) this signal commands for a pack of `capacity_ah`.
    pub fn current_a(&self, capacity_ah: f64) -> f64 {
        match self.mode {
            ControlMode::Current => self.value,
            ControlMode::CRate => self.value * capacity_ah,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.value == 0.0
    }
}

fn check_voltage(nominal_voltage_v: f64) -> CoreResult<()> {
    if !nominal_voltage_v.is_finite() || nominal_voltage_v <= 0.0 {
        return Err(CoreError::InvalidConfiguration {
            what: format!("nominal voltage must be positive (got {nominal_voltage_v} V)"),
        });
    }
    Ok(())
}

fn capacity_ah(capacity_kwh: f64, nominal_voltage_v: f64) -> CoreResult<f64> {
    if !capacity_kwh.is_finite() || capacity_kwh <= 0.0 {
        return Err(CoreError::InvalidConfiguration {
            what: format!("capacity must be positive for C-rate control (got {capacity_kwh} kWh)"),
        });
    }
    Ok(units::as_ah(
        units::kwh(capacity_kwh) / units::volts(nominal_voltage_v),
    ))
}

/// Convert a power target into the control signal a solver expects.
///
/// `capacity_kwh` is only consulted for [`ControlMode::CRate`].
pub fn power_to_control(
    power: f64,
    unit: PowerUnit,
    nominal_voltage_v: f64,
    capacity_kwh: f64,
    mode: ControlMode,
) -> CoreResult<ControlSignal> {
    check_voltage(nominal_voltage_v)?;
    let current: Current = unit.quantity(power) / units::volts(nominal_voltage_v);
    let amps = units::as_amps(current);

    match mode {
        ControlMode::Current => Ok(ControlSignal::current(amps)),
        ControlMode::CRate => {
            let q_ah = capacity_ah(capacity_kwh, nominal_voltage_v)?;
            Ok(ControlSignal::c_rate(amps / q_ah))
        }
    }
}

/// Inverse of [`power_to_control`]; for reporting only.
pub fn control_to_power(
    signal: ControlSignal,
    unit: PowerUnit,
    nominal_voltage_v: f64,
    capacity_kwh: f64,
) -> CoreResult<f64> {
    check_voltage(nominal_voltage_v)?;
    let amps = match signal.mode {
        ControlMode::Current => signal.value,
        ControlMode::CRate => signal.value * capacity_ah(capacity_kwh, nominal_voltage_v)?,
    };
    Ok(unit.value_of(units::amps(amps) * units::volts(nominal_voltage_v)))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn inverse_recovers_power(
            power in -50_000.0_f64..50_000.0,
            voltage in 12.0_f64..1000.0,
            capacity in 0.5_f64..100.0,
            c_rate in any::<bool>(),
        ) {
            let mode = if c_rate { ControlMode::CRate } else { ControlMode::Current };
            let sig = power_to_control(power, PowerUnit::Watt, voltage, capacity, mode).unwrap();
            let back = control_to_power(sig, PowerUnit::Watt, voltage, capacity).unwrap();
            let tol = Tolerances { abs: 1e-6, rel: 1e-9 };
            prop_assert!(nearly_equal(back, power, tol));
        }

        #[test]
        fn current_sign_follows_power(power in -1e4_f64..1e4, voltage in 1.0_f64..800.0) {
            let sig = power_to_control(power, PowerUnit::Kilowatt, voltage, 1.0, ControlMode::Current).unwrap();
            prop_assert_eq!(sig.value.signum(), power.signum());
        }
    }
}
