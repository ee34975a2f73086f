//! Segment planning: (power, duration) requests to absolute solver windows.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cf_core::units;
use cf_core::{BatteryConfiguration, ControlMode, ControlSignal, PowerUnit, power_to_control};
use cf_solver::{ProfileKind, TimeWindow};

use crate::error::{SimError, SimResult};

/// One constant-power interval of a request.
///
/// Positive power discharges, negative charges, zero rests.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerSegment {
    /// Signed power in the run's [`PowerUnit`]
    pub power: f64,
    /// Duration (hours)
    pub duration_h: f64,
}

impl PowerSegment {
    pub fn new(power: f64, duration_h: f64) -> Self {
        Self { power, duration_h }
    }

    pub fn rest(duration_h: f64) -> Self {
        Self::new(0.0, duration_h)
    }

    pub fn duration_s(&self) -> f64 {
        units::as_seconds(units::hours(self.duration_h))
    }
}

/// A planned segment, ready for the solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationSegment {
    /// Position in the originating request
    pub index: usize,
    /// Requested power converted to kW
    pub power_kw: f64,
    pub window: TimeWindow,
    pub control: ControlSignal,
    /// Profile for the first attempt
    pub profile: ProfileKind,
}

/// Turn a request into contiguous absolute windows starting at t = 0.
///
/// Everything is validated before anything is returned, so a bad segment
/// anywhere in the list means no solver is ever called.
pub fn plan(
    segments: &[PowerSegment],
    config: &BatteryConfiguration,
    unit: PowerUnit,
    mode: ControlMode,
) -> SimResult<Vec<SimulationSegment>> {
    config.validate()?;

    if segments.is_empty() {
        return Err(SimError::InvalidSegment {
            index: 0,
            reason: "request contains no segments".to_string(),
        });
    }

    for (index, seg) in segments.iter().enumerate() {
        if !seg.duration_h.is_finite() || seg.duration_h <= 0.0 {
            return Err(SimError::InvalidSegment {
                index,
                reason: format!("duration must be positive (got {} h)", seg.duration_h),
            });
        }
        if !seg.power.is_finite() {
            return Err(SimError::InvalidSegment {
                index,
                reason: format!("power must be finite (got {})", seg.power),
            });
        }
    }

    let mut planned = Vec::with_capacity(segments.len());
    let mut cursor = 0.0;
    for (index, seg) in segments.iter().enumerate() {
        let end = cursor + seg.duration_s();
        let window = TimeWindow::new(cursor, end).map_err(|e| SimError::InvalidSegment {
            index,
            reason: e.to_string(),
        })?;
        let control = power_to_control(
            seg.power,
            unit,
            config.nominal_voltage_v,
            config.capacity_kwh,
            mode,
        )?;
        planned.push(SimulationSegment {
            index,
            power_kw: units::as_watts(unit.quantity(seg.power)) / 1000.0,
            window,
            control,
            profile: ProfileKind::Default,
        });
        cursor = end;
    }

    Ok(planned)
}
