//! Cross-segment battery state.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cf_core::{BatteryConfiguration, ensure_finite, trapezoid_by};
use cf_solver::{InitialCondition, Sample, Trajectory};
use tracing::warn;

use crate::advisory::{Advisory, SocBound};
use crate::error::{SimError, SimResult};
use crate::planner::SimulationSegment;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Lifecycle of a run. The first applied segment moves `Ready` to
/// `Running`; `Completed` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Ready,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What to do after a segment ends early at a voltage bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TruncationPolicy {
    /// Stop the run; remaining segments are skipped.
    Halt,
    /// Carry the truncated state into the next segment.
    #[default]
    Continue,
}

/// Snapshot of the battery between segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatteryState {
    /// State of charge in [0, 1]
    pub soc: f64,
    /// Signed energy delivered (Wh); discharge positive
    pub net_energy_wh: f64,
    /// Sum of |energy| over segments (Wh)
    pub energy_throughput_wh: f64,
    /// Sum of |charge| moved (Ah)
    pub charge_throughput_ah: f64,
    /// Terminal voltage at the end of the last segment, if any ran
    pub last_voltage_v: Option<f64>,
    pub last_current_a: f64,
    /// Simulation time reached (s)
    pub elapsed_s: f64,
}

impl BatteryState {
    pub fn initial(soc: f64) -> Self {
        Self {
            soc,
            net_energy_wh: 0.0,
            energy_throughput_wh: 0.0,
            charge_throughput_ah: 0.0,
            last_voltage_v: None,
            last_current_a: 0.0,
            elapsed_s: 0.0,
        }
    }

    pub fn elapsed_h(&self) -> f64 {
        self.elapsed_s / SECONDS_PER_HOUR
    }

    /// Condition the solver should start the next segment from.
    pub fn initial_condition(&self) -> InitialCondition {
        InitialCondition {
            soc: self.soc,
            voltage_v: self.last_voltage_v,
            current_a: self.last_current_a,
        }
    }
}

/// Per-segment bookkeeping produced by [`StateAccumulator::apply`].
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentUpdate {
    pub energy_wh: f64,
    pub charge_ah: f64,
    pub soc_before: f64,
    pub soc_after: f64,
    pub advisories: Vec<Advisory>,
}

/// Owns the [`BatteryState`] of one run and its phase.
#[derive(Clone, Debug)]
pub struct StateAccumulator {
    capacity_wh: f64,
    state: BatteryState,
    phase: RunPhase,
}

impl StateAccumulator {
    pub fn new(initial_soc: f64, config: &BatteryConfiguration) -> SimResult<Self> {
        config.validate()?;
        let initial_soc = ensure_finite(initial_soc, "initial SOC")?;
        if !(0.0..=1.0).contains(&initial_soc) {
            return Err(SimError::InvalidConfiguration {
                what: format!("initial SOC must lie in [0, 1] (got {initial_soc})"),
            });
        }
        Ok(Self {
            capacity_wh: config.capacity_wh(),
            state: BatteryState::initial(initial_soc),
            phase: RunPhase::Ready,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Latest consistent snapshot; valid in every phase, including `Failed`.
    pub fn get_state(&self) -> BatteryState {
        self.state
    }

    /// Requires at least one applied segment.
    pub fn complete(&mut self) -> SimResult<()> {
        self.transition(&[RunPhase::Running], RunPhase::Completed)
    }

    /// Mark the run failed. The state stays at the last applied segment,
    /// or at the initial state if the first segment failed.
    pub fn fail(&mut self) -> SimResult<()> {
        self.transition(&[RunPhase::Ready, RunPhase::Running], RunPhase::Failed)
    }

    fn transition(&mut self, from: &[RunPhase], to: RunPhase) -> SimResult<()> {
        if !from.contains(&self.phase) {
            return Err(SimError::InvalidState {
                what: format!("cannot move to {to} from {}", self.phase),
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Fold one segment's trajectory into the state.
    pub fn apply(
        &mut self,
        segment: &SimulationSegment,
        trajectory: &Trajectory,
    ) -> SimResult<SegmentUpdate> {
        if !matches!(self.phase, RunPhase::Ready | RunPhase::Running) {
            return Err(SimError::InvalidState {
                what: format!("cannot apply segment {} while {}", segment.index, self.phase),
            });
        }

        let samples = &trajectory.samples;
        let hours = |s: &Sample| s.time_s / SECONDS_PER_HOUR;
        let energy_wh = trapezoid_by(samples, hours, |s| s.power_w());
        let charge_ah = trapezoid_by(samples, hours, |s| s.current_a.abs());
        let finite = |value: f64, what: &'static str| {
            ensure_finite(value, what).map_err(|err| SimError::InvalidState {
                what: format!("segment {}: {err}", segment.index),
            })
        };
        let energy_wh = finite(energy_wh, "segment energy")?;
        let charge_ah = finite(charge_ah, "segment charge")?;

        let soc_before = self.state.soc;
        let unclamped = soc_before - energy_wh / self.capacity_wh;
        let mut advisories = Vec::new();

        let soc_after = if unclamped < 0.0 || unclamped > 1.0 {
            let bound = if unclamped < 0.0 {
                SocBound::Low
            } else {
                SocBound::High
            };
            warn!(
                segment = segment.index,
                soc = unclamped,
                "SOC left [0, 1], clamping"
            );
            advisories.push(Advisory::SocBoundCrossed {
                segment: segment.index,
                bound,
                unclamped,
            });
            unclamped.clamp(0.0, 1.0)
        } else {
            unclamped
        };

        if let Some(t) = trajectory.truncation {
            warn!(
                segment = segment.index,
                time_s = t.time_s,
                reason = %t.reason,
                "segment truncated at voltage limit"
            );
            advisories.push(Advisory::VoltageLimitReached {
                segment: segment.index,
                time_s: t.time_s,
                reason: t.reason,
            });
        }

        self.state.soc = soc_after;
        self.state.net_energy_wh += energy_wh;
        self.state.energy_throughput_wh += energy_wh.abs();
        self.state.charge_throughput_ah += charge_ah;
        if let Some(last) = trajectory.last() {
            self.state.last_voltage_v = Some(last.voltage_v);
            self.state.last_current_a = last.current_a;
        }
        self.state.elapsed_s = trajectory
            .truncation
            .map_or(segment.window.end_s, |t| t.time_s);
        self.phase = RunPhase::Running;

        Ok(SegmentUpdate {
            energy_wh,
            charge_ah,
            soc_before,
            soc_after,
            advisories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::ControlSignal;
    use cf_solver::{ProfileKind, TimeWindow, Truncation, TruncationReason};

    fn segment(index: usize, start_s: f64, end_s: f64, amps: f64) -> SimulationSegment {
        SimulationSegment {
            index,
            power_kw: amps * 0.4,
            window: TimeWindow::new(start_s, end_s).unwrap(),
            control: ControlSignal::current(amps),
            profile: ProfileKind::Default,
        }
    }

    fn flat(start_s: f64, end_s: f64, volts: f64, amps: f64) -> Trajectory {
        Trajectory {
            samples: vec![
                Sample::new(start_s, volts, amps),
                Sample::new(0.5 * (start_s + end_s), volts, amps),
                Sample::new(end_s, volts, amps),
            ],
            truncation: None,
        }
    }

    fn fresh(soc: f64) -> StateAccumulator {
        StateAccumulator::new(soc, &BatteryConfiguration::default()).unwrap()
    }

    #[test]
    fn discharge_energy_lowers_soc() {
        let mut acc = fresh(0.5);
        // 400 V * 10 A for 1 h = 4 kWh out of 10 kWh.
        let up = acc
            .apply(&segment(0, 0.0, 3600.0, 10.0), &flat(0.0, 3600.0, 400.0, 10.0))
            .unwrap();
        assert!((up.energy_wh - 4000.0).abs() < 1e-9);
        assert!((up.charge_ah - 10.0).abs() < 1e-9);
        assert!((up.soc_after - 0.1).abs() < 1e-12);
        assert!(up.advisories.is_empty());

        let s = acc.get_state();
        assert_eq!(s.last_voltage_v, Some(400.0));
        assert_eq!(s.last_current_a, 10.0);
        assert_eq!(s.elapsed_s, 3600.0);
        assert!((s.energy_throughput_wh - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn overdischarge_clamps_and_flags() {
        let mut acc = fresh(0.1);
        let up = acc
            .apply(&segment(1, 0.0, 3600.0, 10.0), &flat(0.0, 3600.0, 400.0, 10.0))
            .unwrap();
        assert_eq!(up.soc_after, 0.0);
        assert_eq!(up.advisories[0].segment(), 1);
        assert!(up.advisories[0].to_string().contains("below 0"));
        assert!(matches!(
            up.advisories[..],
            [Advisory::SocBoundCrossed {
                segment: 1,
                bound: SocBound::Low,
                ..
            }]
        ));
    }

    #[test]
    fn overcharge_clamps_high() {
        let mut acc = fresh(0.9);
        let up = acc
            .apply(&segment(0, 0.0, 3600.0, -10.0), &flat(0.0, 3600.0, 400.0, -10.0))
            .unwrap();
        assert_eq!(up.soc_after, 1.0);
        assert!(matches!(
            up.advisories[..],
            [Advisory::SocBoundCrossed {
                bound: SocBound::High,
                ..
            }]
        ));
    }

    #[test]
    fn truncation_is_an_advisory() {
        let mut acc = fresh(0.5);
        let mut traj = flat(0.0, 1200.0, 330.0, 10.0);
        traj.truncation = Some(Truncation {
            time_s: 1200.0,
            reason: TruncationReason::LowerVoltageCutoff,
        });
        let up = acc.apply(&segment(0, 0.0, 3600.0, 10.0), &traj).unwrap();
        assert!(matches!(
            up.advisories[..],
            [Advisory::VoltageLimitReached { time_s, .. }] if time_s == 1200.0
        ));
        assert_eq!(acc.get_state().elapsed_s, 1200.0);
    }

    #[test]
    fn first_segment_starts_running() {
        let mut acc = fresh(0.5);
        assert_eq!(acc.phase(), RunPhase::Ready);
        assert!(acc.complete().is_err());
        acc.apply(&segment(0, 0.0, 1.0, 1.0), &flat(0.0, 1.0, 400.0, 1.0))
            .unwrap();
        assert_eq!(acc.phase(), RunPhase::Running);
        acc.complete().unwrap();
        assert_eq!(acc.phase(), RunPhase::Completed);
        assert!(
            acc.apply(&segment(1, 1.0, 2.0, 1.0), &flat(1.0, 2.0, 400.0, 1.0))
                .is_err()
        );
        assert!(acc.fail().is_err());
    }

    #[test]
    fn failing_before_any_segment_keeps_initial_state() {
        let mut acc = fresh(0.5);
        acc.fail().unwrap();
        assert_eq!(acc.phase(), RunPhase::Failed);
        assert!(
            acc.apply(&segment(0, 0.0, 1.0, 1.0), &flat(0.0, 1.0, 400.0, 1.0))
                .is_err()
        );
        assert!(acc.complete().is_err());
        assert_eq!(acc.get_state(), BatteryState::initial(0.5));
    }

    #[test]
    fn non_finite_energy_is_rejected_without_mutation() {
        let mut acc = fresh(0.5);
        let traj = flat(0.0, 3600.0, f64::NAN, 10.0);
        let err = acc
            .apply(&segment(2, 0.0, 3600.0, 10.0), &traj)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidState { .. }));
        assert!(err.to_string().contains("segment 2"));
        assert_eq!(acc.phase(), RunPhase::Ready);
        assert_eq!(acc.get_state(), BatteryState::initial(0.5));
    }

    #[test]
    fn initial_soc_is_validated() {
        let cfg = BatteryConfiguration::default();
        assert!(StateAccumulator::new(-0.1, &cfg).is_err());
        assert!(StateAccumulator::new(1.5, &cfg).is_err());
        assert!(StateAccumulator::new(f64::NAN, &cfg).is_err());
        assert!(StateAccumulator::new(0.0, &cfg).is_ok());
        assert!(StateAccumulator::new(1.0, &cfg).is_ok());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn energy_sign_follows_current(amps in -50.0f64..50.0, hours in 0.01f64..4.0) {
                let mut acc = fresh(0.5);
                let end = hours * 3600.0;
                let up = acc
                    .apply(&segment(0, 0.0, end, amps), &flat(0.0, end, 400.0, amps))
                    .unwrap();
                if amps > 0.0 {
                    prop_assert!(up.energy_wh > 0.0);
                } else if amps < 0.0 {
                    prop_assert!(up.energy_wh < 0.0);
                }
                prop_assert!((0.0..=1.0).contains(&up.soc_after));
            }

            #[test]
            fn soc_always_within_bounds(
                soc in 0.0f64..=1.0,
                amps in -200.0f64..200.0,
            ) {
                let mut acc = fresh(soc);
                let up = acc
                    .apply(&segment(0, 0.0, 7200.0, amps), &flat(0.0, 7200.0, 400.0, amps))
                    .unwrap();
                prop_assert!((0.0..=1.0).contains(&up.soc_after));
                let flagged = !up.advisories.is_empty();
                let unclamped = soc - up.energy_wh / 10_000.0;
                prop_assert_eq!(flagged, !(0.0..=1.0).contains(&unclamped));
            }
        }
    }
}
