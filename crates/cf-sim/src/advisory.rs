//! Non-fatal findings attached to segment results.

use core::fmt;

use cf_solver::TruncationReason;

/// Which end of the SOC range was crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocBound {
    Low,
    High,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Advisory {
    /// SOC left [0, 1] and was clamped. `unclamped` is the value before clamping.
    SocBoundCrossed {
        segment: usize,
        bound: SocBound,
        unclamped: f64,
    },
    /// The solver stopped the segment early at a voltage bound.
    VoltageLimitReached {
        segment: usize,
        time_s: f64,
        reason: TruncationReason,
    },
}

impl Advisory {
    pub fn segment(&self) -> usize {
        match self {
            Advisory::SocBoundCrossed { segment, .. }
            | Advisory::VoltageLimitReached { segment, .. } => *segment,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::SocBoundCrossed {
                segment,
                bound,
                unclamped,
            } => {
                let side = match bound {
                    SocBound::Low => "below 0",
                    SocBound::High => "above 1",
                };
                write!(
                    f,
                    "segment {segment}: SOC {side} ({unclamped:.4}), clamped"
                )
            }
            Advisory::VoltageLimitReached {
                segment,
                time_s,
                reason,
            } => write!(f, "segment {segment}: {reason} at t = {time_s:.1} s"),
        }
    }
}
