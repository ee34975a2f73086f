//! Named solver tolerance presets.

use core::fmt;

/// Which preset a solver call uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Default,
    Safe,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Safe => write!(f, "safe"),
        }
    }
}

/// Solver-facing tolerance and step-size settings.
///
/// Passed explicitly on every solver call; there is no process-wide solver
/// configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StabilityProfile {
    pub kind: ProfileKind,
    /// Absolute tolerance (V for voltage events)
    pub abs_tol: f64,
    /// Relative tolerance
    pub rel_tol: f64,
    /// Largest step the solver may take (s)
    pub max_step_s: f64,
    /// Step halvings allowed before the solver gives up
    pub max_step_reductions: u32,
}

impl StabilityProfile {
    pub const DEFAULT: StabilityProfile = StabilityProfile {
        kind: ProfileKind::Default,
        abs_tol: 1e-6,
        rel_tol: 1e-6,
        max_step_s: 60.0,
        max_step_reductions: 4,
    };

    /// Conservative preset: tighter tolerances, smaller steps, and a deeper
    /// step-reduction budget.
    pub const SAFE: StabilityProfile = StabilityProfile {
        kind: ProfileKind::Safe,
        abs_tol: 1e-8,
        rel_tol: 1e-6,
        max_step_s: 10.0,
        max_step_reductions: 8,
    };

    pub fn for_kind(kind: ProfileKind) -> &'static StabilityProfile {
        match kind {
            ProfileKind::Default => &Self::DEFAULT,
            ProfileKind::Safe => &Self::SAFE,
        }
    }

    /// Smallest step the solver can reach before diverging (s).
    pub fn min_step_s(&self) -> f64 {
        self.max_step_s / 2f64.powi(self.max_step_reductions as i32)
    }

    /// Event tolerance around a target value.
    pub fn event_tolerance(&self, target: f64) -> f64 {
        self.abs_tol + self.rel_tol * target.abs()
    }
}
