//! Solver boundary for cellflow.
//!
//! The simulation engine never integrates cell dynamics itself. It hands a
//! [`IntegrationRequest`] to a [`CellSolver`] and gets back a tagged
//! [`SolverOutcome`]: a full trajectory, a trajectory truncated at a voltage
//! cut-off, or a divergence.
//!
//! Provides:
//! - `CellSolver` trait and request types
//! - `StabilityProfile` presets ("default" and "safe")
//! - `EquivalentCircuitSolver`, a built-in stiff reference solver
//! - `CountingSolver`, a call-counting wrapper for diagnostics

pub mod adapter;
pub mod counting;
pub mod error;
pub mod outcome;
pub mod profile;
pub mod reference;

pub use adapter::{CellSolver, InitialCondition, IntegrationRequest, TimeWindow};
pub use counting::CountingSolver;
pub use error::{SolverError, SolverResult};
pub use outcome::{Sample, SolverOutcome, Trajectory, Truncation, TruncationReason};
pub use profile::{ProfileKind, StabilityProfile};
pub use reference::EquivalentCircuitSolver;
