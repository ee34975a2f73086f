//! Segment-by-segment battery simulation control.
//!
//! Provides:
//! - Segment planning from (power, duration) requests
//! - A stability guard with a single safe-mode retry per segment
//! - Cross-segment state accumulation (SOC, energy, throughput)
//! - The run engine with optional progress reporting
//! - Stability sweeps over candidate power magnitudes

pub mod accumulator;
pub mod advisory;
pub mod candidates;
pub mod engine;
pub mod error;
pub mod guard;
pub mod planner;
pub mod progress;
pub mod sweep;

pub use accumulator::{BatteryState, RunPhase, SegmentUpdate, StateAccumulator, TruncationPolicy};
pub use advisory::{Advisory, SocBound};
pub use candidates::{linear_candidates, logarithmic_candidates};
pub use engine::{RunOptions, RunResult, RunStatus, RunSummary, SegmentReport, run, run_with_progress};
pub use error::{SimError, SimResult};
pub use guard::{GuardedTrajectory, StabilityGuard};
pub use planner::{PowerSegment, SimulationSegment, plan};
pub use progress::{RunProgressEvent, RunStage};
pub use sweep::{StabilityClass, StabilityReport, SweepOptions, SweepTrial, sweep, sweep_parallel};
