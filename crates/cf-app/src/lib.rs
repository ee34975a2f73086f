//! Application layer for cellflow.
//!
//! Scenario files, run and sweep services, home-battery presets, and logging
//! setup shared by any front end.

pub mod error;
pub mod home;
pub mod logging;
pub mod scenario;
pub mod service;

pub use error::{AppError, AppResult};
pub use home::{BatterySpecs, daily_cycle, home_10kwh, peak_shaving, powerwall_like};
pub use scenario::{Scenario, ScenarioOptions};
pub use service::{compare_models, run_scenario, run_scenario_with_progress, sweep_model};
