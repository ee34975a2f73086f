//! cf-core: shared foundation for cellflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - units (uom SI types + constructors)
//! - config (battery configuration and model catalogue)
//! - convert (power <-> solver control signal)
//! - error (shared error types)

pub mod config;
pub mod convert;
pub mod error;
pub mod numeric;
pub mod units;

pub use config::{BatteryConfiguration, ModelKind};
pub use convert::{ControlMode, ControlSignal, control_to_power, power_to_control};
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::PowerUnit;
