//! Battery configuration and model catalogue.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::units;

/// Share of rated capacity (per hour) recommended as continuous power.
pub const RECOMMENDED_C_RATE: f64 = 0.7;

/// Electrochemical model variants a solver can be asked to integrate.
///
/// Each variant carries the power magnitude it is known to integrate reliably
/// with default solver settings. Beyond that, expect step-size trouble.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ModelKind {
    /// Single particle model: fastest, least robust at high power.
    Spm,
    /// Single particle model with electrolyte.
    Spme,
    /// Doyle-Fuller-Newman: slowest, robust at high power.
    #[default]
    Dfn,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Spm, ModelKind::Spme, ModelKind::Dfn];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Spm => "SPM",
            ModelKind::Spme => "SPMe",
            ModelKind::Dfn => "DFN",
        }
    }

    /// Largest power magnitude (kW) known to integrate on default settings.
    pub fn stable_power_limit_kw(self) -> f64 {
        match self {
            ModelKind::Spm => 5.0,
            ModelKind::Spme => 8.0,
            ModelKind::Dfn => 20.0,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ModelKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spm" => Ok(ModelKind::Spm),
            "spme" => Ok(ModelKind::Spme),
            "dfn" => Ok(ModelKind::Dfn),
            _ => Err(CoreError::UnknownModel {
                name: s.to_string(),
            }),
        }
    }
}

/// Static description of the simulated battery pack.
///
/// Created once per run and never mutated. Call [`BatteryConfiguration::validate`]
/// before handing it to anything that divides by its fields.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatteryConfiguration {
    pub model: ModelKind,
    /// Rated energy capacity (kWh)
    pub capacity_kwh: f64,
    /// Nominal pack voltage (V)
    pub nominal_voltage_v: f64,
    /// Lower terminal voltage cut-off (V)
    pub min_voltage_v: f64,
    /// Upper terminal voltage cut-off (V)
    pub max_voltage_v: f64,
}

impl Default for BatteryConfiguration {
    fn default() -> Self {
        Self {
            model: ModelKind::Dfn,
            capacity_kwh: 10.0,
            nominal_voltage_v: 400.0,
            min_voltage_v: 320.0,
            max_voltage_v: 460.0,
        }
    }
}

impl BatteryConfiguration {
    /// Build a configuration whose voltage window follows a 3.0-4.2 V cell
    /// window around a 3.7 V nominal cell.
    pub fn with_cell_window(model: ModelKind, capacity_kwh: f64, nominal_voltage_v: f64) -> Self {
        let cells = nominal_voltage_v / 3.7;
        Self {
            model,
            capacity_kwh,
            nominal_voltage_v,
            min_voltage_v: cells * 3.0,
            max_voltage_v: cells * 4.2,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.capacity_kwh.is_finite() || self.capacity_kwh <= 0.0 {
            return Err(CoreError::config(format!(
                "capacity must be positive (got {} kWh)",
                self.capacity_kwh
            )));
        }
        if !self.nominal_voltage_v.is_finite() || self.nominal_voltage_v <= 0.0 {
            return Err(CoreError::config(format!(
                "nominal voltage must be positive (got {} V)",
                self.nominal_voltage_v
            )));
        }
        if !self.min_voltage_v.is_finite() || !self.max_voltage_v.is_finite() {
            return Err(CoreError::config("voltage bounds must be finite"));
        }
        if self.min_voltage_v >= self.max_voltage_v {
            return Err(CoreError::config(format!(
                "min voltage {} V must be below max voltage {} V",
                self.min_voltage_v, self.max_voltage_v
            )));
        }
        Ok(())
    }

    pub fn capacity_wh(&self) -> f64 {
        units::as_wh(units::kwh(self.capacity_kwh))
    }

    /// Charge capacity at nominal voltage (Ah).
    pub fn capacity_ah(&self) -> f64 {
        units::as_ah(units::kwh(self.capacity_kwh) / units::volts(self.nominal_voltage_v))
    }

    /// Continuous power the pack should be driven at: the lower of 0.7C and
    /// the model's stable limit.
    pub fn recommended_max_power_kw(&self) -> f64 {
        (RECOMMENDED_C_RATE * self.capacity_kwh).min(self.model.stable_power_limit_kw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        BatteryConfiguration::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_positive_capacity() {
        let cfg = BatteryConfiguration {
            capacity_kwh: 0.0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn rejects_non_positive_voltage() {
        let cfg = BatteryConfiguration {
            nominal_voltage_v: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_window() {
        let cfg = BatteryConfiguration {
            min_voltage_v: 460.0,
            max_voltage_v: 320.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn capacity_conversions() {
        let cfg = BatteryConfiguration::default();
        assert!((cfg.capacity_wh() - 10_000.0).abs() < 1e-6);
        assert!((cfg.capacity_ah() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn recommended_power_is_capped_by_model() {
        let small = BatteryConfiguration::with_cell_window(ModelKind::Dfn, 5.0, 400.0);
        assert!((small.recommended_max_power_kw() - 3.5).abs() < 1e-12);

        let fragile = BatteryConfiguration::with_cell_window(ModelKind::Spm, 20.0, 400.0);
        assert!((fragile.recommended_max_power_kw() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn cell_window_brackets_nominal() {
        let cfg = BatteryConfiguration::with_cell_window(ModelKind::Spme, 13.5, 400.0);
        assert!(cfg.min_voltage_v < cfg.nominal_voltage_v);
        assert!(cfg.max_voltage_v > cfg.nominal_voltage_v);
        cfg.validate().unwrap();
    }

    #[test]
    fn model_parse_and_display() {
        assert_eq!("spme".parse::<ModelKind>().unwrap(), ModelKind::Spme);
        assert_eq!(" DFN ".parse::<ModelKind>().unwrap(), ModelKind::Dfn);
        assert!("p2d".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Spm.to_string(), "SPM");
    }
}
