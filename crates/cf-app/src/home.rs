//! Home-battery presets and sizing helpers.

use cf_core::{BatteryConfiguration, ModelKind};
use cf_sim::PowerSegment;

use crate::error::{AppError, AppResult};
use crate::scenario::Scenario;

/// 13.5 kWh at 400 V on the DFN model.
pub fn powerwall_like() -> BatteryConfiguration {
    BatteryConfiguration::with_cell_window(ModelKind::Dfn, 13.5, 400.0)
}

pub fn home_10kwh() -> BatteryConfiguration {
    BatteryConfiguration::with_cell_window(ModelKind::Dfn, 10.0, 400.0)
}

fn segments(pattern: &[(f64, f64)]) -> Vec<PowerSegment> {
    pattern
        .iter()
        .map(|&(kw, h)| PowerSegment::new(kw, h))
        .collect()
}

/// A day on a Powerwall-sized pack: morning load, solar surplus, evening
/// load, night baseload. Starts at 90 %.
pub fn daily_cycle() -> Scenario {
    let mut s = Scenario::new(
        "daily-cycle",
        powerwall_like(),
        0.9,
        segments(&[(4.0, 2.0), (-3.0, 7.0), (5.0, 6.0), (1.0, 9.0)]),
    );
    s.description = Some("morning discharge, solar charging, evening and night load".to_string());
    s
}

/// Time-of-use arbitrage on a 15 kWh pack: off-peak charge, light daytime
/// load, heavy peak discharge. Starts nearly empty.
pub fn peak_shaving() -> Scenario {
    let mut s = Scenario::new(
        "peak-shaving",
        BatteryConfiguration::with_cell_window(ModelKind::Dfn, 15.0, 400.0),
        0.1,
        segments(&[(-7.0, 8.0), (2.0, 9.0), (8.0, 5.0), (3.0, 2.0)]),
    );
    s.description = Some("charge off-peak, discharge during peak tariff".to_string());
    s
}

/// Headline figures for a pack.
#[derive(Debug, Clone, PartialEq)]
pub struct BatterySpecs {
    pub model: ModelKind,
    pub capacity_kwh: f64,
    pub nominal_voltage_v: f64,
    /// Charge capacity at nominal voltage (Ah)
    pub capacity_ah: f64,
    pub max_recommended_power_kw: f64,
    pub min_voltage_v: f64,
    pub max_voltage_v: f64,
}

impl BatterySpecs {
    pub fn for_config(config: &BatteryConfiguration) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            model: config.model,
            capacity_kwh: config.capacity_kwh,
            nominal_voltage_v: config.nominal_voltage_v,
            capacity_ah: config.capacity_ah(),
            max_recommended_power_kw: config.recommended_max_power_kw(),
            min_voltage_v: config.min_voltage_v,
            max_voltage_v: config.max_voltage_v,
        })
    }

    /// Hours a full pack carries a constant `load_kw`.
    pub fn backup_hours(&self, load_kw: f64) -> AppResult<f64> {
        self.backup_hours_at(1.0, load_kw)
    }

    /// Hours the energy left at `soc` carries a constant `load_kw`.
    pub fn backup_hours_at(&self, soc: f64, load_kw: f64) -> AppResult<f64> {
        if !load_kw.is_finite() || load_kw <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "load must be positive (got {load_kw} kW)"
            )));
        }
        if !(0.0..=1.0).contains(&soc) {
            return Err(AppError::InvalidInput(format!(
                "SOC must lie in [0, 1] (got {soc})"
            )));
        }
        Ok(soc * self.capacity_kwh / load_kw)
    }
}
