//! Scenario files: a battery, a starting SOC, and a power request.

use std::path::Path;
use std::time::Duration;

use cf_core::{BatteryConfiguration, ControlMode, PowerUnit};
use cf_sim::{PowerSegment, RunOptions, TruncationPolicy, plan};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Run settings as they appear in a scenario file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOptions {
    pub truncation_policy: TruncationPolicy,
    pub power_unit: PowerUnit,
    pub control_mode: ControlMode,
    /// Wall-clock budget per solver call (seconds)
    pub attempt_timeout_s: Option<f64>,
}

impl ScenarioOptions {
    pub fn to_run_options(&self) -> AppResult<RunOptions> {
        let attempt_timeout = match self.attempt_timeout_s {
            None => None,
            Some(s) if s.is_finite() && s > 0.0 => Some(Duration::try_from_secs_f64(s).map_err(
                |_| AppError::Validation(format!("attempt timeout {s} s is out of range")),
            )?),
            Some(s) => {
                return Err(AppError::Validation(format!(
                    "attempt timeout must be a positive number of seconds (got {s})"
                )));
            }
        };
        Ok(RunOptions {
            truncation_policy: self.truncation_policy,
            power_unit: self.power_unit,
            control_mode: self.control_mode,
            attempt_timeout,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub battery: BatteryConfiguration,
    pub initial_soc: f64,
    pub segments: Vec<PowerSegment>,
    #[serde(default)]
    pub options: ScenarioOptions,
    /// Max tracing level for front ends that honour it
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        battery: BatteryConfiguration,
        initial_soc: f64,
        segments: Vec<PowerSegment>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            battery,
            initial_soc,
            segments,
            options: ScenarioOptions::default(),
            log_level: None,
        }
    }

    /// Check everything a run would reject, without touching a solver.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("scenario name is empty".to_string()));
        }
        if !self.initial_soc.is_finite() || !(0.0..=1.0).contains(&self.initial_soc) {
            return Err(AppError::Validation(format!(
                "initial SOC must lie in [0, 1] (got {})",
                self.initial_soc
            )));
        }
        plan(
            &self.segments,
            &self.battery,
            self.options.power_unit,
            self.options.control_mode,
        )
        .map_err(|e| AppError::Validation(e.to_string()))?;
        self.options.to_run_options()?;
        if let Some(level) = &self.log_level {
            crate::logging::parse_level(level)?;
        }
        Ok(())
    }

    /// Total requested duration (hours).
    pub fn duration_h(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_h).sum()
    }

    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_json_str(content: &str) -> AppResult<Self> {
        let scenario: Scenario = serde_json::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        Self::from_yaml_str(&read(path)?)
    }

    pub fn load_json(path: &Path) -> AppResult<Self> {
        Self::from_json_str(&read(path)?)
    }

    /// Load by extension: `.yaml`/`.yml` or `.json`.
    pub fn load(path: &Path) -> AppResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::load_yaml(path),
            Some("json") => Self::load_json(path),
            _ => Err(AppError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn read(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|source| AppError::ScenarioRead {
        path: path.to_path_buf(),
        source,
    })
}
