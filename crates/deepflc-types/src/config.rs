// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::membership::MembershipDefs;
use crate::points::OperatingMode;

// ============= Root Configuration =============

/// Complete controller configuration. Every section is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepFlcConfig {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub plant: PlantConstants,
    #[serde(default)]
    pub forecast: ForecastSettings,
    #[serde(default)]
    pub energy: EnergySettings,
    /// Membership shapes overriding the defaults, variable -> term -> shape
    #[serde(default = "MembershipDefs::empty")]
    pub membership: MembershipDefs,
}

impl Default for DeepFlcConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationSettings::default(),
            plant: PlantConstants::default(),
            forecast: ForecastSettings::default(),
            energy: EnergySettings::default(),
            membership: MembershipDefs::empty(),
        }
    }
}

// ============= Simulation Settings =============

/// Initial state and timing of the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    #[serde(default)]
    pub mode: OperatingMode,
    /// Live load input (%)
    #[serde(default = "default_load")]
    pub load: f64,
    #[serde(default = "default_initial_soc")]
    pub initial_soc: f64,
    #[serde(default = "default_initial_soh")]
    pub initial_soh: f64,
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    /// Period of the tick driver
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Capacity of every history buffer and output series
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_load() -> f64 {
    50.0
}

fn default_initial_soc() -> f64 {
    50.0
}

fn default_initial_soh() -> f64 {
    100.0
}

fn default_initial_temperature() -> f64 {
    25.0
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_history_capacity() -> usize {
    200
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            load: default_load(),
            initial_soc: default_initial_soc(),
            initial_soh: default_initial_soh(),
            initial_temperature: default_initial_temperature(),
            tick_interval_ms: default_tick_interval_ms(),
            history_capacity: default_history_capacity(),
        }
    }
}

// ============= Plant Constants =============

/// Physical constants of the battery/load plant used by the tick integrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConstants {
    pub battery_capacity_kwh: f64,
    /// PV power routed into the battery (W)
    pub pv_to_battery_w: f64,
    /// Load percentage above which the battery feeds the load
    pub battery_to_load_threshold: f64,
    /// Battery-to-load factor applied above the threshold
    pub battery_to_load_factor: f64,
    pub charge_efficiency: f64,
    /// Temperature rise per tick per load percent
    pub thermal_coefficient: f64,
    pub soh_decay_per_tick: f64,
    pub soh_floor: f64,
    /// Constant grid draw (W)
    pub grid_power_w: f64,
    /// Load power at 100 % (W)
    pub rated_load_w: f64,
    /// Load power covered before the battery contributes (W)
    pub load_base_w: f64,
    pub tick_seconds: f64,
}

impl Default for PlantConstants {
    fn default() -> Self {
        Self {
            battery_capacity_kwh: 16.2,
            pv_to_battery_w: 200.0,
            battery_to_load_threshold: 100.0,
            battery_to_load_factor: 0.1,
            charge_efficiency: 0.9,
            thermal_coefficient: 0.01,
            soh_decay_per_tick: 0.005,
            soh_floor: 40.0,
            grid_power_w: 200.0,
            rated_load_w: 5000.0,
            load_base_w: 1000.0,
            tick_seconds: 1.0,
        }
    }
}

impl PlantConstants {
    fn fields(&self) -> [(&'static str, f64); 12] {
        [
            ("plant.battery_capacity_kwh", self.battery_capacity_kwh),
            ("plant.pv_to_battery_w", self.pv_to_battery_w),
            ("plant.battery_to_load_threshold", self.battery_to_load_threshold),
            ("plant.battery_to_load_factor", self.battery_to_load_factor),
            ("plant.charge_efficiency", self.charge_efficiency),
            ("plant.thermal_coefficient", self.thermal_coefficient),
            ("plant.soh_decay_per_tick", self.soh_decay_per_tick),
            ("plant.soh_floor", self.soh_floor),
            ("plant.grid_power_w", self.grid_power_w),
            ("plant.rated_load_w", self.rated_load_w),
            ("plant.load_base_w", self.load_base_w),
            ("plant.tick_seconds", self.tick_seconds),
        ]
    }
}

// ============= Forecast / Energy =============

/// Parameters of the smoothing forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub alpha: f64,
    /// Prediction returned for an empty history
    pub fallback: f64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            fallback: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySettings {
    /// Flat tariff used to price cumulative energy
    pub tariff_per_kwh: f64,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            tariff_per_kwh: 0.25,
        }
    }
}

// ============= Loading & Validation =============

impl DeepFlcConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Default membership shapes with this configuration's overrides applied
    pub fn membership_defs(&self) -> ConfigResult<MembershipDefs> {
        let mut defs = MembershipDefs::default();
        defs.apply(&self.membership)?;
        Ok(defs)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let sim = &self.simulation;
        let plant = &self.plant;

        if sim.history_capacity == 0 {
            return Err(invalid("simulation.history_capacity", "must be at least 1"));
        }
        if sim.tick_interval_ms == 0 {
            return Err(invalid("simulation.tick_interval_ms", "must be positive"));
        }
        check_percent("simulation.load", sim.load)?;
        check_percent("simulation.initial_soc", sim.initial_soc)?;
        check_percent("simulation.initial_temperature", sim.initial_temperature)?;
        if !(plant.soh_floor..=100.0).contains(&sim.initial_soh) {
            return Err(invalid(
                "simulation.initial_soh",
                format!("must be within {}..=100", plant.soh_floor),
            ));
        }

        for (field, value) in plant.fields() {
            if !value.is_finite() {
                return Err(invalid(field, format!("{value} is not a finite number")));
            }
        }
        if plant.battery_capacity_kwh <= 0.0 {
            return Err(invalid("plant.battery_capacity_kwh", "must be positive"));
        }
        if plant.tick_seconds <= 0.0 {
            return Err(invalid("plant.tick_seconds", "must be positive"));
        }
        check_percent("plant.soh_floor", plant.soh_floor)?;
        if plant.soh_decay_per_tick < 0.0 {
            return Err(invalid("plant.soh_decay_per_tick", "must not be negative"));
        }
        if plant.pv_to_battery_w < 0.0
            || plant.grid_power_w < 0.0
            || plant.rated_load_w < 0.0
            || plant.load_base_w < 0.0
        {
            return Err(invalid("plant", "power values must not be negative"));
        }
        if plant.charge_efficiency < 0.0 || plant.battery_to_load_factor < 0.0 {
            return Err(invalid("plant", "factors must not be negative"));
        }

        if !(self.forecast.alpha > 0.0 && self.forecast.alpha <= 1.0) {
            return Err(invalid("forecast.alpha", "must be within (0, 1]"));
        }
        check_percent("forecast.fallback", self.forecast.fallback)?;

        if !(self.energy.tariff_per_kwh.is_finite() && self.energy.tariff_per_kwh >= 0.0) {
            return Err(invalid("energy.tariff_per_kwh", "must not be negative"));
        }

        // Unknown terms surface here rather than at the first tick
        self.membership_defs()?;
        Ok(())
    }

    /// Example configuration file
    pub fn example_toml() -> String {
        r#"# Deep-FLC controller configuration. Every section is optional.

[simulation]
mode = "conventional"     # or "deep"
load = 50.0               # live load input (%)
initial_soc = 50.0
initial_soh = 100.0
initial_temperature = 25.0
tick_interval_ms = 1000
history_capacity = 200

[plant]
battery_capacity_kwh = 16.2
pv_to_battery_w = 200.0
battery_to_load_threshold = 100.0   # load % above which the battery feeds the load
battery_to_load_factor = 0.1
charge_efficiency = 0.9
thermal_coefficient = 0.01
soh_decay_per_tick = 0.005
soh_floor = 40.0
grid_power_w = 200.0
rated_load_w = 5000.0
load_base_w = 1000.0
tick_seconds = 1.0

[forecast]
alpha = 0.2
fallback = 50.0

[energy]
tariff_per_kwh = 0.25

# Membership overrides: variable -> term -> { a, b, c } with a <= b <= c
[membership.soc]
low = { a = 0.0, b = 0.0, c = 50.0 }
medium = { a = 25.0, b = 50.0, c = 75.0 }
high = { a = 50.0, b = 100.0, c = 100.0 }

[membership.temperature]
high = { a = 45.0, b = 100.0, c = 100.0 }
"#
        .to_owned()
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn check_percent(field: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside 0..=100")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::{Term, Variable};
    use std::io::Write;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = DeepFlcConfig::from_toml_str("").unwrap();
        assert_eq!(config, DeepFlcConfig::default());
        assert_eq!(config.simulation.history_capacity, 200);
        assert_eq!(config.plant.battery_capacity_kwh, 16.2);
        assert_eq!(config.membership_defs().unwrap(), MembershipDefs::default());
    }

    #[test]
    fn test_example_config_parses() {
        let config = DeepFlcConfig::from_toml_str(&DeepFlcConfig::example_toml()).unwrap();
        let defs = config.membership_defs().unwrap();

        assert_eq!(
            defs.get(Variable::Soc, Term::Medium).map(|s| s.points()),
            Some((25.0, 50.0, 75.0))
        );
        assert_eq!(config.simulation.mode, OperatingMode::Conventional);
    }

    #[test]
    fn test_membership_override_merges_with_defaults() {
        let config = DeepFlcConfig::from_toml_str(
            r#"
[simulation]
mode = "deep"

[membership.load]
high = { a = 70.0, b = 100.0, c = 100.0 }
"#,
        )
        .unwrap();
        let defs = config.membership_defs().unwrap();

        assert_eq!(config.simulation.mode, OperatingMode::Deep);
        assert_eq!(
            defs.get(Variable::Load, Term::High).map(|s| s.points()),
            Some((70.0, 100.0, 100.0))
        );
        // Untouched terms keep their default shape
        assert_eq!(
            defs.get(Variable::Load, Term::Low).map(|s| s.points()),
            Some((0.0, 0.0, 40.0))
        );
    }

    #[test]
    fn test_rejects_malformed_membership() {
        let err = DeepFlcConfig::from_toml_str(
            r#"
[membership.soc]
low = { a = 30.0, b = 10.0, c = 50.0 }
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_foreign_term() {
        let err = DeepFlcConfig::from_toml_str(
            r#"
[membership.soh]
high = { a = 30.0, b = 50.0, c = 70.0 }
"#,
        );
        assert!(matches!(err, Err(ConfigError::UnknownTerm { .. })));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = DeepFlcConfig::from_toml_str("[simulation]\nhistory_capacity = 0\n");
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue {
                field: "simulation.history_capacity",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_finite_plant_constants() {
        for (key, value) in [
            ("thermal_coefficient", "nan"),
            ("grid_power_w", "nan"),
            ("pv_to_battery_w", "inf"),
            ("charge_efficiency", "-inf"),
            ("battery_to_load_threshold", "nan"),
            ("battery_to_load_factor", "inf"),
            ("load_base_w", "nan"),
        ] {
            let err = DeepFlcConfig::from_toml_str(&format!("[plant]\n{key} = {value}\n"));
            assert!(
                matches!(err, Err(ConfigError::InvalidValue { field, .. }) if field == format!("plant.{key}")),
                "{key} = {value} accepted"
            );
        }
    }

    #[test]
    fn test_example_lists_every_plant_constant() {
        let example = DeepFlcConfig::example_toml();
        for (field, _) in PlantConstants::default().fields() {
            let key = field.trim_start_matches("plant.");
            assert!(example.contains(&format!("\n{key} = ")), "{key} missing");
        }
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut config = DeepFlcConfig::default();
        config.simulation.load = 85.0;
        config.energy.tariff_per_kwh = 0.4;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes())
            .unwrap();

        let loaded = DeepFlcConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DeepFlcConfig::from_file("/nonexistent/deepflc.toml");
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
