// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Inputs and per-tick output records of the controller.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::terms::Variable;

/// Controller operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Inference runs on the live inputs
    #[default]
    Conventional,
    /// Inference runs on forecast inputs
    Deep,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conventional => f.write_str("conventional"),
            Self::Deep => f.write_str("deep"),
        }
    }
}

impl std::str::FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conventional" | "conv" | "flc" => Ok(Self::Conventional),
            "deep" | "deep-flc" | "deep_flc" => Ok(Self::Deep),
            other => Err(format!(
                "unknown mode '{other}' (expected 'conventional' or 'deep')"
            )),
        }
    }
}

/// Crisp controller inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrispInputs {
    pub soc: f64,
    pub soh: f64,
    pub load: f64,
    pub temperature: f64,
}

impl CrispInputs {
    pub fn new(soc: f64, soh: f64, load: f64, temperature: f64) -> Self {
        Self {
            soc,
            soh,
            load,
            temperature,
        }
    }

    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Soc => self.soc,
            Variable::Soh => self.soh,
            Variable::Load => self.load,
            Variable::Temperature => self.temperature,
        }
    }
}

/// One tick of the output series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub time: u64,
    pub soc: f64,
    pub soh: f64,
    pub load: f64,
    pub temperature: f64,
    /// Charge power command (%)
    pub cp: f64,
    /// Generation power command (%)
    pub gp: f64,
    pub mode: OperatingMode,
}

/// Cumulative energy drawn up to and including a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyPoint {
    pub time: u64,
    pub cumulative_energy_kwh: f64,
}

impl EnergyPoint {
    /// Cumulative cost at a flat tariff
    pub fn cost(&self, tariff_per_kwh: f64) -> f64 {
        self.cumulative_energy_kwh * tariff_per_kwh
    }
}
