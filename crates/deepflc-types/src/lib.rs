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

pub mod config;
pub mod error;
pub mod membership;
pub mod points;
pub mod terms;

// Re-export common types for convenience
pub use config::{
    DeepFlcConfig, EnergySettings, ForecastSettings, PlantConstants, SimulationSettings,
};
pub use error::{ConfigError, ConfigResult};
pub use membership::{MembershipDefs, MembershipSpec};
pub use points::{CrispInputs, EnergyPoint, HistoryPoint, OperatingMode};
pub use terms::{OutputTerm, Term, Variable};
