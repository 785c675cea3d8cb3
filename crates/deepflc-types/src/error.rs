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

//! Error types for the configuration boundary

use thiserror::Error;

use crate::terms::{Term, Variable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid membership triple ({a}, {b}, {c}): control points must satisfy a <= b <= c")]
    InvalidMembership { a: f64, b: f64, c: f64 },

    #[error("membership control points must be finite, got ({a}, {b}, {c})")]
    NonFiniteMembership { a: f64, b: f64, c: f64 },

    #[error("term {term} is not defined for variable {variable}")]
    UnknownTerm { variable: Variable, term: Term },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
