// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Configuration loading for CLI runs.

use std::path::Path;

use anyhow::{Context, Result};
use deepflc_types::{DeepFlcConfig, OperatingMode};

/// Load the configuration file, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<DeepFlcConfig> {
    let Some(path) = path else {
        return Ok(DeepFlcConfig::default());
    };

    let config = DeepFlcConfig::from_file(path).with_context(|| {
        format!(
            "Failed to load config file: {}\n\n\
            Run `deepflc-sim example-config` for a valid example.",
            path.display()
        )
    })?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Apply command-line overrides on top of a loaded configuration
pub fn apply_overrides(
    config: &mut DeepFlcConfig,
    mode: Option<OperatingMode>,
    load: Option<f64>,
) -> Result<()> {
    if let Some(mode) = mode {
        config.simulation.mode = mode;
    }
    if let Some(load) = load {
        config.simulation.load = load;
    }
    config
        .validate()
        .context("Invalid command-line overrides")?;
    Ok(())
}
