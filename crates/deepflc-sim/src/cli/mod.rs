// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! CLI module for the simulator command-line interface.

pub mod args;
pub mod config;
pub mod formatters;

pub use args::{Cli, Commands, InferArgs, LiveArgs, OutputFormat, RulesArgs, RunArgs};
pub use config::{apply_overrides, load_config};
pub use formatters::{CsvFormatter, JsonFormatter, SeriesRow, TableFormatter, series_rows};
