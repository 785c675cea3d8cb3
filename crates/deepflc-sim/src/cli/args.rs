// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use deepflc_types::{CrispInputs, OperatingMode};

#[derive(Debug, Parser)]
#[command(name = "deepflc-sim")]
#[command(author, version, about = "Deep-FLC controller simulator CLI")]
#[command(
    long_about = "Simulate a battery/load plant driven by a fuzzy-logic controller.\n\
    \nThe controller runs in conventional mode on live inputs, or in deep mode on\n\
    smoothed forecasts of the input histories.\n\
    \nExamples:\n  \
    deepflc-sim run                           # 200 ticks with default settings\n  \
    deepflc-sim run --mode deep --load 85     # Deep mode under heavy load\n  \
    deepflc-sim infer --soc 30 --temperature 70\n  \
    deepflc-sim rules --fired-at 50,100,50,25\n  \
    deepflc-sim live --ticks 10               # Real-time ticking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a batch simulation and print or export the series
    #[command(
        long_about = "Step the simulation a fixed number of ticks as fast as possible.\n\
        \nExamples:\n  \
        deepflc-sim run --ticks 500\n  \
        deepflc-sim run --config deepflc.toml --output json\n  \
        deepflc-sim run --output both --csv-path series.csv"
    )]
    Run(RunArgs),

    /// Evaluate the controller once for given inputs
    #[command(
        long_about = "Fuzzify the inputs, fire the rule base and print CP and GP.\n\
        \nExamples:\n  \
        deepflc-sim infer\n  \
        deepflc-sim infer --soc 20 --soh 55 --load 90 --temperature 65 --top 5"
    )]
    Infer(InferArgs),

    /// Print the generated rule base
    #[command(
        long_about = "Print all 81 rules, or only those firing at the given inputs.\n\
        \nExamples:\n  \
        deepflc-sim rules\n  \
        deepflc-sim rules --fired-at 37.5,100,50,35"
    )]
    Rules(RulesArgs),

    /// Tick the simulation in real time
    #[command(
        long_about = "Start the real-time tick driver and print every tick as it happens.\n\
        \nExamples:\n  \
        deepflc-sim live --ticks 10\n  \
        deepflc-sim live --ticks 30 --interval-ms 200 --mode deep"
    )]
    Live(LiveArgs),

    /// Print an example configuration file
    ExampleConfig,
}

/// Output format for batch results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
    /// Table on stdout plus a CSV file
    Both,
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 200)]
    pub ticks: usize,

    /// Operating mode; overrides the configuration file
    #[arg(
        long,
        help = "Controller mode (conventional, deep)",
        long_help = "Available modes:\n  \
          - conventional: controller reads the live inputs\n  \
          - deep: controller reads smoothed forecasts of the input histories"
    )]
    pub mode: Option<OperatingMode>,

    /// Live load input (0-100%); overrides the configuration file
    #[arg(long)]
    pub load: Option<f64>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// CSV file path (required for csv and both)
    #[arg(long)]
    pub csv_path: Option<PathBuf>,

    /// Print only the last N points of the series in table output
    #[arg(long, default_value_t = 20)]
    pub tail: usize,
}

#[derive(Debug, Parser)]
pub struct InferArgs {
    #[arg(long, default_value_t = 50.0)]
    pub soc: f64,

    #[arg(long, default_value_t = 100.0)]
    pub soh: f64,

    #[arg(long, default_value_t = 50.0)]
    pub load: f64,

    #[arg(long, default_value_t = 25.0)]
    pub temperature: f64,

    /// TOML configuration file with membership overrides
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of strongest fired rules to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

impl InferArgs {
    pub fn inputs(&self) -> CrispInputs {
        CrispInputs::new(self.soc, self.soh, self.load, self.temperature)
    }
}

#[derive(Debug, Parser)]
pub struct RulesArgs {
    /// Show only the rules firing at SOC,SOH,LOAD,TEMP
    #[arg(long, value_parser = parse_inputs, value_name = "SOC,SOH,LOAD,TEMP")]
    pub fired_at: Option<CrispInputs>,

    /// TOML configuration file with membership overrides
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct LiveArgs {
    /// Stop after this many ticks
    #[arg(long, default_value_t = 10)]
    pub ticks: usize,

    /// Tick period; defaults to the configured interval
    #[arg(long)]
    pub interval_ms: Option<u64>,

    #[arg(long)]
    pub mode: Option<OperatingMode>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parse `SOC,SOH,LOAD,TEMP` into crisp inputs
pub fn parse_inputs(value: &str) -> Result<CrispInputs, String> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("'{}' is not a number: {e}", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        &[soc, soh, load, temperature] => Ok(CrispInputs::new(soc, soh, load, temperature)),
        _ => Err(format!(
            "expected 4 comma-separated values (SOC,SOH,LOAD,TEMP), got {}",
            parts.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_inputs() {
        let inputs = parse_inputs("37.5, 100,50,35").unwrap();
        assert_eq!(inputs, CrispInputs::new(37.5, 100.0, 50.0, 35.0));

        assert!(parse_inputs("1,2,3").is_err());
        assert!(parse_inputs("1,2,x,4").is_err());
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from([
            "deepflc-sim",
            "run",
            "--ticks",
            "50",
            "--mode",
            "deep",
            "--output",
            "both",
            "--csv-path",
            "out.csv",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.ticks, 50);
        assert_eq!(args.mode, Some(OperatingMode::Deep));
        assert_eq!(args.output, OutputFormat::Both);
        assert_eq!(args.csv_path, Some(PathBuf::from("out.csv")));
        assert_eq!(args.load, None);
    }

    #[test]
    fn test_rules_fired_at() {
        let cli = Cli::try_parse_from(["deepflc-sim", "rules", "--fired-at", "50,100,50,25"])
            .unwrap();

        let Commands::Rules(args) = cli.command else {
            panic!("expected rules command");
        };
        assert_eq!(
            args.fired_at,
            Some(CrispInputs::new(50.0, 100.0, 50.0, 25.0))
        );
    }
}
