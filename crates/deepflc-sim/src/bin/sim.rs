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

//! CLI entry point for the Deep-FLC simulator

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deepflc_core::{RuleBase, RunSummary, Simulation, TickDriver, infer, shared_membership};
use deepflc_sim::cli::{
    Cli, Commands, CsvFormatter, InferArgs, JsonFormatter, LiveArgs, OutputFormat, RulesArgs,
    RunArgs, SeriesRow, TableFormatter, apply_overrides, load_config, series_rows,
};
use deepflc_types::DeepFlcConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so CSV/JSON on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("deepflc_sim=info,deepflc_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_command(&args),
        Commands::Infer(args) => infer_command(&args),
        Commands::Rules(args) => rules_command(&args),
        Commands::Live(args) => live_command(args).await,
        Commands::ExampleConfig => {
            print!("{}", DeepFlcConfig::example_toml());
            Ok(())
        }
    }
}

fn run_command(args: &RunArgs) -> Result<()> {
    let needs_csv = matches!(args.output, OutputFormat::Csv | OutputFormat::Both);
    if needs_csv && args.csv_path.is_none() {
        anyhow::bail!("--csv-path is required when --output is 'csv' or 'both'");
    }

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args.mode, args.load)?;
    let defs = config.membership_defs()?;
    let rules = RuleBase::default();

    let mut simulation = Simulation::from_config(&config);
    info!(
        "Running {} ticks in {} mode at {}% load",
        args.ticks,
        simulation.mode(),
        simulation.state().load
    );
    simulation.run(args.ticks, &defs, &rules);

    let rows = series_rows(&simulation);
    let summary = RunSummary::from_simulation(&simulation, config.energy.tariff_per_kwh);

    match args.output {
        OutputFormat::Table | OutputFormat::Both => {
            println!("{}", TableFormatter::format_run(&rows, &summary, args.tail));
        }
        OutputFormat::Json => println!("{}", JsonFormatter::format_run(&summary, &rows)?),
        OutputFormat::Csv => {}
    }

    if let (true, Some(csv_path)) = (needs_csv, &args.csv_path) {
        CsvFormatter::write_series_to_path(csv_path, &rows)?;
        println!("CSV exported to: {}", csv_path.display());
    }

    Ok(())
}

fn infer_command(args: &InferArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let defs = config.membership_defs()?;
    let rules = RuleBase::default();

    let inputs = args.inputs();
    let result = infer(&inputs, &defs, &rules);

    println!(
        "{}",
        TableFormatter::format_inference(&inputs, &result, &rules, args.top)
    );
    Ok(())
}

fn rules_command(args: &RulesArgs) -> Result<()> {
    let rules = RuleBase::default();

    let Some(inputs) = args.fired_at else {
        println!(
            "{}",
            TableFormatter::format_rules(rules.iter().map(|rule| (rule, None)))
        );
        println!("{} rules", rules.len());
        return Ok(());
    };

    let config = load_config(args.config.as_deref())?;
    let defs = config.membership_defs()?;
    let result = infer(&inputs, &defs, &rules);

    if result.fired.is_empty() {
        println!("No rule fires at these inputs; CP and GP default to 50%");
        return Ok(());
    }

    println!(
        "{}",
        TableFormatter::format_rules(
            result
                .fired
                .iter()
                .filter_map(|fired| rules.get(fired.id).map(|rule| (rule, Some(*fired))))
        )
    );
    println!(
        "{} of {} rules fired | CP {:.2}% | GP {:.2}%",
        result.fired.len(),
        rules.len(),
        result.cp,
        result.gp
    );
    Ok(())
}

async fn live_command(args: LiveArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args.mode, None)?;
    let defs = config.membership_defs()?;

    let interval_ms = args
        .interval_ms
        .unwrap_or(config.simulation.tick_interval_ms);
    if interval_ms == 0 {
        anyhow::bail!("--interval-ms must be positive");
    }

    let (handle, mut events, task) = TickDriver::spawn_with_task(
        Simulation::from_config(&config),
        shared_membership(defs),
        Arc::new(RuleBase::default()),
        Duration::from_millis(interval_ms),
    );
    handle.start()?;

    let mut received = 0;
    while received < args.ticks {
        tokio::select! {
            event = events.recv() => {
                let Some(outcome) = event else {
                    anyhow::bail!("Tick driver stopped unexpectedly");
                };
                let row = SeriesRow::from(&outcome);
                println!("{}", TableFormatter::format_tick(&row));
                received += 1;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown()?;
    let simulation = task.await.context("Tick driver task failed")?;

    let summary = RunSummary::from_simulation(&simulation, config.energy.tariff_per_kwh);
    println!("\n{}", TableFormatter::format_summary(&summary));
    Ok(())
}
