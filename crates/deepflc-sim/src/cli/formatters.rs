// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Output formatters for CLI simulation results.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use serde::Serialize;

use deepflc_core::{
    FiredRule, InferenceResult, Rule, RuleBase, RunSummary, Simulation, StepOutcome,
};
use deepflc_types::{CrispInputs, EnergyPoint, HistoryPoint, OperatingMode, Variable};

/// Formatter for pretty tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for CSV export
#[derive(Debug)]
pub struct CsvFormatter;

/// Formatter for JSON export
#[derive(Debug)]
pub struct JsonFormatter;

/// One exported tick: the output point joined with the energy drawn so far
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub time: u64,
    pub mode: OperatingMode,
    pub soc: f64,
    pub soh: f64,
    pub load: f64,
    pub temperature: f64,
    pub cp: f64,
    pub gp: f64,
    pub cumulative_energy_kwh: f64,
}

impl SeriesRow {
    pub fn new(point: &HistoryPoint, energy: &EnergyPoint) -> Self {
        Self {
            time: point.time,
            mode: point.mode,
            soc: point.soc,
            soh: point.soh,
            load: point.load,
            temperature: point.temperature,
            cp: point.cp,
            gp: point.gp,
            cumulative_energy_kwh: energy.cumulative_energy_kwh,
        }
    }
}

impl From<&StepOutcome> for SeriesRow {
    fn from(outcome: &StepOutcome) -> Self {
        Self::new(&outcome.point, &outcome.energy)
    }
}

/// Rows of the retained series, oldest first
pub fn series_rows(simulation: &Simulation) -> Vec<SeriesRow> {
    simulation
        .series()
        .iter()
        .zip(simulation.energy().iter())
        .map(|(point, energy)| SeriesRow::new(point, energy))
        .collect()
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

impl TableFormatter {
    /// Last `tail` ticks followed by the run summary
    pub fn format_run(rows: &[SeriesRow], summary: &RunSummary, tail: usize) -> String {
        let mut output = String::new();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&[
            "Tick",
            "Mode",
            "SOC\n(%)",
            "SOH\n(%)",
            "Load\n(%)",
            "Temp",
            "CP\n(%)",
            "GP\n(%)",
            "Energy\n(kWh)",
        ]));

        for row in &rows[rows.len().saturating_sub(tail)..] {
            table.add_row(vec![
                Cell::new(row.time),
                Cell::new(row.mode),
                Cell::new(format!("{:.2}", row.soc)),
                Cell::new(format!("{:.2}", row.soh)),
                Cell::new(format!("{:.2}", row.load)),
                Cell::new(format!("{:.2}", row.temperature)),
                Cell::new(format!("{:.2}", row.cp)),
                Cell::new(format!("{:.2}", row.gp)),
                Cell::new(format!("{:.6}", row.cumulative_energy_kwh)),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&Self::format_summary(summary));
        output
    }

    pub fn format_summary(summary: &RunSummary) -> String {
        let state = &summary.final_state;
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Simulation complete: {} ticks ({} mode), {} points retained",
            state.time, state.mode, summary.points
        );
        let _ = writeln!(
            output,
            "Final state: SOC {:.2}% | SOH {:.2}% | Load {:.2}% | Temp {:.2}",
            state.soc, state.soh, state.load, state.temperature
        );
        if let (Some(min), Some(max)) = (summary.min_temperature, summary.max_temperature) {
            let _ = writeln!(output, "Temperature range: {min:.2} - {max:.2}");
        }
        if let (Some(cp), Some(gp)) = (summary.mean_cp, summary.mean_gp) {
            let _ = writeln!(output, "Mean CP: {cp:.2}% | Mean GP: {gp:.2}%");
        }
        let _ = writeln!(
            output,
            "Energy: {:.6} kWh | Cost: {:.6} at {:.2}/kWh",
            summary.total_energy_kwh, summary.energy_cost, summary.tariff_per_kwh
        );

        output
    }

    /// Memberships, crisp outputs and the strongest fired rules
    pub fn format_inference(
        inputs: &CrispInputs,
        result: &InferenceResult,
        rules: &RuleBase,
        top: usize,
    ) -> String {
        let mut output = String::new();

        let mut memberships = Table::new();
        memberships.load_preset(UTF8_FULL);
        memberships.set_header(header(&["Variable", "Input", "Term", "Degree"]));
        for variable in Variable::ALL {
            for (term, degree) in result.memberships.get(variable) {
                let degree_cell = if *degree > 0.0 {
                    Cell::new(format!("{degree:.4}")).fg(Color::Green)
                } else {
                    Cell::new(format!("{degree:.4}"))
                };
                memberships.add_row(vec![
                    Cell::new(variable),
                    Cell::new(format!("{:.2}", inputs.get(variable))),
                    Cell::new(term),
                    degree_cell,
                ]);
            }
        }
        output.push_str(&memberships.to_string());
        output.push('\n');

        let _ = writeln!(
            output,
            "CP: {:.2}% | GP: {:.2}% | {} of {} rules fired",
            result.cp,
            result.gp,
            result.fired.len(),
            rules.len()
        );

        let strongest = result.strongest(top);
        if !strongest.is_empty() {
            output.push_str(&Self::format_rules(
                strongest
                    .iter()
                    .filter_map(|fired| rules.get(fired.id).map(|rule| (rule, Some(*fired)))),
            ));
        }

        output
    }

    /// Rule table, with a strength column when any rule carries one
    pub fn format_rules<'a>(
        rules: impl IntoIterator<Item = (&'a Rule, Option<FiredRule>)>,
    ) -> String {
        let rows: Vec<_> = rules.into_iter().collect();
        let with_strength = rows.iter().any(|(_, fired)| fired.is_some());

        let mut names = vec!["Id", "SOC", "SOH", "Load", "Temp", "CP", "GP"];
        if with_strength {
            names.push("Strength");
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&names));

        for (rule, fired) in rows {
            let mut cells = vec![
                Cell::new(rule.id),
                Cell::new(rule.antecedent.soc),
                Cell::new(rule.antecedent.soh),
                Cell::new(rule.antecedent.load),
                Cell::new(rule.antecedent.temperature),
                Cell::new(rule.consequent.cp),
                Cell::new(rule.consequent.gp),
            ];
            if with_strength {
                cells.push(Cell::new(
                    fired.map_or_else(String::new, |f| format!("{:.4}", f.strength)),
                ));
            }
            table.add_row(cells);
        }

        let mut output = table.to_string();
        output.push('\n');
        output
    }

    /// One line per live tick
    pub fn format_tick(row: &SeriesRow) -> String {
        format!(
            "[{:>5}] {:<12} SOC {:>6.2}% | SOH {:>6.2}% | Load {:>6.2}% | Temp {:>6.2} | CP {:>5.2}% | GP {:>5.2}% | {:.6} kWh",
            row.time,
            row.mode.to_string(),
            row.soc,
            row.soh,
            row.load,
            row.temperature,
            row.cp,
            row.gp,
            row.cumulative_energy_kwh
        )
    }
}

impl CsvFormatter {
    /// Write the series as CSV with a header row
    pub fn write_series<W: io::Write>(writer: W, rows: &[SeriesRow]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn write_series_to_path(path: &Path, rows: &[SeriesRow]) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        Self::write_series(file, rows)
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))
    }
}

/// Full batch result for JSON export
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub summary: &'a RunSummary,
    pub series: &'a [SeriesRow],
}

impl JsonFormatter {
    pub fn format_run(summary: &RunSummary, rows: &[SeriesRow]) -> Result<String> {
        let report = RunReport {
            summary,
            series: rows,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepflc_core::infer;
    use deepflc_types::MembershipDefs;

    fn simulated(ticks: usize) -> Simulation {
        let mut sim = Simulation::default();
        sim.run(ticks, &MembershipDefs::default(), &RuleBase::default());
        sim
    }

    #[test]
    fn test_series_rows_join_energy() {
        let sim = simulated(3);
        let rows = series_rows(&sim);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].time, 1);
        assert_eq!(rows[2].time, 3);
        assert!(rows[2].cumulative_energy_kwh > rows[0].cumulative_energy_kwh);
    }

    #[test]
    fn test_csv_export() {
        let sim = simulated(2);
        let rows = series_rows(&sim);

        let mut buffer = Vec::new();
        CsvFormatter::write_series(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "time,mode,soc,soh,load,temperature,cp,gp,cumulative_energy_kwh"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,conventional,51.11,"));
    }

    #[test]
    fn test_json_export() {
        let sim = simulated(4);
        let rows = series_rows(&sim);
        let summary = RunSummary::from_simulation(&sim, 0.25);

        let json = JsonFormatter::format_run(&summary, &rows).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["series"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["summary"]["final_state"]["time"], 4);
        assert_eq!(value["series"][0]["mode"], "conventional");
    }

    #[test]
    fn test_table_tail() {
        let sim = simulated(30);
        let rows = series_rows(&sim);
        let summary = RunSummary::from_simulation(&sim, 0.25);

        let output = TableFormatter::format_run(&rows, &summary, 5);
        assert!(output.contains("Simulation complete: 30 ticks"));
        assert!(output.contains("│ 30 "));
        assert!(!output.contains("│ 25 "));
    }

    #[test]
    fn test_inference_table_lists_fired_rules() {
        let rules = RuleBase::default();
        let inputs = CrispInputs::new(50.0, 100.0, 50.0, 25.0);
        let result = infer(&inputs, &MembershipDefs::default(), &rules);

        let output = TableFormatter::format_inference(&inputs, &result, &rules, 10);
        assert!(output.contains("CP: 50.00% | GP: 50.00% | 1 of 81 rules fired"));
        assert!(output.contains("Strength"));
        assert!(output.contains("0.5000"));
    }

    #[test]
    fn test_rules_table_without_strength() {
        let rules = RuleBase::default();
        let output = TableFormatter::format_rules(rules.iter().map(|rule| (rule, None)));

        assert!(!output.contains("Strength"));
        assert!(output.contains("│ 81 "));
    }
}
