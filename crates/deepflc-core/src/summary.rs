// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Aggregates over a finished (or paused) run.

use serde::{Deserialize, Serialize};

use deepflc_types::HistoryPoint;

use crate::simulation_engine::Simulation;
use crate::state::SimulationState;

/// Headline figures of a run, computed over the retained output series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub final_state: SimulationState,
    /// Points the aggregates were computed over
    pub points: usize,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub mean_cp: Option<f64>,
    pub mean_gp: Option<f64>,
    pub total_energy_kwh: f64,
    pub tariff_per_kwh: f64,
    pub energy_cost: f64,
}

impl RunSummary {
    pub fn from_simulation(simulation: &Simulation, tariff_per_kwh: f64) -> Self {
        let series: Vec<HistoryPoint> = simulation.series().to_vec();
        let total_energy_kwh = simulation
            .energy()
            .latest()
            .map_or(0.0, |point| point.cumulative_energy_kwh);

        let min_temperature = series
            .iter()
            .map(|point| point.temperature)
            .reduce(f64::min);
        let max_temperature = series
            .iter()
            .map(|point| point.temperature)
            .reduce(f64::max);

        Self {
            final_state: *simulation.state(),
            points: series.len(),
            min_temperature,
            max_temperature,
            mean_cp: mean(series.iter().map(|point| point.cp)),
            mean_gp: mean(series.iter().map(|point| point.gp)),
            total_energy_kwh,
            tariff_per_kwh,
            energy_cost: total_energy_kwh * tariff_per_kwh,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
