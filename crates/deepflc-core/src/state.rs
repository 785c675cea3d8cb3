// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Simulation state management.
//!
//! This module defines the state the stepper owns: the current plant
//! values, the per-variable history buffers the forecaster reads, and the
//! initial conditions a reset returns to.

use serde::{Deserialize, Serialize};

use deepflc_types::{CrispInputs, OperatingMode, SimulationSettings, Variable};

use crate::history::{BoundedHistory, DEFAULT_CAPACITY};

/// Current plant state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Completed ticks
    pub time: u64,

    /// State of charge (0-100 %)
    pub soc: f64,

    /// State of health (floor-100 %)
    pub soh: f64,

    /// Live load input (0-100 %). Read by the stepper, never written by it.
    pub load: f64,

    /// Temperature (0-100)
    pub temperature: f64,

    pub mode: OperatingMode,
}

impl Default for SimulationState {
    fn default() -> Self {
        InitialConditions::default().state(OperatingMode::default())
    }
}

impl SimulationState {
    /// Raw inputs as seen in conventional mode
    pub fn inputs(&self) -> CrispInputs {
        CrispInputs::new(self.soc, self.soh, self.load, self.temperature)
    }
}

/// Values the simulation starts from and returns to on reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub soc: f64,
    pub soh: f64,
    pub load: f64,
    pub temperature: f64,
    pub history_capacity: usize,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            soc: 50.0,
            soh: 100.0,
            load: 50.0,
            temperature: 25.0,
            history_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&SimulationSettings> for InitialConditions {
    fn from(settings: &SimulationSettings) -> Self {
        Self {
            soc: settings.initial_soc,
            soh: settings.initial_soh,
            load: settings.load,
            temperature: settings.initial_temperature,
            history_capacity: settings.history_capacity,
        }
    }
}

impl InitialConditions {
    pub fn state(&self, mode: OperatingMode) -> SimulationState {
        SimulationState {
            time: 0,
            soc: self.soc,
            soh: self.soh,
            load: self.load,
            temperature: self.temperature,
            mode,
        }
    }
}

/// Recent values of every input variable, oldest first
#[derive(Debug, Clone)]
pub struct Histories {
    pub soc: BoundedHistory<f64>,
    pub soh: BoundedHistory<f64>,
    pub load: BoundedHistory<f64>,
    pub temperature: BoundedHistory<f64>,
}

impl Histories {
    /// Each buffer seeded with its initial value
    pub fn seeded(initial: &InitialConditions) -> Self {
        let capacity = initial.history_capacity;
        Self {
            soc: BoundedHistory::seeded(capacity, initial.soc),
            soh: BoundedHistory::seeded(capacity, initial.soh),
            load: BoundedHistory::seeded(capacity, initial.load),
            temperature: BoundedHistory::seeded(capacity, initial.temperature),
        }
    }

    pub fn get(&self, variable: Variable) -> &BoundedHistory<f64> {
        match variable {
            Variable::Soc => &self.soc,
            Variable::Soh => &self.soh,
            Variable::Load => &self.load,
            Variable::Temperature => &self.temperature,
        }
    }

    /// Append one sample per variable
    pub fn record(&mut self, sample: &CrispInputs) {
        self.soc.push(sample.soc);
        self.soh.push(sample.soh);
        self.load.push(sample.load);
        self.temperature.push(sample.temperature);
    }
}
