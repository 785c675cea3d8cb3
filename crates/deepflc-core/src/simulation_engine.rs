// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Simulation stepper.
//!
//! One call to [`Simulation::step`] is one tick:
//! - picks the effective inputs (live values, or forecasts in deep mode)
//! - runs the fuzzy controller and applies the heuristic corrections
//! - integrates SOC, temperature and SOH
//! - records the output point, the histories and the energy drawn

use serde::{Deserialize, Serialize};

use deepflc_types::{
    CrispInputs, DeepFlcConfig, EnergyPoint, HistoryPoint, MembershipDefs, OperatingMode,
    PlantConstants,
};

use crate::forecast::Forecaster;
use crate::history::BoundedHistory;
use crate::inference::infer;
use crate::rules::RuleBase;
use crate::state::{Histories, InitialConditions, SimulationState};

const SECONDS_PER_KWH_AT_1W: f64 = 3_600_000.0;

/// Everything one tick produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub point: HistoryPoint,
    pub energy: EnergyPoint,
    /// Inputs the controller actually saw
    pub effective: CrispInputs,
}

/// Point-in-time copy of a simulation, for display and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub state: SimulationState,
    pub series: Vec<HistoryPoint>,
    pub energy: Vec<EnergyPoint>,
}

/// Single-owner battery/load simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    state: SimulationState,
    histories: Histories,
    series: BoundedHistory<HistoryPoint>,
    energy: BoundedHistory<EnergyPoint>,
    initial: InitialConditions,
    plant: PlantConstants,
    forecaster: Forecaster,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(
            InitialConditions::default(),
            PlantConstants::default(),
            Forecaster::default(),
            OperatingMode::default(),
        )
    }
}

impl Simulation {
    pub fn new(
        initial: InitialConditions,
        plant: PlantConstants,
        forecaster: Forecaster,
        mode: OperatingMode,
    ) -> Self {
        let capacity = initial.history_capacity;
        Self {
            state: initial.state(mode),
            histories: Histories::seeded(&initial),
            series: BoundedHistory::new(capacity),
            energy: BoundedHistory::new(capacity),
            initial,
            plant,
            forecaster,
        }
    }

    /// Build from a validated configuration
    pub fn from_config(config: &DeepFlcConfig) -> Self {
        Self::new(
            InitialConditions::from(&config.simulation),
            config.plant.clone(),
            Forecaster::from(&config.forecast),
            config.simulation.mode,
        )
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn histories(&self) -> &Histories {
        &self.histories
    }

    pub fn series(&self) -> &BoundedHistory<HistoryPoint> {
        &self.series
    }

    pub fn energy(&self) -> &BoundedHistory<EnergyPoint> {
        &self.energy
    }

    pub fn plant(&self) -> &PlantConstants {
        &self.plant
    }

    pub fn mode(&self) -> OperatingMode {
        self.state.mode
    }

    pub fn set_mode(&mut self, mode: OperatingMode) {
        if self.state.mode != mode {
            tracing::info!("Switching operating mode: {} -> {}", self.state.mode, mode);
            self.state.mode = mode;
        }
    }

    /// Set the live load input, clamped to 0..=100.
    ///
    /// Non-finite values are ignored and the previous load stays in effect.
    pub fn set_load(&mut self, load: f64) {
        if !load.is_finite() {
            tracing::warn!("Ignoring non-finite load {load}");
            return;
        }
        self.state.load = load.clamp(0.0, 100.0);
    }

    /// Drop all history and return to the initial conditions.
    ///
    /// The operating mode is kept; it belongs to the operator, not the plant.
    pub fn reset(&mut self) {
        let mode = self.state.mode;
        let capacity = self.initial.history_capacity;

        self.state = self.initial.state(mode);
        self.histories = Histories::seeded(&self.initial);
        self.series = BoundedHistory::new(capacity);
        self.energy = BoundedHistory::new(capacity);

        tracing::info!("Simulation reset to initial conditions");
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            state: self.state,
            series: self.series.to_vec(),
            energy: self.energy.to_vec(),
        }
    }

    /// Inputs the controller sees this tick
    pub fn effective_inputs(&self) -> CrispInputs {
        match self.state.mode {
            OperatingMode::Conventional => self.state.inputs(),
            OperatingMode::Deep => CrispInputs::new(
                self.forecaster.next_value(&self.histories.soc.to_vec()),
                self.forecaster.next_value(&self.histories.soh.to_vec()),
                self.forecaster.next_value(&self.histories.load.to_vec()),
                self.forecaster.next_value(&self.histories.temperature.to_vec()),
            ),
        }
    }

    /// Advance the simulation by one tick
    pub fn step(&mut self, defs: &MembershipDefs, rules: &RuleBase) -> StepOutcome {
        let effective = self.effective_inputs();

        let inference = infer(&effective, defs, rules);
        let (cp, gp) = apply_corrections(inference.cp, inference.gp, &effective);

        let next = self.integrate(&effective);
        let time = self.state.time + 1;

        let point = HistoryPoint {
            time,
            soc: round2(next.soc),
            soh: round2(next.soh),
            load: round2(effective.load),
            temperature: round2(next.temperature),
            cp: round2(cp),
            gp: round2(gp),
            mode: self.state.mode,
        };
        self.series.push(point);
        self.histories.record(&CrispInputs::new(
            next.soc,
            next.soh,
            effective.load,
            next.temperature,
        ));

        self.state.time = time;
        self.state.soc = next.soc;
        self.state.soh = next.soh;
        self.state.temperature = next.temperature;

        let energy = self.account_energy(time, effective.load);

        tracing::debug!(
            time,
            mode = %point.mode,
            soc = point.soc,
            soh = point.soh,
            temperature = point.temperature,
            cp = point.cp,
            gp = point.gp,
            energy_kwh = energy.cumulative_energy_kwh,
            "Tick"
        );

        StepOutcome {
            point,
            energy,
            effective,
        }
    }

    /// Step `ticks` times, returning every outcome
    pub fn run(
        &mut self,
        ticks: usize,
        defs: &MembershipDefs,
        rules: &RuleBase,
    ) -> Vec<StepOutcome> {
        (0..ticks).map(|_| self.step(defs, rules)).collect()
    }

    /// New SOC, SOH and temperature after one tick
    fn integrate(&self, effective: &CrispInputs) -> PlantUpdate {
        let plant = &self.plant;

        let battery_to_load =
            (effective.load - plant.battery_to_load_threshold).max(0.0) * plant.battery_to_load_factor;
        let delta_soc = (plant.pv_to_battery_w - battery_to_load)
            / (plant.battery_capacity_kwh * 1000.0)
            * 100.0
            * plant.charge_efficiency;

        PlantUpdate {
            soc: (self.state.soc + delta_soc).clamp(0.0, 100.0),
            temperature: (self.state.temperature + plant.thermal_coefficient * effective.load)
                .clamp(0.0, 100.0),
            soh: (self.state.soh - plant.soh_decay_per_tick).max(plant.soh_floor),
        }
    }

    /// Append this tick's energy draw to the cumulative series
    fn account_energy(&mut self, time: u64, effective_load: f64) -> EnergyPoint {
        let plant = &self.plant;

        let load_power_w = effective_load / 100.0 * plant.rated_load_w;
        let battery_to_load_w = (load_power_w - plant.load_base_w).max(0.0);
        let delta_kwh =
            (plant.grid_power_w + battery_to_load_w) * plant.tick_seconds / SECONDS_PER_KWH_AT_1W;

        let previous = self
            .energy
            .latest()
            .map_or(0.0, |point| point.cumulative_energy_kwh);

        let point = EnergyPoint {
            time,
            cumulative_energy_kwh: previous + delta_kwh,
        };
        self.energy.push(point);
        point
    }
}

struct PlantUpdate {
    soc: f64,
    soh: f64,
    temperature: f64,
}

/// Heuristic corrections on top of the fuzzy outputs, applied in order
pub fn apply_corrections(mut cp: f64, mut gp: f64, effective: &CrispInputs) -> (f64, f64) {
    // Hot battery
    if effective.temperature > 60.0 {
        cp = (cp - 10.0).max(20.0);
        gp = (gp + 10.0).min(80.0);
    }
    // Worn battery
    if effective.soh < 50.0 {
        cp = (cp - 15.0).max(15.0);
        gp = (gp + 15.0).min(85.0);
    }
    // Heavy load
    if effective.load > 80.0 {
        cp = (cp + 10.0).min(75.0);
    }
    (cp, gp)
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> (MembershipDefs, RuleBase) {
        (MembershipDefs::default(), RuleBase::default())
    }

    #[test]
    fn test_first_step_from_defaults() {
        let (defs, rules) = defaults();
        let mut sim = Simulation::default();

        let outcome = sim.step(&defs, &rules);
        let point = outcome.point;

        assert_eq!(point.time, 1);
        assert_eq!(point.cp, 50.0);
        assert_eq!(point.gp, 50.0);
        // 200 W / 16.2 kWh * 100 * 0.9 = 1.111.. %
        assert_eq!(point.soc, 51.11);
        assert!((point.soh - 99.995).abs() <= 0.005 + 1e-9);
        assert_eq!(point.load, 50.0);
        assert_eq!(point.temperature, 25.5);
        assert_eq!(point.mode, OperatingMode::Conventional);

        assert_eq!(sim.state().time, 1);
        assert!((sim.state().soc - (50.0 + 200.0 / 16200.0 * 90.0)).abs() < 1e-12);
        assert!((sim.state().soh - 99.995).abs() < 1e-12);
    }

    #[test]
    fn test_energy_of_first_tick() {
        let (defs, rules) = defaults();
        let mut sim = Simulation::default();

        let outcome = sim.step(&defs, &rules);
        // Load 50 % -> 2500 W, 1500 W from battery, plus 200 W grid
        let expected = 1700.0 / 3_600_000.0;
        assert!((outcome.energy.cumulative_energy_kwh - expected).abs() < 1e-15);
        assert_eq!(outcome.energy.time, 1);

        let second = sim.step(&defs, &rules);
        assert!((second.energy.cumulative_energy_kwh - 2.0 * expected).abs() < 1e-15);
    }

    #[test]
    fn test_load_is_not_committed() {
        let (defs, rules) = defaults();
        let mut sim = Simulation::default();
        sim.set_load(90.0);

        sim.step(&defs, &rules);
        assert_eq!(sim.state().load, 90.0);
        assert_eq!(sim.histories().load.to_vec(), vec![50.0, 90.0]);
    }

    #[test]
    fn test_set_load_clamps() {
        let mut sim = Simulation::default();
        sim.set_load(140.0);
        assert_eq!(sim.state().load, 100.0);
        sim.set_load(-3.0);
        assert_eq!(sim.state().load, 0.0);
    }

    #[test]
    fn test_set_load_ignores_non_finite() {
        let (defs, rules) = defaults();
        let mut sim = Simulation::default();
        sim.set_load(70.0);

        for load in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            sim.set_load(load);
            assert_eq!(sim.state().load, 70.0, "load = {load}");
        }

        let outcome = sim.step(&defs, &rules);
        assert_eq!(outcome.point.load, 70.0);
        assert!((0.0..=100.0).contains(&sim.state().temperature));
        assert!(outcome.energy.cumulative_energy_kwh.is_finite());
    }

    #[test]
    fn test_corrections_order_and_clamps() {
        let hot = apply_corrections(50.0, 50.0, &CrispInputs::new(50.0, 100.0, 50.0, 61.0));
        assert_eq!(hot, (40.0, 60.0));

        let hot_and_worn =
            apply_corrections(50.0, 50.0, &CrispInputs::new(50.0, 45.0, 50.0, 61.0));
        assert_eq!(hot_and_worn, (25.0, 75.0));

        // Floors and ceilings apply per correction
        let clamped = apply_corrections(25.0, 75.0, &CrispInputs::new(50.0, 45.0, 50.0, 61.0));
        assert_eq!(clamped, (15.0, 85.0));

        let heavy = apply_corrections(70.0, 30.0, &CrispInputs::new(50.0, 100.0, 85.0, 25.0));
        assert_eq!(heavy, (75.0, 30.0));

        let neutral = apply_corrections(42.0, 58.0, &CrispInputs::new(50.0, 50.0, 80.0, 60.0));
        assert_eq!(neutral, (42.0, 58.0));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(51.111), 51.11);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(2.5), 2.5);
        assert_eq!(round2(-0.125), -0.13);
    }

    #[test]
    fn test_deep_mode_uses_forecasts() {
        let (defs, rules) = defaults();
        let mut sim = Simulation::default();
        sim.set_mode(OperatingMode::Deep);
        sim.set_load(100.0);

        // Load history is [50]; the forecast is 50 whatever the live value
        let first = sim.step(&defs, &rules);
        assert_eq!(first.effective.load, 50.0);
        assert_eq!(first.point.load, 50.0);
        assert_eq!(first.point.mode, OperatingMode::Deep);

        // Recorded load is the effective one, so it stays at 50
        assert_eq!(sim.histories().load.to_vec(), vec![50.0, 50.0]);
    }

    #[test]
    fn test_deep_mode_smooths_soc_history() {
        let (defs, rules) = defaults();
        let mut sim = Simulation::default();
        sim.set_mode(OperatingMode::Deep);

        sim.step(&defs, &rules);
        let soc_history = sim.histories().soc.to_vec();
        let expected = Forecaster::default().next_value(&soc_history);

        let second = sim.step(&defs, &rules);
        assert_eq!(second.effective.soc, expected);
        assert!(second.effective.soc < soc_history[1]);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (defs, rules) = defaults();
        let mut sim = Simulation::default();
        sim.set_load(75.0);
        sim.run(25, &defs, &rules);

        sim.reset();

        assert_eq!(*sim.state(), SimulationState::default());
        assert!(sim.series().is_empty());
        assert!(sim.energy().is_empty());
        assert_eq!(sim.histories().soc.to_vec(), vec![50.0]);
        assert_eq!(sim.histories().load.to_vec(), vec![50.0]);
    }

    #[test]
    fn test_reset_keeps_mode() {
        let mut sim = Simulation::default();
        sim.set_mode(OperatingMode::Deep);
        sim.reset();
        assert_eq!(sim.mode(), OperatingMode::Deep);
    }

    #[test]
    fn test_from_config() {
        let mut config = DeepFlcConfig::default();
        config.simulation.initial_soc = 20.0;
        config.simulation.history_capacity = 8;
        config.simulation.mode = OperatingMode::Deep;

        let sim = Simulation::from_config(&config);
        assert_eq!(sim.state().soc, 20.0);
        assert_eq!(sim.mode(), OperatingMode::Deep);
        assert_eq!(sim.series().capacity(), 8);
        assert_eq!(sim.histories().temperature.capacity(), 8);
    }
}
