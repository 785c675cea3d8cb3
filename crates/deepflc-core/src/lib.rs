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

//! Fuzzy inference and simulation-step engine of the Deep-FLC controller.
//!
//! # Features
//!
//! - **Membership evaluation**: triangular and shoulder shapes over 0-100
//! - **Rule base**: 81 rules generated from the four input vocabularies
//! - **Inference**: min-conjunction with weighted-centroid defuzzification
//! - **Forecasting**: smoothing predictor feeding the controller in deep mode
//! - **Simulation**: one tick advances SOC, SOH, temperature and energy drawn
//! - **Tick driver**: tokio task stepping a simulation in real time
//!
//! # Example
//!
//! ```
//! use deepflc_core::{RuleBase, Simulation};
//! use deepflc_types::MembershipDefs;
//!
//! let defs = MembershipDefs::default();
//! let rules = RuleBase::default();
//! let mut simulation = Simulation::default();
//!
//! let outcome = simulation.step(&defs, &rules);
//! assert_eq!(outcome.point.time, 1);
//! assert_eq!(outcome.point.cp, 50.0);
//! ```

pub mod driver;
pub mod forecast;
pub mod history;
pub mod inference;
pub mod membership;
pub mod rules;
pub mod simulation_engine;
pub mod state;
pub mod summary;

// Re-exports for convenience
pub use driver::{
    DriverCommand, DriverError, DriverHandle, DriverResult, DriverSnapshot, SharedMembership,
    TickDriver, shared_membership,
};
pub use forecast::{Forecaster, predict};
pub use history::BoundedHistory;
pub use inference::{FiredRule, InferenceResult, Memberships, infer};
pub use membership::{Fuzzified, evaluate_membership, fuzzify};
pub use rules::{Antecedent, Consequent, Rule, RuleBase, TermSets, generate_rule_base};
pub use simulation_engine::{Simulation, SimulationSnapshot, StepOutcome};
pub use state::{Histories, InitialConditions, SimulationState};
pub use summary::RunSummary;
