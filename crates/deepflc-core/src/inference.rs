// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Mamdani-style inference with weighted-centroid defuzzification.

use serde::{Deserialize, Serialize};

use deepflc_types::{CrispInputs, MembershipDefs, Term, Variable};

use crate::membership::{Fuzzified, fuzzify};
use crate::rules::RuleBase;

/// Output used when no rule fires
pub const DEFAULT_OUTPUT: f64 = 50.0;

/// Fuzzified view of all four inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memberships {
    pub soc: Fuzzified,
    pub soh: Fuzzified,
    pub load: Fuzzified,
    pub temperature: Fuzzified,
}

impl Memberships {
    pub fn of(inputs: &CrispInputs, defs: &MembershipDefs) -> Self {
        Self {
            soc: fuzzify(Variable::Soc, inputs.soc, defs),
            soh: fuzzify(Variable::Soh, inputs.soh, defs),
            load: fuzzify(Variable::Load, inputs.load, defs),
            temperature: fuzzify(Variable::Temperature, inputs.temperature, defs),
        }
    }

    pub fn get(&self, variable: Variable) -> &Fuzzified {
        match variable {
            Variable::Soc => &self.soc,
            Variable::Soh => &self.soh,
            Variable::Load => &self.load,
            Variable::Temperature => &self.temperature,
        }
    }

    /// Degree of a term, zero when the term is not defined
    pub fn degree(&self, variable: Variable, term: Term) -> f64 {
        self.get(variable).get(&term).copied().unwrap_or(0.0)
    }
}

/// A rule with positive firing strength
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiredRule {
    pub id: u32,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Charge power (%)
    pub cp: f64,
    /// Generation power (%)
    pub gp: f64,
    pub memberships: Memberships,
    /// Fired rules in rule-base order
    pub fired: Vec<FiredRule>,
}

impl InferenceResult {
    /// Fired rules sorted by strength, strongest first
    pub fn strongest(&self, limit: usize) -> Vec<FiredRule> {
        let mut fired = self.fired.clone();
        fired.sort_by(|a, b| b.strength.total_cmp(&a.strength).then(a.id.cmp(&b.id)));
        fired.truncate(limit);
        fired
    }
}

#[derive(Default)]
struct WeightedSum {
    numerator: f64,
    weight: f64,
}

impl WeightedSum {
    fn add(&mut self, strength: f64, centroid: f64) {
        self.numerator += strength * centroid;
        self.weight += strength;
    }

    fn value(&self) -> f64 {
        if self.weight == 0.0 {
            DEFAULT_OUTPUT
        } else {
            self.numerator / self.weight
        }
    }
}

/// Run the rule base against crisp inputs.
///
/// Pure: the result depends only on the arguments, and the definitions are
/// read on every call.
pub fn infer(inputs: &CrispInputs, defs: &MembershipDefs, rules: &RuleBase) -> InferenceResult {
    let memberships = Memberships::of(inputs, defs);
    let mut cp = WeightedSum::default();
    let mut gp = WeightedSum::default();
    let mut fired = Vec::new();

    for rule in rules {
        let strength = Variable::ALL
            .iter()
            .map(|&variable| memberships.degree(variable, rule.antecedent.term(variable)))
            .fold(f64::INFINITY, f64::min);

        // Also rejects NaN
        if !(strength > 0.0) {
            continue;
        }

        cp.add(strength, rule.consequent.cp.centroid());
        gp.add(strength, rule.consequent.gp.centroid());
        fired.push(FiredRule {
            id: rule.id,
            strength,
        });
    }

    if fired.is_empty() {
        tracing::debug!(
            soc = inputs.soc,
            soh = inputs.soh,
            load = inputs.load,
            temperature = inputs.temperature,
            "No rule fired, using default outputs"
        );
    }

    InferenceResult {
        cp: cp.value(),
        gp: gp.value(),
        memberships,
        fired,
    }
}
