// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Membership function definitions.
//!
//! A membership function is a triangle (or shoulder) described by three
//! control points `a <= b <= c` on the 0-100 domain. `a == b` describes a
//! left shoulder, `b == c` a right shoulder. The ordering is checked when a
//! spec is built, so a `MembershipSpec` value is always well formed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::terms::{Term, Variable};

/// Triangular membership shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMembershipSpec")]
pub struct MembershipSpec {
    a: f64,
    b: f64,
    c: f64,
}

#[derive(Deserialize)]
struct RawMembershipSpec {
    a: f64,
    b: f64,
    c: f64,
}

impl TryFrom<RawMembershipSpec> for MembershipSpec {
    type Error = ConfigError;

    fn try_from(raw: RawMembershipSpec) -> ConfigResult<Self> {
        Self::new(raw.a, raw.b, raw.c)
    }
}

impl MembershipSpec {
    /// Build a spec, rejecting non-finite or unordered control points
    pub fn new(a: f64, b: f64, c: f64) -> ConfigResult<Self> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(ConfigError::NonFiniteMembership { a, b, c });
        }
        if a > b || b > c {
            return Err(ConfigError::InvalidMembership { a, b, c });
        }
        Ok(Self { a, b, c })
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    /// Control points as `(a, b, c)`
    pub fn points(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }

    pub fn is_left_shoulder(&self) -> bool {
        self.a == self.b
    }

    pub fn is_right_shoulder(&self) -> bool {
        self.a != self.b && self.b == self.c
    }
}

/// Membership definitions of all input variables, keyed variable -> term -> shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipDefs(BTreeMap<Variable, BTreeMap<Term, MembershipSpec>>);

// Compile-time constant shapes; all satisfy a <= b <= c.
const DEFAULT_SHAPES: [(Variable, Term, f64, f64, f64); 12] = [
    (Variable::Soc, Term::Low, 0.0, 0.0, 50.0),
    (Variable::Soc, Term::Medium, 25.0, 50.0, 75.0),
    (Variable::Soc, Term::High, 50.0, 100.0, 100.0),
    (Variable::Soh, Term::Degraded, 40.0, 40.0, 70.0),
    (Variable::Soh, Term::Normal, 60.0, 75.0, 90.0),
    (Variable::Soh, Term::Good, 80.0, 100.0, 100.0),
    (Variable::Load, Term::Low, 0.0, 0.0, 40.0),
    (Variable::Load, Term::Medium, 20.0, 50.0, 80.0),
    (Variable::Load, Term::High, 60.0, 100.0, 100.0),
    (Variable::Temperature, Term::Low, 0.0, 0.0, 25.0),
    (Variable::Temperature, Term::Normal, 15.0, 35.0, 55.0),
    (Variable::Temperature, Term::High, 45.0, 100.0, 100.0),
];

impl Default for MembershipDefs {
    fn default() -> Self {
        let mut defs = BTreeMap::new();
        for (variable, term, a, b, c) in DEFAULT_SHAPES {
            defs.entry(variable)
                .or_insert_with(BTreeMap::new)
                .insert(term, MembershipSpec { a, b, c });
        }
        Self(defs)
    }
}

impl MembershipDefs {
    /// Definitions with no terms at all; every degree evaluates to zero
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, variable: Variable, term: Term) -> Option<MembershipSpec> {
        self.0.get(&variable).and_then(|terms| terms.get(&term)).copied()
    }

    /// Terms defined for a variable, in term order
    pub fn terms(&self, variable: Variable) -> impl Iterator<Item = (Term, MembershipSpec)> + '_ {
        self.0
            .get(&variable)
            .into_iter()
            .flat_map(|terms| terms.iter().map(|(term, spec)| (*term, *spec)))
    }

    /// Replace the shape of one term.
    ///
    /// Only terms from the variable's vocabulary are accepted; the returned
    /// value is the previous shape, if any.
    pub fn set(
        &mut self,
        variable: Variable,
        term: Term,
        spec: MembershipSpec,
    ) -> ConfigResult<Option<MembershipSpec>> {
        if !Term::defaults_for(variable).contains(&term) {
            return Err(ConfigError::UnknownTerm { variable, term });
        }
        Ok(self.0.entry(variable).or_default().insert(term, spec))
    }

    /// Validated edit from raw control points
    pub fn set_points(
        &mut self,
        variable: Variable,
        term: Term,
        (a, b, c): (f64, f64, f64),
    ) -> ConfigResult<Option<MembershipSpec>> {
        self.set(variable, term, MembershipSpec::new(a, b, c)?)
    }

    /// Apply every override on top of these definitions
    pub fn apply(&mut self, overrides: &MembershipDefs) -> ConfigResult<()> {
        for (variable, terms) in &overrides.0 {
            for (term, spec) in terms {
                self.set(*variable, *term, *spec)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}
