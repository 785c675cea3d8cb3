// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Linguistic variables and their terms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input variable of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    /// State of charge (%)
    Soc,
    /// State of health (%)
    Soh,
    /// Household load (%)
    Load,
    /// Battery temperature (scaled 0-100)
    Temperature,
}

impl Variable {
    /// All input variables in rule nesting order
    pub const ALL: [Variable; 4] = [
        Variable::Soc,
        Variable::Soh,
        Variable::Load,
        Variable::Temperature,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Soc => "SOC",
            Self::Soh => "SOH",
            Self::Load => "Load",
            Self::Temperature => "Temperature",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Linguistic term of an input variable.
///
/// The term vocabulary is shared by all inputs; each variable uses its own
/// subset (see `Term::defaults_for`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Low,
    Medium,
    High,
    Degraded,
    Normal,
    Good,
}

impl Term {
    pub const SOC_TERMS: [Term; 3] = [Term::Low, Term::Medium, Term::High];
    pub const SOH_TERMS: [Term; 3] = [Term::Degraded, Term::Normal, Term::Good];
    pub const LOAD_TERMS: [Term; 3] = [Term::Low, Term::Medium, Term::High];
    pub const TEMPERATURE_TERMS: [Term; 3] = [Term::Low, Term::Normal, Term::High];

    /// Default ordered term list of a variable
    pub fn defaults_for(variable: Variable) -> &'static [Term] {
        match variable {
            Variable::Soc => &Self::SOC_TERMS,
            Variable::Soh => &Self::SOH_TERMS,
            Variable::Load => &Self::LOAD_TERMS,
            Variable::Temperature => &Self::TEMPERATURE_TERMS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Degraded => "Degraded",
            Self::Normal => "Normal",
            Self::Good => "Good",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output class of the CP and GP control signals, ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTerm {
    Low,
    Medium,
    High,
}

impl OutputTerm {
    /// Representative value used by centroid defuzzification
    pub fn centroid(self) -> f64 {
        match self {
            Self::Low => 25.0,
            Self::Medium => 50.0,
            Self::High => 75.0,
        }
    }

    /// One step down the scale, saturating at `Low`
    #[must_use]
    pub fn step_down(self) -> Self {
        match self {
            Self::Low | Self::Medium => Self::Low,
            Self::High => Self::Medium,
        }
    }

    /// One step up the scale, saturating at `High`
    #[must_use]
    pub fn step_up(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for OutputTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
