// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Rule base generation.
//!
//! The rule base is the cartesian product of the four term lists, nested
//! SOC -> SOH -> Load -> Temperature. Ids are 1-based in generation order and
//! are stable for a given set of term lists.
//!
//! Consequents are derived rather than stored: SOC picks a baseline
//! (Low -> CP Low / GP High, Medium -> Medium / Medium, High -> High / Low) and
//! each of SOH=Degraded, Load=High, Temperature=High then moves CP one step
//! down and GP one step up, saturating at the ends of the scale.

use serde::{Deserialize, Serialize};

use deepflc_types::{OutputTerm, Term, Variable};

/// Ordered term lists used to enumerate the rule base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSets {
    pub soc: Vec<Term>,
    pub soh: Vec<Term>,
    pub load: Vec<Term>,
    pub temperature: Vec<Term>,
}

impl Default for TermSets {
    fn default() -> Self {
        Self {
            soc: Term::defaults_for(Variable::Soc).to_vec(),
            soh: Term::defaults_for(Variable::Soh).to_vec(),
            load: Term::defaults_for(Variable::Load).to_vec(),
            temperature: Term::defaults_for(Variable::Temperature).to_vec(),
        }
    }
}

impl TermSets {
    /// Number of rules the product produces
    pub fn rule_count(&self) -> usize {
        self.soc.len() * self.soh.len() * self.load.len() * self.temperature.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Antecedent {
    pub soc: Term,
    pub soh: Term,
    pub load: Term,
    pub temperature: Term,
}

impl Antecedent {
    pub fn term(&self, variable: Variable) -> Term {
        match variable {
            Variable::Soc => self.soc,
            Variable::Soh => self.soh,
            Variable::Load => self.load,
            Variable::Temperature => self.temperature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Consequent {
    /// Charge power class
    pub cp: OutputTerm,
    /// Generation power class
    pub gp: OutputTerm,
}

impl Consequent {
    /// Baseline consequent chosen from the SOC term alone
    fn baseline(soc: Term) -> Self {
        match soc {
            Term::Low => Self {
                cp: OutputTerm::Low,
                gp: OutputTerm::High,
            },
            Term::High => Self {
                cp: OutputTerm::High,
                gp: OutputTerm::Low,
            },
            _ => Self {
                cp: OutputTerm::Medium,
                gp: OutputTerm::Medium,
            },
        }
    }

    /// Less charging, more generation
    #[must_use]
    fn step_down(self) -> Self {
        Self {
            cp: self.cp.step_down(),
            gp: self.gp.step_up(),
        }
    }

    /// Derive the consequent of an antecedent
    pub fn derive(antecedent: &Antecedent) -> Self {
        let mut consequent = Self::baseline(antecedent.soc);

        // Applied cumulatively, in this order
        let adjustments = [
            antecedent.soh == Term::Degraded,
            antecedent.load == Term::High,
            antecedent.temperature == Term::High,
        ];
        for triggered in adjustments {
            if triggered {
                consequent = consequent.step_down();
            }
        }

        consequent
    }
}

/// One fuzzy rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub id: u32,
    pub antecedent: Antecedent,
    pub consequent: Consequent,
}

/// Ordered, immutable rule base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBase(Vec<Rule>);

impl Default for RuleBase {
    fn default() -> Self {
        generate_rule_base(&TermSets::default())
    }
}

impl RuleBase {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    /// Look up a rule by its 1-based id
    pub fn get(&self, id: u32) -> Option<&Rule> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.0.get(index).filter(|rule| rule.id == id)
    }
}

impl<'a> IntoIterator for &'a RuleBase {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Enumerate the rule base for the given term lists
pub fn generate_rule_base(term_sets: &TermSets) -> RuleBase {
    let mut rules = Vec::with_capacity(term_sets.rule_count());
    let mut next_id = 1u32;

    for &soc in &term_sets.soc {
        for &soh in &term_sets.soh {
            for &load in &term_sets.load {
                for &temperature in &term_sets.temperature {
                    let antecedent = Antecedent {
                        soc,
                        soh,
                        load,
                        temperature,
                    };
                    rules.push(Rule {
                        id: next_id,
                        antecedent,
                        consequent: Consequent::derive(&antecedent),
                    });
                    next_id += 1;
                }
            }
        }
    }

    tracing::debug!("Generated rule base with {} rules", rules.len());
    RuleBase(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn antecedent(soc: Term, soh: Term, load: Term, temperature: Term) -> Antecedent {
        Antecedent {
            soc,
            soh,
            load,
            temperature,
        }
    }

    #[test]
    fn test_rule_count_and_ids() {
        let rules = RuleBase::default();

        assert_eq!(rules.len(), 81);
        for (index, rule) in rules.iter().enumerate() {
            assert_eq!(rule.id as usize, index + 1);
        }
    }

    #[test]
    fn test_first_rule() {
        let rules = RuleBase::default();
        let first = rules.get(1).unwrap();

        assert_eq!(
            first.antecedent,
            antecedent(Term::Low, Term::Degraded, Term::Low, Term::Low)
        );
        assert_eq!(first.consequent.cp, OutputTerm::Low);
        assert_eq!(first.consequent.gp, OutputTerm::High);
    }

    #[test]
    fn test_enumeration_order() {
        let rules = RuleBase::default();

        // Temperature varies fastest, SOC slowest
        assert_eq!(rules.get(2).unwrap().antecedent.temperature, Term::Normal);
        assert_eq!(rules.get(4).unwrap().antecedent.load, Term::Medium);
        assert_eq!(rules.get(10).unwrap().antecedent.soh, Term::Normal);
        assert_eq!(rules.get(28).unwrap().antecedent.soc, Term::Medium);
        assert_eq!(
            rules.get(81).unwrap().antecedent,
            antecedent(Term::High, Term::Good, Term::High, Term::High)
        );
    }

    #[test]
    fn test_adjustments_are_cumulative() {
        // High SOC, all three triggers: High/Low -> Medium/Medium -> Low/High -> Low/High
        let all = Consequent::derive(&antecedent(
            Term::High,
            Term::Degraded,
            Term::High,
            Term::High,
        ));
        assert_eq!(all.cp, OutputTerm::Low);
        assert_eq!(all.gp, OutputTerm::High);

        // High SOC, only high load: one step
        let one = Consequent::derive(&antecedent(Term::High, Term::Good, Term::High, Term::Low));
        assert_eq!(one.cp, OutputTerm::Medium);
        assert_eq!(one.gp, OutputTerm::Medium);

        // Medium SOC, untouched
        let none = Consequent::derive(&antecedent(
            Term::Medium,
            Term::Normal,
            Term::Medium,
            Term::Normal,
        ));
        assert_eq!(none.cp, OutputTerm::Medium);
        assert_eq!(none.gp, OutputTerm::Medium);
    }

    #[test]
    fn test_get_out_of_range() {
        let rules = RuleBase::default();
        assert!(rules.get(0).is_none());
        assert!(rules.get(82).is_none());
    }

    #[test]
    fn test_custom_term_sets() {
        let sets = TermSets {
            soc: vec![Term::Low, Term::High],
            soh: vec![Term::Good],
            load: vec![Term::Medium],
            temperature: vec![Term::Normal, Term::High],
        };
        let rules = generate_rule_base(&sets);

        assert_eq!(rules.len(), sets.rule_count());
        assert_eq!(rules.len(), 4);
        assert_eq!(rules.get(4).unwrap().consequent.cp, OutputTerm::Medium);
    }
}
