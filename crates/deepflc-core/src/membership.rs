// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Membership evaluation and fuzzification of crisp inputs.

use std::collections::BTreeMap;

use deepflc_types::{MembershipDefs, MembershipSpec, Term, Variable};

/// Degree of membership per linguistic term
pub type Fuzzified = BTreeMap<Term, f64>;

/// Degree of `x` in the triangle `(a, b, c)`.
///
/// Callers must pass `a <= b <= c`; unordered points give meaningless
/// degrees but never panic. Branch order matters for degenerate shapes:
/// `a == b` is a left shoulder even when `b == c` as well.
///
/// A non-finite `x` belongs to no term and always yields 0.
pub fn evaluate_membership(x: f64, a: f64, b: f64, c: f64) -> f64 {
    if !x.is_finite() {
        0.0
    } else if a == b {
        // Left shoulder: plateau at 1 up to a
        if x <= a {
            1.0
        } else if x >= c {
            0.0
        } else {
            (c - x) / (c - a)
        }
    } else if b == c {
        // Right shoulder: plateau at 1 from c on
        if x <= a {
            0.0
        } else if x >= c {
            1.0
        } else {
            (x - a) / (b - a)
        }
    } else if x <= a || x >= c {
        0.0
    } else if x == b {
        1.0
    } else if x < b {
        (x - a) / (b - a)
    } else {
        (c - x) / (c - b)
    }
}

/// `evaluate_membership` over a typed spec
pub fn degree(x: f64, spec: &MembershipSpec) -> f64 {
    let (a, b, c) = spec.points();
    evaluate_membership(x, a, b, c)
}

/// Fuzzify one crisp value against the current definitions of `variable`
pub fn fuzzify(variable: Variable, x: f64, defs: &MembershipDefs) -> Fuzzified {
    defs.terms(variable)
        .map(|(term, spec)| (term, degree(x, &spec)))
        .collect()
}
