// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Smoothing forecaster used by deep mode.
//!
//! The newest sample seeds the estimate and older samples are blended in
//! walking backwards, each with the same weight `alpha`. This is not a forward
//! EMA: the oldest sample ends up with the largest single weight. Downstream
//! series depend on these exact values, so the order is kept as is.

use serde::{Deserialize, Serialize};

use deepflc_types::ForecastSettings;

/// Smoothing factor of the default forecaster
pub const DEFAULT_ALPHA: f64 = 0.2;
/// Prediction for an empty history
pub const DEFAULT_FALLBACK: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecaster {
    alpha: f64,
    fallback: f64,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            fallback: DEFAULT_FALLBACK,
        }
    }
}

impl From<&ForecastSettings> for Forecaster {
    fn from(settings: &ForecastSettings) -> Self {
        Self::new(settings.alpha, settings.fallback)
    }
}

impl Forecaster {
    pub fn new(alpha: f64, fallback: f64) -> Self {
        Self { alpha, fallback }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smoothed estimate of the next value, clamped to 0..=100
    pub fn next_value(&self, history: &[f64]) -> f64 {
        let Some((&newest, older)) = history.split_last() else {
            return self.fallback;
        };

        let smoothed = older
            .iter()
            .rev()
            .fold(newest, |last, &value| self.alpha * value + (1.0 - self.alpha) * last);

        smoothed.clamp(0.0, 100.0)
    }

    /// Prediction for each of `horizon` steps; every step repeats the same value
    pub fn predict(&self, history: &[f64], horizon: usize) -> Vec<f64> {
        vec![self.next_value(history); horizon]
    }
}

/// Predict with the default forecaster
pub fn predict(history: &[f64], horizon: usize) -> Vec<f64> {
    Forecaster::default().predict(history, horizon)
}
