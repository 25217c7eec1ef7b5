//! `StubClassifier`: placeholder backend with no trained weights.
//!
//! Lets the full pipeline run end-to-end before a real model is wired in,
//! and gives tests a classifier with scriptable output.

use ndarray::Array4;
use tracing::debug;

use crate::classify::SpeechClassifier;
use crate::error::Result;

/// Deterministic development backend.
///
/// The default mode scores a patch by how much of its (z-scored) energy is
/// concentrated more than one standard unit above the mean: speech
/// spectrograms pile energy into narrow harmonics, flat noise does not. The
/// ratio is squashed through a logistic so the output lands in (0, 1).
pub struct StubClassifier {
    fixed: Option<f32>,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self { fixed: None }
    }

    /// Always return `probability`; handy in tests and demos.
    pub fn constant(probability: f32) -> Self {
        Self {
            fixed: Some(probability),
        }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechClassifier for StubClassifier {
    fn warm_up(&mut self) -> Result<()> {
        debug!("StubClassifier::warm_up; no-op");
        Ok(())
    }

    fn predict(&mut self, input: &Array4<f32>) -> Result<f32> {
        if let Some(p) = self.fixed {
            return Ok(p);
        }
        if input.is_empty() {
            return Ok(0.0);
        }

        let above = input.iter().filter(|v| **v > 1.0).count();
        let ratio = above as f32 / input.len() as f32;
        // Logistic centered at 10 % occupancy above one sigma.
        Ok(1.0 / (1.0 + (-(ratio - 0.1) * 40.0).exp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_mode_echoes_its_probability() {
        let mut classifier = StubClassifier::constant(0.42);
        let input = Array4::<f32>::zeros((1, 3, 2, 1));
        assert_eq!(classifier.predict(&input).unwrap(), 0.42);
    }

    #[test]
    fn output_stays_in_unit_interval() {
        let mut classifier = StubClassifier::new();
        let flat = Array4::<f32>::zeros((1, 4, 4, 1));
        let mut peaky = Array4::<f32>::zeros((1, 4, 4, 1));
        peaky[[0, 0, 0, 0]] = 5.0;
        peaky[[0, 1, 1, 0]] = 5.0;

        for input in [&flat, &peaky] {
            let p = classifier.predict(input).unwrap();
            assert!((0.0..=1.0).contains(&p), "p={p}");
        }
    }

    #[test]
    fn concentrated_energy_scores_higher_than_flat() {
        let mut classifier = StubClassifier::new();
        let flat = Array4::<f32>::zeros((1, 4, 4, 1));
        let mut peaky = Array4::<f32>::zeros((1, 4, 4, 1));
        for t in 0..4 {
            peaky[[0, t, 0, 0]] = 3.0;
        }

        let p_flat = classifier.predict(&flat).unwrap();
        let p_peaky = classifier.predict(&peaky).unwrap();
        assert!(p_peaky > p_flat, "peaky={p_peaky} flat={p_flat}");
    }

    #[test]
    fn prediction_is_deterministic() {
        let mut classifier = StubClassifier::new();
        let mut input = Array4::<f32>::zeros((1, 2, 2, 1));
        input[[0, 0, 0, 0]] = 2.0;

        let a = classifier.predict(&input).unwrap();
        let b = classifier.predict(&input).unwrap();
        assert_eq!(a, b);
    }
}
