//! Turns independent normal draws into correlated shocks.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::types::correlation::CorrelationMatrix;

/// How independent draws are mixed into correlated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrelationMethod {
    /// `out[i] = sum_j m[i][j] * z[j]`. Correlated in direction only; the
    /// resulting covariance is `M * M^T`, not `M`.
    #[default]
    RowWeighted,
    /// `out = L * z` with `L` the Cholesky factor of `M`, which reproduces `M`
    /// exactly in expectation.
    Cholesky,
}

/// Row-weighted correlation of `draws` by `matrix`.
pub fn correlate(draws: &[f64], matrix: &CorrelationMatrix) -> Result<Vec<f64>> {
    if draws.len() != matrix.dim() {
        return Err(SimulationError::config(format!(
            "{} draws for a {}x{} correlation matrix",
            draws.len(),
            matrix.dim(),
            matrix.dim()
        )));
    }
    Ok(matrix.rows().iter().map(|row| dot(row, draws)).collect())
}

/// Precomputed mixing weights for one method.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    method: CorrelationMethod,
    weights: Vec<Vec<f64>>,
}

impl CorrelationEngine {
    pub fn new(matrix: &CorrelationMatrix, method: CorrelationMethod) -> Result<Self> {
        let weights = match method {
            CorrelationMethod::RowWeighted => matrix.rows().to_vec(),
            CorrelationMethod::Cholesky => matrix.cholesky()?,
        };
        Ok(Self { method, weights })
    }

    pub fn method(&self) -> CorrelationMethod {
        self.method
    }

    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    pub fn correlate(&self, draws: &[f64]) -> Result<Vec<f64>> {
        if draws.len() != self.dim() {
            return Err(SimulationError::config(format!(
                "{} draws for {} correlated assets",
                draws.len(),
                self.dim()
            )));
        }
        Ok(self.weights.iter().map(|row| dot(row, draws)).collect())
    }
}

#[inline]
fn dot(row: &[f64], draws: &[f64]) -> f64 {
    row.iter().zip(draws).map(|(w, z)| w * z).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> CorrelationMatrix {
        CorrelationMatrix::new(vec![
            vec![1.0, 0.5, -0.2],
            vec![0.5, 1.0, 0.1],
            vec![-0.2, 0.1, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_identity_passes_through() {
        let draws = [0.3, -1.2, 2.0];
        let out = correlate(&draws, &CorrelationMatrix::identity(3)).unwrap();
        assert_eq!(out, draws.to_vec());
    }

    #[test]
    fn test_row_weighted_sum() {
        let out = correlate(&[1.0, 2.0, 3.0], &sample_matrix()).unwrap();
        assert!((out[0] - (1.0 + 1.0 - 0.6)).abs() < 1e-12);
        assert!((out[1] - (0.5 + 2.0 + 0.3)).abs() < 1e-12);
        assert!((out[2] - (-0.2 + 0.2 + 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = correlate(&[1.0, 2.0], &sample_matrix()).unwrap_err();
        assert!(matches!(err, SimulationError::Configuration(_)));

        let engine = CorrelationEngine::new(&sample_matrix(), CorrelationMethod::RowWeighted).unwrap();
        assert!(engine.correlate(&[1.0]).is_err());
    }

    #[test]
    fn test_engine_row_weighted_matches_free_fn() {
        let matrix = sample_matrix();
        let engine = CorrelationEngine::new(&matrix, CorrelationMethod::RowWeighted).unwrap();
        let draws = [0.7, -0.4, 1.1];
        assert_eq!(engine.correlate(&draws).unwrap(), correlate(&draws, &matrix).unwrap());
    }

    #[test]
    fn test_cholesky_first_component_unchanged() {
        // L[0] = [1, 0, 0], so the first output equals the first draw
        let engine = CorrelationEngine::new(&sample_matrix(), CorrelationMethod::Cholesky).unwrap();
        let out = engine.correlate(&[0.9, -2.0, 0.4]).unwrap();
        assert!((out[0] - 0.9).abs() < 1e-12);
        assert_eq!(engine.method(), CorrelationMethod::Cholesky);
    }
}
