//! Correlation matrix over an ordered asset list.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Tolerance used for the symmetry and unit-diagonal checks.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Square, symmetric, unit-diagonal matrix with entries in `[-1, 1]`.
///
/// Row `i` corresponds to the `i`-th asset of the owning universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CorrelationMatrix {
    rows: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Validate and wrap a row-major matrix.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(SimulationError::config("correlation matrix is empty"));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SimulationError::config(format!(
                    "correlation matrix row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                    return Err(SimulationError::config(format!(
                        "correlation entry ({}, {}) = {} outside [-1, 1]",
                        i, j, value
                    )));
                }
            }
            if (row[i] - 1.0).abs() > SYMMETRY_TOLERANCE {
                return Err(SimulationError::config(format!(
                    "correlation diagonal ({}, {}) = {} is not 1",
                    i, i, row[i]
                )));
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if (rows[i][j] - rows[j][i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(SimulationError::config(format!(
                        "correlation matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }
        Ok(Self { rows })
    }

    /// Wrap rows that are known to be valid.
    pub(crate) fn from_rows_unchecked(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn identity(n: usize) -> Self {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { rows }
    }

    /// Number of assets covered.
    #[inline]
    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Lower-triangular Cholesky factor `L` with `L * L^T = self`.
    ///
    /// Fails when the matrix is not positive definite.
    pub fn cholesky(&self) -> Result<Vec<Vec<f64>>> {
        let n = self.dim();
        let mut l = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..=i {
                let dot: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
                if i == j {
                    let pivot = self.rows[i][i] - dot;
                    if pivot <= 0.0 {
                        return Err(SimulationError::config(format!(
                            "correlation matrix is not positive definite (pivot {} at {})",
                            pivot, i
                        )));
                    }
                    l[i][j] = pivot.sqrt();
                } else {
                    l[i][j] = (self.rows[i][j] - dot) / l[j][j];
                }
            }
        }
        Ok(l)
    }
}

impl TryFrom<Vec<Vec<f64>>> for CorrelationMatrix {
    type Error = SimulationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<CorrelationMatrix> for Vec<Vec<f64>> {
    fn from(matrix: CorrelationMatrix) -> Self {
        matrix.rows
    }
}
