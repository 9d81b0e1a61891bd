//! Raw QP instances as stored in the benchmark problem files.
//!
//! The problem files describe
//!
//! ```text
//! minimize    (1/2) x^T P x + q^T x + r
//! subject to  l <= A x <= u
//! ```
//!
//! where the last `n` rows of `A` are the identity, i.e. the final `n`
//! constraints are plain variable bounds.

use thiserror::Error;

use crate::linalg::sparse::SparseCsc;

/// Bound magnitude above which a value is read as a signed infinity.
pub const INFINITY_SENTINEL: f64 = 9e19;

/// Map the problem-file "no bound" sentinel onto a signed infinity.
#[inline]
pub fn clamp_sentinel(v: f64) -> f64 {
    if v > INFINITY_SENTINEL {
        f64::INFINITY
    } else if v < -INFINITY_SENTINEL {
        f64::NEG_INFINITY
    } else {
        v
    }
}

/// Dimension and structure errors in a [`RawQP`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("q has length {got}, expected {expected}")]
    LinearCost { got: usize, expected: usize },

    #[error("P has shape {rows}x{cols}, expected {n}x{n}")]
    Hessian { rows: usize, cols: usize, n: usize },

    #[error("A has shape {rows}x{cols}, expected {m}x{n}")]
    Constraints {
        rows: usize,
        cols: usize,
        m: usize,
        n: usize,
    },

    #[error("{which} has length {got}, expected {expected}")]
    Bounds {
        which: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("m = {m} is smaller than n = {n}; the last n rows must be variable bounds")]
    MissingBoxRows { m: usize, n: usize },

    #[error("row {row} of the variable-bound block is not the unit row of variable {var}")]
    BoxRowNotIdentity { row: usize, var: usize },
}

/// A QP instance exactly as loaded from a problem file.
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // P and A are standard mathematical notation
pub struct RawQP {
    /// Quadratic cost matrix P (n x n, symmetric, both triangles stored)
    pub P: SparseCsc,

    /// Linear cost vector q (length n)
    pub q: Vec<f64>,

    /// Constant objective offset
    pub r: f64,

    /// Constraint matrix A (m x n); rows m-n..m are the identity
    pub A: SparseCsc,

    /// Row lower bounds (length m), may hold the ±1e20 sentinel
    pub l: Vec<f64>,

    /// Row upper bounds (length m), may hold the ±1e20 sentinel
    pub u: Vec<f64>,

    /// Number of variables
    pub n: usize,

    /// Number of constraint rows, variable bounds included
    pub m: usize,
}

impl RawQP {
    /// Number of general (non variable-bound) constraint rows.
    pub fn num_general(&self) -> usize {
        self.m.saturating_sub(self.n)
    }

    /// Nonzero count `nnz(P) + nnz(A)` reported in the result tables.
    pub fn nnz(&self) -> usize {
        self.P.nnz() + self.A.nnz()
    }

    /// Check dimensions and the identity structure of the variable-bound block.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let (n, m) = (self.n, self.m);

        if self.q.len() != n {
            return Err(ProblemError::LinearCost {
                got: self.q.len(),
                expected: n,
            });
        }
        if self.P.rows() != n || self.P.cols() != n {
            return Err(ProblemError::Hessian {
                rows: self.P.rows(),
                cols: self.P.cols(),
                n,
            });
        }
        if self.A.rows() != m || self.A.cols() != n {
            return Err(ProblemError::Constraints {
                rows: self.A.rows(),
                cols: self.A.cols(),
                m,
                n,
            });
        }
        for (which, v) in [("l", &self.l), ("u", &self.u)] {
            if v.len() != m {
                return Err(ProblemError::Bounds {
                    which,
                    got: v.len(),
                    expected: m,
                });
            }
        }
        if m < n {
            return Err(ProblemError::MissingBoxRows { m, n });
        }

        let k = m - n;
        let mut seen = vec![false; n];
        for (val, (row, col)) in self.A.iter() {
            if row < k {
                continue;
            }
            let var = row - k;
            if col != var || *val != 1.0 || seen[var] {
                return Err(ProblemError::BoxRowNotIdentity { row, var });
            }
            seen[var] = true;
        }
        if let Some(var) = seen.iter().position(|&s| !s) {
            return Err(ProblemError::BoxRowNotIdentity { row: k + var, var });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::sparse;

    fn tiny() -> RawQP {
        // one general row x0 + x1 in [1, 1e20], then x0, x1 bounds
        RawQP {
            P: sparse::identity(2),
            q: vec![1.0, -1.0],
            r: 0.5,
            A: sparse::from_triplets(
                3,
                2,
                vec![(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (2, 1, 1.0)],
            ),
            l: vec![1.0, -1e20, 0.0],
            u: vec![1e20, 1e20, 4.0],
            n: 2,
            m: 3,
        }
    }

    #[test]
    fn test_sentinel_clamping() {
        assert_eq!(clamp_sentinel(1e20), f64::INFINITY);
        assert_eq!(clamp_sentinel(-1e25), f64::NEG_INFINITY);
        assert_eq!(clamp_sentinel(9e19), 9e19);
        assert_eq!(clamp_sentinel(-3.0), -3.0);
    }

    #[test]
    fn test_valid_problem() {
        let qp = tiny();
        assert!(qp.validate().is_ok());
        assert_eq!(qp.num_general(), 1);
        assert_eq!(qp.nnz(), 6);
    }

    #[test]
    fn test_bound_length_mismatch() {
        let mut qp = tiny();
        qp.u.pop();
        assert_eq!(
            qp.validate(),
            Err(ProblemError::Bounds {
                which: "u",
                got: 2,
                expected: 3
            })
        );
    }

    #[test]
    fn test_box_block_must_be_identity() {
        let mut qp = tiny();
        qp.A = sparse::from_triplets(3, 2, vec![(0, 0, 1.0), (1, 0, 2.0), (2, 1, 1.0)]);
        assert_eq!(
            qp.validate(),
            Err(ProblemError::BoxRowNotIdentity { row: 1, var: 0 })
        );

        qp.A = sparse::from_triplets(3, 2, vec![(0, 0, 1.0), (1, 0, 1.0)]);
        assert_eq!(
            qp.validate(),
            Err(ProblemError::BoxRowNotIdentity { row: 2, var: 1 })
        );
    }
}
