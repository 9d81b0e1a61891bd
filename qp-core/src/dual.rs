//! Dual reconstruction.
//!
//! Every solver family returns its multipliers laid out according to its own
//! constraint ordering. This module scatters them back into one vector `y` of
//! length `m` in the double-sided convention
//!
//! ```text
//! P x + q + A^T y = 0,   y_i > 0 when u_i is active,   y_i < 0 when l_i is active
//! ```
//!
//! so that residuals can be compared across solvers.

use thiserror::Error;

use crate::normalize::RowPartition;

/// Native dual lengths that do not match the row partition.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("native dual part `{part}` has length {got}, expected {expected}")]
pub struct DualError {
    pub part: &'static str,
    pub got: usize,
    pub expected: usize,
}

/// Dual vectors as returned by a solver binding.
#[derive(Debug, Clone, Copy)]
pub enum NativeDual<'a> {
    /// Already in the double-sided convention (length m).
    DoubleSided { y: &'a [f64] },

    /// Equality / stacked inequality / box layout matching
    /// [`NormalizedQP`](crate::NormalizedQP): `y_eq` for `A_eq`, nonnegative
    /// `z_ineq` for the rows of `G`, nonnegative `z_lb`/`z_ub` for the
    /// variable bounds.
    Split {
        y_eq: &'a [f64],
        z_ineq: &'a [f64],
        z_lb: &'a [f64],
        z_ub: &'a [f64],
    },

    /// Equality duals plus one signed multiplier per non-equality general row
    /// (ascending order, dropped rows included) and one signed multiplier
    /// per variable bound.
    Ranged {
        y_eq: &'a [f64],
        z_ineq: &'a [f64],
        y_box: &'a [f64],
    },
}

fn check_len(part: &'static str, v: &[f64], expected: usize) -> Result<(), DualError> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(DualError {
            part,
            got: v.len(),
            expected,
        })
    }
}

/// Rebuild the double-sided dual vector from a native layout.
///
/// For a row in both `ineq_rows_l` and `ineq_rows_u` the two multipliers are
/// combined as `z_upper_half - z_lower_half`; variable bounds likewise give
/// `z_ub - z_lb`. Dropped rows get a zero multiplier.
pub fn reconstruct_dual(native: &NativeDual<'_>, part: &RowPartition) -> Result<Vec<f64>, DualError> {
    let m = part.m();
    let k = part.box_offset();

    match *native {
        NativeDual::DoubleSided { y } => {
            check_len("y", y, m)?;
            Ok(y.to_vec())
        }
        NativeDual::Split {
            y_eq,
            z_ineq,
            z_lb,
            z_ub,
        } => {
            check_len("y_eq", y_eq, part.eq_rows.len())?;
            check_len("z_ineq", z_ineq, part.num_ineq())?;
            check_len("z_lb", z_lb, part.n_box)?;
            check_len("z_ub", z_ub, part.n_box)?;

            let mut y = vec![0.0; m];
            for (&row, &v) in part.eq_rows.iter().zip(y_eq) {
                y[row] = v;
            }
            let (z_upper, z_lower) = z_ineq.split_at(part.ineq_rows_l.len());
            for (&row, &v) in part.ineq_rows_l.iter().zip(z_upper) {
                y[row] += v;
            }
            for (&row, &v) in part.ineq_rows_u.iter().zip(z_lower) {
                y[row] -= v;
            }
            for (j, (&ub, &lb)) in z_ub.iter().zip(z_lb).enumerate() {
                y[k + j] = ub - lb;
            }
            Ok(y)
        }
        NativeDual::Ranged {
            y_eq,
            z_ineq,
            y_box,
        } => {
            let ineq_rows = part.ineq_rows();
            check_len("y_eq", y_eq, part.eq_rows.len())?;
            check_len("z_ineq", z_ineq, ineq_rows.len())?;
            check_len("y_box", y_box, part.n_box)?;

            let mut y = vec![0.0; m];
            for (&row, &v) in part.eq_rows.iter().zip(y_eq) {
                y[row] = v;
            }
            for (&row, &v) in ineq_rows.iter().zip(z_ineq) {
                y[row] = v;
            }
            y[k..].copy_from_slice(y_box);
            Ok(y)
        }
    }
}

/// Owned [`NativeDual::Split`] parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitDual {
    pub y_eq: Vec<f64>,
    pub z_ineq: Vec<f64>,
    pub z_lb: Vec<f64>,
    pub z_ub: Vec<f64>,
}

impl SplitDual {
    pub fn as_native(&self) -> NativeDual<'_> {
        NativeDual::Split {
            y_eq: &self.y_eq,
            z_ineq: &self.z_ineq,
            z_lb: &self.z_lb,
            z_ub: &self.z_ub,
        }
    }
}

/// Inverse of [`reconstruct_dual`] for the split layout.
///
/// One-sided rows pass their multiplier through with the sign flip of their
/// half; two-sided rows and variable bounds are split into positive and
/// negative parts. Multipliers on dropped rows are discarded.
pub fn split_dual(y: &[f64], part: &RowPartition) -> Result<SplitDual, DualError> {
    check_len("y", y, part.m())?;
    let k = part.box_offset();

    let mut two_sided = vec![false; part.n_general];
    let mut has_upper = vec![false; part.n_general];
    for &row in &part.ineq_rows_l {
        has_upper[row] = true;
    }
    for &row in &part.ineq_rows_u {
        two_sided[row] = has_upper[row];
    }

    let y_eq = part.eq_rows.iter().map(|&row| y[row]).collect();

    let mut z_ineq = Vec::with_capacity(part.num_ineq());
    z_ineq.extend(part.ineq_rows_l.iter().map(|&row| {
        if two_sided[row] {
            y[row].max(0.0)
        } else {
            y[row]
        }
    }));
    z_ineq.extend(part.ineq_rows_u.iter().map(|&row| {
        if two_sided[row] {
            (-y[row]).max(0.0)
        } else {
            -y[row]
        }
    }));

    let y_box = &y[k..];
    Ok(SplitDual {
        y_eq,
        z_ineq,
        z_lb: y_box.iter().map(|&v| (-v).max(0.0)).collect(),
        z_ub: y_box.iter().map(|&v| v.max(0.0)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// rows: 0 eq, 1 upper only, 2 two-sided, 3 lower only, 4 dropped; 2 box rows
    fn partition() -> RowPartition {
        RowPartition {
            eq_rows: vec![0],
            ineq_rows_l: vec![1, 2],
            ineq_rows_u: vec![2, 3],
            dropped_rows: vec![4],
            n_general: 5,
            n_box: 2,
        }
    }

    #[test]
    fn test_split_layout_signs() {
        let part = partition();
        let native = NativeDual::Split {
            y_eq: &[-4.0],
            // upper halves of rows 1, 2 then lower halves of rows 2, 3
            z_ineq: &[1.0, 0.5, 2.0, 3.0],
            z_lb: &[0.0, 6.0],
            z_ub: &[5.0, 0.0],
        };
        let y = reconstruct_dual(&native, &part).unwrap();
        assert_eq!(y, vec![-4.0, 1.0, -1.5, -3.0, 0.0, 5.0, -6.0]);
    }

    #[test]
    fn test_ranged_layout() {
        let part = partition();
        let native = NativeDual::Ranged {
            y_eq: &[1.0],
            z_ineq: &[2.0, -3.0, -4.0, 0.0],
            y_box: &[0.5, -0.5],
        };
        let y = reconstruct_dual(&native, &part).unwrap();
        assert_eq!(y, vec![1.0, 2.0, -3.0, -4.0, 0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_double_sided_passthrough_and_length_check() {
        let part = partition();
        let y = vec![0.1; 7];
        assert_eq!(
            reconstruct_dual(&NativeDual::DoubleSided { y: &y }, &part).unwrap(),
            y
        );

        let err = reconstruct_dual(&NativeDual::DoubleSided { y: &y[..6] }, &part).unwrap_err();
        assert_eq!(
            err,
            DualError {
                part: "y",
                got: 6,
                expected: 7
            }
        );
    }

    #[test]
    fn test_split_then_reconstruct_is_identity() {
        let part = partition();
        let y = vec![-4.0, 1.5, -2.5, -0.25, 0.0, 3.0, -7.0];
        let parts = split_dual(&y, &part).unwrap();

        assert!(parts.z_lb.iter().chain(&parts.z_ub).all(|&v| v >= 0.0));
        assert_eq!(parts.z_ineq.len(), part.num_ineq());
        assert_eq!(reconstruct_dual(&parts.as_native(), &part).unwrap(), y);
    }

    #[test]
    fn test_wrong_split_lengths() {
        let part = partition();
        let native = NativeDual::Split {
            y_eq: &[1.0],
            z_ineq: &[1.0, 2.0],
            z_lb: &[0.0, 0.0],
            z_ub: &[0.0, 0.0],
        };
        let err = reconstruct_dual(&native, &part).unwrap_err();
        assert_eq!(err.part, "z_ineq");
        assert_eq!(err.expected, 4);
    }
}
