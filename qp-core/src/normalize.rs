//! Problem normalizer.
//!
//! Splits a double-sided QP `l <= A x <= u` into the pieces the different
//! solver families expect:
//!
//! ```text
//! A_eq x  = b          (general rows with l == u)
//! G x    <= h          (one row per finite side of the remaining general rows)
//! xl <= x <= xu        (the trailing identity block)
//! ```
//!
//! together with the [`RowPartition`] needed to scatter native duals back to
//! the original row order.

use crate::linalg::sparse::{self, SparseCsc};
use crate::problem::{clamp_sentinel, ProblemError, RawQP};

/// Rows with `u - l` below this are treated as equalities.
pub const EQUALITY_TOL: f64 = 1e-10;

/// Classification of the general-constraint rows (indices into `0..n_general`).
///
/// `eq_rows` is disjoint from the three other sets. A row with two finite,
/// distinct bounds appears in both `ineq_rows_l` and `ineq_rows_u`; a row
/// with two infinite bounds appears only in `dropped_rows`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowPartition {
    /// Rows with equal bounds, emitted into `A_eq x = b`.
    pub eq_rows: Vec<usize>,
    /// Inequality rows with a finite upper bound. Each emits `c x <= u` into
    /// the first block of `G`.
    pub ineq_rows_l: Vec<usize>,
    /// Inequality rows with a finite lower bound. Each emits `-c x <= -l`
    /// into the second block of `G`.
    pub ineq_rows_u: Vec<usize>,
    /// Inequality rows with both bounds infinite. They emit nothing.
    pub dropped_rows: Vec<usize>,
    /// Number of general rows.
    pub n_general: usize,
    /// Number of variable-bound rows following the general block.
    pub n_box: usize,
}

impl RowPartition {
    /// Classify general rows from their (already clamped) bounds.
    pub fn classify(cl: &[f64], cu: &[f64], n_box: usize) -> Self {
        debug_assert_eq!(cl.len(), cu.len());

        let mut part = RowPartition {
            n_general: cl.len(),
            n_box,
            ..Default::default()
        };

        for (i, (&lo, &up)) in cl.iter().zip(cu.iter()).enumerate() {
            if up - lo < EQUALITY_TOL {
                part.eq_rows.push(i);
                continue;
            }
            match (lo.is_finite(), up.is_finite()) {
                (true, true) => {
                    part.ineq_rows_l.push(i);
                    part.ineq_rows_u.push(i);
                }
                (false, true) => part.ineq_rows_l.push(i),
                (true, false) => part.ineq_rows_u.push(i),
                (false, false) => part.dropped_rows.push(i),
            }
        }

        part
    }

    /// Total number of rows in the original problem (`m`).
    pub fn m(&self) -> usize {
        self.n_general + self.n_box
    }

    /// Number of rows of `G`.
    pub fn num_ineq(&self) -> usize {
        self.ineq_rows_l.len() + self.ineq_rows_u.len()
    }

    /// All non-equality general rows in ascending order, dropped rows included.
    pub fn ineq_rows(&self) -> Vec<usize> {
        let mut is_eq = vec![false; self.n_general];
        for &i in &self.eq_rows {
            is_eq[i] = true;
        }
        (0..self.n_general).filter(|&i| !is_eq[i]).collect()
    }

    /// Index of the first variable-bound row in the original ordering.
    pub fn box_offset(&self) -> usize {
        self.n_general
    }
}

/// Solver-facing decomposition of a [`RawQP`].
///
/// Owns all of its data; nothing aliases the raw problem.
#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct NormalizedQP {
    /// Quadratic cost (n x n)
    pub P: SparseCsc,
    /// Linear cost (length n)
    pub q: Vec<f64>,
    /// Constant objective offset
    pub r: f64,

    /// General constraint block (first m - n rows of A)
    pub C: SparseCsc,
    /// Clamped lower bounds of the general block
    pub cl: Vec<f64>,
    /// Clamped upper bounds of the general block
    pub cu: Vec<f64>,

    /// Equality rows `C[eq_rows]`
    pub A_eq: SparseCsc,
    /// Equality right-hand side `u[eq_rows]`
    pub b: Vec<f64>,
    /// Inequality matrix `[C[ineq_rows_l]; -C[ineq_rows_u]]`
    pub G: SparseCsc,
    /// Inequality right-hand side `[u[ineq_rows_l]; -l[ineq_rows_u]]`
    pub h: Vec<f64>,
    /// Variable lower bounds
    pub xl: Vec<f64>,
    /// Variable upper bounds
    pub xu: Vec<f64>,

    /// Row classification used for dual reconstruction
    pub partition: RowPartition,
}

impl NormalizedQP {
    /// Number of variables.
    pub fn n(&self) -> usize {
        self.q.len()
    }

    /// Number of rows in the original double-sided problem.
    pub fn m(&self) -> usize {
        self.partition.m()
    }

    /// Full clamped lower bound vector in the original row order.
    pub fn l(&self) -> Vec<f64> {
        let mut l = self.cl.clone();
        l.extend_from_slice(&self.xl);
        l
    }

    /// Full clamped upper bound vector in the original row order.
    pub fn u(&self) -> Vec<f64> {
        let mut u = self.cu.clone();
        u.extend_from_slice(&self.xu);
        u
    }
}

/// Normalize a raw problem. Deterministic and side-effect free apart from
/// logging.
pub fn normalize(raw: &RawQP) -> Result<NormalizedQP, ProblemError> {
    raw.validate()?;

    let k = raw.num_general();
    let l: Vec<f64> = raw.l.iter().map(|&v| clamp_sentinel(v)).collect();
    let u: Vec<f64> = raw.u.iter().map(|&v| clamp_sentinel(v)).collect();

    let (cl, xl) = l.split_at(k);
    let (cu, xu) = u.split_at(k);

    let general: Vec<usize> = (0..k).collect();
    let c = sparse::select_rows(&raw.A, &general, 1.0);

    let partition = RowPartition::classify(cl, cu, raw.n);
    if !partition.dropped_rows.is_empty() {
        log::warn!(
            "dropping {} general rows with both bounds infinite (first: {})",
            partition.dropped_rows.len(),
            partition.dropped_rows[0]
        );
    }

    let a_eq = sparse::select_rows(&c, &partition.eq_rows, 1.0);
    let b: Vec<f64> = partition.eq_rows.iter().map(|&i| cu[i]).collect();

    let g_upper = sparse::select_rows(&c, &partition.ineq_rows_l, 1.0);
    let g_lower = sparse::select_rows(&c, &partition.ineq_rows_u, -1.0);
    let g = sparse::vstack(&g_upper, &g_lower);

    let mut h = Vec::with_capacity(partition.num_ineq());
    h.extend(partition.ineq_rows_l.iter().map(|&i| cu[i]));
    h.extend(partition.ineq_rows_u.iter().map(|&i| -cl[i]));

    log::debug!(
        "normalized: {} eq rows, {} G rows, {} dropped, {} box rows",
        partition.eq_rows.len(),
        h.len(),
        partition.dropped_rows.len(),
        raw.n
    );

    Ok(NormalizedQP {
        P: raw.P.clone(),
        q: raw.q.clone(),
        r: raw.r,
        C: c,
        cl: cl.to_vec(),
        cu: cu.to_vec(),
        A_eq: a_eq,
        b,
        G: g,
        h,
        xl: xl.to_vec(),
        xu: xu.to_vec(),
        partition,
    })
}
