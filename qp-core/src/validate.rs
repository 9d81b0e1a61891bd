//! Result validator.
//!
//! Solvers occasionally report success while returning a point that misses
//! the accuracy the benchmark asks for. Every reported solution is therefore
//! re-checked here against the same KKT conditions, at the same tolerance
//! tier, for all solvers.
//!
//! With `y` in the double-sided convention the conditions are
//!
//! ```text
//! A_eq x = b,   G x <= h,   xl <= x <= xu                  (primal)
//! P x + q + C^T y_c + y_box = 0                            (stationarity)
//! y_i >= 0 unless l_i is finite, y_i <= 0 unless u_i is finite  (sign)
//! |p_obj - d_obj| / max(1, |p_obj|) <= eps_abs             (gap)
//! ```

use crate::linalg::sparse::{self, SparseCsc};
use crate::linalg::{dot, inf_norm};
use crate::normalize::NormalizedQP;
use crate::settings::{Accuracy, Tolerances};

/// Residuals of a candidate primal/dual pair together with the scales their
/// relative tolerances are measured against.
#[derive(Debug, Clone, Copy)]
pub struct KktResiduals {
    /// `‖A_eq x − b‖∞`
    pub eq_res: f64,
    pub eq_scale: f64,
    /// `‖max(G x − h, 0)‖∞`
    pub ineq_res: f64,
    pub ineq_scale: f64,
    /// Largest violation of a finite variable bound
    pub box_res: f64,
    pub box_scale: f64,
    /// Largest multiplier pointing at an infinite bound
    pub sign_res: f64,
    pub sign_scale: f64,
    /// `‖P x + q + Aᵀ y‖∞`
    pub stat_res: f64,
    pub stat_scale: f64,

    pub primal_obj: f64,
    pub dual_obj: f64,
    /// `|primal_obj − dual_obj| / max(1, |primal_obj|)`
    pub gap_rel: f64,
}

impl KktResiduals {
    pub fn primal_feasible(&self, tol: &Tolerances) -> bool {
        self.eq_res <= tol.threshold(self.eq_scale)
            && self.ineq_res <= tol.threshold(self.ineq_scale)
            && self.box_res <= tol.threshold(self.box_scale)
    }

    pub fn dual_feasible(&self, tol: &Tolerances) -> bool {
        self.sign_res <= tol.threshold(self.sign_scale)
            && self.stat_res <= tol.threshold(self.stat_scale)
    }

    pub fn gap_closed(&self, tol: &Tolerances) -> bool {
        self.gap_rel <= tol.eps_abs
    }

    pub fn satisfies(&self, tol: &Tolerances) -> bool {
        self.primal_feasible(tol) && self.dual_feasible(tol) && self.gap_closed(tol)
    }
}

fn residual(a: &SparseCsc, x: &[f64], rhs: &[f64]) -> (Vec<f64>, f64) {
    let ax = sparse::matvec(a, x);
    let scale = inf_norm(&ax).max(inf_norm(rhs));
    let r = ax.iter().zip(rhs).map(|(ai, bi)| ai - bi).collect();
    (r, scale)
}

/// Largest multiplier component pushing against an infinite bound, and the
/// bound-weighted term `Σ u_i y_i⁺ − l_i y_i⁻` of the dual objective.
fn sign_violation_and_support(y: &[f64], l: &[f64], u: &[f64]) -> (f64, f64) {
    let mut viol = 0.0_f64;
    let mut support = 0.0;
    for ((&yi, &li), &ui) in y.iter().zip(l).zip(u) {
        if yi > 0.0 {
            if ui.is_finite() {
                support += ui * yi;
            } else {
                viol = viol.max(yi);
            }
        } else if yi < 0.0 {
            if li.is_finite() {
                support += li * yi;
            } else {
                viol = viol.max(-yi);
            }
        }
    }
    (viol, support)
}

/// Compute the KKT residuals of `(x, y)` on `qp`.
///
/// Returns `None` when the vectors have the wrong length or contain a
/// non-finite entry.
pub fn kkt_residuals(qp: &NormalizedQP, x: &[f64], y: &[f64]) -> Option<KktResiduals> {
    let n = qp.n();
    let k = qp.partition.n_general;
    if x.len() != n || y.len() != qp.m() {
        return None;
    }
    if !x.iter().chain(y).all(|v| v.is_finite()) {
        return None;
    }
    let (y_c, y_box) = y.split_at(k);

    // primal
    let (r_eq, eq_scale) = residual(&qp.A_eq, x, &qp.b);
    let (r_ineq, ineq_scale) = residual(&qp.G, x, &qp.h);
    let ineq_res = r_ineq.iter().fold(0.0_f64, |acc, &r| acc.max(r));

    let mut box_res = 0.0_f64;
    for ((&xj, &lo), &up) in x.iter().zip(&qp.xl).zip(&qp.xu) {
        if lo.is_finite() {
            box_res = box_res.max(lo - xj);
        }
        if up.is_finite() {
            box_res = box_res.max(xj - up);
        }
    }

    // dual
    let p_x = sparse::matvec(&qp.P, x);
    let mut aty = y_box.to_vec();
    sparse::spmv_transpose(&qp.C, y_c, &mut aty, 1.0, 1.0);
    let stat: Vec<f64> = p_x
        .iter()
        .zip(&qp.q)
        .zip(&aty)
        .map(|((px, qi), ay)| px + qi + ay)
        .collect();
    let stat_scale = inf_norm(&p_x).max(inf_norm(&qp.q)).max(inf_norm(&aty));

    let (sign_c, support_c) = sign_violation_and_support(y_c, &qp.cl, &qp.cu);
    let (sign_box, support_box) = sign_violation_and_support(y_box, &qp.xl, &qp.xu);

    // objectives
    let xpx = dot(x, &p_x);
    let primal_obj = 0.5 * xpx + dot(&qp.q, x);
    let dual_obj = -0.5 * xpx - (support_c + support_box);
    let gap_rel = (primal_obj - dual_obj).abs() / primal_obj.abs().max(1.0);

    Some(KktResiduals {
        eq_res: inf_norm(&r_eq),
        eq_scale,
        ineq_res,
        ineq_scale,
        box_res,
        box_scale: inf_norm(x),
        sign_res: sign_c.max(sign_box),
        sign_scale: inf_norm(y),
        stat_res: inf_norm(&stat),
        stat_scale,
        primal_obj,
        dual_obj,
        gap_rel,
    })
}

/// True iff `(x, y)` is an optimal primal/dual pair of `qp` at the given tier.
///
/// A missing vector is a failure.
pub fn validate(qp: &NormalizedQP, x: Option<&[f64]>, y: Option<&[f64]>, accuracy: Accuracy) -> bool {
    let (Some(x), Some(y)) = (x, y) else {
        log::debug!("validation failed: missing primal or dual vector");
        return false;
    };
    let Some(res) = kkt_residuals(qp, x, y) else {
        log::debug!(
            "validation failed: bad vectors (len x = {}, len y = {}, n = {}, m = {})",
            x.len(),
            y.len(),
            qp.n(),
            qp.m()
        );
        return false;
    };

    let tol = accuracy.tolerances();
    log::debug!(
        "kkt: eq={:.3e} ineq={:.3e} box={:.3e} sign={:.3e} stat={:.3e} gap_rel={:.3e} ({} tier)",
        res.eq_res,
        res.ineq_res,
        res.box_res,
        res.sign_res,
        res.stat_res,
        res.gap_rel,
        accuracy
    );
    res.satisfies(&tol)
}
