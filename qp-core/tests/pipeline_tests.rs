//! End-to-end tests of normalize -> reconstruct_dual -> finalize on a
//! small problem whose optimum is known in closed form.

use qp_core::linalg::sparse;
use qp_core::{
    finalize, kkt_residuals, normalize, reconstruct_dual, Accuracy, NativeDual, NormalizedQP,
    RawQP, SolveResult, SolveStatus, SolverExtras,
};

/// minimize   0.5 (x0^2 + x1^2) - 2 x1
/// subject to x0 + x1 == 1
///            0 <= x0 - x1 <= 0.5
///            x0 free (a general row with both bounds infinite)
///            -10 <= x0, x1 <= 10
///
/// Optimum x = (0.5, 0.5); the lower side of the two-sided row is active.
/// Double-sided duals: y = (0.5, -1.0, 0, 0, 0), objective -0.75.
fn problem() -> RawQP {
    RawQP {
        P: sparse::identity(2),
        q: vec![0.0, -2.0],
        r: 3.0,
        A: sparse::from_triplets(
            5,
            2,
            vec![
                (0, 0, 1.0),
                (0, 1, 1.0),
                (1, 0, 1.0),
                (1, 1, -1.0),
                (2, 0, 1.0),
                (3, 0, 1.0),
                (4, 1, 1.0),
            ],
        ),
        l: vec![1.0, 0.0, -1e20, -10.0, -10.0],
        u: vec![1.0, 0.5, 1e20, 10.0, 10.0],
        n: 2,
        m: 5,
    }
}

const X_OPT: [f64; 2] = [0.5, 0.5];
const Y_OPT: [f64; 5] = [0.5, -1.0, 0.0, 0.0, 0.0];

fn solved(y: Vec<f64>, run_time: f64) -> SolveResult {
    SolveResult {
        status: SolveStatus::Optimal,
        obj_val: Some(-0.75),
        x: Some(X_OPT.to_vec()),
        y: Some(y),
        run_time,
        iter: 12,
        extras: SolverExtras::TimingsWithUpdate {
            setup_time: 0.001,
            solve_time: 0.002,
            update_time: 0.0,
        },
    }
}

fn normalized() -> NormalizedQP {
    normalize(&problem()).expect("problem is well formed")
}

#[test]
fn test_normalized_blocks() {
    let qp = normalized();

    assert_eq!(qp.partition.eq_rows, vec![0]);
    assert_eq!(qp.partition.ineq_rows_l, vec![1]);
    assert_eq!(qp.partition.ineq_rows_u, vec![1]);
    assert_eq!(qp.partition.dropped_rows, vec![2]);

    assert_eq!(qp.b, vec![1.0]);
    assert_eq!(qp.h, vec![0.5, 0.0]);
    assert_eq!(qp.xl, vec![-10.0, -10.0]);
    assert_eq!(qp.r, 3.0);
}

#[test]
fn test_split_layout_round_trip() {
    let qp = normalized();

    // stacked G duals: the upper half of row 1 is inactive, the lower half carries 1.0
    let y = reconstruct_dual(
        &NativeDual::Split {
            y_eq: &[0.5],
            z_ineq: &[0.0, 1.0],
            z_lb: &[0.0, 0.0],
            z_ub: &[0.0, 0.0],
        },
        &qp.partition,
    )
    .unwrap();
    assert_eq!(y, Y_OPT.to_vec());

    let res = kkt_residuals(&qp, &X_OPT, &y).unwrap();
    assert!((res.primal_obj + 0.75).abs() < 1e-12, "primal obj = {}", res.primal_obj);
    assert!((res.dual_obj + 0.75).abs() < 1e-12, "dual obj = {}", res.dual_obj);

    let result = finalize(solved(y, 0.003), &qp, Accuracy::High, Some(1000.0));
    assert_eq!(result.status, SolveStatus::Optimal);
}

#[test]
fn test_ranged_layout_round_trip() {
    let qp = normalized();

    // one signed multiplier per non-equality general row (rows 1 and 2)
    let y = reconstruct_dual(
        &NativeDual::Ranged {
            y_eq: &[0.5],
            z_ineq: &[-1.0, 0.0],
            y_box: &[0.0, 0.0],
        },
        &qp.partition,
    )
    .unwrap();
    assert_eq!(y, Y_OPT.to_vec());
}

#[test]
fn test_swapped_halves_are_demoted() {
    let qp = normalized();

    // a binding that mixes up the two halves of G reports the wrong sign
    let y = reconstruct_dual(
        &NativeDual::Split {
            y_eq: &[0.5],
            z_ineq: &[1.0, 0.0],
            z_lb: &[0.0, 0.0],
            z_ub: &[0.0, 0.0],
        },
        &qp.partition,
    )
    .unwrap();

    let result = finalize(solved(y, 0.003), &qp, Accuracy::Low, Some(1000.0));
    assert_eq!(result.status, SolveStatus::SolverError);
    // demotion leaves the timing untouched
    assert_eq!(result.run_time, 0.003);
}

#[test]
fn test_over_budget_solution_reports_time_limit() {
    let qp = normalized();
    let result = finalize(solved(Y_OPT.to_vec(), 1500.0), &qp, Accuracy::Low, Some(1000.0));

    assert_eq!(result.status, SolveStatus::TimeLimit);
    assert_eq!(result.run_time, 1000.0);
}

#[test]
fn test_high_tier_is_stricter() {
    let qp = normalized();
    let x = [0.5 + 2e-6, 0.5 - 2e-6];

    let low = finalize(
        SolveResult {
            x: Some(x.to_vec()),
            ..solved(Y_OPT.to_vec(), 0.01)
        },
        &qp,
        Accuracy::Low,
        None,
    );
    assert_eq!(low.status, SolveStatus::Optimal);

    let high = finalize(
        SolveResult {
            x: Some(x.to_vec()),
            ..solved(Y_OPT.to_vec(), 0.01)
        },
        &qp,
        Accuracy::High,
        None,
    );
    assert_eq!(high.status, SolveStatus::SolverError);
}
