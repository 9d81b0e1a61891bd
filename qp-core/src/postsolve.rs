//! Post-solve finalisation of a binding's result.

use crate::normalize::NormalizedQP;
use crate::result::SolveResult;
use crate::settings::Accuracy;
use crate::status::SolveStatus;
use crate::validate::validate;

/// Apply the uniform post-solve rules to a binding's result.
///
/// 1. A solution-present status whose point fails [`validate`] at `accuracy`
///    becomes `SOLVER_ERROR`. This step always runs.
/// 2. If `time_budget` is given and `run_time` exceeds it, the status becomes
///    `TIME_LIMIT` and `run_time` is pinned to the budget.
pub fn finalize(
    mut result: SolveResult,
    qp: &NormalizedQP,
    accuracy: Accuracy,
    time_budget: Option<f64>,
) -> SolveResult {
    if result.status.has_solution()
        && !validate(qp, result.x.as_deref(), result.y.as_deref(), accuracy)
    {
        log::warn!(
            "reported {} failed {} accuracy validation, demoting to {}",
            result.status,
            accuracy,
            SolveStatus::SolverError
        );
        result.status = SolveStatus::SolverError;
    }

    if let Some(budget) = time_budget {
        result.enforce_time_limit(budget);
    }

    result
}
