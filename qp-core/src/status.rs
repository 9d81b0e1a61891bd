//! Terminal solve status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of one solver invocation, mapped from each solver's own codes.
///
/// The serialized names are the ones stored in the `status` column of the
/// result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Solved to the requested accuracy
    #[serde(rename = "optimal")]
    Optimal,

    /// Solved, but the solver itself flagged reduced accuracy
    #[serde(rename = "optimal inaccurate")]
    OptimalInaccurate,

    /// Iteration limit hit
    #[serde(rename = "max_iter_reached")]
    MaxIterReached,

    /// Wall-clock budget exceeded
    #[serde(rename = "time_limit")]
    TimeLimit,

    #[serde(rename = "primal infeasible")]
    PrimalInfeasible,

    #[serde(rename = "dual infeasible")]
    DualInfeasible,

    /// Infeasibility detected without telling which side
    #[serde(rename = "primal or dual infeasible")]
    PrimalOrDualInfeasible,

    /// Crash, numerical failure, or a reported solution that failed validation
    #[serde(rename = "solver_error")]
    SolverError,
}

/// Statuses that carry a usable solution.
pub const SOLUTION_PRESENT: [SolveStatus; 2] = [SolveStatus::Optimal, SolveStatus::OptimalInaccurate];

impl SolveStatus {
    pub const ALL: [SolveStatus; 8] = [
        SolveStatus::Optimal,
        SolveStatus::OptimalInaccurate,
        SolveStatus::MaxIterReached,
        SolveStatus::TimeLimit,
        SolveStatus::PrimalInfeasible,
        SolveStatus::DualInfeasible,
        SolveStatus::PrimalOrDualInfeasible,
        SolveStatus::SolverError,
    ];

    /// True for [`SOLUTION_PRESENT`] statuses. Only these are validated and
    /// only these count as successes in the statistics.
    pub fn has_solution(self) -> bool {
        SOLUTION_PRESENT.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::OptimalInaccurate => "optimal inaccurate",
            SolveStatus::MaxIterReached => "max_iter_reached",
            SolveStatus::TimeLimit => "time_limit",
            SolveStatus::PrimalInfeasible => "primal infeasible",
            SolveStatus::DualInfeasible => "dual infeasible",
            SolveStatus::PrimalOrDualInfeasible => "primal or dual infeasible",
            SolveStatus::SolverError => "solver_error",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown solve status `{0}`")]
pub struct ParseStatusError(pub String);

impl FromStr for SolveStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolveStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_present_set() {
        let present: Vec<_> = SolveStatus::ALL.iter().filter(|s| s.has_solution()).collect();
        assert_eq!(present, vec![&SolveStatus::Optimal, &SolveStatus::OptimalInaccurate]);
    }

    #[test]
    fn test_names_parse_back() {
        for status in SolveStatus::ALL {
            assert_eq!(status.to_string().parse::<SolveStatus>().unwrap(), status);
        }
        assert!("solved".parse::<SolveStatus>().is_err());
    }
}
