//! Result contract of a solver binding.

use crate::status::SolveStatus;

/// Solver-specific timing and diagnostic fields.
///
/// Each solver family produces a fixed subset of the optional result
/// columns; the variant carries exactly that subset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SolverExtras {
    /// No extra columns
    #[default]
    None,

    /// Setup and solve phase timings (seconds)
    Timings { setup_time: f64, solve_time: f64 },

    /// Setup, solve and matrix-update timings (seconds)
    TimingsWithUpdate {
        setup_time: f64,
        solve_time: f64,
        update_time: f64,
    },

    /// ADMM solvers: timings plus solution polishing outcome and the number
    /// of step-size (rho) updates
    Admm {
        setup_time: f64,
        solve_time: f64,
        update_time: f64,
        /// 1 = polish succeeded, 0 = not run, negative = failed
        status_polish: i32,
        rho_updates: u64,
    },
}

impl SolverExtras {
    pub fn setup_time(&self) -> Option<f64> {
        match *self {
            SolverExtras::None => None,
            SolverExtras::Timings { setup_time, .. }
            | SolverExtras::TimingsWithUpdate { setup_time, .. }
            | SolverExtras::Admm { setup_time, .. } => Some(setup_time),
        }
    }

    pub fn solve_time(&self) -> Option<f64> {
        match *self {
            SolverExtras::None => None,
            SolverExtras::Timings { solve_time, .. }
            | SolverExtras::TimingsWithUpdate { solve_time, .. }
            | SolverExtras::Admm { solve_time, .. } => Some(solve_time),
        }
    }

    pub fn update_time(&self) -> Option<f64> {
        match *self {
            SolverExtras::TimingsWithUpdate { update_time, .. }
            | SolverExtras::Admm { update_time, .. } => Some(update_time),
            _ => None,
        }
    }

    pub fn status_polish(&self) -> Option<i32> {
        match *self {
            SolverExtras::Admm { status_polish, .. } => Some(status_polish),
            _ => None,
        }
    }

    pub fn rho_updates(&self) -> Option<u64> {
        match *self {
            SolverExtras::Admm { rho_updates, .. } => Some(rho_updates),
            _ => None,
        }
    }
}

/// Outcome of one solver invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Terminal status
    pub status: SolveStatus,

    /// Objective value without the constant offset; `None` on failure
    pub obj_val: Option<f64>,

    /// Primal solution (length n)
    pub x: Option<Vec<f64>>,

    /// Dual solution in the double-sided convention (length m)
    pub y: Option<Vec<f64>>,

    /// Wall-clock run time (seconds)
    pub run_time: f64,

    /// Iteration count
    pub iter: u64,

    pub extras: SolverExtras,
}

impl SolveResult {
    /// Result without a solution, e.g. for an infeasibility certificate or
    /// a crash.
    pub fn failed(status: SolveStatus, run_time: f64, iter: u64) -> Self {
        Self {
            status,
            obj_val: None,
            x: None,
            y: None,
            run_time,
            iter,
            extras: SolverExtras::None,
        }
    }

    /// Deterministic result substituted for a solve that was cancelled after
    /// exceeding its wall-clock budget.
    pub fn time_limit(budget: f64) -> Self {
        Self::failed(SolveStatus::TimeLimit, budget, 0)
    }

    /// Report `TIME_LIMIT` with `run_time` pinned to `budget` if the run
    /// took longer than `budget`. Returns true if the result was changed.
    pub fn enforce_time_limit(&mut self, budget: f64) -> bool {
        if self.run_time > budget {
            log::warn!(
                "run time {:.3}s exceeds the {:.3}s budget, reporting {}",
                self.run_time,
                budget,
                SolveStatus::TimeLimit
            );
            self.status = SolveStatus::TimeLimit;
            self.run_time = budget;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_limit_result() {
        let res = SolveResult::time_limit(1000.0);
        assert_eq!(res.status, SolveStatus::TimeLimit);
        assert_eq!(res.run_time, 1000.0);
        assert_eq!(res.iter, 0);
        assert!(res.obj_val.is_none() && res.x.is_none() && res.y.is_none());
    }

    #[test]
    fn test_enforce_time_limit_pins_run_time() {
        let mut res = SolveResult::failed(SolveStatus::MaxIterReached, 12.5, 4000);
        assert!(res.enforce_time_limit(10.0));
        assert_eq!(res.status, SolveStatus::TimeLimit);
        assert_eq!(res.run_time, 10.0);

        let mut fast = SolveResult::failed(SolveStatus::MaxIterReached, 9.0, 4000);
        assert!(!fast.enforce_time_limit(10.0));
        assert_eq!(fast.status, SolveStatus::MaxIterReached);
    }

    #[test]
    fn test_extras_accessors() {
        let admm = SolverExtras::Admm {
            setup_time: 0.1,
            solve_time: 0.4,
            update_time: 0.0,
            status_polish: 1,
            rho_updates: 3,
        };
        assert_eq!(admm.setup_time(), Some(0.1));
        assert_eq!(admm.rho_updates(), Some(3));

        let timings = SolverExtras::Timings {
            setup_time: 0.2,
            solve_time: 0.3,
        };
        assert_eq!(timings.solve_time(), Some(0.3));
        assert_eq!(timings.update_time(), None);
        assert_eq!(SolverExtras::None.status_polish(), None);
    }
}
