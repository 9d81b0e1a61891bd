//! qp-bench: cross-solver statistics for QP benchmark runs
//!
//! Reads the per-solver result tables a benchmark run leaves behind and
//! folds them into failure rates, performance profiles and shifted
//! geometric means. Problem loading from MAT files and the OSQP-specific
//! side statistics live here too.

#![warn(clippy::all)]

pub mod admm;
pub mod matparser;
pub mod problem_set;
pub mod results;
pub mod settings;
pub mod stats;

pub use problem_set::{ProblemSet, MAROS_MESZAROS_PROBLEMS};
pub use results::{
    load_reference_objectives, load_solver_tables, merge_problem_tables, read_table,
    results_path, write_table, BenchmarkRow,
};
pub use settings::{
    ParseSolverError, ResultCapability, RunConfig, SolverFamily, SolverSpec, DEFAULT_TIME_LIMIT,
};
pub use stats::{compute_stats, BenchmarkStats, PerformanceProfile, StatsError, StatsOptions};
