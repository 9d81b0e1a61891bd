//! qp-core: problem normalization and solution checking for QP benchmarks
//!
//! Benchmark problems are stored as double-sided QPs
//!
//! ```text
//! minimize    (1/2) x^T P x + q^T x + r
//! subject to  l <= A x <= u
//! ```
//!
//! whose last `n` rows are simple variable bounds. Solvers want the problem
//! in different shapes and return their multipliers in different layouts.
//! This crate provides:
//!
//! - **Normalization**: [`normalize`] splits a [`RawQP`] into equality,
//!   single-sided inequality and box blocks plus the [`RowPartition`] that
//!   records where each row came from.
//! - **Dual reconstruction**: [`reconstruct_dual`] maps a solver's
//!   [`NativeDual`] back to one multiplier per original row.
//! - **Validation**: [`validate`] checks a returned primal/dual pair against
//!   KKT conditions at a uniform [`Accuracy`] tier, and [`finalize`] demotes
//!   reported solutions that fail it.
//!
//! # Example
//!
//! ```ignore
//! use qp_core::{finalize, normalize, reconstruct_dual, Accuracy, NativeDual};
//!
//! let qp = normalize(&raw)?;
//! // ... call a solver on qp.A_eq / qp.G / qp.xl ...
//! let y = reconstruct_dual(&NativeDual::Split { y_eq, z_ineq, z_lb, z_ub }, &qp.partition)?;
//! let result = finalize(result, &qp, Accuracy::High, Some(1000.0));
//! ```

#![warn(clippy::all)]

pub mod dual;
pub mod linalg;
pub mod normalize;
pub mod postsolve;
pub mod problem;
pub mod result;
pub mod settings;
pub mod status;
pub mod validate;

pub use dual::{reconstruct_dual, split_dual, DualError, NativeDual, SplitDual};
pub use linalg::sparse::SparseCsc;
pub use normalize::{normalize, NormalizedQP, RowPartition, EQUALITY_TOL};
pub use postsolve::finalize;
pub use problem::{clamp_sentinel, ProblemError, RawQP, INFINITY_SENTINEL};
pub use result::{SolveResult, SolverExtras};
pub use settings::{Accuracy, Tolerances};
pub use status::{ParseStatusError, SolveStatus, SOLUTION_PRESENT};
pub use validate::{kkt_residuals, validate, KktResiduals};
