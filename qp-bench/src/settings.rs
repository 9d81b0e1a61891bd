//! Run configuration and benchmarked solver variants.
//!
//! Everything here is an immutable value: a [`RunConfig`] is built once per
//! run and passed by reference.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use qp_core::Accuracy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default wall-clock budget per solve (seconds).
pub const DEFAULT_TIME_LIMIT: f64 = 1000.0;

/// Solver libraries covered by the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolverFamily {
    Clarabel,
    Ecos,
    Gurobi,
    Mosek,
    Osqp,
    Piqp,
    Proxqp,
    Qpalm,
    Scs,
}

/// Optional result columns a solver family fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCapability {
    /// Only the common columns
    Basic,
    /// `setup_time`, `solve_time`
    Timings,
    /// `setup_time`, `solve_time`, `update_time`
    TimingsWithUpdate,
    /// Timings plus `status_polish` and `rho_updates`
    Admm,
}

impl SolverFamily {
    pub const ALL: [SolverFamily; 9] = [
        SolverFamily::Clarabel,
        SolverFamily::Ecos,
        SolverFamily::Gurobi,
        SolverFamily::Mosek,
        SolverFamily::Osqp,
        SolverFamily::Piqp,
        SolverFamily::Proxqp,
        SolverFamily::Qpalm,
        SolverFamily::Scs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SolverFamily::Clarabel => "CLARABEL",
            SolverFamily::Ecos => "ECOS",
            SolverFamily::Gurobi => "GUROBI",
            SolverFamily::Mosek => "MOSEK",
            SolverFamily::Osqp => "OSQP",
            SolverFamily::Piqp => "PIQP",
            SolverFamily::Proxqp => "PROXQP",
            SolverFamily::Qpalm => "QPALM",
            SolverFamily::Scs => "SCS",
        }
    }

    pub fn capability(self) -> ResultCapability {
        match self {
            SolverFamily::Osqp => ResultCapability::Admm,
            SolverFamily::Piqp => ResultCapability::TimingsWithUpdate,
            SolverFamily::Proxqp | SolverFamily::Scs => ResultCapability::Timings,
            _ => ResultCapability::Basic,
        }
    }

    /// Whether the family has a solution-polishing option.
    pub fn supports_polish(self) -> bool {
        self == SolverFamily::Osqp
    }
}

impl fmt::Display for SolverFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseSolverError {
    #[error("unknown solver `{0}`")]
    UnknownFamily(String),

    #[error("unknown solver suffix `{suffix}` in `{name}`")]
    UnknownSuffix { name: String, suffix: String },

    #[error("solver `{0}` has no polish option")]
    PolishUnsupported(String),
}

/// One benchmarked solver variant, e.g. `OSQP_polish_high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolverSpec {
    pub family: SolverFamily,
    pub accuracy: Accuracy,
    pub polish: bool,
}

impl SolverSpec {
    pub fn new(family: SolverFamily, accuracy: Accuracy) -> Self {
        Self {
            family,
            accuracy,
            polish: false,
        }
    }

    /// Enable polishing. Only meaningful for families that support it.
    pub fn with_polish(mut self) -> Self {
        self.polish = true;
        self
    }

    /// Canonical name `FAMILY[_polish][_high]`, used as the results
    /// directory and as the column header in derived tables.
    pub fn name(&self) -> String {
        let mut name = self.family.as_str().to_string();
        if self.polish {
            name.push_str("_polish");
        }
        if self.accuracy == Accuracy::High {
            name.push_str("_high");
        }
        name
    }

    /// Solvers benchmarked by default at the given tier.
    pub fn default_lineup(accuracy: Accuracy) -> Vec<SolverSpec> {
        [
            SolverFamily::Piqp,
            SolverFamily::Osqp,
            SolverFamily::Qpalm,
            SolverFamily::Scs,
            SolverFamily::Proxqp,
            SolverFamily::Gurobi,
            SolverFamily::Mosek,
        ]
        .into_iter()
        .map(|family| SolverSpec::new(family, accuracy))
        .collect()
    }
}

impl fmt::Display for SolverSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for SolverSpec {
    type Err = ParseSolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('_');
        let head = parts.next().unwrap_or_default();
        let family = SolverFamily::ALL
            .into_iter()
            .find(|f| f.as_str() == head)
            .ok_or_else(|| ParseSolverError::UnknownFamily(s.to_string()))?;

        let mut spec = SolverSpec::new(family, Accuracy::Low);
        let mut rest: Vec<&str> = parts.collect();

        if rest.last() == Some(&"high") {
            spec.accuracy = Accuracy::High;
            rest.pop();
        }
        match rest.as_slice() {
            [] => {}
            ["polish"] if family.supports_polish() => spec.polish = true,
            ["polish"] => return Err(ParseSolverError::PolishUnsupported(s.to_string())),
            other => {
                return Err(ParseSolverError::UnknownSuffix {
                    name: s.to_string(),
                    suffix: other.join("_"),
                })
            }
        }
        Ok(spec)
    }
}

/// Per-run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock budget per solve (seconds)
    pub time_limit: f64,

    pub accuracy: Accuracy,

    /// Let solvers print their own progress
    pub verbose: bool,

    /// Root of the results tree
    pub results_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        // Allow environment variable overrides for the budget and the output root
        let time_limit = std::env::var("QPBENCH_TIME_LIMIT")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|t| *t > 0.0)
            .unwrap_or(DEFAULT_TIME_LIMIT);
        let results_dir = std::env::var("QPBENCH_RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("results"));

        Self {
            time_limit,
            accuracy: Accuracy::Low,
            verbose: false,
            results_dir,
        }
    }
}

impl RunConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_results_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Folder name of this run under the results root.
    pub fn output_folder(&self) -> &'static str {
        match self.accuracy {
            Accuracy::Low => "maros_meszaros_problems",
            Accuracy::High => "maros_meszaros_problems_high_accuracy",
        }
    }

    /// `<results_dir>/<output_folder>`
    pub fn output_dir(&self) -> PathBuf {
        self.results_dir.join(self.output_folder())
    }
}
