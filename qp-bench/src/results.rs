//! Persisted per-solver result tables.
//!
//! Results are stored as
//!
//! ```text
//! <results_dir>/<output_folder>/<solver>/results.csv
//! ```
//!
//! with one row per problem and the columns
//! `name, solver, status, run_time, iter, obj_val, obj_opt, n, m, N`
//! followed by the optional columns the solver family produces.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qp_core::{RawQP, SolveResult, SolveStatus};
use serde::{Deserialize, Serialize};

use crate::settings::{ResultCapability, SolverSpec};
use crate::stats::StatsError;

const BASE_COLUMNS: [&str; 10] = [
    "name", "solver", "status", "run_time", "iter", "obj_val", "obj_opt", "n", "m", "N",
];

/// One (problem, solver) outcome as stored in a result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
    pub name: String,
    pub solver: String,
    pub status: SolveStatus,
    /// Seconds
    pub run_time: f64,
    pub iter: u64,
    /// Objective including the constant offset `r`
    pub obj_val: Option<f64>,
    /// Reference optimal objective, if known
    pub obj_opt: Option<f64>,
    pub n: usize,
    pub m: usize,
    /// `nnz(P) + nnz(A)`
    #[serde(rename = "N")]
    pub nnz: usize,

    #[serde(default)]
    pub setup_time: Option<f64>,
    #[serde(default)]
    pub solve_time: Option<f64>,
    #[serde(default)]
    pub update_time: Option<f64>,
    #[serde(default)]
    pub status_polish: Option<i32>,
    #[serde(default)]
    pub rho_updates: Option<u64>,
}

impl BenchmarkRow {
    /// Row for a finished solve. The constant offset of the problem is added
    /// to the objective so that it matches reference objectives.
    pub fn from_result(
        name: &str,
        spec: &SolverSpec,
        result: &SolveResult,
        problem: &RawQP,
        obj_opt: Option<f64>,
    ) -> Self {
        let extras = &result.extras;
        Self {
            name: name.to_string(),
            solver: spec.name(),
            status: result.status,
            run_time: result.run_time,
            iter: result.iter,
            obj_val: result.obj_val.map(|v| v + problem.r),
            obj_opt,
            n: problem.n,
            m: problem.m,
            nnz: problem.nnz(),
            setup_time: extras.setup_time(),
            solve_time: extras.solve_time(),
            update_time: extras.update_time(),
            status_polish: extras.status_polish(),
            rho_updates: extras.rho_updates(),
        }
    }

    /// Row substituted for a solve that was cancelled at the time budget.
    pub fn timeout(
        name: &str,
        spec: &SolverSpec,
        budget: f64,
        problem: &RawQP,
        obj_opt: Option<f64>,
    ) -> Self {
        Self::from_result(name, spec, &SolveResult::time_limit(budget), problem, obj_opt)
    }

    pub fn solved(&self) -> bool {
        self.status.has_solution()
    }
}

fn extra_columns(capability: ResultCapability) -> &'static [&'static str] {
    match capability {
        ResultCapability::Basic => &[],
        ResultCapability::Timings => &["setup_time", "solve_time"],
        ResultCapability::TimingsWithUpdate => &["setup_time", "solve_time", "update_time"],
        ResultCapability::Admm => &[
            "status_polish",
            "setup_time",
            "solve_time",
            "update_time",
            "rho_updates",
        ],
    }
}

fn cell<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// `<output_dir>/<solver>/results.csv`
pub fn results_path<P: AsRef<Path>>(output_dir: P, solver: &str) -> PathBuf {
    output_dir.as_ref().join(solver).join("results.csv")
}

/// Write a result table with the columns of `capability`.
pub fn write_table<P: AsRef<Path>>(
    path: P,
    capability: ResultCapability,
    rows: &[BenchmarkRow],
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create file {}", path.display()))?;

    let extra = extra_columns(capability);
    writer.write_record(BASE_COLUMNS.iter().chain(extra))?;

    for row in rows {
        let mut record = vec![
            row.name.clone(),
            row.solver.clone(),
            row.status.to_string(),
            row.run_time.to_string(),
            row.iter.to_string(),
            cell(row.obj_val),
            cell(row.obj_opt),
            row.n.to_string(),
            row.m.to_string(),
            row.nnz.to_string(),
        ];
        for &column in extra {
            record.push(match column {
                "setup_time" => cell(row.setup_time),
                "solve_time" => cell(row.solve_time),
                "update_time" => cell(row.update_time),
                "status_polish" => cell(row.status_polish),
                _ => cell(row.rho_updates),
            });
        }
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read a result table; optional columns may be absent.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<BenchmarkRow>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let row: BenchmarkRow =
            record.with_context(|| format!("Bad row {} in {}", i + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load the result table of every solver in `solvers` from `output_dir`.
///
/// A solver without a table is an error; nothing is substituted for it.
pub fn load_solver_tables<P: AsRef<Path>>(
    output_dir: P,
    solvers: &[String],
) -> Result<BTreeMap<String, Vec<BenchmarkRow>>> {
    let mut tables = BTreeMap::new();
    for solver in solvers {
        let path = results_path(&output_dir, solver);
        if !path.is_file() {
            return Err(StatsError::MissingTable {
                solver: solver.clone(),
            })
            .with_context(|| format!("Expected {}", path.display()));
        }
        let rows = read_table(&path)?;
        log::info!("Loaded {} rows for {} from {}", rows.len(), solver, path.display());
        tables.insert(solver.clone(), rows);
    }
    Ok(tables)
}

/// Concatenate `<output_dir>/<solver>/<problem>/full.csv` files, one per
/// problem, into the solver's `results.csv`.
pub fn merge_problem_tables<P: AsRef<Path>>(
    output_dir: P,
    solver: &SolverSpec,
    problems: &[String],
) -> Result<PathBuf> {
    let solver_dir = output_dir.as_ref().join(solver.name());
    let mut rows = Vec::with_capacity(problems.len());
    for problem in problems {
        rows.extend(read_table(solver_dir.join(problem).join("full.csv"))?);
    }

    let path = results_path(&output_dir, &solver.name());
    write_table(&path, solver.family.capability(), &rows)?;
    Ok(path)
}

#[derive(Debug, Deserialize)]
struct ReferenceObjective {
    name: String,
    obj_opt: f64,
}

/// Read reference optimal objectives from a `name,obj_opt` CSV file.
pub fn load_reference_objectives<P: AsRef<Path>>(path: P) -> Result<HashMap<String, f64>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut map = HashMap::new();
    for record in reader.deserialize() {
        let r: ReferenceObjective =
            record.with_context(|| format!("Bad reference objective in {}", path.display()))?;
        map.insert(r.name, r.obj_opt);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SolverFamily;
    use qp_core::linalg::sparse;
    use qp_core::{Accuracy, SolverExtras};

    fn problem() -> RawQP {
        RawQP {
            P: sparse::identity(2),
            q: vec![1.0, 1.0],
            r: 2.5,
            A: sparse::identity(2),
            l: vec![0.0, 0.0],
            u: vec![1.0, 1.0],
            n: 2,
            m: 2,
        }
    }

    #[test]
    fn test_row_adds_offset_and_counts_nonzeros() {
        let spec = SolverSpec::new(SolverFamily::Piqp, Accuracy::Low);
        let result = SolveResult {
            status: SolveStatus::Optimal,
            obj_val: Some(-1.0),
            x: None,
            y: None,
            run_time: 0.25,
            iter: 9,
            extras: SolverExtras::TimingsWithUpdate {
                setup_time: 0.05,
                solve_time: 0.2,
                update_time: 0.0,
            },
        };

        let row = BenchmarkRow::from_result("HS21", &spec, &result, &problem(), Some(1.5));
        assert_eq!(row.solver, "PIQP");
        assert_eq!(row.obj_val, Some(1.5));
        assert_eq!(row.nnz, 4);
        assert_eq!(row.setup_time, Some(0.05));
        assert_eq!(row.status_polish, None);
        assert_eq!(row.update_time, Some(0.0));
    }

    #[test]
    fn test_timeout_row() {
        let spec = SolverSpec::new(SolverFamily::Osqp, Accuracy::High);
        let row = BenchmarkRow::timeout("QAFIRO", &spec, 1000.0, &problem(), None);

        assert_eq!(row.solver, "OSQP_high");
        assert_eq!(row.status, SolveStatus::TimeLimit);
        assert_eq!(row.run_time, 1000.0);
        assert_eq!(row.iter, 0);
        assert_eq!(row.obj_val, None);
        assert!(!row.solved());
    }

    #[test]
    fn test_extra_columns_follow_capability() {
        assert!(extra_columns(ResultCapability::Basic).is_empty());
        assert_eq!(extra_columns(ResultCapability::Admm).len(), 5);
        assert_eq!(
            extra_columns(ResultCapability::Timings),
            &["setup_time", "solve_time"]
        );
    }
}
