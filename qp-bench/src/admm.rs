//! Side statistics for ADMM solvers (OSQP family).
//!
//! All three use only the problems the plain variant solved to `OPTIMAL`
//! and read the optional columns that only ADMM result tables carry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qp_core::SolveStatus;

use crate::results::BenchmarkRow;
use crate::stats::StatsError;

/// Mean, median, max and population standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub std: f64,
}

/// `None` for an empty sample.
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    };

    Some(Describe {
        mean,
        median,
        max: sorted[sorted.len() - 1],
        std: var.sqrt(),
    })
}

/// Cost and success of solution polishing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolishStatistics {
    /// Percent increase of the polished run time over the plain one
    pub time_increase: Describe,
    /// Percent of problems on which polishing succeeded
    pub percentage_of_success: f64,
}

fn optimal_rows(rows: &[BenchmarkRow]) -> Vec<&BenchmarkRow> {
    rows.iter()
        .filter(|r| r.status == SolveStatus::Optimal)
        .collect()
}

fn column<T>(row: &BenchmarkRow, value: Option<T>, column: &'static str) -> Result<T, StatsError> {
    value.ok_or_else(|| StatsError::MissingColumn {
        solver: row.solver.clone(),
        problem: row.name.clone(),
        column,
    })
}

fn no_solved(rows: &[BenchmarkRow]) -> StatsError {
    StatsError::NoSolvedProblems {
        solver: rows.first().map(|r| r.solver.clone()).unwrap_or_default(),
    }
}

/// Compare a polished variant against its plain counterpart, problem by
/// problem, on the problems the plain variant solved to `OPTIMAL`.
pub fn polish_statistics(
    plain: &[BenchmarkRow],
    polished: &[BenchmarkRow],
) -> Result<PolishStatistics, StatsError> {
    let polished_by_name: HashMap<&str, &BenchmarkRow> =
        polished.iter().map(|r| (r.name.as_str(), r)).collect();

    let mut increase = Vec::new();
    let mut n_success = 0usize;
    for base in optimal_rows(plain) {
        let pol = polished_by_name
            .get(base.name.as_str())
            .ok_or_else(|| StatsError::MissingRow {
                solver: polished.first().map(|r| r.solver.clone()).unwrap_or_default(),
                problem: base.name.clone(),
            })?;
        increase.push(100.0 * (pol.run_time / base.run_time - 1.0));
        if column(pol, pol.status_polish, "status_polish")? == 1 {
            n_success += 1;
        }
    }

    let time_increase = describe(&increase).ok_or_else(|| no_solved(plain))?;
    Ok(PolishStatistics {
        time_increase,
        percentage_of_success: 100.0 * n_success as f64 / increase.len() as f64,
    })
}

/// `100 * setup_time / solve_time` over the optimally solved problems.
pub fn setup_solve_ratio(rows: &[BenchmarkRow]) -> Result<Describe, StatsError> {
    let ratios = optimal_rows(rows)
        .into_iter()
        .map(|r| {
            let setup = column(r, r.setup_time, "setup_time")?;
            let solve = column(r, r.solve_time, "solve_time")?;
            Ok(100.0 * setup / solve)
        })
        .collect::<Result<Vec<f64>, StatsError>>()?;
    describe(&ratios).ok_or_else(|| no_solved(rows))
}

/// Number of step-size updates over the optimally solved problems.
pub fn rho_update_statistics(rows: &[BenchmarkRow]) -> Result<Describe, StatsError> {
    let updates = optimal_rows(rows)
        .into_iter()
        .map(|r| column(r, r.rho_updates, "rho_updates").map(|u| u as f64))
        .collect::<Result<Vec<f64>, StatsError>>()?;
    describe(&updates).ok_or_else(|| no_solved(rows))
}

/// One header row, one value row.
fn write_row(path: &Path, header: &[&str], values: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create file {}", path.display()))?;
    writer.write_record(header)?;
    writer.write_record(values.iter().map(|v| v.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Write `polish_statistics.csv` into `dir`.
pub fn write_polish_statistics(dir: &Path, stats: &PolishStatistics) -> Result<PathBuf> {
    let path = dir.join("polish_statistics.csv");
    let d = &stats.time_increase;
    write_row(
        &path,
        &[
            "mean_time_increase",
            "median_time_increase",
            "max_time_increase",
            "std_time_increase",
            "percentage_of_success",
        ],
        &[d.mean, d.median, d.max, d.std, stats.percentage_of_success],
    )?;
    Ok(path)
}

/// Write `ratio_setup_solve.csv` into `dir`.
pub fn write_setup_solve_ratio(dir: &Path, d: &Describe) -> Result<PathBuf> {
    let path = dir.join("ratio_setup_solve.csv");
    write_row(
        &path,
        &["mean_ratio", "median_ratio", "std_ratio", "max_ratio"],
        &[d.mean, d.median, d.std, d.max],
    )?;
    Ok(path)
}

/// Write `rho_updates.csv` into `dir`.
pub fn write_rho_updates(dir: &Path, d: &Describe) -> Result<PathBuf> {
    let path = dir.join("rho_updates.csv");
    write_row(
        &path,
        &[
            "mean_rho_updates",
            "median_rho_updates",
            "max_rho_updates",
            "std_rho_updates",
        ],
        &[d.mean, d.median, d.max, d.std],
    )?;
    Ok(path)
}
