//! Cross-solver statistics.
//!
//! Folds the result tables of several solvers over one problem set into
//! solver-agnostic metrics:
//!
//! - failure rate: percentage of problems without a solution,
//! - performance profile: fraction of problems solved within a factor `tau`
//!   of the fastest solver, over a log-spaced grid of `tau`,
//! - shifted geometric mean of run times, normalized to the best solver.
//!
//! Runs without a solution never enter an average as a real time; they are
//! replaced by a timing sentinel first.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::problem_set::ProblemSet;
use crate::results::BenchmarkRow;
use crate::settings::{RunConfig, SolverSpec, DEFAULT_TIME_LIMIT};

/// Missing or inconsistent input data. Always fatal for the computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("no solvers to compare")]
    NoSolvers,

    #[error("the problem set is empty")]
    EmptyProblemSet,

    #[error("missing results table for solver {solver}")]
    MissingTable { solver: String },

    #[error("solver {solver} has no result for problem {problem}")]
    MissingRow { solver: String, problem: String },

    #[error("solver {solver} has {count} results for problem {problem}")]
    DuplicateRow {
        solver: String,
        problem: String,
        count: usize,
    },

    #[error("solver {solver} has no column {column} for problem {problem}")]
    MissingColumn {
        solver: String,
        problem: String,
        column: &'static str,
    },

    #[error("solver {solver} solved no problem to optimality")]
    NoSolvedProblems { solver: String },
}

/// Constants of the statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsOptions {
    /// Time assigned to failed runs when looking for the fastest solver of a
    /// problem in the performance profile
    pub failure_timing: f64,
    /// Time assigned to failed runs in the geometric mean (the time limit)
    pub max_timing: f64,
    /// Shift of the geometric mean
    pub shift: f64,
    /// Number of grid points of the performance profile
    pub n_tau: usize,
    /// Upper end of the `tau` grid (the lower end is 1)
    pub tau_max: f64,
    /// Leave polished solver variants out of the failure rates and the
    /// geometric means; they still get a performance profile
    pub skip_polished: bool,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            failure_timing: 1e6,
            max_timing: DEFAULT_TIME_LIMIT,
            shift: 10.0,
            n_tau: 1000,
            tau_max: 1e4,
            skip_polished: true,
        }
    }
}

impl StatsOptions {
    pub fn for_run(config: &RunConfig) -> Self {
        Self {
            max_timing: config.time_limit,
            ..Self::default()
        }
    }
}

/// Performance profile curves on a shared `tau` grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceProfile {
    pub tau: Vec<f64>,
    /// One curve per solver, same length as `tau`
    pub rho: BTreeMap<String, Vec<f64>>,
}

/// Output of [`compute_stats`]. Per-solver maps keep the input solver order
/// in `solvers`.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkStats {
    pub solvers: Vec<String>,
    pub n_problems: usize,
    /// Percent of problems without a solution
    pub failure_rates: BTreeMap<String, f64>,
    pub performance_profile: PerformanceProfile,
    /// Raw shifted geometric means (seconds)
    pub geom_means: BTreeMap<String, f64>,
    /// Shifted geometric means divided by the best one
    pub normalized_geom_means: BTreeMap<String, f64>,
}

/// `exp(mean(ln(max(1, t + shift)))) - shift`
///
/// Logarithms are summed to avoid overflow on long timing vectors.
pub fn shifted_geometric_mean(times: &[f64], shift: f64) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    let log_sum: f64 = times.iter().map(|&t| (t + shift).max(1.0).ln()).sum();
    (log_sum / times.len() as f64).exp() - shift
}

/// `n` points log-spaced from 1 to `tau_max`, both ends included.
pub fn tau_grid(n: usize, tau_max: f64) -> Vec<f64> {
    let top = tau_max.log10();
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n)
            .map(|i| 10f64.powf(top * i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// Run time of each solver on each problem; `None` where the run has no
/// solution. Indexed `[solver][problem]`.
fn timing_matrix(
    solvers: &[String],
    tables: &BTreeMap<String, Vec<BenchmarkRow>>,
    problems: &ProblemSet,
) -> Result<Vec<Vec<Option<f64>>>, StatsError> {
    let mut matrix = Vec::with_capacity(solvers.len());
    for solver in solvers {
        let rows = tables.get(solver).ok_or_else(|| StatsError::MissingTable {
            solver: solver.clone(),
        })?;

        let mut by_name: HashMap<&str, Vec<&BenchmarkRow>> = HashMap::new();
        for row in rows {
            by_name.entry(row.name.as_str()).or_default().push(row);
        }

        let mut times = Vec::with_capacity(problems.len());
        for problem in &problems.names {
            let row = match by_name.get(problem.as_str()).map(Vec::as_slice) {
                Some([row]) => *row,
                Some(found) if !found.is_empty() => {
                    return Err(StatsError::DuplicateRow {
                        solver: solver.clone(),
                        problem: problem.clone(),
                        count: found.len(),
                    })
                }
                _ => {
                    return Err(StatsError::MissingRow {
                        solver: solver.clone(),
                        problem: problem.clone(),
                    })
                }
            };
            times.push(row.solved().then_some(row.run_time));
        }
        matrix.push(times);
    }
    Ok(matrix)
}

/// Performance profile of `times[solver][problem]` (`None` = failed).
///
/// For each problem the fastest time is taken with failures counted as
/// `failure_timing`. A failed run has ratio `+inf` and therefore never
/// counts as solved, whatever `tau`.
pub fn performance_profile(times: &[Vec<Option<f64>>], opts: &StatsOptions) -> (Vec<f64>, Vec<Vec<f64>>) {
    let tau = tau_grid(opts.n_tau, opts.tau_max);
    let n_problems = times.first().map_or(0, Vec::len);
    if n_problems == 0 {
        return (tau.clone(), vec![vec![0.0; tau.len()]; times.len()]);
    }

    let min_time: Vec<f64> = (0..n_problems)
        .map(|p| {
            times
                .iter()
                .map(|t| t[p].unwrap_or(opts.failure_timing))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();

    let curves = times
        .iter()
        .map(|t| {
            let mut ratios: Vec<f64> = t
                .iter()
                .zip(&min_time)
                .map(|(&ti, &min_t)| match ti {
                    None => f64::INFINITY,
                    Some(ti) if ti <= min_t => 1.0,
                    Some(ti) => ti / min_t,
                })
                .collect();
            ratios.sort_by(f64::total_cmp);

            // ratios sorted ascending: count with a moving cursor
            let mut solved = 0;
            tau.iter()
                .map(|&tau_k| {
                    while solved < ratios.len() && ratios[solved] <= tau_k {
                        solved += 1;
                    }
                    solved as f64 / n_problems as f64
                })
                .collect()
        })
        .collect();

    (tau, curves)
}

fn is_polished(solver: &str) -> bool {
    solver
        .parse::<SolverSpec>()
        .map(|spec| spec.polish)
        .unwrap_or(false)
}

/// Compute failure rates, performance profiles and shifted geometric means
/// of `solvers` over `problems`.
pub fn compute_stats(
    solvers: &[String],
    tables: &BTreeMap<String, Vec<BenchmarkRow>>,
    problems: &ProblemSet,
    opts: &StatsOptions,
) -> Result<BenchmarkStats, StatsError> {
    if solvers.is_empty() {
        return Err(StatsError::NoSolvers);
    }
    if problems.is_empty() {
        return Err(StatsError::EmptyProblemSet);
    }

    let times = timing_matrix(solvers, tables, problems)?;
    let n_problems = problems.len();

    let mut failure_rates = BTreeMap::new();
    for (solver, t) in solvers.iter().zip(&times) {
        if opts.skip_polished && is_polished(solver) {
            continue;
        }
        let failed = t.iter().filter(|ti| ti.is_none()).count();
        failure_rates.insert(solver.clone(), 100.0 * failed as f64 / n_problems as f64);
    }

    let (tau, curves) = performance_profile(&times, opts);
    let rho = solvers.iter().cloned().zip(curves).collect();

    let mut geom_means = BTreeMap::new();
    for (solver, t) in solvers.iter().zip(&times) {
        if opts.skip_polished && is_polished(solver) {
            continue;
        }
        let filled: Vec<f64> = t.iter().map(|ti| ti.unwrap_or(opts.max_timing)).collect();
        geom_means.insert(solver.clone(), shifted_geometric_mean(&filled, opts.shift));
    }

    let best = geom_means.values().copied().fold(f64::INFINITY, f64::min);
    let normalized_geom_means = geom_means
        .iter()
        .map(|(solver, &g)| {
            let ratio = if best > 0.0 {
                g / best
            } else if g <= best {
                1.0
            } else {
                f64::INFINITY
            };
            (solver.clone(), ratio)
        })
        .collect();

    log::debug!(
        "stats over {} problems for {} solvers",
        n_problems,
        solvers.len()
    );

    Ok(BenchmarkStats {
        solvers: solvers.to_vec(),
        n_problems,
        failure_rates,
        performance_profile: PerformanceProfile { tau, rho },
        geom_means,
        normalized_geom_means,
    })
}

impl BenchmarkStats {
    /// Solvers that appear in the geometric-mean table, in input order.
    fn mean_solvers(&self) -> Vec<&String> {
        self.solvers
            .iter()
            .filter(|s| self.normalized_geom_means.contains_key(*s))
            .collect()
    }

    /// Write `performance_profiles.csv`, `geom_mean.csv` and
    /// `failure_rates.csv` into `dir`.
    pub fn write_tables<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let profiles = dir.join("performance_profiles.csv");
        let mut writer = csv::Writer::from_path(&profiles)
            .with_context(|| format!("Failed to create file {}", profiles.display()))?;
        writer.write_record(std::iter::once("tau").chain(self.solvers.iter().map(String::as_str)))?;
        for (k, tau) in self.performance_profile.tau.iter().enumerate() {
            let mut record = vec![tau.to_string()];
            for solver in &self.solvers {
                let rho = self
                    .performance_profile
                    .rho
                    .get(solver)
                    .and_then(|curve| curve.get(k))
                    .copied()
                    .unwrap_or(0.0);
                record.push(rho.to_string());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;

        let geom_mean = dir.join("geom_mean.csv");
        let mean_solvers = self.mean_solvers();
        write_single_row(
            &geom_mean,
            &mean_solvers,
            mean_solvers.iter().map(|s| self.normalized_geom_means[*s]),
        )?;

        let failure_rates = dir.join("failure_rates.csv");
        let rated: Vec<&String> = self
            .solvers
            .iter()
            .filter(|s| self.failure_rates.contains_key(*s))
            .collect();
        write_single_row(
            &failure_rates,
            &rated,
            rated.iter().map(|s| self.failure_rates[*s]),
        )?;

        Ok(vec![profiles, geom_mean, failure_rates])
    }

    /// Print a per-solver summary.
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("Benchmark statistics ({} problems)", self.n_problems);
        println!("{}", "=".repeat(60));
        println!(
            "{:<22} {:>12} {:>12} {:>10}",
            "Solver", "Failure %", "Geom mean", "rho(1)"
        );
        println!("{}", "-".repeat(60));

        for solver in &self.solvers {
            let rho_1 = self
                .performance_profile
                .rho
                .get(solver)
                .and_then(|c| c.first())
                .copied()
                .unwrap_or(0.0);
            let mean = self
                .normalized_geom_means
                .get(solver)
                .map(|g| format!("{:.2}", g))
                .unwrap_or_else(|| "-".to_string());
            let failure = self
                .failure_rates
                .get(solver)
                .map(|f| format!("{:.2}%", f))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<22} {:>12} {:>12} {:>10.3}",
                solver, failure, mean, rho_1
            );
        }
        println!("{}", "=".repeat(60));
    }
}

/// A one-row table: header of solver names, one value per solver.
fn write_single_row<I>(path: &Path, solvers: &[&String], values: I) -> Result<()>
where
    I: Iterator<Item = f64>,
{
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create file {}", path.display()))?;
    writer.write_record(solvers)?;
    writer.write_record(values.map(|v| v.to_string()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qp_core::SolveStatus;

    fn row(name: &str, solver: &str, time: Option<f64>) -> BenchmarkRow {
        BenchmarkRow {
            name: name.to_string(),
            solver: solver.to_string(),
            status: if time.is_some() {
                SolveStatus::Optimal
            } else {
                SolveStatus::MaxIterReached
            },
            run_time: time.unwrap_or(3.0),
            iter: 10,
            obj_val: time.map(|_| 1.0),
            obj_opt: None,
            n: 2,
            m: 3,
            nnz: 5,
            setup_time: None,
            solve_time: None,
            update_time: None,
            status_polish: None,
            rho_updates: None,
        }
    }

    fn table(solver: &str, times: &[Option<f64>]) -> Vec<BenchmarkRow> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| row(&format!("P{}", i + 1), solver, t))
            .collect()
    }

    fn problems(n: usize) -> ProblemSet {
        ProblemSet {
            names: (1..=n).map(|i| format!("P{}", i)).collect(),
        }
    }

    /// Solver A: [1, 2, fail]; solver B: [2, 1, 1]
    fn scenario() -> BenchmarkStats {
        let solvers = vec!["A".to_string(), "B".to_string()];
        let mut tables = BTreeMap::new();
        tables.insert("A".to_string(), table("A", &[Some(1.0), Some(2.0), None]));
        tables.insert("B".to_string(), table("B", &[Some(2.0), Some(1.0), Some(1.0)]));
        compute_stats(&solvers, &tables, &problems(3), &StatsOptions::default()).unwrap()
    }

    #[test]
    fn test_scenario_failure_rates() {
        let stats = scenario();
        assert!((stats.failure_rates["A"] - 100.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.failure_rates["B"], 0.0);
    }

    #[test]
    fn test_scenario_profile() {
        let stats = scenario();
        let profile = &stats.performance_profile;
        assert_eq!(profile.tau.len(), 1000);
        assert_eq!(profile.tau[0], 1.0);
        assert!((profile.tau[999] - 1e4).abs() < 1e-6);

        let a = &profile.rho["A"];
        let b = &profile.rho["B"];
        assert!((a[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((b[0] - 2.0 / 3.0).abs() < 1e-12);

        // both solve every problem they solve within a factor 2
        let k = profile.tau.iter().position(|&t| t >= 2.0).unwrap();
        assert!((a[k] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(b[k], 1.0);
        assert!((a[999] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_scenario_geom_means() {
        let stats = scenario();
        assert_eq!(stats.normalized_geom_means["B"], 1.0);
        assert!(stats.normalized_geom_means["A"] > 1.0);

        let expected_b = shifted_geometric_mean(&[2.0, 1.0, 1.0], 10.0);
        assert!((stats.geom_means["B"] - expected_b).abs() < 1e-12);
        let expected_a = shifted_geometric_mean(&[1.0, 2.0, 1000.0], 10.0);
        assert!((stats.geom_means["A"] - expected_a).abs() < 1e-12);
    }

    #[test]
    fn test_shifted_geometric_mean() {
        // constant input returns that constant
        assert!((shifted_geometric_mean(&[5.0, 5.0, 5.0], 10.0) - 5.0).abs() < 1e-12);
        // the max(1, .) guard only kicks in below 1 - shift
        assert!((shifted_geometric_mean(&[0.0], 0.0) - 1.0).abs() < 1e-12);

        let base = shifted_geometric_mean(&[1.0, 4.0, 9.0], 10.0);
        let faster = shifted_geometric_mean(&[1.0, 3.0, 9.0], 10.0);
        assert!(faster < base);
    }

    #[test]
    fn test_all_solvers_fail_a_problem() {
        let solvers = vec!["A".to_string(), "B".to_string()];
        let mut tables = BTreeMap::new();
        tables.insert("A".to_string(), table("A", &[Some(1.0), None]));
        tables.insert("B".to_string(), table("B", &[Some(1.0), None]));
        let stats = compute_stats(&solvers, &tables, &problems(2), &StatsOptions::default()).unwrap();

        for s in ["A", "B"] {
            let curve = &stats.performance_profile.rho[s];
            assert_eq!(curve[0], 0.5);
            assert!((curve.last().unwrap() - (1.0 - stats.failure_rates[s] / 100.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_and_duplicate_rows() {
        let solvers = vec!["A".to_string()];
        let mut tables = BTreeMap::new();
        tables.insert("A".to_string(), table("A", &[Some(1.0)]));
        assert_eq!(
            compute_stats(&solvers, &tables, &problems(2), &StatsOptions::default()),
            Err(StatsError::MissingRow {
                solver: "A".into(),
                problem: "P2".into()
            })
        );

        let mut rows = table("A", &[Some(1.0), Some(2.0)]);
        rows.push(row("P2", "A", Some(3.0)));
        tables.insert("A".to_string(), rows);
        assert_eq!(
            compute_stats(&solvers, &tables, &problems(2), &StatsOptions::default()),
            Err(StatsError::DuplicateRow {
                solver: "A".into(),
                problem: "P2".into(),
                count: 2
            })
        );
    }

    #[test]
    fn test_missing_table_and_empty_inputs() {
        let tables = BTreeMap::new();
        let opts = StatsOptions::default();
        assert_eq!(
            compute_stats(&["X".to_string()], &tables, &problems(1), &opts),
            Err(StatsError::MissingTable { solver: "X".into() })
        );
        assert_eq!(
            compute_stats(&[], &tables, &problems(1), &opts),
            Err(StatsError::NoSolvers)
        );
        assert_eq!(
            compute_stats(&["X".to_string()], &tables, &problems(0), &opts),
            Err(StatsError::EmptyProblemSet)
        );
    }

    #[test]
    fn test_polished_variant_left_out_of_means_and_failure_rates() {
        let solvers = vec!["OSQP".to_string(), "OSQP_polish".to_string()];
        let mut tables = BTreeMap::new();
        tables.insert("OSQP".to_string(), table("OSQP", &[Some(2.0)]));
        tables.insert("OSQP_polish".to_string(), table("OSQP_polish", &[Some(1.0)]));
        let stats = compute_stats(&solvers, &tables, &problems(1), &StatsOptions::default()).unwrap();

        assert_eq!(stats.normalized_geom_means.len(), 1);
        assert_eq!(stats.normalized_geom_means["OSQP"], 1.0);
        assert_eq!(stats.performance_profile.rho["OSQP_polish"][0], 1.0);
        assert_eq!(stats.failure_rates.len(), 1);
        assert!(!stats.failure_rates.contains_key("OSQP_polish"));

        let dir = tempfile::tempdir().unwrap();
        stats.write_tables(dir.path()).unwrap();
        let failure = std::fs::read_to_string(dir.path().join("failure_rates.csv")).unwrap();
        assert_eq!(failure.lines().next(), Some("OSQP"));
    }

    #[test]
    fn test_tau_grid_is_increasing() {
        let tau = tau_grid(50, 1e4);
        assert_eq!(tau[0], 1.0);
        assert!(tau.windows(2).all(|w| w[0] < w[1]));
        assert!(tau_grid(0, 1e4).is_empty());
    }
}
