//! Benchmark statistics CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qp_bench::admm;
use qp_bench::matparser::parse_mat;
use qp_bench::{
    compute_stats, load_solver_tables, merge_problem_tables, ProblemSet, RunConfig, SolverFamily,
    SolverSpec, StatsOptions,
};
use qp_core::{normalize, Accuracy};

#[derive(Parser, Debug)]
#[command(name = "qp-bench", about = "Statistics for QP solver benchmark runs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand that reads a results tree.
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Use the high accuracy results folder
    #[arg(long)]
    high_accuracy: bool,

    /// Root of the results tree
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// JSON run configuration; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

impl RunArgs {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };
        if self.high_accuracy {
            config = config.with_accuracy(Accuracy::High);
        }
        if let Some(dir) = &self.results_dir {
            config = config.with_results_dir(dir);
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a problem file and print its row partition
    Inspect {
        /// Problem file (.mat)
        file: PathBuf,
    },

    /// Compute failure rates, performance profiles and geometric means
    Stats {
        /// Solver variants to compare (default: the standard lineup)
        #[arg(long, num_args = 1..)]
        solvers: Vec<SolverSpec>,

        /// Directory of .mat files defining the problem set
        #[arg(long)]
        problem_dir: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Merge per-problem result files into each solver's results table
    Merge {
        #[arg(long, num_args = 1.., required = true)]
        solvers: Vec<SolverSpec>,

        #[arg(long)]
        problem_dir: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Polish, setup/solve ratio and step-size update statistics for OSQP
    Admm {
        #[command(flatten)]
        run: RunArgs,
    },
}

fn problem_set(dir: Option<&Path>) -> Result<ProblemSet> {
    match dir {
        Some(dir) => ProblemSet::from_dir(dir),
        None => Ok(ProblemSet::maros_meszaros()),
    }
}

fn inspect(file: &Path) -> Result<()> {
    let raw = parse_mat(file)?;
    let qp = normalize(&raw).with_context(|| format!("Failed to normalize {}", file.display()))?;
    let part = &qp.partition;

    println!("\n{}", "=".repeat(60));
    println!("{}", file.display());
    println!("{}", "=".repeat(60));
    println!("  n = {}, m = {}, N = {}", raw.n, raw.m, raw.nnz());
    println!("  general rows:     {}", part.n_general);
    println!("  equality rows:    {}", part.eq_rows.len());
    println!("  rows with upper:  {}", part.ineq_rows_l.len());
    println!("  rows with lower:  {}", part.ineq_rows_u.len());
    println!("  dropped rows:     {}", part.dropped_rows.len());
    println!("  box rows:         {}", part.n_box);
    println!(
        "  A_eq: {}x{}, G: {}x{}",
        qp.A_eq.rows(),
        qp.A_eq.cols(),
        qp.G.rows(),
        qp.G.cols()
    );
    if !part.dropped_rows.is_empty() {
        println!("  dropped: {:?}", part.dropped_rows);
    }
    Ok(())
}

fn stats(solvers: Vec<SolverSpec>, problem_dir: Option<&Path>, config: &RunConfig) -> Result<()> {
    let specs = if solvers.is_empty() {
        SolverSpec::default_lineup(config.accuracy)
    } else {
        solvers
    };
    let names: Vec<String> = specs.iter().map(SolverSpec::name).collect();
    let problems = problem_set(problem_dir)?;
    let output_dir = config.output_dir();

    log::info!(
        "Computing statistics for {} solvers over {} problems in {}",
        names.len(),
        problems.len(),
        output_dir.display()
    );

    let tables = load_solver_tables(&output_dir, &names)?;
    let stats = compute_stats(&names, &tables, &problems, &StatsOptions::for_run(config))?;

    for path in stats.write_tables(&output_dir)? {
        log::info!("Wrote {}", path.display());
    }
    stats.print_summary();
    Ok(())
}

fn merge(solvers: &[SolverSpec], problem_dir: Option<&Path>, config: &RunConfig) -> Result<()> {
    let problems = problem_set(problem_dir)?;
    let output_dir = config.output_dir();
    for spec in solvers {
        let path = merge_problem_tables(&output_dir, spec, &problems.names)?;
        println!("{}: {}", spec, path.display());
    }
    Ok(())
}

fn admm_statistics(config: &RunConfig) -> Result<()> {
    let plain = SolverSpec::new(SolverFamily::Osqp, config.accuracy);
    let polished = plain.with_polish();

    let output_dir = config.output_dir();
    let tables = load_solver_tables(&output_dir, &[plain.name(), polished.name()])?;
    let plain_rows = &tables[&plain.name()];
    let polished_rows = &tables[&polished.name()];

    let polish = admm::polish_statistics(plain_rows, polished_rows)?;
    let ratio = admm::setup_solve_ratio(plain_rows)?;
    let rho = admm::rho_update_statistics(plain_rows)?;

    admm::write_polish_statistics(&output_dir, &polish)?;
    admm::write_setup_solve_ratio(&output_dir, &ratio)?;
    admm::write_rho_updates(&output_dir, &rho)?;

    println!("\n{}", "=".repeat(60));
    println!("ADMM statistics ({})", plain);
    println!("{}", "=".repeat(60));
    println!(
        "Polish time increase: mean {:.2}%, median {:.2}%, max {:.2}%",
        polish.time_increase.mean, polish.time_increase.median, polish.time_increase.max
    );
    println!("Polish success:       {:.2}%", polish.percentage_of_success);
    println!(
        "Setup/solve ratio:    mean {:.2}%, median {:.2}%",
        ratio.mean, ratio.median
    );
    println!("Rho updates:          mean {:.2}, max {:.0}", rho.mean, rho.max);
    println!("{}", "=".repeat(60));
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { file } => inspect(&file),
        Command::Stats {
            solvers,
            problem_dir,
            run,
        } => stats(solvers, problem_dir.as_deref(), &run.run_config()?),
        Command::Merge {
            solvers,
            problem_dir,
            run,
        } => merge(&solvers, problem_dir.as_deref(), &run.run_config()?),
        Command::Admm { run } => admm_statistics(&run.run_config()?),
    }
}
