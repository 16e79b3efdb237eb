//! pomdp-solve - exact POMDP value iteration via incremental pruning.
//!
//! Command surface:
//! - `solve`: run the solver on a model file, optionally writing a snapshot
//! - `validate`: check a model file without solving
//! - `query`: best action for a belief against a saved snapshot
//!
//! stdout carries a single JSON payload per invocation; all logs go to
//! stderr. Exit codes are a stable contract, see `exit_codes`.

use clap::{Args, Parser, Subcommand};
use pomdp_core::exit_codes::ExitCode;
use pomdp_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use pomdp_core::persist::{SnapshotError, ValueFunctionSnapshot};
use pomdp_core::solver::SolverStatus;
use pomdp_core::{Belief, CancelToken, IncrementalPruning, Pomdp, SolverConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Exact POMDP solver via incremental pruning.
#[derive(Parser)]
#[command(name = "pomdp-solve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands.
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, env = "POMDP_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a model and report the value function
    Solve(SolveArgs),

    /// Validate a model file without solving
    Validate(ValidateArgs),

    /// Query the best action for a belief against a saved snapshot
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Path to the model JSON file
    #[arg(long)]
    model: PathBuf,

    /// Fixed iteration count; omit to iterate to convergence
    #[arg(long)]
    horizon: Option<usize>,

    /// Convergence tolerance on the Bellman residual
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    /// Worker-thread cap for the parallel stages
    #[arg(long, default_value_t = 4)]
    max_parallel: usize,

    /// Wall-clock budget in seconds; exceeding it stops between iterations
    #[arg(long)]
    time_budget: Option<u64>,

    /// Write the resulting value function as a snapshot file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Path to the model JSON file
    #[arg(long)]
    model: PathBuf,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Path to a snapshot written by `solve --output`
    #[arg(long)]
    snapshot: PathBuf,

    /// Belief as comma-separated probabilities, e.g. "0.5,0.5"
    #[arg(long)]
    belief: String,

    /// Optional model file to cross-check the snapshot against
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.global.quiet {
        LogLevel::Error
    } else {
        match cli.global.verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    };
    let log_config = LogConfig::from_env(Some(log_level), cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match cli.command {
        Commands::Solve(args) => run_solve(&args),
        Commands::Validate(args) => run_validate(&args),
        Commands::Query(args) => run_query(&args),
    };

    std::process::exit(exit_code.as_i32());
}

// ── Command implementations ──────────────────────────────────────────────

fn run_solve(args: &SolveArgs) -> ExitCode {
    let model = match load_model(&args.model) {
        Ok(model) => model,
        Err(code) => return code,
    };

    let config = SolverConfig {
        horizon: args.horizon,
        tolerance: args.tolerance,
        max_parallel: args.max_parallel,
        time_budget_secs: args.time_budget,
        ..Default::default()
    };
    let solver = match IncrementalPruning::new(config) {
        Ok(solver) => solver,
        Err(e) => {
            error!(error = %e, "invalid solver configuration");
            return ExitCode::ArgsError;
        }
    };

    let report = match solver.solve_cancellable(&model, &CancelToken::new()) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "solve failed");
            return ExitCode::InternalError;
        }
    };

    if let Some(path) = &args.output {
        let snapshot = ValueFunctionSnapshot::capture(&model, &report.value_function);
        if let Err(e) = snapshot.write_to(path) {
            error!(error = %e, path = %path.display(), "failed to write snapshot");
            return ExitCode::IoError;
        }
        info!(path = %path.display(), "snapshot written");
    }

    if emit_payload(&report).is_err() {
        return ExitCode::IoError;
    }
    match report.status {
        SolverStatus::Converged => ExitCode::Clean,
        SolverStatus::HorizonReached => ExitCode::HorizonReached,
        SolverStatus::Cancelled => ExitCode::Interrupted,
        SolverStatus::Initializing | SolverStatus::Iterating => ExitCode::InternalError,
    }
}

#[derive(Serialize)]
struct ValidatePayload {
    valid: bool,
    states: usize,
    actions: usize,
    observations: usize,
    discount: f64,
    error: Option<String>,
}

fn run_validate(args: &ValidateArgs) -> ExitCode {
    let model = match read_model_file(&args.model) {
        Ok(model) => model,
        Err(code) => return code,
    };

    let (valid, error) = match model.validate() {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };
    let payload = ValidatePayload {
        valid,
        states: model.states,
        actions: model.actions,
        observations: model.observations,
        discount: model.discount,
        error,
    };
    if emit_payload(&payload).is_err() {
        return ExitCode::IoError;
    }
    if valid {
        ExitCode::Clean
    } else {
        ExitCode::ModelError
    }
}

#[derive(Serialize)]
struct QueryPayload {
    action: usize,
    value: f64,
    stage: usize,
}

fn run_query(args: &QueryArgs) -> ExitCode {
    let snapshot = match ValueFunctionSnapshot::read_from(&args.snapshot) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, path = %args.snapshot.display(), "failed to read snapshot");
            return snapshot_exit_code(&e);
        }
    };

    let value_function = if let Some(model_path) = &args.model {
        let model = match load_model(model_path) {
            Ok(model) => model,
            Err(code) => return code,
        };
        match snapshot.restore(&model) {
            Ok(vf) => vf,
            Err(e) => {
                error!(error = %e, "snapshot does not match model");
                return snapshot_exit_code(&e);
            }
        }
    } else {
        match snapshot.value_function() {
            Ok(vf) => vf,
            Err(e) => {
                error!(error = %e, "malformed snapshot");
                return snapshot_exit_code(&e);
            }
        }
    };

    let belief = match parse_belief(&args.belief) {
        Ok(belief) => belief,
        Err(message) => {
            error!(error = %message, "invalid belief");
            return ExitCode::ArgsError;
        }
    };

    let best = match value_function.best_action(&belief) {
        Ok(Some(best)) => best,
        Ok(None) => {
            error!("snapshot contains no vectors");
            return ExitCode::SnapshotError;
        }
        Err(e) => {
            error!(error = %e, "belief incompatible with snapshot");
            return ExitCode::ArgsError;
        }
    };

    let payload = QueryPayload {
        action: best.action,
        value: best.value,
        stage: value_function.stage(),
    };
    if emit_payload(&payload).is_err() {
        return ExitCode::IoError;
    }
    ExitCode::Clean
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn read_model_file(path: &Path) -> Result<Pomdp, ExitCode> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        error!(error = %e, path = %path.display(), "failed to read model file");
        ExitCode::IoError
    })?;
    serde_json::from_str(&json).map_err(|e| {
        error!(error = %e, path = %path.display(), "failed to parse model file");
        ExitCode::ModelError
    })
}

fn load_model(path: &Path) -> Result<Pomdp, ExitCode> {
    let model = read_model_file(path)?;
    model.validate().map_err(|e| {
        error!(error = %e, path = %path.display(), "model failed validation");
        ExitCode::ModelError
    })?;
    Ok(model)
}

fn parse_belief(raw: &str) -> Result<Belief, String> {
    let probs: Vec<f64> = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("bad probability {:?}: {}", part.trim(), e))
        })
        .collect::<Result<_, _>>()?;
    Belief::from_probs(probs).map_err(|e| e.to_string())
}

fn snapshot_exit_code(error: &SnapshotError) -> ExitCode {
    match error {
        SnapshotError::Io(_) => ExitCode::IoError,
        _ => ExitCode::SnapshotError,
    }
}

fn emit_payload<T: Serialize>(payload: &T) -> Result<(), ExitCode> {
    match serde_json::to_string_pretty(payload) {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "failed to serialize payload");
            Err(ExitCode::InternalError)
        }
    }
}
