//! batchrun - run a solver over every case in a folder and report the results.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use batchrun_core::RunParams;
use batchrun_runner::config::{
    default_concurrency, parse_duration, Config, DEFAULT_INTERPRETER,
};
use batchrun_runner::json_output;

/// batchrun - batch solver test harness
#[derive(Parser)]
#[command(name = "batchrun")]
#[command(about = "Run a solver over every case in a folder and report the results", long_about = None)]
#[command(version)]
struct Cli {
    /// Folder containing one case file per entry
    #[arg(long, default_value = "./warehouses")]
    folder: PathBuf,

    /// Macro moves: true uses macro moves, false uses elementary moves
    #[arg(long = "macro", default_value = "true", value_parser = ["true", "false"])]
    macro_flag: String,

    /// Taboo moves: true allows taboo moves, false forbids them
    #[arg(long = "taboo", default_value = "false", value_parser = ["true", "false"])]
    taboo_flag: String,

    /// Solver program (or script when --interpreter is given)
    #[arg(long, default_value = "./runner.py")]
    solver: PathBuf,

    /// Interpreter to launch the solver with; pass an empty value to run the
    /// solver directly
    #[arg(long, default_value = DEFAULT_INTERPRETER)]
    interpreter: String,

    /// Search algorithm passed to the solver (e.g. astar, bfs)
    #[arg(long, default_value = "astar")]
    algorithm: String,

    /// Timeout for each case (e.g. 3m, 90s, 1m30s, 500ms; bare numbers are seconds)
    #[arg(long, default_value = "3m", value_parser = parse_duration)]
    timeout: Duration,

    /// Report workbook to add this run's sheet to
    #[arg(short, long, default_value = "./result.json")]
    output: PathBuf,

    /// Maximum concurrent solver processes (defaults to available CPUs)
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Emit JSON-lines progress events on stdout
    #[arg(long)]
    json: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            folder: self.folder,
            params: RunParams::new(self.macro_flag, self.taboo_flag, self.algorithm),
            solver: self.solver,
            interpreter: Some(self.interpreter).filter(|i| !i.trim().is_empty()),
            timeout: self.timeout,
            output: self.output,
            concurrency: self.concurrency.unwrap_or_else(default_concurrency),
            json: self.json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for --json events
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config();
    if config.json {
        json_output::enable_json_mode();
    }

    if let Err(e) = batchrun_runner::run(&config).await {
        error!(error = %e, "Batch run failed");
        json_output::error(&e.to_string()).emit();
        return Err(e.into());
    }
    Ok(())
}
