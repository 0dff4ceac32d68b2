mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use recon_core::config::{ComputeMaster, RunArguments};
use recon_core::{run_validation, ReconResult};

use output::{format_run_output, OutputMode};

#[derive(Parser, Debug)]
#[command(
    name = "recon",
    version = env!("RECON_VERSION"),
    about = "Row-count and content reconciliation between two datasets"
)]
struct Cli {
    /// Validation config file (XML or YAML).
    #[arg(short, long)]
    config: PathBuf,
    /// Process datetime override, "YYYY-MM-DD HH:MM:SS".
    #[arg(short, long)]
    datetime: Option<String>,
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Print only the overall result line.
    #[arg(short, long)]
    quiet: bool,
    #[arg(short = 'm', long = "spark-master", value_enum, default_value_t = Master::Local)]
    spark_master: Master,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Master {
    Local,
    Yarn,
}

impl From<Master> for ComputeMaster {
    fn from(master: Master) -> Self {
        match master {
            Master::Local => ComputeMaster::Local,
            Master::Yarn => ComputeMaster::Yarn,
        }
    }
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.quiet {
            OutputMode::Quiet
        } else if self.verbose {
            OutputMode::Verbose
        } else {
            OutputMode::Default
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ReconResult<()> {
    let mode = cli.output_mode();
    let args = RunArguments {
        config_path: resolve_path(cli.config)?,
        override_datetime: cli.datetime,
        verbose: cli.verbose,
        compute_master: cli.spark_master.into(),
    };
    let outcome = run_validation(args)?;
    println!("{}", format_run_output(&outcome, mode));
    Ok(())
}

fn resolve_path(path: PathBuf) -> ReconResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
