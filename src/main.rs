use clap::Parser;
use std::process::ExitCode;

mod acquire;
mod cli;
mod config;
mod cycle;
mod errors;
mod external;
mod forecast;
mod generate;
mod pipeline;
mod reference;
mod util;
mod validate;
mod workflow;
mod workspace;

use cli::{Command, RootArgs};
use errors::{classify, PipelineError};

fn main() -> ExitCode {
    let args = RootArgs::parse();
    let verbose = matches!(&args.command, Command::Run(run) if run.verbose);
    init_logging(verbose);

    let result = match args.command {
        Command::Init(args) => workflow::run_init(&args),
        Command::Run(args) => workflow::run_run(&args),
        Command::ShowConfig(args) => workflow::run_show_config(&args),
        Command::History(args) => workflow::run_history(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Exit status per failure class; anything unclassified is 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match classify(err) {
        Some(
            PipelineError::OutOfRange { .. }
            | PipelineError::ConflictingConfig { .. }
            | PipelineError::MalformedCycle { .. },
        ) => 2,
        Some(PipelineError::MissingInput { .. }) => 3,
        Some(PipelineError::ExternalProcessFailure { .. }) => 4,
        None => 1,
    }
}

/// Log to stderr; `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
