//! # Pacer Binary
//!
//! Entry point: parse arguments, initialize tracing, dispatch commands.

use clap::Parser;
use pacer::cli::{self, Cli, Command};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG overrides; default to info.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let outcome = match args.command {
        Command::Simulate {
            timeline,
            policy,
            window_ms,
            edge,
            trailing,
        } => cli::cmd_simulate(
            &timeline,
            policy,
            window_ms,
            edge.into(),
            trailing,
            args.json,
        ),
        Command::Settle { batch } => cli::cmd_settle(&batch, args.json).await,
    };

    match outcome {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
