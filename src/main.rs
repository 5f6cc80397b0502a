use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.command.query().verbose);

    match &args.command {
        Command::Find(find) => workflow::run_find(find),
        Command::Audit(audit) => workflow::run_audit(audit),
    }
}

/// Logs go to stderr so terminal output on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
