//! Command steps behind the CLI.
//!
//! Each step loads config, runs one query, and emits the result in the
//! requested output mode. A `find` with no match is reported and mapped to a
//! distinct exit status rather than an error.
use crate::cli::{AuditArgs, FindArgs, OutputMode, QueryArgs};
use anyhow::{Context, Result};
use std::process::ExitCode;
use target_field_index::config::load_config_or_default;
use target_field_index::error::QueryError;
use target_field_index::output::{mapping_path, render_text, JsonFilePersister, Persist};
use target_field_index::query::{QueryEngine, QueryOutcome};

/// Exit status for a `find` that matched nothing.
pub const NOT_FOUND_EXIT: u8 = 2;

pub fn run_find(args: &FindArgs) -> Result<ExitCode> {
    let engine = engine_for(&args.query)?;
    match engine.find(&args.query.root, &args.target_field, &args.query.channel) {
        Ok(outcome) => {
            emit(&args.query, &outcome)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ QueryError::NotFound { .. }) => {
            eprintln!("{err}");
            Ok(ExitCode::from(NOT_FOUND_EXIT))
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!(
            "find {} under {}",
            args.target_field,
            args.query.root.display()
        ))),
    }
}

pub fn run_audit(args: &AuditArgs) -> Result<ExitCode> {
    let engine = engine_for(&args.query)?;
    let outcome = engine
        .audit(&args.query.root, &args.query.channel)
        .with_context(|| format!("audit {}", args.query.root.display()))?;
    emit(&args.query, &outcome)?;
    Ok(ExitCode::SUCCESS)
}

fn engine_for(args: &QueryArgs) -> Result<QueryEngine> {
    let config = load_config_or_default(args.config.as_deref())?;
    Ok(QueryEngine::new(config))
}

fn emit(args: &QueryArgs, outcome: &QueryOutcome) -> Result<()> {
    match args.output {
        OutputMode::Terminal if args.json => {
            let text = serde_json::to_string_pretty(&outcome.mapping())
                .context("serialize target field mapping")?;
            println!("{text}");
        }
        OutputMode::Terminal => print!("{}", render_text(outcome)),
        OutputMode::File => {
            let path = mapping_path(&args.out_dir, &args.channel);
            JsonFilePersister
                .persist(&path, &outcome.mapping())
                .context("persist target field mapping")?;
            println!(
                "Wrote {} entries to {} ({} skipped)",
                outcome.index.entry_count(),
                path.display(),
                outcome.diagnostics.len()
            );
        }
    }
    Ok(())
}
