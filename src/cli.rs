//! CLI argument parsing for the target-field index.
//!
//! The CLI is thin: it validates inputs and hands them to the query engine,
//! which owns all resolution and merge policy.
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "tfx",
    version,
    about = "Find and audit target-field descriptors across resource channels",
    after_help = "Commands:\n  find --root <dir> --target-field <name>  List descriptors producing one target field\n  audit --root <dir>                       Map every target field to its descriptors\n\nExamples:\n  tfx find --root ./extract --target-field price_kg --channel all\n  tfx audit --root ./extract --channel DE,ES --output file --out-dir reports",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Find(FindArgs),
    Audit(AuditArgs),
}

/// Where results go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    #[default]
    Terminal,
    File,
}

/// Inputs shared by every query.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Extraction root containing resources/ and resources_<CHANNEL>/ directories
    #[arg(long, value_name = "DIR")]
    pub root: PathBuf,

    /// Channel name, comma-separated list, or "all"
    #[arg(long, value_name = "SPEC", default_value = "global")]
    pub channel: String,

    /// Print results or write target_fields_mapping_<channel>.json
    #[arg(long, value_enum, default_value_t = OutputMode::Terminal)]
    pub output: OutputMode,

    /// Directory for mapping files in file mode
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// JSON config with channel rules and descriptor field names
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the mapping JSON instead of the text summary (terminal mode)
    #[arg(long)]
    pub json: bool,

    /// Log per-channel progress to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "List every descriptor producing one target field")]
pub struct FindArgs {
    /// Target field to look up
    #[arg(long, value_name = "NAME", value_parser = non_empty)]
    pub target_field: String,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Map every target field to the descriptors producing it")]
pub struct AuditArgs {
    #[command(flatten)]
    pub query: QueryArgs,
}

impl Command {
    pub fn query(&self) -> &QueryArgs {
        match self {
            Command::Find(args) => &args.query,
            Command::Audit(args) => &args.query,
        }
    }
}

/// Rejects blank values; the value itself is kept verbatim.
fn non_empty(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("must be non-empty".to_string());
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_defaults_to_global_terminal() {
        let args = RootArgs::try_parse_from([
            "tfx",
            "find",
            "--root",
            "extract",
            "--target-field",
            "price_kg",
        ])
        .expect("parse");
        let Command::Find(find) = &args.command else {
            panic!("expected find");
        };
        assert_eq!(find.target_field, "price_kg");
        assert_eq!(find.query.channel, "global");
        assert_eq!(find.query.output, OutputMode::Terminal);
        assert_eq!(find.query.out_dir, PathBuf::from("."));
    }

    #[test]
    fn audit_accepts_file_output() {
        let args = RootArgs::try_parse_from([
            "tfx", "audit", "--root", "x", "--channel", "DE,ES", "--output", "file",
        ])
        .expect("parse");
        assert_eq!(args.command.query().output, OutputMode::File);
        assert_eq!(args.command.query().channel, "DE,ES");
    }

    #[test]
    fn find_rejects_blank_target_field() {
        let err = RootArgs::try_parse_from([
            "tfx",
            "find",
            "--root",
            "x",
            "--target-field",
            "  ",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn find_keeps_target_field_verbatim() {
        let args = RootArgs::try_parse_from([
            "tfx",
            "find",
            "--root",
            "x",
            "--target-field",
            " price_kg",
        ])
        .expect("parse");
        let Command::Find(find) = &args.command else {
            panic!("expected find");
        };
        assert_eq!(find.target_field, " price_kg");
    }
}
