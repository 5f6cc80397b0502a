//! Rendering and persistence of query results.
//!
//! The engine hands back a [`QueryOutcome`]; this module turns it into text
//! for the terminal or writes the mapping JSON through [`Persist`].
use crate::error::PersistenceError;
use crate::index::TargetFieldMapping;
use crate::query::QueryOutcome;
use crate::util::{display_path, file_label};
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const MAPPING_FILE_PREFIX: &str = "target_fields_mapping_";

/// Capability for writing a mapping somewhere durable.
pub trait Persist {
    fn persist(&self, path: &Path, mapping: &TargetFieldMapping) -> Result<(), PersistenceError>;
}

/// Writes pretty JSON through a uniquely named sibling temp file and a
/// rename, so a failed write never leaves a truncated mapping behind and
/// concurrent writers to one directory do not share a temp file.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFilePersister;

impl Persist for JsonFilePersister {
    fn persist(&self, path: &Path, mapping: &TargetFieldMapping) -> Result<(), PersistenceError> {
        let io_err = |source: std::io::Error| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut bytes =
            serde_json::to_vec_pretty(mapping).map_err(|source| PersistenceError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        bytes.push(b'\n');
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(io_err)?;
        let mut staged = NamedTempFile::new_in(parent).map_err(io_err)?;
        staged.write_all(&bytes).map_err(io_err)?;
        staged.persist(path).map_err(|err| io_err(err.error))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "mapping written");
        Ok(())
    }
}

/// `<out_dir>/target_fields_mapping_<channel>.json`
pub fn mapping_path(out_dir: &Path, channel_spec: &str) -> PathBuf {
    out_dir.join(format!("{MAPPING_FILE_PREFIX}{}.json", file_label(channel_spec)))
}

/// Human-readable rendering of an outcome, diagnostics last.
pub fn render_text(outcome: &QueryOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "root: {}", outcome.root.display());
    let _ = writeln!(out, "channels: {}", outcome.channels.join(", "));
    let _ = writeln!(
        out,
        "files: {}; entries: {}",
        outcome.files_scanned,
        outcome.index.entry_count()
    );
    for (target, titles) in outcome.index.query_all() {
        let _ = writeln!(out, "{target}:");
        for (title, entry) in titles {
            let channels: Vec<&str> = entry.channels.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  - {title} [{}]", channels.join(", "));
            let sources = if entry.source_fields.is_empty() {
                "<none>".to_string()
            } else {
                entry.source_fields.join(", ")
            };
            let _ = writeln!(out, "      sources: {sources}");
            let _ = writeln!(
                out,
                "      file: {}",
                display_path(&entry.file_path, Some(&outcome.root))
            );
        }
    }
    if !outcome.diagnostics.is_empty() {
        let _ = writeln!(out, "skipped ({}):", outcome.diagnostics.len());
        for diagnostic in &outcome.diagnostics {
            let _ = writeln!(
                out,
                "  - [{}] {}: {}",
                diagnostic.channel,
                display_path(&diagnostic.path, Some(&outcome.root)),
                diagnostic.message
            );
        }
    }
    out
}
