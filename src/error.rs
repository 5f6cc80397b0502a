//! Failure tiers for the index pipeline.
//!
//! File-level failures (`ReadError`) skip one descriptor, channel-level
//! failures skip one channel, and only a root-level `FilesystemError` or a
//! query-level `NotFound` ends an operation.
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// One descriptor could not be read or understood.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("read descriptor {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse descriptor {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed descriptor {}: {detail}", path.display())]
    Malformed { path: PathBuf, detail: String },
}

impl ReadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ReadError::Io { path, .. }
            | ReadError::Parse { path, .. }
            | ReadError::Malformed { path, .. } => path,
        }
    }
}

/// A directory needed by the operation is inaccessible.
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("extraction root {} is not a directory", path.display())]
    RootNotDirectory { path: PathBuf },
    #[error("access {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Operation-level outcome that is not a successful result.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
    #[error("target field {target_field:?} not found in channels [{}]", channels.join(", "))]
    NotFound {
        target_field: String,
        channels: Vec<String>,
    },
}

/// Writing an output mapping failed; the in-memory index is untouched.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialize mapping for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("write mapping {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which tier produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A named channel resolved to a directory that does not exist.
    MissingChannel,
    /// A channel directory could not be walked.
    ChannelUnreadable,
    /// An entry below a channel directory could not be walked.
    WalkEntry,
    /// A descriptor failed to read or parse.
    UnreadableDescriptor,
    /// A descriptor parsed but declares no target field.
    EmptyTargetField,
}

/// Observable record of something the operation skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub channel: String,
    pub path: PathBuf,
    pub message: String,
}
