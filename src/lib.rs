//! Target-field index over per-resource JSON descriptors.
//!
//! Descriptors live under `resources/` and `resources_<CHANNEL>/` directories
//! of an extraction root. The index is rebuilt on every query:
//! [`channels`] resolves a channel spec to directories, [`scan`] lists
//! descriptor files, [`descriptor`] parses them, [`index`] aggregates them,
//! and [`query`] answers `find` and `audit`.
pub mod channels;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod scan;
pub mod util;

pub use config::{IndexConfig, MergePolicy, Resolution};
pub use error::{
    Diagnostic, DiagnosticKind, FilesystemError, PersistenceError, QueryError, ReadError,
};
pub use index::{AggregationIndex, Entry, MappingEntry, TargetFieldMapping};
pub use query::{QueryEngine, QueryOutcome};
