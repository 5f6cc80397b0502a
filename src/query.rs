//! Query engine: `find` one target field or `audit` all of them.
//!
//! Each operation is a single pass per channel (resolve, scan, read,
//! accumulate) in the resolved channel order. Per-channel indexes are merged
//! into the result in that order so last-write-wins is reproducible.
use crate::channels::{ChannelResolver, ChannelScope};
use crate::config::IndexConfig;
use crate::descriptor::DescriptorReader;
use crate::error::{Diagnostic, DiagnosticKind, FilesystemError, QueryError};
use crate::index::{AggregationIndex, TargetFieldMapping};
use crate::scan::{scan, ScanItem};
use crate::util::display_path;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of one operation plus everything it had to skip.
#[derive(Debug)]
pub struct QueryOutcome {
    pub root: PathBuf,
    pub channels: Vec<String>,
    pub index: AggregationIndex,
    pub diagnostics: Vec<Diagnostic>,
    pub files_scanned: usize,
}

impl QueryOutcome {
    pub fn mapping(&self) -> TargetFieldMapping {
        self.index.to_mapping(&self.root)
    }
}

pub struct QueryEngine {
    config: IndexConfig,
}

impl QueryEngine {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Every descriptor producing `target_field` across the channels in `spec`.
    ///
    /// No match is `QueryError::NotFound`, never an empty success.
    pub fn find(
        &self,
        root: &Path,
        target_field: &str,
        spec: &str,
    ) -> Result<QueryOutcome, QueryError> {
        let outcome = self.run(root, spec, Some(target_field))?;
        if outcome.index.query_by_target(target_field).is_none() {
            return Err(QueryError::NotFound {
                target_field: target_field.to_string(),
                channels: outcome.channels,
            });
        }
        Ok(outcome)
    }

    /// Every descriptor with a non-empty target field across the channels in `spec`.
    pub fn audit(&self, root: &Path, spec: &str) -> Result<QueryOutcome, QueryError> {
        self.run(root, spec, None).map_err(QueryError::from)
    }

    fn run(
        &self,
        root: &Path,
        spec: &str,
        target_filter: Option<&str>,
    ) -> Result<QueryOutcome, FilesystemError> {
        let resolved = ChannelResolver::new(&self.config).resolve(root, spec)?;
        let mut outcome = QueryOutcome {
            root: root.to_path_buf(),
            channels: resolved.names(),
            index: AggregationIndex::new(self.config.merge_policy),
            diagnostics: resolved.diagnostics,
            files_scanned: 0,
        };
        let mut visits = FileVisits::default();
        for scope in &resolved.scopes {
            let channel_index =
                self.process_channel(scope, target_filter, &mut visits, &mut outcome);
            outcome.index.merge(channel_index);
        }
        outcome.files_scanned = visits.seen.len();
        tracing::info!(
            channels = outcome.channels.len(),
            files = outcome.files_scanned,
            entries = outcome.index.entry_count(),
            skipped = outcome.diagnostics.len(),
            "index built"
        );
        Ok(outcome)
    }

    fn process_channel(
        &self,
        scope: &ChannelScope,
        target_filter: Option<&str>,
        visits: &mut FileVisits,
        outcome: &mut QueryOutcome,
    ) -> AggregationIndex {
        let start = Instant::now();
        let reader = DescriptorReader::new(&self.config.fields);
        let mut index = AggregationIndex::new(self.config.merge_policy);
        let mut files = 0usize;

        for dir in &scope.roots {
            for item in scan(dir, self.config.max_depth) {
                let path = match item {
                    ScanItem::Descriptor(path) => path,
                    ScanItem::Skipped(err) => {
                        record_walk_failure(&scope.name, err, &mut outcome.diagnostics);
                        continue;
                    }
                };
                files += 1;
                visits.seen.insert(path.clone());
                let descriptor = match reader.read(&path) {
                    Ok(descriptor) => descriptor,
                    Err(err) => {
                        if visits.reported.insert(path.clone()) {
                            tracing::warn!(
                                channel = %scope.name,
                                error = %err,
                                "skipping descriptor"
                            );
                            outcome.diagnostics.push(Diagnostic {
                                kind: DiagnosticKind::UnreadableDescriptor,
                                channel: scope.name.clone(),
                                path,
                                message: err.to_string(),
                            });
                        }
                        continue;
                    }
                };
                if let Some(member) = scope.member_filter.as_deref() {
                    if !descriptor.is_member_of(member) {
                        tracing::debug!(
                            channel = member,
                            path = %path.display(),
                            "not a channel member"
                        );
                        continue;
                    }
                }
                if !descriptor.has_target() {
                    if visits.reported.insert(path.clone()) {
                        tracing::warn!(
                            channel = %scope.name,
                            path = %display_path(&path, Some(&outcome.root)),
                            "descriptor has no target field"
                        );
                        outcome.diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::EmptyTargetField,
                            channel: scope.name.clone(),
                            path,
                            message: "descriptor declares no target field".to_string(),
                        });
                    }
                    continue;
                }
                if target_filter.is_some_and(|target| target != descriptor.target_field) {
                    continue;
                }
                index.accumulate(&descriptor, &scope.name);
            }
        }

        tracing::info!(
            channel = %scope.name,
            dirs = scope.roots.len(),
            files,
            entries = index.entry_count(),
            elapsed_ms = start.elapsed().as_millis(),
            "channel scanned"
        );
        index
    }
}

/// Descriptor files seen during one operation. A directory read through
/// several channels is counted and reported once per file.
#[derive(Default)]
struct FileVisits {
    seen: BTreeSet<PathBuf>,
    reported: BTreeSet<PathBuf>,
}

/// A failure on the channel directory itself skips the channel; deeper
/// failures skip one entry.
fn record_walk_failure(channel: &str, err: FilesystemError, diagnostics: &mut Vec<Diagnostic>) {
    let (kind, path) = match &err {
        FilesystemError::Walk { path, source } if source.depth() == 0 => {
            (DiagnosticKind::ChannelUnreadable, path.clone())
        }
        FilesystemError::Walk { path, .. } | FilesystemError::Access { path, .. } => {
            (DiagnosticKind::WalkEntry, path.clone())
        }
        FilesystemError::RootNotDirectory { path } => (DiagnosticKind::WalkEntry, path.clone()),
    };
    tracing::warn!(channel, error = %err, "skipping unreadable path");
    diagnostics.push(Diagnostic {
        kind,
        channel: channel.to_string(),
        path,
        message: err.to_string(),
    });
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
