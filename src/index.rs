//! Aggregation index: target field → title → entry.
//!
//! Keys are kept in `BTreeMap`s so the same tree always renders the same
//! bytes. A collision on (target field, title) unions the contributing
//! channels; the payload follows the configured [`MergePolicy`].
use crate::config::MergePolicy;
use crate::descriptor::ParsedDescriptor;
use crate::util::display_path;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// One descriptor's contribution to a target field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub source_fields: Vec<String>,
    pub file_path: PathBuf,
    pub channels: BTreeSet<String>,
}

pub type TitleMap = BTreeMap<String, Entry>;

/// Persisted report shape for one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub source_fields: Vec<String>,
    pub file_name: String,
}

/// Persisted report shape: target field → title → entry.
pub type TargetFieldMapping = BTreeMap<String, BTreeMap<String, MappingEntry>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationIndex {
    policy: MergePolicy,
    targets: BTreeMap<String, TitleMap>,
}

impl AggregationIndex {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            targets: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of (target field, title) entries.
    pub fn entry_count(&self) -> usize {
        self.targets.values().map(BTreeMap::len).sum()
    }

    /// Record `descriptor` as seen from `channel`. Returns `false` when the
    /// descriptor has no target field and was skipped.
    pub fn accumulate(&mut self, descriptor: &ParsedDescriptor, channel: &str) -> bool {
        if !descriptor.has_target() {
            return false;
        }
        let entry = Entry {
            source_fields: descriptor.source_fields.clone(),
            file_path: descriptor.path.clone(),
            channels: BTreeSet::from([channel.to_string()]),
        };
        self.insert(&descriptor.target_field, &descriptor.title, entry);
        true
    }

    /// Fold `other` into `self` as if its entries were accumulated after ours.
    pub fn merge(&mut self, other: AggregationIndex) {
        for (target, titles) in other.targets {
            for (title, entry) in titles {
                self.insert(&target, &title, entry);
            }
        }
    }

    fn insert(&mut self, target: &str, title: &str, incoming: Entry) {
        let titles = self.targets.entry(target.to_string()).or_default();
        match titles.get_mut(title) {
            None => {
                titles.insert(title.to_string(), incoming);
            }
            Some(existing) => {
                tracing::debug!(
                    target_field = target,
                    title,
                    kept = %existing.file_path.display(),
                    incoming = %incoming.file_path.display(),
                    policy = ?self.policy,
                    "merging duplicate title"
                );
                existing.channels.extend(incoming.channels);
                if self.policy == MergePolicy::LastWriteWins {
                    existing.source_fields = incoming.source_fields;
                    existing.file_path = incoming.file_path;
                }
            }
        }
    }

    pub fn query_by_target(&self, target_field: &str) -> Option<&TitleMap> {
        self.targets.get(target_field)
    }

    pub fn query_all(&self) -> &BTreeMap<String, TitleMap> {
        &self.targets
    }

    /// Report shape with file names shown relative to `root`.
    pub fn to_mapping(&self, root: &Path) -> TargetFieldMapping {
        self.targets
            .iter()
            .map(|(target, titles)| {
                let titles = titles
                    .iter()
                    .map(|(title, entry)| {
                        let mapped = MappingEntry {
                            source_fields: entry.source_fields.clone(),
                            file_name: display_path(&entry.file_path, Some(root)),
                        };
                        (title.clone(), mapped)
                    })
                    .collect();
                (target.clone(), titles)
            })
            .collect()
    }
}
