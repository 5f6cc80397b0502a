//! Channel resolution.
//!
//! Maps a channel spec (`"global"`, `"DE,ES"`, `"all"`) onto the resource
//! directories to scan. Naming rules live in a declarative table so a new
//! legacy alias is a config change.
use crate::config::{IndexConfig, Resolution};
use crate::error::{Diagnostic, DiagnosticKind, FilesystemError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const ALL_CHANNELS: &str = "all";
pub const DEFAULT_CHANNEL: &str = "global";
pub const RESOURCES_DIR: &str = "resources";
pub const RESOURCES_PREFIX: &str = "resources_";

/// One row of the channel table: either a directory or an alias of another row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
}

impl ChannelRule {
    pub fn directory(name: &str, directory: &str) -> Self {
        Self {
            name: name.to_string(),
            directory: Some(directory.to_string()),
            alias_of: None,
        }
    }

    pub fn alias(name: &str, alias_of: &str) -> Self {
        Self {
            name: name.to_string(),
            directory: None,
            alias_of: Some(alias_of.to_string()),
        }
    }
}

/// A channel label plus the directories that feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelScope {
    pub name: String,
    pub roots: Vec<PathBuf>,
    /// Membership resolution: only descriptors listing this channel contribute.
    pub member_filter: Option<String>,
}

#[derive(Debug, Default)]
pub struct ResolvedChannels {
    pub scopes: Vec<ChannelScope>,
    pub diagnostics: Vec<Diagnostic>,
    /// Directories already read in full by an unfiltered scope.
    scheduled: BTreeSet<PathBuf>,
}

impl ResolvedChannels {
    /// Scope labels in processing order, each listed once.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for scope in &self.scopes {
            if !names.iter().any(|name| name.eq_ignore_ascii_case(&scope.name)) {
                names.push(scope.name.clone());
            }
        }
        names
    }

    fn push(&mut self, scope: ChannelScope) {
        if scope.member_filter.is_none() {
            self.scheduled.extend(scope.roots.iter().cloned());
        }
        self.scopes.push(scope);
    }

    fn contains(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.name.eq_ignore_ascii_case(name))
    }
}

/// Split a channel spec into names: trimmed, empty items dropped,
/// case-insensitive duplicates removed, caller order kept.
pub fn parse_channel_spec(spec: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for raw in spec.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        if names.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            continue;
        }
        names.push(name.to_string());
    }
    if names.is_empty() {
        names.push(DEFAULT_CHANNEL.to_string());
    }
    names
}

/// Resolves channel specs against one rule table.
pub struct ChannelResolver<'a> {
    rules: &'a [ChannelRule],
    resolution: Resolution,
    max_depth: usize,
}

impl<'a> ChannelResolver<'a> {
    pub fn new(config: &'a IndexConfig) -> Self {
        Self {
            rules: &config.channels,
            resolution: config.resolution,
            max_depth: config.max_depth,
        }
    }

    /// Expand `spec` into ordered channel scopes under `root`.
    ///
    /// Fails only when `root` itself is inaccessible. Missing channel
    /// directories become diagnostics.
    pub fn resolve(&self, root: &Path, spec: &str) -> Result<ResolvedChannels, FilesystemError> {
        check_root(root)?;
        let mut resolved = ResolvedChannels::default();
        for name in parse_channel_spec(spec) {
            if name.eq_ignore_ascii_case(ALL_CHANNELS) {
                self.resolve_all(root, &mut resolved);
                continue;
            }
            let label = self.canonical_name(&name);
            if resolved.contains(&label) {
                continue;
            }
            let scope = match self.resolution {
                Resolution::Directory => self.directory_scope(root, &label, &mut resolved),
                Resolution::Membership => self.membership_scope(root, &label, &mut resolved),
            };
            resolved.push(scope);
        }
        Ok(resolved)
    }

    /// Table name for a known channel, upper-cased name otherwise.
    pub fn canonical_name(&self, name: &str) -> String {
        match self.rule(name) {
            Some(rule) => rule.name.clone(),
            None => name.to_ascii_uppercase(),
        }
    }

    /// Directory a named channel maps to, following one alias hop.
    pub fn directory_for(&self, root: &Path, name: &str) -> PathBuf {
        let rule = self.rule(name).and_then(|rule| match &rule.alias_of {
            Some(target) => self.rule(target),
            None => Some(rule),
        });
        match rule.and_then(|rule| rule.directory.as_deref()) {
            Some(directory) => root.join(directory),
            None => root.join(format!("{RESOURCES_PREFIX}{}", name.to_ascii_uppercase())),
        }
    }

    fn rule(&self, name: &str) -> Option<&'a ChannelRule> {
        self.rules
            .iter()
            .find(|rule| rule.name.eq_ignore_ascii_case(name.trim()))
    }

    fn directory_scope(
        &self,
        root: &Path,
        label: &str,
        resolved: &mut ResolvedChannels,
    ) -> ChannelScope {
        let directory = self.directory_for(root, label);
        let roots = if directory.is_dir() {
            vec![directory]
        } else {
            tracing::warn!(
                channel = label,
                path = %directory.display(),
                "channel directory missing; channel contributes no files"
            );
            resolved.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::MissingChannel,
                channel: label.to_string(),
                message: format!("channel directory {} does not exist", directory.display()),
                path: directory,
            });
            Vec::new()
        };
        ChannelScope {
            name: label.to_string(),
            roots,
            member_filter: None,
        }
    }

    fn membership_scope(
        &self,
        root: &Path,
        label: &str,
        resolved: &mut ResolvedChannels,
    ) -> ChannelScope {
        let roots: Vec<PathBuf> = self
            .discover_resource_dirs(root, &mut resolved.diagnostics)
            .into_iter()
            .map(|(_, path)| path)
            .collect();
        if roots.is_empty() {
            tracing::warn!(
                channel = label,
                root = %root.display(),
                "no resource directories found for membership lookup"
            );
            resolved.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::MissingChannel,
                channel: label.to_string(),
                path: root.to_path_buf(),
                message: "no resource directories under extraction root".to_string(),
            });
        }
        ChannelScope {
            name: label.to_string(),
            roots,
            member_filter: Some(label.to_string()),
        }
    }

    fn resolve_all(&self, root: &Path, resolved: &mut ResolvedChannels) {
        let discovered = self.discover_resource_dirs(root, &mut resolved.diagnostics);
        for (label, path) in discovered {
            if !resolved.scheduled.insert(path.clone()) {
                continue;
            }
            // A label already in use keeps its scope; the directory joins it.
            match resolved.scopes.iter_mut().find(|scope| {
                scope.member_filter.is_none() && scope.name.eq_ignore_ascii_case(&label)
            }) {
                Some(scope) => scope.roots.push(path),
                None => resolved.scopes.push(ChannelScope {
                    name: label,
                    roots: vec![path],
                    member_filter: None,
                }),
            }
        }
    }

    /// Every `resources` / `resources_*` directory below `root`, in sorted
    /// walk order, paired with its channel label. Matched directories are not
    /// descended into, so nested resource directories are scanned once.
    fn discover_resource_dirs(
        &self,
        root: &Path,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<(String, PathBuf)> {
        let mut found = Vec::new();
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    diagnostics.push(Diagnostic {
                        kind: DiagnosticKind::WalkEntry,
                        channel: ALL_CHANNELS.to_string(),
                        path,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(base) = entry.file_name().to_str() else {
                continue;
            };
            if base == RESOURCES_DIR || base.starts_with(RESOURCES_PREFIX) {
                let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
                found.push((self.label_for_dir(base, rel), entry.path().to_path_buf()));
                walker.skip_current_dir();
            }
        }
        found
    }

    /// Channel label for a discovered directory: the table row naming it,
    /// else the `resources_` suffix, else the default channel.
    fn label_for_dir(&self, base: &str, rel: &Path) -> String {
        let by_rule = self.rules.iter().find(|rule| {
            rule.directory
                .as_deref()
                .is_some_and(|directory| Path::new(directory) == rel)
        });
        if let Some(rule) = by_rule {
            return rule.name.clone();
        }
        match base.strip_prefix(RESOURCES_PREFIX) {
            Some(suffix) if !suffix.is_empty() => self.canonical_name(suffix),
            _ => DEFAULT_CHANNEL.to_string(),
        }
    }
}

fn check_root(root: &Path) -> Result<(), FilesystemError> {
    let metadata = fs::metadata(root).map_err(|source| FilesystemError::Access {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(FilesystemError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }
    fs::read_dir(root).map_err(|source| FilesystemError::Access {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}
