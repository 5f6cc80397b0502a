//! Index configuration.
//!
//! Loads, validates, and defaults the optional config file so channel rules
//! and descriptor field names are data rather than code.
use crate::channels::ChannelRule;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How a named channel selects descriptors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// A channel is the set of files under its directory.
    #[default]
    Directory,
    /// A channel is the set of descriptors listing it in their `channels` key.
    Membership,
}

/// Payload policy when two descriptors share a target field and title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    #[default]
    LastWriteWins,
    FirstWriteWins,
}

/// JSON key names read from each descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub target_field: String,
    pub source_fields: String,
    /// Tried in order when `source_fields` is absent.
    pub source_field_aliases: Vec<String>,
    pub title: String,
    pub channels: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            target_field: "target_field".to_string(),
            source_fields: "source_fields".to_string(),
            source_field_aliases: vec!["source_field".to_string()],
            title: "title".to_string(),
            channels: "channels".to_string(),
        }
    }
}

impl FieldNames {
    /// Source-field keys in lookup order.
    pub fn source_field_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.source_fields.as_str())
            .chain(self.source_field_aliases.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub schema_version: u32,
    pub channels: Vec<ChannelRule>,
    pub fields: FieldNames,
    pub resolution: Resolution,
    pub merge_policy: MergePolicy,
    pub max_depth: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        default_config()
    }
}

/// Rule table used when no config file is given.
///
/// `DE` is a legacy alias: historical extractions stored the German market in
/// the bare `resources` directory.
pub fn default_channel_rules() -> Vec<ChannelRule> {
    vec![
        ChannelRule::directory("global", "resources"),
        ChannelRule::alias("DE", "global"),
    ]
}

pub fn default_config() -> IndexConfig {
    IndexConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        channels: default_channel_rules(),
        fields: FieldNames::default(),
        resolution: Resolution::default(),
        merge_policy: MergePolicy::default(),
        max_depth: DEFAULT_MAX_DEPTH,
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<IndexConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: IndexConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("validate config {}", path.display()))?;
    Ok(config)
}

/// Load `path` when given, otherwise fall back to the defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<IndexConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(default_config()),
    }
}

pub fn validate_config(config: &IndexConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.max_depth == 0 {
        return Err(anyhow!("max_depth must be greater than zero"));
    }
    validate_field_names(&config.fields)?;
    validate_channel_rules(&config.channels)
}

fn validate_field_names(fields: &FieldNames) -> Result<()> {
    let required = [
        ("target_field", &fields.target_field),
        ("source_fields", &fields.source_fields),
        ("title", &fields.title),
        ("channels", &fields.channels),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            return Err(anyhow!("fields.{label} must be non-empty"));
        }
    }
    if fields
        .source_field_aliases
        .iter()
        .any(|alias| alias.trim().is_empty())
    {
        return Err(anyhow!("fields.source_field_aliases entries must be non-empty"));
    }
    Ok(())
}

fn validate_channel_rules(rules: &[ChannelRule]) -> Result<()> {
    let mut names = BTreeSet::new();
    for rule in rules {
        let name = rule.name.trim();
        if name.is_empty() {
            return Err(anyhow!("channel rule names must be non-empty"));
        }
        if name.contains(',') {
            return Err(anyhow!("channel rule {name:?} must not contain ','"));
        }
        if name.eq_ignore_ascii_case("all") {
            return Err(anyhow!("channel rule name \"all\" is reserved"));
        }
        if !names.insert(name.to_ascii_lowercase()) {
            return Err(anyhow!("duplicate channel rule {name:?}"));
        }
        match (&rule.directory, &rule.alias_of) {
            (Some(directory), None) => validate_relative_dir(directory, name)?,
            (None, Some(_)) => {}
            _ => {
                return Err(anyhow!(
                    "channel rule {name:?} needs exactly one of \"directory\" or \"alias_of\""
                ))
            }
        }
    }
    for rule in rules {
        let Some(target) = rule.alias_of.as_deref() else {
            continue;
        };
        let resolved = rules
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(target.trim()))
            .ok_or_else(|| {
                anyhow!(
                    "channel rule {:?} aliases unknown channel {target:?}",
                    rule.name
                )
            })?;
        if resolved.alias_of.is_some() {
            return Err(anyhow!(
                "channel rule {:?} aliases {target:?}, which is itself an alias",
                rule.name
            ));
        }
    }
    Ok(())
}

fn validate_relative_dir(directory: &str, name: &str) -> Result<()> {
    let path = Path::new(directory);
    let escapes = path
        .components()
        .any(|component| matches!(component, Component::ParentDir));
    if directory.trim().is_empty() || path.is_absolute() || escapes {
        return Err(anyhow!(
            "channel rule {name:?} directory must be a relative path without '..' (got {directory:?})"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
