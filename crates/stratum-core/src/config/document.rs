//! Serialized form of a configuration layer
//!
//! These types mirror the configuration file one-to-one. They carry no
//! validation beyond shape; rule names, severities and globs are checked when a
//! document becomes a [`ConfigLayer`](super::ConfigLayer) or is folded.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single string or a list of strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(value) => vec![value],
            StringOrList::Many(values) => values,
        }
    }
}

impl Default for StringOrList {
    fn default() -> Self {
        StringOrList::Many(Vec::new())
    }
}

/// One configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LayerDocument {
    /// JSON schema reference for editor support
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "JSON schema reference")]
    pub schema: Option<String>,

    /// Stop configuration discovery at this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Stop searching parent directories for configuration")]
    pub root: Option<bool>,

    /// Base configurations, most general first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Configurations to extend, by name or relative path")]
    pub extends: Option<StringOrList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Parser used for matching files")]
    pub parser: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Options handed to the parser, merged key by key")]
    pub parser_options: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Predefined environments to enable or disable")]
    pub env: IndexMap<String, bool>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Global variables and their writability")]
    pub globals: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(description = "Plugins whose rules may be referenced")]
    pub plugins: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Rule name to severity, or to [severity, ...options]")]
    pub rules: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Shared settings keyed by plugin namespace")]
    pub settings: IndexMap<String, Value>,

    /// Glob-scoped partial configurations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(description = "File-pattern-scoped configuration overrides")]
    pub overrides: Vec<OverrideDocument>,
}

/// One entry of `overrides`.
///
/// Override blocks cannot extend other configurations or nest overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OverrideDocument {
    /// Patterns selecting the files this block applies to
    #[schemars(description = "Glob patterns selecting matching files")]
    pub files: StringOrList,

    /// Patterns removing files from the selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Glob patterns excluding files matched by `files`")]
    pub excluded_files: Option<StringOrList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Parser used for matching files")]
    pub parser: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Options handed to the parser, merged key by key")]
    pub parser_options: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Predefined environments to enable or disable")]
    pub env: IndexMap<String, bool>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Global variables and their writability")]
    pub globals: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(description = "Plugins whose rules may be referenced")]
    pub plugins: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Rule name to severity, or to [severity, ...options]")]
    pub rules: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[schemars(description = "Shared settings keyed by plugin namespace")]
    pub settings: IndexMap<String, Value>,
}

/// The keys shared by layers and override blocks, detached from their document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDocument {
    pub parser: Option<String>,
    pub parser_options: IndexMap<String, Value>,
    pub env: IndexMap<String, bool>,
    pub globals: IndexMap<String, Value>,
    pub plugins: Vec<String>,
    pub rules: IndexMap<String, Value>,
    pub settings: IndexMap<String, Value>,
}

macro_rules! split_settings {
    ($doc:expr) => {
        SettingsDocument {
            parser: $doc.parser,
            parser_options: $doc.parser_options,
            env: $doc.env,
            globals: $doc.globals,
            plugins: $doc.plugins,
            rules: $doc.rules,
            settings: $doc.settings,
        }
    };
}

impl LayerDocument {
    /// Split into extends references, own settings and override blocks
    pub fn into_parts(self) -> (Vec<String>, SettingsDocument, Vec<OverrideDocument>) {
        let extends = self.extends.map(StringOrList::into_vec).unwrap_or_default();
        let overrides = self.overrides;
        let settings = split_settings!(self);
        (extends, settings, overrides)
    }
}

impl OverrideDocument {
    /// Split into file patterns, excluded patterns and settings
    pub fn into_parts(self) -> (Vec<String>, Vec<String>, SettingsDocument) {
        let files = self.files.into_vec();
        let excluded = self
            .excluded_files
            .map(StringOrList::into_vec)
            .unwrap_or_default();
        let settings = split_settings!(self);
        (files, excluded, settings)
    }
}
