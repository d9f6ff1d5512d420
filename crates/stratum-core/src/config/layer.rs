//! Loaded, immutable configuration layers

use super::document::{LayerDocument, OverrideDocument, SettingsDocument};
use crate::error::StratumError;
use crate::matcher::GlobMatcher;
use crate::paths;
use crate::registry::Registry;
use crate::result::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identity of a layer: its name, or its normalized path for file layers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity of a layer loaded from `path`
    pub fn from_path(path: &Path) -> Self {
        Self(paths::normalize(path).display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where an `extends` entry points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendsTarget {
    /// A named layer or a registry shareable configuration
    Named(String),
    /// A configuration file, already joined with the referencing layer's directory
    File(PathBuf),
}

/// One `extends` entry, as written and as resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendsRef {
    raw: String,
    target: ExtendsTarget,
}

const FILE_EXTENSIONS: [&str; 6] = [".json", ".jsonc", ".json5", ".yaml", ".yml", ".toml"];

impl ExtendsRef {
    /// Classify a reference written in a layer whose base directory is `base_dir`
    pub fn parse(raw: &str, base_dir: Option<&Path>) -> Self {
        let is_file = raw.starts_with("./")
            || raw.starts_with("../")
            || Path::new(raw).is_absolute()
            || FILE_EXTENSIONS.iter().any(|ext| raw.ends_with(ext));

        let target = if is_file {
            let joined = match base_dir {
                Some(dir) => dir.join(raw),
                None => PathBuf::from(raw),
            };
            ExtendsTarget::File(paths::normalize(&joined))
        } else {
            ExtendsTarget::Named(raw.to_string())
        };

        Self {
            raw: raw.to_string(),
            target,
        }
    }

    /// The reference as written in the configuration
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn target(&self) -> &ExtendsTarget {
        &self.target
    }

    /// The id a layer satisfying this reference would carry
    pub fn layer_id(&self) -> LayerId {
        match &self.target {
            ExtendsTarget::Named(name) => LayerId::new(name.clone()),
            ExtendsTarget::File(path) => LayerId::from_path(path),
        }
    }
}

/// A glob-scoped partial configuration belonging to one layer
#[derive(Debug, Clone)]
pub struct OverrideBlock {
    index: usize,
    files: GlobMatcher,
    excluded_files: GlobMatcher,
    settings: SettingsDocument,
}

impl OverrideBlock {
    fn from_document(index: usize, document: OverrideDocument, layer: &str) -> Result<Self> {
        let (files, excluded, settings) = document.into_parts();
        let files = GlobMatcher::new(&files, layer)?;
        let excluded_files = GlobMatcher::new(&excluded, layer)?;

        if files.is_empty() {
            tracing::debug!("Override {} in layer '{}' has no file patterns", index, layer);
        }

        Ok(Self {
            index,
            files,
            excluded_files,
            settings,
        })
    }

    /// Position of the block within its layer's `overrides`
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn files(&self) -> &GlobMatcher {
        &self.files
    }

    pub fn settings(&self) -> &SettingsDocument {
        &self.settings
    }

    /// Whether the block applies to a path relative to its layer's base directory.
    ///
    /// An empty `files` set never matches.
    pub fn applies_to(&self, relative_path: &str) -> bool {
        self.files.matches(relative_path) && !self.excluded_files.matches(relative_path)
    }
}

/// One immutable configuration layer
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    id: LayerId,
    base_dir: Option<PathBuf>,
    root: bool,
    extends: Vec<ExtendsRef>,
    settings: SettingsDocument,
    overrides: Vec<OverrideBlock>,
}

impl ConfigLayer {
    /// Build a layer from its document.
    ///
    /// `base_dir` anchors relative `extends` paths and override globs; layers
    /// without one (registry shareable configs, in-memory layers) borrow the
    /// root layer's directory for glob matching. Invalid globs fail here.
    pub fn from_document(
        id: impl Into<LayerId>,
        base_dir: Option<PathBuf>,
        document: LayerDocument,
    ) -> Result<Self> {
        let id = id.into();
        let root = document.root.unwrap_or(false);
        let (extends, settings, overrides) = document.into_parts();

        let extends = extends
            .iter()
            .map(|raw| ExtendsRef::parse(raw, base_dir.as_deref()))
            .collect();

        let overrides = overrides
            .into_iter()
            .enumerate()
            .map(|(index, doc)| OverrideBlock::from_document(index, doc, id.as_str()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            base_dir,
            root,
            extends,
            settings,
            overrides,
        })
    }

    /// Build a layer from a JSON value, mostly useful for in-memory configurations
    pub fn from_value(
        id: impl Into<LayerId>,
        base_dir: Option<PathBuf>,
        value: Value,
    ) -> Result<Self> {
        let id = id.into();
        let document: LayerDocument = serde_json::from_value(value).map_err(|e| {
            StratumError::config_error(format!("Invalid configuration for layer '{id}': {e}"))
        })?;
        Self::from_document(id, base_dir, document)
    }

    pub fn id(&self) -> &LayerId {
        &self.id
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Whether the document declared `root: true`
    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn extends(&self) -> &[ExtendsRef] {
        &self.extends
    }

    /// The layer's own settings, excluding overrides
    pub fn settings(&self) -> &SettingsDocument {
        &self.settings
    }

    pub fn overrides(&self) -> &[OverrideBlock] {
        &self.overrides
    }
}

/// The set of layers available to `extends` lookups.
///
/// Named references resolve against the set first and fall back to the
/// registry's shareable configurations; file references resolve by path.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    layers: IndexMap<LayerId, Arc<ConfigLayer>>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer; ids must be unique within the set
    pub fn insert(&mut self, layer: ConfigLayer) -> Result<Arc<ConfigLayer>> {
        if self.layers.contains_key(layer.id()) {
            return Err(StratumError::config_error(format!(
                "Layer '{}' is defined more than once",
                layer.id()
            )));
        }
        let layer = Arc::new(layer);
        self.layers.insert(layer.id().clone(), Arc::clone(&layer));
        Ok(layer)
    }

    /// Builder-style insert for in-memory sets
    pub fn with_layer(mut self, layer: ConfigLayer) -> Result<Self> {
        self.insert(layer)?;
        Ok(self)
    }

    pub fn get(&self, id: &LayerId) -> Option<Arc<ConfigLayer>> {
        self.layers.get(id).cloned()
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.layers.contains_key(id)
    }

    /// Find the layer an `extends` entry refers to
    pub fn lookup(&self, reference: &ExtendsRef, registry: &Registry) -> Option<Arc<ConfigLayer>> {
        match reference.target() {
            ExtendsTarget::File(path) => self.get(&LayerId::from_path(path)),
            ExtendsTarget::Named(name) => self
                .get(&LayerId::new(name.clone()))
                .or_else(|| registry.shareable_config(name)),
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ConfigLayer>> {
        self.layers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extends_classification() {
        let base = Path::new("/proj/app");

        let r = ExtendsRef::parse("./base.json", Some(base));
        assert_eq!(r.target(), &ExtendsTarget::File(PathBuf::from("/proj/app/base.json")));

        let r = ExtendsRef::parse("../shared/strict.yaml", Some(base));
        assert_eq!(
            r.target(),
            &ExtendsTarget::File(PathBuf::from("/proj/shared/strict.yaml"))
        );

        let r = ExtendsRef::parse("presets/base.toml", Some(base));
        assert_eq!(
            r.target(),
            &ExtendsTarget::File(PathBuf::from("/proj/app/presets/base.toml"))
        );

        let r = ExtendsRef::parse("plugin:react/recommended", Some(base));
        assert_eq!(
            r.target(),
            &ExtendsTarget::Named("plugin:react/recommended".to_string())
        );
        assert_eq!(r.raw(), "plugin:react/recommended");

        let r = ExtendsRef::parse("airbnb-base", None);
        assert_eq!(r.layer_id(), LayerId::new("airbnb-base"));
    }

    #[test]
    fn test_layer_from_value() {
        let layer = ConfigLayer::from_value(
            "root",
            None,
            json!({
                "root": true,
                "extends": ["a", "b"],
                "rules": { "semi": "error" },
                "overrides": [{ "files": ["*.ts"], "rules": { "semi": "off" } }]
            }),
        )
        .unwrap();

        assert!(layer.is_root());
        assert_eq!(layer.extends().len(), 2);
        assert_eq!(layer.settings().rules.len(), 1);
        assert_eq!(layer.overrides().len(), 1);
        assert!(layer.overrides()[0].applies_to("src/a.ts"));
        assert!(!layer.overrides()[0].applies_to("src/a.js"));
    }

    #[test]
    fn test_invalid_glob_fails_at_load() {
        let err = ConfigLayer::from_value(
            "root",
            None,
            json!({ "overrides": [{ "files": ["src/[abc"], "rules": {} }] }),
        )
        .unwrap_err();
        assert!(matches!(err, StratumError::InvalidGlob { ref layer, .. } if layer == "root"));
    }

    #[test]
    fn test_excluded_files() {
        let layer = ConfigLayer::from_value(
            "root",
            None,
            json!({ "overrides": [{ "files": ["*.ts"], "excludedFiles": ["*.d.ts"] }] }),
        )
        .unwrap();

        let block = &layer.overrides()[0];
        assert!(block.applies_to("src/index.ts"));
        assert!(!block.applies_to("types/index.d.ts"));
    }

    #[test]
    fn test_empty_files_never_matches() {
        let layer =
            ConfigLayer::from_value("root", None, json!({ "overrides": [{ "files": [] }] })).unwrap();
        assert!(!layer.overrides()[0].applies_to("anything.ts"));
    }

    #[test]
    fn test_layer_set_rejects_duplicates() {
        let set = LayerSet::new()
            .with_layer(ConfigLayer::from_value("a", None, json!({})).unwrap())
            .unwrap();
        let err = set
            .with_layer(ConfigLayer::from_value("a", None, json!({})).unwrap())
            .unwrap_err();
        assert!(matches!(err, StratumError::ConfigError { .. }));
    }
}
