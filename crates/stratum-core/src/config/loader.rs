//! Configuration file discovery and loading
//!
//! Loading is the only part of resolution that touches the file system. It
//! reads the root file and every file-referenced base transitively, so that
//! once [`ConfigLoader::load`] returns, per-file resolution is pure.

use super::document::LayerDocument;
use super::layer::{ConfigLayer, ExtendsTarget, LayerId, LayerSet};
use crate::error::StratumError;
use crate::paths;
use crate::result::Result;
use serde::de::DeserializeOwned;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file names searched by [`ConfigLoader::auto_discover`], in priority order
pub const CONFIG_FILE_NAMES: [&str; 5] = [
    ".stratumrc.json",
    ".stratumrc.jsonc",
    ".stratumrc.yaml",
    ".stratumrc.yml",
    ".stratumrc.toml",
];

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    /// JSON with comments and trailing commas
    Jsonc,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Pick a format from the file extension, if it has a known one
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(DocumentFormat::Json),
            Some("jsonc") | Some("json5") => Some(DocumentFormat::Jsonc),
            Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
            Some("toml") => Some(DocumentFormat::Toml),
            _ => None,
        }
    }

    /// Guess a format from the content of an extension-less file
    fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            DocumentFormat::Jsonc
        } else {
            DocumentFormat::Yaml
        }
    }

    /// Parse `content` in this format
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Jsonc => json5::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Read and parse a document of any supported format
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| StratumError::io_error(path, e))?;
    let format = DocumentFormat::from_path(path).unwrap_or_else(|| DocumentFormat::detect(&content));

    format.parse(&content).map_err(|e| {
        StratumError::config_error(format!(
            "Failed to parse config '{}': {}",
            path.display(),
            e
        ))
    })
}

/// A root layer together with every layer it can reach through file references
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub root: Arc<ConfigLayer>,
    pub layers: LayerSet,
    pub path: PathBuf,
}

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by traversing upward from `start_path`.
    ///
    /// Within one directory the names of [`CONFIG_FILE_NAMES`] are tried in
    /// order; the nearest directory containing any of them wins.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| StratumError::io_error(start_path, e))?;

        loop {
            for filename in &CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load one layer from a file; its id is the file's normalized absolute path
    pub fn load_layer(path: &Path) -> Result<ConfigLayer> {
        let path = Self::absolute(path)?;
        let document: LayerDocument = read_document(&path)?;
        let base_dir = path.parent().map(Path::to_path_buf);

        tracing::trace!("Loaded layer {}", path.display());
        ConfigLayer::from_document(LayerId::from_path(&path), base_dir, document)
    }

    /// Load the root config file and every file it transitively extends.
    ///
    /// Named references (`eslint:recommended`, `plugin:react/recommended`) are
    /// left for the registry. A referenced file that does not exist fails with
    /// `MissingExtend`; cycles are left for linearization to report.
    pub fn load(root_path: &Path) -> Result<LoadedConfig> {
        let root_path = Self::absolute(root_path)?;
        if !root_path.is_file() {
            return Err(StratumError::config_error(format!(
                "Config file not found: {}",
                root_path.display()
            )));
        }

        let mut layers = LayerSet::new();
        let root = layers.insert(Self::load_layer(&root_path)?)?;

        let mut seen: HashSet<LayerId> = HashSet::from([root.id().clone()]);
        let mut queue: VecDeque<Arc<ConfigLayer>> = VecDeque::from([Arc::clone(&root)]);

        while let Some(layer) = queue.pop_front() {
            for reference in layer.extends() {
                let ExtendsTarget::File(path) = reference.target() else {
                    continue;
                };

                let id = reference.layer_id();
                if !seen.insert(id) {
                    continue;
                }

                if !path.is_file() {
                    return Err(StratumError::missing_extend(
                        layer.id().as_str(),
                        reference.raw(),
                    ));
                }

                let loaded = layers.insert(Self::load_layer(path)?)?;
                queue.push_back(loaded);
            }
        }

        tracing::debug!(
            "Loaded {} layer(s) starting from {}",
            layers.len(),
            root_path.display()
        );

        Ok(LoadedConfig {
            root,
            layers,
            path: root_path,
        })
    }

    /// Load from an explicit path or auto-discover starting at `start_dir`
    pub fn load_or_discover(custom_path: Option<&Path>, start_dir: &Path) -> Result<LoadedConfig> {
        let config_path = match custom_path {
            Some(path) => path.to_path_buf(),
            None => Self::auto_discover(start_dir)?.ok_or_else(|| {
                StratumError::config_error(format!(
                    "No config file found ({}) in '{}' or any parent directory",
                    CONFIG_FILE_NAMES.join(", "),
                    start_dir.display()
                ))
            })?,
        };

        Self::load(&config_path)
    }

    fn absolute(path: &Path) -> Result<PathBuf> {
        let absolute = std::path::absolute(path).map_err(|e| StratumError::io_error(path, e))?;
        Ok(paths::normalize(&absolute))
    }
}
