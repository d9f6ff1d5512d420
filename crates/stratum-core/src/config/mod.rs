//! Configuration layers and their loading
//!
//! A configuration layer is one document: a parser choice, parser options,
//! plugins, rules, and glob-scoped `overrides`, optionally extending other
//! layers.
//!
//! ## Example Configuration
//!
//! ```jsonc
//! {
//!   "root": true,
//!   "parser": "@typescript-eslint/parser",
//!   "parserOptions": { "ecmaVersion": 2020, "sourceType": "module" },
//!   "extends": ["eslint:recommended", "plugin:react/recommended", "./base.json"],
//!   "plugins": ["react"],
//!   "rules": {
//!     "no-console": "off",
//!     "react/jsx-filename-extension": [1, { "extensions": [".tsx", ".jsx"] }]
//!   },
//!   "overrides": [
//!     { "files": ["**/*.tsx"], "rules": { "react/prop-types": "off" } }
//!   ]
//! }
//! ```
//!
//! ## Formats
//!
//! Documents may be JSON, JSONC/JSON5 (comments and trailing commas), YAML or
//! TOML. The format follows the file extension.

mod document;
mod layer;
mod loader;

pub use document::{LayerDocument, OverrideDocument, SettingsDocument, StringOrList};
pub use layer::{ConfigLayer, ExtendsRef, ExtendsTarget, LayerId, LayerSet, OverrideBlock};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader, DocumentFormat, LoadedConfig, read_document};

use crate::error::StratumError;
use crate::result::Result;

/// JSON Schema describing a configuration document
pub fn layer_schema() -> Result<serde_json::Value> {
    let schema = schemars::schema_for!(LayerDocument);
    serde_json::to_value(schema).map_err(|e| StratumError::ConfigError {
        message: format!("Failed to serialize JSON schema: {e}"),
    })
}
