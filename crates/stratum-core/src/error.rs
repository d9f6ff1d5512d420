//! Error types for configuration loading and resolution

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for configuration resolution
#[derive(Debug, Error)]
pub enum StratumError {
    /// A layer references a base configuration that cannot be found
    #[error("Layer '{layer}' extends '{reference}', which could not be found")]
    MissingExtend { layer: String, reference: String },

    /// The extends graph contains a cycle
    #[error("Cyclic extends: {}", cycle.join(" -> "))]
    CyclicExtends { cycle: Vec<String> },

    /// A rule or declaration references a plugin that is not available
    #[error("Unknown plugin '{plugin}' referenced by '{reference}' in layer '{layer}'")]
    UnknownPlugin {
        plugin: String,
        reference: String,
        layer: String,
    },

    /// A rule name is not defined by its plugin (or by the core rule set)
    #[error("Unknown rule '{rule}' in layer '{layer}'")]
    UnknownRule { rule: String, layer: String },

    /// A rule severity is not one of off/warn/error (or 0/1/2)
    #[error("Invalid severity {value} for rule '{rule}' in layer '{layer}'")]
    InvalidSeverity {
        rule: String,
        value: String,
        layer: String,
    },

    /// A file pattern could not be parsed
    #[error("Invalid glob pattern '{pattern}' in layer '{layer}': {message}")]
    InvalidGlob {
        pattern: String,
        layer: String,
        message: String,
    },

    /// The same plugin was registered twice
    #[error("Plugin '{plugin}' is already registered")]
    DuplicatePlugin { plugin: String },

    /// The same rule was registered twice within one namespace
    #[error("Rule '{rule}' is already registered")]
    DuplicateRule { rule: String },

    /// Configuration document loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingExtend,
    CyclicExtends,
    UnknownPlugin,
    UnknownRule,
    InvalidSeverity,
    InvalidGlob,
    Registry,
    Config,
    Io,
}

impl ErrorKind {
    /// Short kebab-case label, as printed by the command line interface
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingExtend => "missing-extend",
            ErrorKind::CyclicExtends => "cyclic-extends",
            ErrorKind::UnknownPlugin => "unknown-plugin",
            ErrorKind::UnknownRule => "unknown-rule",
            ErrorKind::InvalidSeverity => "invalid-severity",
            ErrorKind::InvalidGlob => "invalid-glob",
            ErrorKind::Registry => "registry",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }
}

impl StratumError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StratumError::MissingExtend { .. } => ErrorKind::MissingExtend,
            StratumError::CyclicExtends { .. } => ErrorKind::CyclicExtends,
            StratumError::UnknownPlugin { .. } => ErrorKind::UnknownPlugin,
            StratumError::UnknownRule { .. } => ErrorKind::UnknownRule,
            StratumError::InvalidSeverity { .. } => ErrorKind::InvalidSeverity,
            StratumError::InvalidGlob { .. } => ErrorKind::InvalidGlob,
            StratumError::DuplicatePlugin { .. } | StratumError::DuplicateRule { .. } => {
                ErrorKind::Registry
            }
            StratumError::ConfigError { .. } => ErrorKind::Config,
            StratumError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// Whether the error is scoped to a single file's resolution.
    ///
    /// Chain-level failures (missing or cyclic bases) poison every file, while
    /// rule and severity failures can come from an override that only some
    /// files match.
    pub fn is_file_scoped(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownPlugin | ErrorKind::UnknownRule | ErrorKind::InvalidSeverity
        )
    }

    /// Create a missing extend error
    pub fn missing_extend(layer: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::MissingExtend {
            layer: layer.into(),
            reference: reference.into(),
        }
    }

    /// Create an unknown plugin error
    pub fn unknown_plugin(
        plugin: impl Into<String>,
        reference: impl Into<String>,
        layer: impl Into<String>,
    ) -> Self {
        Self::UnknownPlugin {
            plugin: plugin.into(),
            reference: reference.into(),
            layer: layer.into(),
        }
    }

    /// Create an unknown rule error
    pub fn unknown_rule(rule: impl Into<String>, layer: impl Into<String>) -> Self {
        Self::UnknownRule {
            rule: rule.into(),
            layer: layer.into(),
        }
    }

    /// Create an invalid severity error
    pub fn invalid_severity(
        rule: impl Into<String>,
        value: impl Into<String>,
        layer: impl Into<String>,
    ) -> Self {
        Self::InvalidSeverity {
            rule: rule.into(),
            value: value.into(),
            layer: layer.into(),
        }
    }

    /// Create an invalid glob error
    pub fn invalid_glob(
        pattern: impl Into<String>,
        layer: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidGlob {
            pattern: pattern.into(),
            layer: layer.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for StratumError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
