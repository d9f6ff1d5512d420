//! Stratum Core
//!
//! Resolution of layered lint configurations.
//! A root configuration extends base configurations, declares plugins and rules,
//! and scopes partial configurations to files through glob `overrides`. This
//! crate loads those layers, linearizes their extends chain, and folds them into
//! one effective configuration per source file.

pub mod cache;
pub mod config;
pub mod effective;
pub mod engine;
pub mod error;
pub mod extends;
pub mod matcher;
pub mod merge;
pub mod paths;
pub mod registry;
pub mod result;
pub mod rule;

// Re-export commonly used types
pub use cache::{Cache, CacheStats, ResolutionCache};
pub use config::{
    ConfigLayer, ConfigLoader, ExtendsRef, ExtendsTarget, LayerDocument, LayerId, LayerSet,
    LoadedConfig, OverrideBlock, layer_schema,
};
pub use effective::EffectiveConfig;
pub use engine::ResolutionEngine;
pub use error::{ErrorKind, StratumError};
pub use extends::{ExtendsChain, ExtendsResolver};
pub use matcher::GlobMatcher;
pub use merge::{ApplicableOverride, MergeEngine};
pub use registry::{
    PluginDefinition, PluginManifest, PluginScope, Registry, RegistryBuilder, RegistryManifest,
    RuleIdentifier, normalize_plugin_name,
};
pub use result::Result;
pub use rule::{RuleOptions, RuleSpec, Severity};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    init_tracing_with_default("stratum=info");
}

/// Initialize tracing, falling back to `default_directive` when `RUST_LOG` is unset
pub fn init_tracing_with_default(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
