//! Per-file configuration resolution
//!
//! [`ResolutionEngine`] is the entry point of the crate. It is built from an
//! explicit [`Registry`], the set of loaded layers and the root layer. The
//! extends chain is linearized once, at construction; afterwards every
//! [`resolve_for`](ResolutionEngine::resolve_for) call is a pure function of the
//! file path, served from a read-through cache.
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use stratum_core::{ConfigLoader, Registry, ResolutionEngine};
//!
//! # fn main() -> stratum_core::Result<()> {
//! let registry = Arc::new(Registry::load(Path::new("registry.json"))?);
//! let loaded = ConfigLoader::load(Path::new(".stratumrc.json"))?;
//! let engine = ResolutionEngine::from_loaded(registry, loaded)?;
//!
//! let config = engine.resolve_for("src/components/App.tsx")?;
//! for rule in config.enabled_rules() {
//!     println!("{} = {}", rule.id(), rule.severity());
//! }
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheStats, ConfigIdentity, ResolutionCache};
use crate::config::{ConfigLayer, LayerSet, LoadedConfig};
use crate::effective::EffectiveConfig;
use crate::extends::{ExtendsChain, ExtendsResolver};
use crate::merge::{ApplicableOverride, MergeEngine};
use crate::paths;
use crate::registry::Registry;
use crate::result::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolves the effective configuration of individual files
pub struct ResolutionEngine {
    registry: Arc<Registry>,
    layers: LayerSet,
    root: Arc<ConfigLayer>,
    chain: ExtendsChain,
    identity: ConfigIdentity,
    cache: ResolutionCache,
}

impl ResolutionEngine {
    /// Create an engine and linearize the root's extends chain.
    ///
    /// Fails with `MissingExtend` or `CyclicExtends` before any file is
    /// resolved.
    pub fn new(registry: Arc<Registry>, layers: LayerSet, root: Arc<ConfigLayer>) -> Result<Self> {
        let chain = ExtendsResolver::new(&layers, &registry).linearize(&root)?;
        let identity = ConfigIdentity::new(root.id().as_str(), 0);

        debug!(
            "Resolution engine ready for '{}' ({} layers, {} bases)",
            root.id(),
            layers.len(),
            chain.len()
        );

        Ok(Self {
            registry,
            layers,
            root,
            chain,
            identity,
            cache: ResolutionCache::new(),
        })
    }

    /// Create an engine from the output of [`ConfigLoader::load`](crate::config::ConfigLoader::load)
    pub fn from_loaded(registry: Arc<Registry>, loaded: LoadedConfig) -> Result<Self> {
        Self::new(registry, loaded.layers, loaded.root)
    }

    /// Replace the cache with one holding at most `capacity` files
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = ResolutionCache::with_capacity(capacity);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn root(&self) -> &ConfigLayer {
        &self.root
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    /// The memoized, linearized bases of the root layer
    pub fn extends_chain(&self) -> &ExtendsChain {
        &self.chain
    }

    /// Resolve the effective configuration for one file.
    ///
    /// Relative paths are taken relative to the root layer's directory. Failed
    /// resolutions are not cached.
    pub fn resolve_for(&self, path: impl AsRef<Path>) -> Result<Arc<EffectiveConfig>> {
        let target = self.target_path(path.as_ref());

        if let Some(config) = self.cache.get(&self.identity, &target) {
            trace!("Cache hit for {}", target.display());
            return Ok(config);
        }

        let config = Arc::new(self.compute(&target)?);
        self.cache
            .insert(self.identity.clone(), target, Arc::clone(&config));
        Ok(config)
    }

    /// Resolve many files in parallel.
    ///
    /// Each path gets its own result; one failing file does not affect the
    /// others. Results come back in input order.
    pub fn resolve_many<P>(&self, paths: &[P]) -> Vec<(PathBuf, Result<Arc<EffectiveConfig>>)>
    where
        P: AsRef<Path> + Sync,
    {
        paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                (path.to_path_buf(), self.resolve_for(path))
            })
            .collect()
    }

    /// Swap in a new layer set and root, re-linearizing and clearing the cache.
    ///
    /// On failure the engine keeps its previous layers.
    pub fn reload(&mut self, layers: LayerSet, root: Arc<ConfigLayer>) -> Result<()> {
        let chain = ExtendsResolver::new(&layers, &self.registry).linearize(&root)?;
        let generation = self.identity.generation() + 1;

        self.identity = ConfigIdentity::new(root.id().as_str(), generation);
        self.layers = layers;
        self.root = root;
        self.chain = chain;
        self.cache.invalidate_all();

        debug!("Reloaded configuration, generation {}", generation);
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }

    fn target_path(&self, path: &Path) -> PathBuf {
        match self.root.base_dir() {
            Some(base) if path.is_relative() => paths::normalize(&base.join(path)),
            _ => paths::normalize(path),
        }
    }

    fn compute(&self, target: &Path) -> Result<EffectiveConfig> {
        let overrides = self.applicable_overrides(target);
        debug!(
            "Resolving {} with {} matching override(s)",
            target.display(),
            overrides.len()
        );

        MergeEngine::new(&self.registry).merge(self.chain.layers(), &self.root, &overrides)
    }

    /// Matching override blocks, bases first, then the root, each in declaration order
    fn applicable_overrides<'a>(&'a self, target: &Path) -> Vec<ApplicableOverride<'a>> {
        let layers = self
            .chain
            .layers()
            .iter()
            .map(|layer| layer.as_ref())
            .chain(std::iter::once(self.root.as_ref()));

        let mut applicable = Vec::new();
        for layer in layers {
            if layer.overrides().is_empty() {
                continue;
            }

            let base = layer
                .base_dir()
                .or_else(|| self.root.base_dir())
                .unwrap_or_else(|| Path::new(""));
            let Some(relative) = paths::relative_to(target, base) else {
                trace!(
                    "{} is outside '{}', skipping its overrides",
                    target.display(),
                    layer.id()
                );
                continue;
            };

            applicable.extend(
                layer
                    .overrides()
                    .iter()
                    .filter(|block| block.applies_to(&relative))
                    .map(|block| ApplicableOverride { layer, block }),
            );
        }
        applicable
    }
}
