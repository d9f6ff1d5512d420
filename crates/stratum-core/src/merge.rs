//! Folding layers into an effective configuration
//!
//! The fold starts from an empty configuration and applies, in order, every
//! base layer of the extends chain, the root layer, and the override blocks
//! that matched the target file. Each step overrides the previous one:
//!
//! - `parser` is replaced wholesale.
//! - `parserOptions`, `env`, `globals` and `settings` are overwritten key by
//!   key, one level deep.
//! - `plugins` only ever grow.
//! - A rule entry replaces the previous entry for the same rule entirely,
//!   severity and options together.
//!
//! Rule names and severities are validated while each step is applied, so the
//! first invalid entry fails the merge and names the layer it came from.

use crate::config::{ConfigLayer, OverrideBlock, SettingsDocument};
use crate::effective::EffectiveConfig;
use crate::registry::{PluginScope, Registry};
use crate::result::Result;
use crate::rule::RuleSpec;
use indexmap::IndexMap;
use std::hash::Hash;
use std::sync::Arc;

/// An override block selected for the file being resolved
#[derive(Debug, Clone, Copy)]
pub struct ApplicableOverride<'a> {
    pub layer: &'a ConfigLayer,
    pub block: &'a OverrideBlock,
}

impl ApplicableOverride<'_> {
    /// Name used when attributing errors, e.g. `base.json (overrides[1])`
    pub fn origin(&self) -> String {
        format!("{} (overrides[{}])", self.layer.id(), self.block.index())
    }
}

/// Folds configuration layers, validating every rule against a registry
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine<'r> {
    registry: &'r Registry,
}

impl<'r> MergeEngine<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Fold `bases`, then `root`, then `overrides`, into one configuration
    pub fn merge(
        &self,
        bases: &[Arc<ConfigLayer>],
        root: &ConfigLayer,
        overrides: &[ApplicableOverride<'_>],
    ) -> Result<EffectiveConfig> {
        let mut fold = Fold::new(self.registry);

        for base in bases {
            fold.apply(base.settings(), base.id().as_str())?;
        }
        fold.apply(root.settings(), root.id().as_str())?;

        for applicable in overrides {
            fold.apply(applicable.block.settings(), &applicable.origin())?;
        }

        Ok(fold.finish())
    }
}

struct Fold<'r> {
    scope: PluginScope<'r>,
    config: EffectiveConfig,
}

impl<'r> Fold<'r> {
    fn new(registry: &'r Registry) -> Self {
        Self {
            scope: PluginScope::new(registry),
            config: EffectiveConfig::default(),
        }
    }

    fn apply(&mut self, settings: &SettingsDocument, origin: &str) -> Result<()> {
        tracing::trace!("Folding '{}'", origin);

        if let Some(parser) = &settings.parser {
            self.config.parser = Some(parser.clone());
        }

        overwrite(&mut self.config.parser_options, &settings.parser_options);
        overwrite(&mut self.config.env, &settings.env);
        overwrite(&mut self.config.globals, &settings.globals);
        overwrite(&mut self.config.settings, &settings.settings);

        // Plugins first: a layer's rules may use the plugins it declares
        for plugin in &settings.plugins {
            let name = self.scope.declare(plugin, origin)?;
            self.config.plugins.insert(name);
        }

        for (name, raw) in &settings.rules {
            let id = self.scope.resolve(name, origin)?;
            let spec = RuleSpec::from_entry(id.clone(), raw, origin)?;
            self.config.rules.insert(id, spec);
        }

        Ok(())
    }

    fn finish(self) -> EffectiveConfig {
        self.config
    }
}

fn overwrite<K, V>(target: &mut IndexMap<K, V>, source: &IndexMap<K, V>)
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}
