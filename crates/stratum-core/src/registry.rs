//! Plugin and rule registry
//!
//! The registry is the explicit universe of rules the engine can resolve: the
//! core rule set, every registered plugin with its rules, and the shareable
//! configurations that `extends` entries may name. It is built once and passed
//! to the resolution engine; there is no ambient global registry.

use crate::config::{ConfigLayer, LayerDocument};
use crate::error::StratumError;
use crate::result::Result;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Canonical identifier of a rule: an optional plugin namespace plus the rule name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleIdentifier {
    plugin: Option<String>,
    name: String,
}

impl RuleIdentifier {
    /// Identifier of a core (unqualified) rule
    pub fn core(name: impl Into<String>) -> Self {
        Self {
            plugin: None,
            name: name.into(),
        }
    }

    /// Identifier of a plugin rule
    pub fn plugin_rule(plugin: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            plugin: Some(plugin.into()),
            name: name.into(),
        }
    }

    /// Split a rule reference into plugin namespace and rule name.
    ///
    /// `semi` is a core rule, `react/jsx-uses-react` belongs to `react`,
    /// `@scope/rule` belongs to `@scope` and `@scope/name/rule` belongs to
    /// `@scope/name`.
    pub fn parse(reference: &str) -> Self {
        let split_at = if let Some(scoped) = reference.strip_prefix('@') {
            match scoped.find('/') {
                Some(first) => match scoped[first + 1..].find('/') {
                    Some(second) => Some(first + 1 + second + 1),
                    None => Some(first + 1),
                },
                None => None,
            }
        } else {
            reference.find('/')
        };

        match split_at {
            Some(idx) => Self::plugin_rule(&reference[..idx], &reference[idx + 1..]),
            None => Self::core(reference),
        }
    }

    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_core(&self) -> bool {
        self.plugin.is_none()
    }
}

impl fmt::Display for RuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => write!(f, "{plugin}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for RuleIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Normalize a plugin name as written in `plugins` or `plugin:` references.
///
/// `eslint-plugin-foo` becomes `foo`, `@scope/eslint-plugin` becomes `@scope`
/// and `@scope/eslint-plugin-foo` becomes `@scope/foo`.
pub fn normalize_plugin_name(name: &str) -> String {
    const PREFIX: &str = "eslint-plugin";

    if let Some(scoped) = name.strip_prefix('@') {
        if let Some((scope, rest)) = scoped.split_once('/') {
            if rest == PREFIX {
                return format!("@{scope}");
            }
            if let Some(short) = rest.strip_prefix("eslint-plugin-") {
                return format!("@{scope}/{short}");
            }
        }
        return name.to_string();
    }

    name.strip_prefix("eslint-plugin-").unwrap_or(name).to_string()
}

/// A plugin: a namespace of rules plus its shareable configurations
#[derive(Debug, Clone)]
pub struct PluginDefinition {
    name: String,
    rules: Vec<String>,
    configs: Vec<(String, ConfigLayer)>,
}

impl PluginDefinition {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: normalize_plugin_name(name.as_ref()),
            rules: Vec::new(),
            configs: Vec::new(),
        }
    }

    /// Add rules defined by this plugin
    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Add a shareable configuration, addressed as `plugin:<plugin>/<name>`
    pub fn with_config(mut self, name: impl Into<String>, layer: ConfigLayer) -> Self {
        self.configs.push((name.into(), layer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct RegisteredPlugin {
    rules: IndexSet<String>,
    configs: IndexMap<String, Arc<ConfigLayer>>,
}

/// The registry of known rules, plugins and shareable configurations
#[derive(Debug, Default)]
pub struct Registry {
    core_rules: IndexSet<String>,
    core_configs: IndexMap<String, Arc<ConfigLayer>>,
    plugins: IndexMap<String, RegisteredPlugin>,
}

/// Builder for [`Registry`]; duplicates are reported by [`RegistryBuilder::build`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    core_rules: Vec<String>,
    core_configs: Vec<(String, ConfigLayer)>,
    plugins: Vec<PluginDefinition>,
}

impl RegistryBuilder {
    /// Add core (unqualified) rules
    pub fn core_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_rules.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Add a named core shareable configuration such as `eslint:recommended`
    pub fn core_config(mut self, name: impl Into<String>, layer: ConfigLayer) -> Self {
        self.core_configs.push((name.into(), layer));
        self
    }

    pub fn plugin(mut self, plugin: PluginDefinition) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn build(self) -> Result<Registry> {
        let mut registry = Registry::default();

        for rule in self.core_rules {
            if !registry.core_rules.insert(rule.clone()) {
                return Err(StratumError::DuplicateRule { rule });
            }
        }

        for (name, layer) in self.core_configs {
            if registry.core_configs.contains_key(&name) {
                return Err(StratumError::config_error(format!(
                    "Shareable config '{name}' is registered twice"
                )));
            }
            registry.core_configs.insert(name, Arc::new(layer));
        }

        for plugin in self.plugins {
            if registry.plugins.contains_key(&plugin.name) {
                return Err(StratumError::DuplicatePlugin {
                    plugin: plugin.name,
                });
            }

            let mut rules = IndexSet::new();
            for rule in plugin.rules {
                if !rules.insert(rule.clone()) {
                    return Err(StratumError::DuplicateRule {
                        rule: format!("{}/{rule}", plugin.name),
                    });
                }
            }

            let configs = plugin
                .configs
                .into_iter()
                .map(|(name, layer)| (name, Arc::new(layer)))
                .collect();

            registry
                .plugins
                .insert(plugin.name, RegisteredPlugin { rules, configs });
        }

        tracing::debug!(
            "Registry built: {} core rules, {} plugins",
            registry.core_rules.len(),
            registry.plugins.len()
        );

        Ok(registry)
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build a registry from a manifest document.
    ///
    /// Shareable configurations in the manifest have no base directory of their
    /// own; their override globs are evaluated against the root configuration's.
    pub fn from_manifest(manifest: RegistryManifest) -> Result<Self> {
        let mut builder = Registry::builder().core_rules(manifest.core_rules);

        for (name, document) in manifest.configs {
            let layer = ConfigLayer::from_document(name.clone(), None, document)?;
            builder = builder.core_config(name, layer);
        }

        for (name, plugin) in manifest.plugins {
            let mut definition = PluginDefinition::new(&name).with_rules(plugin.rules);
            for (config_name, document) in plugin.configs {
                let id = format!("plugin:{}/{config_name}", definition.name());
                let layer = ConfigLayer::from_document(id, None, document)?;
                definition = definition.with_config(config_name, layer);
            }
            builder = builder.plugin(definition);
        }

        builder.build()
    }

    /// Load a registry manifest from a JSON, JSONC, YAML or TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let manifest: RegistryManifest = crate::config::read_document(path)?;
        Self::from_manifest(manifest)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn has_rule(&self, id: &RuleIdentifier) -> bool {
        match id.plugin() {
            Some(plugin) => self
                .plugins
                .get(plugin)
                .is_some_and(|p| p.rules.contains(id.name())),
            None => self.core_rules.contains(id.name()),
        }
    }

    /// Every rule the registry knows, core rules first
    pub fn rules(&self) -> impl Iterator<Item = RuleIdentifier> + '_ {
        let core = self.core_rules.iter().map(RuleIdentifier::core);
        let plugins = self.plugins.iter().flat_map(|(plugin, registered)| {
            registered
                .rules
                .iter()
                .map(move |rule| RuleIdentifier::plugin_rule(plugin.clone(), rule.clone()))
        });
        core.chain(plugins)
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Look up a shareable configuration by its `extends` name.
    ///
    /// `plugin:<plugin>/<config>` addresses a plugin configuration; any other
    /// name addresses a core configuration.
    pub fn shareable_config(&self, name: &str) -> Option<Arc<ConfigLayer>> {
        if let Some(reference) = name.strip_prefix("plugin:") {
            let (plugin, config) = reference.rsplit_once('/')?;
            let plugin = normalize_plugin_name(plugin);
            return self.plugins.get(&plugin)?.configs.get(config).cloned();
        }

        self.core_configs.get(name).cloned()
    }
}

/// The set of plugins declared so far while folding a chain.
///
/// Declarations only ever accumulate, so a rule can use any plugin declared by
/// the layer being folded or by a layer folded before it.
#[derive(Debug, Clone)]
pub struct PluginScope<'r> {
    registry: &'r Registry,
    declared: BTreeSet<String>,
}

impl<'r> PluginScope<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            declared: BTreeSet::new(),
        }
    }

    /// Declare a plugin, failing when the registry does not provide it
    pub fn declare(&mut self, plugin: &str, layer: &str) -> Result<String> {
        let name = normalize_plugin_name(plugin);
        if !self.registry.has_plugin(&name) {
            return Err(StratumError::unknown_plugin(name, plugin, layer));
        }
        self.declared.insert(name.clone());
        Ok(name)
    }

    /// Resolve a rule reference against the declared plugins.
    ///
    /// A rule from an undeclared plugin fails with `UnknownPlugin`; a rule the
    /// declared plugin (or the core set) does not define fails with
    /// `UnknownRule`.
    pub fn resolve(&self, rule_name: &str, layer: &str) -> Result<RuleIdentifier> {
        let id = RuleIdentifier::parse(rule_name);

        if let Some(plugin) = id.plugin()
            && !self.declared.contains(plugin)
        {
            return Err(StratumError::unknown_plugin(plugin, rule_name, layer));
        }

        if !self.registry.has_rule(&id) {
            return Err(StratumError::unknown_rule(rule_name, layer));
        }

        Ok(id)
    }

    pub fn is_declared(&self, plugin: &str) -> bool {
        self.declared.contains(plugin)
    }

    pub fn into_declared(self) -> BTreeSet<String> {
        self.declared
    }
}

/// Serializable description of a registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryManifest {
    /// Unqualified core rule names
    pub core_rules: Vec<String>,
    /// Core shareable configurations, keyed by their `extends` name
    pub configs: IndexMap<String, LayerDocument>,
    /// Plugins keyed by name
    pub plugins: IndexMap<String, PluginManifest>,
}

/// Serializable description of one plugin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginManifest {
    pub rules: Vec<String>,
    pub configs: IndexMap<String, LayerDocument>,
}
