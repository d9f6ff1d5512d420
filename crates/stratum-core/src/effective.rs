//! The resolved configuration for one file

use crate::registry::RuleIdentifier;
use crate::rule::{RuleSpec, Severity};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Final, flattened configuration used to evaluate one file.
///
/// Instances are produced by the resolution engine and never change afterwards.
/// Map fields keep the order in which keys were first introduced while folding,
/// and rules are ordered by identifier, so serializing the same resolution twice
/// yields identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parser: Option<String>,
    pub(crate) parser_options: IndexMap<String, Value>,
    pub(crate) env: IndexMap<String, bool>,
    pub(crate) globals: IndexMap<String, Value>,
    pub(crate) settings: IndexMap<String, Value>,
    pub(crate) plugins: BTreeSet<String>,
    pub(crate) rules: BTreeMap<RuleIdentifier, RuleSpec>,
}

impl EffectiveConfig {
    pub fn parser(&self) -> Option<&str> {
        self.parser.as_deref()
    }

    pub fn parser_options(&self) -> &IndexMap<String, Value> {
        &self.parser_options
    }

    pub fn env(&self) -> &IndexMap<String, bool> {
        &self.env
    }

    pub fn globals(&self) -> &IndexMap<String, Value> {
        &self.globals
    }

    /// Opaque shared settings keyed by plugin namespace
    pub fn settings(&self) -> &IndexMap<String, Value> {
        &self.settings
    }

    pub fn plugins(&self) -> &BTreeSet<String> {
        &self.plugins
    }

    pub fn rules(&self) -> &BTreeMap<RuleIdentifier, RuleSpec> {
        &self.rules
    }

    /// Look up a rule by the name it is written with, e.g. `react/prop-types`
    pub fn rule(&self, name: &str) -> Option<&RuleSpec> {
        self.rules.get(&RuleIdentifier::parse(name))
    }

    /// Severity of a rule; rules never configured are off
    pub fn severity_of(&self, name: &str) -> Severity {
        self.rule(name).map_or(Severity::Off, RuleSpec::severity)
    }

    /// Rules that are not switched off
    pub fn enabled_rules(&self) -> impl Iterator<Item = &RuleSpec> {
        self.rules.values().filter(|spec| spec.is_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleOptions;
    use serde_json::json;

    fn config() -> EffectiveConfig {
        let mut config = EffectiveConfig::default();
        for (name, severity) in [
            ("semi", Severity::Error),
            ("no-console", Severity::Off),
            ("react/prop-types", Severity::Warn),
        ] {
            let id = RuleIdentifier::parse(name);
            config
                .rules
                .insert(id.clone(), RuleSpec::new(id, severity, RuleOptions::default()));
        }
        config.plugins.insert("react".to_string());
        config
    }

    #[test]
    fn test_rule_lookup_by_written_name() {
        let config = config();
        assert_eq!(config.severity_of("react/prop-types"), Severity::Warn);
        assert_eq!(config.severity_of("semi"), Severity::Error);
        assert_eq!(config.severity_of("never-configured"), Severity::Off);
        assert!(config.rule("no-console").is_some());
    }

    #[test]
    fn test_enabled_rules_skip_off() {
        let config = config();
        let enabled: Vec<String> = config
            .enabled_rules()
            .map(|spec| spec.id().to_string())
            .collect();
        assert_eq!(enabled, vec!["semi", "react/prop-types"]);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(config()).unwrap();
        assert_eq!(value["plugins"], json!(["react"]));
        assert_eq!(value["rules"]["semi"], json!(["error"]));
        assert_eq!(value["rules"]["react/prop-types"], json!(["warn"]));
        assert!(value.get("parser").is_none());
        assert_eq!(value["parserOptions"], json!({}));
    }
}
