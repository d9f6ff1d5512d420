//! Extends-chain linearization
//!
//! The chain is the depth-first expansion of a root layer's `extends`, with
//! every layer placed after its own bases. A layer reached more than once keeps
//! only its last position, so later references take precedence over earlier
//! ones.

use crate::config::{ConfigLayer, LayerId, LayerSet};
use crate::error::StratumError;
use crate::registry::Registry;
use crate::result::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The linearized bases of a root layer, most general first.
///
/// The root itself is not part of the chain.
#[derive(Debug, Clone, Default)]
pub struct ExtendsChain {
    layers: Vec<Arc<ConfigLayer>>,
}

impl ExtendsChain {
    pub fn layers(&self) -> &[Arc<ConfigLayer>] {
        &self.layers
    }

    pub fn ids(&self) -> impl Iterator<Item = &LayerId> {
        self.layers.iter().map(|layer| layer.id())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Resolves `extends` references against a layer set and a registry
pub struct ExtendsResolver<'a> {
    layers: &'a LayerSet,
    registry: &'a Registry,
}

impl<'a> ExtendsResolver<'a> {
    pub fn new(layers: &'a LayerSet, registry: &'a Registry) -> Self {
        Self { layers, registry }
    }

    /// Linearize the bases of `root`.
    ///
    /// Fails with `MissingExtend` when a reference cannot be found and with
    /// `CyclicExtends` when a layer is reached again while it is still being
    /// expanded.
    pub fn linearize(&self, root: &ConfigLayer) -> Result<ExtendsChain> {
        let mut path = vec![root.id().clone()];
        let mut expanded = HashMap::new();
        let layers = self.expand(root, &mut path, &mut expanded)?;

        tracing::debug!(
            "Linearized extends chain for '{}': [{}]",
            root.id(),
            layers
                .iter()
                .map(|layer| layer.id().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ExtendsChain { layers })
    }

    /// Deduplicated bases of `layer`. Finished expansions are memoized by id,
    /// so a layer reached through many parents is expanded once.
    fn expand(
        &self,
        layer: &ConfigLayer,
        path: &mut Vec<LayerId>,
        expanded: &mut HashMap<LayerId, Vec<Arc<ConfigLayer>>>,
    ) -> Result<Vec<Arc<ConfigLayer>>> {
        if let Some(bases) = expanded.get(layer.id()) {
            return Ok(bases.clone());
        }

        let mut out = Vec::new();
        for reference in layer.extends() {
            let base = self
                .layers
                .lookup(reference, self.registry)
                .ok_or_else(|| StratumError::missing_extend(layer.id().as_str(), reference.raw()))?;

            if let Some(start) = path.iter().position(|id| id == base.id()) {
                let mut cycle: Vec<String> =
                    path[start..].iter().map(|id| id.to_string()).collect();
                cycle.push(base.id().to_string());
                return Err(StratumError::CyclicExtends { cycle });
            }

            path.push(base.id().clone());
            out.extend(self.expand(&base, path, expanded)?);
            path.pop();

            out.push(base);
        }

        let bases = keep_last(out);
        expanded.insert(layer.id().clone(), bases.clone());
        Ok(bases)
    }
}

/// Drop every occurrence of a layer but its last one
fn keep_last(layers: Vec<Arc<ConfigLayer>>) -> Vec<Arc<ConfigLayer>> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Arc<ConfigLayer>> = layers
        .into_iter()
        .rev()
        .filter(|layer| seen.insert(layer.id().clone()))
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(id: &str, extends: &[&str]) -> ConfigLayer {
        ConfigLayer::from_value(id, None, json!({ "extends": extends })).unwrap()
    }

    fn set(layers: Vec<ConfigLayer>) -> LayerSet {
        let mut set = LayerSet::new();
        for layer in layers {
            set.insert(layer).unwrap();
        }
        set
    }

    fn ids(chain: &ExtendsChain) -> Vec<&str> {
        chain.ids().map(LayerId::as_str).collect()
    }

    #[test]
    fn test_no_extends() {
        let registry = Registry::default();
        let layers = LayerSet::new();
        let chain = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &[]))
            .unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_bases_precede_their_dependents() {
        let registry = Registry::default();
        let layers = set(vec![layer("A", &["C"]), layer("B", &[]), layer("C", &[])]);
        let chain = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["A", "B"]))
            .unwrap();
        assert_eq!(ids(&chain), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_duplicate_keeps_last_position() {
        let registry = Registry::default();
        let layers = set(vec![layer("A", &[]), layer("B", &[])]);
        let chain = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["A", "B", "A"]))
            .unwrap();
        assert_eq!(ids(&chain), vec!["B", "A"]);
    }

    #[test]
    fn test_diamond_is_deduplicated() {
        let registry = Registry::default();
        let layers = set(vec![
            layer("A", &["base"]),
            layer("B", &["base"]),
            layer("base", &[]),
        ]);
        let chain = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["A", "B"]))
            .unwrap();
        // base is reached twice; its last position is right before B
        assert_eq!(ids(&chain), vec!["A", "base", "B"]);
    }

    #[test]
    fn test_cycle_is_named() {
        let registry = Registry::default();
        let layers = set(vec![layer("A", &["B"]), layer("B", &["A"])]);
        let err = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["A"]))
            .unwrap_err();

        match err {
            StratumError::CyclicExtends { cycle } => assert_eq!(cycle, vec!["A", "B", "A"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let registry = Registry::default();
        let layers = set(vec![layer("A", &["A"])]);
        let err = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["A"]))
            .unwrap_err();
        assert!(matches!(err, StratumError::CyclicExtends { ref cycle } if cycle == &["A", "A"]));
    }

    #[test]
    fn test_missing_extend() {
        let registry = Registry::default();
        let layers = set(vec![layer("A", &["nowhere"])]);
        let err = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["A"]))
            .unwrap_err();
        assert!(matches!(
            err,
            StratumError::MissingExtend { ref layer, ref reference } if layer == "A" && reference == "nowhere"
        ));
    }

    #[test]
    fn test_registry_shareable_configs_resolve() {
        let registry = Registry::builder()
            .core_config("eslint:recommended", layer("eslint:recommended", &[]))
            .build()
            .unwrap();
        let layers = LayerSet::new();
        let chain = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["eslint:recommended"]))
            .unwrap();
        assert_eq!(ids(&chain), vec!["eslint:recommended"]);
    }

    #[test]
    fn test_shared_bases_are_expanded_once() {
        // every level references the next one twice
        let depth = 40;
        let name = |i: usize| format!("L{i}");
        let layers = set(
            (1..=depth)
                .map(|i| {
                    if i == depth {
                        layer(&name(i), &[])
                    } else {
                        let next = name(i + 1);
                        layer(&name(i), &[next.as_str(), next.as_str()])
                    }
                })
                .collect(),
        );
        let registry = Registry::default();
        let chain = ExtendsResolver::new(&layers, &registry)
            .linearize(&layer("root", &["L1", "L1"]))
            .unwrap();

        let expected: Vec<String> = (1..=depth).rev().map(name).collect();
        assert_eq!(ids(&chain), expected);
    }
}
