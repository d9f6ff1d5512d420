//! Resolution Performance Benchmarks
//!
//! Measures folding a layered configuration for a single file, with and
//! without the cache, and parallel resolution of many files.
//!
//! Run with: `cargo bench --package stratum-core resolve_benchmark`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;
use stratum_core::{ConfigLayer, LayerSet, PluginDefinition, Registry, ResolutionEngine};

const RULES_PER_LAYER: usize = 40;

fn registry() -> Arc<Registry> {
    let core: Vec<String> = (0..RULES_PER_LAYER).map(|i| format!("core-rule-{i}")).collect();
    let react: Vec<String> = (0..RULES_PER_LAYER).map(|i| format!("react-rule-{i}")).collect();

    Arc::new(
        Registry::builder()
            .core_rules(core)
            .plugin(PluginDefinition::new("react").with_rules(react))
            .build()
            .unwrap(),
    )
}

/// A root extending `depth` bases, each setting every rule
fn engine(depth: usize) -> ResolutionEngine {
    let mut layers = LayerSet::new();
    let mut extends = Vec::new();

    for level in 0..depth {
        let mut rules = serde_json::Map::new();
        for i in 0..RULES_PER_LAYER {
            let severity = if (i + level) % 2 == 0 { "warn" } else { "error" };
            rules.insert(format!("core-rule-{i}"), json!([severity, { "level": level }]));
            rules.insert(format!("react/react-rule-{i}"), json!(severity));
        }
        let id = format!("base-{level}");
        layers
            .insert(
                ConfigLayer::from_value(
                    id.as_str(),
                    None,
                    json!({
                        "plugins": ["react"],
                        "parserOptions": { "ecmaVersion": 2015 + level },
                        "rules": rules
                    }),
                )
                .unwrap(),
            )
            .unwrap();
        extends.push(id);
    }

    let root = ConfigLayer::from_value(
        "root",
        None,
        json!({
            "extends": extends,
            "overrides": [
                { "files": ["**/*.tsx"], "rules": { "react/react-rule-0": "off" } },
                { "files": ["src/legacy/**/*.js"], "rules": { "core-rule-0": "off" } }
            ]
        }),
    )
    .unwrap();

    ResolutionEngine::new(registry(), layers, Arc::new(root)).unwrap()
}

fn bench_single_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_file");

    for &depth in &[1, 4, 16] {
        let engine = engine(depth);

        group.bench_with_input(BenchmarkId::new("uncached", depth), &engine, |b, engine| {
            b.iter(|| {
                engine.clear_cache();
                black_box(engine.resolve_for(black_box("src/components/App.tsx")).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("cached", depth), &engine, |b, engine| {
            b.iter(|| black_box(engine.resolve_for(black_box("src/components/App.tsx")).unwrap()));
        });
    }

    group.finish();
}

fn bench_many_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_files");
    let engine = engine(4);

    for &count in &[100, 1000] {
        let paths: Vec<String> = (0..count)
            .map(|i| match i % 3 {
                0 => format!("src/components/C{i}.tsx"),
                1 => format!("src/legacy/m{i}.js"),
                _ => format!("src/lib/m{i}.ts"),
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &paths, |b, paths| {
            b.iter(|| {
                engine.clear_cache();
                black_box(engine.resolve_many(paths))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_file, bench_many_files);
criterion_main!(benches);
