//! CLI command implementations
//!
//! Every command starts by loading the configuration (explicit `--config` or
//! discovered upward from the working path) and the registry manifest
//! (explicit `--registry` or a `stratum-registry.*` file next to the config).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use stratum_core::{
    ConfigLoader, LoadedConfig, Registry, ResolutionEngine, Result, StratumError, layer_schema,
    normalize_plugin_name,
};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::output::{CheckFailure, CheckReport, OutputFormatter, print_effective_config};
use crate::{ConfigFormat, OutputFormat};

/// Registry manifest names looked up next to the configuration file, in priority order
pub const REGISTRY_FILE_NAMES: [&str; 5] = [
    "stratum-registry.json",
    "stratum-registry.jsonc",
    "stratum-registry.yaml",
    "stratum-registry.yml",
    "stratum-registry.toml",
];

/// Directories never descended into while walking
const SKIPPED_DIRS: [&str; 3] = ["node_modules", "target", "dist"];

/// Where configuration and registry come from
pub struct ConfigSources {
    pub config: Option<PathBuf>,
    pub registry: Option<PathBuf>,
}

impl ConfigSources {
    fn load_engine(&self, start_dir: &Path) -> Result<ResolutionEngine> {
        let loaded = self.load_config(start_dir)?;
        self.engine_for(loaded)
    }

    fn load_config(&self, start_dir: &Path) -> Result<LoadedConfig> {
        ConfigLoader::load_or_discover(self.config.as_deref(), start_dir)
    }

    fn engine_for(&self, loaded: LoadedConfig) -> Result<ResolutionEngine> {
        info!("Using configuration {}", loaded.path.display());

        let registry = self.load_registry(Some(&loaded))?;
        ResolutionEngine::from_loaded(Arc::new(registry), loaded)
    }

    fn load_registry(&self, loaded: Option<&LoadedConfig>) -> Result<Registry> {
        if let Some(path) = &self.registry {
            debug!("Loading registry from {}", path.display());
            return Registry::load(path);
        }

        let Some(config_dir) = loaded.and_then(|loaded| loaded.path.parent()) else {
            warn!("No registry manifest given, using an empty registry");
            return Ok(Registry::default());
        };

        for name in &REGISTRY_FILE_NAMES {
            let candidate = config_dir.join(name);
            if candidate.is_file() {
                debug!("Found registry: {}", candidate.display());
                return Registry::load(&candidate);
            }
        }

        warn!(
            "No registry manifest found in {}, using an empty registry",
            config_dir.display()
        );
        Ok(Registry::default())
    }
}

/// Directory to start configuration discovery from for a user-supplied path
fn discovery_dir(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| StratumError::io_error(path, e))
}

/// Print config command implementation
pub fn print_config_command(
    sources: &ConfigSources,
    file: PathBuf,
    format: ConfigFormat,
) -> Result<()> {
    debug!("Printing configuration for {}", file.display());

    let engine = sources.load_engine(&discovery_dir(&file))?;
    let config = engine.resolve_for(absolute(&file)?)?;

    print_effective_config(&config, format)
}

/// Check command implementation.
///
/// Without `--config`, every path is resolved against the configuration
/// discovered from that path, so paths from different projects can be
/// checked in one run.
pub fn check_command(
    sources: &ConfigSources,
    paths: Vec<PathBuf>,
    extensions: Vec<String>,
    format: OutputFormat,
    use_colors: bool,
) -> Result<()> {
    debug!("Running check command on paths: {:?}", paths);

    let mut groups: Vec<(PathBuf, Vec<PathBuf>)> = Vec::new();
    let mut engines: Vec<ResolutionEngine> = Vec::new();
    for path in &paths {
        let loaded = sources.load_config(&discovery_dir(path))?;
        let files = collect_files(std::slice::from_ref(path), &extensions)?;

        match groups.iter_mut().find(|(config, _)| *config == loaded.path) {
            Some((_, group)) => group.extend(files),
            None => {
                groups.push((loaded.path.clone(), files));
                engines.push(sources.engine_for(loaded)?);
            }
        }
    }

    let start = Instant::now();
    let mut files_checked = 0;
    let mut failures: Vec<CheckFailure> = Vec::new();
    for ((config, files), engine) in groups.iter().zip(&engines) {
        debug!("Checking {} file(s) against {}", files.len(), config.display());

        let targets = files
            .iter()
            .map(|file| absolute(file))
            .collect::<Result<Vec<_>>>()?;
        let results = engine.resolve_many(&targets);

        files_checked += files.len();
        failures.extend(files.iter().zip(results).filter_map(|(file, (_, result))| {
            result.err().map(|err| CheckFailure {
                path: file.clone(),
                kind: err.kind(),
                message: err.to_string(),
            })
        }));
    }
    let duration = start.elapsed();

    let report = CheckReport {
        files_checked,
        failures,
        duration,
    };
    OutputFormatter::new(format, use_colors).print_check_results(&report)?;

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Files named directly plus files under directories whose extension is listed
fn collect_files(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(StratumError::config_error(format!(
                "Path does not exist: {}",
                path.display()
            )));
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !is_skipped_dir(&entry.file_name().to_string_lossy())
            });

        for entry in walk_entries(walker) {
            let path = entry.path();

            if entry.file_type().is_file()
                && let Some(ext) = path.extension()
            {
                let ext_str = ext.to_string_lossy().to_lowercase();
                if extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').to_lowercase() == ext_str)
                {
                    files.push(path.to_path_buf());
                }
            }
        }
    }

    debug!("Collected {} file(s)", files.len());
    Ok(files)
}

/// Walk entries that could be read; unreadable ones are logged and skipped
fn walk_entries(
    walker: impl Iterator<Item = walkdir::Result<DirEntry>>,
) -> impl Iterator<Item = DirEntry> {
    walker.filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            let path = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            warn!("Skipping unreadable entry {}: {}", path, e);
            None
        }
    })
}

fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || SKIPPED_DIRS.contains(&name)
}

/// Chain command implementation
pub fn chain_command(sources: &ConfigSources) -> Result<()> {
    let engine = sources.load_engine(Path::new("."))?;
    let chain = engine.extends_chain();

    println!("Extends chain (most general first):");
    for (index, id) in chain.ids().enumerate() {
        println!("  {}. {}", index + 1, id);
    }
    println!("  {}. {} (root)", chain.len() + 1, engine.root().id());

    Ok(())
}

/// Rules command implementation
pub fn rules_command(sources: &ConfigSources, plugin: Option<String>) -> Result<()> {
    let registry = match &sources.registry {
        Some(_) => sources.load_registry(None)?,
        None => {
            let loaded = ConfigLoader::load_or_discover(sources.config.as_deref(), Path::new("."))?;
            sources.load_registry(Some(&loaded))?
        }
    };

    let plugin = plugin.map(|name| normalize_plugin_name(&name));
    if let Some(name) = &plugin
        && !registry.has_plugin(name)
    {
        return Err(StratumError::config_error(format!(
            "Plugin '{name}' is not registered"
        )));
    }

    println!("Available Rules:");
    println!("================");

    let mut count = 0;
    for rule in registry.rules() {
        if let Some(name) = &plugin
            && rule.plugin() != Some(name.as_str())
        {
            continue;
        }
        count += 1;
        println!("  {rule}");
    }

    if count == 0 {
        println!("\nNo rules found matching the specified filters.");
    } else {
        println!("\nTotal: {count} rules");
    }

    Ok(())
}

/// Schema command implementation
pub fn schema_command() -> Result<()> {
    let schema = layer_schema()?;
    let json = serde_json::to_string_pretty(&schema)
        .map_err(|e| StratumError::config_error(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}
