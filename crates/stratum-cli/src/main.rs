//! Stratum CLI
//!
//! Command-line interface for inspecting layered lint configurations

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use stratum_core::{Result, init_tracing_with_default};
use tracing::error;

#[derive(Parser)]
#[command(name = "stratum")]
#[command(about = "Stratum: resolve layered lint configurations per file")]
#[command(version = stratum_core::VERSION)]
#[command(
    long_about = "Stratum resolves layered lint configurations: extends chains, plugin\n\
declarations and glob-scoped overrides are folded into one effective configuration per file.\n\
\n\
Examples:\n  \
stratum print-config src/App.tsx       # Effective configuration for one file\n  \
stratum check src/                     # Resolve every source file under src/\n  \
stratum chain                          # Show the linearized extends chain\n  \
stratum rules --plugin react           # List rules registered by a plugin\n  \
stratum schema > stratumrc.schema.json # JSON Schema for configuration files"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.stratumrc.json/.jsonc/.yaml/.yml/.toml)"
    )]
    config: Option<PathBuf>,

    /// Registry manifest path
    #[arg(
        short,
        long,
        global = true,
        env = "STRATUM_REGISTRY",
        help = "Path to the plugin/rule registry manifest (default: stratum-registry.* next to the config)"
    )]
    registry: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration for a file
    PrintConfig {
        /// File to resolve
        #[arg(help = "File whose configuration should be printed")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "json", help = "Output format")]
        format: ConfigFormat,
    },

    /// Resolve the configuration of every matching file under the given paths
    Check {
        /// Files or directories to check
        #[arg(
            help = "Files or directories to process (default: current directory); each uses the configuration discovered from it unless --config is given"
        )]
        paths: Vec<PathBuf>,

        /// File extensions to include when walking directories
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "js,jsx,mjs,cjs,ts,tsx",
            help = "Comma-separated file extensions to check"
        )]
        ext: Vec<String>,

        /// Output format
        #[arg(
            short,
            long,
            default_value = "human",
            help = "Output format for the results"
        )]
        format: OutputFormat,
    },

    /// Print the linearized extends chain of the configuration
    Chain,

    /// List the rules known to the registry
    Rules {
        /// Only list rules of this plugin
        #[arg(long, help = "Only list rules of the given plugin")]
        plugin: Option<String>,
    },

    /// Print the JSON Schema of configuration files
    Schema,

    /// Show version information
    Version {
        /// Show detailed version information
        #[arg(long)]
        detailed: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return Ok(());
    }

    // Initialize colored output
    let use_colors = !cli.no_color && std::env::var("NO_COLOR").is_err();
    colored::control::set_override(use_colors);

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "stratum=error", // Only errors by default
        1 => "stratum=warn",  // Warnings on first -v
        2 => "stratum=info",  // Info on -vv
        3 => "stratum=debug", // Debug on -vvv
        _ => "stratum=trace", // Trace on -vvvv+
    };
    init_tracing_with_default(log_level);

    // Set thread pool size if specified
    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        std::process::exit(1);
    }

    match run_command(cli, use_colors) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Stratum failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn run_command(cli: Cli, use_colors: bool) -> Result<()> {
    let sources = commands::ConfigSources {
        config: cli.config,
        registry: cli.registry,
    };

    match cli.command {
        Some(Commands::PrintConfig { file, format }) => {
            commands::print_config_command(&sources, file, format)
        }

        Some(Commands::Check { paths, ext, format }) => {
            let paths = if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            };
            commands::check_command(&sources, paths, ext, format, use_colors)
        }

        Some(Commands::Chain) => commands::chain_command(&sources),

        Some(Commands::Rules { plugin }) => commands::rules_command(&sources, plugin),

        Some(Commands::Schema) => commands::schema_command(),

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("stratum {}", stratum_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
            } else {
                println!("{}", stratum_core::VERSION);
            }
            Ok(())
        }

        None => {
            // No subcommand provided, show help
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
