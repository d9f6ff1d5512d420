//! Output formatting and reporting

use colored::*;
use std::path::PathBuf;
use std::time::Duration;
use stratum_core::{EffectiveConfig, ErrorKind, Result, StratumError};

use crate::{ConfigFormat, OutputFormat};

/// One file whose configuration could not be resolved
#[derive(Debug, Clone)]
pub struct CheckFailure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

/// Result of a check run
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub files_checked: usize,
    pub failures: Vec<CheckFailure>,
    pub duration: Duration,
}

impl CheckReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn resolved(&self) -> usize {
        self.files_checked - self.failures.len()
    }
}

/// Output formatter for different formats
pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        Self { format, use_colors }
    }

    /// Format and print check results
    pub fn print_check_results(&self, report: &CheckReport) -> Result<()> {
        match self.format {
            OutputFormat::Human => self.print_human_format(report),
            OutputFormat::Json => self.print_json_format(report),
        }
    }

    fn print_human_format(&self, report: &CheckReport) -> Result<()> {
        for failure in &report.failures {
            let kind = if self.use_colors {
                failure.kind.as_str().red().bold().to_string()
            } else {
                failure.kind.as_str().to_string()
            };
            println!("{}: {} {}", failure.path.display(), kind, failure.message);
        }

        println!("\n{}", "Summary:".bold());
        println!("  Files checked: {}", report.files_checked);
        println!("  Resolved: {}", report.resolved().to_string().green());
        if report.has_failures() {
            println!("  Failed: {}", report.failures.len().to_string().red());
        }
        println!("  Time: {}", utils::format_duration(report.duration));

        Ok(())
    }

    fn print_json_format(&self, report: &CheckReport) -> Result<()> {
        let failures: Vec<serde_json::Value> = report
            .failures
            .iter()
            .map(|failure| {
                serde_json::json!({
                    "path": failure.path.display().to_string(),
                    "kind": failure.kind.as_str(),
                    "message": failure.message,
                })
            })
            .collect();

        let result = serde_json::json!({
            "filesChecked": report.files_checked,
            "resolved": report.resolved(),
            "failures": failures,
        });

        println!(
            "{}",
            serde_json::to_string_pretty(&result).map_err(|e| StratumError::config_error(
                format!("Failed to serialize JSON: {e}")
            ))?
        );

        Ok(())
    }
}

/// Print an effective configuration in the requested format
pub fn print_effective_config(config: &EffectiveConfig, format: ConfigFormat) -> Result<()> {
    let rendered = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| StratumError::config_error(format!("Failed to serialize JSON: {e}")))?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)
            .map_err(|e| StratumError::config_error(format!("Failed to serialize YAML: {e}")))?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Utility functions for output formatting
pub mod utils {
    /// Format duration in human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_ms = duration.as_millis();

        if total_ms < 1000 {
            format!("{total_ms}ms")
        } else if total_ms < 60_000 {
            format!("{:.1}s", total_ms as f64 / 1000.0)
        } else {
            let minutes = total_ms / 60_000;
            let seconds = (total_ms % 60_000) as f64 / 1000.0;
            format!("{minutes}m {seconds:.1}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(utils::format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(utils::format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(utils::format_duration(Duration::from_secs(90)), "1m 30.0s");
    }

    #[test]
    fn test_report_counts() {
        let report = CheckReport {
            files_checked: 3,
            failures: vec![CheckFailure {
                path: PathBuf::from("a.js"),
                kind: ErrorKind::UnknownRule,
                message: "Unknown rule 'x' in layer 'root'".to_string(),
            }],
            duration: Duration::ZERO,
        };
        assert!(report.has_failures());
        assert_eq!(report.resolved(), 2);
    }
}
