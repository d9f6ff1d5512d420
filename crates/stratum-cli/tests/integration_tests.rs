//! Integration tests for the Stratum CLI
//!
//! These tests verify the CLI behavior end-to-end

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const REGISTRY: &str = r#"
{
  "coreRules": ["semi", "quotes", "no-console"],
  "configs": {
    "eslint:recommended": { "rules": { "no-console": "warn" } }
  },
  "plugins": {
    "eslint-plugin-react": {
      "rules": ["prop-types", "jsx-uses-react"],
      "configs": {
        "recommended": { "plugins": ["react"], "rules": { "react/prop-types": "error" } }
      }
    }
  }
}
"#;

/// Helper function to create a test CLI command
#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("stratum").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("STRATUM_REGISTRY");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Helper function to create a temporary project with a config, a registry and sources
fn create_test_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write(root, "stratum-registry.json", REGISTRY);
    write(
        root,
        ".stratumrc.json",
        r#"{
  "root": true,
  "extends": ["eslint:recommended", "./config/base.json", "plugin:react/recommended"],
  "parserOptions": { "ecmaVersion": 2020 },
  "rules": { "semi": ["error", "always"] },
  "overrides": [
    { "files": ["**/*.tsx"], "rules": { "react/prop-types": "off" } }
  ]
}"#,
    );
    write(
        root,
        "config/base.json",
        r#"{ "parserOptions": { "ecmaVersion": 2018, "sourceType": "script" }, "rules": { "quotes": "warn" } }"#,
    );
    write(root, "src/index.ts", "export {};\n");
    write(root, "src/App.tsx", "export {};\n");
    write(root, "src/notes.md", "# notes\n");

    temp_dir
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stratum resolves layered lint configurations"))
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_version_command() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(VERSION));
}

#[test]
fn test_version_detailed() {
    cli()
        .args(["version", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Build information:"));
}

#[test]
fn test_generate_completion() {
    cli()
        .args(["--generate-completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stratum"));
}

#[test]
fn test_schema_command() {
    let output = cli().arg("schema").assert().success().get_output().clone();
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(schema["properties"]["parserOptions"].is_object());
    assert!(schema["properties"]["overrides"].is_object());
}

#[test]
fn test_print_config_json() {
    let project = create_test_project();

    let output = cli()
        .current_dir(project.path())
        .args(["print-config", "src/App.tsx"])
        .assert()
        .success()
        .get_output()
        .clone();

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["parserOptions"]["ecmaVersion"], 2020);
    assert_eq!(config["parserOptions"]["sourceType"], "script");
    assert_eq!(config["plugins"], serde_json::json!(["react"]));
    assert_eq!(config["rules"]["semi"], serde_json::json!(["error", "always"]));
    assert_eq!(config["rules"]["quotes"], serde_json::json!(["warn"]));
    assert_eq!(config["rules"]["no-console"], serde_json::json!(["warn"]));
    assert_eq!(config["rules"]["react/prop-types"], serde_json::json!(["off"]));
}

#[test]
fn test_print_config_yaml() {
    let project = create_test_project();

    cli()
        .current_dir(project.path())
        .args(["print-config", "src/index.ts", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parserOptions:"))
        .stdout(predicate::str::contains("react/prop-types:"));
}

#[test]
fn test_print_config_with_explicit_paths() {
    let project = create_test_project();
    let config = project.path().join(".stratumrc.json");
    let registry = project.path().join("stratum-registry.json");

    cli()
        .arg("print-config")
        .arg(project.path().join("src/index.ts"))
        .arg("--config")
        .arg(&config)
        .arg("--registry")
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"semi\""));
}

#[test]
fn test_check_success() {
    let project = create_test_project();

    cli()
        .current_dir(project.path())
        .args(["--no-color", "check", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files checked: 2"))
        .stdout(predicate::str::contains("Failed").not());
}

#[test]
fn test_check_reports_per_file_failures() {
    let project = create_test_project();
    write(
        project.path(),
        ".stratumrc.json",
        r#"{
  "rules": { "semi": "error" },
  "overrides": [
    { "files": ["*.tsx"], "rules": { "vue/no-v-html": "error" } }
  ]
}"#,
    );

    cli()
        .current_dir(project.path())
        .args(["--no-color", "check", "src"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("App.tsx: unknown-plugin"))
        .stdout(predicate::str::contains("index.ts").not())
        .stdout(predicate::str::contains("Failed: 1"));
}

#[test]
fn test_check_uses_each_paths_own_config() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write(root, "app/stratum-registry.json", REGISTRY);
    write(
        root,
        "app/.stratumrc.json",
        r#"{ "root": true, "rules": { "semi": "error" } }"#,
    );
    write(root, "app/src/index.ts", "export {};\n");
    write(
        root,
        "lib/.stratumrc.json",
        r#"{
  "root": true,
  "overrides": [{ "files": ["*.ts"], "rules": { "vue/no-v-html": "error" } }]
}"#,
    );
    write(root, "lib/main.ts", "export {};\n");

    cli()
        .current_dir(root)
        .args(["--no-color", "check", "app"])
        .assert()
        .success();

    cli()
        .current_dir(root)
        .args(["--no-color", "check", "app", "lib"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("main.ts: unknown-plugin"))
        .stdout(predicate::str::contains("Files checked: 2"))
        .stdout(predicate::str::contains("Failed: 1"));
}

#[test]
fn test_check_json_output() {
    let project = create_test_project();

    let output = cli()
        .current_dir(project.path())
        .args(["check", "src", "--format", "json", "--ext", "ts,tsx,md"])
        .assert()
        .success()
        .get_output()
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["filesChecked"], 3);
    assert_eq!(report["resolved"], 3);
    assert_eq!(report["failures"], serde_json::json!([]));
}

#[test]
fn test_chain_command() {
    let project = create_test_project();

    cli()
        .current_dir(project.path())
        .arg("chain")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. eslint:recommended"))
        .stdout(predicate::str::contains("base.json"))
        .stdout(predicate::str::contains("3. plugin:react/recommended"))
        .stdout(predicate::str::contains("(root)"));
}

#[test]
fn test_rules_command() {
    let project = create_test_project();

    cli()
        .current_dir(project.path())
        .args(["rules", "--plugin", "react"])
        .assert()
        .success()
        .stdout(predicate::str::contains("react/prop-types"))
        .stdout(predicate::str::contains("semi").not())
        .stdout(predicate::str::contains("Total: 2 rules"));

    cli()
        .current_dir(project.path())
        .args(["rules", "--plugin", "vue"])
        .assert()
        .failure();
}

#[test]
fn test_cyclic_extends_fails() {
    let project = create_test_project();
    write(project.path(), ".stratumrc.json", r#"{ "extends": "./a.json" }"#);
    write(project.path(), "a.json", r#"{ "extends": "./b.json" }"#);
    write(project.path(), "b.json", r#"{ "extends": "./a.json" }"#);

    cli()
        .current_dir(project.path())
        .args(["print-config", "src/index.ts"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cyclic extends"));
}

#[test]
fn test_missing_config_fails() {
    let temp_dir = TempDir::new().unwrap();

    cli()
        .current_dir(temp_dir.path())
        .args(["print-config", "a.js", "--config", "nowhere.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}
