use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use step_patterns::{PatternConfig, PatternRegistry};
use step_translator::VariableTable;
use tokio::fs;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::output::LogFormat;
use crate::config::ItestConfig;

pub fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
    );
    // stdout carries command output
    match format {
        LogFormat::Human => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    Ok(())
}

pub struct LoadedConfig {
    pub config: ItestConfig,
    pub path: PathBuf,
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => {
            // Priority: ./config/itest.yaml > ~/.config/itest/itest.yaml
            let local_config = PathBuf::from("config/itest.yaml");
            if local_config.exists() {
                local_config
            } else {
                let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
                path.push("itest");
                path.push("itest.yaml");
                path
            }
        }
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;

        let config = ItestConfig::from_yaml_str(&content).context("Failed to parse config file")?;

        info!("Loaded configuration from: {}", config_path.display());
        Ok(LoadedConfig {
            config,
            path: config_path,
        })
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Ok(LoadedConfig {
            config: ItestConfig::default(),
            path: config_path,
        })
    }
}

/// Parses `KEY=VALUE` lines; blank lines and `#` comments are skipped.
pub fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(line = idx + 1, "invalid credentials entry; skipping");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        entries.push((key.to_string(), unescape_value(value.trim())));
    }
    entries
}

pub fn load_credentials(path: &Path) -> Vec<(String, String)> {
    if !path.exists() {
        debug!(path = %path.display(), "no credentials file");
        return Vec::new();
    }
    match stdfs::read_to_string(path) {
        Ok(contents) => {
            let entries = parse_env_file(&contents);
            info!(path = %path.display(), entries = entries.len(), "Loaded test credentials");
            entries
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read credentials file");
            Vec::new()
        }
    }
}

/// Credentials file overlaid by the process environment; never exported back.
pub fn build_variables(config: &ItestConfig) -> VariableTable {
    let credentials = load_credentials(&config.credentials_env);
    let process: Vec<(String, String)> = env::vars().collect();
    let table = VariableTable::layered([credentials, process]);
    debug!(variables = table.len(), "variable table ready");
    table
}

/// Builtins plus the custom file; a broken custom file falls back to builtins.
pub fn build_registry(patterns_path: &Path) -> PatternRegistry {
    let custom = match PatternConfig::load(patterns_path) {
        Ok(custom) => custom,
        Err(err) => {
            warn!(path = %patterns_path.display(), error = %err, "custom patterns ignored");
            return PatternRegistry::builtin_only();
        }
    };
    match PatternRegistry::with_custom(custom.as_ref()) {
        Ok(registry) => registry,
        Err(err) => {
            warn!(path = %patterns_path.display(), error = %err, "custom patterns ignored");
            PatternRegistry::builtin_only()
        }
    }
}

fn unescape_value(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\r", "\r")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn env_file_skips_comments_and_unquotes() {
        let entries = parse_env_file(
            "# login\nUSERNAME=alice\n\nPASSWORD=\"p@ss \\\"word\\\"\"\nbroken line\n=orphan\n",
        );
        assert_eq!(
            entries,
            vec![
                ("USERNAME".to_string(), "alice".to_string()),
                ("PASSWORD".to_string(), "p@ss \"word\"".to_string()),
            ]
        );
    }

    #[test]
    fn missing_credentials_file_is_empty() {
        assert!(load_credentials(Path::new("/nonexistent/credentials.env")).is_empty());
    }

    #[test]
    #[serial_test::serial]
    fn process_environment_wins_over_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.env");
        std::fs::write(&creds, "ITEST_LAYER_CHECK=file\nITEST_FILE_ONLY=kept\n").unwrap();
        env::set_var("ITEST_LAYER_CHECK", "process");
        let config = ItestConfig {
            credentials_env: creds,
            ..ItestConfig::default()
        };
        let vars = build_variables(&config);
        env::remove_var("ITEST_LAYER_CHECK");
        assert_eq!(vars.get("ITEST_LAYER_CHECK"), Some("process"));
        assert_eq!(vars.get("ITEST_FILE_ONLY"), Some("kept"));
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("itest.yaml");
        std::fs::write(&path, "agent_max_steps: 5\npersist_extracted: false\n").unwrap();
        let loaded = tokio_test::block_on(load_config(Some(&path))).unwrap();
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.config.agent_max_steps, 5);
        assert!(!loaded.config.persist_extracted);

        let missing = dir.path().join("absent.yaml");
        let loaded = tokio_test::block_on(load_config(Some(&missing))).unwrap();
        assert_eq!(loaded.config, ItestConfig::default());
    }

    #[test]
    fn custom_patterns_extend_builtins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "patterns:\n  act:\n    - name: press_enter\n      pattern: \"按回车\\\\s*(.*)\"\n      groups: [element]\n      priority: 120\n      description: Press enter"
        )
        .unwrap();
        let registry = build_registry(file.path());
        assert!(registry.find("press_enter").is_some());
        assert_eq!(registry.stats().custom, 1);
    }

    #[test]
    fn broken_custom_patterns_fall_back_to_builtins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "patterns:\n  act:\n    - name: bad\n      pattern: \"([unclosed\"\n      description: broken"
        )
        .unwrap();
        let registry = build_registry(file.path());
        assert!(registry.find("bad").is_none());
        assert_eq!(registry.stats().custom, 0);
        assert!(registry.stats().builtin > 0);
    }
}
