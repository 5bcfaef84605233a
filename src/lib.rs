pub mod cleanup;
pub mod context;
pub mod error;
pub mod lock;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod utils;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, RunnerError};
use crate::pipeline::Stage;

/// Identity of this pipeline definition; keys the cross-process run lock.
pub const PIPELINE_ID: &str = "simple_ci_runner";

#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Command for the Setup stage
    #[serde(default = "default_setup_command")]
    pub setup_command: String,
    /// Command for the Lint stage
    #[serde(default = "default_lint_command")]
    pub lint_command: String,
    /// Compose file used for success-only teardown
    #[serde(default = "default_compose_file")]
    pub compose_file: String,
    /// Chat webhook endpoint; SLACK_WEBHOOK_URL overrides this
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Prepended to PATH for every child process
    #[serde(default = "default_local_bin_dir")]
    pub local_bin_dir: String,
    /// Exported as DOCKER_HOST to every child process
    #[serde(default = "default_docker_host")]
    pub docker_host: String,
    /// Directory holding the run-lock file
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,
    /// Enables rolling file logs when set
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_setup_command() -> String {
    "python setup.py install".to_string()
}

fn default_lint_command() -> String {
    "pylint binance/binance.py".to_string()
}

fn default_compose_file() -> String {
    "install/docker-compose_jenkins.yml".to_string()
}

fn default_local_bin_dir() -> String {
    format!("{}/.local/bin", env::var("HOME").unwrap_or_default())
}

fn default_docker_host() -> String {
    "unix:///var/run/docker.sock".to_string()
}

fn default_lock_dir() -> PathBuf {
    env::temp_dir()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            setup_command: default_setup_command(),
            lint_command: default_lint_command(),
            compose_file: default_compose_file(),
            webhook_url: None,
            local_bin_dir: default_local_bin_dir(),
            docker_host: default_docker_host(),
            lock_dir: default_lock_dir(),
            log_dir: None,
        }
    }
}

impl RunnerConfig {
    /// Load and parse the configuration file; a missing file yields the
    /// built-in defaults.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path).map_err(|e| {
            RunnerError::ConfigError(format!("Failed to read config file '{}': {}", path, e))
        })?;

        let config: RunnerConfig = toml::from_str(&config_str).map_err(|e| {
            RunnerError::ConfigError(format!("Failed to parse config file '{}': {}", path, e))
        })?;

        Ok(config)
    }

    /// The two built-in stages, in execution order.
    pub fn stages(&self) -> Result<Vec<Stage>> {
        Ok(vec![
            Stage::from_command("Setup", &self.setup_command)?,
            Stage::from_command("Lint", &self.lint_command)?,
        ])
    }

    /// The webhook endpoint to notify, if any. The SLACK_WEBHOOK_URL
    /// environment variable takes precedence over the config file.
    pub fn resolve_webhook_url(&self) -> Option<String> {
        env::var("SLACK_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.webhook_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_the_original_pipeline() {
        let config = RunnerConfig::default();
        assert_eq!(config.setup_command, "python setup.py install");
        assert_eq!(config.lint_command, "pylint binance/binance.py");
        assert_eq!(config.compose_file, "install/docker-compose_jenkins.yml");
        assert_eq!(config.docker_host, "unix:///var/run/docker.sock");
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn empty_toml_parses_to_defaults() {
        let config: RunnerConfig = toml::from_str("").unwrap();
        assert_eq!(config.setup_command, RunnerConfig::default().setup_command);
    }

    #[test]
    fn toml_overrides_single_fields() {
        let config: RunnerConfig = toml::from_str(
            r#"
            lint_command = "pylint other.py"
            webhook_url = "https://hooks.example.com/T000/B000"
            "#,
        )
        .unwrap();
        assert_eq!(config.lint_command, "pylint other.py");
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.com/T000/B000")
        );
        // untouched fields keep their defaults
        assert_eq!(config.setup_command, "python setup.py install");
    }

    #[test]
    fn stages_come_out_in_order() {
        let stages = RunnerConfig::default().stages().unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name, "Setup");
        assert_eq!(stages[1].name, "Lint");
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = RunnerConfig::load("/definitely/not/a/real/path.toml").unwrap();
        assert_eq!(config.setup_command, "python setup.py install");
    }
}
