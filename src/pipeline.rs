use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{error, info};

use crate::RunnerConfig;
use crate::error::{Result, RunnerError};

/// Maximum size for captured stage output before truncation (1MB)
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Terminal (or in-flight) result of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Matches the result strings a build page shows
        let s = match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILURE",
        };
        write!(f, "{}", s)
    }
}

/// One named unit of work: a program plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
}

impl Stage {
    /// Splits a whitespace-separated command line into program and args.
    pub fn from_command(name: &str, command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            RunnerError::ConfigError(format!("Empty command for stage '{}'", name))
        })?;
        Ok(Self {
            name: name.to_string(),
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }

    /// The command line as it will be logged.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Environment handed to every child process: PATH with the local bin
/// directory prepended, and DOCKER_HOST pinned to the configured socket.
#[derive(Debug, Clone)]
pub struct ChildEnv {
    pub path: String,
    pub docker_host: String,
}

impl ChildEnv {
    pub fn from_config(config: &RunnerConfig) -> Self {
        let base = std::env::var("PATH").unwrap_or_default();
        let path = if base.is_empty() {
            config.local_bin_dir.clone()
        } else {
            format!("{}:{}", config.local_bin_dir, base)
        };
        Self {
            path,
            docker_host: config.docker_host.clone(),
        }
    }

    pub fn apply(&self, cmd: &mut Command) {
        cmd.env("PATH", &self.path).env("DOCKER_HOST", &self.docker_host);
    }
}

/// Record of a single pipeline run with its execution details
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub build_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub output: Option<String>,
    pub output_truncated: bool,
    pub error: Option<String>,
}

impl RunRecord {
    /// Create a new record in Running status
    pub fn new(build_id: String) -> Self {
        Self {
            build_id,
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            output: None,
            output_truncated: false,
            error: None,
        }
    }

    /// Mark the run as successful with output (truncates if too large)
    pub fn mark_success(&mut self, mut output: String) {
        self.status = RunStatus::Success;
        self.completed_at = Some(Utc::now());

        if output.len() > MAX_OUTPUT_SIZE {
            // Back the cut point up to a char boundary; lossy-decoded
            // output can put a multibyte character across the limit
            let mut cut = MAX_OUTPUT_SIZE;
            while !output.is_char_boundary(cut) {
                cut -= 1;
            }
            output.truncate(cut);
            output.push_str("\n... (output truncated)");
            self.output_truncated = true;
        }

        self.output = Some(output);
    }

    /// Mark the run as failed with error
    pub fn mark_failed(&mut self, error: String) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Wall-clock time between start and completion (or now, if still running).
    pub fn elapsed(&self) -> std::time::Duration {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - self.started_at).to_std().unwrap_or_default()
    }
}

/// Runs one stage to completion, blocking until its child process exits.
/// Returns the captured stdout, or an error carrying the stage's stderr.
pub async fn run_stage(stage: &Stage, env: &ChildEnv) -> Result<String> {
    info!("Running stage '{}': {}", stage.name, stage.command_line());

    let mut cmd = Command::new(&stage.program);
    cmd.args(&stage.args);
    env.apply(&mut cmd);

    let output = cmd.output().await.map_err(|e| {
        error!("Stage '{}' failed to start: {}", stage.name, e);
        RunnerError::SpawnFailed {
            stage: stage.name.clone(),
            source: e,
        }
    })?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        info!("Stage '{}' output:\n{}", stage.name, stdout);
        Ok(stdout)
    } else {
        let message = String::from_utf8_lossy(&output.stderr).to_string();
        error!("Stage '{}' failed:\n{}", stage.name, message);
        Err(RunnerError::StageFailed {
            stage: stage.name.clone(),
            message,
        })
    }
}

/// Runs the stages strictly in order, stopping at the first failure.
/// The record ends up Success with the combined output, or Failed with the
/// failing stage's error; remaining stages are skipped.
pub async fn run_pipeline(stages: &[Stage], env: &ChildEnv, record: &mut RunRecord) {
    let mut combined = String::new();

    for stage in stages {
        match run_stage(stage, env).await {
            Ok(output) => {
                combined.push_str(&output);
            }
            Err(e) => {
                record.mark_failed(e.to_string());
                return;
            }
        }
    }

    record.mark_success(combined);
}
