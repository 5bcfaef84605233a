//! Success-only teardown of the auxiliary container environment

use tokio::process::Command;
use tracing::{error, info};

use crate::error::{Result, RunnerError};
use crate::pipeline::ChildEnv;

/// One teardown invocation: a program plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct TeardownCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl std::fmt::Display for TeardownCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// The teardown sequence for a successful run: bring the compose project
/// down with all its images, then prune unused networks.
pub fn teardown_commands(compose_file: &str, build_id: &str) -> Vec<TeardownCommand> {
    vec![
        TeardownCommand {
            program: "docker-compose".to_string(),
            args: vec![
                "-f".to_string(),
                compose_file.to_string(),
                "-p".to_string(),
                build_id.to_string(),
                "down".to_string(),
                "--rmi".to_string(),
                "all".to_string(),
            ],
        },
        TeardownCommand {
            program: "docker".to_string(),
            args: vec![
                "network".to_string(),
                "prune".to_string(),
                "-f".to_string(),
            ],
        },
    ]
}

/// Runs the teardown commands in order. Stops at the first failure; the
/// caller logs the error but the build result is already decided.
pub async fn run_teardown(compose_file: &str, build_id: &str, env: &ChildEnv) -> Result<()> {
    for command in teardown_commands(compose_file, build_id) {
        info!("Running cleanup: {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        env.apply(&mut cmd);

        let output = cmd.output().await?;
        if !output.status.success() {
            let message = format!(
                "'{}' exited with {}: {}",
                command,
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
            error!("Cleanup failed: {}", message);
            return Err(RunnerError::CleanupFailed(message));
        }

        info!(
            "Cleanup output:\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_command_lines_are_exact() {
        let commands = teardown_commands("install/docker-compose_jenkins.yml", "77");
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0].to_string(),
            "docker-compose -f install/docker-compose_jenkins.yml -p 77 down --rmi all"
        );
        assert_eq!(commands[1].to_string(), "docker network prune -f");
    }

    #[test]
    fn compose_project_is_keyed_by_build_id() {
        let commands = teardown_commands("compose.yml", "build-123");
        let down = &commands[0];
        let p_idx = down.args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(down.args[p_idx + 1], "build-123");
    }
}
