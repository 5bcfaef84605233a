use std::env;

use uuid::Uuid;

use crate::utils::{repo_from_git_url, short_commit};

/// Snapshot of the CI host environment for one pipeline run.
///
/// Populated once at run start and passed explicitly to whatever composes
/// the notification message; nothing reads these variables again later.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub git_url: String,
    pub git_commit: String,
    pub git_branch: String,
    pub build_id: String,
    pub build_url: String,
    /// Derived from `git_url`, e.g. "org/repo".
    pub repo_name: String,
    /// First 8 characters of `git_commit`.
    pub short_commit: String,
}

impl RunContext {
    /// Builds a context from explicit values, computing the derived fields.
    /// A missing `build_id` gets a generated UUIDv7 so cleanup and lock
    /// naming still work outside a CI host.
    pub fn new(
        git_url: String,
        git_commit: String,
        git_branch: String,
        build_id: Option<String>,
        build_url: String,
    ) -> Self {
        let repo_name = repo_from_git_url(&git_url);
        let short = short_commit(&git_commit).to_string();
        Self {
            git_url,
            git_commit,
            git_branch,
            build_id: build_id.unwrap_or_else(|| Uuid::now_v7().to_string()),
            build_url,
            repo_name,
            short_commit: short,
        }
    }

    /// Reads the standard CI variables from the process environment.
    pub fn from_env() -> Self {
        Self::new(
            env_or_empty("GIT_URL"),
            env_or_empty("GIT_COMMIT"),
            env_or_empty("GIT_BRANCH"),
            env::var("BUILD_ID").ok().filter(|v| !v.is_empty()),
            env_or_empty("BUILD_URL"),
        )
    }
}

fn env_or_empty(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_repo_name_and_short_commit() {
        let ctx = RunContext::new(
            "https://example.com/org/repo.git".to_string(),
            "a1b2c3d4e5f6".to_string(),
            "main".to_string(),
            Some("42".to_string()),
            "http://ci.local/job/42/".to_string(),
        );
        assert_eq!(ctx.repo_name, "org/repo");
        assert_eq!(ctx.short_commit, "a1b2c3d4");
        assert_eq!(ctx.build_id, "42");
    }

    #[test]
    fn missing_build_id_gets_generated() {
        let ctx = RunContext::new(
            String::new(),
            String::new(),
            String::new(),
            None,
            String::new(),
        );
        assert!(!ctx.build_id.is_empty());
    }
}
