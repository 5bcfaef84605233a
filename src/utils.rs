use std::time::Duration;

/// Extracts the repository name from a git URL.
///
/// Takes everything after the last `://host/` or `:` segment and strips a
/// trailing `.git`, so both `https://example.com/org/repo.git` and
/// `git@example.com:org/repo.git` yield `org/repo`.
pub fn repo_from_git_url(git_url: &str) -> String {
    let trimmed = git_url.strip_suffix(".git").unwrap_or(git_url);

    let path = match trimmed.split_once("://") {
        // scheme://host/path -> path
        Some((_, after_scheme)) => match after_scheme.split_once('/') {
            Some((_, path)) => path,
            None => after_scheme,
        },
        // host:path (scp-like) -> path
        None => match trimmed.rsplit_once(':') {
            Some((_, path)) => path,
            None => trimmed,
        },
    };

    path.to_string()
}

/// Returns the abbreviated commit hash: the first 8 characters of the full
/// revision, or the whole string when it is shorter than 8.
pub fn short_commit(commit: &str) -> &str {
    commit.get(..8).unwrap_or(commit)
}

/// Formats an elapsed duration the way a build page would show it,
/// e.g. "1 hr 2 min 3 sec" or "45 sec".
pub fn humanize_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    if total_secs == 0 {
        return format!("{:.2} sec", duration.as_secs_f64());
    }

    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{} hr", hours));
    }
    if mins > 0 {
        parts.push(format!("{} min", mins));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{} sec", secs));
    }
    parts.join(" ")
}

/// Strips the " and counting" suffix a CI host appends to the duration of a
/// still-running build.
pub fn strip_counting_suffix(duration_text: &str) -> &str {
    duration_text
        .strip_suffix(" and counting")
        .unwrap_or(duration_text)
}
