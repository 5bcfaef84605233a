//! Webhook notification for run outcomes

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::context::RunContext;
use crate::error::Result;
use crate::pipeline::RunStatus;
use crate::utils::strip_counting_suffix;

/// Request timeout for webhook delivery
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A composed status message ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub text: String,
    pub color: &'static str,
}

/// Formats the outcome of a run into the chat message, color-coded "good"
/// on success and "danger" otherwise. Any " and counting" suffix on the
/// duration text is stripped first.
pub fn compose(ctx: &RunContext, status: &RunStatus, duration: &str) -> Notification {
    let color = if *status == RunStatus::Success {
        "good"
    } else {
        "danger"
    };

    let text = format!(
        "Repo: {}\nResult: {}\nCommit: {}\nBranch: {}\nExecution time: {}\nURL: (<{}|Open>)",
        ctx.repo_name,
        status,
        ctx.short_commit,
        ctx.git_branch,
        strip_counting_suffix(duration),
        ctx.build_url,
    );

    Notification { text, color }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    attachments: Vec<Attachment<'a>>,
}

#[derive(Debug, Serialize)]
struct Attachment<'a> {
    color: &'a str,
    text: &'a str,
}

/// Posts notifications to a chat webhook endpoint
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { url, client })
    }

    /// Delivers the notification as a single JSON attachment. No retries;
    /// a non-2xx response is an error for the caller to log.
    pub async fn send(&self, notification: &Notification) -> Result<()> {
        let payload = WebhookPayload {
            attachments: vec![Attachment {
                color: notification.color,
                text: &notification.text,
            }],
        };

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        info!("Webhook notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RunContext {
        RunContext::new(
            "https://example.com/org/repo.git".to_string(),
            "a1b2c3d4e5f6".to_string(),
            "main".to_string(),
            Some("42".to_string()),
            "http://ci.local/job/42/".to_string(),
        )
    }

    #[test]
    fn success_message_matches_expected_format() {
        let note = compose(&context(), &RunStatus::Success, "1 min 30 sec");
        assert_eq!(note.color, "good");
        assert_eq!(
            note.text,
            "Repo: org/repo\nResult: SUCCESS\nCommit: a1b2c3d4\nBranch: main\n\
             Execution time: 1 min 30 sec\nURL: (<http://ci.local/job/42/|Open>)"
        );
    }

    #[test]
    fn failure_message_uses_danger_color() {
        let note = compose(&context(), &RunStatus::Failed, "12 sec");
        assert_eq!(note.color, "danger");
        assert!(note.text.contains("Result: FAILURE"));
    }

    #[test]
    fn counting_suffix_never_reaches_the_message() {
        let note = compose(&context(), &RunStatus::Success, "1 min 30 sec and counting");
        assert!(note.text.contains("Execution time: 1 min 30 sec\n"));
        assert!(!note.text.contains("and counting"));
    }

    #[test]
    fn payload_serializes_as_slack_attachment() {
        let payload = WebhookPayload {
            attachments: vec![Attachment {
                color: "good",
                text: "hello",
            }],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["attachments"][0]["color"], "good");
        assert_eq!(value["attachments"][0]["text"], "hello");
    }
}
