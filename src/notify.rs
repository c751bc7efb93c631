use anyhow::{Context, Result};
use async_trait::async_trait;

/// Trait for delivering user-facing notifications. Sends are best-effort:
/// callers log a failed send and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Desktop notifier backed by the platform notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        let app_name = self.app_name.clone();
        let title = title.to_string();
        let message = message.to_string();

        // notify-rust blocks on the session bus, so keep it off the runtime
        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .appname(&app_name)
                .summary(&title)
                .body(&message)
                .show()
                .map(|_| ())
        })
        .await
        .context("Notification task panicked")?
        .context("Failed to show desktop notification")
    }
}

/// "You have N draft(s) in your Gmail", with singular and zero variants,
/// plus the empty count when there is one.
pub fn summary_message(total: usize, empty: usize) -> String {
    let mut message = match total {
        0 => "No drafts in your Gmail".to_string(),
        1 => "You have 1 draft in your Gmail".to_string(),
        n => format!("You have {} drafts in your Gmail", n),
    };
    if empty > 0 {
        message.push_str(&format!(" ({} empty)", empty));
    }
    message
}

pub fn cleanup_message(deleted: usize) -> String {
    format!("Deleted {} old empty draft(s)", deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_zero_drafts() {
        assert_eq!(summary_message(0, 0), "No drafts in your Gmail");
    }

    #[test]
    fn test_summary_singular() {
        assert_eq!(summary_message(1, 0), "You have 1 draft in your Gmail");
    }

    #[test]
    fn test_summary_plural_with_empty_count() {
        assert_eq!(
            summary_message(5, 2),
            "You have 5 drafts in your Gmail (2 empty)"
        );
    }

    #[test]
    fn test_summary_omits_zero_empty_count() {
        assert_eq!(summary_message(3, 0), "You have 3 drafts in your Gmail");
    }

    #[test]
    fn test_cleanup_message() {
        assert_eq!(cleanup_message(2), "Deleted 2 old empty draft(s)");
    }
}
