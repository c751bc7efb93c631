use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use tokio::time::MissedTickBehavior;

use crate::email::provider::DraftStore;
use crate::notify::{self, Notifier};
use crate::retention;

/// Outcome of one check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub total: usize,
    pub empty: usize,
    pub deleted: usize,
}

/// Drives the check cycles against the drafts mailbox and the notification
/// service. Holds no state of its own beyond the configured cleanup age;
/// every cycle rebuilds its draft snapshot from scratch.
pub struct Checker {
    store: Arc<dyn DraftStore>,
    notifier: Arc<dyn Notifier>,
    app_name: String,
    cleanup_age: Duration,
}

impl Checker {
    pub fn new(
        store: Arc<dyn DraftStore>,
        notifier: Arc<dyn Notifier>,
        app_name: impl Into<String>,
        cleanup_age: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            app_name: app_name.into(),
            cleanup_age,
        }
    }

    /// One full pass: list drafts, notify about the counts, delete empty
    /// drafts older than the cleanup age. Only a listing failure fails the
    /// cycle; failed notifications and failed per-draft deletions are
    /// logged and skipped.
    pub async fn run_check(&self) -> Result<CheckReport> {
        tracing::info!("Checking drafts...");

        let drafts = match self.store.list_drafts().await {
            Ok(drafts) => drafts,
            Err(err) => {
                self.notify_error(&err).await;
                return Err(err.context("Error listing drafts"));
            }
        };

        let total = drafts.len();
        let empty = drafts.iter().filter(|d| d.is_empty()).count();
        tracing::info!("Found {} draft(s) ({} empty)", total, empty);

        let summary = notify::summary_message(total, empty);
        if let Err(err) = self.notifier.notify(&self.app_name, &summary).await {
            tracing::warn!("Error sending notification: {:#}", err);
        }

        let now = Utc::now();
        let mut deleted = 0;
        for draft in drafts
            .iter()
            .filter(|d| retention::eligible_for_cleanup(d, now, self.cleanup_age))
        {
            let age = now - draft.created_at;
            tracing::info!(
                "Deleting empty draft (ID: {}, age: {}h)",
                draft.id,
                age.num_hours()
            );

            if let Err(err) = self.store.delete_draft(draft.id).await {
                tracing::warn!("Error deleting draft {}: {:#}", draft.id, err);
                continue;
            }
            deleted += 1;
        }

        if deleted > 0 {
            tracing::info!("Deleted {} old empty draft(s)", deleted);
            let message = notify::cleanup_message(deleted);
            if let Err(err) = self.notifier.notify(&self.app_name, &message).await {
                tracing::warn!("Error sending cleanup notification: {:#}", err);
            }
        }

        Ok(CheckReport {
            total,
            empty,
            deleted,
        })
    }

    /// Run checks at a fixed period until interrupted. The first tick fires
    /// immediately; cycles never overlap, and a tick that comes due while a
    /// check is still running is delayed rather than run concurrently. A
    /// failed cycle is logged and the loop waits for the next tick.
    pub async fn run_loop(&self, period: std::time::Duration) -> Result<()> {
        self.run_until(period, tokio::signal::ctrl_c()).await
    }

    /// The shutdown future is armed once, before the first cycle, so a
    /// signal raised while a check is in flight is still observed at the
    /// top of the next wait rather than dropped.
    async fn run_until<F>(&self, period: std::time::Duration, shutdown: F) -> Result<()>
    where
        F: std::future::Future,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.run_check().await {
                        tracing::error!("Error during check: {:#}", err);
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Interrupt received, shutting down");
                    return Ok(());
                }
            }
        }
    }

    async fn notify_error(&self, err: &anyhow::Error) {
        let title = format!("{} - Error", self.app_name);
        let message = format!("Error: {:#}", err);
        if let Err(notify_err) = self.notifier.notify(&title, &message).await {
            tracing::warn!("Error sending error notification: {:#}", notify_err);
        }
    }
}
