use anyhow::Result;
use async_trait::async_trait;

use super::draft::Draft;

/// Trait defining the operations this tool needs from the drafts mailbox.
/// Each backend (Gmail IMAP, a test double, ...) implements this.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Fetch a fresh snapshot of every draft in the drafts folder.
    async fn list_drafts(&self) -> Result<Vec<Draft>>;

    /// Delete a single draft by its id. A failure here only affects this id.
    async fn delete_draft(&self, id: u32) -> Result<()>;
}
