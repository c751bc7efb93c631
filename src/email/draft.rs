use chrono::{DateTime, Utc};

/// One node of a message's MIME content tree. Container parts carry a size
/// of zero and hold their children in `parts`; leaf parts carry the size of
/// their decoded body.
#[derive(Debug, Clone, Default)]
pub struct DraftPart {
    pub size: u64,
    pub parts: Vec<DraftPart>,
}

/// Snapshot of one remote draft, rebuilt from scratch every check cycle.
/// The id is the IMAP UID and is only trusted within the cycle that
/// fetched it.
#[derive(Debug, Clone)]
pub struct Draft {
    pub id: u32,
    pub message_id: String,
    pub subject: String,
    pub recipient: String,
    pub created_at: DateTime<Utc>,
    pub body: Option<DraftPart>,
}

/// Whether any part of a content tree carries a non-zero body. Depth-first
/// with early exit on the first positive-size part; a part with size zero
/// and no sub-parts has no content.
pub fn has_body_content(part: Option<&DraftPart>) -> bool {
    match part {
        None => false,
        Some(part) => {
            if part.size > 0 {
                return true;
            }
            part.parts.iter().any(|p| has_body_content(Some(p)))
        }
    }
}

impl Draft {
    /// A draft counts as empty only with an exactly-empty subject, an
    /// exactly-empty recipient, and no body content at any depth. A
    /// whitespace-only subject or recipient is NOT empty.
    pub fn is_empty(&self) -> bool {
        self.subject.is_empty()
            && self.recipient.is_empty()
            && !has_body_content(self.body.as_ref())
    }
}
