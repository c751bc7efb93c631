use chrono::{DateTime, Duration, Utc};

use crate::email::draft::Draft;

/// Whether a draft qualifies for cleanup: it must classify as empty and its
/// creation time must lie strictly before `now - cleanup_age`. Non-empty
/// drafts never qualify, whatever their age.
///
/// Drafts the server supplied no internal date for carry the Unix epoch and
/// therefore always fall past the cutoff once empty.
pub fn eligible_for_cleanup(draft: &Draft, now: DateTime<Utc>, cleanup_age: Duration) -> bool {
    draft.is_empty() && draft.created_at < now - cleanup_age
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::draft::DraftPart;

    fn draft(subject: &str, created_at: DateTime<Utc>) -> Draft {
        Draft {
            id: 7,
            message_id: String::new(),
            subject: subject.to_string(),
            recipient: String::new(),
            created_at,
            body: None,
        }
    }

    #[test]
    fn test_old_empty_draft_is_eligible() {
        let now = Utc::now();
        let d = draft("", now - Duration::days(10));
        assert!(eligible_for_cleanup(&d, now, Duration::days(7)));
    }

    #[test]
    fn test_young_empty_draft_is_kept() {
        let now = Utc::now();
        let d = draft("", now - Duration::days(1));
        assert!(!eligible_for_cleanup(&d, now, Duration::days(7)));
    }

    #[test]
    fn test_non_empty_draft_never_eligible() {
        let now = Utc::now();
        let d = draft("Hi", now - Duration::days(30));
        assert!(!eligible_for_cleanup(&d, now, Duration::days(7)));

        let mut with_body = draft("", now - Duration::days(30));
        with_body.body = Some(DraftPart {
            size: 12,
            parts: vec![],
        });
        assert!(!eligible_for_cleanup(&with_body, now, Duration::days(7)));
    }

    #[test]
    fn test_eligibility_is_monotonic_as_drafts_age() {
        let now = Utc::now();
        let d = draft("", now - Duration::days(8));
        assert!(eligible_for_cleanup(&d, now, Duration::days(7)));
        // Once eligible, a draft stays eligible at every later instant.
        for days in [1, 10, 100] {
            assert!(eligible_for_cleanup(
                &d,
                now + Duration::days(days),
                Duration::days(7)
            ));
        }
    }

    #[test]
    fn test_exactly_at_cutoff_is_kept() {
        // Strictly-before comparison: a draft exactly cleanup_age old stays.
        let now = Utc::now();
        let d = draft("", now - Duration::days(7));
        assert!(!eligible_for_cleanup(&d, now, Duration::days(7)));
    }

    #[test]
    fn test_epoch_timestamp_is_always_past_cutoff() {
        // Drafts without a server-supplied date carry the epoch and become
        // eligible the moment they classify as empty. Surprising but
        // faithful to the upstream behavior.
        let d = draft("", DateTime::UNIX_EPOCH);
        assert!(eligible_for_cleanup(&d, Utc::now(), Duration::days(7)));
    }
}
