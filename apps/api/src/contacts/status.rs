//! Status classification: maps a contact to one of three dashboard states.
//!
//! Rules are a strict priority cascade, first match wins:
//! 1. NeedsAttention: (follow-ups ≥ 3 AND ≥ 10 days since the client last replied)
//!    OR the invoice is overdue.
//! 2. WaitingForYou: the newest client response is newer than the newest
//!    attorney message / AI follow-up (or there is no outreach at all).
//! 3. WaitingForThem: everything else.
//!
//! Pure and total: no I/O, never fails.

use chrono::{DateTime, Utc};

use crate::models::contact::{ContactStatus, ContactWithContext, ConversationType};

const ESCALATION_FOLLOW_UPS: u32 = 3;
const ESCALATION_SILENT_DAYS: i64 = 10;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Day count used when the client has never responded. Compares greater than
/// any real day count, standing in for an infinite silence.
pub const NEVER_RESPONDED_DAYS: i64 = i64::MAX;

/// Whole days between two instants, order-independent, truncated toward zero.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (b - a).num_milliseconds().abs() / MILLIS_PER_DAY
}

/// Days since the client last responded, or [`NEVER_RESPONDED_DAYS`].
pub fn days_since_response(contact: &ContactWithContext, now: DateTime<Utc>) -> i64 {
    contact
        .last_client_response
        .map(|last| days_between(last, now))
        .unwrap_or(NEVER_RESPONDED_DAYS)
}

/// Classifies a contact against the current wall clock.
pub fn calculate_status(contact: &ContactWithContext) -> ContactStatus {
    calculate_status_at(contact, Utc::now())
}

/// Classifies a contact as of `now`.
pub fn calculate_status_at(contact: &ContactWithContext, now: DateTime<Utc>) -> ContactStatus {
    let silent_too_long = contact.follow_up_count >= ESCALATION_FOLLOW_UPS
        && days_since_response(contact, now) >= ESCALATION_SILENT_DAYS;

    if silent_too_long || contact.pending_items.invoices.overdue {
        return ContactStatus::NeedsAttention;
    }

    if has_unreviewed_client_action(contact) {
        return ContactStatus::WaitingForYou;
    }

    ContactStatus::WaitingForThem
}

/// True when the client has acted and nobody from the firm has replied since.
fn has_unreviewed_client_action(contact: &ContactWithContext) -> bool {
    let mut latest_client: Option<DateTime<Utc>> = None;
    let mut latest_outreach: Option<DateTime<Utc>> = None;

    for conversation in &contact.conversations {
        let slot = match conversation.kind {
            ConversationType::ClientResponse => &mut latest_client,
            kind if kind.is_outreach() => &mut latest_outreach,
            _ => continue,
        };
        if slot.map_or(true, |seen| conversation.timestamp > seen) {
            *slot = Some(conversation.timestamp);
        }
    }

    match (latest_client, latest_outreach) {
        (Some(_), None) => true,
        (Some(client), Some(outreach)) => client > outreach,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::contact::{
        Chapter, Contact, Conversation, DocumentProgress, FormStatus, InvoiceStatus, PendingItems,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
    }

    fn base_contact() -> ContactWithContext {
        ContactWithContext {
            contact: Contact {
                id: "test".to_string(),
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
                phone: "555-0100".to_string(),
                chapter: Chapter::Seven,
                avatar_color: "#ec4899".to_string(),
                created_at: now(),
            },
            conversations: vec![],
            pending_items: PendingItems {
                documents: DocumentProgress {
                    required: 6,
                    uploaded: 4,
                    items: vec![],
                },
                forms: FormStatus {
                    complete: true,
                    name: "Means Test".to_string(),
                },
                invoices: InvoiceStatus {
                    total: 1000.0,
                    paid: 1000.0,
                    overdue: false,
                },
            },
            notes: vec![],
            last_client_response: Some(now()),
            follow_up_count: 0,
        }
    }

    fn entry(id: &str, kind: ConversationType, days_ago: i64) -> Conversation {
        Conversation {
            id: id.to_string(),
            contact_id: "test".to_string(),
            kind,
            content: format!("{kind} entry"),
            timestamp: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_needs_attention_after_three_follow_ups_and_eleven_silent_days() {
        let mut contact = base_contact();
        contact.follow_up_count = 3;
        contact.last_client_response = Some(now() - Duration::days(11));
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::NeedsAttention
        );
    }

    #[test]
    fn test_one_follow_up_falls_through_to_later_rules() {
        let mut contact = base_contact();
        contact.follow_up_count = 1;
        contact.last_client_response = Some(now() - Duration::days(11));
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForThem
        );

        contact.conversations = vec![entry("1", ConversationType::ClientResponse, 11)];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForYou
        );
    }

    #[test]
    fn test_exactly_ten_days_is_enough() {
        let mut contact = base_contact();
        contact.follow_up_count = 3;
        contact.last_client_response = Some(now() - Duration::days(10));
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::NeedsAttention
        );

        contact.last_client_response = Some(now() - Duration::days(10) + Duration::minutes(1));
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForThem
        );
    }

    #[test]
    fn test_needs_attention_when_invoice_overdue() {
        let mut contact = base_contact();
        contact.pending_items.invoices = InvoiceStatus {
            total: 1000.0,
            paid: 500.0,
            overdue: true,
        };
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::NeedsAttention
        );
    }

    #[test]
    fn test_overdue_invoice_outranks_unreviewed_client_response() {
        let mut contact = base_contact();
        contact.pending_items.invoices.overdue = true;
        contact.conversations = vec![entry("1", ConversationType::ClientResponse, 0)];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::NeedsAttention
        );
    }

    #[test]
    fn test_never_responded_with_follow_ups_needs_attention() {
        let mut contact = base_contact();
        contact.follow_up_count = 3;
        contact.last_client_response = None;
        contact.conversations = vec![entry("1", ConversationType::ClientResponse, 0)];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::NeedsAttention
        );
    }

    #[test]
    fn test_never_responded_without_follow_ups_waits_for_them() {
        let mut contact = base_contact();
        contact.last_client_response = None;
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForThem
        );
    }

    #[test]
    fn test_waiting_for_you_when_client_has_unreviewed_action() {
        let mut contact = base_contact();
        contact.conversations = vec![entry("1", ConversationType::ClientResponse, 0)];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForYou
        );
    }

    #[test]
    fn test_newer_outreach_clears_client_action() {
        let mut contact = base_contact();
        contact.conversations = vec![
            entry("1", ConversationType::ClientResponse, 5),
            entry("2", ConversationType::AiFollowup, 2),
        ];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForThem
        );
    }

    #[test]
    fn test_unordered_conversations_use_latest_timestamps() {
        let mut contact = base_contact();
        contact.conversations = vec![
            entry("1", ConversationType::ClientResponse, 1),
            entry("2", ConversationType::AttorneyMessage, 3),
            entry("3", ConversationType::ClientResponse, 9),
            entry("4", ConversationType::System, 0),
        ];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForYou
        );
    }

    #[test]
    fn test_same_instant_is_not_unreviewed() {
        let mut contact = base_contact();
        contact.conversations = vec![
            entry("1", ConversationType::AttorneyMessage, 2),
            entry("2", ConversationType::ClientResponse, 2),
        ];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForThem
        );
    }

    #[test]
    fn test_system_entries_are_ignored() {
        let mut contact = base_contact();
        contact.conversations = vec![entry("1", ConversationType::System, 0)];
        assert_eq!(
            calculate_status_at(&contact, now()),
            ContactStatus::WaitingForThem
        );
    }

    #[test]
    fn test_waiting_for_them_as_default() {
        assert_eq!(
            calculate_status_at(&base_contact(), now()),
            ContactStatus::WaitingForThem
        );
    }

    #[test]
    fn test_days_between_counts_whole_days() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(days_between(a, b), 9);
        assert_eq!(days_between(b, a), 9);
        assert_eq!(days_between(a, a), 0);
    }

    #[test]
    fn test_days_between_truncates_partial_days() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = a + Duration::hours(47);
        assert_eq!(days_between(a, b), 1);
        assert_eq!(days_between(b, a), 1);
    }

    #[test]
    fn test_days_since_response_sentinel() {
        let mut contact = base_contact();
        contact.last_client_response = None;
        assert_eq!(days_since_response(&contact, now()), NEVER_RESPONDED_DAYS);
    }
}
