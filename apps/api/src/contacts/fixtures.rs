//! Seeded contact dataset and canned summaries.
//!
//! Dates are relative to the instant the store is seeded so the dataset keeps
//! producing the same statuses regardless of when the service starts.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::contact::{
    Chapter, Contact, ContactWithContext, Conversation, ConversationType, DocumentItem,
    DocumentProgress, DocumentStatus, FormStatus, InvoiceStatus, PendingItems,
};
use crate::summary::models::SummaryResult;

/// Read-only lookup over the seeded contacts and their canned summaries.
pub struct FixtureStore {
    contacts: Vec<ContactWithContext>,
    summaries: HashMap<String, SummaryResult>,
}

impl FixtureStore {
    pub fn new(contacts: Vec<ContactWithContext>, summaries: HashMap<String, SummaryResult>) -> Self {
        Self {
            contacts,
            summaries,
        }
    }

    /// The demo dataset, dated relative to `now`.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self::new(seed_contacts(now), seed_summaries())
    }

    pub fn list(&self) -> &[ContactWithContext] {
        &self.contacts
    }

    pub fn get(&self, id: &str) -> Option<&ContactWithContext> {
        self.contacts.iter().find(|c| c.contact.id == id)
    }

    pub fn canned_summary(&self, id: &str) -> Option<&SummaryResult> {
        self.summaries.get(id)
    }

    /// Case-insensitive substring match over name or email. Blank query matches all.
    pub fn search(&self, query: &str) -> Vec<&ContactWithContext> {
        let query = query.trim().to_lowercase();
        self.contacts
            .iter()
            .filter(|c| {
                query.is_empty()
                    || c.contact.name.to_lowercase().contains(&query)
                    || c.contact.email.to_lowercase().contains(&query)
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Seed data
// ────────────────────────────────────────────────────────────────────────────

struct Seed<'a> {
    now: DateTime<Utc>,
    contact_id: &'a str,
}

impl Seed<'_> {
    fn days_ago(&self, days: i64) -> DateTime<Utc> {
        self.now - Duration::days(days)
    }

    fn conversation(
        &self,
        id: &str,
        kind: ConversationType,
        content: &str,
        days_ago: i64,
    ) -> Conversation {
        Conversation {
            id: id.to_string(),
            contact_id: self.contact_id.to_string(),
            kind,
            content: content.to_string(),
            timestamp: self.days_ago(days_ago),
        }
    }
}

fn documents(required: u32, items: &[(&str, DocumentStatus)]) -> DocumentProgress {
    DocumentProgress {
        required,
        uploaded: items
            .iter()
            .filter(|(_, status)| *status == DocumentStatus::Uploaded)
            .count() as u32,
        items: items
            .iter()
            .map(|(name, status)| DocumentItem {
                name: name.to_string(),
                status: *status,
            })
            .collect(),
    }
}

fn form(name: &str, complete: bool) -> FormStatus {
    FormStatus {
        complete,
        name: name.to_string(),
    }
}

fn invoice(total: f64, paid: f64, overdue: bool) -> InvoiceStatus {
    InvoiceStatus {
        total,
        paid,
        overdue,
    }
}

fn notes(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

fn contact(
    seed: &Seed<'_>,
    name: &str,
    email: &str,
    phone: &str,
    chapter: Chapter,
    avatar_color: &str,
    created_days_ago: i64,
) -> Contact {
    Contact {
        id: seed.contact_id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        chapter,
        avatar_color: avatar_color.to_string(),
        created_at: seed.days_ago(created_days_ago),
    }
}

fn seed_contacts(now: DateTime<Utc>) -> Vec<ContactWithContext> {
    use ConversationType::{AiFollowup, AttorneyMessage, ClientResponse, System};
    use DocumentStatus::{Missing, Uploaded};

    let mut out = Vec::new();

    // Maria Garcia: three follow-ups, silent for weeks
    let s = Seed {
        now,
        contact_id: "maria-garcia",
    };
    out.push(ContactWithContext {
        contact: contact(&s, "Maria Garcia", "maria.garcia@email.com", "(555) 123-4567", Chapter::Seven, "#ec4899", 45),
        conversations: vec![
            s.conversation("conv-1", System, "Case initiated - Chapter 7 bankruptcy filing", 45),
            s.conversation("conv-2", AttorneyMessage, "Hi Maria, welcome! I need you to upload your pay stubs and bank statements to proceed with your filing.", 40),
            s.conversation("conv-3", ClientResponse, "Thank you! I uploaded some documents. Still looking for the pay stubs.", 38),
            s.conversation("conv-4", AiFollowup, "Hi Maria, checking in on those pay stubs. Do you need help locating them?", 30),
            s.conversation("conv-5", AiFollowup, "Maria, we still need your pay stubs and bank statements to move forward. Can you provide an update?", 20),
            s.conversation("conv-6", AiFollowup, "Hi Maria, following up again on the missing documents. Please let me know if you need assistance.", 12),
        ],
        pending_items: PendingItems {
            documents: documents(6, &[
                ("Tax Returns", Uploaded),
                ("ID Copy", Uploaded),
                ("Credit Report", Uploaded),
                ("Utility Bills", Uploaded),
                ("Pay Stubs (Last 3 months)", Missing),
                ("Bank Statements (Last 6 months)", Missing),
            ]),
            forms: form("Statement of Financial Affairs", false),
            invoices: invoice(1500.0, 500.0, false),
        },
        notes: notes(&[
            "Client is juggling two jobs - may be difficult to reach during business hours",
            "Expressed anxiety about the process, may need extra reassurance",
        ]),
        last_client_response: Some(s.days_ago(38)),
        follow_up_count: 3,
    });

    // John Smith: on track, recent follow-up
    let s = Seed {
        now,
        contact_id: "john-smith",
    };
    out.push(ContactWithContext {
        contact: contact(&s, "John Smith", "john.smith@email.com", "(555) 234-5678", Chapter::Thirteen, "#3b82f6", 30),
        conversations: vec![
            s.conversation("conv-7", System, "Case initiated - Chapter 13 bankruptcy filing", 30),
            s.conversation("conv-8", AttorneyMessage, "Hi John, thanks for choosing our firm. I've reviewed your initial documents and everything looks good so far.", 28),
            s.conversation("conv-9", ClientResponse, "Great! What are the next steps?", 27),
            s.conversation("conv-10", AttorneyMessage, "I need you to complete the repayment plan form and provide your last 3 pay stubs.", 26),
            s.conversation("conv-11", ClientResponse, "Just uploaded the pay stubs. Working on the repayment plan now.", 24),
            s.conversation("conv-12", AiFollowup, "Thanks for the pay stubs! Let me know if you have questions on the repayment plan form.", 5),
        ],
        pending_items: PendingItems {
            documents: documents(4, &[
                ("Tax Returns", Uploaded),
                ("Pay Stubs", Uploaded),
                ("Vehicle Registration", Uploaded),
                ("Mortgage Statement", Uploaded),
            ]),
            forms: form("Chapter 13 Repayment Plan", false),
            invoices: invoice(2500.0, 2500.0, false),
        },
        notes: notes(&["Very organized and responsive client"]),
        last_client_response: Some(s.days_ago(24)),
        follow_up_count: 1,
    });

    // David Chen: uploaded everything, awaiting review
    let s = Seed {
        now,
        contact_id: "david-chen",
    };
    out.push(ContactWithContext {
        contact: contact(&s, "David Chen", "david.chen@email.com", "(555) 345-6789", Chapter::Seven, "#10b981", 20),
        conversations: vec![
            s.conversation("conv-13", System, "Case initiated - Chapter 7 bankruptcy filing", 20),
            s.conversation("conv-14", AttorneyMessage, "Hi David, I need several documents to get started. Please upload your tax returns, pay stubs, and bank statements.", 18),
            s.conversation("conv-14b", ClientResponse, "Got it, I'll gather those documents this weekend.", 16),
            s.conversation("conv-15", AiFollowup, "Following up on those documents when you get a chance.", 10),
            s.conversation("conv-16", ClientResponse, "Sorry for the delay! Just uploaded everything.", 2),
        ],
        pending_items: PendingItems {
            documents: documents(5, &[
                ("Tax Returns (Last 2 years)", Uploaded),
                ("Pay Stubs", Uploaded),
                ("Bank Statements", Uploaded),
                ("Credit Card Statements", Uploaded),
                ("Lease Agreement", Uploaded),
            ]),
            forms: form("Means Test Calculation", true),
            invoices: invoice(1800.0, 900.0, false),
        },
        notes: notes(&[
            "Works night shifts - best to contact via email",
            "All documents uploaded, need attorney review",
        ]),
        last_client_response: Some(s.days_ago(2)),
        follow_up_count: 1,
    });

    // Sarah Johnson: complete, waiting on the court
    let s = Seed {
        now,
        contact_id: "sarah-johnson",
    };
    out.push(ContactWithContext {
        contact: contact(&s, "Sarah Johnson", "sarah.johnson@email.com", "(555) 456-7890", Chapter::Thirteen, "#f59e0b", 60),
        conversations: vec![
            s.conversation("conv-17", System, "Case initiated - Chapter 13 bankruptcy filing", 60),
            s.conversation("conv-18", AttorneyMessage, "Hi Sarah, great job on getting all your documents in! We're almost ready to file.", 15),
            s.conversation("conv-19", ClientResponse, "Thank you! What else do you need from me?", 14),
            s.conversation("conv-20", AttorneyMessage, "Just waiting on the court to process your credit counseling certificate. Should hear back next week.", 13),
            s.conversation("conv-21", AiFollowup, "Quick update: Still waiting on the court. I'll let you know as soon as we get approval.", 3),
        ],
        pending_items: PendingItems {
            documents: documents(6, &[
                ("Tax Returns", Uploaded),
                ("Pay Stubs", Uploaded),
                ("Bank Statements", Uploaded),
                ("Vehicle Title", Uploaded),
                ("Home Appraisal", Uploaded),
                ("Credit Counseling Certificate", Uploaded),
            ]),
            forms: form("Chapter 13 Plan", true),
            invoices: invoice(3000.0, 3000.0, false),
        },
        notes: notes(&[
            "Model client - very organized and proactive",
            "Court processing credit counseling certificate",
        ]),
        last_client_response: Some(s.days_ago(14)),
        follow_up_count: 1,
    });

    // Robert Wilson: overdue invoice and missing documents
    let s = Seed {
        now,
        contact_id: "robert-wilson",
    };
    out.push(ContactWithContext {
        contact: contact(&s, "Robert Wilson", "robert.wilson@email.com", "(555) 567-8901", Chapter::Seven, "#8b5cf6", 50),
        conversations: vec![
            s.conversation("conv-22", System, "Case initiated - Chapter 7 bankruptcy filing", 50),
            s.conversation("conv-23", AttorneyMessage, "Hi Robert, I need your tax returns and an updated list of creditors to proceed.", 48),
            s.conversation("conv-24", ClientResponse, "Will get those to you this week.", 46),
            s.conversation("conv-25", AiFollowup, "Checking in on those documents and the outstanding invoice.", 35),
            s.conversation("conv-26", AiFollowup, "Robert, we really need those documents to move forward. Also, your invoice is now 30 days past due.", 20),
            s.conversation("conv-27", ClientResponse, "I know, I'm sorry. Had some family emergencies. Will try to get everything sorted this week.", 18),
            s.conversation("conv-28", AiFollowup, "I understand things have been difficult. Let me know if we need to discuss a payment plan for the invoice.", 8),
        ],
        pending_items: PendingItems {
            documents: documents(5, &[
                ("ID Copy", Uploaded),
                ("Social Security Card", Uploaded),
                ("Tax Returns (Last 2 years)", Missing),
                ("Creditor List", Missing),
                ("Income Verification", Missing),
            ]),
            forms: form("Schedule of Assets and Liabilities", false),
            invoices: invoice(2000.0, 500.0, true),
        },
        notes: notes(&[
            "Experiencing personal difficulties - may need extra patience",
            "Invoice 45 days overdue - consider payment plan options",
        ]),
        last_client_response: Some(s.days_ago(18)),
        follow_up_count: 3,
    });

    out
}

fn seed_summaries() -> HashMap<String, SummaryResult> {
    let canned = [
        (
            "maria-garcia",
            "Maria is a Chapter 7 bankruptcy client who has been unresponsive for 12 days despite 3 follow-up attempts. She has uploaded 4/6 required documents but is missing pay stubs and bank statements.",
            Some("Hi Maria, I know gathering documents can be tough. Would a quick 5-minute call help? I can walk you through exactly what we need from your employer for the pay stubs."),
        ),
        (
            "john-smith",
            "John is a Chapter 13 client making steady progress. All documents have been uploaded and reviewed. He is currently working on the repayment plan form, with recent follow-up sent 5 days ago.",
            None,
        ),
        (
            "david-chen",
            "David uploaded all required documents 2 days ago after a brief delay. Everything appears complete and ready for attorney review to proceed with his Chapter 7 filing.",
            None,
        ),
        (
            "sarah-johnson",
            "Sarah is a model Chapter 13 client with all documents complete and forms filed. Case is waiting on court processing of her credit counseling certificate before final filing.",
            None,
        ),
        (
            "robert-wilson",
            "Robert has an overdue invoice (45 days past due) and is missing 3 critical documents despite 3 follow-up attempts. He mentioned family emergencies affecting his ability to provide documentation.",
            Some("Hi Robert, I want to help you through this difficult time. Let's schedule a brief call to discuss a payment plan for the invoice and figure out the easiest way to get those remaining documents. Would tomorrow afternoon work?"),
        ),
    ];

    canned
        .into_iter()
        .map(|(id, summary, escalation)| {
            (
                id.to_string(),
                SummaryResult {
                    summary: summary.to_string(),
                    escalation: escalation.map(str::to_string),
                },
            )
        })
        .collect()
}
