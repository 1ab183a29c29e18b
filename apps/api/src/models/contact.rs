use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bankruptcy chapter the client is filing under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Chapter {
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "13")]
    Thirteen,
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chapter::Seven => write!(f, "7"),
            Chapter::Thirteen => write!(f, "13"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub chapter: Chapter,
    pub avatar_color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationType {
    System,
    AttorneyMessage,
    AiFollowup,
    ClientResponse,
}

impl ConversationType {
    /// Outreach from the firm side, human or automated.
    pub fn is_outreach(self) -> bool {
        matches!(
            self,
            ConversationType::AttorneyMessage | ConversationType::AiFollowup
        )
    }
}

impl fmt::Display for ConversationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversationType::System => "system",
            ConversationType::AttorneyMessage => "attorney-message",
            ConversationType::AiFollowup => "ai-followup",
            ConversationType::ClientResponse => "client-response",
        };
        f.write_str(s)
    }
}

/// One timestamped interaction with a client. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub contact_id: String,
    #[serde(rename = "type")]
    pub kind: ConversationType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    Missing,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentItem {
    pub name: String,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentProgress {
    pub required: u32,
    pub uploaded: u32,
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormStatus {
    pub complete: bool,
    pub name: String,
}

/// Invoice totals in dollars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceStatus {
    pub total: f64,
    pub paid: f64,
    pub overdue: bool,
}

impl InvoiceStatus {
    pub fn unpaid(&self) -> f64 {
        self.total - self.paid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingItems {
    pub documents: DocumentProgress,
    pub forms: FormStatus,
    pub invoices: InvoiceStatus,
}

/// A contact enriched with everything the dashboard and the summary pipeline read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactWithContext {
    #[serde(flatten)]
    pub contact: Contact,
    pub conversations: Vec<Conversation>,
    pub pending_items: PendingItems,
    pub notes: Vec<String>,
    /// `None` means the client has never responded.
    pub last_client_response: Option<DateTime<Utc>>,
    pub follow_up_count: u32,
}

impl ContactWithContext {
    pub fn id(&self) -> &str {
        &self.contact.id
    }
}

/// Derived classification of how urgently a contact needs the attorney.
/// Always recomputed from current input, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    NeedsAttention,
    WaitingForYou,
    WaitingForThem,
}

impl ContactStatus {
    pub fn label(self) -> &'static str {
        match self {
            ContactStatus::NeedsAttention => "Needs attention",
            ContactStatus::WaitingForYou => "Waiting for you",
            ContactStatus::WaitingForThem => "Waiting for them",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContactStatus::NeedsAttention => "needs-attention",
            ContactStatus::WaitingForYou => "waiting-for-you",
            ContactStatus::WaitingForThem => "waiting-for-them",
        };
        f.write_str(s)
    }
}
