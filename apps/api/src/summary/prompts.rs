// Prompt constants for the contact summary pipeline.

/// Name of the tool whose input schema constrains the model output.
pub const SUMMARY_TOOL_NAME: &str = "record_contact_summary";

pub const SUMMARY_TOOL_DESCRIPTION: &str =
    "Record the case summary (and escalation message, when requested) for the attorney.";

/// Role framing placed ahead of the shared structured-output rules.
pub const SUMMARY_ROLE: &str = "You are a paralegal assistant at a consumer bankruptcy firm. \
    You write short, factual status notes about clients for their attorney.";

/// Replaces `{last_response}` in the prompt when the client never replied.
pub const NEVER_RESPONDED: &str = "never responded";

/// Replaces `{notes}` in the prompt when the contact has no notes.
pub const NO_NOTES: &str = "None";

pub const SUMMARY_FOCUS: &str = "Write a 2-3 sentence summary focusing on:
1. Current case status
2. What's blocking progress
3. Any concerns";

/// Appended for needs-attention contacts.
pub const ESCALATION_INSTRUCTION: &str = "Also write a suggested escalation message that:
- Takes a different approach than automated follow-ups
- Is warm and helpful in tone
- Offers specific assistance
- Is ready to send via SMS";

/// Appended for every other contact.
pub const NO_ESCALATION_INSTRUCTION: &str = "Do not include an escalation message.";
