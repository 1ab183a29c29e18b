// Shared prompt fragments. Each feature that calls the model keeps its own
// prompts.rs alongside it and pulls cross-cutting pieces from here.

/// System fragment for tool-constrained structured output.
pub const STRUCTURED_OUTPUT_SYSTEM: &str = "You MUST respond by calling the provided tool exactly once. \
    Put every part of your answer in the tool input. \
    Do NOT write any text outside the tool call. \
    Do NOT include explanations or apologies.";
