// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it;
// this file holds the cross-cutting pieces.

/// Appended to every system prompt that runs in JSON mode. The provider
/// rejects JSON mode unless the word "JSON" appears in the messages.
pub const JSON_ONLY_SUFFIX: &str = "You MUST respond with a single valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Joins a service system prompt with the JSON-only suffix.
pub fn json_system(prompt: &str) -> String {
    format!("{}\n\n{JSON_ONLY_SUFFIX}", prompt.trim_end())
}

/// `1. "first"\n2. "second"` listing used to quote user-supplied captions.
pub fn numbered_quotes<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. \"{}\"", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
