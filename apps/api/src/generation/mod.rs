// Caption generation engine.
// Implements: tone and platform vocabularies, the daily quota, prompt
// assembly, output formats, the generation pipeline and the caption tools.
// All completion calls go through llm_client.

pub mod assist;
pub mod format;
pub mod generator;
pub mod handlers;
pub mod platform;
pub mod prompts;
pub mod quota;
pub mod tone;
