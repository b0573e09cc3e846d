// Competitor research: reverse-engineers what a set of high-performing
// captions in one niche have in common.

pub mod handlers;
pub mod prompts;
