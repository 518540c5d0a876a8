// Roadmap pipeline: prompt assembly, model relay, reply parsing.
// All model calls go through llm_client; no module talks to Gemini directly.

pub mod handlers;
pub mod model;
pub mod parse;
pub mod prompts;
