//! Agentic routing module
//!
//! Turns one free-text query into a validated `RoutingInstruction` by driving
//! a completion provider across the credential x model matrix, then routes the
//! instruction to the record dispatcher or the weather collaborator.

pub mod cascade;
pub mod extractor;
pub mod gemini_client;
pub mod guidance;
pub mod llm_client;
pub mod orchestrator;
pub mod prompt;

pub use cascade::{CascadeOutcome, ProviderCascade};
pub use extractor::extract;
pub use gemini_client::GeminiProvider;
pub use guidance::{GuidanceSource, StaticGuidance};
pub use llm_client::CompletionProvider;
pub use orchestrator::{IntentRouter, IntentRouterBuilder, RouterResponse};
pub use prompt::PromptTemplate;
