//! Completion Provider Trait
//!
//! Interface the provider cascade drives. One call per (credential, model)
//! pair; the cascade owns retries and ordering, implementations own the
//! transport and the failure classification.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Text-completion backend
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send the fully rendered prompt, return the raw completion text
    ///
    /// Failures must be classified (`ProviderError::classify`) so the cascade
    /// can log quota exhaustion and unavailable models distinctly.
    async fn complete(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, ProviderError>;

    /// Get the provider name for logging
    fn provider_name(&self) -> &str;
}
