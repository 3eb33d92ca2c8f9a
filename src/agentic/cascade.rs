//! Provider Cascade
//!
//! Walks the credential x model matrix in order (every model for the first
//! credential, then every model for the next) and returns the first
//! successful completion. Each pair is tried exactly once per query.
//!
//! Every failure moves on to the next pair, whatever its class. Only the
//! classification in the logs differs: quota exhaustion and unavailable models
//! are expected and logged at `warn`, anything else at `error`.
//! Credentials are never logged; attempts are identified by credential index.

use std::sync::Arc;
use tracing::{error, info, warn};

use super::llm_client::CompletionProvider;
use super::prompt::PromptTemplate;
use crate::config::CredentialSet;
use crate::error::{ProviderError, RouterError};

/// Result of a successful cascade run
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOutcome {
    /// Raw completion text
    pub text: String,
    /// Position of the credential that succeeded
    pub credential_index: usize,
    pub model: String,
    /// Calls made, the successful one included
    pub attempts: usize,
}

/// Ordered retry over credentials and models
pub struct ProviderCascade {
    provider: Arc<dyn CompletionProvider>,
    credentials: CredentialSet,
    models: Vec<String>,
    prompt: PromptTemplate,
}

impl ProviderCascade {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        credentials: CredentialSet,
        models: Vec<String>,
        prompt: PromptTemplate,
    ) -> Self {
        Self {
            provider,
            credentials,
            models,
            prompt,
        }
    }

    /// Number of (credential, model) pairs a failing query will try
    pub fn matrix_size(&self) -> usize {
        self.credentials.len() * self.models.len()
    }

    /// Raw completion text for `raw_query`
    pub async fn classify(&self, raw_query: &str) -> Result<String, RouterError> {
        self.classify_detailed(raw_query).await.map(|o| o.text)
    }

    /// Like `classify`, also reporting which pair answered
    pub async fn classify_detailed(&self, raw_query: &str) -> Result<CascadeOutcome, RouterError> {
        let prompt = self.prompt.render(raw_query)?;
        let mut attempts = 0;
        let mut last_error: Option<ProviderError> = None;

        for (credential_index, credential) in self.credentials.iter().enumerate() {
            for model in &self.models {
                attempts += 1;
                match self.provider.complete(credential, model, &prompt).await {
                    Ok(text) => {
                        info!(
                            provider = self.provider.provider_name(),
                            credential_index,
                            model = %model,
                            attempts,
                            "Completion succeeded"
                        );
                        return Ok(CascadeOutcome {
                            text,
                            credential_index,
                            model: model.clone(),
                            attempts,
                        });
                    }
                    Err(e) => {
                        match &e {
                            ProviderError::QuotaExceeded { .. } => warn!(
                                credential_index,
                                model = %model,
                                "Quota exceeded, trying next model"
                            ),
                            ProviderError::ModelNotFound { .. } => warn!(
                                credential_index,
                                model = %model,
                                "Model unavailable for credential, trying next model"
                            ),
                            ProviderError::Other { message, .. } => error!(
                                credential_index,
                                model = %model,
                                error = %message,
                                "Completion call failed, trying next model"
                            ),
                        }
                        last_error = Some(e);
                    }
                }
            }
        }

        error!(
            provider = self.provider.provider_name(),
            attempts,
            last_error = ?last_error.as_ref().map(ProviderError::kind),
            "All completion providers exhausted"
        );
        Err(RouterError::AllProvidersExhausted {
            attempts,
            last_error,
        })
    }
}
