//! Intent Router
//!
//! Main entry point for query handling.
//! Coordinates the provider cascade, instruction extraction and routing to
//! the record dispatcher or the weather collaborator.

use intent_types::{RoutingInstruction, Tool};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::cascade::ProviderCascade;
use super::extractor::extract;
use super::gemini_client::GeminiProvider;
use super::guidance::{GuidanceSource, StaticGuidance};
use super::llm_client::CompletionProvider;
use super::prompt::PromptTemplate;
use crate::config::RouterConfig;
use crate::database::{FilterTranslator, MemoryStore, OperationDispatcher, RecordStore};
use crate::error::RouterError;
use crate::weather::{OpenWeatherClient, WeatherLookup};

/// Caller-facing result of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterResponse {
    pub response_text: String,
    /// Records for database operations, the report for weather lookups
    pub structured_data: Option<Value>,
}

impl RouterResponse {
    fn text(response_text: String) -> Self {
        Self {
            response_text,
            structured_data: None,
        }
    }
}

/// Query router
pub struct IntentRouter {
    cascade: ProviderCascade,
    dispatcher: OperationDispatcher,
    weather: Arc<dyn WeatherLookup>,
    guidance: Arc<dyn GuidanceSource>,
}

impl IntentRouter {
    /// Start building a router from configuration
    pub fn builder(config: RouterConfig) -> IntentRouterBuilder {
        IntentRouterBuilder::new(config)
    }

    /// Answer one free-text query
    pub async fn handle(&self, query: &str) -> Result<RouterResponse, RouterError> {
        let instruction = self.route(query).await?;
        self.handle_instruction(&instruction).await
    }

    /// Query to validated instruction, without side effects
    pub async fn route(&self, query: &str) -> Result<RoutingInstruction, RouterError> {
        let outcome = self.cascade.classify_detailed(query).await?;
        debug!(
            credential_index = outcome.credential_index,
            model = %outcome.model,
            attempts = outcome.attempts,
            "Classified query"
        );
        Ok(extract(&outcome.text)?)
    }

    /// Execute an already-extracted instruction
    pub async fn handle_instruction(
        &self,
        instruction: &RoutingInstruction,
    ) -> Result<RouterResponse, RouterError> {
        if !instruction.is_dispatchable() {
            info!(
                tool = %instruction.tool,
                missing = ?instruction.missing_info,
                "Instruction incomplete, returning guidance"
            );
            return Ok(RouterResponse::text(self.guidance.guidance(instruction)));
        }

        let parameters = &instruction.parameters;
        match instruction.tool {
            Tool::Weather => match parameters.location.as_deref() {
                Some(location) => {
                    let report = self.weather.current(location).await?;
                    Ok(RouterResponse {
                        response_text: report.summary(),
                        structured_data: serde_json::to_value(&report).ok(),
                    })
                }
                None => Ok(RouterResponse::text(self.guidance.guidance(instruction))),
            },
            Tool::Database => {
                let outcome = self
                    .dispatcher
                    .dispatch(
                        &instruction.action,
                        parameters.entity.as_deref(),
                        &parameters.filters,
                        &parameters.data,
                    )
                    .await?;
                Ok(RouterResponse {
                    response_text: outcome.message,
                    structured_data: outcome
                        .data
                        .and_then(|records| serde_json::to_value(records).ok()),
                })
            }
            Tool::None => Ok(RouterResponse::text(self.guidance.guidance(instruction))),
        }
    }

    pub fn dispatcher(&self) -> &OperationDispatcher {
        &self.dispatcher
    }
}

/// Builder for IntentRouter
///
/// Collaborators not supplied explicitly are built from the configuration:
/// `GeminiProvider`, `MemoryStore`, `OpenWeatherClient`, `StaticGuidance`.
pub struct IntentRouterBuilder {
    config: RouterConfig,
    provider: Option<Arc<dyn CompletionProvider>>,
    store: Option<Arc<dyn RecordStore>>,
    weather: Option<Arc<dyn WeatherLookup>>,
    guidance: Option<Arc<dyn GuidanceSource>>,
    prompt: Option<PromptTemplate>,
}

impl IntentRouterBuilder {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            provider: None,
            store: None,
            weather: None,
            guidance: None,
            prompt: None,
        }
    }

    /// Set the completion provider
    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the record store
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the weather collaborator
    pub fn weather(mut self, weather: Arc<dyn WeatherLookup>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn guidance(mut self, guidance: Arc<dyn GuidanceSource>) -> Self {
        self.guidance = Some(guidance);
        self
    }

    /// Override the system prompt
    pub fn prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Build the router
    pub fn build(self) -> Result<IntentRouter, RouterError> {
        let config = self.config;
        config.validate()?;

        let provider: Arc<dyn CompletionProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(GeminiProvider::new(&config.provider)?),
        };

        let prompt = match (self.prompt, &config.provider.prompt_template) {
            (Some(prompt), _) => prompt,
            (None, Some(path)) => PromptTemplate::from_file(path)?,
            (None, None) => PromptTemplate::builtin()?,
        };

        let store: Arc<dyn RecordStore> = match self.store {
            Some(store) => store,
            None if config.store.enforce_composite_index => {
                Arc::new(MemoryStore::new().with_index_enforcement())
            }
            None => Arc::new(MemoryStore::new()),
        };

        let weather: Arc<dyn WeatherLookup> = match self.weather {
            Some(weather) => weather,
            None => Arc::new(OpenWeatherClient::new(&config.weather)?),
        };

        info!(
            provider = provider.provider_name(),
            store = store.store_name(),
            credentials = config.provider.credentials.len(),
            models = config.provider.models.len(),
            "Building intent router"
        );

        let cascade = ProviderCascade::new(
            provider,
            config.provider.credentials.clone(),
            config.provider.models.clone(),
            prompt,
        );
        let dispatcher = OperationDispatcher::new(store)
            .with_translator(FilterTranslator::new(config.filters.clone()))
            .with_page_size(config.store.page_size);

        Ok(IntentRouter {
            cascade,
            dispatcher,
            weather,
            guidance: self
                .guidance
                .unwrap_or_else(|| Arc::new(StaticGuidance)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSet;
    use crate::error::{ProviderError, WeatherError};
    use crate::weather::WeatherReport;
    use async_trait::async_trait;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(&self, _: &str, _: &str, _: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    struct SunnyWeather;

    #[async_trait]
    impl WeatherLookup for SunnyWeather {
        async fn current(&self, location: &str) -> Result<WeatherReport, WeatherError> {
            Ok(WeatherReport {
                location: location.to_string(),
                country: None,
                temperature: 21.0,
                feels_like: None,
                humidity: None,
                description: "clear sky".to_string(),
                wind_speed: None,
                units: "metric".to_string(),
            })
        }
    }

    fn router(completion: &'static str) -> IntentRouter {
        let mut config = RouterConfig::default();
        config.provider.credentials = CredentialSet::collect(Some("key-1"), Vec::<String>::new());
        IntentRouter::builder(config)
            .provider(Arc::new(FixedProvider(completion)))
            .weather(Arc::new(SunnyWeather))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_weather_route() {
        let router = router(
            r#"{"tool": "weather", "action": "get", "parameters": {"location": "Porto"}}"#,
        );
        let response = router.handle("weather in Porto?").await.unwrap();
        assert_eq!(response.response_text, "Current weather in Porto: clear sky, 21.0°C.");
        assert_eq!(response.structured_data.unwrap()["location"], "Porto");
    }

    #[tokio::test]
    async fn test_guidance_route_has_no_data() {
        let router = router(r#"{"tool": "none", "action": ""}"#);
        let response = router.handle("blah").await.unwrap();
        assert_eq!(
            response.response_text,
            StaticGuidance::for_tool(Tool::None)
        );
        assert!(response.structured_data.is_none());
    }

    #[tokio::test]
    async fn test_extract_error_surfaces() {
        let router = router("no json here");
        let err = router.handle("anything").await.unwrap_err();
        assert!(matches!(err, RouterError::Extract(_)));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = RouterConfig::default();
        config.provider.models.clear();
        let result = IntentRouter::builder(config)
            .provider(Arc::new(FixedProvider("{}")))
            .build();
        assert!(matches!(result, Err(RouterError::Config(_))));
    }
}
