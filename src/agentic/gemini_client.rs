//! Google Gemini completion provider
//!
//! Calls the `generateContent` REST endpoint. The credential travels in the
//! `x-goog-api-key` header so it never appears in URLs or logs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::llm_client::CompletionProvider;
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiProvider {
    /// Create a provider from the provider section of the router config
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

/// First text part of the first candidate
fn parse_completion(model: &str, body: &str) -> Result<String, ProviderError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::classify(model, None, &format!("unreadable response: {}", e)))?;

    if let Some(usage) = &response.usage_metadata {
        debug!(
            model,
            prompt_tokens = ?usage.prompt_token_count,
            response_tokens = ?usage.candidates_token_count,
            "Gemini usage"
        );
    }

    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| ProviderError::Other {
            model: model.to_string(),
            message: "no candidates in response".to_string(),
        })
}

/// Classify a non-success response from its status and error envelope
fn classify_failure(model: &str, status: u16, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{}: {}", code, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    };
    ProviderError::classify(model, Some(status), &message)
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", credential)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Other {
                model: model.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ProviderError::Other {
            model: model.to_string(),
            message: e.to_string(),
        })?;

        debug!(model, status = status.as_u16(), "Gemini API response");

        if !status.is_success() {
            return Err(classify_failure(model, status.as_u16(), &body));
        }

        let text = parse_completion(model, &body)?;
        info!(model, chars = text.len(), "Gemini completion received");
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_endpoint_trim() {
        let config = ProviderConfig {
            endpoint: "http://localhost:8080/v1beta/".to_string(),
            ..ProviderConfig::default()
        };
        let provider = GeminiProvider::new(&config).unwrap();
        assert_eq!(
            provider.url("gemini-2.0-flash"),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(provider.provider_name(), "Gemini");
    }

    #[test]
    fn test_request_body_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: "hello" }],
            }],
            generation_config: GeminiGenerationConfig { temperature: 0.1 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "{\"tool\": \"none\"}"}], "role": "model"}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 3}
        }"#;
        assert_eq!(parse_completion("m1", body).unwrap(), r#"{"tool": "none"}"#);
    }

    #[test]
    fn test_parse_completion_without_candidates() {
        let err = parse_completion("m1", r#"{"candidates": []}"#).unwrap_err();
        assert_eq!(err.kind(), "other");
    }

    #[test]
    fn test_classify_failure_envelope() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded for metric", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(classify_failure("m1", 429, body).kind(), "quota_exceeded");

        let body = r#"{"error": {"code": 404, "message": "models/m9 is not found for API version v1beta", "status": "NOT_FOUND"}}"#;
        assert_eq!(classify_failure("m9", 404, body).kind(), "model_not_found");

        let err = classify_failure("m1", 500, "upstream exploded");
        assert_eq!(err.kind(), "other");
        assert!(err.to_string().contains("HTTP 500"));
    }
}
