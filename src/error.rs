//! Error handling for the intent router
//!
//! One thiserror enum per layer, converging on `RouterError` at the caller
//! boundary. Provider and store diagnostics stay in `Display`/logs;
//! `RouterError::user_message` is the only text shown to callers.

use thiserror::Error;

/// Main error type returned by `IntentRouter::handle`
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("All completion providers exhausted after {attempts} attempts{}", last_error_suffix(.last_error))]
    AllProvidersExhausted {
        attempts: usize,
        last_error: Option<ProviderError>,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error("Prompt rendering failed: {message}")]
    Prompt { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn last_error_suffix(last_error: &Option<ProviderError>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {})", e),
        None => String::new(),
    }
}

impl RouterError {
    /// Stable, plain-text message safe to show to the caller
    pub fn user_message(&self) -> String {
        match self {
            RouterError::AllProvidersExhausted { .. } => {
                "The assistant is temporarily unavailable. Please try again in a moment.".to_string()
            }
            RouterError::Extract(_) => {
                "Sorry, I couldn't understand the assistant's response. Please rephrase your request."
                    .to_string()
            }
            RouterError::Dispatch(e) => e.user_message(),
            RouterError::Weather(e) => e.user_message(),
            RouterError::Prompt { .. } | RouterError::Config(_) => {
                "The assistant is misconfigured. Please contact an administrator.".to_string()
            }
        }
    }
}

/// Completion provider failures, classified for the cascade
///
/// Never surfaced past the cascade except as the last error carried by
/// `RouterError::AllProvidersExhausted`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Quota exceeded for model '{model}': {message}")]
    QuotaExceeded { model: String, message: String },

    #[error("Model '{model}' not available: {message}")]
    ModelNotFound { model: String, message: String },

    #[error("Provider call to model '{model}' failed: {message}")]
    Other { model: String, message: String },
}

impl ProviderError {
    /// Classify a failed call from its HTTP status (if any) and error text
    pub fn classify(model: &str, status: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();
        let model = model.to_string();
        let message = message.to_string();

        if status == Some(429)
            || lower.contains("quota")
            || lower.contains("rate limit")
            || lower.contains("resource_exhausted")
            || lower.contains("too many requests")
        {
            return ProviderError::QuotaExceeded { model, message };
        }

        if status == Some(404)
            || (lower.contains("model") && lower.contains("not found"))
            || lower.contains("is not supported")
            || lower.contains("not available")
        {
            return ProviderError::ModelNotFound { model, message };
        }

        ProviderError::Other { model, message }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderError::QuotaExceeded { model, .. }
            | ProviderError::ModelNotFound { model, .. }
            | ProviderError::Other { model, .. } => model,
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::QuotaExceeded { .. } => "quota_exceeded",
            ProviderError::ModelNotFound { .. } => "model_not_found",
            ProviderError::Other { .. } => "other",
        }
    }
}

/// Hard failures while recovering an instruction from provider text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid response format: no JSON object found in provider output")]
    InvalidResponseFormat,

    #[error("Malformed instruction: {message}")]
    MalformedInstruction { message: String },
}

/// Failures reported by a record store adapter
#[derive(Error, Debug)]
pub enum StoreError {
    /// Authentication or connectivity failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The query needs an index the store does not have
    #[error("Query requires a composite index: {0}")]
    IndexRequired(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(error.to_string()),
            sqlx::Error::Database(ref db) => match db.code().as_deref() {
                // invalid_authorization_specification / invalid_password
                Some("28000") | Some("28P01") => StoreError::Unavailable(error.to_string()),
                _ => StoreError::Backend(error.to_string()),
            },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Caller-facing dispatch failures
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("No data provided to create a new {entity}")]
    InsufficientData { entity: String },

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Record store index required: {0}")]
    IndexRequired(String),

    #[error("Failed to {action} records: {source}")]
    Store {
        action: String,
        #[source]
        source: StoreError,
    },
}

impl DispatchError {
    /// Re-signal a store failure in domain terms
    pub fn from_store(action: &str, error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(detail) => DispatchError::StoreUnavailable(detail),
            StoreError::IndexRequired(detail) => DispatchError::IndexRequired(detail),
            other => DispatchError::Store {
                action: action.to_string(),
                source: other,
            },
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            DispatchError::InsufficientData { entity } => format!(
                "Please provide the details for the new {} (for example a name and other fields).",
                entity
            ),
            DispatchError::StoreUnavailable(_) => {
                "The database is currently unavailable. Please try again later.".to_string()
            }
            DispatchError::IndexRequired(_) => {
                "This query needs a database index that is not configured yet. Try a simpler filter."
                    .to_string()
            }
            DispatchError::Store { action, .. } => {
                format!("Sorry, I couldn't {} the records. Please try again.", action)
            }
        }
    }
}

/// Weather collaborator failures
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("No weather data found for '{location}'")]
    LocationNotFound { location: String },

    #[error("Weather service unavailable: {0}")]
    Unavailable(String),
}

impl WeatherError {
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::LocationNotFound { location } => {
                format!("I couldn't find weather information for \"{}\".", location)
            }
            WeatherError::Unavailable(_) => {
                "The weather service is currently unavailable. Please try again later.".to_string()
            }
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quota_by_status() {
        let e = ProviderError::classify("m1", Some(429), "slow down");
        assert!(matches!(e, ProviderError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_classify_quota_by_message() {
        let e = ProviderError::classify("m1", Some(400), "RESOURCE_EXHAUSTED: Quota exceeded");
        assert_eq!(e.kind(), "quota_exceeded");
    }

    #[test]
    fn test_classify_model_not_found() {
        let e = ProviderError::classify(
            "gemini-x",
            Some(400),
            "models/gemini-x is not supported for generateContent",
        );
        assert_eq!(e.kind(), "model_not_found");
        assert_eq!(e.model(), "gemini-x");

        let e = ProviderError::classify("gemini-x", Some(404), "Not Found");
        assert_eq!(e.kind(), "model_not_found");
    }

    #[test]
    fn test_classify_other() {
        let e = ProviderError::classify("m1", Some(401), "API key not valid");
        assert_eq!(e.kind(), "other");
        let e = ProviderError::classify("m1", None, "connection reset");
        assert_eq!(e.kind(), "other");
    }

    #[test]
    fn test_store_errors_resignal() {
        let e = DispatchError::from_store("read", StoreError::Unavailable("auth".into()));
        assert!(matches!(e, DispatchError::StoreUnavailable(_)));

        let e = DispatchError::from_store("count", StoreError::IndexRequired("idx".into()));
        assert!(matches!(e, DispatchError::IndexRequired(_)));

        let e = DispatchError::from_store("update", StoreError::Backend("boom".into()));
        assert_eq!(e.to_string(), "Failed to update records: Store backend error: boom");
    }

    #[test]
    fn test_user_messages_hide_diagnostics() {
        let e = RouterError::AllProvidersExhausted {
            attempts: 4,
            last_error: Some(ProviderError::classify("m2", Some(429), "secret payload")),
        };
        assert!(e.to_string().contains("4 attempts"));
        assert!(!e.user_message().contains("secret payload"));

        let e = RouterError::from(DispatchError::StoreUnavailable("password rejected".into()));
        assert!(!e.user_message().contains("password"));
    }
}
