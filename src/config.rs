//! Router configuration
//!
//! Read-only configuration injected into the router at construction:
//! credentials and model list for the provider cascade, store and weather
//! settings, and the filter-key vocabulary. Loaded from an optional YAML file
//! and then overridden from environment variables. Nothing below the binaries
//! reads the environment directly.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::database::FilterVocabulary;
use crate::error::ConfigError;

/// Environment variable holding the primary (comma-splittable) credential
pub const PRIMARY_CREDENTIAL_VAR: &str = "GEMINI_API_KEY";

/// Prefix of indexed fallback credentials (`GEMINI_API_KEY_1`, `GEMINI_API_KEY_2`, ...)
pub const FALLBACK_CREDENTIAL_PREFIX: &str = "GEMINI_API_KEY_";

/// Default model priority: fastest/cheapest first, most capable last
pub const DEFAULT_MODELS: [&str; 4] = [
    "gemini-2.0-flash-lite",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// Complete router configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub provider: ProviderConfig,
    pub store: StoreConfig,
    pub weather: WeatherConfig,
    pub filters: FilterVocabulary,
}

impl RouterConfig {
    /// Load from `ROUTER_CONFIG` (if set) and apply environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("ROUTER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(std::env::vars());
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides from an iterator of `(name, value)` pairs
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut primary: Option<String> = None;
        let mut fallbacks: Vec<(u32, String)> = Vec::new();

        for (name, value) in vars {
            if name == PRIMARY_CREDENTIAL_VAR {
                primary = Some(value);
            } else if let Some(index) = name.strip_prefix(FALLBACK_CREDENTIAL_PREFIX) {
                match index.parse::<u32>() {
                    Ok(index) => fallbacks.push((index, value)),
                    Err(_) => debug!("Ignoring non-indexed credential variable {}", name),
                }
            } else {
                match name.as_str() {
                    "ROUTER_MODELS" => {
                        let models = split_list(&value);
                        if !models.is_empty() {
                            self.provider.models = models;
                        }
                    }
                    "ROUTER_PAGE_SIZE" => match value.trim().parse() {
                        Ok(size) => self.store.page_size = size,
                        Err(_) => warn!("Ignoring invalid ROUTER_PAGE_SIZE '{}'", value),
                    },
                    "ROUTER_REQUEST_TIMEOUT_SECS" => match value.trim().parse() {
                        Ok(secs) => self.provider.request_timeout_secs = secs,
                        Err(_) => warn!("Ignoring invalid ROUTER_REQUEST_TIMEOUT_SECS '{}'", value),
                    },
                    "OPENWEATHER_API_KEY" if !value.trim().is_empty() => {
                        self.weather.api_key = Some(value.trim().to_string());
                    }
                    "DATABASE_URL" if !value.trim().is_empty() => {
                        self.store.database_url = Some(value.trim().to_string());
                    }
                    _ => {}
                }
            }
        }

        if primary.is_some() || !fallbacks.is_empty() {
            fallbacks.sort_by_key(|(index, _)| *index);
            self.provider.credentials = CredentialSet::collect(
                primary.as_deref(),
                fallbacks.into_iter().map(|(_, value)| value),
            );
        }
    }

    /// Reject configurations the router cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.models.is_empty() {
            return Err(ConfigError::Invalid(
                "provider.models must list at least one model".to_string(),
            ));
        }
        if self.store.page_size == 0 {
            return Err(ConfigError::Invalid(
                "store.page_size must be greater than zero".to_string(),
            ));
        }
        if self.provider.credentials.is_empty() {
            warn!(
                "No completion credentials configured; set {} to enable routing",
                PRIMARY_CREDENTIAL_VAR
            );
        }
        Ok(())
    }
}

/// Completion provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub credentials: CredentialSet,
    /// Priority-ordered model identifiers
    pub models: Vec<String>,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    /// Replaces the built-in system prompt template
    pub prompt_template: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            credentials: CredentialSet::default(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 15,
            temperature: 0.1,
            prompt_template: None,
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum records returned by a read
    pub page_size: usize,
    /// Emulate document-store composite index requirements in the memory store
    pub enforce_composite_index: bool,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            enforce_composite_index: false,
            database_url: None,
            max_connections: 10,
        }
    }
}

/// Weather collaborator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    /// `metric`, `imperial` or `standard`
    pub units: String,
    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.openweathermap.org/data/2.5".to_string(),
            units: "metric".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Ordered, de-duplicated completion credentials
///
/// `Debug` never prints the secrets themselves.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct CredentialSet(Vec<String>);

impl CredentialSet {
    /// Build from one primary credential string (comma-splittable) plus indexed fallbacks
    pub fn collect<I, S>(primary: Option<&str>, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut credentials = Vec::new();
        let primary_parts = primary.map(split_list).unwrap_or_default();
        let fallback_parts = fallbacks
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty());

        for credential in primary_parts.into_iter().chain(fallback_parts) {
            if !credentials.contains(&credential) {
                credentials.push(credential);
            }
        }
        Self(credentials)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for CredentialSet {
    fn from(values: Vec<String>) -> Self {
        Self::collect(None, values)
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialSet({} credentials)", self.0.len())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_credentials_split_and_dedup() {
        let set = CredentialSet::collect(Some("a, b,,a"), ["c", "b", " "]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_env_overrides_order_fallbacks_numerically() {
        let mut config = RouterConfig::default();
        config.apply_env(vars(&[
            ("GEMINI_API_KEY_10", "k10"),
            ("GEMINI_API_KEY", "p1,p2"),
            ("GEMINI_API_KEY_2", "k2"),
            ("GEMINI_API_KEY_X", "ignored"),
            ("ROUTER_MODELS", "m1, m2"),
            ("ROUTER_PAGE_SIZE", "5"),
        ]));

        assert_eq!(
            config.provider.credentials.iter().collect::<Vec<_>>(),
            vec!["p1", "p2", "k2", "k10"]
        );
        assert_eq!(config.provider.models, vec!["m1", "m2"]);
        assert_eq!(config.store.page_size, 5);
    }

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.provider.models.len(), DEFAULT_MODELS.len());
        assert_eq!(config.provider.models[0], "gemini-2.0-flash-lite");
        assert_eq!(config.store.page_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let set = CredentialSet::collect(Some("super-secret"), Vec::<String>::new());
        assert!(!format!("{:?}", set).contains("super-secret"));
    }

    #[test]
    fn test_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
provider:
  credentials: ["k1", "k2", "k1"]
  models: ["fast", "smart"]
store:
  page_size: 7
  enforce_composite_index: true
filters:
  entity_overrides:
    products:
      cost: price
"#
        )
        .unwrap();

        let config = RouterConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.provider.credentials.len(), 2);
        assert_eq!(config.provider.models, vec!["fast", "smart"]);
        assert_eq!(config.provider.request_timeout_secs, 15);
        assert_eq!(config.store.page_size, 7);
        assert!(config.store.enforce_composite_index);
        assert_eq!(
            config.filters.entity_overrides["products"]["cost"],
            "price".to_string()
        );
    }

    #[test]
    fn test_validate_rejects_empty_models() {
        let mut config = RouterConfig::default();
        config.provider.models.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
