//! Weather collaborator
//!
//! The router only needs "current conditions for a place". `WeatherLookup`
//! is that boundary; `OpenWeatherClient` is the default implementation over
//! the OpenWeatherMap current-weather endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::error::{ConfigError, WeatherError};

/// Current conditions at one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    pub country: Option<String>,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub humidity: Option<u8>,
    pub description: String,
    pub wind_speed: Option<f64>,
    /// `metric`, `imperial` or `standard`
    pub units: String,
}

impl WeatherReport {
    /// One-sentence summary for the caller
    pub fn summary(&self) -> String {
        let (temp_unit, speed_unit) = match self.units.as_str() {
            "imperial" => ("°F", "mph"),
            "standard" => ("K", "m/s"),
            _ => ("°C", "m/s"),
        };
        let place = match &self.country {
            Some(country) => format!("{}, {}", self.location, country),
            None => self.location.clone(),
        };

        let mut text = format!(
            "Current weather in {}: {}, {:.1}{}",
            place, self.description, self.temperature, temp_unit
        );
        if let Some(feels_like) = self.feels_like {
            text.push_str(&format!(" (feels like {:.1}{})", feels_like, temp_unit));
        }
        if let Some(humidity) = self.humidity {
            text.push_str(&format!(", humidity {}%", humidity));
        }
        if let Some(wind) = self.wind_speed {
            text.push_str(&format!(", wind {:.1} {}", wind, speed_unit));
        }
        text.push('.');
        text
    }
}

/// Current-weather lookup
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current(&self, location: &str) -> Result<WeatherReport, WeatherError>;
}

/// OpenWeatherMap client
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    units: String,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    name: String,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    #[serde(default)]
    wind: Option<OwmWind>,
    #[serde(default)]
    sys: Option<OwmSys>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            units: config.units.clone(),
        })
    }

    fn report_from(&self, response: OwmResponse) -> WeatherReport {
        WeatherReport {
            location: response.name,
            country: response.sys.and_then(|s| s.country),
            temperature: response.main.temp,
            feels_like: response.main.feels_like,
            humidity: response.main.humidity,
            description: response
                .weather
                .into_iter()
                .map(|w| w.description)
                .next()
                .unwrap_or_else(|| "conditions unknown".to_string()),
            wind_speed: response.wind.map(|w| w.speed),
            units: self.units.clone(),
        }
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<WeatherReport, WeatherError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherError::Unavailable("no weather API key configured".to_string()))?;

        debug!(location, "Looking up current weather");

        let response = self
            .client
            .get(format!("{}/weather", self.endpoint))
            .query(&[("q", location), ("appid", api_key), ("units", self.units.as_str())])
            .send()
            .await
            .map_err(|e| WeatherError::Unavailable(e.without_url().to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(WeatherError::LocationNotFound {
                    location: location.to_string(),
                })
            }
            status if !status.is_success() => {
                warn!(status = status.as_u16(), "Weather service returned an error");
                return Err(WeatherError::Unavailable(format!("HTTP {}", status)));
            }
            _ => {}
        }

        let body: OwmResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Unavailable(e.without_url().to_string()))?;
        Ok(self.report_from(body))
    }
}
