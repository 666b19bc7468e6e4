use crate::state::Location;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_ALERT_THRESHOLD_AQI: i32 = 200;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub live: Option<LiveSection>,
    #[serde(default)]
    pub alerts: Option<AlertsSection>,
    #[serde(default)]
    pub ml: Option<MlSection>,
    #[serde(default)]
    pub provider: Option<ProviderSection>,
    #[serde(default)]
    pub trend: Option<TrendSection>,
    #[serde(default)]
    pub locations: Vec<LocationSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
    /// Seconds between two refresh cycles while live mode is on (default: 60)
    pub refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveSection {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsSection {
    /// Readings at or above this AQI raise an alert (default: 200)
    pub threshold_aqi: Option<i32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MlSection {
    pub endpoint: String,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Simulated,
    OpenWeather,
    Waqi,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSection {
    pub kind: ProviderKind,
    /// URL template; `{lat}` and `{lon}` are substituted per location.
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    /// Tried when the primary provider fails.
    #[serde(default)]
    pub fallback: Option<FallbackSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackSection {
    pub kind: ProviderKind,
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendKind {
    /// Least-squares slope over recent sub-indices.
    Slope,
    /// Random arrows, for demo dashboards only.
    Decorative,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrendSection {
    pub kind: TrendKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationSection {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider
            && provider.kind != ProviderKind::Simulated
            && provider.endpoint.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Invalid(format!(
                "provider {:?} requires an endpoint",
                provider.kind
            )));
        }
        if let Some(fallback) = self.provider.as_ref().and_then(|p| p.fallback.as_ref())
            && (fallback.kind == ProviderKind::Simulated || fallback.endpoint.is_empty())
        {
            return Err(ConfigError::Invalid(
                "provider fallback must be a remote provider with an endpoint".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the refresh interval as Duration (default: 60 seconds)
    pub fn refresh_interval(&self) -> Duration {
        let secs = self
            .server
            .as_ref()
            .and_then(|s| s.refresh_interval_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Live mode is on unless explicitly disabled.
    pub fn live_enabled(&self) -> bool {
        self.live.as_ref().is_none_or(|live| live.enabled)
    }

    pub fn alert_threshold(&self) -> i32 {
        self.alerts
            .as_ref()
            .and_then(|a| a.threshold_aqi)
            .unwrap_or(DEFAULT_ALERT_THRESHOLD_AQI)
    }

    /// ML endpoint and timeout, or None when not configured.
    pub fn ml_endpoint(&self) -> Option<(&str, Duration)> {
        let ml = self.ml.as_ref()?;
        if ml.endpoint.is_empty() {
            return None;
        }
        let timeout = Duration::from_millis(ml.timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS));
        Some((ml.endpoint.as_str(), timeout))
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider
            .as_ref()
            .map(|p| p.kind)
            .unwrap_or(ProviderKind::Simulated)
    }

    pub fn provider_endpoint(&self) -> Option<&str> {
        self.provider
            .as_ref()
            .and_then(|p| p.endpoint.as_deref())
            .filter(|endpoint| !endpoint.is_empty())
    }

    pub fn provider_fallback(&self) -> Option<(ProviderKind, &str)> {
        let fallback = self.provider.as_ref()?.fallback.as_ref()?;
        Some((fallback.kind, fallback.endpoint.as_str()))
    }

    pub fn trend_kind(&self) -> TrendKind {
        self.trend
            .as_ref()
            .map(|t| t.kind)
            .unwrap_or(TrendKind::Slope)
    }

    pub fn provider_timeout(&self) -> Duration {
        let millis = self
            .provider
            .as_ref()
            .and_then(|p| p.timeout_ms)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);
        Duration::from_millis(millis)
    }

    /// Locations with ids assigned in file order, starting at 1.
    pub fn locations(&self) -> Vec<Location> {
        self.locations
            .iter()
            .enumerate()
            .map(|(index, section)| Location {
                id: (index + 1) as u32,
                name: section.name.clone(),
                latitude: section.latitude,
                longitude: section.longitude,
            })
            .collect()
    }
}
