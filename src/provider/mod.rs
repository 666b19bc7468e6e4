//! Upstream pollutant data sources.

use crate::aqi::{Concentration, SubIndices};
use crate::config::ProviderKind;
use crate::error::AppError;
use crate::http;
use crate::state::Location;
use std::time::Duration;
use tracing::{debug, warn};

pub mod mock;
pub mod payload;
pub mod simulated;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderPayload {
    /// Raw concentrations; the AQI is computed locally.
    Concentrations(Vec<Concentration>),
    /// The provider already reports an AQI and per-pollutant sub-indices.
    Precomputed { aqi: i32, sub_indices: SubIndices },
}

pub trait PollutantProvider {
    fn name(&self) -> &str;

    fn fetch(&mut self, location: &Location) -> Result<ProviderPayload, AppError>;
}

impl<P: PollutantProvider + ?Sized> PollutantProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&mut self, location: &Location) -> Result<ProviderPayload, AppError> {
        (**self).fetch(location)
    }
}

/// Tries each provider in order and returns the first success.
pub struct ChainProvider {
    providers: Vec<Box<dyn PollutantProvider + Send>>,
}

impl ChainProvider {
    pub fn new(providers: Vec<Box<dyn PollutantProvider + Send>>) -> Self {
        Self { providers }
    }
}

impl PollutantProvider for ChainProvider {
    fn name(&self) -> &str {
        "chain"
    }

    fn fetch(&mut self, location: &Location) -> Result<ProviderPayload, AppError> {
        for provider in &mut self.providers {
            match provider.fetch(location) {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    debug!(
                        provider = provider.name(),
                        location = %location.name,
                        error = %err,
                        "Provider failed, trying next"
                    );
                }
            }
        }
        Err(AppError::Provider(format!(
            "no provider returned data for {}",
            location.name
        )))
    }
}

/// Fetches a JSON body over HTTP and decodes it in the configured format.
pub struct HttpProvider {
    kind: ProviderKind,
    endpoint_template: String,
    timeout: Duration,
}

impl HttpProvider {
    pub fn new(kind: ProviderKind, endpoint_template: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kind,
            endpoint_template: endpoint_template.into(),
            timeout,
        }
    }

    pub fn url_for(&self, location: &Location) -> String {
        self.endpoint_template
            .replace("{lat}", &location.latitude.to_string())
            .replace("{lon}", &location.longitude.to_string())
    }
}

impl PollutantProvider for HttpProvider {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::OpenWeather => "openweather",
            ProviderKind::Waqi => "waqi",
            ProviderKind::Simulated => "simulated",
        }
    }

    fn fetch(&mut self, location: &Location) -> Result<ProviderPayload, AppError> {
        let url = self.url_for(location);
        let body = http::get(&url, self.timeout).map_err(|err| {
            warn!(provider = self.name(), url = %url, error = %err, "Provider request failed");
            AppError::Provider(err.to_string())
        })?;
        match self.kind {
            ProviderKind::OpenWeather => payload::parse_openweather(&body),
            ProviderKind::Waqi => payload::parse_waqi(&body),
            ProviderKind::Simulated => Err(AppError::Provider(
                "simulated provider has no http endpoint".to_string(),
            )),
        }
    }
}
