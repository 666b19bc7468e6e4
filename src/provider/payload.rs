//! Decoders for upstream provider response bodies.

use crate::aqi::{Concentration, Pollutant, SubIndices};
use crate::error::AppError;
use crate::provider::ProviderPayload;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    #[serde(default)]
    list: Vec<OpenWeatherEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherEntry {
    components: OpenWeatherComponents,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherComponents {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    o3: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    co: Option<f64>,
}

/// OpenWeatherMap `air_pollution` body.
///
/// Particulates are reported in µg/m³ and gases in ppb. Missing components
/// are left out rather than read as zero.
pub fn parse_openweather(body: &str) -> Result<ProviderPayload, AppError> {
    let response: OpenWeatherResponse =
        serde_json::from_str(body).map_err(|err| AppError::Provider(err.to_string()))?;
    let entry = response
        .list
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Provider("openweather returned no entries".to_string()))?;

    let components = entry.components;
    let values = [
        (Pollutant::Pm25, components.pm2_5),
        (Pollutant::Pm10, components.pm10),
        (Pollutant::O3, components.o3),
        (Pollutant::No2, components.no2),
        (Pollutant::So2, components.so2),
        (Pollutant::Co, components.co),
    ];
    let concentrations = values
        .into_iter()
        .filter_map(|(pollutant, value)| {
            let value = value?;
            Some(match pollutant {
                Pollutant::Pm25 | Pollutant::Pm10 => Concentration::canonical(pollutant, value),
                _ => Concentration::ppb(pollutant, value),
            })
        })
        .collect();

    Ok(ProviderPayload::Concentrations(concentrations))
}

#[derive(Debug, Deserialize)]
struct WaqiResponse {
    status: String,
    data: Option<WaqiData>,
}

#[derive(Debug, Deserialize)]
struct WaqiData {
    // "-" when the station has no current value
    aqi: serde_json::Value,
    #[serde(default)]
    iaqi: HashMap<String, WaqiValue>,
}

#[derive(Debug, Deserialize)]
struct WaqiValue {
    v: f64,
}

/// WAQI feed body. The station AQI and the per-pollutant values are already
/// on the AQI scale, so they are taken as sub-indices.
pub fn parse_waqi(body: &str) -> Result<ProviderPayload, AppError> {
    let response: WaqiResponse =
        serde_json::from_str(body).map_err(|err| AppError::Provider(err.to_string()))?;
    if response.status != "ok" {
        return Err(AppError::Provider(format!(
            "waqi status {}",
            response.status
        )));
    }
    let data = response
        .data
        .ok_or_else(|| AppError::Provider("waqi response without data".to_string()))?;
    let aqi = data
        .aqi
        .as_f64()
        .ok_or_else(|| AppError::Provider(format!("waqi aqi unavailable: {}", data.aqi)))?;

    // iaqi also carries weather keys (t, h, w, p); only pollutants are kept
    let sub_indices: SubIndices = data
        .iaqi
        .iter()
        .filter_map(|(key, value)| Some((key.parse::<Pollutant>().ok()?, value.v)))
        .collect();

    Ok(ProviderPayload::Precomputed {
        aqi: aqi.round() as i32,
        sub_indices,
    })
}
