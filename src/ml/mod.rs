//! Alternate AQI prediction from an external ML inference service.
//!
//! The service returns its own category, color and description. Those are
//! kept exactly as received and are never checked against
//! [`crate::aqi::classify`]; the two sources may disagree.

use crate::aqi::{Concentration, Pollutant};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

pub mod remote;

pub use remote::RemoteMlClient;

/// Model input, in the units the upstream provider reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MlFeatures {
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub o3: f64,
    #[serde(default)]
    pub nh3: f64,
}

impl MlFeatures {
    /// Missing pollutants are sent as 0, as the service expects every field.
    pub fn from_concentrations(concentrations: &[Concentration]) -> Self {
        let mut features = Self::default();
        for concentration in concentrations {
            let slot = match concentration.pollutant {
                Pollutant::Pm25 => &mut features.pm2_5,
                Pollutant::Pm10 => &mut features.pm10,
                Pollutant::No2 => &mut features.no2,
                Pollutant::So2 => &mut features.so2,
                Pollutant::Co => &mut features.co,
                Pollutant::O3 => &mut features.o3,
            };
            *slot = concentration.value;
        }
        features
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlPrediction {
    pub predicted_aqi: i32,
    pub category: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

pub trait MlClient: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &MlFeatures) -> Result<MlPrediction, AppError>;

    fn predict_batch(&self, features: &[MlFeatures]) -> Result<Vec<MlPrediction>, AppError>;

    /// True when the service answers its health check.
    fn health(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_take_raw_values_and_default_missing_to_zero() {
        let features = MlFeatures::from_concentrations(&[
            Concentration::canonical(Pollutant::Pm25, 88.0),
            Concentration::ppb(Pollutant::O3, 41.0),
        ]);

        assert_eq!(features.pm2_5, 88.0);
        assert_eq!(features.o3, 41.0);
        assert_eq!(features.pm10, 0.0);
        assert_eq!(features.nh3, 0.0);
    }

    #[test]
    fn prediction_without_description_deserializes() -> Result<(), serde_json::Error> {
        let prediction: MlPrediction = serde_json::from_str(
            r##"{"predicted_aqi": 120, "category": "Unhealthy for Sensitive Groups", "color": "#ff7e00"}"##,
        )?;

        assert_eq!(prediction.predicted_aqi, 120);
        assert!(prediction.description.is_empty());
        Ok(())
    }
}
