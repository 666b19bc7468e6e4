use crate::aqi::trend::Trend;
use crate::aqi::{AqiCategory, Classification, Pollutant, SubIndices, Unit};
use crate::forecast::ForecastPoint;
use crate::ml::MlPrediction;
use crate::state::{Location, LocationId, ReadingSource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoData,
    LocationNotFound,
    InvalidInput,
    InsufficientData,
    InternalError,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

#[derive(Debug, Serialize)]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub live: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<Location>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct PollutantBreakdown {
    pub pollutant: Pollutant,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    pub sub_index: Option<f64>,
    pub trend: Trend,
}

#[derive(Debug, Serialize)]
pub struct CurrentReadingResponse {
    pub location: Location,
    pub classification: Classification,
    pub source: ReadingSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant: Option<Pollutant>,
    pub pollutants: Vec<PollutantBreakdown>,
    pub advice: &'static [&'static str],
    pub sensitive_groups: &'static [&'static str],
    /// Reported verbatim by the ML service; may disagree with `classification`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<MlPrediction>,
    pub reading_timestamp: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub location: String,
    pub average_predicted_aqi: i32,
    pub points: Vec<ForecastPoint>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub classification: Classification,
    pub label: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    pub concentrations: Vec<ConcentrationInput>,
}

/// `unit` defaults to the pollutant's canonical unit.
#[derive(Debug, Deserialize)]
pub struct ConcentrationInput {
    pub pollutant: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComputeResponse {
    pub sub_indices: SubIndices,
    pub aqi: i32,
    pub dominant: Pollutant,
    pub classification: Classification,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AlertBody {
    pub location_id: LocationId,
    pub aqi: i32,
    pub category: AqiCategory,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub threshold: i32,
    pub alerts: Vec<AlertBody>,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct LiveRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub live: bool,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct PushReadingRequest {
    pub aqi: i32,
}

#[derive(Debug, Deserialize)]
pub struct PredictionsRequest {
    pub predictions: Vec<PredictionInput>,
}

#[derive(Debug, Deserialize)]
pub struct PredictionInput {
    /// `YYYY-MM-DD`
    pub date: String,
    pub predicted_aqi: i32,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictionsAcceptedResponse {
    pub location: String,
    pub accepted: usize,
    pub timestamp: String,
}
