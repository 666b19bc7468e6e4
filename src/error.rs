use crate::aqi::AqiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("aqi error: {0}")]
    Aqi(#[from] AqiError),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("ml endpoint error: {0}")]
    Ml(String),
    #[error("no data available for {0}")]
    NoData(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown location: {0}")]
    UnknownLocation(String),
    #[error("preferences error: {0}")]
    Preferences(String),
    #[error("state lock poisoned")]
    StateLock,
}
