//! Persistence boundary for readings and predictions.

use crate::error::AppError;
use crate::forecast::FORECAST_DAYS;
use crate::state::{Location, LocationId, Prediction, Reading};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use time::{Date, Duration};

pub trait ReadingStore: Send + Sync {
    fn locations(&self) -> Result<Vec<Location>, AppError>;

    /// Case-insensitive lookup.
    fn location_by_name(&self, name: &str) -> Result<Option<Location>, AppError>;

    fn latest_reading(&self, location_id: LocationId) -> Result<Option<Reading>, AppError>;

    fn insert_reading(&self, reading: Reading) -> Result<(), AppError>;

    /// Predictions dated `from` or later, soonest first, at most `limit`.
    fn upcoming_predictions(
        &self,
        location_id: LocationId,
        from: Date,
        limit: usize,
    ) -> Result<Vec<Prediction>, AppError>;

    fn insert_prediction(&self, prediction: Prediction) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
struct Tables {
    locations: Vec<Location>,
    latest: HashMap<LocationId, Reading>,
    predictions: Vec<Prediction>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations(locations: Vec<Location>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                locations,
                ..Tables::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Store("memory store lock poisoned".to_string()))
    }
}

impl ReadingStore for MemoryStore {
    fn locations(&self) -> Result<Vec<Location>, AppError> {
        Ok(self.lock()?.locations.clone())
    }

    fn location_by_name(&self, name: &str) -> Result<Option<Location>, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .locations
            .iter()
            .find(|location| location.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    fn latest_reading(&self, location_id: LocationId) -> Result<Option<Reading>, AppError> {
        Ok(self.lock()?.latest.get(&location_id).cloned())
    }

    fn insert_reading(&self, reading: Reading) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        if !tables.locations.iter().any(|l| l.id == reading.location_id) {
            return Err(AppError::UnknownLocation(reading.location_id.to_string()));
        }
        tables.latest.insert(reading.location_id, reading);
        Ok(())
    }

    fn upcoming_predictions(
        &self,
        location_id: LocationId,
        from: Date,
        limit: usize,
    ) -> Result<Vec<Prediction>, AppError> {
        let tables = self.lock()?;
        let mut upcoming: Vec<Prediction> = tables
            .predictions
            .iter()
            .filter(|p| p.location_id == location_id && p.date >= from)
            .cloned()
            .collect();
        upcoming.sort_by_key(|p| p.date);
        upcoming.truncate(limit);
        Ok(upcoming)
    }

    /// Rows more than one forecast window older than the location's latest
    /// predicted date are dropped.
    fn insert_prediction(&self, prediction: Prediction) -> Result<(), AppError> {
        let (location_id, date) = (prediction.location_id, prediction.date);
        let mut tables = self.lock()?;
        // one prediction per location and day; the newest wins
        tables
            .predictions
            .retain(|p| !(p.location_id == location_id && p.date == date));
        tables.predictions.push(prediction);

        let latest = tables
            .predictions
            .iter()
            .filter(|p| p.location_id == location_id)
            .map(|p| p.date)
            .max()
            .unwrap_or(date);
        let horizon = latest.saturating_sub(Duration::days(FORECAST_DAYS as i64));
        tables
            .predictions
            .retain(|p| p.location_id != location_id || p.date >= horizon);
        Ok(())
    }
}
