use crate::aqi::{AqiCategory, Classification, Concentration, Pollutant, SubIndices, classify};
use crate::ml::MlPrediction;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;
use time::Date;
use tokio::sync::watch;

pub type LocationId = u32;

/// Readings kept per location for trend estimation.
pub const HISTORY_LEN: usize = 24;
pub const MAX_ALERTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    /// AQI computed locally from raw concentrations.
    Computed,
    /// AQI reported as-is by the data provider.
    Provider,
    /// Delivered by a push event.
    Pushed,
}

/// One observation for a location. Replaced, never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub location_id: LocationId,
    pub timestamp: SystemTime,
    pub aqi: i32,
    pub category: AqiCategory,
    pub concentrations: Vec<Concentration>,
    pub sub_indices: SubIndices,
    pub source: ReadingSource,
}

impl Reading {
    pub fn new(
        location_id: LocationId,
        timestamp: SystemTime,
        aqi: i32,
        concentrations: Vec<Concentration>,
        sub_indices: SubIndices,
        source: ReadingSource,
    ) -> Self {
        Self {
            location_id,
            timestamp,
            aqi,
            category: classify(aqi).category,
            concentrations,
            sub_indices,
            source,
        }
    }

    pub fn classification(&self) -> Classification {
        classify(self.aqi)
    }

    pub fn concentration(&self, pollutant: Pollutant) -> Option<&Concentration> {
        self.concentrations
            .iter()
            .rev()
            .find(|c| c.pollutant == pollutant)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub location_id: LocationId,
    pub date: Date,
    pub predicted_aqi: i32,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub location_id: LocationId,
    pub aqi: i32,
    pub category: AqiCategory,
    pub timestamp: SystemTime,
}

#[derive(Debug)]
pub struct AppState {
    readings: HashMap<LocationId, Reading>,
    readings_tx: watch::Sender<Option<Reading>>,
    history: HashMap<LocationId, VecDeque<Reading>>,
    ml_predictions: HashMap<LocationId, MlPrediction>,
    alerts: VecDeque<Alert>,
    alerts_tx: watch::Sender<Vec<Alert>>,
    live: bool,
    live_tx: watch::Sender<bool>,
    alert_threshold: i32,
}

impl AppState {
    pub fn new() -> Self {
        let (readings_tx, _readings_rx) = watch::channel(None);
        let (alerts_tx, _alerts_rx) = watch::channel(Vec::new());
        let (live_tx, _live_rx) = watch::channel(true);
        Self {
            readings: HashMap::new(),
            readings_tx,
            history: HashMap::new(),
            ml_predictions: HashMap::new(),
            alerts: VecDeque::new(),
            alerts_tx,
            live: true,
            live_tx,
            alert_threshold: crate::config::DEFAULT_ALERT_THRESHOLD_AQI,
        }
    }

    pub fn reading(&self, location_id: LocationId) -> Option<&Reading> {
        self.readings.get(&location_id)
    }

    pub fn subscribe_readings(&self) -> watch::Receiver<Option<Reading>> {
        self.readings_tx.subscribe()
    }

    /// Replaces the current reading for its location and appends it to the history.
    pub fn set_reading(&mut self, reading: Reading) {
        let history = self.history.entry(reading.location_id).or_default();
        history.push_back(reading.clone());
        while history.len() > HISTORY_LEN {
            history.pop_front();
        }
        self.readings.insert(reading.location_id, reading.clone());
        self.readings_tx.send_replace(Some(reading));
    }

    /// Sub-index history of one pollutant, oldest first.
    pub fn pollutant_history(&self, location_id: LocationId, pollutant: Pollutant) -> Vec<f64> {
        self.history
            .get(&location_id)
            .map(|readings| {
                readings
                    .iter()
                    .filter_map(|r| r.sub_indices.get(&pollutant).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn ml_prediction(&self, location_id: LocationId) -> Option<&MlPrediction> {
        self.ml_predictions.get(&location_id)
    }

    pub fn set_ml_prediction(&mut self, location_id: LocationId, prediction: MlPrediction) {
        self.ml_predictions.insert(location_id, prediction);
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }

    pub fn subscribe_alerts(&self) -> watch::Receiver<Vec<Alert>> {
        self.alerts_tx.subscribe()
    }

    /// Newest first; the oldest alert is dropped past `MAX_ALERTS`.
    pub fn push_alert(&mut self, alert: Alert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(MAX_ALERTS);
        self.alerts_tx.send_replace(self.alerts());
    }

    pub fn live(&self) -> bool {
        self.live
    }

    pub fn subscribe_live(&self) -> watch::Receiver<bool> {
        self.live_tx.subscribe()
    }

    pub fn set_live(&mut self, enabled: bool) {
        self.live = enabled;
        self.live_tx.send_replace(enabled);
    }

    pub fn alert_threshold(&self) -> i32 {
        self.alert_threshold
    }

    pub fn set_alert_threshold(&mut self, threshold: i32) {
        self.alert_threshold = threshold;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn reading_with_pm25(location_id: LocationId, secs: u64, sub_index: f64) -> Reading {
        Reading::new(
            location_id,
            UNIX_EPOCH + Duration::from_secs(secs),
            sub_index.round() as i32,
            vec![Concentration::canonical(Pollutant::Pm25, 10.0)],
            SubIndices::from([(Pollutant::Pm25, sub_index)]),
            ReadingSource::Computed,
        )
    }

    #[test]
    fn set_reading_updates_state_and_watch() {
        let mut state = AppState::new();
        let receiver = state.subscribe_readings();
        let reading = reading_with_pm25(1, 1, 42.0);

        state.set_reading(reading.clone());

        assert_eq!(state.reading(1), Some(&reading));
        assert_eq!(*receiver.borrow(), Some(reading));
    }

    #[test]
    fn reading_category_follows_aqi() {
        let reading = reading_with_pm25(1, 1, 151.0);

        assert_eq!(reading.category, AqiCategory::Unhealthy);
        assert_eq!(reading.classification().severity, 3);
    }

    #[test]
    fn history_is_bounded_and_ordered() {
        let mut state = AppState::new();
        for step in 0..(HISTORY_LEN as u64 + 5) {
            state.set_reading(reading_with_pm25(7, step, step as f64));
        }

        let history = state.pollutant_history(7, Pollutant::Pm25);

        assert_eq!(history.len(), HISTORY_LEN);
        assert_eq!(history[0], 5.0);
        assert_eq!(history[HISTORY_LEN - 1], (HISTORY_LEN + 4) as f64);
        assert!(state.pollutant_history(7, Pollutant::Co).is_empty());
        assert!(state.pollutant_history(8, Pollutant::Pm25).is_empty());
    }

    #[test]
    fn alerts_are_newest_first_and_capped() {
        let mut state = AppState::new();
        let receiver = state.subscribe_alerts();
        for aqi in 0..(MAX_ALERTS as i32 + 3) {
            state.push_alert(Alert {
                location_id: 1,
                aqi: 200 + aqi,
                category: AqiCategory::VeryUnhealthy,
                timestamp: UNIX_EPOCH,
            });
        }

        let alerts = state.alerts();

        assert_eq!(alerts.len(), MAX_ALERTS);
        assert_eq!(alerts[0].aqi, 200 + MAX_ALERTS as i32 + 2);
        assert_eq!(receiver.borrow().len(), MAX_ALERTS);
    }

    #[test]
    fn set_live_publishes_flag() {
        let mut state = AppState::new();
        let receiver = state.subscribe_live();

        state.set_live(false);

        assert!(!state.live());
        assert!(!*receiver.borrow());
    }
}
