use crate::aqi::{self, AqiError, SubIndices};
use crate::error::AppError;
use crate::ml::{MlClient, MlFeatures, MlPrediction};
use crate::provider::{PollutantProvider, ProviderPayload};
use crate::state::{Alert, AppState, Location, Reading, ReadingSource};
use crate::store::ReadingStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Fetches, scores and records one location.
///
/// A payload with no usable pollutant keeps the last known reading for the
/// location. When there is none the location reports [`AppError::NoData`]
/// rather than an AQI of zero.
pub fn refresh_location<P: PollutantProvider + ?Sized>(
    state: &Arc<RwLock<AppState>>,
    store: &dyn ReadingStore,
    provider: &mut P,
    location: &Location,
    now: SystemTime,
) -> Result<Reading, AppError> {
    let payload = provider.fetch(location).map_err(|err| {
        warn!(
            provider = provider.name(),
            location = %location.name,
            error = %err,
            "Provider fetch failed"
        );
        AppError::NoData(location.name.clone())
    })?;

    let reading = match payload {
        ProviderPayload::Concentrations(concentrations) => match aqi::compute(&concentrations) {
            Ok(result) => Reading::new(
                location.id,
                now,
                result.aqi,
                concentrations,
                result.sub_indices,
                ReadingSource::Computed,
            ),
            Err(AqiError::InsufficientData) => return last_known(state, store, location),
            Err(err) => {
                warn!(location = %location.name, error = %err, "Rejected provider payload");
                return Err(err.into());
            }
        },
        ProviderPayload::Precomputed { aqi, sub_indices } => Reading::new(
            location.id,
            now,
            aqi,
            Vec::new(),
            sub_indices,
            ReadingSource::Provider,
        ),
    };

    record_reading(state, store, reading.clone())?;
    Ok(reading)
}

fn last_known(
    state: &Arc<RwLock<AppState>>,
    store: &dyn ReadingStore,
    location: &Location,
) -> Result<Reading, AppError> {
    let cached = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.reading(location.id).cloned()
    };
    let previous = match cached {
        Some(reading) => Some(reading),
        None => store.latest_reading(location.id)?,
    };
    match previous {
        Some(reading) => {
            info!(
                location = %location.name,
                aqi = reading.aqi,
                "No usable pollutant data, keeping last known AQI"
            );
            Ok(reading)
        }
        None => {
            warn!(location = %location.name, "No usable pollutant data and no previous reading");
            Err(AppError::NoData(location.name.clone()))
        }
    }
}

/// Persists a reading, publishes it and raises an alert past the threshold.
pub fn record_reading(
    state: &Arc<RwLock<AppState>>,
    store: &dyn ReadingStore,
    reading: Reading,
) -> Result<(), AppError> {
    store.insert_reading(reading.clone())?;

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    if reading.aqi >= guard.alert_threshold() {
        warn!(
            location_id = reading.location_id,
            aqi = reading.aqi,
            category = reading.category.label(),
            "AQI alert threshold reached"
        );
        guard.push_alert(Alert {
            location_id: reading.location_id,
            aqi: reading.aqi,
            category: reading.category,
            timestamp: reading.timestamp,
        });
    }
    guard.set_reading(reading);
    Ok(())
}

/// Push-event callback: a reading delivered by the backend replaces the
/// current one exactly like a fetched reading.
pub fn apply_pushed_reading(
    state: &Arc<RwLock<AppState>>,
    store: &dyn ReadingStore,
    location: &Location,
    aqi: i32,
    now: SystemTime,
) -> Result<Reading, AppError> {
    let reading = Reading::new(
        location.id,
        now,
        aqi,
        Vec::new(),
        SubIndices::new(),
        ReadingSource::Pushed,
    );
    debug!(location = %location.name, aqi, "Applying pushed reading");
    record_reading(state, store, reading.clone())?;
    Ok(reading)
}

/// Asks the ML service for its own estimate of a reading.
pub fn refresh_ml_prediction(
    state: &Arc<RwLock<AppState>>,
    ml: &dyn MlClient,
    reading: &Reading,
) -> Result<MlPrediction, AppError> {
    if reading.concentrations.is_empty() {
        return Err(AppError::NoData(format!(
            "concentrations for location {}",
            reading.location_id
        )));
    }
    let features = MlFeatures::from_concentrations(&reading.concentrations);
    let prediction = ml.predict(&features)?;

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    guard.set_ml_prediction(reading.location_id, prediction.clone());
    Ok(prediction)
}

/// Refreshes every known location; returns how many produced a reading.
pub fn run_refresh_cycle<P: PollutantProvider + ?Sized>(
    state: &Arc<RwLock<AppState>>,
    store: &dyn ReadingStore,
    provider: &mut P,
    ml: Option<&dyn MlClient>,
) -> Result<usize, AppError> {
    let locations = store.locations()?;
    let mut refreshed = 0;

    for location in &locations {
        let reading =
            match refresh_location(state, store, &mut *provider, location, SystemTime::now()) {
                Ok(reading) => reading,
                Err(err) => {
                    warn!(location = %location.name, error = %err, "Location refresh failed");
                    continue;
                }
            };
        refreshed += 1;

        if let Some(ml) = ml
            && reading.source == ReadingSource::Computed
            && let Err(err) = refresh_ml_prediction(state, ml, &reading)
        {
            debug!(location = %location.name, error = %err, "No ML prediction this cycle");
        }
    }

    Ok(refreshed)
}

pub fn spawn_refresh_thread<P>(
    mut provider: P,
    state: Arc<RwLock<AppState>>,
    store: Arc<dyn ReadingStore>,
    ml: Option<Arc<dyn MlClient>>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()>
where
    P: PollutantProvider + Send + 'static,
{
    std::thread::spawn(move || {
        info!(provider = provider.name(), interval_secs = interval.as_secs(), "Refresh thread started");

        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            let live = match state.read() {
                Ok(guard) => guard.live(),
                Err(_) => {
                    warn!("State lock poisoned, stopping refresh thread");
                    break;
                }
            };

            if live {
                match run_refresh_cycle(&state, store.as_ref(), &mut provider, ml.as_deref()) {
                    Ok(count) => debug!(locations = count, "Refresh cycle complete"),
                    Err(err) => warn!(error = %err, "Error running refresh cycle"),
                }
            } else {
                debug!("Live mode off, skipping refresh cycle");
            }

            sleep_with_stop(interval, &stop, cycle_start);
        }
    })
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step.min(remaining - slept));
        slept += step;
    }
}
