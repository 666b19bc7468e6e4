use crate::api::ApiContext;
use crate::api::responses::{
    AlertBody, AlertsResponse, ChatRequest, ChatResponse, ClassifyResponse, ComputeRequest,
    ComputeResponse, ConcentrationInput, CurrentReadingResponse, ErrorCode, ErrorResponse,
    ForecastResponse, HealthStatus, HealthSuccessResponse, LiveRequest, LiveResponse,
    LocationsResponse, PollutantBreakdown, PredictionInput, PredictionsAcceptedResponse,
    PredictionsRequest, PushReadingRequest,
};
use crate::aqi::advice::{SENSITIVE_GROUPS, advice};
use crate::aqi::{self, AqiError, Concentration, Pollutant, Unit, classify};
use crate::chat;
use crate::error::AppError;
use crate::forecast::{FORECAST_DAYS, average_prediction, build_forecast};
use crate::prefs::Preferences;
use crate::refresh::apply_pushed_reading;
use crate::state::{Location, LocationId, Prediction, Reading};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::time::SystemTime;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{Date, OffsetDateTime};
use tracing::{error, info};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const NO_DATA_MESSAGE: &str = "No data available";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_health_response(&ctx, SystemTime::now())
}

pub async fn get_locations(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_locations_response(&ctx, SystemTime::now())
}

pub async fn get_current(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    build_current_response(&ctx, &name, SystemTime::now())
}

pub async fn get_forecast(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    build_forecast_response(&ctx, &name, SystemTime::now())
}

pub async fn get_classify(Path(aqi): Path<i32>) -> impl IntoResponse {
    build_classify_response(aqi, SystemTime::now())
}

pub async fn post_compute(Json(request): Json<ComputeRequest>) -> impl IntoResponse {
    build_compute_response(&request, SystemTime::now())
}

pub async fn get_alerts(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_alerts_response(&ctx, SystemTime::now())
}

pub async fn post_live(
    State(ctx): State<ApiContext>,
    Json(request): Json<LiveRequest>,
) -> impl IntoResponse {
    build_live_response(&ctx, &request, SystemTime::now())
}

pub async fn post_chat(Json(request): Json<ChatRequest>) -> impl IntoResponse {
    Json(ChatResponse {
        reply: chat::reply(&request.message),
    })
}

pub async fn get_preferences(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_get_preferences_response(&ctx)
}

pub async fn put_preferences(
    State(ctx): State<ApiContext>,
    Json(preferences): Json<Preferences>,
) -> impl IntoResponse {
    build_put_preferences_response(&ctx, preferences, SystemTime::now())
}

pub async fn post_reading(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
    Json(request): Json<PushReadingRequest>,
) -> impl IntoResponse {
    build_push_reading_response(&ctx, &name, &request, SystemTime::now())
}

pub async fn post_predictions(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
    Json(request): Json<PredictionsRequest>,
) -> impl IntoResponse {
    build_predictions_response(&ctx, &name, &request, SystemTime::now())
}

fn build_health_response(ctx: &ApiContext, now: SystemTime) -> ApiResponse<HealthSuccessResponse> {
    let live = match ctx.state.read() {
        Ok(guard) => guard.live(),
        Err(_) => return internal_error("/api/health", "state lock poisoned while reading live flag"),
    };
    with_timestamp("/api/health", now, |timestamp| HealthSuccessResponse {
        status: HealthStatus::Ok,
        live,
        timestamp,
    })
}

fn build_locations_response(ctx: &ApiContext, now: SystemTime) -> ApiResponse<LocationsResponse> {
    let locations = match ctx.store.locations() {
        Ok(locations) => locations,
        Err(err) => return app_error("/api/locations", &err, now),
    };
    with_timestamp("/api/locations", now, |timestamp| LocationsResponse {
        locations,
        timestamp,
    })
}

fn build_current_response(
    ctx: &ApiContext,
    name: &str,
    now: SystemTime,
) -> ApiResponse<CurrentReadingResponse> {
    const ROUTE: &str = "/api/locations/{name}/current";

    let location = match resolve_location(ctx, name) {
        Ok(location) => location,
        Err(err) => return app_error(ROUTE, &err, now),
    };

    let (cached, ml_prediction, histories) = {
        let guard = match ctx.state.read() {
            Ok(guard) => guard,
            Err(_) => return internal_error(ROUTE, "state lock poisoned while reading reading"),
        };
        let histories: Vec<Vec<f64>> = Pollutant::ALL
            .iter()
            .map(|pollutant| guard.pollutant_history(location.id, *pollutant))
            .collect();
        (
            guard.reading(location.id).cloned(),
            guard.ml_prediction(location.id).cloned(),
            histories,
        )
    };

    let reading = match cached {
        Some(reading) => reading,
        None => match ctx.store.latest_reading(location.id) {
            Ok(Some(reading)) => reading,
            Ok(None) => return no_data(now),
            Err(err) => return app_error(ROUTE, &err, now),
        },
    };

    let pollutants = Pollutant::ALL
        .iter()
        .zip(&histories)
        .filter_map(|(pollutant, history)| breakdown(ctx, &reading, *pollutant, history))
        .collect();

    let reading_timestamp = match format_timestamp(reading.timestamp) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error(ROUTE, "timestamp formatting failure"),
    };

    with_timestamp(ROUTE, now, |timestamp| CurrentReadingResponse {
        classification: reading.classification(),
        source: reading.source,
        dominant: aqi::dominant(&reading.sub_indices),
        pollutants,
        advice: advice(reading.category),
        sensitive_groups: &SENSITIVE_GROUPS,
        ml_prediction,
        reading_timestamp,
        location,
        timestamp,
    })
}

fn breakdown(
    ctx: &ApiContext,
    reading: &Reading,
    pollutant: Pollutant,
    history: &[f64],
) -> Option<PollutantBreakdown> {
    let concentration = reading.concentration(pollutant);
    let sub_index = reading.sub_indices.get(&pollutant).copied();
    if concentration.is_none() && sub_index.is_none() {
        return None;
    }
    Some(PollutantBreakdown {
        pollutant,
        label: pollutant.label(),
        value: concentration.map(|c| c.value),
        unit: concentration.map(|c| c.unit),
        sub_index,
        trend: ctx.trend.trend(history),
    })
}

fn build_forecast_response(
    ctx: &ApiContext,
    name: &str,
    now: SystemTime,
) -> ApiResponse<ForecastResponse> {
    const ROUTE: &str = "/api/locations/{name}/forecast";

    let location = match resolve_location(ctx, name) {
        Ok(location) => location,
        Err(err) => return app_error(ROUTE, &err, now),
    };
    let current = match latest_reading(ctx, location.id) {
        Ok(Some(reading)) => reading,
        Ok(None) => return no_data(now),
        Err(err) => return app_error(ROUTE, &err, now),
    };

    let today = OffsetDateTime::from(now).date();
    let predictions = match ctx.store.upcoming_predictions(location.id, today, FORECAST_DAYS) {
        Ok(predictions) => predictions,
        Err(err) => return app_error(ROUTE, &err, now),
    };

    with_timestamp(ROUTE, now, |timestamp| ForecastResponse {
        average_predicted_aqi: average_prediction(current.aqi, &predictions),
        points: build_forecast(current.aqi, &predictions, today),
        location: location.name,
        timestamp,
    })
}

fn build_classify_response(aqi: i32, now: SystemTime) -> ApiResponse<ClassifyResponse> {
    let classification = classify(aqi);
    with_timestamp("/api/classify/{aqi}", now, |timestamp| ClassifyResponse {
        label: classification.category.label(),
        classification,
        timestamp,
    })
}

fn build_compute_response(request: &ComputeRequest, now: SystemTime) -> ApiResponse<ComputeResponse> {
    const ROUTE: &str = "/api/compute";

    let result = parse_concentrations(&request.concentrations)
        .and_then(|concentrations| aqi::compute(&concentrations).map_err(AppError::from));
    let result = match result {
        Ok(result) => result,
        Err(err) => return app_error(ROUTE, &err, now),
    };

    with_timestamp(ROUTE, now, |timestamp| ComputeResponse {
        sub_indices: result.sub_indices,
        aqi: result.aqi,
        dominant: result.dominant,
        classification: result.classification,
        timestamp,
    })
}

fn parse_concentrations(inputs: &[ConcentrationInput]) -> Result<Vec<Concentration>, AppError> {
    inputs
        .iter()
        .map(|input| -> Result<Concentration, AppError> {
            let pollutant: Pollutant = input.pollutant.parse()?;
            let unit = match &input.unit {
                Some(raw) => raw.parse::<Unit>().map_err(AppError::InvalidInput)?,
                None => pollutant.canonical_unit(),
            };
            Ok(Concentration::new(pollutant, input.value, unit))
        })
        .collect()
}

fn build_alerts_response(ctx: &ApiContext, now: SystemTime) -> ApiResponse<AlertsResponse> {
    const ROUTE: &str = "/api/alerts";

    let (threshold, alerts) = match ctx.state.read() {
        Ok(guard) => (guard.alert_threshold(), guard.alerts()),
        Err(_) => return internal_error(ROUTE, "state lock poisoned while reading alerts"),
    };

    let mut bodies = Vec::with_capacity(alerts.len());
    for alert in alerts {
        let timestamp = match format_timestamp(alert.timestamp) {
            Ok(formatted) => formatted,
            Err(_) => return internal_error(ROUTE, "timestamp formatting failure"),
        };
        bodies.push(AlertBody {
            location_id: alert.location_id,
            aqi: alert.aqi,
            category: alert.category,
            timestamp,
        });
    }

    with_timestamp(ROUTE, now, |timestamp| AlertsResponse {
        threshold,
        alerts: bodies,
        timestamp,
    })
}

fn build_live_response(
    ctx: &ApiContext,
    request: &LiveRequest,
    now: SystemTime,
) -> ApiResponse<LiveResponse> {
    match ctx.state.write() {
        Ok(mut guard) => guard.set_live(request.enabled),
        Err(_) => return internal_error("/api/live", "state lock poisoned while setting live flag"),
    }
    info!(enabled = request.enabled, "Live mode updated");
    with_timestamp("/api/live", now, |timestamp| LiveResponse {
        live: request.enabled,
        timestamp,
    })
}

fn build_get_preferences_response(ctx: &ApiContext) -> ApiResponse<Preferences> {
    match ctx.prefs.lock() {
        Ok(store) => ApiResponse::Success(Preferences::load(&*store)),
        Err(_) => internal_error("/api/preferences", "preferences lock poisoned"),
    }
}

fn build_put_preferences_response(
    ctx: &ApiContext,
    preferences: Preferences,
    now: SystemTime,
) -> ApiResponse<Preferences> {
    const ROUTE: &str = "/api/preferences";

    let saved = match ctx.prefs.lock() {
        Ok(mut store) => preferences.save(&mut *store),
        Err(_) => return internal_error(ROUTE, "preferences lock poisoned"),
    };
    if let Err(err) = saved {
        return app_error(ROUTE, &err, now);
    }

    match ctx.state.write() {
        Ok(mut guard) => guard.set_alert_threshold(preferences.alert_threshold),
        Err(_) => return internal_error(ROUTE, "state lock poisoned while setting threshold"),
    }
    ApiResponse::Success(preferences)
}

fn build_push_reading_response(
    ctx: &ApiContext,
    name: &str,
    request: &PushReadingRequest,
    now: SystemTime,
) -> ApiResponse<ClassifyResponse> {
    const ROUTE: &str = "/api/locations/{name}/readings";

    let reading = resolve_location(ctx, name).and_then(|location| {
        apply_pushed_reading(&ctx.state, ctx.store.as_ref(), &location, request.aqi, now)
    });
    match reading {
        Ok(reading) => build_classify_response(reading.aqi, now),
        Err(err) => app_error(ROUTE, &err, now),
    }
}

fn build_predictions_response(
    ctx: &ApiContext,
    name: &str,
    request: &PredictionsRequest,
    now: SystemTime,
) -> ApiResponse<PredictionsAcceptedResponse> {
    const ROUTE: &str = "/api/locations/{name}/predictions";

    let location = match resolve_location(ctx, name) {
        Ok(location) => location,
        Err(err) => return app_error(ROUTE, &err, now),
    };

    let predictions = match request
        .predictions
        .iter()
        .map(|input| prediction_from_input(location.id, input))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(predictions) => predictions,
        Err(err) => return app_error(ROUTE, &err, now),
    };

    let accepted = predictions.len();
    for prediction in predictions {
        if let Err(err) = ctx.store.insert_prediction(prediction) {
            return app_error(ROUTE, &err, now);
        }
    }

    with_timestamp(ROUTE, now, |timestamp| PredictionsAcceptedResponse {
        location: location.name,
        accepted,
        timestamp,
    })
}

fn prediction_from_input(location_id: LocationId, input: &PredictionInput) -> Result<Prediction, AppError> {
    Ok(Prediction {
        location_id,
        date: parse_date(&input.date)?,
        predicted_aqi: input.predicted_aqi,
        confidence: input.confidence,
    })
}

fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), &Iso8601::DATE)
        .map_err(|err| AppError::InvalidInput(format!("invalid date {raw:?}: {err}")))
}

fn resolve_location(ctx: &ApiContext, name: &str) -> Result<Location, AppError> {
    ctx.store
        .location_by_name(name)?
        .ok_or_else(|| AppError::UnknownLocation(name.to_string()))
}

fn latest_reading(ctx: &ApiContext, location_id: LocationId) -> Result<Option<Reading>, AppError> {
    let cached = {
        let guard = ctx.state.read().map_err(|_| AppError::StateLock)?;
        guard.reading(location_id).cloned()
    };
    match cached {
        Some(reading) => Ok(Some(reading)),
        None => ctx.store.latest_reading(location_id),
    }
}

fn with_timestamp<T>(route: &str, now: SystemTime, body: impl FnOnce(String) -> T) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(formatted) => ApiResponse::Success(body(formatted)),
        Err(_) => internal_error(route, "timestamp formatting failure"),
    }
}

fn app_error<T>(route: &str, err: &AppError, now: SystemTime) -> ApiResponse<T> {
    match err {
        AppError::UnknownLocation(name) => error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::LocationNotFound,
            &format!("Unknown location: {name}"),
            now,
        ),
        AppError::NoData(_) => no_data(now),
        AppError::Aqi(AqiError::InsufficientData) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InsufficientData,
            "Insufficient data: no pollutant concentrations",
            now,
        ),
        AppError::Aqi(_) | AppError::InvalidInput(_) | AppError::Preferences(_) => error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInput,
            &err.to_string(),
            now,
        ),
        AppError::Provider(_) | AppError::Store(_) | AppError::Ml(_) | AppError::StateLock => {
            internal_error(route, &err.to_string())
        }
    }
}

fn no_data<T>(now: SystemTime) -> ApiResponse<T> {
    error_response(StatusCode::SERVICE_UNAVAILABLE, ErrorCode::NoData, NO_DATA_MESSAGE, now)
}

fn error_response<T>(status: StatusCode, code: ErrorCode, message: &str, now: SystemTime) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(formatted) => ApiResponse::Error {
            status,
            body: ErrorResponse {
                error_code: code,
                error_message: message.to_string(),
                timestamp: formatted,
            },
        },
        Err(_) => internal_error("error response", "timestamp formatting failure"),
    }
}

fn internal_error<T>(route: &str, message: &str) -> ApiResponse<T> {
    error!(route, message, "Internal error while handling request");
    let formatted = format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::trend::{SlopeTrend, Trend};
    use crate::aqi::{AqiCategory, SubIndices};
    use crate::prefs::MemoryKeyValueStore;
    use crate::refresh::record_reading;
    use crate::state::{AppState, ReadingSource};
    use crate::store::MemoryStore;
    use std::sync::{Arc, Mutex, RwLock};
    use std::time::{Duration, UNIX_EPOCH};

    // 2026-03-09T12:00:00Z, a Monday
    const NOW_SECS: u64 = 1_773_057_600;

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(NOW_SECS)
    }

    fn context() -> ApiContext {
        let locations = ["North Delhi", "Central Delhi", "South Delhi"]
            .iter()
            .enumerate()
            .map(|(index, name)| Location {
                id: index as u32 + 1,
                name: name.to_string(),
                latitude: 28.6,
                longitude: 77.2,
            })
            .collect();
        ApiContext {
            state: Arc::new(RwLock::new(AppState::new())),
            store: Arc::new(MemoryStore::with_locations(locations)),
            prefs: Arc::new(Mutex::new(MemoryKeyValueStore::new())),
            trend: Arc::new(SlopeTrend::default()),
        }
    }

    fn pm25_reading(location_id: LocationId, value: f64) -> Reading {
        let concentrations = vec![Concentration::canonical(Pollutant::Pm25, value)];
        let result = aqi::compute(&concentrations).expect("compute pm2.5");
        Reading::new(
            location_id,
            now(),
            result.aqi,
            concentrations,
            result.sub_indices,
            ReadingSource::Computed,
        )
    }

    fn expect_error<T>(response: ApiResponse<T>) -> (StatusCode, ErrorResponse) {
        match response {
            ApiResponse::Error { status, body } => (status, body),
            ApiResponse::Success(_) => panic!("expected error response"),
        }
    }

    fn expect_success<T>(response: ApiResponse<T>) -> T {
        match response {
            ApiResponse::Success(body) => body,
            ApiResponse::Error { status, body } => {
                panic!("expected success, got {status}: {}", body.error_message)
            }
        }
    }

    fn poison_state(ctx: &ApiContext) {
        let state = Arc::clone(&ctx.state);
        let _ = std::thread::spawn(move || {
            let _guard = state.write().expect("lock for poison");
            panic!("poison lock");
        })
        .join();
    }

    #[test]
    fn health_reports_live_flag() {
        let ctx = context();
        ctx.state.write().expect("state lock").set_live(false);

        let body = expect_success(build_health_response(&ctx, now()));

        assert_eq!(body.status, HealthStatus::Ok);
        assert!(!body.live);
        assert_eq!(body.timestamp, "2026-03-09T12:00:00Z");
    }

    #[test]
    fn health_returns_internal_error_when_lock_poisoned() {
        let ctx = context();
        poison_state(&ctx);

        let (status, body) = expect_error(build_health_response(&ctx, now()));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_code, ErrorCode::InternalError);
        assert_eq!(body.error_message, "Internal server error");
    }

    #[test]
    fn locations_are_listed_in_order() {
        let ctx = context();

        let body = expect_success(build_locations_response(&ctx, now()));

        let names: Vec<&str> = body.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["North Delhi", "Central Delhi", "South Delhi"]);
    }

    #[test]
    fn current_for_unknown_location_is_not_found() {
        let ctx = context();

        let (status, body) = expect_error(build_current_response(&ctx, "Mumbai", now()));

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error_code, ErrorCode::LocationNotFound);
    }

    #[test]
    fn current_without_reading_is_no_data() {
        let ctx = context();

        let (status, body) = expect_error(build_current_response(&ctx, "North Delhi", now()));

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error_code, ErrorCode::NoData);
        assert_eq!(body.error_message, "No data available");
    }

    #[test]
    fn current_reports_breakdown_trend_and_advice() {
        let ctx = context();
        for value in [20.0, 30.0, 45.0, 60.0] {
            record_reading(&ctx.state, ctx.store.as_ref(), pm25_reading(2, value))
                .expect("record reading");
        }

        let body = expect_success(build_current_response(&ctx, "central delhi", now()));

        assert_eq!(body.location.id, 2);
        assert_eq!(body.classification.aqi, 152);
        assert_eq!(body.classification.category, AqiCategory::Unhealthy);
        assert_eq!(body.dominant, Some(Pollutant::Pm25));
        assert_eq!(body.pollutants.len(), 1);
        assert_eq!(body.pollutants[0].value, Some(60.0));
        assert_eq!(body.pollutants[0].trend, Trend::Rising);
        assert_eq!(body.advice, advice(AqiCategory::Unhealthy));
        assert_eq!(body.ml_prediction, None);
        assert_eq!(body.reading_timestamp, "2026-03-09T12:00:00Z");
    }

    #[test]
    fn forecast_uses_ingested_predictions() {
        let ctx = context();
        record_reading(&ctx.state, ctx.store.as_ref(), pm25_reading(1, 12.0)).expect("record reading");
        let request = PredictionsRequest {
            predictions: [("2026-03-09", 55), ("2026-03-10", 80), ("2026-03-11", 120)]
                .iter()
                .map(|(date, aqi)| PredictionInput {
                    date: date.to_string(),
                    predicted_aqi: *aqi,
                    confidence: None,
                })
                .collect(),
        };

        let accepted = expect_success(build_predictions_response(&ctx, "North Delhi", &request, now()));
        let body = expect_success(build_forecast_response(&ctx, "North Delhi", now()));

        assert_eq!(accepted.accepted, 3);
        assert_eq!(body.points.len(), FORECAST_DAYS);
        assert_eq!(body.points[0].aqi, 50);
        assert_eq!(body.points[1].label, "Tomorrow");
        assert_eq!(body.points[1].aqi, 80);
        assert_eq!(body.points[6].aqi, 120);
        assert_eq!(body.average_predicted_aqi, 85);
    }

    #[test]
    fn invalid_prediction_date_is_rejected() {
        let ctx = context();
        let request = PredictionsRequest {
            predictions: vec![PredictionInput {
                date: "2026-13-01".to_string(),
                predicted_aqi: 100,
                confidence: None,
            }],
        };

        let (status, body) = expect_error(build_predictions_response(&ctx, "North Delhi", &request, now()));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_code, ErrorCode::InvalidInput);
    }

    #[test]
    fn rejected_prediction_batch_stores_nothing() -> Result<(), AppError> {
        let ctx = context();
        let request = PredictionsRequest {
            predictions: [("2026-03-10", 90), ("bogus", 100)]
                .iter()
                .map(|(date, aqi)| PredictionInput {
                    date: date.to_string(),
                    predicted_aqi: *aqi,
                    confidence: None,
                })
                .collect(),
        };

        let (status, body) = expect_error(build_predictions_response(&ctx, "North Delhi", &request, now()));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_code, ErrorCode::InvalidInput);
        let today = OffsetDateTime::from(now()).date();
        assert!(ctx.store.upcoming_predictions(1, today, FORECAST_DAYS)?.is_empty());
        Ok(())
    }

    #[test]
    fn classify_maps_boundaries() {
        let good = expect_success(build_classify_response(50, now()));
        let moderate = expect_success(build_classify_response(51, now()));
        let negative = expect_success(build_classify_response(-5, now()));

        assert_eq!(good.label, "Good");
        assert_eq!(moderate.classification.category, AqiCategory::Moderate);
        assert_eq!(negative.classification.category, AqiCategory::Good);
    }

    #[test]
    fn compute_returns_aggregate_and_dominant() {
        let request = ComputeRequest {
            concentrations: vec![
                ConcentrationInput {
                    pollutant: "pm2.5".to_string(),
                    value: 35.4,
                    unit: None,
                },
                ConcentrationInput {
                    pollutant: "o3".to_string(),
                    value: 85.0,
                    unit: Some("ppb".to_string()),
                },
            ],
        };

        let body = expect_success(build_compute_response(&request, now()));

        assert_eq!(body.aqi, 150);
        assert_eq!(body.dominant, Pollutant::O3);
        assert_eq!(body.sub_indices, SubIndices::from([(Pollutant::Pm25, 100.0), (Pollutant::O3, 150.0)]));
    }

    #[test]
    fn compute_rejects_unknown_pollutant_and_bad_unit() {
        let unknown = ComputeRequest {
            concentrations: vec![ConcentrationInput {
                pollutant: "nh3".to_string(),
                value: 10.0,
                unit: None,
            }],
        };
        let mismatch = ComputeRequest {
            concentrations: vec![ConcentrationInput {
                pollutant: "pm10".to_string(),
                value: 10.0,
                unit: Some("ppm".to_string()),
            }],
        };

        let (unknown_status, unknown_body) = expect_error(build_compute_response(&unknown, now()));
        let (mismatch_status, mismatch_body) = expect_error(build_compute_response(&mismatch, now()));

        assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
        assert_eq!(unknown_body.error_code, ErrorCode::InvalidInput);
        assert_eq!(mismatch_status, StatusCode::BAD_REQUEST);
        assert_eq!(mismatch_body.error_code, ErrorCode::InvalidInput);
    }

    #[test]
    fn compute_without_concentrations_is_insufficient_data() {
        let request = ComputeRequest {
            concentrations: Vec::new(),
        };

        let (status, body) = expect_error(build_compute_response(&request, now()));

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error_code, ErrorCode::InsufficientData);
    }

    #[test]
    fn pushed_reading_over_threshold_shows_in_alerts() {
        let ctx = context();

        let pushed = expect_success(build_push_reading_response(
            &ctx,
            "South Delhi",
            &PushReadingRequest { aqi: 310 },
            now(),
        ));
        let alerts = expect_success(build_alerts_response(&ctx, now()));

        assert_eq!(pushed.classification.category, AqiCategory::Hazardous);
        assert_eq!(alerts.threshold, 200);
        assert_eq!(alerts.alerts.len(), 1);
        assert_eq!(alerts.alerts[0].location_id, 3);
        assert_eq!(alerts.alerts[0].timestamp, "2026-03-09T12:00:00Z");
    }

    #[test]
    fn live_toggle_updates_state() {
        let ctx = context();

        let body = expect_success(build_live_response(&ctx, &LiveRequest { enabled: false }, now()));

        assert!(!body.live);
        assert!(!ctx.state.read().expect("state lock").live());
    }

    #[test]
    fn preferences_update_alert_threshold() {
        let ctx = context();
        let preferences = Preferences {
            alert_threshold: 100,
            ..Preferences::default()
        };

        expect_success(build_put_preferences_response(&ctx, preferences.clone(), now()));
        let loaded = expect_success(build_get_preferences_response(&ctx));

        assert_eq!(loaded, preferences);
        assert_eq!(ctx.state.read().expect("state lock").alert_threshold(), 100);
    }

    #[test]
    fn invalid_preferences_are_rejected() {
        let ctx = context();
        let preferences = Preferences {
            alert_threshold: -1,
            ..Preferences::default()
        };

        let (status, body) = expect_error(build_put_preferences_response(&ctx, preferences, now()));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_code, ErrorCode::InvalidInput);
        assert_eq!(ctx.state.read().expect("state lock").alert_threshold(), 200);
    }

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert!(parse_date("2026-03-09").is_ok());
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("03/09/2026").is_err());
        assert!(parse_date("2026-3-9").is_err());
        assert!(parse_date("+2026-03-09").is_err());
        assert!(parse_date("2026-03-09x").is_err());
    }
}
