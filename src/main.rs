use airaware::api::{self, ApiContext};
use airaware::aqi::trend::{DecorativeTrend, SlopeTrend, TrendSource};
use airaware::config::{self, Config, ProviderKind, TrendKind};
use airaware::ml::{MlClient, RemoteMlClient};
use airaware::prefs::{MemoryKeyValueStore, Preferences};
use airaware::provider::simulated::SimulatedProvider;
use airaware::provider::{ChainProvider, HttpProvider, PollutantProvider};
use airaware::refresh::spawn_refresh_thread;
use airaware::state::AppState;
use airaware::store::MemoryStore;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level());
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "airaware starting"
    );

    let locations = config.locations();
    if locations.is_empty() {
        tracing::warn!("No locations configured in [[locations]]");
    }
    let store = Arc::new(MemoryStore::with_locations(locations));

    let state = Arc::new(RwLock::new(AppState::new()));
    if let Ok(mut guard) = state.write() {
        guard.set_live(config.live_enabled());
        guard.set_alert_threshold(config.alert_threshold());
    } else {
        tracing::warn!("State lock poisoned while applying config");
    }

    let ml = build_ml_client(&config);
    let provider = build_provider(&config);

    let stop_flag = Arc::new(AtomicBool::new(false));
    let refresh_interval = config.refresh_interval();
    tracing::info!(
        interval_secs = refresh_interval.as_secs(),
        live = config.live_enabled(),
        "Starting refresh thread"
    );
    let refresh_handle = spawn_refresh_thread(
        provider,
        Arc::clone(&state),
        store.clone(),
        ml,
        refresh_interval,
        Arc::clone(&stop_flag),
    );

    let mut kv = MemoryKeyValueStore::new();
    Preferences {
        alert_threshold: config.alert_threshold(),
        ..Preferences::default()
    }
    .save(&mut kv)?;

    let trend: Arc<dyn TrendSource> = match config.trend_kind() {
        TrendKind::Slope => Arc::new(SlopeTrend::default()),
        TrendKind::Decorative => Arc::new(DecorativeTrend),
    };

    let app = api::router(ApiContext {
        state: Arc::clone(&state),
        store,
        prefs: Arc::new(Mutex::new(kv)),
        trend,
    });
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    // Signal refresh thread to stop
    stop_flag.store(true, Ordering::Relaxed);
    if refresh_handle.join().is_err() {
        tracing::warn!("Refresh thread panicked");
    }

    Ok(())
}

fn build_ml_client(config: &Config) -> Option<Arc<dyn MlClient>> {
    let Some((endpoint, timeout)) = config.ml_endpoint() else {
        tracing::info!("No ML endpoint configured, skipping ML predictions");
        return None;
    };
    let client = RemoteMlClient::new(endpoint, timeout);
    if client.health() {
        tracing::info!(endpoint, "ML service reachable");
    } else {
        tracing::warn!(endpoint, "ML service not reachable yet, predictions may fail");
    }
    Some(Arc::new(client))
}

fn build_provider(config: &Config) -> Box<dyn PollutantProvider + Send> {
    let timeout = config.provider_timeout();
    let primary: Box<dyn PollutantProvider + Send> =
        match (config.provider_kind(), config.provider_endpoint()) {
            (ProviderKind::Simulated, _) | (_, None) => {
                tracing::info!("Using simulated pollutant data");
                Box::new(SimulatedProvider::from_entropy())
            }
            (kind, Some(endpoint)) => {
                tracing::info!(provider = ?kind, endpoint, "Using remote pollutant provider");
                Box::new(HttpProvider::new(kind, endpoint, timeout))
            }
        };

    match config.provider_fallback() {
        Some((kind, endpoint)) => {
            tracing::info!(provider = ?kind, endpoint, "Fallback provider configured");
            Box::new(ChainProvider::new(vec![
                primary,
                Box::new(HttpProvider::new(kind, endpoint, timeout)),
            ]))
        }
        None => primary,
    }
}
