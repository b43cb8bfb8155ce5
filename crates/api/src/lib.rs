//! Garden Monitor Status API
//!
//! Read-only HTTP consumers of the sample ring. Handlers never touch the
//! radio; the scheduler task is the only writer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, routing::get, Json, Router};
use sample_ring::SampleRing;
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod routes;
mod settings;

pub use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Latest samples, written by the scheduler task
    pub ring: Arc<RwLock<SampleRing>>,
    /// Age beyond which the latest sample flags the link as stale
    pub stale_after: Duration,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state around a shared ring
    pub fn new(ring: Arc<RwLock<SampleRing>>, stale_after: Duration) -> Self {
        Self {
            ring,
            stale_after,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub link: LinkHealth,
}

/// Radio link health derived from sample freshness
#[derive(Debug, Serialize)]
pub struct LinkHealth {
    pub status: String,
    pub last_sample_age_seconds: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/status", get(routes::status::get_status))
        .route("/api/v1/samples", get(routes::status::get_samples))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ring = state.ring.read().await;
    let now = Instant::now();
    let age = now.saturating_duration_since(ring.last_updated());
    let stale = ring.is_stale(now, state.stale_after);

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        link: LinkHealth {
            status: if stale { "stale" } else { "ok" }.to_string(),
            last_sample_age_seconds: age.as_secs(),
        },
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server
pub async fn run_server(addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let app = create_router(state);

    info!("Starting status server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
