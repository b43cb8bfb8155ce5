//! Current Reading and Sample Window Routes

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use sample_ring::Sample;
use serde::Serialize;

use crate::AppState;

/// Response for the status endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Most recent sample
    pub sample: Sample,
    /// Whether the sample is older than the configured threshold
    pub stale: bool,
    /// Age of the sample in whole seconds
    pub age_seconds: u64,
    pub ring: RingMeta,
}

#[derive(Debug, Serialize)]
pub struct RingMeta {
    pub count: usize,
    pub capacity: usize,
}

/// Response for the samples endpoint
#[derive(Debug, Serialize)]
pub struct SamplesResponse {
    /// Retained samples, newest first
    pub data: Vec<Sample>,
    pub meta: RingMeta,
}

/// Get the latest reading and its staleness
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let ring = state.ring.read().await;
    let now = Instant::now();

    Json(StatusResponse {
        sample: ring.current().clone(),
        stale: ring.is_stale(now, state.stale_after),
        age_seconds: now.saturating_duration_since(ring.last_updated()).as_secs(),
        ring: RingMeta {
            count: ring.len(),
            capacity: ring.capacity(),
        },
    })
}

/// Get the retained sample window
pub async fn get_samples(State(state): State<Arc<AppState>>) -> Json<SamplesResponse> {
    let ring = state.ring.read().await;

    Json(SamplesResponse {
        data: ring.recent(),
        meta: RingMeta {
            count: ring.len(),
            capacity: ring.capacity(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_ring::SampleRing;
    use std::time::Duration;
    use tokio::sync::RwLock;

    fn state() -> Arc<AppState> {
        let ring = Arc::new(RwLock::new(SampleRing::new(3, Sample::new("00:00:00", 0.0))));
        Arc::new(AppState::new(ring, Duration::from_secs(120)))
    }

    #[tokio::test]
    async fn test_status_is_fresh_right_after_a_push() {
        let state = state();
        state.ring.write().await.push(Sample::new("00:00:05", 4.2));

        let response = get_status(State(state)).await.0;

        assert!(!response.stale);
        assert_eq!(response.sample, Sample::new("00:00:05", 4.2));
        assert_eq!(response.ring.count, 2);
        assert_eq!(response.ring.capacity, 3);
    }

    #[tokio::test]
    async fn test_status_body_shape() {
        let state = state();
        state.ring.write().await.push(Sample::new("00:00:05", 4.2));

        let response = get_status(State(state)).await.0;
        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(body["sample"]["label"], "00:00:05");
        assert_eq!(body["sample"]["value"], 4.2);
        assert_eq!(body["stale"], false);
        assert_eq!(body["ring"]["capacity"], 3);
    }

    #[tokio::test]
    async fn test_samples_window_is_newest_first_and_capped() {
        let state = state();
        for n in 1..=5 {
            state
                .ring
                .write()
                .await
                .push(Sample::new(format!("00:00:{n:02}"), n as f64));
        }

        let response = get_samples(State(state)).await.0;

        assert_eq!(response.data.len(), 3);
        assert_eq!(response.data[0].value, 5.0);
        assert_eq!(response.data[2].value, 3.0);
    }
}
