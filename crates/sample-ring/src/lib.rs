//! Sample Ring
//!
//! Retains the most recent N telemetry samples with O(1) insert and O(1)
//! access to the latest, plus a staleness predicate against wall-clock time.

mod ring;

pub use ring::SampleRing;

use serde::{Deserialize, Serialize};

/// One labeled telemetry reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Elapsed-time stamp of the capture, e.g. `01:02:03`
    pub label: String,
    /// Decoded reading
    pub value: f64,
}

impl Sample {
    /// Create a labeled sample
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}
