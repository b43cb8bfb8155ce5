//! Probe Scheduler
//!
//! Drives the telemetry rounds against the sensor node: active moisture
//! polling with liveness pings, or passive temperature listening. Each
//! successful round lands one sample in the shared ring.

mod scheduler;

pub use scheduler::{ProbeScheduler, SchedulerConfig};
