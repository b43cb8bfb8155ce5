//! Process Settings
//!
//! Layered configuration: built-in defaults, an optional `monitor.toml`
//! file, then `MONITOR_`-prefixed environment variables.

use std::time::Duration;

use probe_scheduler::SchedulerConfig;
use radio_link::RadioSettings;
use serde::Deserialize;

/// Runtime settings for the monitor process
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Status server bind address
    pub bind_addr: String,
    /// Number of samples retained in the ring
    pub ring_capacity: usize,
    /// Sample age beyond which the link is reported stale
    pub stale_after_secs: u64,
    /// Interval between transceiver probes
    pub poll_tick_ms: u64,
    /// Deadline for one active command round
    pub command_deadline_secs: u64,
    /// Deadline for one passive listen round
    pub listen_deadline_secs: u64,
    /// Fixed delay between rounds
    pub round_delay_ms: u64,
    /// Liveness ping cadence in rounds (0 disables)
    pub ping_every: u64,
    /// Report interval pushed to the node at startup
    pub report_interval_secs: u64,
    /// RF channel shared with the node firmware
    pub radio_channel: u8,
}

impl Settings {
    /// Load settings from defaults, file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("ring_capacity", 5_i64)?
            .set_default("stale_after_secs", 120_i64)?
            .set_default("poll_tick_ms", 50_i64)?
            .set_default("command_deadline_secs", 5_i64)?
            .set_default("listen_deadline_secs", 60_i64)?
            .set_default("round_delay_ms", 500_i64)?
            .set_default("ping_every", 10_i64)?
            .set_default("report_interval_secs", 60_i64)?
            .set_default("radio_channel", 0x76_i64)?
            .add_source(config::File::with_name("monitor").required(false))
            .add_source(config::Environment::with_prefix("MONITOR").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Staleness threshold for the status endpoints
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Poll tick for the exchange channel
    pub fn poll_tick(&self) -> Duration {
        Duration::from_millis(self.poll_tick_ms)
    }

    /// Round timings for the scheduler
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            command_deadline: Duration::from_secs(self.command_deadline_secs),
            listen_deadline: Duration::from_secs(self.listen_deadline_secs),
            round_delay: Duration::from_millis(self.round_delay_ms),
            ping_every: self.ping_every,
            report_interval: Duration::from_secs(self.report_interval_secs),
        }
    }

    /// Radio bring-up parameters with the configured channel
    pub fn radio_settings(&self) -> RadioSettings {
        RadioSettings {
            channel: self.radio_channel,
            ..RadioSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_timings() {
        let settings = Settings::load().unwrap();
        assert_eq!(settings.ring_capacity, 5);
        assert_eq!(settings.poll_tick(), Duration::from_millis(50));

        let scheduler = settings.scheduler_config();
        assert_eq!(scheduler.command_deadline, Duration::from_secs(5));
        assert_eq!(scheduler.listen_deadline, Duration::from_secs(60));
        assert_eq!(scheduler.round_delay, Duration::from_millis(500));

        assert_eq!(settings.radio_settings().channel, 0x76);
    }
}
