//! Telemetry Driver Loop Implementation

use std::sync::Arc;
use std::time::Duration;

use radio_link::{Command, ExchangeChannel, Message, Transceiver};
use sample_ring::{Sample, SampleRing};
use tokio::sync::RwLock;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Configuration for the telemetry rounds
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Deadline for one active command round
    pub command_deadline: Duration,
    /// Deadline for one passive listen round
    pub listen_deadline: Duration,
    /// Fixed delay between rounds; no backoff growth
    pub round_delay: Duration,
    /// Run a Ping liveness check every this many rounds (0 disables)
    pub ping_every: u64,
    /// Unsolicited report interval pushed to the node via the Delay command
    pub report_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            command_deadline: Duration::from_secs(5),
            listen_deadline: Duration::from_secs(60),
            round_delay: Duration::from_millis(500),
            ping_every: 10,
            report_interval: Duration::from_secs(60),
        }
    }
}

/// Sequential round driver over one exclusively-owned radio channel
///
/// Exactly one round is in flight at any instant. The ring is the only piece
/// of state shared with other tasks; status readers take the lock for a
/// whole-sample snapshot and never touch the radio.
pub struct ProbeScheduler<T: Transceiver> {
    channel: ExchangeChannel<T>,
    ring: Arc<RwLock<SampleRing>>,
    config: SchedulerConfig,
    started: Instant,
    rounds: u64,
    running: bool,
}

impl<T: Transceiver> ProbeScheduler<T> {
    /// Create a scheduler over a configured channel and a shared ring
    pub fn new(
        channel: ExchangeChannel<T>,
        ring: Arc<RwLock<SampleRing>>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            channel,
            ring,
            config,
            started: Instant::now(),
            rounds: 0,
            running: false,
        }
    }

    /// Run the active polling loop: moisture rounds with periodic pings
    ///
    /// Every failure is logged and the loop continues after the fixed
    /// inter-round delay; there is no retry cap and no backoff growth.
    pub async fn run_poll(&mut self) {
        info!("Starting active polling loop");
        self.running = true;

        self.send_report_interval().await;

        while self.running {
            if self.config.ping_every != 0 && self.rounds % self.config.ping_every == 0 {
                self.liveness_round().await;
            }
            self.moisture_round().await;
            self.rounds += 1;
            sleep(self.config.round_delay).await;
        }

        info!("Polling loop stopped");
    }

    /// Run the passive listening loop for temperature broadcasts
    pub async fn run_listen(&mut self) {
        info!("Starting passive listening loop");
        self.running = true;

        while self.running {
            self.listen_round().await;
            self.rounds += 1;
            sleep(self.config.round_delay).await;
        }

        info!("Listening loop stopped");
    }

    /// Stop after the current round
    pub fn stop(&mut self) {
        info!("Stopping scheduler");
        self.running = false;
    }

    /// Check if a loop is active
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Best-effort Delay command tuning the node's report rate
    async fn send_report_interval(&mut self) {
        let secs = self.config.report_interval.as_secs() as i32;
        let msg = Message::new(Command::Delay, secs, 0);
        match self.channel.send(&msg, self.command_deadline()).await {
            Ok(_) => info!(secs, "Node report interval set"),
            Err(e) => warn!(error = %e, "Could not set node report interval"),
        }
    }

    /// Ping round: the echoed val1 must match what was sent
    async fn liveness_round(&mut self) {
        let nonce = self.rounds as i32;
        let msg = Message::new(Command::Ping, nonce, 0);
        match self.channel.send(&msg, self.command_deadline()).await {
            Ok(reply) => match reply.tag() {
                Some(Command::Pong) if reply.val1 == nonce => {
                    debug!(nonce, "Node is alive");
                }
                Some(Command::Pong) => {
                    warn!(
                        sent = nonce,
                        echoed = reply.val1,
                        "Pong correlation mismatch, discarding round"
                    );
                }
                _ => {
                    warn!(tag = reply.command, "Unexpected reply to ping, discarding round");
                }
            },
            Err(e) => warn!(error = %e, "Liveness ping failed"),
        }
    }

    /// Moisture round: query, validate the tag, record the reading
    async fn moisture_round(&mut self) {
        let msg = Message::new(Command::ReadMoisture, 0, 0);
        match self.channel.send(&msg, self.command_deadline()).await {
            Ok(reply) => match reply.tag() {
                Some(Command::ReadMoisture) => self.record(reply.val1).await,
                _ => warn!(
                    tag = reply.command,
                    "Unexpected reply to moisture query, discarding round"
                ),
            },
            Err(e) => warn!(error = %e, "Moisture round failed"),
        }
    }

    /// Passive round: wait for one Temp broadcast
    async fn listen_round(&mut self) {
        let deadline = Instant::now() + self.config.listen_deadline;
        match self.channel.listen(deadline).await {
            Ok(msg) => match msg.tag() {
                Some(Command::Temp) => self.record(msg.val1).await,
                _ => warn!(tag = msg.command, "Ignoring unexpected broadcast"),
            },
            Err(e) => warn!(error = %e, "Listen round failed"),
        }
    }

    /// Convert a centi-scaled reading and push it into the ring
    async fn record(&mut self, raw: i32) {
        let sample = Sample::new(self.elapsed_label(), f64::from(raw) / 100.0);
        info!(label = %sample.label, value = sample.value, "Recorded sample");
        self.ring.write().await.push(sample);
    }

    fn command_deadline(&self) -> Instant {
        Instant::now() + self.config.command_deadline
    }

    /// `HH:MM:SS` since the scheduler was created
    fn elapsed_label(&self) -> String {
        let total = self.started.elapsed().as_secs();
        format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    }
}
