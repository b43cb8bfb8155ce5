//! Garden Radio Monitor - Main Entry Point
//!
//! Wires the radio channel, the scheduler task and the status server. The
//! physical SPI/GPIO radio driver lives outside this repo; without hardware
//! the process runs against the simulated sensor node.

use std::sync::Arc;

use anyhow::Context;
use api::{init_logging, run_server, AppState, Settings};
use argh::FromArgs;
use probe_scheduler::ProbeScheduler;
use radio_link::{pipe, Command, ExchangeChannel, Message, MockTransceiver, Transceiver};
use sample_ring::{Sample, SampleRing};
use tokio::sync::RwLock;
use tracing::info;

/// Soil moisture and temperature monitor for the garden sensor node.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    mode: Mode,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Mode {
    Poll(PollArgs),
    Listen(ListenArgs),
}

/// Actively poll the node for moisture readings.
#[derive(FromArgs)]
#[argh(subcommand, name = "poll")]
struct PollArgs {}

/// Passively listen for temperature broadcasts.
#[derive(FromArgs)]
#[argh(subcommand, name = "listen")]
struct ListenArgs {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    init_logging();
    info!("=== Garden Radio Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("Loading settings")?;

    let ring = Arc::new(RwLock::new(SampleRing::new(
        settings.ring_capacity,
        Sample::new("00:00:00", 0.0),
    )));

    let polling = matches!(args.mode, Mode::Poll(_));
    let mut transceiver = if polling {
        demo_node()
    } else {
        demo_broadcaster()
    };
    transceiver.configure(&settings.radio_settings());
    transceiver.open_writing_pipe(pipe::HOST_TO_NODE);
    transceiver.open_reading_pipe(pipe::RETURN_SLOT, pipe::NODE_TO_HOST);

    let channel = ExchangeChannel::with_poll_tick(transceiver, settings.poll_tick());
    let mut scheduler = ProbeScheduler::new(channel, ring.clone(), settings.scheduler_config());

    tokio::spawn(async move {
        if polling {
            scheduler.run_poll().await;
        } else {
            scheduler.run_listen().await;
        }
    });

    let state = Arc::new(AppState::new(ring, settings.stale_after()));
    run_server(&settings.bind_addr, state).await?;

    Ok(())
}

/// Simulated sensor node answering commands; stands in for the radio
/// hardware during development
fn demo_node() -> MockTransceiver {
    let mut reading: u64 = 0;
    MockTransceiver::new().respond_with(move |frame| {
        let msg = Message::decode(frame).ok()?;
        let reply = match msg.tag()? {
            Command::Ping => Message::new(Command::Pong, msg.val1, msg.val2),
            Command::ReadMoisture => {
                reading += 1;
                Message::new(Command::ReadMoisture, mock_centi(reading, 2000, 4500), 0)
            }
            Command::Delay => Message::new(Command::Delay, msg.val1, 0),
            _ => return None,
        };
        Some(reply.encode().to_vec())
    })
}

/// Simulated node broadcasting temperature frames for the listen mode
fn demo_broadcaster() -> MockTransceiver {
    MockTransceiver::new().broadcast_every(40, |n| {
        Message::new(Command::Temp, mock_centi(n, 1600, 2800), 0)
            .encode()
            .to_vec()
    })
}

/// Deterministic pseudo-random centi-scaled reading in `[lo, hi)`
fn mock_centi(seed: u64, lo: u64, hi: u64) -> i32 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    (lo + hasher.finish() % (hi - lo)) as i32
}
