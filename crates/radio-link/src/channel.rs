//! Command/Response Exchange Channel
//!
//! Drives exactly one round trip at a time over the shared radio: encode,
//! write-then-listen handshake, poll with deadline, decode.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::ExchangeError;
use crate::message::{Message, MESSAGE_WIRE_SIZE};
use crate::transceiver::Transceiver;

/// Default interval between availability probes
pub const DEFAULT_POLL_TICK: Duration = Duration::from_millis(50);

/// One half of a half-duplex command/response link
///
/// Owns the transceiver for the lifetime of the exchange loop so that only
/// one round is ever in flight. Round state is transient; each call to
/// [`ExchangeChannel::send`] is a complete, independent round.
pub struct ExchangeChannel<T: Transceiver> {
    transceiver: T,
    poll_tick: Duration,
}

impl<T: Transceiver> ExchangeChannel<T> {
    /// Wrap a configured transceiver with the default poll tick
    pub fn new(transceiver: T) -> Self {
        Self::with_poll_tick(transceiver, DEFAULT_POLL_TICK)
    }

    /// Wrap a configured transceiver with an explicit poll tick
    ///
    /// Deadlines are checked once per tick, so the tick also bounds
    /// cancellation granularity. Callers should keep it at or below a tenth
    /// of the round deadline.
    pub fn with_poll_tick(transceiver: T, poll_tick: Duration) -> Self {
        Self {
            transceiver,
            poll_tick,
        }
    }

    /// Perform one command -> reply round trip
    ///
    /// The deadline must be a point strictly after call start and bounds the
    /// whole round; there is no internal retry cap beyond it. On success the
    /// decoded reply is returned; every failure is one of the recoverable
    /// [`ExchangeError`] variants and the caller decides whether to retry
    /// the round.
    pub async fn send(&mut self, msg: &Message, deadline: Instant) -> Result<Message, ExchangeError> {
        if Instant::now() >= deadline {
            return Err(ExchangeError::Cancelled);
        }

        let frame = msg.encode();
        debug!(tag = msg.command, "starting exchange round");

        // A previous round may have left the radio in receive mode; late
        // replies queued there are dropped with it.
        self.transceiver.stop_listening();

        loop {
            if self.transceiver.transmit(&frame) {
                break;
            }
            if !self.tick_before(deadline).await {
                return Err(ExchangeError::TransmitTimeout);
            }
        }

        self.transceiver.start_listening();
        self.await_frame(deadline).await
    }

    /// Wait for one unsolicited frame without sending a command
    ///
    /// Used for the node's periodic broadcasts. Same deadline semantics as
    /// [`ExchangeChannel::send`]; a quiet link yields
    /// [`ExchangeError::ReceiveTimeout`].
    pub async fn listen(&mut self, deadline: Instant) -> Result<Message, ExchangeError> {
        if Instant::now() >= deadline {
            return Err(ExchangeError::Cancelled);
        }

        self.transceiver.start_listening();
        self.await_frame(deadline).await
    }

    /// Poll for an incoming frame until the deadline, then decode it
    async fn await_frame(&mut self, deadline: Instant) -> Result<Message, ExchangeError> {
        loop {
            if self.transceiver.data_available() {
                let raw = self.transceiver.receive(MESSAGE_WIRE_SIZE);
                debug!(len = raw.len(), "frame received");
                return Message::decode(&raw);
            }
            if !self.tick_before(deadline).await {
                return Err(ExchangeError::ReceiveTimeout);
            }
        }
    }

    /// Sleep one poll tick, clamped to the deadline
    ///
    /// Returns `false` once the deadline has been reached.
    async fn tick_before(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        let remaining = deadline - now;
        if remaining <= self.poll_tick {
            sleep(remaining).await;
            return false;
        }
        sleep(self.poll_tick).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Command;
    use crate::mock::MockTransceiver;

    fn pong_peer() -> MockTransceiver {
        MockTransceiver::new().respond_with(|frame| {
            let msg = Message::decode(frame).ok()?;
            match msg.tag()? {
                Command::Ping => Some(Message::new(Command::Pong, msg.val1, msg.val2).encode().to_vec()),
                _ => None,
            }
        })
    }

    #[tokio::test]
    async fn test_ping_pong_round_trip() {
        let mut channel = ExchangeChannel::new(pong_peer());
        let deadline = Instant::now() + Duration::from_secs(5);

        let reply = channel
            .send(&Message::new(Command::Ping, 42, 0), deadline)
            .await
            .unwrap();

        assert_eq!(reply.tag(), Some(Command::Pong));
        // Liveness correlation: the echoed val1 must match what was sent
        assert_eq!(reply.val1, 42);
        assert_eq!(reply.val2, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_is_receive_timeout() {
        let mut channel = ExchangeChannel::new(MockTransceiver::new());
        let deadline = Instant::now() + Duration::from_secs(5);

        let err = channel
            .send(&Message::new(Command::ReadMoisture, 0, 0), deadline)
            .await
            .unwrap_err();

        // The transmit was accepted on the first probe, so this must never
        // surface as a transmit timeout.
        assert!(matches!(err, ExchangeError::ReceiveTimeout));
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_never_accepting_is_transmit_timeout() {
        let mock = MockTransceiver::new().reject_transmits(usize::MAX);
        let mut channel = ExchangeChannel::new(mock);
        let deadline = Instant::now() + Duration::from_secs(5);

        let err = channel
            .send(&Message::new(Command::Ping, 1, 0), deadline)
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::TransmitTimeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_is_cancelled() {
        let mut channel = ExchangeChannel::new(pong_peer());

        let err = channel
            .send(&Message::new(Command::Ping, 1, 0), Instant::now())
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Cancelled));
        // The radio must not have been touched at all
        assert!(channel.transceiver.transmitted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_transmit_retries_within_deadline() {
        let mock = pong_peer().reject_transmits(3);
        let mut channel = ExchangeChannel::new(mock);
        let deadline = Instant::now() + Duration::from_secs(5);

        let reply = channel
            .send(&Message::new(Command::Ping, 7, 0), deadline)
            .await
            .unwrap();

        assert_eq!(reply.val1, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_reply_within_deadline() {
        let mock = pong_peer().delay_replies(8);
        let mut channel = ExchangeChannel::new(mock);
        let deadline = Instant::now() + Duration::from_secs(5);

        let reply = channel
            .send(&Message::new(Command::Ping, 9, 0), deadline)
            .await
            .unwrap();

        assert_eq!(reply.val1, 9);
    }

    #[tokio::test]
    async fn test_runt_reply_is_decode_error_with_raw_bytes() {
        let mock = MockTransceiver::new().respond_with(|_| Some(vec![0x05, 0xA4]));
        let mut channel = ExchangeChannel::new(mock);
        let deadline = Instant::now() + Duration::from_secs(5);

        let err = channel
            .send(&Message::new(Command::ReadMoisture, 0, 0), deadline)
            .await
            .unwrap_err();

        match err {
            ExchangeError::Decode { raw } => assert_eq!(raw, vec![0x05, 0xA4]),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_returns_first_broadcast() {
        let mock = MockTransceiver::new()
            .broadcast_every(5, |n| Message::new(Command::Temp, 2000 + n as i32, 0).encode().to_vec());
        let mut channel = ExchangeChannel::new(mock);
        let deadline = Instant::now() + Duration::from_secs(60);

        let msg = channel.listen(deadline).await.unwrap();

        assert_eq!(msg.tag(), Some(Command::Temp));
        assert_eq!(msg.val1, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_on_quiet_link_times_out() {
        let mut channel = ExchangeChannel::new(MockTransceiver::new());
        let deadline = Instant::now() + Duration::from_secs(60);

        let err = channel.listen(deadline).await.unwrap_err();

        assert!(matches!(err, ExchangeError::ReceiveTimeout));
    }

    #[tokio::test]
    async fn test_round_leaves_radio_listening_for_late_replies() {
        let mut channel = ExchangeChannel::new(pong_peer());
        let deadline = Instant::now() + Duration::from_secs(5);

        channel
            .send(&Message::new(Command::Ping, 3, 0), deadline)
            .await
            .unwrap();

        // Listening stays on so the next round's stop_listening() drains
        // any late frames
        assert!(channel.transceiver.is_listening());
    }
}
