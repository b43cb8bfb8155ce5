//! Transceiver Capability
//!
//! The physical radio is an external collaborator (an SPI/GPIO driver on the
//! host). The link layer consumes it through this trait; every operation is
//! a non-blocking probe against device registers.

use serde::{Deserialize, Serialize};

use crate::message::MESSAGE_WIRE_SIZE;

/// Half-duplex packet radio capability
///
/// One physical device, exactly one owner at a time. Implementations are not
/// expected to tolerate concurrent calls; the exchange layer serializes all
/// access to a single in-flight round.
pub trait Transceiver {
    /// Apply channel/power/rate settings to the device
    fn configure(&mut self, settings: &RadioSettings);

    /// Target outgoing frames at the given pipe address
    fn open_writing_pipe(&mut self, addr: u64);

    /// Accept incoming frames from the given pipe address on a slot
    fn open_reading_pipe(&mut self, slot: u8, addr: u64);

    /// Enter receive mode
    fn start_listening(&mut self);

    /// Leave receive mode; idempotent if already stopped
    fn stop_listening(&mut self);

    /// Attempt to transmit one frame; `true` once the peer accepted it
    fn transmit(&mut self, payload: &[u8]) -> bool;

    /// Probe whether a received frame is waiting to be read
    fn data_available(&mut self) -> bool;

    /// Read up to `max_len` bytes of the waiting frame
    fn receive(&mut self, max_len: usize) -> Vec<u8>;
}

/// Transmit power level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerLevel {
    Min,
    Low,
    High,
    Max,
}

/// Air data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataRate {
    /// 250 kbps
    Kbps250,
    /// 1 Mbps
    Mbps1,
    /// 2 Mbps
    Mbps2,
}

/// Hardware CRC length appended to each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrcLength {
    Disabled,
    Bits8,
    Bits16,
}

/// Radio bring-up parameters shared with the sensor node firmware
///
/// Both peers must agree on channel, rate and CRC length or frames are
/// silently lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioSettings {
    /// RF channel number
    pub channel: u8,
    /// Transmit power level
    pub power: PowerLevel,
    /// Air data rate
    pub rate: DataRate,
    /// Fixed payload length in bytes
    pub payload_len: u8,
    /// Hardware acknowledgment of transmitted frames
    pub auto_ack: bool,
    /// Auto-retransmit delay setting (device units of 250 us)
    pub retry_delay: u8,
    /// Auto-retransmit attempt count
    pub retry_count: u8,
    /// Hardware CRC length
    pub crc: CrcLength,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            channel: 0x76,
            power: PowerLevel::Max,
            rate: DataRate::Mbps1,
            payload_len: MESSAGE_WIRE_SIZE as u8,
            auto_ack: true,
            retry_delay: 2,
            retry_count: 15,
            crc: CrcLength::Bits8,
        }
    }
}
