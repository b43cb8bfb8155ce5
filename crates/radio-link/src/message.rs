//! Wire Message Definitions and Codec
//!
//! Defines the fixed 9-byte command/response record exchanged with the
//! sensor node and its little-endian encoding.

use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;

/// Exact size of a message on the wire, in bytes
pub const MESSAGE_WIRE_SIZE: usize = 9;

/// Command tags recognized by host and sensor node
///
/// The numeric values are a contract between the peers, not negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    /// Liveness probe (0x01)
    Ping = 0x01,
    /// Liveness reply echoing the probe payload (0x02)
    Pong = 0x02,
    /// Request a soil moisture reading (0x03)
    ReadMoisture = 0x03,
    /// Set the node's unsolicited report interval (0x04)
    Delay = 0x04,
    /// Temperature broadcast from the node (0x05)
    Temp = 0x05,
}

impl Command {
    /// Get the wire tag value
    pub fn as_tag(&self) -> u8 {
        *self as u8
    }

    /// Look up a known command by wire tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Command::Ping),
            0x02 => Some(Command::Pong),
            0x03 => Some(Command::ReadMoisture),
            0x04 => Some(Command::Delay),
            0x05 => Some(Command::Temp),
            _ => None,
        }
    }
}

/// One command/response record
///
/// Fixed 9-byte wire layout, little-endian numeric fields:
///
/// ```text
/// offset 0: u8   command
/// offset 1: i32  val1
/// offset 5: i32  val2
/// ```
///
/// The command tag is kept as a raw `u8` so that frames carrying tags this
/// build does not know are preserved at decode time. Rejection of an
/// unexpected tag is a decision for the layer that inspects [`Message::tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Command tag
    pub command: u8,
    /// First payload value; meaning depends on the command
    pub val1: i32,
    /// Second payload value; meaning depends on the command
    pub val2: i32,
}

impl Message {
    /// Create a message with a known command tag
    pub fn new(command: Command, val1: i32, val2: i32) -> Self {
        Self {
            command: command.as_tag(),
            val1,
            val2,
        }
    }

    /// Interpret the command tag, if this build recognizes it
    pub fn tag(&self) -> Option<Command> {
        Command::from_tag(self.command)
    }

    /// Encode to the fixed wire form; never fails for well-typed input
    pub fn encode(&self) -> [u8; MESSAGE_WIRE_SIZE] {
        let mut frame = [0u8; MESSAGE_WIRE_SIZE];
        frame[0] = self.command;
        frame[1..5].copy_from_slice(&self.val1.to_le_bytes());
        frame[5..9].copy_from_slice(&self.val2.to_le_bytes());
        frame
    }

    /// Decode a received frame
    ///
    /// Any input whose length is not exactly [`MESSAGE_WIRE_SIZE`] yields
    /// [`ExchangeError::Decode`] carrying the raw bytes for diagnostics.
    pub fn decode(raw: &[u8]) -> Result<Self, ExchangeError> {
        if raw.len() != MESSAGE_WIRE_SIZE {
            return Err(ExchangeError::Decode { raw: raw.to_vec() });
        }

        let mut val1 = [0u8; 4];
        let mut val2 = [0u8; 4];
        val1.copy_from_slice(&raw[1..5]);
        val2.copy_from_slice(&raw[5..9]);

        Ok(Self {
            command: raw[0],
            val1: i32::from_le_bytes(val1),
            val2: i32::from_le_bytes(val2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_layout() {
        let msg = Message::new(Command::Temp, 420, 0);
        let frame = msg.encode();
        assert_eq!(
            frame,
            [0x05, 0xA4, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_temp_decode() {
        // 0x01A4 = 420 centidegrees = 4.20 after the caller's /100 scaling
        let frame = [0x05, 0xA4, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let msg = Message::decode(&frame).unwrap();
        assert_eq!(msg.tag(), Some(Command::Temp));
        assert_eq!(msg.val1, 420);
        assert_eq!(msg.val2, 0);
    }

    #[test]
    fn test_negative_values_round_trip() {
        let msg = Message::new(Command::Delay, -1, i32::MIN);
        assert_eq!(Message::decode(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn test_unknown_tag_preserved() {
        let mut frame = Message::new(Command::Ping, 7, 0).encode();
        frame[0] = 0x2A;
        let msg = Message::decode(&frame).unwrap();
        assert_eq!(msg.command, 0x2A);
        assert_eq!(msg.tag(), None);
        assert_eq!(msg.val1, 7);
    }

    #[test]
    fn test_wrong_length_is_decode_error() {
        for len in [0, 1, 8, 10, 32] {
            let raw = vec![0u8; len];
            match Message::decode(&raw) {
                Err(ExchangeError::Decode { raw: kept }) => assert_eq!(kept.len(), len),
                other => panic!("expected Decode error for length {len}, got {other:?}"),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip(command: u8, val1: i32, val2: i32) {
            let msg = Message { command, val1, val2 };
            prop_assert_eq!(Message::decode(&msg.encode()).unwrap(), msg);
        }
    }
}
