//! Exchange Error Types

use thiserror::Error;

use crate::message::MESSAGE_WIRE_SIZE;

/// Failures of a single command/response round
///
/// All variants are recoverable: the caller retries the whole round or gives
/// up. None of them is fatal to the process.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    /// The peer never accepted the frame before the deadline
    #[error("Peer did not accept the frame before the deadline")]
    TransmitTimeout,

    /// No reply arrived before the deadline
    #[error("No reply arrived before the deadline")]
    ReceiveTimeout,

    /// A reply arrived but did not parse; carries the raw bytes
    #[error("Reply frame was {} bytes, expected {MESSAGE_WIRE_SIZE}: {raw:02X?}", .raw.len())]
    Decode { raw: Vec<u8> },

    /// The deadline had already expired when the round started
    #[error("Deadline had already expired when the round started")]
    Cancelled,
}
