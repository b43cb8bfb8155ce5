//! Scriptable Mock Transceiver
//!
//! Simulated radio for tests and hardware-free runs. The peer is emulated
//! either by a responder closure (command/response) or by periodic broadcast
//! injection (passive listen rounds).

use std::collections::VecDeque;

use crate::transceiver::{RadioSettings, Transceiver};

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send + Sync>;
type Broadcaster = Box<dyn FnMut(u64) -> Vec<u8> + Send + Sync>;

struct Broadcast {
    every_polls: usize,
    polls: usize,
    emitted: u64,
    frame: Broadcaster,
}

/// In-memory [`Transceiver`] with a programmable peer
#[derive(Default)]
pub struct MockTransceiver {
    settings: Option<RadioSettings>,
    writing_pipe: Option<u64>,
    reading_pipes: Vec<(u8, u64)>,
    listening: bool,
    reject_transmits: usize,
    reply_delay_polls: usize,
    polls_waited: usize,
    pending: VecDeque<Vec<u8>>,
    transmitted: Vec<Vec<u8>>,
    responder: Option<Responder>,
    broadcast: Option<Broadcast>,
}

impl MockTransceiver {
    /// Create a silent mock: transmits are accepted, nothing ever replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Emulate the peer: the closure sees each transmitted frame and may
    /// queue a reply frame
    pub fn respond_with(mut self, responder: impl FnMut(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Inject an unsolicited frame every `every_polls` availability probes
    /// while listening; the closure receives the emission count
    pub fn broadcast_every(mut self, every_polls: usize, frame: impl FnMut(u64) -> Vec<u8> + Send + Sync + 'static) -> Self {
        self.broadcast = Some(Broadcast {
            every_polls,
            polls: 0,
            emitted: 0,
            frame: Box::new(frame),
        });
        self
    }

    /// Refuse the next `count` transmit attempts
    pub fn reject_transmits(mut self, count: usize) -> Self {
        self.reject_transmits = count;
        self
    }

    /// Hold queued replies back for `polls` availability probes
    pub fn delay_replies(mut self, polls: usize) -> Self {
        self.reply_delay_polls = polls;
        self
    }

    /// Queue a raw frame as if the peer had already sent it
    pub fn queue_frame(&mut self, frame: Vec<u8>) {
        self.pending.push_back(frame);
    }

    /// Frames the mock accepted for transmission, in order
    pub fn transmitted(&self) -> &[Vec<u8>] {
        &self.transmitted
    }

    /// Whether the device is currently in receive mode
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Settings applied via [`Transceiver::configure`], if any
    pub fn settings(&self) -> Option<&RadioSettings> {
        self.settings.as_ref()
    }

    /// Pipes opened via [`Transceiver::open_reading_pipe`]
    pub fn reading_pipes(&self) -> &[(u8, u64)] {
        &self.reading_pipes
    }

    /// Address opened via [`Transceiver::open_writing_pipe`], if any
    pub fn writing_pipe(&self) -> Option<u64> {
        self.writing_pipe
    }
}

impl Transceiver for MockTransceiver {
    fn configure(&mut self, settings: &RadioSettings) {
        self.settings = Some(settings.clone());
    }

    fn open_writing_pipe(&mut self, addr: u64) {
        self.writing_pipe = Some(addr);
    }

    fn open_reading_pipe(&mut self, slot: u8, addr: u64) {
        self.reading_pipes.push((slot, addr));
    }

    fn start_listening(&mut self) {
        self.listening = true;
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }

    fn transmit(&mut self, payload: &[u8]) -> bool {
        if self.reject_transmits > 0 {
            self.reject_transmits -= 1;
            return false;
        }
        self.transmitted.push(payload.to_vec());
        if let Some(responder) = self.responder.as_mut() {
            if let Some(reply) = responder(payload) {
                self.pending.push_back(reply);
            }
        }
        true
    }

    fn data_available(&mut self) -> bool {
        if !self.listening {
            return false;
        }
        if let Some(broadcast) = self.broadcast.as_mut() {
            broadcast.polls += 1;
            if broadcast.polls >= broadcast.every_polls {
                broadcast.polls = 0;
                let frame = (broadcast.frame)(broadcast.emitted);
                broadcast.emitted += 1;
                self.pending.push_back(frame);
            }
        }
        if self.pending.is_empty() {
            return false;
        }
        if self.polls_waited < self.reply_delay_polls {
            self.polls_waited += 1;
            return false;
        }
        true
    }

    fn receive(&mut self, max_len: usize) -> Vec<u8> {
        self.polls_waited = 0;
        match self.pending.pop_front() {
            Some(mut frame) => {
                frame.truncate(max_len);
                frame
            }
            None => Vec::new(),
        }
    }
}
