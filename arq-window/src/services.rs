//! The boundary between the protocol core and the world around it.
//!
//! Sender and receiver handlers never touch a channel, an application, or a
//! clock directly.  They are handed a `&mut impl Services` and call into it;
//! the discrete-event [`crate::simulator`] is one implementation and
//! [`Recorder`] (a plain log of calls) is another.

use std::fmt;

use crate::packet::{Packet, PAYLOAD_LEN};

/// The two protocol entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// The sending side.
    A,
    /// The receiving side.
    B,
}

impl EntityId {
    /// The entity on the other end of the channel.
    pub fn peer(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Calls the protocol core makes outward.
pub trait Services {
    /// Hand a finished packet from `from` to the channel.
    fn send_packet(&mut self, from: EntityId, packet: Packet);

    /// Deliver an in-order payload to the application above `at`.
    fn deliver(&mut self, at: EntityId, payload: [u8; PAYLOAD_LEN]);

    /// Arm `entity`'s timer to expire `duration` time units from now.
    fn start_timer(&mut self, entity: EntityId, duration: f64);

    /// Disarm `entity`'s timer.
    fn stop_timer(&mut self, entity: EntityId);
}

/// One call recorded by [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send(EntityId, Packet),
    Deliver(EntityId, [u8; PAYLOAD_LEN]),
    StartTimer(EntityId, f64),
    StopTimer(EntityId),
}

/// A [`Services`] implementation that only records what it was asked to do.
///
/// Useful for stepping the state machines by hand.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Packets sent so far, in order.
    pub fn sent(&self) -> Vec<Packet> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Send(_, p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Payloads delivered so far, in order.
    pub fn delivered(&self) -> Vec<[u8; PAYLOAD_LEN]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Deliver(_, p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Services for Recorder {
    fn send_packet(&mut self, from: EntityId, packet: Packet) {
        self.calls.push(Call::Send(from, packet));
    }

    fn deliver(&mut self, at: EntityId, payload: [u8; PAYLOAD_LEN]) {
        self.calls.push(Call::Deliver(at, payload));
    }

    fn start_timer(&mut self, entity: EntityId, duration: f64) {
        self.calls.push(Call::StartTimer(entity, duration));
    }

    fn stop_timer(&mut self, entity: EntityId) {
        self.calls.push(Call::StopTimer(entity));
    }
}
