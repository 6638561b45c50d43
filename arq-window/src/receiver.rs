//! Receiver sequencer (entity B).
//!
//! [`Receiver`] implements the receive side of the sliding window:
//!
//! - Only the packet carrying `expected_seqnum` is delivered.
//! - Any other intact packet, including a copy of one already delivered, is
//!   **not buffered**; it is answered with a duplicate ACK for the last packet
//!   delivered in order.
//! - Corrupted packets are dropped without an ACK.
//!
//! Each payload reaches the application exactly once, in sequence order.

use crate::counters::ReceiverStats;
use crate::packet::Packet;
use crate::sender::SEQ_SPACE;
use crate::services::{EntityId, Services};

/// What the receiver did with an incoming packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    /// Payload delivered; the packet's sequence number was acknowledged.
    Delivered(i32),
    /// Out of order or already delivered; `acked` was re-acknowledged.
    Duplicate { acked: i32 },
    /// Checksum mismatch; dropped silently.
    Corrupted,
}

/// Receive-side state for entity B.
#[derive(Debug, Default)]
pub struct Receiver {
    expected_seqnum: i32,
    /// Sequence number for the next outgoing ACK; alternates 0/1.
    ack_seqnum: i32,
    stats: ReceiverStats,
}

impl Receiver {
    /// A receiver expecting sequence number 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected_seqnum(&self) -> i32 {
        self.expected_seqnum
    }

    /// The sequence number a duplicate ACK names: the last one delivered.
    pub fn last_delivered(&self) -> i32 {
        (self.expected_seqnum - 1 + SEQ_SPACE) % SEQ_SPACE
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Process a packet arriving from the sender.
    pub fn on_packet(&mut self, packet: &Packet, services: &mut impl Services) -> RecvOutcome {
        if packet.is_corrupted() {
            log::debug!("[B] ← corrupted packet dropped");
            return RecvOutcome::Corrupted;
        }

        if packet.seqnum == self.expected_seqnum {
            log::debug!("[B] ← DATA seq={} delivered", packet.seqnum);
            services.deliver(EntityId::B, packet.payload);
            self.stats.packets_delivered += 1;

            let acked = self.expected_seqnum;
            self.send_ack(acked, services);
            self.expected_seqnum = (self.expected_seqnum + 1) % SEQ_SPACE;
            RecvOutcome::Delivered(acked)
        } else {
            let acked = self.last_delivered();
            log::debug!(
                "[B] ← DATA seq={} out of order (expecting {}), re-ACK {}",
                packet.seqnum,
                self.expected_seqnum,
                acked
            );
            self.stats.duplicates += 1;
            self.send_ack(acked, services);
            RecvOutcome::Duplicate { acked }
        }
    }

    fn send_ack(&mut self, acknum: i32, services: &mut impl Services) {
        let ack = Packet::ack(self.ack_seqnum, acknum);
        self.ack_seqnum = (self.ack_seqnum + 1) % 2;
        services.send_packet(EntityId::B, ack);
    }
}
