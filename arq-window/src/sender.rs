//! Sender window state machine (entity A).
//!
//! [`Sender`] keeps up to [`WINDOW_SIZE`] unacknowledged packets in a
//! circular buffer and drives a single retransmission timer.
//!
//! # Protocol contract
//!
//! - At most [`WINDOW_SIZE`] packets are outstanding.  A submission against a
//!   full window is rejected with [`SubmitError::WindowFull`]; the message is
//!   not queued.
//! - ACKs are **cumulative**: `acknum = K` acknowledges the outstanding packet
//!   with sequence number `K` and every older one.  An ACK that names no
//!   outstanding packet is a duplicate and changes nothing.
//! - On timeout **all** outstanding packets are resent, oldest first, and the
//!   timer is rearmed.
//!
//! # Buffer layout
//!
//! Buffer indices are positions, not sequence numbers:
//!
//! ```text
//!           first               last
//!             │                   │
//!  ┌────┬────┬▼───┬────┬────┬────┬▼───┐
//!  │    │    │ s4 │ s5 │ s6 │ s0 │ s1 │   count = 5
//!  └────┴────┴────┴────┴────┴────┴────┘
//! ```
//!
//! The packet at `first` is always the oldest outstanding one.  Because
//! [`SEQ_SPACE`] exceeds [`WINDOW_SIZE`], a sequence number maps to at most
//! one live slot.

use thiserror::Error;

use crate::counters::SenderStats;
use crate::packet::{Message, Packet};
use crate::services::{EntityId, Services};
use crate::timer::RetransmitTimer;

/// Maximum number of unacknowledged packets.
pub const WINDOW_SIZE: usize = 6;

/// Sequence numbers live in `[0, SEQ_SPACE)`.
pub const SEQ_SPACE: i32 = 7;

const _: () = assert!(SEQ_SPACE as usize >= WINDOW_SIZE + 1);

/// Why a submission was not sent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("send window is full; offer the message again later")]
    WindowFull,
}

/// What an incoming ACK did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Checksum mismatch; discarded.
    Corrupted,
    /// Names no outstanding packet.
    Duplicate,
    /// Released this many packets from the front of the window.
    Advanced(usize),
}

/// Send-side state for entity A.
#[derive(Debug)]
pub struct Sender {
    buffer: [Packet; WINDOW_SIZE],
    /// Slot of the oldest outstanding packet.
    first: usize,
    /// Slot of the newest outstanding packet.  Starts one slot before 0.
    last: usize,
    count: usize,
    next_seqnum: i32,
    timer: RetransmitTimer,
    stats: SenderStats,
}

impl Default for Sender {
    fn default() -> Self {
        Self::new()
    }
}

impl Sender {
    /// An empty window whose first packet will carry sequence number 0.
    pub fn new() -> Self {
        Self::with_timer(RetransmitTimer::new(EntityId::A))
    }

    pub fn with_timer(timer: RetransmitTimer) -> Self {
        Self {
            buffer: [Packet::default(); WINDOW_SIZE],
            first: 0,
            last: WINDOW_SIZE - 1,
            count: 0,
            next_seqnum: 0,
            timer,
            stats: SenderStats::default(),
        }
    }

    /// Number of packets awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count == WINDOW_SIZE
    }

    /// Sequence number the next accepted message will carry.
    pub fn next_seqnum(&self) -> i32 {
        self.next_seqnum
    }

    /// Buffer slot of the oldest outstanding packet.
    pub fn first_slot(&self) -> usize {
        self.first
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// Outstanding packets, oldest first.
    pub fn outstanding(&self) -> impl Iterator<Item = &Packet> + '_ {
        (0..self.count).map(move |i| &self.buffer[(self.first + i) % WINDOW_SIZE])
    }

    /// Offer one message for transmission.
    ///
    /// On success the packet has been handed to the channel and its sequence
    /// number is returned.
    pub fn submit(
        &mut self,
        message: &Message,
        services: &mut impl Services,
    ) -> Result<i32, SubmitError> {
        if self.is_full() {
            self.stats.window_full += 1;
            log::debug!("[A] window full ({WINDOW_SIZE} outstanding), message dropped");
            return Err(SubmitError::WindowFull);
        }

        let packet = Packet::data(self.next_seqnum, message);
        self.last = (self.last + 1) % WINDOW_SIZE;
        self.buffer[self.last] = packet;
        self.count += 1;

        log::debug!(
            "[A] → DATA seq={} slot={} in_flight={}",
            packet.seqnum,
            self.last,
            self.count
        );
        services.send_packet(EntityId::A, packet);
        self.stats.packets_sent += 1;

        if self.count == 1 {
            self.timer.start(services);
        }

        self.next_seqnum = (self.next_seqnum + 1) % SEQ_SPACE;
        Ok(packet.seqnum)
    }

    /// Process a packet arriving from the receiver.
    pub fn on_ack(&mut self, packet: &Packet, services: &mut impl Services) -> AckOutcome {
        if packet.is_corrupted() {
            log::debug!("[A] ← corrupted ACK discarded");
            return AckOutcome::Corrupted;
        }
        self.stats.acks_received += 1;

        let Some(offset) = self.offset_of(packet.acknum) else {
            log::debug!(
                "[A] ← duplicate ACK {} (window starts at {:?})",
                packet.acknum,
                self.outstanding().next().map(|p| p.seqnum)
            );
            return AckOutcome::Duplicate;
        };

        let acked = offset + 1;
        self.first = (self.first + acked) % WINDOW_SIZE;
        self.count -= acked;
        self.stats.new_acks += 1;
        log::debug!(
            "[A] ← ACK {} released {} packet(s), in_flight={}",
            packet.acknum,
            acked,
            self.count
        );

        if self.count == 0 {
            self.timer.stop(services);
        } else {
            self.timer.restart(services);
        }
        AckOutcome::Advanced(acked)
    }

    /// Handle expiry of the retransmission timer.
    ///
    /// Returns the number of packets resent.
    pub fn on_timeout(&mut self, services: &mut impl Services) -> usize {
        self.timer.expired();
        if self.count == 0 {
            log::warn!("[A] timeout with an empty window ignored");
            return 0;
        }

        log::debug!("[A] timeout, resending {} packet(s)", self.count);
        for i in 0..self.count {
            let packet = self.buffer[(self.first + i) % WINDOW_SIZE];
            log::debug!("[A] ↻ DATA seq={}", packet.seqnum);
            services.send_packet(EntityId::A, packet);
        }
        self.stats.packets_resent += self.count as u64;

        self.timer.start(services);
        self.count
    }

    /// Distance from the oldest outstanding packet to the one carrying
    /// `seqnum`, or `None` if no outstanding packet carries it.
    fn offset_of(&self, seqnum: i32) -> Option<usize> {
        if self.count == 0 || !(0..SEQ_SPACE).contains(&seqnum) {
            return None;
        }
        let base = self.buffer[self.first].seqnum;
        let offset = (seqnum - base).rem_euclid(SEQ_SPACE) as usize;
        if offset >= self.count {
            return None;
        }
        debug_assert_eq!(
            self.buffer[(self.first + offset) % WINDOW_SIZE].seqnum,
            seqnum,
            "sequence number aliases a different slot"
        );
        Some(offset)
    }
}
