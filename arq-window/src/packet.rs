//! Packet and message definitions, checksum, and wire format.
//!
//! Every unit exchanged between the two entities is a [`Packet`].  This
//! module is responsible for:
//! - Defining the header fields and the fixed-length payload.
//! - Computing the additive checksum and detecting corruption.
//! - Serialising a [`Packet`] into the fixed-size byte layout carried by the
//!   simulated channel, and parsing it back.
//!
//! No I/O happens here.
//!
//! # Wire format
//!
//! All integers are **big-endian** two's-complement.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                     Acknowledgment Number                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Checksum                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                     Payload (20 bytes) ...                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total size: [`WIRE_LEN`] = 32 bytes.

use thiserror::Error;

/// Number of payload bytes carried by every packet and message.
pub const PAYLOAD_LEN: usize = 20;

/// Sentinel for header fields a packet does not use (`acknum` on data
/// packets).
pub const NOT_IN_USE: i32 = -1;

/// Byte length of an encoded packet.
pub const WIRE_LEN: usize = 12 + PAYLOAD_LEN;

const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 4;
const OFF_CHECKSUM: usize = 8;
const OFF_PAYLOAD: usize = 12;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One application-level unit: exactly one payload's worth of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub data: [u8; PAYLOAD_LEN],
}

impl Message {
    /// A message made of `PAYLOAD_LEN` copies of `byte`.
    pub fn filled(byte: u8) -> Self {
        Self {
            data: [byte; PAYLOAD_LEN],
        }
    }
}

impl From<[u8; PAYLOAD_LEN]> for Message {
    fn from(data: [u8; PAYLOAD_LEN]) -> Self {
        Self { data }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A single packet: three header fields plus a fixed-length payload.
///
/// Constructors compute `checksum` from the other fields.  Nothing in the
/// crate rewrites it afterwards; a packet whose checksum no longer matches
/// was damaged in transit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Sequence number in `[0, SEQ_SPACE)`.
    pub seqnum: i32,
    /// Acknowledged sequence number, or [`NOT_IN_USE`] on data packets.
    pub acknum: i32,
    /// Additive checksum over `seqnum`, `acknum`, and `payload`.
    pub checksum: i32,
    pub payload: [u8; PAYLOAD_LEN],
}

impl Packet {
    /// Build a packet and stamp it with its checksum.
    pub fn new(seqnum: i32, acknum: i32, payload: [u8; PAYLOAD_LEN]) -> Self {
        Self {
            seqnum,
            acknum,
            checksum: compute_checksum(seqnum, acknum, &payload),
            payload,
        }
    }

    /// A data packet carrying `message` under sequence number `seqnum`.
    pub fn data(seqnum: i32, message: &Message) -> Self {
        Self::new(seqnum, NOT_IN_USE, message.data)
    }

    /// An acknowledgement for `acknum`.  The payload is filled with ASCII `'0'`.
    pub fn ack(seqnum: i32, acknum: i32) -> Self {
        Self::new(seqnum, acknum, [b'0'; PAYLOAD_LEN])
    }

    /// Recompute the checksum from the current header fields and payload.
    pub fn compute_checksum(&self) -> i32 {
        compute_checksum(self.seqnum, self.acknum, &self.payload)
    }

    /// `true` when the stored checksum disagrees with the recomputed one.
    ///
    /// A collision (damage that leaves the sum unchanged) is indistinguishable
    /// from an intact packet.
    pub fn is_corrupted(&self) -> bool {
        self.checksum != self.compute_checksum()
    }

    /// Serialise into the fixed [`WIRE_LEN`]-byte layout.
    ///
    /// The stored checksum is written as-is, so a corrupted packet stays
    /// corrupted across an encode/decode cycle.
    pub fn encode(&self) -> [u8; WIRE_LEN] {
        let mut buf = [0u8; WIRE_LEN];
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seqnum.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.acknum.to_be_bytes());
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[OFF_PAYLOAD..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Only the length is validated.  The checksum is carried through
    /// untouched; call [`Packet::is_corrupted`] to check it.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < WIRE_LEN {
            return Err(PacketError::BufferTooShort(buf.len()));
        }
        if buf.len() > WIRE_LEN {
            return Err(PacketError::TrailingBytes(buf.len() - WIRE_LEN));
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&buf[OFF_PAYLOAD..]);

        Ok(Packet {
            seqnum: read_i32(buf, OFF_SEQ),
            acknum: read_i32(buf, OFF_ACK),
            checksum: read_i32(buf, OFF_CHECKSUM),
            payload,
        })
    }
}

/// Errors that can arise when parsing an encoded packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("buffer of {0} bytes is too short for a packet")]
    BufferTooShort(usize),
    #[error("{0} unexpected bytes after the payload")]
    TrailingBytes(usize),
}

/// Sum of `seqnum`, `acknum`, and every payload byte (unsigned), with
/// wrapping `i32` arithmetic.
pub fn compute_checksum(seqnum: i32, acknum: i32, payload: &[u8; PAYLOAD_LEN]) -> i32 {
    payload
        .iter()
        .fold(seqnum.wrapping_add(acknum), |sum, &b| {
            sum.wrapping_add(i32::from(b))
        })
}

fn read_i32(buf: &[u8], off: usize) -> i32 {
    i32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}
