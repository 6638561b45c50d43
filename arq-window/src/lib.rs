//! `arq-window` — sliding-window Automatic Repeat reQuest over a lossy channel.
//!
//! # Architecture
//!
//! ```text
//!  application                                   application
//!      │ submit(message)                              ▲ deliver(payload)
//!  ┌───▼──────┐     DATA (seq 0..SEQ_SPACE)     ┌─────┴────┐
//!  │  Sender  │────────────────────────────────▶│ Receiver │
//!  │   (A)    │◀────────────────────────────────│   (B)    │
//!  └───┬──────┘      ACK (cumulative / dup)     └──────────┘
//!      │ start / restart / stop
//!  ┌───▼──────────────┐
//!  │ RetransmitTimer  │
//!  └──────────────────┘
//! ```
//!
//! The state machines never do I/O themselves: every outward effect goes
//! through the [`services::Services`] trait, implemented by the
//! discrete-event [`simulator`] and by [`services::Recorder`] for tests.
//!
//! Each module has a single responsibility:
//! - [`packet`]     — packet/message types, additive checksum, wire format
//! - [`services`]   — entity ids and the outward-call boundary
//! - [`timer`]      — single retransmission timer discipline
//! - [`sender`]     — windowed send-side state machine
//! - [`receiver`]   — in-order receive-side sequencer
//! - [`counters`]   — run statistics
//! - [`simulator`]  — lossy/corrupting channel and event loop

pub mod counters;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod services;
pub mod simulator;
pub mod timer;

pub use packet::{Message, Packet, PAYLOAD_LEN};
pub use receiver::{Receiver, RecvOutcome};
pub use sender::{AckOutcome, Sender, SubmitError, SEQ_SPACE, WINDOW_SIZE};
pub use services::{EntityId, Services};
pub use simulator::{Report, Simulation, SimulatorConfig};
