//! Discrete-event network simulator for exercising the protocol.
//!
//! The simulator drives a [`Sender`] and a [`Receiver`] through a channel
//! that loses and corrupts packets, and feeds the sender application
//! messages at random intervals.  Every handler runs to completion before
//! the next event is taken off the queue; there is no real time and no
//! threading.
//!
//! | Fault       | Description                                              |
//! |-------------|----------------------------------------------------------|
//! | Loss        | Drop a packet with probability `loss_prob`.              |
//! | Corruption  | Flip one random bit of the encoded packet with           |
//! |             | probability `corrupt_prob`.                              |
//!
//! Packets to one destination are delivered in the order they were sent,
//! each 1 to 10 time units after the previous one.
//!
//! All randomness comes from one seeded [`StdRng`], so a configuration and
//! seed always replay the same run.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::counters::{ChannelStats, Counters};
use crate::packet::{Message, Packet, PAYLOAD_LEN, WIRE_LEN};
use crate::receiver::Receiver;
use crate::sender::{Sender, SubmitError};
use crate::services::{EntityId, Services};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Parameters of one simulated run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Messages the application above A generates.
    pub messages: usize,
    /// Probability that a packet is dropped.
    pub loss_prob: f64,
    /// Probability that a packet which is not dropped gets one bit flipped.
    pub corrupt_prob: f64,
    /// Mean time between application messages.
    pub mean_interarrival: f64,
    /// Seed for every random decision in the run.
    pub seed: u64,
    /// Events scheduled after this time are not processed.
    pub time_limit: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // Lossless, corruption-free channel.
        Self {
            messages: 20,
            loss_prob: 0.0,
            corrupt_prob: 0.0,
            mean_interarrival: 10.0,
            seed: 1234,
            time_limit: 1_000_000.0,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.messages == 0 {
            return Err(ConfigError::NoMessages);
        }
        for (name, value) in [("loss", self.loss_prob), ("corruption", self.corrupt_prob)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if self.mean_interarrival.is_nan() || self.mean_interarrival <= 0.0 {
            return Err(ConfigError::Interarrival(self.mean_interarrival));
        }
        if self.time_limit.is_nan() || self.time_limit <= 0.0 {
            return Err(ConfigError::TimeLimit(self.time_limit));
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("at least one message must be simulated")]
    NoMessages,
    #[error("{name} probability must be within [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("mean inter-arrival time must be positive, got {0}")]
    Interarrival(f64),
    #[error("time limit must be positive, got {0}")]
    TimeLimit(f64),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum EventKind {
    /// The application above A has a new message.
    MessageReady,
    PacketArrival {
        to: EntityId,
        bytes: [u8; WIRE_LEN],
    },
    TimerExpiry {
        entity: EntityId,
        generation: u64,
    },
}

#[derive(Debug, Clone)]
struct Event {
    time: f64,
    /// Insertion order; breaks ties between events at the same time.
    order: u64,
    kind: EventKind,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    // Reversed so that `BinaryHeap` pops the earliest event first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

// ---------------------------------------------------------------------------
// World: the channel, clock, timers, and application above B
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct World {
    now: f64,
    queue: BinaryHeap<Event>,
    next_order: u64,
    rng: StdRng,
    loss_prob: f64,
    corrupt_prob: f64,
    /// Latest scheduled arrival per destination, to keep delivery FIFO.
    last_arrival: [f64; 2],
    /// Generation of each entity's armed timer.
    timers: [Option<u64>; 2],
    next_generation: u64,
    channel: ChannelStats,
    delivered: Vec<[u8; PAYLOAD_LEN]>,
}

impl World {
    fn new(config: &SimulatorConfig) -> Self {
        Self {
            now: 0.0,
            queue: BinaryHeap::new(),
            next_order: 0,
            rng: StdRng::seed_from_u64(config.seed),
            loss_prob: config.loss_prob,
            corrupt_prob: config.corrupt_prob,
            last_arrival: [0.0; 2],
            timers: [None; 2],
            next_generation: 0,
            channel: ChannelStats::default(),
            delivered: Vec::new(),
        }
    }

    fn schedule(&mut self, time: f64, kind: EventKind) {
        let order = self.next_order;
        self.next_order += 1;
        self.queue.push(Event { time, order, kind });
    }

    fn is_stale(&self, event: &Event) -> bool {
        match event.kind {
            EventKind::TimerExpiry { entity, generation } => {
                self.timers[entity.index()] != Some(generation)
            }
            _ => false,
        }
    }
}

impl Services for World {
    fn send_packet(&mut self, from: EntityId, packet: Packet) {
        self.channel.packets_carried += 1;

        if self.rng.random_bool(self.loss_prob) {
            self.channel.packets_lost += 1;
            log::debug!("[sim] packet from {from} lost (seq={}, ack={})", packet.seqnum, packet.acknum);
            return;
        }

        let mut bytes = packet.encode();
        if self.rng.random_bool(self.corrupt_prob) {
            let bit = self.rng.random_range(0..WIRE_LEN * 8);
            bytes[bit / 8] ^= 1 << (bit % 8);
            self.channel.packets_corrupted += 1;
            log::debug!("[sim] packet from {from} corrupted at bit {bit}");
        }

        let to = from.peer();
        let slot = &mut self.last_arrival[to.index()];
        let arrival = slot.max(self.now) + 1.0 + 9.0 * self.rng.random::<f64>();
        *slot = arrival;
        self.schedule(arrival, EventKind::PacketArrival { to, bytes });
    }

    fn deliver(&mut self, at: EntityId, payload: [u8; PAYLOAD_LEN]) {
        log::trace!("[sim] {at} application received {:?}", String::from_utf8_lossy(&payload));
        self.delivered.push(payload);
    }

    fn start_timer(&mut self, entity: EntityId, duration: f64) {
        if self.timers[entity.index()].is_some() {
            log::warn!("[sim] {entity} started a timer that was already running");
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.timers[entity.index()] = Some(generation);
        self.schedule(self.now + duration, EventKind::TimerExpiry { entity, generation });
    }

    fn stop_timer(&mut self, entity: EntityId) {
        if self.timers[entity.index()].take().is_none() {
            log::warn!("[sim] {entity} stopped a timer that was not running");
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A sender, a receiver, and the simulated world between them.
#[derive(Debug)]
pub struct Simulation {
    config: SimulatorConfig,
    sender: Sender,
    receiver: Receiver,
    world: World,
    generated: usize,
    accepted: Vec<Message>,
    timed_out: bool,
}

impl Simulation {
    /// Validate `config` and schedule the first application message.
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut sim = Self {
            world: World::new(&config),
            config,
            sender: Sender::new(),
            receiver: Receiver::new(),
            generated: 0,
            accepted: Vec::new(),
            timed_out: false,
        };
        sim.schedule_message();
        Ok(sim)
    }

    pub fn now(&self) -> f64 {
        self.world.now
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Process the next live event.  Returns `false` once the queue is empty
    /// or the next event lies beyond the time limit.
    pub fn step(&mut self) -> bool {
        while let Some(event) = self.world.queue.pop() {
            if self.world.is_stale(&event) {
                continue;
            }
            if event.time > self.config.time_limit {
                self.timed_out = true;
                self.world.queue.push(event);
                return false;
            }
            self.world.now = event.time;
            self.dispatch(event.kind);
            return true;
        }
        false
    }

    /// Run until nothing is left to do and report the outcome.
    pub fn run(mut self) -> Report {
        while self.step() {}
        let report = self.report();
        log::info!(
            "[sim] finished at t={:.3}: {} generated, {} accepted, {} delivered",
            report.end_time,
            report.generated,
            report.accepted.len(),
            report.delivered.len()
        );
        report
    }

    pub fn counters(&self) -> Counters {
        Counters {
            sender: *self.sender.stats(),
            receiver: *self.receiver.stats(),
            channel: self.world.channel,
        }
    }

    fn report(&self) -> Report {
        Report {
            generated: self.generated,
            accepted: self.accepted.clone(),
            delivered: self.world.delivered.clone(),
            end_time: self.world.now,
            timed_out: self.timed_out,
            in_flight: self.sender.in_flight(),
            counters: self.counters(),
        }
    }

    fn schedule_message(&mut self) {
        let gap = self.config.mean_interarrival * 2.0 * self.world.rng.random::<f64>();
        self.world.schedule(self.world.now + gap, EventKind::MessageReady);
    }

    fn dispatch(&mut self, kind: EventKind) {
        match kind {
            EventKind::MessageReady => {
                let n = self.generated;
                self.generated += 1;
                let message = Message::filled(b'a' + (n % 26) as u8);
                match self.sender.submit(&message, &mut self.world) {
                    Ok(_) => self.accepted.push(message),
                    Err(SubmitError::WindowFull) => {
                        log::debug!("[sim] message {n} refused by a full window");
                    }
                }
                if self.generated < self.config.messages {
                    self.schedule_message();
                }
            }
            EventKind::PacketArrival { to, bytes } => {
                let packet = match Packet::decode(&bytes) {
                    Ok(packet) => packet,
                    Err(e) => {
                        log::warn!("[sim] undecodable packet for {to}: {e}");
                        return;
                    }
                };
                match to {
                    EntityId::A => {
                        self.sender.on_ack(&packet, &mut self.world);
                    }
                    EntityId::B => {
                        self.receiver.on_packet(&packet, &mut self.world);
                    }
                }
            }
            EventKind::TimerExpiry { entity, .. } => {
                self.world.timers[entity.index()] = None;
                match entity {
                    EntityId::A => {
                        self.sender.on_timeout(&mut self.world);
                    }
                    EntityId::B => log::warn!("[sim] B has no timer handler"),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct Report {
    /// Messages offered by the application.
    pub generated: usize,
    /// Messages the sender accepted, in submission order.
    pub accepted: Vec<Message>,
    /// Payloads the receiver delivered, in delivery order.
    pub delivered: Vec<[u8; PAYLOAD_LEN]>,
    pub end_time: f64,
    /// `true` when the time limit cut the run short.
    pub timed_out: bool,
    /// Packets still unacknowledged at the end.
    pub in_flight: usize,
    pub counters: Counters,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("delivered message {index} differs from the accepted one")]
    Mismatch { index: usize },
    #[error("{delivered} message(s) delivered but {accepted} accepted")]
    CountMismatch { accepted: usize, delivered: usize },
    #[error("{sent} sent plus {rejected} rejected does not add up to {generated} generated")]
    Bookkeeping {
        generated: usize,
        sent: u64,
        rejected: u64,
    },
}

impl Report {
    /// Check that the receiver delivered exactly the accepted messages, in
    /// order, and that every generated message was either sent or rejected.
    pub fn verify(&self) -> Result<(), VerifyError> {
        if let Some(index) = self
            .accepted
            .iter()
            .zip(&self.delivered)
            .position(|(a, d)| a.data != *d)
        {
            return Err(VerifyError::Mismatch { index });
        }
        if self.accepted.len() != self.delivered.len() {
            return Err(VerifyError::CountMismatch {
                accepted: self.accepted.len(),
                delivered: self.delivered.len(),
            });
        }

        let sender = &self.counters.sender;
        if sender.packets_sent + sender.window_full != self.generated as u64 {
            return Err(VerifyError::Bookkeeping {
                generated: self.generated,
                sent: sender.packets_sent,
                rejected: sender.window_full,
            });
        }
        Ok(())
    }
}
