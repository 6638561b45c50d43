//! Retransmission timer coordination.
//!
//! The sender owns exactly one logical timer.  [`RetransmitTimer`] remembers
//! whether that timer is armed and forwards start/stop requests to the
//! [`Services`] timer only when they are legal, so the underlying service
//! never sees two overlapping starts or a stop for an idle timer.
//!
//! Transition rules:
//!
//! ```text
//!            start (window 0 → 1)
//!   IDLE ─────────────────────────▶ ARMED ──┐ restart (partial ACK,
//!    ▲                                │  ▲   │          timeout handled)
//!    │  stop (window drained)         │  └───┘
//!    └────────────────────────────────┤
//!    ▲                                │
//!    └────────── expired ◀────────────┘
//! ```

use crate::services::{EntityId, Services};

/// Round-trip time used as the fixed retransmission deadline, in simulated
/// time units.
pub const RTT: f64 = 16.0;

/// Armed/idle bookkeeping for one entity's timer.
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    owner: EntityId,
    duration: f64,
    armed: bool,
}

impl RetransmitTimer {
    /// An idle timer for `owner` with the default [`RTT`] deadline.
    pub fn new(owner: EntityId) -> Self {
        Self::with_duration(owner, RTT)
    }

    pub fn with_duration(owner: EntityId, duration: f64) -> Self {
        Self {
            owner,
            duration,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Arm an idle timer.
    pub fn start(&mut self, services: &mut impl Services) {
        if self.armed {
            log::warn!("[{}] timer start requested while already armed", self.owner);
            return;
        }
        services.start_timer(self.owner, self.duration);
        self.armed = true;
    }

    /// Push the deadline out to a full `duration` from now.
    pub fn restart(&mut self, services: &mut impl Services) {
        if self.armed {
            services.stop_timer(self.owner);
            self.armed = false;
        }
        self.start(services);
    }

    /// Disarm an armed timer.
    pub fn stop(&mut self, services: &mut impl Services) {
        if !self.armed {
            log::warn!("[{}] timer stop requested while idle", self.owner);
            return;
        }
        services.stop_timer(self.owner);
        self.armed = false;
    }

    /// Record that the scheduler fired the timer.  It is idle afterwards.
    pub fn expired(&mut self) {
        self.armed = false;
    }
}
