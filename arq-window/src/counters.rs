//! Run statistics.
//!
//! Counters exist for post-run verification only; no protocol decision ever
//! reads them.

use std::fmt;

/// Sender-side statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SenderStats {
    pub packets_sent: u64,   // first transmissions
    pub acks_received: u64,  // uncorrupted ACKs
    pub new_acks: u64,       // ACKs that slid the window
    pub packets_resent: u64, // retransmissions on timeout
    pub window_full: u64,    // submissions rejected by a full window
}

/// Receiver-side statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    pub packets_delivered: u64, // payloads handed to the application
    pub duplicates: u64,        // intact but out-of-order arrivals
}

/// Channel statistics kept by the simulator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    pub packets_carried: u64,
    pub packets_lost: u64,
    pub packets_corrupted: u64,
}

/// Snapshot of every counter in a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub sender: SenderStats,
    pub receiver: ReceiverStats,
    pub channel: ChannelStats,
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.sender;
        let r = &self.receiver;
        let c = &self.channel;
        writeln!(f, "packets sent (A):          {}", s.packets_sent)?;
        writeln!(f, "packets resent (A):        {}", s.packets_resent)?;
        writeln!(f, "window-full rejections:    {}", s.window_full)?;
        writeln!(f, "ACKs received (A):         {}", s.acks_received)?;
        writeln!(f, "new ACKs (A):              {}", s.new_acks)?;
        writeln!(f, "messages delivered (B):    {}", r.packets_delivered)?;
        writeln!(f, "duplicates received (B):   {}", r.duplicates)?;
        writeln!(f, "packets carried:           {}", c.packets_carried)?;
        writeln!(f, "packets lost:              {}", c.packets_lost)?;
        write!(f, "packets corrupted:         {}", c.packets_corrupted)
    }
}
