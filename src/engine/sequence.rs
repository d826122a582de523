//! Run sequencing - "latest request wins" bookkeeping.
//!
//! Rapid successive executions from the same surface can resolve out of
//! order; the transport offers no cancellation. Callers take a ticket before
//! each run and discard any result whose ticket has gone stale by the time it
//! resolves.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues monotonically increasing run tickets.
#[derive(Debug, Default)]
pub struct RunSequence {
    latest: AtomicU64,
}

/// Ticket identifying one execution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket(u64);

impl RunSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket. Every previously issued ticket becomes stale.
    pub fn begin(&self) -> RunTicket {
        RunTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether the ticket is still the most recently issued one.
    pub fn is_current(&self, ticket: RunTicket) -> bool {
        ticket.0 == self.latest.load(Ordering::SeqCst)
    }
}
