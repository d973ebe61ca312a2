//! Request generations.
//!
//! Every new request takes a [`Ticket`]; a result is applied only while its
//! ticket is still the latest one issued. Late answers to superseded requests
//! are dropped instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Proof of which request a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw generation number.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Shared, monotonically increasing request counter.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

impl Generation {
    /// Fresh counter; no ticket is current until [`Generation::next`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding every earlier one.
    pub fn next(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` is the latest issued.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.0
    }

    /// Supersede every outstanding ticket without issuing a usable one.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let generation = Generation::new();
        let first = generation.next();
        assert!(generation.is_current(first));

        let second = generation.next();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn test_invalidate() {
        let generation = Generation::new();
        let ticket = generation.next();
        generation.invalidate();
        assert!(!generation.is_current(ticket));
    }

    #[test]
    fn test_clones_share_counter() {
        let generation = Generation::new();
        let shared = generation.clone();
        let ticket = generation.next();
        assert!(shared.is_current(ticket));
        shared.next();
        assert!(!generation.is_current(ticket));
    }
}
