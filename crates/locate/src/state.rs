//! The user's current location as observable state.

use crate::chain::{Located, LocationChain, LocationRequest};
use crate::error::{LocateError, Result};
use crate::generation::{Generation, Ticket};
use std::sync::Arc;
use tokio::sync::watch;

/// Where location lookup stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocationStatus {
    /// Nothing requested yet
    #[default]
    Unknown,
    /// A lookup is running
    Locating,
    /// Last lookup succeeded
    Located(Located),
    /// Last lookup failed; "no location" is a normal state
    Unavailable {
        /// Error message
        message: String,
        /// What the user can do about it
        suggestion: Option<&'static str>,
    },
}

impl LocationStatus {
    /// The located value, if any.
    pub fn located(&self) -> Option<&Located> {
        match self {
            LocationStatus::Located(located) => Some(located),
            _ => None,
        }
    }
}

/// Latest location, shared by everything that ranks by distance.
///
/// Only the most recent request may write; a slow lookup that finishes after a
/// newer one started is discarded.
#[derive(Debug, Clone)]
pub struct LocationState {
    generation: Generation,
    tx: Arc<watch::Sender<LocationStatus>>,
}

impl Default for LocationState {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationState {
    /// Empty state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LocationStatus::Unknown);
        Self {
            generation: Generation::new(),
            tx: Arc::new(tx),
        }
    }

    /// Snapshot of the current status.
    pub fn current(&self) -> LocationStatus {
        self.tx.borrow().clone()
    }

    /// Receive every status change.
    pub fn subscribe(&self) -> watch::Receiver<LocationStatus> {
        self.tx.subscribe()
    }

    /// Start a new request and mark the state as locating.
    pub fn begin(&self) -> Ticket {
        self.start().0
    }

    /// Issue a ticket and publish `Locating`, returning what it replaced.
    fn start(&self) -> (Ticket, LocationStatus) {
        let ticket = self.generation.next();
        let previous = match self.tx.send_replace(LocationStatus::Locating) {
            LocationStatus::Locating => LocationStatus::Unknown,
            previous => previous,
        };
        (ticket, previous)
    }

    /// Record an outcome if `ticket` is still current. Returns whether it was applied.
    pub fn apply(&self, ticket: Ticket, outcome: &Result<Located>) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::debug!(ticket = ticket.value(), "Dropping stale location result");
            return false;
        }
        let status = match outcome {
            Ok(located) => LocationStatus::Located(located.clone()),
            Err(LocateError::Cancelled) => return false,
            Err(err) => LocationStatus::Unavailable {
                message: err.to_string(),
                suggestion: err.suggestion(),
            },
        };
        self.tx.send_replace(status);
        true
    }

    /// Run `chain` and publish its outcome. The returned handle cancels on drop.
    ///
    /// A lookup that is cancelled or dropped before it settles puts back the
    /// status it replaced, so the state never stays `Locating`.
    pub fn refresh(&self, chain: &LocationChain) -> LocationRequest {
        let (ticket, previous) = self.start();
        let mut pending = Pending {
            state: self.clone(),
            ticket,
            previous,
            settled: false,
        };
        let chain = chain.clone();
        LocationRequest::new(tokio::spawn(async move {
            let outcome = chain.locate().await;
            pending.settled = pending.state.apply(pending.ticket, &outcome);
            outcome
        }))
    }
}

/// Restores the prior status if a refresh ends without publishing.
struct Pending {
    state: LocationState,
    ticket: Ticket,
    previous: LocationStatus,
    settled: bool,
}

impl Drop for Pending {
    fn drop(&mut self) {
        if self.settled || !self.state.generation.is_current(self.ticket) {
            return;
        }
        self.state.generation.invalidate();
        tracing::debug!(ticket = self.ticket.value(), "Location lookup abandoned, restoring status");
        self.state.tx.send_replace(std::mem::take(&mut self.previous));
    }
}
