//! Cross-tab synchronization.
//!
//! Every session listens to the shared storage's change events. Events
//! written by the session itself are ignored (it already updated its own
//! state); an event from another tab touching a watched key moves the
//! listener from [`SyncState::Idle`] to [`SyncState::Notified`] until the
//! session has reloaded and calls [`CrossTabSync::settle`].
//!
//! Delivery is best-effort. If the channel overflows, the missed events are
//! collapsed into a single notification that marks everything as changed.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::storage::{StorageEvent, TabId};

/// Listener state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No pending refresh.
    #[default]
    Idle,
    /// Another tab changed a watched key; a reload is due.
    Notified,
}

/// Which watched entries another tab changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Notification {
    /// The active cart entry changed.
    pub cart: bool,
    /// The logged-in identity changed.
    pub identity: bool,
}

impl Notification {
    const EVERYTHING: Self = Self {
        cart: true,
        identity: true,
    };

    fn merge(&mut self, other: Self) {
        self.cart |= other.cart;
        self.identity |= other.identity;
    }

    const fn is_empty(self) -> bool {
        !self.cart && !self.identity
    }
}

/// Keys a session cares about.
#[derive(Debug, Clone, Copy)]
pub struct Watch<'a> {
    pub cart_key: &'a str,
    pub identity_key: &'a str,
}

impl Watch<'_> {
    fn classify(&self, event: &StorageEvent) -> Notification {
        Notification {
            cart: event.key == self.cart_key,
            identity: event.key == self.identity_key,
        }
    }
}

/// Receives storage events on behalf of one session.
pub struct CrossTabSync {
    tab: TabId,
    events: broadcast::Receiver<StorageEvent>,
    state: SyncState,
}

impl CrossTabSync {
    /// Listen to `events` for the session identified by `tab`.
    #[must_use]
    pub const fn new(tab: TabId, events: broadcast::Receiver<StorageEvent>) -> Self {
        Self {
            tab,
            events,
            state: SyncState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Drain every event already delivered without waiting.
    ///
    /// Returns the combined notification if any relevant event arrived.
    pub fn poll(&mut self, watch: Watch<'_>) -> Option<Notification> {
        let mut pending = Notification::default();
        loop {
            match self.events.try_recv() {
                Ok(event) => pending.merge(self.relevant(&event, watch)),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Storage events dropped; forcing reload");
                    pending.merge(Notification::EVERYTHING);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        self.finish(pending)
    }

    /// Wait for the next relevant event, then drain anything else queued.
    ///
    /// Returns `None` once the storage has been dropped.
    pub async fn wait(&mut self, watch: Watch<'_>) -> Option<Notification> {
        loop {
            let first = match self.events.recv().await {
                Ok(event) => self.relevant(&event, watch),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Storage events dropped; forcing reload");
                    Notification::EVERYTHING
                }
                Err(RecvError::Closed) => return None,
            };
            if first.is_empty() {
                continue;
            }
            let mut pending = first;
            if let Some(rest) = self.poll(watch) {
                pending.merge(rest);
            }
            return self.finish(pending);
        }
    }

    /// Return to [`SyncState::Idle`] after the session has reloaded.
    pub fn settle(&mut self) {
        self.state = SyncState::Idle;
    }

    fn relevant(&self, event: &StorageEvent, watch: Watch<'_>) -> Notification {
        if event.origin == self.tab {
            return Notification::default();
        }
        watch.classify(event)
    }

    fn finish(&mut self, pending: Notification) -> Option<Notification> {
        if pending.is_empty() {
            return None;
        }
        self.state = SyncState::Notified;
        Some(pending)
    }
}
