//! Subscriber-side stream and cancellation.

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::manager::Registry;
use super::types::{SubscriberId, SubscriptionFilter, TicketEvent};

/// Create a linked cancel handle and token.
///
/// Cancelling or dropping the handle wakes every receive loop waiting on a
/// clone of the token.
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = bounded(0);
    (CancelHandle { _sender: sender }, CancelToken { receiver })
}

/// Owner side of a cancellation pair.
pub struct CancelHandle {
    _sender: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(self) {}
}

/// Observer side of a cancellation pair.
#[derive(Clone)]
pub struct CancelToken {
    receiver: Receiver<()>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// A live subscription.
///
/// Yields the initial snapshot first, then every live notification that
/// passes the filter. Dropping it removes the subscriber from the
/// broadcaster and closes its channel, whatever path got us there.
pub struct Subscription {
    id: SubscriberId,
    filter: SubscriptionFilter,
    snapshot: VecDeque<TicketEvent>,
    receiver: Receiver<TicketEvent>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        filter: SubscriptionFilter,
        snapshot: VecDeque<TicketEvent>,
        receiver: Receiver<TicketEvent>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            id,
            filter,
            snapshot,
            receiver,
            registry,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    /// Snapshot notifications not yet handed out.
    pub fn pending_snapshot(&self) -> usize {
        self.snapshot.len()
    }

    /// Block until the next matching notification.
    ///
    /// Returns `None` once `cancel` fires or the broadcaster disconnects us.
    pub fn recv(&mut self, cancel: &CancelToken) -> Option<TicketEvent> {
        if cancel.is_cancelled() {
            return None;
        }
        if let Some(event) = self.snapshot.pop_front() {
            return Some(event);
        }

        loop {
            select! {
                recv(self.receiver) -> msg => match msg {
                    Ok(event) if self.filter.matches(&event) => return Some(event),
                    Ok(_) => continue,
                    Err(_) => return None,
                },
                recv(cancel.receiver) -> _ => return None,
            }
        }
    }

    /// Like `recv`, but gives up after `timeout`.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<TicketEvent> {
        if let Some(event) = self.snapshot.pop_front() {
            return Some(event);
        }

        let deadline = Instant::now() + timeout;
        loop {
            match self.receiver.recv_deadline(deadline) {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    /// Next matching notification, if one is already waiting.
    pub fn try_recv(&mut self) -> Option<TicketEvent> {
        if let Some(event) = self.snapshot.pop_front() {
            return Some(event);
        }

        while let Ok(event) = self.receiver.try_recv() {
            if self.filter.matches(&event) {
                return Some(event);
            }
        }
        None
    }

    /// Push notifications into `sink` until cancelled, disconnected, or the
    /// sink fails. Consumes the subscription so it is deregistered on return.
    ///
    /// Returns how many notifications were forwarded.
    pub fn forward<F, E>(mut self, cancel: &CancelToken, mut sink: F) -> Result<usize, E>
    where
        F: FnMut(TicketEvent) -> Result<(), E>,
    {
        let mut forwarded = 0;
        while let Some(event) = self.recv(cancel) {
            sink(event)?;
            forwarded += 1;
        }
        Ok(forwarded)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
