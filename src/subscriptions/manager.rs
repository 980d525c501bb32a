//! Broadcaster fanning ticket notifications out to subscribers.

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use super::stream::Subscription;
use super::types::{SubscriberId, SubscriptionFilter, TicketEvent};

/// Default pending notifications per subscriber.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 100;

/// Shared subscriber table. Subscriptions hold an `Arc` to it so they can
/// deregister themselves when dropped.
pub(crate) struct Registry {
    senders: RwLock<HashMap<SubscriberId, Sender<TicketEvent>>>,
    /// Notifications discarded because a buffer was full.
    dropped: AtomicU64,
}

impl Registry {
    pub(crate) fn deregister(&self, id: SubscriberId) {
        if self.senders.write().remove(&id).is_some() {
            debug!(subscriber = id.0, "subscriber deregistered");
        }
    }
}

/// Multiplexes one stream of ticket notifications to any number of
/// subscribers.
///
/// Sends never block: a subscriber whose buffer is full simply misses that
/// notification. Later notifications are still attempted, so a slow reader
/// falls behind on intermediate states but still sees the latest one.
pub struct Broadcaster {
    registry: Arc<Registry>,
    /// Counter for generating subscriber IDs.
    next_id: AtomicU64,
    /// Channel capacity for new subscribers.
    buffer_size: usize,
}

impl Broadcaster {
    /// Create a broadcaster with the default buffer size.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_SUBSCRIBER_BUFFER)
    }

    /// Create a broadcaster whose subscribers buffer `buffer_size`
    /// notifications. Zero gives rendezvous channels.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                senders: RwLock::new(HashMap::new()),
                dropped: AtomicU64::new(0),
            }),
            next_id: AtomicU64::new(1),
            buffer_size,
        }
    }

    /// Register a subscriber.
    ///
    /// `snapshot` is handed out before anything received on the channel, so
    /// a caller that builds it while holding the cache lock gets a gap-free
    /// view: every mutation after the snapshot lands in the channel.
    pub fn subscribe(&self, filter: SubscriptionFilter, snapshot: Vec<TicketEvent>) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.buffer_size);

        self.registry.senders.write().insert(id, sender);
        debug!(
            subscriber = id.0,
            station = ?filter.station_code,
            snapshot = snapshot.len(),
            "subscriber registered"
        );

        Subscription::new(
            id,
            filter,
            VecDeque::from(snapshot),
            receiver,
            Arc::clone(&self.registry),
        )
    }

    /// Try to deliver `event` to every subscriber without blocking.
    ///
    /// Returns the number of subscribers that accepted it.
    pub fn broadcast(&self, event: TicketEvent) -> usize {
        let senders = self.registry.senders.read();
        let mut delivered = 0;

        for (id, sender) in senders.iter() {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.registry.dropped.fetch_add(1, Ordering::Relaxed);
                    trace!(
                        subscriber = id.0,
                        ticket_id = %event.ticket_id,
                        "subscriber buffer full, notification dropped"
                    );
                }
                // Receiver is mid-teardown; its Drop removes the entry.
                Err(TrySendError::Disconnected(_)) => {}
            }
        }

        delivered
    }

    /// Disconnect every subscriber. Blocked receive loops return `None`.
    pub fn close_all(&self) {
        let mut senders = self.registry.senders.write();
        let closed = senders.len();
        senders.clear();
        debug!(closed, "all subscribers closed");
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.senders.read().len()
    }

    /// Total notifications dropped due to full buffers.
    pub fn dropped_count(&self) -> u64 {
        self.registry.dropped.load(Ordering::Relaxed)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
