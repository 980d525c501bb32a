//! Main TicketCache struct tying all components together.

use crate::bootstrap::{EventSource, TicketRepository};
use crate::events::{apply_event, Applied};
use crate::subscriptions::{Broadcaster, Subscription, SubscriptionFilter, TicketEvent};
use crate::tickets::TicketIndex;
use crate::types::{CacheStats, Ticket, TicketId};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache configuration.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Max events fetched from the event source during warm-up.
    pub replay_batch_size: usize,

    /// Pending notifications buffered per subscriber before drops start.
    pub subscriber_buffer: usize,

    /// Statuses pruned after a replay warm-up.
    pub terminal_statuses: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            replay_batch_size: 10_000,
            subscriber_buffer: crate::subscriptions::DEFAULT_SUBSCRIBER_BUFFER,
            terminal_statuses: vec!["SERVED".to_string(), "CANCELLED".to_string()],
        }
    }
}

/// In-memory projection of active kitchen tickets.
///
/// Provides a unified interface for:
/// - Warming up from an event log or repository (see `warm`)
/// - Pushing freshly persisted changes (`set`, `remove`, `apply_event`)
/// - Indexed reads by station, status and order
/// - Live subscriptions with an initial snapshot
///
/// The ticket index and the subscriber registry have separate locks. The
/// index lock is always released before broadcasting.
pub struct TicketCache {
    pub(crate) config: CacheConfig,

    /// Store plus secondary indexes, under one lock.
    pub(crate) index: RwLock<TicketIndex>,

    pub(crate) broadcaster: Broadcaster,

    pub(crate) event_source: Option<Arc<dyn EventSource>>,

    pub(crate) repository: Option<Arc<dyn TicketRepository>>,
}

impl TicketCache {
    /// Create an empty cache with no collaborators.
    pub fn new(config: CacheConfig) -> Self {
        let broadcaster = Broadcaster::with_buffer_size(config.subscriber_buffer);
        Self {
            config,
            index: RwLock::new(TicketIndex::new()),
            broadcaster,
            event_source: None,
            repository: None,
        }
    }

    /// Attach the event source used by `warm`.
    pub fn with_event_source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.event_source = Some(source);
        self
    }

    /// Attach the repository used as the warm-up fallback.
    pub fn with_repository(mut self, repository: Arc<dyn TicketRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // --- Mutations ---

    /// Cache a freshly persisted ticket and notify subscribers.
    ///
    /// A status-changed notification is sent even if nothing changed.
    /// Tickets without an ID are ignored.
    pub fn set(&self, ticket: Ticket) {
        if ticket.id.is_empty() {
            warn!("ignoring ticket without an id");
            return;
        }

        let notification = {
            let mut index = self.index.write();
            let previous = index.get(&ticket.id).map(|old| old.status_code.clone());
            let notification = TicketEvent::status_changed(&ticket, previous);
            index.put(ticket);
            notification
        };

        self.broadcaster.broadcast(notification);
    }

    /// Evict a ticket. Subscribers are not notified.
    pub fn remove(&self, id: &TicketId) -> Option<Arc<Ticket>> {
        let removed = self.index.write().delete(id);
        if removed.is_some() {
            debug!(ticket_id = %id, "ticket evicted");
        }
        removed
    }

    /// Apply one raw event from the log.
    ///
    /// Malformed and unknown events are logged and dropped.
    pub fn apply_event(&self, raw: &[u8]) {
        let applied = {
            let mut index = self.index.write();
            apply_event(&mut index, raw)
        };

        match applied {
            Ok(Applied::StatusChanged { notification }) => {
                self.broadcaster.broadcast(notification);
            }
            Ok(Applied::Created { ticket_id }) => {
                debug!(%ticket_id, "ticket created from event");
            }
            Ok(Applied::Ignored { event_type }) => {
                debug!(%event_type, "ignoring unknown event");
            }
            Err(e) => {
                warn!(error = %e, "dropping malformed event");
            }
        }
    }

    // --- Queries ---

    /// Get a ticket by ID.
    pub fn get(&self, id: &TicketId) -> Option<Arc<Ticket>> {
        self.index.read().get(id)
    }

    /// All cached tickets, oldest first.
    pub fn all(&self) -> Vec<Arc<Ticket>> {
        self.index.read().all()
    }

    pub fn by_station(&self, station_code: &str) -> Vec<Arc<Ticket>> {
        self.index.read().by_station(station_code)
    }

    pub fn by_status(&self, status_code: &str) -> Vec<Arc<Ticket>> {
        self.index.read().by_status(status_code)
    }

    pub fn by_station_and_status(&self, station_code: &str, status_code: &str) -> Vec<Arc<Ticket>> {
        self.index.read().by_station_and_status(station_code, status_code)
    }

    pub fn by_order(&self, order_id: &str) -> Vec<Arc<Ticket>> {
        self.index.read().by_order(order_id)
    }

    /// Number of cached tickets.
    pub fn count(&self) -> usize {
        self.index.read().len()
    }

    pub fn stats(&self) -> CacheStats {
        let (ticket_count, station_count, status_count) = {
            let index = self.index.read();
            (index.len(), index.station_count(), index.status_count())
        };

        CacheStats {
            ticket_count,
            station_count,
            status_count,
            subscriber_count: self.broadcaster.subscriber_count(),
            dropped_notifications: self.broadcaster.dropped_count(),
        }
    }

    /// Verify the secondary indexes against the ticket map.
    pub fn check_consistency(&self) -> crate::error::Result<()> {
        self.index.read().check_consistency()
    }

    // --- Subscriptions ---

    /// Subscribe to live updates.
    ///
    /// The subscription first yields a `created` notification for every
    /// matching ticket, then live notifications. The snapshot is taken and
    /// the channel registered under the same index read lock, so no
    /// mutation falls between them.
    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        let index = self.index.read();
        let snapshot: Vec<TicketEvent> = index
            .all()
            .iter()
            .filter(|ticket| filter.matches_ticket(ticket))
            .map(|ticket| TicketEvent::created(ticket))
            .collect();

        let subscription = self.broadcaster.subscribe(filter, snapshot);
        drop(index);
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    /// Disconnect all subscribers, e.g. on shutdown.
    pub fn close_subscribers(&self) {
        self.broadcaster.close_all();
    }
}

impl Default for TicketCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::TicketEventKind;
    use std::time::Duration;

    #[test]
    fn test_set_broadcasts_previous_status() {
        let cache = TicketCache::default();
        cache.set(Ticket::new("a", "o1", "grill", "NEW"));

        let mut sub = cache.subscribe(SubscriptionFilter::all());
        assert_eq!(
            sub.recv_timeout(Duration::from_millis(50)).unwrap().event_type,
            TicketEventKind::Created
        );

        cache.set(Ticket::new("a", "o1", "grill", "STARTED"));
        let event = sub.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(event.event_type, TicketEventKind::StatusChanged);
        assert_eq!(event.previous_status.as_deref(), Some("NEW"));
        assert_eq!(event.status_code, "STARTED");
    }

    #[test]
    fn test_set_without_id_is_noop() {
        let cache = TicketCache::default();
        cache.set(Ticket::new("", "o1", "grill", "NEW"));
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_unchanged_set_still_broadcasts() {
        let cache = TicketCache::default();
        cache.set(Ticket::new("a", "o1", "grill", "NEW"));
        let mut sub = cache.subscribe(SubscriptionFilter::all());
        sub.try_recv().unwrap();

        cache.set(Ticket::new("a", "o1", "grill", "NEW"));

        let event = sub.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(event.previous_status.as_deref(), Some("NEW"));
        assert_eq!(event.status_code, "NEW");
    }

    #[test]
    fn test_remove_does_not_broadcast() {
        let cache = TicketCache::default();
        cache.set(Ticket::new("a", "o1", "grill", "NEW"));
        let mut sub = cache.subscribe(SubscriptionFilter::all());
        sub.try_recv().unwrap();

        assert!(cache.remove(&"a".into()).is_some());
        assert!(cache.remove(&"a".into()).is_none());
        assert!(sub.recv_timeout(Duration::from_millis(30)).is_none());
    }

    #[test]
    fn test_apply_event_drops_garbage() {
        let cache = TicketCache::default();
        cache.apply_event(b"\x00\x01garbage");
        cache.apply_event(br#"{"event_type":"kitchen.menu.updated"}"#);
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_stats() {
        let cache = TicketCache::default();
        cache.set(Ticket::new("a", "o1", "grill", "NEW"));
        cache.set(Ticket::new("b", "o1", "bar", "NEW"));
        let _sub = cache.subscribe(SubscriptionFilter::all());

        let stats = cache.stats();
        assert_eq!(stats.ticket_count, 2);
        assert_eq!(stats.station_count, 2);
        assert_eq!(stats.status_count, 1);
        assert_eq!(stats.subscriber_count, 1);
    }
}
