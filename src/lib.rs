//! # Ticket Rail
//!
//! An in-memory, indexed cache of active kitchen tickets with live fan-out
//! to streaming subscribers.
//!
//! ## Core Concepts
//!
//! - **Tickets**: work items indexed by station, status and order
//! - **Events**: raw log entries replayed to rebuild the cache on start
//! - **Warm-up**: replay, else repository scan, else empty; never fatal
//! - **Subscriptions**: snapshot then live updates, drop-on-full buffers
//!
//! ## Example
//!
//! ```ignore
//! use ticketrail::{CacheConfig, SubscriptionFilter, Ticket, TicketCache};
//!
//! let cache = TicketCache::new(CacheConfig::default())
//!     .with_event_source(event_log)
//!     .with_repository(tickets_repo);
//! cache.warm();
//!
//! // After persisting a change
//! cache.set(Ticket::new("t-1", "order-9", "grill", "STARTED"));
//!
//! // Streaming endpoint
//! let sub = cache.subscribe(SubscriptionFilter::station("grill"));
//! ```

pub mod bootstrap;
pub mod cache;
pub mod error;
pub mod events;
pub mod subscriptions;
pub mod tickets;
pub mod types;

// Re-exports
pub use bootstrap::{EventSource, TicketRepository, WarmOutcome};
pub use cache::{CacheConfig, TicketCache};
pub use error::{CacheError, Result, SourceError};
pub use events::{Applied, TicketCreated, TicketStatusChanged, TICKET_CREATED, TICKET_STATUS_CHANGED};
pub use subscriptions::{
    cancellation, Broadcaster, CancelHandle, CancelToken, SubscriberId, Subscription,
    SubscriptionFilter, TicketEvent, TicketEventKind,
};
pub use tickets::{BucketIndex, TicketIndex};
pub use types::*;
