//! Live ticket notifications.
//!
//! A `Broadcaster` keeps one bounded channel per subscriber and pushes every
//! cache mutation into all of them without blocking. A `Subscription` hands
//! out its initial snapshot first, then live notifications for its station,
//! until cancelled or dropped.
//!
//! # Example
//!
//! ```ignore
//! let (handle, token) = cancellation();
//! let sub = cache.subscribe(SubscriptionFilter::station("grill"));
//!
//! // On the streaming thread
//! sub.forward(&token, |event| stream.send(event.to_json()?))?;
//!
//! // When the client goes away
//! handle.cancel();
//! ```

mod manager;
mod stream;
mod types;

pub use manager::{Broadcaster, DEFAULT_SUBSCRIBER_BUFFER};
pub use stream::{cancellation, CancelHandle, CancelToken, Subscription};
pub use types::{SubscriberId, SubscriptionFilter, TicketEvent, TicketEventKind};
