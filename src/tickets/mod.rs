//! Ticket store and secondary indexes.
//!
//! Tickets live in a single map keyed by ID. Three bucket indexes (station,
//! status, order) map an attribute value to the IDs currently holding it.
//! Neither structure locks on its own; `TicketCache` owns one `TicketIndex`
//! behind a single `RwLock` so the map and its buckets always move together.

mod bucket;
mod index;

pub use bucket::BucketIndex;
pub use index::TicketIndex;
