//! Event log decoding and application.
//!
//! Events arrive as opaque JSON bytes. A minimal envelope is decoded first
//! to read `event_type`; known types are then decoded into their typed
//! payload and applied to a `TicketIndex`. Unknown types are ignored so old
//! and new producers can share a log.

mod apply;
mod types;

pub use apply::{apply_created, apply_event, apply_status_changed, Applied};
pub use types::{
    EventEnvelope, TicketCreated, TicketStatusChanged, TICKET_CREATED, TICKET_STATUS_CHANGED,
};
