//! Applying raw event log entries to a ticket index.

use crate::error::Result;
use crate::subscriptions::TicketEvent;
use crate::tickets::TicketIndex;
use crate::types::TicketId;

use super::types::{
    EventEnvelope, TicketCreated, TicketStatusChanged, TICKET_CREATED, TICKET_STATUS_CHANGED,
};

/// What applying one event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A ticket was created, or re-created over an existing entry.
    Created { ticket_id: TicketId },
    /// A ticket changed status; the notification should be broadcast once
    /// the index lock is released.
    StatusChanged { notification: TicketEvent },
    /// The event type is not one the cache tracks.
    Ignored { event_type: String },
}

/// Decode one raw event and apply it to `index`.
///
/// The caller must already hold the write lock guarding `index`. Malformed
/// bytes come back as `Err` and leave the index untouched.
pub fn apply_event(index: &mut TicketIndex, raw: &[u8]) -> Result<Applied> {
    let envelope: EventEnvelope = serde_json::from_slice(raw)?;

    match envelope.event_type.as_str() {
        TICKET_CREATED => {
            let event: TicketCreated = serde_json::from_slice(raw)?;
            Ok(apply_created(index, event))
        }
        TICKET_STATUS_CHANGED => {
            let event: TicketStatusChanged = serde_json::from_slice(raw)?;
            Ok(apply_status_changed(index, event))
        }
        _ => Ok(Applied::Ignored {
            event_type: envelope.event_type.clone(),
        }),
    }
}

/// A created event always replaces whatever is cached under its ID,
/// including a ticket synthesized from an earlier out-of-order status change.
pub fn apply_created(index: &mut TicketIndex, event: TicketCreated) -> Applied {
    let ticket = event.into_ticket();
    let ticket_id = ticket.id.clone();
    index.put(ticket);
    Applied::Created { ticket_id }
}

pub fn apply_status_changed(index: &mut TicketIndex, event: TicketStatusChanged) -> Applied {
    let (ticket, previous_status) = match index.get(&event.ticket_id) {
        Some(existing) => {
            let previous = existing.status_code.clone();
            let mut ticket = (*existing).clone();
            event.apply_to(&mut ticket);
            (ticket, Some(previous))
        }
        None => (event.synthesize_ticket(), event.previous_status.clone()),
    };

    let notification = TicketEvent::status_changed(&ticket, previous_status);
    index.put(ticket);
    Applied::StatusChanged { notification }
}
