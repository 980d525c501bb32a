//! Event log payloads.

use crate::types::{Ticket, TicketId, Timestamp};
use serde::{Deserialize, Serialize};

/// Event type of a newly placed ticket.
pub const TICKET_CREATED: &str = "kitchen.ticket.created";

/// Event type of a ticket status transition.
pub const TICKET_STATUS_CHANGED: &str = "kitchen.ticket.status_changed";

/// Minimal envelope: only the discriminant, everything else ignored.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
}

/// Payload of `kitchen.ticket.created`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketCreated {
    pub event_type: String,
    pub occurred_at: Timestamp,
    pub ticket_id: TicketId,
    pub order_id: String,
    #[serde(default)]
    pub order_item_id: String,
    #[serde(default)]
    pub menu_item_id: String,
    pub station_code: String,
    pub status_code: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub menu_item_name: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub notes: String,
}

impl TicketCreated {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            event_type: TICKET_CREATED.to_string(),
            occurred_at: ticket.created_at,
            ticket_id: ticket.id.clone(),
            order_id: ticket.order_id.clone(),
            order_item_id: ticket.order_item_id.clone(),
            menu_item_id: ticket.menu_item_id.clone(),
            station_code: ticket.station_code.clone(),
            status_code: ticket.status_code.clone(),
            station_name: ticket.station_name.clone(),
            menu_item_name: ticket.menu_item_name.clone(),
            table_number: ticket.table_number.clone(),
            quantity: ticket.quantity,
            notes: ticket.notes.clone(),
        }
    }

    pub fn into_ticket(self) -> Ticket {
        Ticket {
            id: self.ticket_id,
            order_id: self.order_id,
            order_item_id: self.order_item_id,
            menu_item_id: self.menu_item_id,
            station_code: self.station_code,
            status_code: self.status_code,
            menu_item_name: self.menu_item_name,
            station_name: self.station_name,
            table_number: self.table_number,
            quantity: self.quantity,
            notes: self.notes,
            reason_code_id: None,
            created_at: self.occurred_at,
            updated_at: self.occurred_at,
            started_at: None,
            ready_at: None,
            served_at: None,
        }
    }
}

/// Payload of `kitchen.ticket.status_changed`.
///
/// Carries enough linkage and display data to rebuild a bare ticket when
/// the matching `created` event is missing from the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketStatusChanged {
    pub event_type: String,
    pub occurred_at: Timestamp,
    pub ticket_id: TicketId,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub order_item_id: String,
    #[serde(default)]
    pub menu_item_id: String,
    #[serde(default)]
    pub station_code: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub menu_item_name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub previous_status: Option<String>,
    pub new_status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub reason_code_id: Option<String>,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub ready_at: Option<Timestamp>,
    #[serde(default)]
    pub served_at: Option<Timestamp>,
}

impl TicketStatusChanged {
    pub fn new(ticket_id: impl Into<TicketId>, new_status: impl Into<String>) -> Self {
        Self {
            event_type: TICKET_STATUS_CHANGED.to_string(),
            occurred_at: Timestamp::now(),
            ticket_id: ticket_id.into(),
            order_id: String::new(),
            order_item_id: String::new(),
            menu_item_id: String::new(),
            station_code: String::new(),
            station_name: String::new(),
            menu_item_name: String::new(),
            quantity: 0,
            previous_status: None,
            new_status: new_status.into(),
            notes: String::new(),
            reason_code_id: None,
            started_at: None,
            ready_at: None,
            served_at: None,
        }
    }

    /// Copy the mutable fields of this event onto `ticket`.
    ///
    /// Milestones absent from the event keep their current value, and the
    /// reason is only replaced when the event names one.
    pub fn apply_to(&self, ticket: &mut Ticket) {
        ticket.status_code = self.new_status.clone();
        ticket.notes = self.notes.clone();
        ticket.updated_at = self.occurred_at;
        if self.started_at.is_some() {
            ticket.started_at = self.started_at;
        }
        if self.ready_at.is_some() {
            ticket.ready_at = self.ready_at;
        }
        if self.served_at.is_some() {
            ticket.served_at = self.served_at;
        }
        if self.reason_code_id.is_some() {
            ticket.reason_code_id = self.reason_code_id.clone();
        }
    }

    /// Bare ticket for an ID the cache has never seen created.
    pub fn synthesize_ticket(&self) -> Ticket {
        let mut ticket = Ticket {
            id: self.ticket_id.clone(),
            order_id: self.order_id.clone(),
            order_item_id: self.order_item_id.clone(),
            menu_item_id: self.menu_item_id.clone(),
            station_code: self.station_code.clone(),
            status_code: String::new(),
            menu_item_name: self.menu_item_name.clone(),
            station_name: self.station_name.clone(),
            table_number: None,
            quantity: self.quantity,
            notes: String::new(),
            reason_code_id: None,
            created_at: self.occurred_at,
            updated_at: self.occurred_at,
            started_at: None,
            ready_at: None,
            served_at: None,
        };
        self.apply_to(&mut ticket);
        ticket
    }
}
