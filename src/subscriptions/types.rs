//! Notification and filter types for live ticket updates.

use crate::error::{CacheError, Result};
use crate::types::{Ticket, TicketId, Timestamp};
use serde::{Deserialize, Serialize};

/// What happened to a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketEventKind {
    Created,
    StatusChanged,
    /// A kind this build does not know about yet.
    #[serde(other)]
    Unknown,
}

/// A change notification delivered to subscribers.
///
/// This is the wire envelope for streaming clients. Fields may be added
/// (with a serde default) but never renamed or removed, so older and newer
/// peers can keep talking to each other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketEvent {
    pub event_type: TicketEventKind,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,

    #[serde(default)]
    pub status_code: String,
    /// Only set on `status_changed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,

    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code_id: Option<String>,

    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub served_at: Option<Timestamp>,
}

impl TicketEvent {
    fn from_ticket(kind: TicketEventKind, ticket: &Ticket, previous_status: Option<String>) -> Self {
        Self {
            event_type: kind,
            occurred_at: Timestamp::now(),
            ticket_id: ticket.id.clone(),
            order_id: ticket.order_id.clone(),
            order_item_id: ticket.order_item_id.clone(),
            menu_item_id: ticket.menu_item_id.clone(),
            station_code: ticket.station_code.clone(),
            station_name: ticket.station_name.clone(),
            menu_item_name: ticket.menu_item_name.clone(),
            table_number: ticket.table_number.clone(),
            status_code: ticket.status_code.clone(),
            previous_status,
            quantity: ticket.quantity,
            notes: ticket.notes.clone(),
            reason_code_id: ticket.reason_code_id.clone(),
            created_at: ticket.created_at,
            started_at: ticket.started_at,
            ready_at: ticket.ready_at,
            served_at: ticket.served_at,
        }
    }

    /// A `created` notification describing the ticket as it is now.
    pub fn created(ticket: &Ticket) -> Self {
        Self::from_ticket(TicketEventKind::Created, ticket, None)
    }

    /// A `status_changed` notification; `previous_status` is `None` when the
    /// ticket was not cached before.
    pub fn status_changed(ticket: &Ticket, previous_status: Option<String>) -> Self {
        Self::from_ticket(TicketEventKind::StatusChanged, ticket, previous_status)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CacheError::Encode(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// MessagePack with named fields, so unknown keys can be skipped.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Filter criteria for a subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    /// Only this station (None = every station).
    pub station_code: Option<String>,
}

impl SubscriptionFilter {
    /// Everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only tickets at one station.
    pub fn station(code: impl Into<String>) -> Self {
        Self {
            station_code: Some(code.into()),
        }
    }

    pub fn matches(&self, event: &TicketEvent) -> bool {
        self.matches_station(&event.station_code)
    }

    pub fn matches_ticket(&self, ticket: &Ticket) -> bool {
        self.matches_station(&ticket.station_code)
    }

    fn matches_station(&self, station_code: &str) -> bool {
        match &self.station_code {
            Some(wanted) => wanted == station_code,
            None => true,
        }
    }
}

/// Unique identifier for a subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);
