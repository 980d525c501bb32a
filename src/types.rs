//! Core types for the ticket cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a ticket.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        TicketId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TicketId({})", self.0)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        TicketId(s.to_string())
    }
}

impl From<String> for TicketId {
    fn from(s: String) -> Self {
        TicketId(s)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or_default();
        Timestamp(micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A kitchen ticket: one unit of work tracked by the cache.
///
/// Only `id` is fixed for the lifetime of a ticket. The station and status
/// codes drive the secondary indexes; everything else is carried through
/// to subscribers untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub order_id: String,
    pub order_item_id: String,
    pub menu_item_id: String,

    /// Preparation station (category index key).
    pub station_code: String,
    /// Current status (status index key).
    pub status_code: String,

    #[serde(default)]
    pub menu_item_name: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub reason_code_id: Option<String>,

    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub ready_at: Option<Timestamp>,
    #[serde(default)]
    pub served_at: Option<Timestamp>,
}

fn default_quantity() -> u32 {
    1
}

impl Ticket {
    /// Create a ticket with the required fields; the rest start empty.
    pub fn new(
        id: impl Into<TicketId>,
        order_id: impl Into<String>,
        station_code: impl Into<String>,
        status_code: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: id.into(),
            order_id: order_id.into(),
            order_item_id: String::new(),
            menu_item_id: String::new(),
            station_code: station_code.into(),
            status_code: status_code.into(),
            menu_item_name: String::new(),
            station_name: String::new(),
            table_number: None,
            quantity: 1,
            notes: String::new(),
            reason_code_id: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            ready_at: None,
            served_at: None,
        }
    }

    pub fn with_status(mut self, status_code: impl Into<String>) -> Self {
        self.status_code = status_code.into();
        self
    }

    pub fn with_station(mut self, station_code: impl Into<String>) -> Self {
        self.station_code = station_code.into();
        self
    }
}

/// Point-in-time statistics about a cache instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub ticket_count: usize,
    pub station_count: usize,
    pub status_count: usize,
    pub subscriber_count: usize,
    /// Notifications discarded because a subscriber's buffer was full.
    pub dropped_notifications: u64,
}
