//! The ticket map together with its secondary indexes.

use super::bucket::BucketIndex;
use crate::error::{CacheError, Result};
use crate::types::{Ticket, TicketId};
use std::collections::HashMap;
use std::sync::Arc;

/// Canonical ticket map plus station, status and order indexes.
#[derive(Debug, Default)]
pub struct TicketIndex {
    /// Ticket ID to current snapshot.
    tickets: HashMap<TicketId, Arc<Ticket>>,

    /// Station code to ticket IDs.
    by_station: BucketIndex,

    /// Status code to ticket IDs.
    by_status: BucketIndex,

    /// Order ID to ticket IDs.
    by_order: BucketIndex,
}

impl TicketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a ticket, returning the snapshot it replaced.
    ///
    /// The previous snapshot's index entries are removed before the new
    /// ones are added, so a station or status change never leaves the ID
    /// behind in its old bucket.
    pub fn put(&mut self, ticket: Ticket) -> Option<Arc<Ticket>> {
        let ticket = Arc::new(ticket);
        let previous = self.tickets.insert(ticket.id.clone(), Arc::clone(&ticket));

        if let Some(old) = &previous {
            self.unindex(old);
        }
        self.index(&ticket);

        previous
    }

    /// Remove a ticket and its index entries.
    pub fn delete(&mut self, id: &TicketId) -> Option<Arc<Ticket>> {
        let removed = self.tickets.remove(id)?;
        self.unindex(&removed);
        Some(removed)
    }

    /// Get a ticket by ID.
    pub fn get(&self, id: &TicketId) -> Option<Arc<Ticket>> {
        self.tickets.get(id).cloned()
    }

    pub fn contains(&self, id: &TicketId) -> bool {
        self.tickets.contains_key(id)
    }

    /// All tickets, oldest first.
    pub fn all(&self) -> Vec<Arc<Ticket>> {
        let mut all: Vec<Arc<Ticket>> = self.tickets.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Tickets at a station, in bucket order.
    pub fn by_station(&self, station_code: &str) -> Vec<Arc<Ticket>> {
        self.resolve(self.by_station.get(station_code))
    }

    /// Tickets with a status, in bucket order.
    pub fn by_status(&self, status_code: &str) -> Vec<Arc<Ticket>> {
        self.resolve(self.by_status.get(status_code))
    }

    /// Tickets at a station that currently hold a status.
    ///
    /// Walks the station bucket and checks each ticket's live status instead
    /// of maintaining a joint index.
    pub fn by_station_and_status(&self, station_code: &str, status_code: &str) -> Vec<Arc<Ticket>> {
        self.by_station
            .get(station_code)
            .iter()
            .filter_map(|id| self.tickets.get(id))
            .filter(|ticket| ticket.status_code == status_code)
            .cloned()
            .collect()
    }

    /// Tickets belonging to an order.
    pub fn by_order(&self, order_id: &str) -> Vec<Arc<Ticket>> {
        self.resolve(self.by_order.get(order_id))
    }

    /// Remove every ticket whose status is in `statuses`. Returns the count.
    pub fn prune_statuses(&mut self, statuses: &[String]) -> usize {
        let doomed: Vec<TicketId> = statuses
            .iter()
            .flat_map(|status| self.by_status.get(status).to_vec())
            .collect();

        doomed.iter().filter(|id| self.delete(id).is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn station_count(&self) -> usize {
        self.by_station.key_count()
    }

    pub fn status_count(&self) -> usize {
        self.by_status.key_count()
    }

    pub fn clear(&mut self) {
        self.tickets.clear();
        self.by_station.clear();
        self.by_status.clear();
        self.by_order.clear();
    }

    /// Verify that every stored ticket sits in exactly the buckets matching
    /// its current values, and that no bucket holds anything else.
    pub fn check_consistency(&self) -> Result<()> {
        let indexes = [
            ("station", &self.by_station),
            ("status", &self.by_status),
            ("order", &self.by_order),
        ];

        for ticket in self.tickets.values() {
            let keys = [
                ticket.station_code.as_str(),
                ticket.status_code.as_str(),
                ticket.order_id.as_str(),
            ];
            for ((name, index), key) in indexes.iter().zip(keys) {
                let (count, under_key) = index.membership(key, &ticket.id);
                if count != 1 || !under_key {
                    return Err(CacheError::Inconsistent {
                        id: ticket.id.clone(),
                        detail: format!(
                            "{} index holds it {} time(s), expected once under {:?}",
                            name, count, key
                        ),
                    });
                }
            }
        }

        for (name, index) in indexes {
            if index.entry_count() != self.tickets.len() {
                return Err(CacheError::Inconsistent {
                    id: TicketId::default(),
                    detail: format!(
                        "{} index has {} entries for {} tickets",
                        name,
                        index.entry_count(),
                        self.tickets.len()
                    ),
                });
            }
        }

        Ok(())
    }

    fn index(&mut self, ticket: &Ticket) {
        self.by_station.insert(&ticket.station_code, &ticket.id);
        self.by_status.insert(&ticket.status_code, &ticket.id);
        self.by_order.insert(&ticket.order_id, &ticket.id);
    }

    fn unindex(&mut self, ticket: &Ticket) {
        self.by_station.remove(&ticket.station_code, &ticket.id);
        self.by_status.remove(&ticket.status_code, &ticket.id);
        self.by_order.remove(&ticket.order_id, &ticket.id);
    }

    fn resolve(&self, ids: &[TicketId]) -> Vec<Arc<Ticket>> {
        ids.iter().filter_map(|id| self.tickets.get(id)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ticket(id: &str, station: &str, status: &str) -> Ticket {
        Ticket::new(id, "order-1", station, status)
    }

    fn ids(tickets: &[Arc<Ticket>]) -> Vec<&str> {
        tickets.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_put_and_lookup() {
        let mut index = TicketIndex::new();
        index.put(ticket("a", "grill", "NEW"));
        index.put(ticket("b", "bar", "NEW"));

        assert_eq!(index.len(), 2);
        assert_eq!(ids(&index.by_station("grill")), vec!["a"]);
        assert_eq!(ids(&index.by_status("NEW")), vec!["a", "b"]);
        assert_eq!(index.by_order("order-1").len(), 2);
        assert!(index.get(&TicketId::from("missing")).is_none());
        index.check_consistency().unwrap();
    }

    #[test]
    fn test_station_change_leaves_no_stale_entry() {
        let mut index = TicketIndex::new();
        index.put(ticket("a", "x", "NEW"));
        index.put(ticket("a", "y", "NEW"));

        assert!(index.by_station("x").is_empty());
        assert_eq!(ids(&index.by_station("y")), vec!["a"]);
        assert_eq!(index.len(), 1);
        index.check_consistency().unwrap();
    }

    #[test]
    fn test_station_and_status_filters_live_status() {
        let mut index = TicketIndex::new();
        index.put(ticket("a", "grill", "NEW"));
        index.put(ticket("b", "grill", "STARTED"));
        index.put(ticket("c", "bar", "NEW"));

        assert_eq!(ids(&index.by_station_and_status("grill", "NEW")), vec!["a"]);

        index.put(ticket("a", "grill", "STARTED"));
        assert!(index.by_station_and_status("grill", "NEW").is_empty());
        assert_eq!(
            ids(&index.by_station_and_status("grill", "STARTED")),
            vec!["b", "a"]
        );
    }

    #[test]
    fn test_prune_statuses() {
        let mut index = TicketIndex::new();
        index.put(ticket("a", "grill", "SERVED"));
        index.put(ticket("b", "grill", "CANCELLED"));
        index.put(ticket("c", "grill", "READY"));

        let pruned = index.prune_statuses(&["SERVED".to_string(), "CANCELLED".to_string()]);

        assert_eq!(pruned, 2);
        assert_eq!(ids(&index.all()), vec!["c"]);
        assert!(index.by_status("SERVED").is_empty());
        index.check_consistency().unwrap();
    }

    #[test]
    fn test_delete_unknown_is_none() {
        let mut index = TicketIndex::new();
        assert!(index.delete(&TicketId::from("ghost")).is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Put { id: u8, station: u8, status: u8, order: u8 },
        Delete { id: u8 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u8..8, 0u8..3, 0u8..4, 0u8..3).prop_map(|(id, station, status, order)| Op::Put {
                id,
                station,
                status,
                order
            }),
            1 => (0u8..8).prop_map(|id| Op::Delete { id }),
        ]
    }

    proptest! {
        #[test]
        fn prop_indexes_track_store(ops in prop::collection::vec(op_strategy(), 1..64)) {
            let mut index = TicketIndex::new();

            for op in ops {
                match op {
                    Op::Put { id, station, status, order } => {
                        let mut t = ticket(&format!("t{}", id), &format!("s{}", station), &format!("st{}", status));
                        t.order_id = format!("o{}", order);
                        index.put(t);
                    }
                    Op::Delete { id } => {
                        index.delete(&TicketId(format!("t{}", id)));
                    }
                }
                prop_assert!(index.check_consistency().is_ok());
            }
        }
    }
}
