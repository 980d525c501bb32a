//! Cache warm-up from an event log or a repository scan.
//!
//! `warm` runs a one-shot degrade chain:
//!
//! 1. Replay up to `replay_batch_size` events from the event source under a
//!    single write-lock hold, then prune terminal tickets.
//! 2. If there is no event source or it fails, load every ticket from the
//!    repository (no pruning).
//! 3. If that fails too, the cache stays as it was.
//!
//! None of these failures reach the caller; a service must boot even when
//! both collaborators are down.

use crate::cache::TicketCache;
use crate::error::SourceError;
use crate::events::{apply_event, Applied};
use crate::types::Ticket;
use tracing::{debug, info, warn};

/// Ordered source of historical ticket events.
pub trait EventSource: Send + Sync {
    /// Fetch up to `max_count` raw events, oldest first.
    fn fetch(&self, max_count: usize) -> Result<Vec<Vec<u8>>, SourceError>;
}

/// Backing store holding the current tickets.
pub trait TicketRepository: Send + Sync {
    /// Every ticket, unfiltered.
    fn list(&self) -> Result<Vec<Ticket>, SourceError>;
}

/// How a warm-up populated the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarmOutcome {
    /// Rebuilt from the event log.
    Replayed {
        /// Events that changed the index.
        applied: usize,
        /// Malformed or unknown events.
        skipped: usize,
        /// Terminal tickets removed afterwards.
        pruned: usize,
    },
    /// Loaded from a repository scan.
    Scanned { loaded: usize },
    /// Nothing could be loaded.
    Empty,
}

impl TicketCache {
    /// Populate the cache, falling back from replay to scan to empty.
    pub fn warm(&self) -> WarmOutcome {
        if let Some(outcome) = self.try_replay() {
            return outcome;
        }
        self.reload_from_repository()
    }

    /// Rebuild from the repository regardless of the event source.
    ///
    /// Use after seeding data out-of-band, when the event log no longer
    /// reflects what is stored.
    pub fn reload_from_repository(&self) -> WarmOutcome {
        let Some(repository) = &self.repository else {
            info!("no ticket repository configured, cache left as is");
            return WarmOutcome::Empty;
        };

        let tickets = match repository.list() {
            Ok(tickets) => tickets,
            Err(e) => {
                warn!(error = %e, "repository scan failed, cache left as is");
                return WarmOutcome::Empty;
            }
        };

        let loaded = {
            let mut index = self.index.write();
            index.clear();
            for ticket in tickets {
                index.put(ticket);
            }
            index.len()
        };

        info!(loaded, "cache warmed from repository");
        WarmOutcome::Scanned { loaded }
    }

    /// Replay the event log. `None` means replay was unavailable.
    fn try_replay(&self) -> Option<WarmOutcome> {
        let Some(source) = &self.event_source else {
            debug!("no event source configured, skipping replay");
            return None;
        };

        let batch = match source.fetch(self.config.replay_batch_size) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "event replay unavailable, falling back to repository");
                return None;
            }
        };

        let mut applied = 0;
        let mut skipped = 0;
        let mut notifications = Vec::new();

        let pruned = {
            let mut index = self.index.write();
            index.clear();

            for raw in &batch {
                match apply_event(&mut index, raw) {
                    Ok(Applied::Created { .. }) => applied += 1,
                    Ok(Applied::StatusChanged { notification }) => {
                        applied += 1;
                        notifications.push(notification);
                    }
                    Ok(Applied::Ignored { event_type }) => {
                        debug!(%event_type, "ignoring unknown event during replay");
                        skipped += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, "dropping malformed event during replay");
                        skipped += 1;
                    }
                }
            }

            index.prune_statuses(&self.config.terminal_statuses)
        };

        for notification in notifications {
            self.broadcaster.broadcast(notification);
        }

        info!(
            fetched = batch.len(),
            applied, skipped, pruned, "cache warmed from event log"
        );
        Some(WarmOutcome::Replayed {
            applied,
            skipped,
            pruned,
        })
    }
}
