//! Integration tests for the ticket cache.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use ticketrail::{
    cancellation, CacheConfig, SubscriptionFilter, Ticket, TicketCache, TicketEvent,
    TicketEventKind, TicketStatusChanged,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn ids(tickets: &[Arc<Ticket>]) -> Vec<String> {
    tickets.iter().map(|t| t.id.to_string()).collect()
}

// --- Realistic Workflow Tests ---

#[test]
fn test_kitchen_and_bar_workflow() {
    init_tracing();
    let cache = TicketCache::default();

    let a = Ticket::new("A", "order-1", "kitchen", "created");
    let b = Ticket::new("B", "order-1", "bar", "created");
    cache.set(a.clone());
    cache.set(b.clone());

    assert_eq!(ids(&cache.by_station("kitchen")), vec!["A"]);
    assert_eq!(cache.count(), 2);

    cache.set(a.with_status("started"));
    assert_eq!(ids(&cache.by_status("created")), vec!["B"]);
    assert_eq!(ids(&cache.by_status("started")), vec!["A"]);
    assert_eq!(cache.count(), 2);

    cache.remove(&b.id);
    assert_eq!(cache.count(), 1);
    assert!(cache.by_station("bar").is_empty());
    assert!(cache.by_status("created").is_empty());
    assert_eq!(cache.by_order("order-1").len(), 1);
    cache.check_consistency().unwrap();
}

#[test]
fn test_station_move_leaves_no_stale_bucket() {
    let cache = TicketCache::default();
    let ticket = Ticket::new("A", "order-1", "x", "created");

    cache.set(ticket.clone());
    cache.set(ticket.with_station("y"));

    assert!(cache.by_station("x").is_empty());
    assert_eq!(ids(&cache.by_station("y")), vec!["A"]);
    assert_eq!(ids(&cache.by_station_and_status("y", "created")), vec!["A"]);
}

#[test]
fn test_status_event_from_log_reaches_subscribers() {
    let cache = TicketCache::default();
    cache.set(Ticket::new("A", "order-1", "grill", "NEW"));
    let mut sub = cache.subscribe(SubscriptionFilter::all());
    sub.try_recv().unwrap();

    let event = TicketStatusChanged::new("A", "READY");
    cache.apply_event(&serde_json::to_vec(&event).unwrap());

    let got = sub.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(got.event_type, TicketEventKind::StatusChanged);
    assert_eq!(got.previous_status.as_deref(), Some("NEW"));
    assert_eq!(got.status_code, "READY");
    assert_eq!(got.station_code, "grill");
}

// --- Subscription Tests ---

#[test]
fn test_snapshot_then_live() {
    let cache = TicketCache::default();
    for i in 0..5 {
        cache.set(Ticket::new(format!("t{}", i), "o1", "grill", "NEW"));
    }

    let mut sub = cache.subscribe(SubscriptionFilter::all());
    assert_eq!(sub.pending_snapshot(), 5);

    cache.set(Ticket::new("t5", "o1", "grill", "NEW"));
    cache.set(Ticket::new("t0", "o1", "grill", "STARTED"));

    let mut received = Vec::new();
    while let Some(event) = sub.recv_timeout(Duration::from_millis(50)) {
        received.push(event);
    }

    assert_eq!(received.len(), 7);
    assert!(received[..5]
        .iter()
        .all(|e| e.event_type == TicketEventKind::Created));
    assert_eq!(received[5].ticket_id.as_str(), "t5");
    assert_eq!(received[5].previous_status, None);
    assert_eq!(received[6].ticket_id.as_str(), "t0");
    assert_eq!(received[6].previous_status.as_deref(), Some("NEW"));
}

#[test]
fn test_station_filter_applies_to_snapshot_and_live() {
    let cache = TicketCache::default();
    cache.set(Ticket::new("g1", "o1", "grill", "NEW"));
    cache.set(Ticket::new("b1", "o1", "bar", "NEW"));

    let mut sub = cache.subscribe(SubscriptionFilter::station("bar"));
    cache.set(Ticket::new("g2", "o1", "grill", "NEW"));
    cache.set(Ticket::new("b2", "o1", "bar", "NEW"));

    let mut seen = Vec::new();
    while let Some(event) = sub.recv_timeout(Duration::from_millis(50)) {
        seen.push(event.ticket_id.to_string());
    }
    assert_eq!(seen, vec!["b1", "b2"]);
}

#[test]
fn test_streaming_thread_until_cancel() {
    let cache = Arc::new(TicketCache::default());
    cache.set(Ticket::new("A", "o1", "grill", "NEW"));

    let sub = cache.subscribe(SubscriptionFilter::all());
    let (handle, token) = cancellation();
    let (wire_tx, wire_rx) = crossbeam_channel::unbounded::<Vec<u8>>();

    let streamer = thread::spawn(move || {
        sub.forward(&token, |event| {
            let bytes = event.to_json().map_err(|e| e.to_string())?;
            wire_tx.send(bytes).map_err(|e| e.to_string())
        })
    });

    cache.set(Ticket::new("A", "o1", "grill", "STARTED"));

    let first = TicketEvent::from_json(&wire_rx.recv_timeout(Duration::from_secs(1)).unwrap()).unwrap();
    let second = TicketEvent::from_json(&wire_rx.recv_timeout(Duration::from_secs(1)).unwrap()).unwrap();
    assert_eq!(first.event_type, TicketEventKind::Created);
    assert_eq!(second.status_code, "STARTED");

    handle.cancel();
    assert_eq!(streamer.join().unwrap(), Ok(2));
    assert_eq!(cache.subscriber_count(), 0);
}

#[test]
fn test_close_subscribers_ends_streams() {
    let cache = Arc::new(TicketCache::default());
    let sub = cache.subscribe(SubscriptionFilter::all());
    let (_handle, token) = cancellation();

    let streamer = thread::spawn(move || sub.forward(&token, |_| Ok::<(), ()>(())));
    thread::sleep(Duration::from_millis(20));
    cache.close_subscribers();

    assert_eq!(streamer.join().unwrap(), Ok(0));
}

// --- Backpressure ---

#[test]
fn test_slow_subscriber_does_not_block_writers() {
    let cache = TicketCache::new(CacheConfig {
        subscriber_buffer: 4,
        ..Default::default()
    });
    let mut slow = cache.subscribe(SubscriptionFilter::all());
    let mut fast = cache.subscribe(SubscriptionFilter::all());

    let start = Instant::now();
    for i in 0..200 {
        cache.set(Ticket::new("A", "o1", "grill", format!("S{}", i)));
        while fast.try_recv().is_some() {}
    }
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(cache.stats().dropped_notifications >= 196);

    // The slow reader lost the middle, but the next write gets through.
    while slow.try_recv().is_some() {}
    cache.set(Ticket::new("A", "o1", "grill", "DONE"));
    assert_eq!(slow.try_recv().unwrap().status_code, "DONE");
}

#[test]
fn test_zero_capacity_subscriber_never_blocks() {
    let cache = Arc::new(TicketCache::new(CacheConfig {
        subscriber_buffer: 0,
        ..Default::default()
    }));
    let _idle = cache.subscribe(SubscriptionFilter::all());

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 0..500 {
                cache.set(Ticket::new(format!("t{}", i), "o1", "grill", "NEW"));
            }
        })
    };

    let deadline = Instant::now() + Duration::from_secs(5);
    while !writer.is_finished() {
        assert!(Instant::now() < deadline, "writer blocked on idle subscriber");
        thread::sleep(Duration::from_millis(5));
    }
    writer.join().unwrap();
    assert_eq!(cache.count(), 500);
}

// --- Concurrency ---

#[test]
fn test_concurrent_writers_keep_indexes_consistent() {
    let cache = Arc::new(TicketCache::default());
    let stations = ["grill", "fry", "bar", "pastry"];
    let statuses = ["NEW", "STARTED", "READY"];

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..250 {
                    let id = format!("t{}", (w * 7 + i) % 40);
                    let station = stations[(w + i) % stations.len()];
                    let status = statuses[i % statuses.len()];
                    if i % 11 == 0 {
                        cache.remove(&id.as_str().into());
                    } else {
                        cache.set(Ticket::new(id, "o1", station, status));
                    }
                }
            })
        })
        .collect();

    let reader = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for _ in 0..200 {
                for station in stations {
                    for ticket in cache.by_station(station) {
                        assert_eq!(ticket.station_code, station);
                    }
                }
                cache.check_consistency().unwrap();
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    cache.check_consistency().unwrap();
    let by_station: usize = stations.iter().map(|s| cache.by_station(s).len()).sum();
    assert_eq!(by_station, cache.count());
}

#[test]
fn test_independent_instances() {
    let first = TicketCache::default();
    let second = TicketCache::default();

    first.set(Ticket::new("A", "o1", "grill", "NEW"));

    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 0);
}
