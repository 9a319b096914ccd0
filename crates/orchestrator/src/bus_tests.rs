// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use super::*;
use crate::event::EventKind;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn any_event_subscriber_receives_all_sessions() {
    let bus = EventBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counted = count.clone();
    bus.subscribe(Arc::new(move |_e: &Event| {
        counted.fetch_add(1, Ordering::SeqCst);
    }))
    .await;

    bus.publish(Event::session("a", 1, EventKind::SessionStarted));
    bus.publish(Event::session("b", 1, EventKind::SessionStarted));
    settle().await;

    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn session_scoped_subscriber_ignores_other_sessions() {
    let bus = EventBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counted = count.clone();
    bus.subscribe_session(
        "a",
        Arc::new(move |_e: &Event| {
            counted.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .await;

    bus.publish(Event::session("a", 1, EventKind::SessionStarted));
    bus.publish(Event::session("b", 1, EventKind::SessionStarted));
    settle().await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unsubscribe_stops_future_delivery() {
    let bus = EventBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counted = count.clone();
    let id = bus
        .subscribe(Arc::new(move |_e: &Event| {
            counted.fetch_add(1, Ordering::SeqCst);
        }))
        .await;

    bus.publish(Event::session("a", 1, EventKind::SessionStarted));
    settle().await;
    bus.unsubscribe(id).await;
    bus.publish(Event::session("a", 2, EventKind::SessionStarted));
    settle().await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_handler_does_not_stop_other_handlers() {
    let bus = EventBus::new();
    bus.subscribe(Arc::new(|_e: &Event| panic!("boom"))).await;
    let count = Arc::new(AtomicUsize::new(0));
    let counted = count.clone();
    bus.subscribe(Arc::new(move |_e: &Event| {
        counted.fetch_add(1, Ordering::SeqCst);
    }))
    .await;

    bus.publish(Event::session("a", 1, EventKind::SessionStarted));
    settle().await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn publish_after_close_is_a_silent_no_op() {
    let bus = EventBus::new();
    bus.close();
    bus.close();
    bus.publish(Event::session("a", 1, EventKind::SessionStarted));
    settle().await;
}

#[tokio::test]
async fn full_queue_drops_instead_of_blocking() {
    let bus = EventBus::with_capacity(1);
    for i in 0..50 {
        bus.publish(Event::session("a", i, EventKind::SessionStarted));
    }
}

proptest! {
    // Under a queue sized to the batch, every published sequence number
    // reaches the subscriber exactly once, in publish order.
    #[test]
    fn at_most_once_delivery_within_capacity(seqs in prop::collection::vec(0u64..10_000, 1..30)) {
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| panic!("runtime: {e}"));
        rt.block_on(async {
            let bus = EventBus::with_capacity(seqs.len());
            let received: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
            let sink = received.clone();
            bus.subscribe(Arc::new(move |e: &Event| {
                sink.lock().unwrap_or_else(|e| e.into_inner()).push(e.seq);
            }))
            .await;

            for &seq in &seqs {
                bus.publish(Event::session("a", seq, EventKind::SessionStarted));
            }
            settle().await;

            let got = received.lock().unwrap_or_else(|e| e.into_inner()).clone();
            prop_assert_eq!(got, seqs);
            Ok(())
        })?;
    }
}
