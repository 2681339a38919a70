mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use common::{Step, link, hello_processor, worker};
use rpc_worker::{EventKind, MessageHeader, MessageType};

#[tokio::test(start_paused = true)]
async fn heartbeat_is_echoed_with_same_name_and_seq() {
    let (stream, mut proxy) = link();
    let connector = common::ScriptedConnector::new([Step::Accept(stream)]);
    let w = worker(Arc::clone(&connector), hello_processor());
    let run = tokio::spawn({
        let w = Arc::clone(&w);
        async move { w.run().await }
    });

    proxy.send_header("lb-ping", MessageType::Heartbeat, 4242).await;
    let (header, body) = proxy.recv_message().await;
    assert_eq!(header, MessageHeader::new("lb-ping", MessageType::Heartbeat, 4242));
    assert_eq!(body.remaining(), 0);

    proxy.confirm_stop().await;
    run.await.unwrap();
    assert!(!w.is_alive());
}

#[tokio::test(start_paused = true)]
async fn regular_heartbeats_keep_the_connection() {
    let (stream, mut proxy) = link();
    let connector = common::ScriptedConnector::new([Step::Accept(stream)]);
    let w = worker(Arc::clone(&connector), hello_processor());
    let run = tokio::spawn({
        let w = Arc::clone(&w);
        async move { w.run().await }
    });

    // One heartbeat every 4s for a minute; the 10s staleness limit is never reached.
    for seq in 0..15 {
        proxy.heartbeat(seq).await;
        let (header, _) = proxy.recv_message().await;
        assert_eq!(header.seq_id, seq);
        tokio::time::sleep(Duration::from_secs(4)).await;
    }

    proxy.confirm_stop().await;
    run.await.unwrap();
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn silence_beyond_threshold_tears_down_and_reconnects() {
    let (first, mut proxy) = link();
    let (second, mut proxy2) = link();
    let connector = common::ScriptedConnector::new([Step::Accept(first), Step::Accept(second)]);
    let w = worker(Arc::clone(&connector), hello_processor());
    let mut events = w.subscribe();

    let start = Instant::now();
    let run = tokio::spawn({
        let w = Arc::clone(&w);
        async move { w.run().await }
    });

    // No heartbeat at all: the worker must drop the first connection.
    assert!(proxy.recv().await.is_none());
    let dropped_after = start.elapsed();
    assert!(dropped_after > Duration::from_secs(10), "{dropped_after:?}");
    assert!(dropped_after <= Duration::from_secs(15), "{dropped_after:?}");

    // And come back on a new one after the 1s backoff.
    proxy2.heartbeat(1).await;
    let (header, _) = proxy2.recv_message().await;
    assert_eq!(header.kind, MessageType::Heartbeat);
    assert_eq!(connector.attempts(), 2);

    proxy2.confirm_stop().await;
    run.await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(ev) = events.try_recv() {
        kinds.push(ev.kind);
    }
    assert!(kinds.contains(&EventKind::HeartbeatStale));
    assert!(kinds.contains(&EventKind::ConnectionLost));
    assert_eq!(kinds.last(), Some(&EventKind::WorkerTerminated));
}

#[tokio::test(start_paused = true)]
async fn worker_never_sends_unsolicited_frames() {
    let (stream, mut proxy) = link();
    let connector = common::ScriptedConnector::new([Step::Accept(stream)]);
    let w = worker(Arc::clone(&connector), hello_processor());
    let run = tokio::spawn({
        let w = Arc::clone(&w);
        async move { w.run().await }
    });

    proxy.heartbeat(1).await;
    proxy.recv_message().await;
    assert!(proxy.recv_within(Duration::from_secs(8)).await.is_none());

    proxy.confirm_stop().await;
    run.await.unwrap();
}
