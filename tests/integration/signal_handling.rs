//! Shutdown coordination and stream cancellation

use futures::StreamExt;
use std::time::Duration;

use slugkit::generator::{AsyncGenerator, GeneratorConfig};
use slugkit::shutdown::ShutdownCoordinator;
use slugkit::RetryPolicy;

use crate::support::{Reply, ScriptedTransport};

#[tokio::test]
async fn shutdown_notifies_waiters() {
    let shutdown = ShutdownCoordinator::shared();
    let waiter = {
        let handle = shutdown.clone();
        tokio::spawn(async move {
            handle.wait_for_shutdown().await;
            true
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.request_shutdown();

    let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
    assert!(result.is_ok());
}

/// Shutdown requested before anyone waits must not be missed.
#[tokio::test]
async fn shutdown_requested_before_wait_is_seen() {
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let handle = shutdown.clone();
    let waiter = tokio::spawn(async move {
        handle.wait_for_shutdown().await;
        true
    });

    let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
    assert!(result.is_ok(), "wait_for_shutdown() missed an earlier request");
}

#[tokio::test]
async fn shutdown_concurrent_waiters_all_notified() {
    let shutdown = ShutdownCoordinator::shared();

    let mut waiters = Vec::new();
    for _ in 0..10 {
        let handle = shutdown.clone();
        waiters.push(tokio::spawn(async move {
            handle.wait_for_shutdown().await;
        }));
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    shutdown.request_shutdown();

    for waiter in waiters {
        let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(result.is_ok(), "A waiter was not notified of shutdown");
    }
}

/// A consumer racing the stream against shutdown stops pulling and
/// releases the open response exactly once.
#[tokio::test]
async fn shutdown_stops_stream_and_releases_response() {
    let transport = ScriptedTransport::new(vec![Reply::lines("s", 100_000)]);
    let generator = AsyncGenerator::new(
        transport.clone(),
        RetryPolicy::no_retries(),
        GeneratorConfig::for_series("orders"),
    );
    let shutdown = ShutdownCoordinator::shared();

    let mut stream = generator.stream();
    let mut pulled = 0u64;
    loop {
        if pulled == 5 {
            shutdown.request_shutdown();
        }
        let next = tokio::select! {
            biased;
            _ = shutdown.wait_for_shutdown() => None,
            item = stream.next() => item,
        };
        match next {
            Some(item) => {
                item.unwrap();
                pulled += 1;
            }
            None => break,
        }
    }
    drop(stream);

    assert_eq!(pulled, 5);
    assert_eq!(transport.closed(), 1);
    assert_eq!(transport.requests().len(), 1);
}
