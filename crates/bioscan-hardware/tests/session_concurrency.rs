//! Integration tests for serialized device access.
//!
//! Run with: cargo test --package bioscan-hardware --test session_concurrency

use bioscan_core::DeviceTemplateId;
use bioscan_hardware::mock::{DriverOp, MockDriver, MockDriverHandle};
use bioscan_hardware::{CaptureProtocol, DeviceSession, EnrollProtocol, IdentifyProtocol};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

async fn initialized(latency: Duration) -> (DeviceSession<MockDriver>, MockDriverHandle) {
    let (driver, handle) = MockDriver::new();
    let session = DeviceSession::new(driver.with_latency(latency));
    session.initialize().await.unwrap();
    handle.clear_calls();
    (session, handle)
}

/// Every image acquisition must be immediately followed by its extraction.
fn assert_pairs_not_interleaved(calls: &[DriverOp]) {
    let mut iter = calls.iter().peekable();
    while let Some(op) = iter.next() {
        if *op == DriverOp::CaptureImage {
            assert_eq!(
                iter.next(),
                Some(&DriverOp::ExtractTemplate),
                "capture pair interleaved: {calls:?}"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_captures_are_serialized() {
    const NUM_CONCURRENT_CAPTURES: usize = 8;

    let (session, handle) = initialized(Duration::from_millis(5)).await;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_CAPTURES));

    let mut handles = vec![];
    for _ in 0..NUM_CONCURRENT_CAPTURES {
        let protocol = CaptureProtocol::new(session.clone());
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            protocol.capture().await
        }));
    }

    let results = futures::future::join_all(handles).await;
    for result in results {
        let outcome = result.unwrap().unwrap();
        assert!(outcome.is_success());
    }

    let calls = handle.calls();
    assert_eq!(handle.count(DriverOp::CaptureImage), NUM_CONCURRENT_CAPTURES);
    assert_eq!(handle.count(DriverOp::ExtractTemplate), NUM_CONCURRENT_CAPTURES);
    assert_pairs_not_interleaved(&calls);
    assert_eq!(handle.overlap_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_operations_never_overlap() {
    let (session, handle) = initialized(Duration::from_millis(2)).await;

    let capture = CaptureProtocol::new(session.clone());
    let identify = IdentifyProtocol::new(session.clone());
    let enroll = EnrollProtocol::new(session.clone());

    let mut tasks = vec![];
    for i in 1..=4 {
        let capture = capture.clone();
        let identify = identify.clone();
        let enroll = enroll.clone();
        let status_session = session.clone();
        tasks.push(tokio::spawn(async move {
            capture.capture().await.unwrap();
            identify.identify().await.unwrap();
            enroll
                .enroll_capture(DeviceTemplateId::new(i).unwrap())
                .await
                .unwrap();
            status_session.status().await;
        }));
    }

    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(handle.overlap_count(), 0);
    assert_pairs_not_interleaved(&handle.calls());
    session.terminate().await.unwrap();
}

#[tokio::test]
async fn test_cancelled_caller_does_not_leak_lock() {
    let (session, handle) = initialized(Duration::from_millis(100)).await;

    // Give up on the first capture while the driver call is still running.
    let protocol = CaptureProtocol::new(session.clone());
    let abandoned = tokio::time::timeout(Duration::from_millis(10), protocol.capture()).await;
    assert!(abandoned.is_err());

    // The in-flight call finishes on its worker and frees the device.
    let outcome = protocol.capture().await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(handle.overlap_count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: Any number of concurrent captures produces one uninterrupted
    /// image/extract pair per capture.
    #[test]
    fn prop_capture_pairs_never_interleave(callers in 1usize..12) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let (calls, overlaps) = runtime.block_on(async move {
            let (session, handle) = initialized(Duration::ZERO).await;
            let tasks: Vec<_> = (0..callers)
                .map(|_| {
                    let protocol = CaptureProtocol::new(session.clone());
                    tokio::spawn(async move { protocol.capture().await })
                })
                .collect();
            for result in futures::future::join_all(tasks).await {
                assert!(result.unwrap().unwrap().is_success());
            }
            (handle.calls(), handle.overlap_count())
        });

        prop_assert_eq!(overlaps, 0);
        prop_assert_eq!(
            calls.iter().filter(|op| **op == DriverOp::CaptureImage).count(),
            callers
        );
        assert_pairs_not_interleaved(&calls);
    }
}
