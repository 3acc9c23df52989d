//! Integration tests for the HTTP coordinator.
//!
//! Each test serves a real coordinator on an ephemeral port and talks to it
//! through `HttpCoordinatorClient`: get_work → submit_result → status.

use primepulse::coordinator::{Coordinator, CoordinatorSettings, Range};
use primepulse::distributed::{serve, HttpCoordinatorClient, RangeReport, WorkerId};
use primepulse::error::SweepError;
use primepulse::oracle::ModulusOracle;
use primepulse::output::RecordingSink;
use primepulse::target::TargetNumber;
use primepulse::worker::{RangeWorker, WorkSource, WorkerSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Coordinator for 589 = 19 * 31, range size 1000
async fn start_server() -> (Arc<Coordinator>, String, oneshot::Sender<()>) {
    let settings = CoordinatorSettings {
        range_size: 1000,
        ..Default::default()
    };
    let coordinator = Arc::new(Coordinator::new(
        TargetNumber::parse("589").expect("589 is a valid number"),
        settings,
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind an ephemeral port");
    let base_url = format!("http://{}", listener.local_addr().expect("bound address"));

    let (tx, rx) = oneshot::channel::<()>();
    let server_coord = coordinator.clone();
    tokio::spawn(async move {
        serve(listener, server_coord, 1_000_000, async {
            let _ = rx.await;
        })
        .await
        .expect("server should shut down cleanly");
    });

    (coordinator, base_url, tx)
}

fn client(base_url: &str) -> HttpCoordinatorClient {
    HttpCoordinatorClient::new(base_url, Duration::from_secs(5)).expect("should build client")
}

#[tokio::test]
async fn request_submit_status_round_trip() {
    let (coordinator, base_url, shutdown) = start_server().await;
    let client = client(&base_url);
    let w1 = WorkerId::new("w1");

    let assignment = client.request_work(&w1).await.expect("should get work");
    assert_eq!(assignment.range().expect("valid range"), Range::new(2, 1001));
    assert_eq!(assignment.number_to_factor, "589");
    assert_eq!(coordinator.lease_of(&w1), Some(Range::new(2, 1001)));

    let ack = client
        .submit_result(&RangeReport::completed(w1.clone(), Range::new(2, 1001), vec![19, 31]))
        .await
        .expect("should accept submission");
    assert_eq!(ack.status, "success");
    assert_eq!(ack.accepted_divisors, 2);

    let status = client.status().await.expect("should get status");
    assert_eq!(status.largest_prime_tested, 1001);
    assert_eq!(status.divisors_found, 2);
    assert_eq!(status, coordinator.status());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn second_worker_gets_next_range() {
    let (_coordinator, base_url, shutdown) = start_server().await;
    let client = client(&base_url);

    let first = client.request_work(&WorkerId::new("a")).await.expect("first");
    let second = client.request_work(&WorkerId::new("b")).await.expect("second");
    assert_eq!(first.end_range + 1, second.start_range);
    assert_eq!(second.range().expect("valid range"), Range::new(1002, 2001));

    let status = client.status().await.expect("status");
    assert_eq!(status.largest_prime_tested, 0);
    assert_eq!(status.active_workers, 2);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn missing_worker_id_is_rejected() {
    let (coordinator, base_url, shutdown) = start_server().await;
    let client = client(&base_url);

    let report = RangeReport {
        worker_id: WorkerId::default(),
        divisors: vec![19],
        largest_prime_tested: 1001,
        range_completed: None,
    };
    match client.submit_result(&report).await {
        Err(SweepError::CoordinatorRejected { status, .. }) => assert_eq!(status, 400),
        other => panic!("expected a 400 rejection, got {:?}", other),
    }

    // Nothing was merged
    assert_eq!(coordinator.status().divisors_found, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn remote_worker_finds_divisors() {
    let (coordinator, base_url, shutdown) = start_server().await;
    let sink = RecordingSink::new();

    let settings = WorkerSettings {
        batch_size: 50,
        work_interval: Duration::from_millis(1),
        status_interval: None,
    };
    let mut worker = RangeWorker::new(
        WorkerId::new("remote"),
        Arc::new(client(&base_url)),
        Box::new(ModulusOracle),
        Arc::new(sink.clone()),
        settings,
    );
    let stop = worker.stop_handle();
    let task = tokio::spawn(async move { worker.run().await });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while coordinator.status().largest_prime_tested < 1001 {
        assert!(tokio::time::Instant::now() < deadline, "remote worker made no progress");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    stop.stop();
    let summary = task
        .await
        .expect("worker task should not panic")
        .expect("worker should stop cleanly");

    assert!(summary.ranges_completed >= 1);
    assert_eq!(sink.divisors(), vec![19, 31]);
    let found: Vec<u64> = coordinator.divisors().iter().map(|r| r.divisor).collect();
    assert_eq!(found, vec![19, 31]);

    let _ = shutdown.send(());
}
