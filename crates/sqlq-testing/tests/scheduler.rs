//! Pool and scheduler scenarios against the mock transport.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sqlq_pool::{ConnectionStatus, DriverError, JobId, JobResult, Pool, PoolError};
use sqlq_testing::{MockTransport, Outcome, init_tracing};
use sqlq_types::Statement;
use tokio::sync::oneshot;

fn pool(transport: &MockTransport, max: u32) -> Pool<MockTransport> {
    Pool::builder()
        .max_connections(max)
        .build(transport.clone())
        .unwrap()
}

fn submit(pool: &Pool<MockTransport>, sql: &str) -> oneshot::Receiver<JobResult> {
    submit_with_id(pool, sql).1
}

fn submit_with_id(pool: &Pool<MockTransport>, sql: &str) -> (JobId, oneshot::Receiver<JobResult>) {
    let (tx, rx) = oneshot::channel();
    let id = pool.submit(
        Statement::new(sql),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    (id, rx)
}

/// Submit a job whose deliveries are counted.
fn submit_counted(
    pool: &Pool<MockTransport>,
    sql: &str,
    calls: &Arc<AtomicUsize>,
) -> oneshot::Receiver<JobResult> {
    let (tx, rx) = oneshot::channel();
    let calls = Arc::clone(calls);
    pool.submit(
        Statement::new(sql),
        Box::new(move |result| {
            calls.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result);
        }),
    );
    rx
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..4000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test(start_paused = true)]
async fn test_twenty_jobs_sixteen_connections() {
    init_tracing();
    let transport = MockTransport::new()
        .with_connect_delay(Duration::from_millis(5))
        .with_execute_delay(Duration::from_millis(100));
    let pool = pool(&transport, 16);

    let receivers: Vec<_> = (0..20)
        .map(|i| submit(&pool, &format!("SELECT {i}")))
        .collect();
    pool.start();

    let sampler = {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut peak = 0;
            while !pool.queued().is_empty() || pool.status().busy > 0 {
                peak = peak.max(pool.records().len());
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            peak
        })
    };

    for rx in receivers {
        assert!(rx.await.unwrap().is_ok());
    }

    assert!(sampler.await.unwrap() <= 16);
    assert!(transport.opened() <= 16);
    assert!(transport.max_concurrency() <= 16);
    assert_eq!(transport.max_session_concurrency(), 1);
    assert_eq!(transport.executions().len(), 20);
    assert!(pool.queued().is_empty());

    let metrics = pool.metrics();
    assert_eq!(metrics.jobs_submitted, 20);
    assert_eq!(metrics.jobs_completed, 20);
    assert_eq!(metrics.jobs_failed, 0);

    // Everything drains back to idle.
    wait_until(|| pool.status().busy == 0).await;
    assert!(
        pool.records()
            .iter()
            .all(|r| r.status == ConnectionStatus::Idle)
    );
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_socket_drop_mid_flight_retries_elsewhere() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script("SELECT slow", [Outcome::SocketDrop]);
    let pool = pool(&transport, 4);

    let calls = Arc::new(AtomicUsize::new(0));
    let rx = submit_counted(&pool, "SELECT slow", &calls);
    pool.start();

    let result = rx.await.unwrap().unwrap();
    assert_eq!(result.row_count, 1);

    let runs = transport.executions_of("SELECT slow");
    assert_eq!(runs.len(), 2);
    assert_ne!(runs[0].connection, runs[1].connection);

    // The broken connection was evicted, not reused.
    assert!(pool.records().iter().all(|r| r.id != runs[0].connection));
    assert_eq!(pool.metrics().jobs_requeued, 1);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_socket_drop_requeues_behind_later_jobs() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script("SELECT a", [Outcome::SocketDrop]);
    transport.hold();
    let pool = pool(&transport, 1);
    pool.start();

    let (a, a_rx) = submit_with_id(&pool, "SELECT a");
    wait_until(|| transport.in_flight() == 1).await;
    let (b, b_rx) = submit_with_id(&pool, "SELECT b");
    let (c, c_rx) = submit_with_id(&pool, "SELECT c");
    assert_eq!(pool.queued(), vec![b, c]);

    // Park the scheduler so the broken record stays visible.
    pool.stop();
    transport.release();
    wait_until(|| pool.queued().len() == 3).await;

    assert_eq!(pool.queued(), vec![b, c, a]);
    let records = pool.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ConnectionStatus::Failed);
    assert_eq!(pool.status().failed, 1);

    pool.start();
    for rx in [b_rx, c_rx, a_rx] {
        assert!(rx.await.unwrap().is_ok());
    }

    let order: Vec<_> = transport.executions().into_iter().map(|e| e.sql).collect();
    assert_eq!(order, ["SELECT a", "SELECT b", "SELECT c", "SELECT a"]);
    assert_eq!(transport.max_session_concurrency(), 1);
    assert_eq!(transport.max_concurrency(), 1);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_stop_leaves_queue_and_finishes_busy() {
    init_tracing();
    let transport = MockTransport::new();
    transport.hold();
    let pool = pool(&transport, 2);

    let mut receivers: Vec<_> = (0..7).map(|i| submit(&pool, &format!("SELECT {i}"))).collect();
    pool.start();

    wait_until(|| transport.in_flight() == 2).await;
    pool.stop();
    assert_eq!(pool.queued().len(), 5);
    assert_eq!(pool.status().busy, 2);

    transport.release();
    let mut rest = receivers.split_off(2);
    for rx in receivers {
        assert!(rx.await.unwrap().is_ok());
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(pool.queued().len(), 5);
    assert_eq!(transport.executions().len(), 2);
    assert_eq!(pool.status().idle, 2);
    for rx in &mut rest {
        assert!(rx.try_recv().is_err());
    }

    // Restarting drains the rest.
    pool.start();
    for rx in rest {
        assert!(rx.await.unwrap().is_ok());
    }
    assert_eq!(transport.executions().len(), 7);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_terminal_error_delivered_once() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script(
        "SELECT * FROM nope",
        [Outcome::server_error("Invalid object name 'nope'.")],
    );
    let pool = pool(&transport, 4);

    let calls = Arc::new(AtomicUsize::new(0));
    let rx = submit_counted(&pool, "SELECT * FROM nope", &calls);
    pool.start();

    match rx.await.unwrap() {
        Err(PoolError::Driver(e)) => assert!(e.text().contains("Invalid object name")),
        other => panic!("unexpected result: {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.executions_of("SELECT * FROM nope").len(), 1);

    // The connection survives a statement error.
    let status = pool.status();
    assert_eq!(status.idle, 1);
    assert_eq!(status.failed, 0);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_invisible() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script("SELECT flaky", [Outcome::timeout(), Outcome::timeout()]);
    let pool = pool(&transport, 4);

    let calls = Arc::new(AtomicUsize::new(0));
    let rx = submit_counted(&pool, "SELECT flaky", &calls);
    pool.start();

    assert!(rx.await.unwrap().is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.executions_of("SELECT flaky").len(), 3);

    let metrics = pool.metrics();
    assert_eq!(metrics.jobs_requeued, 2);
    assert_eq!(metrics.jobs_failed, 0);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_retry_cap_surfaces_last_error() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script(
        "SELECT flaky",
        [Outcome::timeout(), Outcome::timeout(), Outcome::timeout()],
    );
    let pool = Pool::builder()
        .max_attempts(2)
        .build(transport.clone())
        .unwrap();

    let rx = submit(&pool, "SELECT flaky");
    pool.start();

    match rx.await.unwrap() {
        Err(PoolError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 2);
            assert!(last.is_transient());
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(transport.executions_of("SELECT flaky").len(), 2);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_server_fails_backlog() {
    init_tracing();
    let transport = MockTransport::new();
    transport.refuse(DriverError::new("ELOGIN", "Login failed for user 'app'."));
    let pool = Pool::builder()
        .reconnect(3, Duration::from_secs(1))
        .build(transport.clone())
        .unwrap();

    let first = submit(&pool, "SELECT 1");
    let second = submit(&pool, "SELECT 2");
    pool.start();

    for rx in [first, second] {
        match rx.await.unwrap() {
            Err(PoolError::Unreachable { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last.code(), Some("ELOGIN"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
    assert_eq!(pool.metrics().connect_failures, 3);
    assert!(transport.executions().is_empty());

    // A later submission starts a fresh cycle.
    transport.accept();
    let rx = submit(&pool, "SELECT 3");
    assert!(rx.await.unwrap().is_ok());
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_reconnects_keep_backlog_for_live_connection() {
    init_tracing();
    let transport = MockTransport::new();
    transport.hold();
    let pool = Pool::builder()
        .reconnect(3, Duration::from_secs(1))
        .build(transport.clone())
        .unwrap();
    pool.start();

    let first = submit(&pool, "SELECT 1");
    wait_until(|| transport.in_flight() == 1).await;
    let live = transport.executions()[0].connection;

    transport.refuse(DriverError::new("ELOGIN", "Login failed for user 'app'."));
    let mut second = submit(&pool, "SELECT 2");
    wait_until(|| pool.metrics().connect_failures >= 3).await;

    assert!(second.try_recv().is_err());
    assert_eq!(pool.queued().len(), 1);
    assert_eq!(pool.status().busy, 1);

    transport.release();
    assert_eq!(first.await.unwrap().unwrap().row_count, 1);
    assert_eq!(second.await.unwrap().unwrap().row_count, 1);
    assert_eq!(transport.executions()[1].connection, live);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_recovers_after_backoff() {
    init_tracing();
    let transport = MockTransport::new();
    transport.fail_next_connect(DriverError::socket("connection refused"));
    let pool = Pool::builder()
        .reconnect(5, Duration::from_secs(2))
        .build(transport.clone())
        .unwrap();

    let rx = submit(&pool, "SELECT 1");
    let started = tokio::time::Instant::now();
    pool.start();

    assert!(rx.await.unwrap().is_ok());
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(transport.opened(), 2);
    assert_eq!(pool.metrics().connect_failures, 1);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_exit_fails_busy_and_queued_jobs() {
    init_tracing();
    let transport = MockTransport::new();
    transport.hold();
    let pool = pool(&transport, 1);

    let calls = Arc::new(AtomicUsize::new(0));
    let busy = submit_counted(&pool, "SELECT 1", &calls);
    let queued = submit_counted(&pool, "SELECT 2", &calls);
    pool.start();

    wait_until(|| transport.in_flight() == 1).await;
    pool.exit();

    assert!(matches!(busy.await.unwrap(), Err(PoolError::Closed)));
    assert!(matches!(queued.await.unwrap(), Err(PoolError::Closed)));
    assert_eq!(transport.closed(), 1);
    assert!(pool.records().is_empty());
    assert!(pool.is_stopped());

    // The held execution finishing late is not delivered again.
    transport.release();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_server_side_disconnect_requeues_busy_job() {
    init_tracing();
    let transport = MockTransport::new();
    transport.hold();
    let pool = pool(&transport, 4);

    let calls = Arc::new(AtomicUsize::new(0));
    let rx = submit_counted(&pool, "SELECT 1", &calls);
    pool.start();

    wait_until(|| transport.in_flight() == 1).await;
    let lost = transport.executions()[0].connection;
    transport.drop_connection(lost);
    assert!(pool.records().iter().all(|r| r.id != lost));

    transport.release();
    assert!(rx.await.unwrap().is_ok());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.executions().len(), 2);
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_idle_connection_error_is_evicted() {
    init_tracing();
    let transport = MockTransport::new();
    let pool = pool(&transport, 4);
    pool.start();

    assert!(submit(&pool, "SELECT 1").await.unwrap().is_ok());
    let first = transport.executions()[0].connection;

    transport.raise_error(first, DriverError::new("ECONNRESET", "reset by peer"));
    assert_eq!(pool.status().failed, 1);

    assert!(submit(&pool, "SELECT 2").await.unwrap().is_ok());
    let second = transport.executions()[1].connection;
    assert_ne!(first, second);
    assert!(pool.records().iter().all(|r| r.id != first));
    pool.exit();
}

#[tokio::test(start_paused = true)]
async fn test_acquire_waits_for_connect() {
    init_tracing();
    let transport = MockTransport::new().with_connect_delay(Duration::from_millis(50));
    let pool = pool(&transport, 2);

    let id = pool.acquire().await.expect("connection");
    assert_eq!(pool.records()[0].id, id);
    assert_eq!(pool.status().idle, 1);

    pool.stop();
    assert_eq!(pool.acquire().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_poll_interval_adapts() {
    init_tracing();
    let transport = MockTransport::new();
    let pool = pool(&transport, 2);
    assert_eq!(pool.poll_interval(), Duration::from_millis(10));

    pool.start();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(pool.poll_interval(), Duration::from_millis(100));
    assert!(pool.is_running());

    pool.stop();
    assert!(!pool.is_running());
}
