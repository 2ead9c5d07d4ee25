use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use super::*;

#[tokio::test(start_paused = true)]
async fn test_true_immediately_does_not_sleep() {
    let poller = Poller::new(Duration::from_millis(500));
    let waited = poller
        .wait_until("ready", Duration::from_secs(5), || async { Ok(true) })
        .await
        .unwrap();
    assert_eq!(waited, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_becomes_true_before_deadline() {
    let poller = Poller::new(Duration::from_millis(100));
    let start = Instant::now();
    let flips_at = start + Duration::from_millis(750);

    let waited = poller
        .wait_until("flag", Duration::from_secs(2), || async move {
            Ok(Instant::now() >= flips_at)
        })
        .await
        .unwrap();

    // observed on the first tick at or after the flip
    assert!(waited >= Duration::from_millis(750));
    assert!(waited < Duration::from_millis(850));
}

#[tokio::test(start_paused = true)]
async fn test_never_true_times_out_at_deadline() {
    let poller = Poller::new(Duration::from_millis(300));
    let start = Instant::now();

    let err = poller
        .wait_until("never", Duration::from_secs(1), || async { Ok(false) })
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    let elapsed = start.elapsed();
    assert_eq!(elapsed, Duration::from_secs(1));
    match err {
        PollError::Timeout { what, waited } => {
            assert_eq!(what, "never");
            assert_eq!(waited, Duration::from_secs(1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_probes_once_per_interval() {
    let poller = Poller::new(Duration::from_millis(250));
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let _ = poller
        .wait_until("count", Duration::from_secs(1), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            }
        })
        .await;

    // t = 0, 250, 500, 750, 1000
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_count_as_not_yet() {
    let poller = Poller::new(Duration::from_millis(100));
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let waited = poller
        .wait_until("navigating", Duration::from_secs(1), || {
            let counter = counter.clone();
            async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(PageError::Script("Execution context was destroyed".into())),
                    _ => Ok(true),
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(waited, Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_aborts_the_wait() {
    let poller = Poller::new(Duration::from_millis(100));
    let err = poller
        .wait_until("anything", Duration::from_secs(10), || async {
            Err(PageError::Disconnected)
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PollError::Fatal(PageError::Disconnected)));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_probe_is_cut_at_deadline() {
    let poller = Poller::new(Duration::from_millis(100));
    let start = Instant::now();

    let err = poller
        .wait_until("hang", Duration::from_secs(3), || async {
            std::future::pending::<Result<bool, PageError>>().await
        })
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_final_probe_gets_time_to_answer() {
    let poller = Poller::new(Duration::from_millis(300));
    let start = Instant::now();
    let flips_at = start + Duration::from_secs(1);

    let waited = poller
        .wait_until("slow", Duration::from_secs(1), || async move {
            let ready = Instant::now() >= flips_at;
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(ready)
        })
        .await
        .unwrap();

    // probes at 0, 500 and the deadline; only the last sees the flag
    assert_eq!(waited, Duration::from_millis(1200));
}

#[tokio::test(start_paused = true)]
async fn test_final_probe_is_still_bounded() {
    let poller = Poller::new(Duration::from_millis(300));
    let start = Instant::now();
    let deadline = start + Duration::from_secs(1);

    let err = poller
        .wait_until("stuck", Duration::from_secs(1), || async move {
            if Instant::now() < deadline {
                return Ok(false);
            }
            std::future::pending::<Result<bool, PageError>>().await
        })
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_secs(1) + FINAL_PROBE_GRACE);
}

#[tokio::test(start_paused = true)]
async fn test_wake_triggers_immediate_recheck() {
    let wake = Arc::new(Notify::new());
    let poller = Poller::new(Duration::from_secs(60)).with_wake(wake.clone());
    let calls = Arc::new(AtomicU32::new(0));

    let notifier = wake.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        notifier.notify_one();
    });

    let counter = calls.clone();
    let waited = poller
        .wait_until("operator", Duration::from_secs(300), || {
            let counter = counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst) >= 1) }
        })
        .await
        .unwrap();

    assert_eq!(waited, Duration::from_secs(1));
}
