//! Deadline-based polling primitive.
//!
//! [`wait`] is the sole retry mechanism in the crate: the connection
//! layer never retries. Callers supply a condition returning
//! `Result<Option<T>>` and the set of error kinds that count as "keep
//! polling"; anything else propagates immediately.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{Error, ErrorKind, Result};
use crate::transport::Transport;

/// Fixed pause between polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

// ============================================================================
// Wait
// ============================================================================

/// Polls `condition` until it produces a value or `timeout` elapses.
///
/// The deadline is computed once, at call time. Each round:
///
/// - `Ok(Some(value))` returns immediately, without waiting out the
///   remaining deadline
/// - `Ok(None)` sleeps [`POLL_INTERVAL`] and retries
/// - an error whose kind is in `retryable` is remembered, then the
///   loop sleeps and retries
/// - any other error propagates immediately
///
/// Sleeping goes through the transport so alternate runtimes and test
/// doubles stay in control of time.
///
/// # Errors
///
/// Returns [`Error::WaitTimeout`] once the deadline passes, chaining
/// the last retryable error observed, if any.
pub async fn wait<T, F, Fut>(
    transport: &dyn Transport,
    timeout: Duration,
    mut condition: F,
    retryable: &[ErrorKind],
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    let mut last_error: Option<Error> = None;

    while Instant::now() < deadline {
        match condition().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) if err.kind().is_some_and(|kind| retryable.contains(&kind)) => {
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
        transport.sleep(POLL_INTERVAL).await;
    }

    Err(Error::WaitTimeout {
        timeout,
        source: last_error.map(Box::new),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::transport::mock::MockTransport;

    #[tokio::test]
    async fn test_wait_returns_on_first_truthy_result() {
        let mock = MockTransport::arc();
        let value = wait(
            mock.as_ref(),
            Duration::from_secs(5),
            || async { Ok(Some(42)) },
            &[],
        )
        .await
        .expect("immediate success");
        assert_eq!(value, 42);
        assert!(mock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_wait_polls_falsy_results() {
        let mock = MockTransport::arc();
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let value = wait(
            mock.as_ref(),
            Duration::from_secs(5),
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Ok(None)
                } else {
                    Ok(Some("ready"))
                }
            },
            &[],
        )
        .await
        .expect("eventual success");
        assert_eq!(value, "ready");
        assert_eq!(mock.sleeps().len(), 3);
        assert!(mock.sleeps().iter().all(|d| *d == POLL_INTERVAL));
    }

    #[tokio::test]
    async fn test_wait_retries_designated_error_kinds() {
        let mock = MockTransport::arc();
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let value: i32 = wait(
            mock.as_ref(),
            Duration::from_secs(5),
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::webdriver(ErrorKind::NoSuchElement, "not yet"))
                } else {
                    Ok(Some(7))
                }
            },
            &[ErrorKind::NoSuchElement],
        )
        .await
        .expect("retried to success");
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_wait_propagates_other_errors_immediately() {
        let mock = MockTransport::arc();
        let err = wait::<i32, _, _>(
            mock.as_ref(),
            Duration::from_secs(5),
            || async { Err(Error::webdriver(ErrorKind::JavascriptError, "boom")) },
            &[ErrorKind::NoSuchElement],
        )
        .await
        .expect_err("should propagate");
        assert!(err.is_kind(ErrorKind::JavascriptError));
        assert!(mock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_wait_timeout_chains_last_retryable_error() {
        let mock = MockTransport::arc();
        let err = wait::<i32, _, _>(
            mock.as_ref(),
            Duration::from_millis(10),
            || async { Err(Error::webdriver(ErrorKind::NoSuchElement, "still missing")) },
            &[ErrorKind::NoSuchElement],
        )
        .await
        .expect_err("should time out");
        // The timeout error wraps the retried error instead of being it.
        match err {
            Error::WaitTimeout { source, .. } => {
                let inner = source.expect("chained error");
                assert!(inner.is_kind(ErrorKind::NoSuchElement));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wait_zero_timeout_is_bare() {
        let mock = MockTransport::arc();
        let err = wait::<i32, _, _>(mock.as_ref(), Duration::ZERO, || async { Ok(None) }, &[])
            .await
            .expect_err("should time out");
        match err {
            Error::WaitTimeout { source, .. } => assert!(source.is_none()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
