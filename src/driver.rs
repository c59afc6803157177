//! Driver root handle.
//!
//! A [`Driver`] pairs the root [`Connection`] of a running driver with
//! the teardown steps ("closers") accumulated while the driver was
//! started. Sessions are negotiated from it; [`Driver::close`] releases
//! everything in reverse acquisition order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::browsers::Browser;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::transport::Method;

// ============================================================================
// Closers
// ============================================================================

/// Future produced by running a closer.
pub(crate) type CloserFuture = BoxFuture<'static, Result<()>>;

/// One deferred teardown step: stop a process, close an HTTP session.
pub(crate) type Closer = Box<dyn FnOnce() -> CloserFuture + Send>;

// ============================================================================
// Driver
// ============================================================================

/// Handle to a running WebDriver service.
pub struct Driver {
    connection: Connection,
    closers: Mutex<Vec<Closer>>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("url", &self.connection.url_prefix())
            .field("closers", &self.closers.lock().len())
            .finish_non_exhaustive()
    }
}

impl Driver {
    pub(crate) fn new(connection: Connection, closers: Vec<Closer>) -> Self {
        Self {
            connection,
            closers: Mutex::new(closers),
        }
    }

    /// Negotiates a new session for `browser`.
    ///
    /// `bind` is prepended to every URL passed to
    /// [`Session::get`](crate::session::Session::get); pass `""` to
    /// navigate with absolute URLs.
    ///
    /// # Errors
    ///
    /// Returns a negotiation error if the driver's response carries no
    /// session id, in either the W3C or the legacy position.
    pub async fn new_session(&self, browser: &Browser, bind: &str) -> Result<Session> {
        debug!(variant = ?browser.variant(), "Negotiating session");
        let payload = self
            .connection
            .request_full(Method::Post, "/session", Some(browser.negotiation_body()))
            .await?;
        let session_id = session_id_from(&payload).ok_or_else(|| {
            Error::negotiation(format!("driver response carries no session id: {payload}"))
        })?;
        debug!(session_id = %session_id, "Session created");
        Ok(Session::new(
            self.connection.prefixed(&format!("/session/{session_id}")),
            browser.variant(),
            bind,
        ))
    }

    /// Releases everything the driver start accumulated.
    ///
    /// Closers run in reverse acquisition order. Every closer runs even
    /// if an earlier one fails; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first closer failure, if any.
    pub async fn close(&self) -> Result<()> {
        let closers: Vec<Closer> = self.closers.lock().drain(..).collect();
        let mut first_error = None;
        for closer in closers.into_iter().rev() {
            if let Err(err) = closer().await {
                warn!(error = %err, "Teardown step failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Reads the session id from a negotiation response.
///
/// Legacy drivers put it at the top level; W3C drivers nest it under
/// `value`.
fn session_id_from(payload: &Value) -> Option<&str> {
    payload
        .get("sessionId")
        .and_then(Value::as_str)
        .or_else(|| payload.get("value")?.get("sessionId")?.as_str())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use serde_json::json;

    use crate::browsers::Browser;
    use crate::error::ErrorKind;
    use crate::transport::Transport;
    use crate::transport::mock::MockTransport;

    fn driver(mock: &Arc<MockTransport>, closers: Vec<Closer>) -> Driver {
        let connection = Connection::new(
            Arc::clone(mock) as Arc<dyn Transport>,
            "http://localhost:4444",
        );
        Driver::new(connection, closers)
    }

    #[tokio::test]
    async fn test_new_session_w3c_nested_id() {
        crate::transport::mock::init_tracing();
        let mock = MockTransport::arc();
        mock.push_json(
            200,
            json!({"value": {"sessionId": "abc", "capabilities": {}}}),
        );
        mock.push_json(200, json!({"value": null}));
        let driver = driver(&mock, Vec::new());
        let session = driver
            .new_session(&Browser::firefox(), "")
            .await
            .expect("session");
        session.get("http://test/").await.expect("navigate");
        let requests = mock.requests();
        assert_eq!(requests[0].url, "http://localhost:4444/session");
        assert_eq!(requests[1].url, "http://localhost:4444/session/abc/url");
    }

    #[tokio::test]
    async fn test_new_session_legacy_top_level_id() {
        let mock = MockTransport::arc();
        mock.push_json(
            200,
            json!({"sessionId": "xyz", "status": 0, "value": {}}),
        );
        let driver = driver(&mock, Vec::new());
        driver
            .new_session(&Browser::phantomjs(), "")
            .await
            .expect("session");
        let body: Value =
            serde_json::from_slice(mock.requests()[0].body.as_deref().expect("body"))
                .expect("json");
        assert!(body.get("desiredCapabilities").is_some());
    }

    #[tokio::test]
    async fn test_new_session_without_id_is_negotiation_error() {
        let mock = MockTransport::arc();
        mock.push_json(200, json!({"value": {"capabilities": {}}}));
        let driver = driver(&mock, Vec::new());
        let err = driver
            .new_session(&Browser::firefox(), "")
            .await
            .expect_err("must fail");
        assert!(matches!(err, Error::Negotiation { .. }));
    }

    #[tokio::test]
    async fn test_new_session_propagates_classified_errors() {
        let mock = MockTransport::arc();
        mock.push_json(
            500,
            json!({"value": {"error": "session not created", "message": "no browser"}}),
        );
        let driver = driver(&mock, Vec::new());
        let err = driver
            .new_session(&Browser::firefox(), "")
            .await
            .expect_err("must fail");
        assert!(err.is_kind(ErrorKind::SessionNotCreated));
    }

    #[tokio::test]
    async fn test_close_runs_closers_in_reverse_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let closers: Vec<Closer> = (0..3)
            .map(|index| {
                let order = Arc::clone(&order);
                let closer: Closer = Box::new(move || {
                    Box::pin(async move {
                        order.lock().push(index);
                        Ok(())
                    })
                });
                closer
            })
            .collect();
        let mock = MockTransport::arc();
        let driver = driver(&mock, closers);
        driver.close().await.expect("close");
        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn test_close_runs_every_closer_despite_failure() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut closers: Vec<Closer> = Vec::new();
        let tail = Arc::clone(&order);
        closers.push(Box::new(move || {
            Box::pin(async move {
                tail.lock().push("first");
                Ok(())
            })
        }));
        closers.push(Box::new(move || {
            Box::pin(async move {
                let result: Result<()> = Err(Error::transport("already gone"));
                result
            })
        }));
        let mock = MockTransport::arc();
        let driver = driver(&mock, closers);
        let err = driver.close().await.expect_err("failure surfaces");
        assert!(err.is_transport_error());
        // The failing closer ran last-acquired-first; the other still ran.
        assert_eq!(*order.lock(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_close_twice_is_idempotent() {
        let mock = MockTransport::arc();
        let driver = driver(&mock, Vec::new());
        driver.close().await.expect("first close");
        driver.close().await.expect("second close");
    }
}
