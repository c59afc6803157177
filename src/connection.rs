//! Request framing and error mapping.
//!
//! [`Connection`] wraps a shared [`Transport`] plus a URL prefix. It
//! turns structured commands into JSON-over-HTTP requests, decodes the
//! response body, classifies protocol failures through the status
//! registry and unwraps element references.
//!
//! Connections are cheap immutable values: [`Connection::prefixed`]
//! derives a new connection addressing a nested resource (a session, an
//! element) while sharing the underlying transport. Prefixing is
//! associative: `conn.prefixed(a).prefixed(b)` addresses the same
//! resource as `conn.prefixed(a + b)`.
//!
//! A connection never retries. Retry belongs to the wait primitive.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result, StackFrame};
use crate::transport::{HttpRequest, Method, Transport};

// ============================================================================
// Constants
// ============================================================================

/// W3C element reference key.
pub const WEB_ELEMENT: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Legacy element reference key.
pub const LEGACY_ELEMENT: &str = "ELEMENT";

/// User-Agent header sent with every command.
const USER_AGENT: &str = concat!("webdriver-wire/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Connection
// ============================================================================

/// A transport session plus a URL prefix.
#[derive(Clone)]
pub struct Connection {
    /// Shared transport.
    transport: Arc<dyn Transport>,
    /// Absolute URL prefix all command URLs are appended to.
    prefix: String,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection rooted at `prefix`.
    #[inline]
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, prefix: impl Into<String>) -> Self {
        Self {
            transport,
            prefix: prefix.into(),
        }
    }

    /// Returns a new connection with `suffix` appended to the prefix.
    ///
    /// The transport is shared; no new connection is opened.
    #[inline]
    #[must_use]
    pub fn prefixed(&self, suffix: &str) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            prefix: format!("{}{}", self.prefix, suffix),
        }
    }

    /// Returns the URL prefix.
    #[inline]
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the shared transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

// ============================================================================
// Connection - Requests
// ============================================================================

impl Connection {
    /// Issues a command and returns the unwrapped `value` payload.
    ///
    /// # Errors
    ///
    /// Transport failures propagate unmodified; protocol failures are
    /// classified through the status registry.
    pub async fn request(&self, method: Method, url: &str, body: Option<Value>) -> Result<Value> {
        let payload = self.request_full(method, url, body).await?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);
        Ok(unwrap(value))
    }

    /// Issues a command and returns the whole classified payload.
    ///
    /// Used where the caller needs fields outside `value`, notably
    /// session negotiation.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::request`].
    pub async fn request_full(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.prefix, url);
        debug!(method = method.as_str(), url = %url, "Sending command");

        let mut request = HttpRequest::new(method, &url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);
        // Bodies are only honored for POST/PUT.
        if method.has_body() {
            let body = body.unwrap_or_else(|| json!({}));
            request = request
                .header("Content-Type", "application/json;charset=UTF-8")
                .body(serde_json::to_vec(&body)?);
        }

        let response = self.transport.send(request).await?;
        let mut payload = decode_body(response.status, &response.body);
        let screen = extract_screen(&mut payload);
        classify(response.status, &payload, screen)?;
        Ok(payload)
    }
}

// ============================================================================
// Body Decoding
// ============================================================================

/// Decodes a response body into a protocol payload.
///
/// A body that is not valid JSON never raises: it is folded into a
/// placeholder payload so the error pipeline downstream stays uniform.
/// Successful statuses with a non-JSON body pass the raw text through
/// as the value.
fn decode_body(status: u16, body: &[u8]) -> Value {
    let text: String = String::from_utf8_lossy(body).replace('\0', "");
    let text = text.trim();

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut data)) => {
            // Some drivers incorrectly omit the value field entirely.
            data.entry("value").or_insert(Value::Null);
            Value::Object(data)
        }
        Ok(other) => json!({ "status": 0, "value": other }),
        Err(_) if (200..300).contains(&status) => json!({ "status": 0, "value": text }),
        Err(_) => json!({
            "status": 13,
            "value": { "message": text },
        }),
    }
}

/// Pulls a base64 screenshot out of an error payload, if present.
///
/// Screenshots ride along inside `value.screen` and must not be
/// inspected as error text, so they are decoded and removed before
/// classification.
fn extract_screen(payload: &mut Value) -> Option<Vec<u8>> {
    let screen = payload.get_mut("value")?.as_object_mut()?.remove("screen")?;
    BASE64.decode(screen.as_str()?).ok()
}

// ============================================================================
// Classification
// ============================================================================

/// Classifies a decoded payload, raising a registry-typed error.
///
/// A response is an error when the HTTP status is 400 or above, or
/// when the payload carries a non-zero legacy `status` field. Both the
/// flat W3C error object shape and the nested legacy shape are
/// understood.
fn classify(http_status: u16, payload: &Value, screen: Option<Vec<u8>>) -> Result<()> {
    let legacy_status = payload.get("status").and_then(Value::as_u64).unwrap_or(0);
    if http_status < 400 && legacy_status == 0 {
        return Ok(());
    }

    let value = payload.get("value").unwrap_or(&Value::Null);

    // W3C shape: {value: {error, message, stacktrace}}.
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(error)
            .to_string();
        let stacktrace = value
            .get("stacktrace")
            .map(StackFrame::parse)
            .unwrap_or_default();
        return Err(Error::WebDriver {
            kind: ErrorKind::from_status(error),
            message,
            screen,
            stacktrace,
        });
    }

    // Legacy shape: numeric status with nested value.
    let kind = if legacy_status != 0 {
        ErrorKind::from_legacy_status(legacy_status)
    } else {
        ErrorKind::from_legacy_status(u64::from(http_status))
    };
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| value_as_text(value));
    let stacktrace = value
        .get("stackTrace")
        .or_else(|| value.get("stacktrace"))
        .map(StackFrame::parse)
        .unwrap_or_default();

    Err(Error::WebDriver {
        kind,
        message,
        screen,
        stacktrace,
    })
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Unwrap
// ============================================================================

/// Unwraps element references out of a response value.
///
/// An object carrying an element reference key resolves to the bare
/// element id; lists unwrap element-wise; everything else passes
/// through unchanged.
#[must_use]
pub fn unwrap(value: Value) -> Value {
    match value {
        Value::Object(ref map) => map
            .get(WEB_ELEMENT)
            .or_else(|| map.get(LEGACY_ELEMENT))
            .cloned()
            .unwrap_or(value),
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap).collect()),
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::transport::mock::MockTransport;

    fn connection(mock: &Arc<MockTransport>) -> Connection {
        Connection::new(
            Arc::clone(mock) as Arc<dyn Transport>,
            "http://localhost:4444",
        )
    }

    #[test]
    fn test_prefixed_shares_transport() {
        let mock = MockTransport::arc();
        let conn = connection(&mock);
        let session = conn.prefixed("/session/abc");
        assert_eq!(session.url_prefix(), "http://localhost:4444/session/abc");
        assert!(Arc::ptr_eq(
            &(Arc::clone(conn.transport())),
            &(Arc::clone(session.transport()))
        ));
    }

    proptest! {
        #[test]
        fn test_prefixing_is_associative(a in "/[a-z0-9/]{0,12}", b in "/[a-z0-9/]{0,12}") {
            let mock = MockTransport::arc();
            let conn = connection(&mock);
            let split = conn.prefixed(&a).prefixed(&b);
            let joined = conn.prefixed(&format!("{a}{b}"));
            prop_assert_eq!(split.url_prefix(), joined.url_prefix());
        }
    }

    #[tokio::test]
    async fn test_request_unwraps_value() {
        let mock = MockTransport::arc();
        mock.push_json(200, serde_json::json!({"value": {WEB_ELEMENT: "elem-1"}}));
        let conn = connection(&mock);
        let value = conn
            .request(Method::Post, "/element", Some(serde_json::json!({})))
            .await
            .expect("request");
        assert_eq!(value, serde_json::json!("elem-1"));
    }

    #[tokio::test]
    async fn test_request_builds_url_from_prefix() {
        let mock = MockTransport::arc();
        mock.push_json(200, serde_json::json!({"value": null}));
        let conn = connection(&mock).prefixed("/session/abc");
        conn.request(Method::Get, "/url", None).await.expect("request");
        let requests = mock.requests();
        assert_eq!(requests[0].url, "http://localhost:4444/session/abc/url");
    }

    #[tokio::test]
    async fn test_get_requests_carry_no_body() {
        let mock = MockTransport::arc();
        mock.push_json(200, serde_json::json!({"value": null}));
        let conn = connection(&mock);
        conn.request(Method::Get, "/status", Some(serde_json::json!({"x": 1})))
            .await
            .expect("request");
        assert!(mock.requests()[0].body.is_none());
    }

    #[tokio::test]
    async fn test_w3c_error_is_classified() {
        let mock = MockTransport::arc();
        mock.push_json(
            404,
            serde_json::json!({
                "value": {
                    "error": "no such element",
                    "message": "Unable to locate element",
                    "stacktrace": "at findElement",
                }
            }),
        );
        let conn = connection(&mock);
        let err = conn
            .request(Method::Post, "/element", None)
            .await
            .expect_err("should classify");
        assert!(err.is_kind(ErrorKind::NoSuchElement));
        assert!(err.to_string().contains("Unable to locate element"));
    }

    #[tokio::test]
    async fn test_legacy_error_is_classified() {
        let mock = MockTransport::arc();
        mock.push_json(
            200,
            serde_json::json!({
                "status": 10,
                "value": {"message": "element is stale"},
            }),
        );
        let conn = connection(&mock);
        let err = conn
            .request(Method::Get, "/text", None)
            .await
            .expect_err("should classify");
        assert!(err.is_kind(ErrorKind::StaleElementReference));
    }

    #[tokio::test]
    async fn test_malformed_body_yields_typed_error() {
        let mock = MockTransport::arc();
        mock.push_raw(500, b"<html>Internal Server Error</html>".to_vec());
        let conn = connection(&mock);
        let err = conn
            .request(Method::Get, "/url", None)
            .await
            .expect_err("should classify");
        assert!(err.is_kind(ErrorKind::UnknownError));
    }

    #[tokio::test]
    async fn test_malformed_body_on_success_passes_through() {
        let mock = MockTransport::arc();
        mock.push_raw(200, b"not json".to_vec());
        let conn = connection(&mock);
        let value = conn.request(Method::Get, "/url", None).await.expect("ok");
        assert_eq!(value, serde_json::json!("not json"));
    }

    #[tokio::test]
    async fn test_screenshot_is_decoded_not_inspected() {
        let mock = MockTransport::arc();
        let screen = BASE64.encode(b"\x89PNGdata");
        mock.push_json(
            500,
            serde_json::json!({
                "status": 13,
                "value": {"message": "boom", "screen": screen},
            }),
        );
        let conn = connection(&mock);
        let err = conn
            .request(Method::Post, "/click", None)
            .await
            .expect_err("should classify");
        match err {
            Error::WebDriver { screen, message, .. } => {
                assert_eq!(screen.as_deref(), Some(&b"\x89PNGdata"[..]));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_propagates_unmodified() {
        let mock = MockTransport::arc();
        mock.push_error(Error::transport("connection refused"));
        let conn = connection(&mock);
        let err = conn
            .request(Method::Get, "/status", None)
            .await
            .expect_err("should propagate");
        assert!(err.is_transport_error());
    }

    #[test]
    fn test_unwrap_is_recursive() {
        let value = serde_json::json!([
            {WEB_ELEMENT: "a"},
            {LEGACY_ELEMENT: "b"},
            [{WEB_ELEMENT: "c"}],
        ]);
        assert_eq!(unwrap(value), serde_json::json!(["a", "b", ["c"]]));
    }

    #[test]
    fn test_unwrap_passes_scalars_through() {
        assert_eq!(unwrap(serde_json::json!(42)), serde_json::json!(42));
        assert_eq!(
            unwrap(serde_json::json!({"width": 10})),
            serde_json::json!({"width": 10})
        );
    }

    #[test]
    fn test_decode_body_inserts_missing_value() {
        let payload = decode_body(200, br#"{"sessionId": "abc"}"#);
        assert_eq!(payload.get("value"), Some(&Value::Null));
    }
}
