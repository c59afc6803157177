//! Pluggable transport layer.
//!
//! The protocol core never performs IO directly. Everything it needs
//! from the outside world is expressed by two object-safe traits:
//!
//! - [`Transport`] - HTTP round trips, subprocess spawning, sleeping
//! - [`Process`] - handle to a spawned driver process
//!
//! The crate ships one concrete adapter, [`TokioTransport`], built on
//! reqwest and the tokio process/time primitives. Embedders on other
//! runtimes can supply their own implementation; tests inject scripted
//! fakes.

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

mod tokio;

#[cfg(test)]
pub(crate) mod mock;

pub use self::tokio::TokioTransport;

// ============================================================================
// Method
// ============================================================================

/// HTTP verb for a wire command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// DELETE request.
    Delete,
}

impl Method {
    /// Returns the verb as an uppercase string.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if this verb carries a request body.
    #[inline]
    #[must_use]
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

// ============================================================================
// Request / Response
// ============================================================================

/// A single HTTP request handed to the transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Request headers as name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Serialized request body, if any.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    #[inline]
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A transport-level HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Response headers as name/value pairs.
    pub headers: Vec<(String, String)>,
}

impl HttpResponse {
    /// Looks up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` for a 2xx status.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// LogSink
// ============================================================================

/// Destination for a spawned driver's stdout/stderr.
#[derive(Debug, Clone, Default)]
pub enum LogSink {
    /// Discard all output.
    #[default]
    Devnull,
    /// Inherit the caller's stdio.
    Inherit,
    /// Append output to a file.
    File(PathBuf),
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Capability interface the protocol core is written against.
///
/// One transport instance may serve many connections; implementations
/// must be safe to share across tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one HTTP round trip.
    ///
    /// # Errors
    ///
    /// Returns a transport error for network-level failures. HTTP error
    /// statuses are NOT errors at this layer; they come back as a
    /// normal [`HttpResponse`] for the caller to classify.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Spawns a driver process.
    ///
    /// The caller's environment is inherited; `env` holds additional
    /// variables layered on top. Output goes to `log`.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable cannot be launched.
    async fn spawn(
        &self,
        cmd: &[String],
        env: &HashMap<String, String>,
        log: &LogSink,
    ) -> Result<Box<dyn Process>>;

    /// Suspends the current task for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Releases any resources held by the HTTP side of the transport.
    ///
    /// Registered as a closer when a service opens its HTTP session.
    /// The default implementation does nothing; adapters whose clients
    /// clean up on drop need no override.
    async fn finalize(&self) {}
}

// ============================================================================
// Process Trait
// ============================================================================

/// Handle to a spawned driver process.
#[async_trait]
pub trait Process: Send + Sync {
    /// Stops the process and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be reaped.
    async fn stop(&mut self) -> Result<()>;

    /// Returns `true` while the process is still running.
    fn running(&mut self) -> bool;

    /// Returns the exit code, if the process has exited.
    fn exit_code(&mut self) -> Option<i32>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_as_str() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_method_has_body() {
        assert!(Method::Post.has_body());
        assert!(Method::Put.has_body());
        assert!(!Method::Get.has_body());
        assert!(!Method::Delete.has_body());
    }

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::new(Method::Post, "http://localhost:4444/session")
            .header("Accept", "application/json")
            .body(b"{}".to_vec());
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 200,
            body: Vec::new(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        };
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_response_is_success() {
        let ok = HttpResponse {
            status: 204,
            body: Vec::new(),
            headers: Vec::new(),
        };
        let bad = HttpResponse {
            status: 404,
            body: Vec::new(),
            headers: Vec::new(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
