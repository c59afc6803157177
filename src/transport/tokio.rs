//! Tokio-backed transport adapter.
//!
//! [`TokioTransport`] is the default [`Transport`] implementation:
//! reqwest for HTTP, `tokio::process` for driver subprocesses and
//! `tokio::time` for sleeping. Nothing outside this file touches
//! reqwest or tokio process types.

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{Error, Result};

use super::{HttpRequest, HttpResponse, LogSink, Method, Process, Transport};

/// Per-request socket timeout enforced by the HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// TokioTransport
// ============================================================================

/// Default transport built on reqwest and tokio.
#[derive(Debug, Clone)]
pub struct TokioTransport {
    /// Shared HTTP client. reqwest clients are internally pooled.
    client: reqwest::Client,
}

impl TokioTransport {
    /// Creates a transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_headers(&[])
    }

    /// Creates a transport that attaches `headers` to every request.
    ///
    /// Used by remote services to carry an authentication header.
    ///
    /// # Errors
    ///
    /// Returns a transport error if a header name or value is invalid,
    /// or if the HTTP client cannot be built.
    pub fn with_headers(headers: &[(String, String)]) -> Result<Self> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::transport(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::transport(format!("invalid header value: {e}")))?;
            header_map.insert(name, value);
        }
        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for TokioTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }

    async fn spawn(
        &self,
        cmd: &[String],
        env: &HashMap<String, String>,
        log: &LogSink,
    ) -> Result<Box<dyn Process>> {
        let (program, args) = cmd
            .split_first()
            .ok_or_else(|| Error::startup("empty command line"))?;

        let mut command = Command::new(program);
        command.args(args).envs(env).stdin(Stdio::null());

        match log {
            LogSink::Devnull => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
            LogSink::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            LogSink::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                command
                    .stdout(Stdio::from(file.try_clone()?))
                    .stderr(Stdio::from(file));
            }
        }

        debug!(program = %program, args = ?args, "Spawning driver process");
        let child = command.spawn()?;
        Ok(Box::new(TokioProcess { child }))
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// TokioProcess
// ============================================================================

/// Process handle wrapping a tokio child.
struct TokioProcess {
    child: Child,
}

#[async_trait]
impl Process for TokioProcess {
    async fn stop(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child.start_kill()?;
        let status = self.child.wait().await?;
        debug!(status = ?status.code(), "Driver process stopped");
        Ok(())
    }

    fn running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn exit_code(&mut self) -> Option<i32> {
        self.child.try_wait().ok().flatten().and_then(|s| s.code())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_builds_with_default_settings() {
        let transport = TokioTransport::new();
        assert!(transport.is_ok());
    }

    #[test]
    fn test_transport_builds_with_auth_header() {
        let transport = TokioTransport::with_headers(&[(
            "Authorization".to_string(),
            "Basic dXNlcjpwYXNz".to_string(),
        )]);
        assert!(transport.is_ok());
    }

    #[test]
    fn test_transport_rejects_invalid_header_name() {
        let transport =
            TokioTransport::with_headers(&[("bad header".to_string(), "x".to_string())]);
        assert!(transport.is_err());
    }

    #[tokio::test]
    async fn test_spawn_rejects_empty_command() {
        let transport = TokioTransport::new().expect("transport");
        let result = transport
            .spawn(&[], &HashMap::new(), &LogSink::Devnull)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_spawn_and_stop_process() {
        let transport = TokioTransport::new().expect("transport");
        let cmd = vec!["sleep".to_string(), "30".to_string()];
        let mut process = transport
            .spawn(&cmd, &HashMap::new(), &LogSink::Devnull)
            .await
            .expect("spawn sleep");
        assert!(process.running());
        process.stop().await.expect("stop");
        assert!(!process.running());
    }

    #[tokio::test]
    async fn test_sleep_resolves() {
        let transport = TokioTransport::new().expect("transport");
        transport.sleep(Duration::from_millis(1)).await;
    }
}
