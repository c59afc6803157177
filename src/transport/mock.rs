//! Scripted transport for unit tests.
//!
//! Tests queue responses (or errors) and assert on the recorded
//! requests, sleeps and lifecycle events afterwards. Sleeping is
//! recorded but never actually waits, so deadline-driven tests run
//! instantly.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};

use super::{HttpRequest, HttpResponse, LogSink, Process, Transport};

// ============================================================================
// MockTransport
// ============================================================================

/// Transport double driven by a scripted response queue.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
    sleeps: Mutex<Vec<Duration>>,
    events: Arc<Mutex<Vec<String>>>,
    fail_spawn: AtomicBool,
}

impl MockTransport {
    pub(crate) fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a JSON response.
    pub(crate) fn push_json(&self, status: u16, value: Value) {
        self.push_raw(status, value.to_string().into_bytes());
    }

    /// Queues a raw-body response.
    pub(crate) fn push_raw(&self, status: u16, body: Vec<u8>) {
        self.responses.lock().push_back(Ok(HttpResponse {
            status,
            body,
            headers: vec![(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )],
        }));
    }

    /// Queues a transport-level failure.
    pub(crate) fn push_error(&self, error: Error) {
        self.responses.lock().push_back(Err(error));
    }

    /// Makes every subsequent spawn fail with a not-found IO error, the
    /// shape a missing binary produces on a real transport.
    pub(crate) fn fail_spawn(&self) {
        self.fail_spawn.store(true, Ordering::SeqCst);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

/// Routes crate logs to the test writer, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request);
        match self.responses.lock().pop_front() {
            Some(result) => result,
            // Out of script: keep unscripted calls failing loudly.
            None => Err(Error::transport("mock transport response queue empty")),
        }
    }

    async fn spawn(
        &self,
        cmd: &[String],
        _env: &HashMap<String, String>,
        _log: &LogSink,
    ) -> Result<Box<dyn Process>> {
        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "mock spawn failure",
            )));
        }
        self.events.lock().push(format!("spawn {}", cmd.join(" ")));
        Ok(Box::new(MockProcess {
            events: Arc::clone(&self.events),
            running: true,
        }))
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }

    async fn finalize(&self) {
        self.events.lock().push("http session closed".to_string());
    }
}

// ============================================================================
// MockProcess
// ============================================================================

struct MockProcess {
    events: Arc<Mutex<Vec<String>>>,
    running: bool,
}

#[async_trait]
impl Process for MockProcess {
    async fn stop(&mut self) -> Result<()> {
        self.events.lock().push("process stopped".to_string());
        self.running = false;
        Ok(())
    }

    fn running(&mut self) -> bool {
        self.running
    }

    fn exit_code(&mut self) -> Option<i32> {
        if self.running { None } else { Some(0) }
    }
}
