//! webdriver-wire - Async WebDriver protocol client.
//!
//! This library speaks the WebDriver wire protocol (JSON over HTTP) to
//! drive real browsers through their driver binaries: geckodriver,
//! chromedriver, PhantomJS, or a remote Selenium-style hub.
//!
//! # Architecture
//!
//! The protocol core is runtime-agnostic and performs no IO of its own:
//!
//! - **Core**: request framing, error classification, sessions,
//!   elements, action chains, readiness probing
//! - **Transport**: everything touching the network or the OS, behind
//!   the [`Transport`] capability trait
//!
//! Key design principles:
//!
//! - One [`Connection`] per protocol resource; nested resources derive
//!   prefixed connections sharing the same transport
//! - Protocol failures map to a closed [`ErrorKind`] taxonomy through a
//!   compile-time status registry
//! - W3C and legacy drivers share one command surface; wire differences
//!   are confined to an internal dialect chosen at session creation
//! - Everything acquired during start-up is released in reverse order
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use webdriver_wire::{Browser, Geckodriver, Result, Service};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Spawn geckodriver and wait for it to become ready
//!     let driver = Geckodriver::new().start().await?;
//!     let session = driver.new_session(&Browser::firefox(), "").await?;
//!
//!     // Navigate and interact
//!     session.get("https://example.com").await?;
//!     let heading = session.wait_for_element(Duration::from_secs(5), "h1").await?;
//!     println!("{}", heading.get_text().await?);
//!
//!     session.close().await?;
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`actions`] | Multi-device input gestures: [`Pointer`], [`Keyboard`], ticks |
//! | [`browsers`] | Browser descriptors and protocol variants |
//! | [`connection`] | Request framing and error mapping (internal plumbing) |
//! | [`driver`] | Driver root handle and session negotiation |
//! | [`error`] | Error types, [`ErrorKind`] taxonomy, [`Result`] alias |
//! | [`keys`] | Special-key constants for typing |
//! | [`service`] | Driver lifecycle: spawn, probe, teardown |
//! | [`session`] | Session and element command surface |
//! | [`transport`] | Transport capability traits and the tokio adapter |
//! | [`wait`] | Deadline-based polling primitive |

// ============================================================================
// Modules
// ============================================================================

/// Multi-device input gestures.
///
/// Build [`Tick`]s from [`Pointer`] and [`Keyboard`] devices and
/// assemble them with [`actions::chain`].
pub mod actions;

/// Browser descriptors.
///
/// Pure data: desired capabilities plus the protocol variant the
/// matching driver speaks.
pub mod browsers;

/// Request framing and error mapping.
///
/// Mostly internal; exposed for embedders implementing their own
/// service layer on top of a [`Connection`].
pub mod connection;

/// Driver root handle.
///
/// A [`Driver`] negotiates sessions and owns the teardown closers.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Special-key constants for typing.
pub mod keys;

/// Driver service lifecycle.
///
/// [`Geckodriver`], [`Chromedriver`], [`PhantomJs`] spawn a local
/// driver binary; [`Remote`] attaches to a running endpoint.
pub mod service;

/// Session and element command surface.
pub mod session;

/// Pluggable transport layer.
///
/// The [`Transport`] trait is the crate's only source of IO; the
/// shipped implementation is [`TokioTransport`].
pub mod transport;

/// Deadline-based polling primitive.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Action types
pub use actions::{ActionChain, Button, Keyboard, Pointer, PointerType, Tick};

// Browser descriptors
pub use browsers::{Browser, ProtocolVariant};

// Connection
pub use connection::Connection;

// Driver
pub use driver::Driver;

// Error types
pub use error::{Error, ErrorKind, Result};

// Services
pub use service::{BasicAuth, Chromedriver, Geckodriver, PhantomJs, Remote, Service};

// Session types
pub use session::{Cookie, Element, Rect, SelectorType, Session};

// Transport types
pub use transport::{LogSink, TokioTransport, Transport};
