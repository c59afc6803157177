//! Error types for the WebDriver client.
//!
//! This module defines the crate-wide [`Error`] enum, the closed
//! [`ErrorKind`] taxonomy of WebDriver protocol failures, and the static
//! registry mapping wire-level status codes to kinds.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webdriver_wire::{Result, ErrorKind};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     match session.get_element("#submit", None).await {
//!         Ok(element) => element.click().await,
//!         Err(e) if e.kind() == Some(ErrorKind::NoSuchElement) => Ok(()),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Protocol | [`Error::WebDriver`] (one [`ErrorKind`] per status code) |
//! | Negotiation | [`Error::Negotiation`] |
//! | Actions | [`Error::UnsupportedOperation`], [`Error::ActionConflict`] |
//! | Lifecycle | [`Error::Startup`] |
//! | Waiting | [`Error::WaitTimeout`] |
//! | External | [`Error::Transport`], [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::time::Duration;

use phf::phf_map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorKind
// ============================================================================

/// Closed taxonomy of WebDriver protocol error kinds.
///
/// One kind exists per WebDriver status string; legacy numeric status
/// codes map onto the same set. Codes without a registry entry resolve
/// to [`ErrorKind::UnknownError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Another element would receive the click.
    ElementClickIntercepted,
    /// Element cannot be interacted with in its current state.
    ElementNotInteractable,
    /// Element cannot be selected.
    ElementNotSelectable,
    /// Element is not visible on the page.
    ElementNotVisible,
    /// TLS certificate was rejected.
    InsecureCertificate,
    /// Command arguments were invalid.
    InvalidArgument,
    /// Cookie domain does not match the current document.
    InvalidCookieDomain,
    /// Coordinates supplied to an interaction were invalid.
    InvalidCoordinates,
    /// Element is in an invalid state for the command.
    InvalidElementState,
    /// Selector expression was malformed.
    InvalidSelector,
    /// Session id does not name a known session.
    InvalidSessionId,
    /// Injected script raised an error.
    JavascriptError,
    /// Pointer move target lies outside the viewport.
    MoveTargetOutOfBounds,
    /// No user prompt is currently open.
    NoSuchAlert,
    /// Named cookie does not exist.
    NoSuchCookie,
    /// No element matched the selector.
    NoSuchElement,
    /// Frame reference is unknown.
    NoSuchFrame,
    /// Window handle is unknown.
    NoSuchWindow,
    /// Injected script did not finish in time.
    ScriptTimeout,
    /// New session could not be created.
    SessionNotCreated,
    /// Element reference is no longer attached to the DOM.
    StaleElementReference,
    /// Operation did not complete in time.
    Timeout,
    /// Screenshot capture failed.
    UnableToCaptureScreen,
    /// Cookie could not be set.
    UnableToSetCookie,
    /// A user prompt blocked the command.
    UnexpectedAlertOpen,
    /// Command is not recognized by the remote end.
    UnknownCommand,
    /// Unspecified remote failure, also used for undecodable responses.
    UnknownError,
    /// HTTP method is not valid for the command URL.
    UnknownMethod,
    /// Command is valid but not supported by the remote end.
    UnsupportedOperation,
}

impl ErrorKind {
    /// Returns the canonical W3C status string for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ElementClickIntercepted => "element click intercepted",
            Self::ElementNotInteractable => "element not interactable",
            Self::ElementNotSelectable => "element not selectable",
            Self::ElementNotVisible => "element not visible",
            Self::InsecureCertificate => "insecure certificate",
            Self::InvalidArgument => "invalid argument",
            Self::InvalidCookieDomain => "invalid cookie domain",
            Self::InvalidCoordinates => "invalid coordinates",
            Self::InvalidElementState => "invalid element state",
            Self::InvalidSelector => "invalid selector",
            Self::InvalidSessionId => "invalid session id",
            Self::JavascriptError => "javascript error",
            Self::MoveTargetOutOfBounds => "move target out of bounds",
            Self::NoSuchAlert => "no such alert",
            Self::NoSuchCookie => "no such cookie",
            Self::NoSuchElement => "no such element",
            Self::NoSuchFrame => "no such frame",
            Self::NoSuchWindow => "no such window",
            Self::ScriptTimeout => "script timeout",
            Self::SessionNotCreated => "session not created",
            Self::StaleElementReference => "stale element reference",
            Self::Timeout => "timeout",
            Self::UnableToCaptureScreen => "unable to capture screen",
            Self::UnableToSetCookie => "unable to set cookie",
            Self::UnexpectedAlertOpen => "unexpected alert open",
            Self::UnknownCommand => "unknown command",
            Self::UnknownError => "unknown error",
            Self::UnknownMethod => "unknown method",
            Self::UnsupportedOperation => "unsupported operation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status Registry
// ============================================================================

/// W3C status string registry, populated at compile time.
static STATUS_STRINGS: phf::Map<&'static str, ErrorKind> = phf_map! {
    "element click intercepted" => ErrorKind::ElementClickIntercepted,
    "element not interactable" => ErrorKind::ElementNotInteractable,
    "element not selectable" => ErrorKind::ElementNotSelectable,
    "element not visible" => ErrorKind::ElementNotVisible,
    "insecure certificate" => ErrorKind::InsecureCertificate,
    "invalid argument" => ErrorKind::InvalidArgument,
    "invalid cookie domain" => ErrorKind::InvalidCookieDomain,
    "invalid coordinates" => ErrorKind::InvalidCoordinates,
    "invalid element coordinates" => ErrorKind::InvalidCoordinates,
    "invalid element state" => ErrorKind::InvalidElementState,
    "invalid selector" => ErrorKind::InvalidSelector,
    "invalid session id" => ErrorKind::InvalidSessionId,
    "javascript error" => ErrorKind::JavascriptError,
    "move target out of bounds" => ErrorKind::MoveTargetOutOfBounds,
    "no such alert" => ErrorKind::NoSuchAlert,
    "no such cookie" => ErrorKind::NoSuchCookie,
    "no such element" => ErrorKind::NoSuchElement,
    "no such frame" => ErrorKind::NoSuchFrame,
    "no such window" => ErrorKind::NoSuchWindow,
    "script timeout" => ErrorKind::ScriptTimeout,
    "session not created" => ErrorKind::SessionNotCreated,
    "stale element reference" => ErrorKind::StaleElementReference,
    "timeout" => ErrorKind::Timeout,
    "unable to capture screen" => ErrorKind::UnableToCaptureScreen,
    "unable to set cookie" => ErrorKind::UnableToSetCookie,
    "unexpected alert open" => ErrorKind::UnexpectedAlertOpen,
    "unknown command" => ErrorKind::UnknownCommand,
    "unknown error" => ErrorKind::UnknownError,
    "unknown method" => ErrorKind::UnknownMethod,
    "unsupported operation" => ErrorKind::UnsupportedOperation,
};

/// Legacy JSON Wire Protocol numeric status registry.
static LEGACY_STATUS_CODES: phf::Map<u64, ErrorKind> = phf_map! {
    6u64 => ErrorKind::InvalidSessionId,
    7u64 => ErrorKind::NoSuchElement,
    8u64 => ErrorKind::NoSuchFrame,
    9u64 => ErrorKind::UnknownCommand,
    10u64 => ErrorKind::StaleElementReference,
    11u64 => ErrorKind::ElementNotVisible,
    12u64 => ErrorKind::InvalidElementState,
    13u64 => ErrorKind::UnknownError,
    15u64 => ErrorKind::ElementNotSelectable,
    17u64 => ErrorKind::JavascriptError,
    19u64 => ErrorKind::InvalidSelector,
    21u64 => ErrorKind::Timeout,
    23u64 => ErrorKind::NoSuchWindow,
    24u64 => ErrorKind::InvalidCookieDomain,
    25u64 => ErrorKind::UnableToSetCookie,
    26u64 => ErrorKind::UnexpectedAlertOpen,
    27u64 => ErrorKind::NoSuchAlert,
    28u64 => ErrorKind::ScriptTimeout,
    29u64 => ErrorKind::InvalidCoordinates,
    32u64 => ErrorKind::InvalidSelector,
    33u64 => ErrorKind::SessionNotCreated,
    34u64 => ErrorKind::MoveTargetOutOfBounds,
    51u64 => ErrorKind::InvalidSelector,
    52u64 => ErrorKind::InvalidSelector,
    61u64 => ErrorKind::InvalidArgument,
    62u64 => ErrorKind::NoSuchCookie,
    63u64 => ErrorKind::UnableToCaptureScreen,
    64u64 => ErrorKind::ElementClickIntercepted,
    405u64 => ErrorKind::UnknownMethod,
};

impl ErrorKind {
    /// Looks up a W3C status string, falling back to [`ErrorKind::UnknownError`].
    #[inline]
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        STATUS_STRINGS
            .get(status)
            .copied()
            .unwrap_or(Self::UnknownError)
    }

    /// Looks up a legacy numeric status code, falling back to
    /// [`ErrorKind::UnknownError`].
    #[inline]
    #[must_use]
    pub fn from_legacy_status(code: u64) -> Self {
        LEGACY_STATUS_CODES
            .get(&code)
            .copied()
            .unwrap_or(Self::UnknownError)
    }
}

// ============================================================================
// StackFrame
// ============================================================================

/// One parsed frame of a remote-end stack trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFrame {
    /// Source file name, if reported.
    pub file: Option<String>,
    /// Class name, if reported.
    pub class: Option<String>,
    /// Method or function name, if reported.
    pub method: Option<String>,
    /// Line number, if reported.
    pub line: Option<i64>,
}

impl StackFrame {
    /// Parses stack frames from a remote `stacktrace` payload.
    ///
    /// Remote ends disagree on the shape: W3C drivers send a single
    /// string, legacy drivers send a list of frame objects. Both are
    /// accepted; anything else yields no frames.
    #[must_use]
    pub fn parse(value: &Value) -> Vec<StackFrame> {
        match value {
            Value::String(text) => text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| StackFrame {
                    method: Some(line.trim().to_string()),
                    ..StackFrame::default()
                })
                .collect(),
            Value::Array(frames) => frames
                .iter()
                .filter_map(|frame| frame.as_object())
                .map(|frame| StackFrame {
                    file: frame
                        .get("fileName")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    class: frame
                        .get("className")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    method: frame
                        .get("methodName")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    line: frame.get("lineNumber").and_then(Value::as_i64),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. Protocol
/// failures carry their [`ErrorKind`] plus whatever the remote end
/// supplied alongside the message.
#[derive(Error, Debug)]
pub enum Error {
    /// Protocol-level error reported by the remote end.
    #[error("{kind}: {message}")]
    WebDriver {
        /// Classified error kind from the status registry.
        kind: ErrorKind,
        /// Human-readable message from the remote end.
        message: String,
        /// Decoded screenshot bytes, if the remote end attached one.
        screen: Option<Vec<u8>>,
        /// Parsed stack frames, if the remote end attached a trace.
        stacktrace: Vec<StackFrame>,
    },

    /// Session negotiation failed.
    ///
    /// Returned when `POST /session` yields a malformed response or the
    /// capabilities could not be matched.
    #[error("Session negotiation failed: {message}")]
    Negotiation {
        /// Description of the negotiation failure.
        message: String,
    },

    /// The legacy protocol cannot express the requested action.
    #[error("Operation not supported: {message}")]
    UnsupportedOperation {
        /// Description of the unsupported operation.
        message: String,
    },

    /// Two merged ticks assign an action to the same device.
    #[error("Conflicting actions for device {device}")]
    ActionConflict {
        /// Identity of the conflicting device.
        device: String,
    },

    /// Driver process failed to launch or never became healthy.
    #[error("Service did not start: {message}")]
    Startup {
        /// Description of the start-up failure.
        message: String,
    },

    /// Wait deadline elapsed without the condition holding.
    #[error("Wait timed out after {timeout:?}")]
    WaitTimeout {
        /// The configured timeout.
        timeout: Duration,
        /// Last retryable error observed before the deadline, if any.
        #[source]
        source: Option<Box<Error>>,
    },

    /// Transport-level failure (connection refused, DNS, socket timeout).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a protocol error with no screenshot or stack trace.
    #[inline]
    pub fn webdriver(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::WebDriver {
            kind,
            message: message.into(),
            screen: None,
            stacktrace: Vec::new(),
        }
    }

    /// Creates a session negotiation error.
    #[inline]
    pub fn negotiation(message: impl Into<String>) -> Self {
        Self::Negotiation {
            message: message.into(),
        }
    }

    /// Creates an operation-not-supported error.
    #[inline]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Creates a start-up error.
    #[inline]
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the protocol error kind, if this is a protocol error.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::WebDriver { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns `true` if this is a protocol error of the given kind.
    #[inline]
    #[must_use]
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Returns `true` if this is a timeout of any flavor.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
            || matches!(
                self.kind(),
                Some(ErrorKind::Timeout | ErrorKind::ScriptTimeout)
            )
    }

    /// Returns `true` if this is a transport-level failure.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Io(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
