//! Protocol dialects.
//!
//! The command surface in [`super`] is protocol-agnostic; everywhere the
//! W3C and legacy wire formats disagree, the session defers to its
//! [`Dialect`]. The set of dialects is closed and chosen exactly once,
//! from the browser descriptor, when the session is negotiated.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::actions::ActionChain;
use crate::actions::legacy;
use crate::browsers::ProtocolVariant;
use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};
use crate::transport::Method;

use super::{Element, Rect};

// ============================================================================
// Dialect Trait
// ============================================================================

/// Wire-format differences between W3C and legacy drivers.
#[async_trait]
pub(crate) trait Dialect: Send + Sync {
    /// Endpoint for synchronous script execution.
    fn execute_url(&self) -> &'static str;

    /// Endpoint listing all window handles.
    fn window_handles_url(&self) -> &'static str;

    /// Endpoint returning the current window handle.
    fn window_handle_url(&self) -> &'static str;

    /// Resizes a window.
    async fn set_window_size(
        &self,
        connection: &Connection,
        width: u64,
        height: u64,
        handle: &str,
    ) -> Result<()>;

    /// Reads a window's size as `(width, height)`.
    async fn get_window_size(&self, connection: &Connection, handle: &str) -> Result<(u64, u64)>;

    /// Plays back an action chain.
    async fn perform_actions(&self, connection: &Connection, actions: &ActionChain) -> Result<()>;

    /// Reads an element's bounding rectangle.
    async fn element_rect(&self, element: &Element) -> Result<Rect>;
}

/// Resolves the dialect for a protocol variant.
pub(crate) fn for_variant(variant: ProtocolVariant) -> &'static dyn Dialect {
    match variant {
        ProtocolVariant::W3c => &W3cDialect,
        ProtocolVariant::Legacy => &CompatDialect,
    }
}

#[derive(Deserialize)]
struct SizePayload {
    width: u64,
    height: u64,
}

#[derive(Deserialize)]
struct LocationPayload {
    x: f64,
    y: f64,
}

// ============================================================================
// W3C
// ============================================================================

/// Modern W3C WebDriver command shapes.
struct W3cDialect;

#[async_trait]
impl Dialect for W3cDialect {
    fn execute_url(&self) -> &'static str {
        "/execute/sync"
    }

    fn window_handles_url(&self) -> &'static str {
        "/window/handles"
    }

    fn window_handle_url(&self) -> &'static str {
        "/window"
    }

    async fn set_window_size(
        &self,
        connection: &Connection,
        width: u64,
        height: u64,
        handle: &str,
    ) -> Result<()> {
        connection
            .request(
                Method::Post,
                "/window/rect",
                Some(json!({
                    "width": width,
                    "height": height,
                    "windowHandle": handle,
                })),
            )
            .await?;
        Ok(())
    }

    async fn get_window_size(&self, connection: &Connection, _handle: &str) -> Result<(u64, u64)> {
        let value = connection.request(Method::Get, "/window/rect", None).await?;
        let size: SizePayload = serde_json::from_value(value)?;
        Ok((size.width, size.height))
    }

    async fn perform_actions(&self, connection: &Connection, actions: &ActionChain) -> Result<()> {
        connection
            .request(Method::Post, "/actions", Some(actions.encode()))
            .await?;
        Ok(())
    }

    async fn element_rect(&self, element: &Element) -> Result<Rect> {
        let value = element
            .connection()
            .request(Method::Get, "/rect", None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

// ============================================================================
// Compat
// ============================================================================

/// Legacy JSON Wire Protocol command shapes.
struct CompatDialect;

#[async_trait]
impl Dialect for CompatDialect {
    fn execute_url(&self) -> &'static str {
        "/execute"
    }

    fn window_handles_url(&self) -> &'static str {
        "/window_handles"
    }

    fn window_handle_url(&self) -> &'static str {
        "/window_handle"
    }

    async fn set_window_size(
        &self,
        connection: &Connection,
        width: u64,
        height: u64,
        handle: &str,
    ) -> Result<()> {
        connection
            .request(
                Method::Post,
                &format!("/window/{handle}/size"),
                Some(json!({ "width": width, "height": height })),
            )
            .await?;
        Ok(())
    }

    async fn get_window_size(&self, connection: &Connection, handle: &str) -> Result<(u64, u64)> {
        let value = connection
            .request(Method::Get, &format!("/window/{handle}/size"), None)
            .await?;
        let size: SizePayload = serde_json::from_value(value)?;
        Ok((size.width, size.height))
    }

    /// Legacy drivers have no tick model; the chain is flattened into
    /// one command per action and issued in order.
    async fn perform_actions(&self, connection: &Connection, actions: &ActionChain) -> Result<()> {
        for command in legacy::translate(actions)? {
            connection
                .request(command.method, command.url, Some(command.body))
                .await?;
        }
        Ok(())
    }

    /// Legacy drivers lack `/rect`; position comes from `/location` and
    /// dimensions from computed CSS.
    async fn element_rect(&self, element: &Element) -> Result<Rect> {
        let value = element
            .connection()
            .request(Method::Get, "/location", None)
            .await?;
        let location: LocationPayload = serde_json::from_value(value)?;
        let width = px_to_f64(&element.get_css_value("width").await?)?;
        let height = px_to_f64(&element.get_css_value("height").await?)?;
        Ok(Rect {
            x: location.x,
            y: location.y,
            width,
            height,
        })
    }
}

/// Parses a CSS pixel length such as `"100px"`.
fn px_to_f64(value: &str) -> Result<f64> {
    let digits = value.trim().strip_suffix("px").unwrap_or(value).trim();
    digits.parse().map_err(|_| {
        Error::webdriver(
            ErrorKind::UnknownError,
            format!("cannot parse CSS length {value:?}"),
        )
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_selection_per_dialect() {
        let w3c = for_variant(ProtocolVariant::W3c);
        let compat = for_variant(ProtocolVariant::Legacy);
        assert_eq!(w3c.execute_url(), "/execute/sync");
        assert_eq!(compat.execute_url(), "/execute");
        assert_eq!(w3c.window_handles_url(), "/window/handles");
        assert_eq!(compat.window_handles_url(), "/window_handles");
        assert_eq!(w3c.window_handle_url(), "/window");
        assert_eq!(compat.window_handle_url(), "/window_handle");
    }

    #[test]
    fn test_px_parsing() {
        assert_eq!(px_to_f64("100px").expect("parse"), 100.0);
        assert_eq!(px_to_f64(" 12.5px ").expect("parse"), 12.5);
        assert_eq!(px_to_f64("0").expect("parse"), 0.0);
        assert!(px_to_f64("wide").is_err());
    }
}
