//! Session and element command surface.
//!
//! A [`Session`] owns a [`Connection`] scoped to `/session/{id}` and
//! exposes the WebDriver command set as typed async methods. Element
//! lookups return [`Element`] handles whose connections are scoped one
//! level deeper, to `/element/{id}`.
//!
//! Wire-format differences between W3C and legacy drivers live in the
//! [`dialect`] submodule; the dialect is fixed at session creation from
//! the browser descriptor and consulted where the formats diverge.
//!
//! # Example
//!
//! ```ignore
//! session.get("/login").await?;
//! let field = session.get_element("input[name=user]").await?;
//! field.send_keys("admin").await?;
//! field.send_keys(keys::ENTER).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::actions::ActionChain;
use crate::browsers::ProtocolVariant;
use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};
use crate::transport::Method;
use crate::wait::wait;

pub(crate) mod dialect;

use self::dialect::Dialect;

// ============================================================================
// SelectorType
// ============================================================================

/// Element location strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorType {
    /// CSS selector (the default).
    #[default]
    Css,
    /// XPath expression.
    XPath,
    /// Exact link text.
    LinkText,
    /// Substring of link text.
    PartialLinkText,
    /// Tag name.
    TagName,
}

impl SelectorType {
    /// Returns the wire name of the strategy.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css selector",
            Self::XPath => "xpath",
            Self::LinkText => "link text",
            Self::PartialLinkText => "partial link text",
            Self::TagName => "tag name",
        }
    }
}

// ============================================================================
// Rect / Cookie
// ============================================================================

/// Bounding rectangle of an element or window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate in CSS pixels.
    pub x: f64,
    /// Y coordinate in CSS pixels.
    pub y: f64,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

/// A cookie to install via [`Session::add_cookie`].
///
/// Optional fields are omitted from the wire payload when unset, so the
/// driver applies its own defaults.
#[derive(Debug, Clone, Serialize)]
pub struct Cookie {
    name: String,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry: Option<i64>,
}

impl Cookie {
    /// Creates a cookie with only a name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: None,
            expiry: None,
        }
    }

    /// Sets the cookie path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the cookie domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Marks the cookie secure.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Sets the expiry as a Unix timestamp.
    #[must_use]
    pub fn expiry(mut self, expiry: i64) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

// ============================================================================
// Session
// ============================================================================

/// A negotiated WebDriver session.
///
/// Commands within one session must be issued one at a time: each call
/// is awaited to completion before the next is sent. The session does
/// not serialize concurrent callers internally; overlapping commands
/// against the same remote session have undefined interleaving at the
/// driver. Independent sessions can be driven concurrently.
pub struct Session {
    connection: Connection,
    bind: String,
    variant: ProtocolVariant,
    dialect: &'static dyn Dialect,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.connection.url_prefix())
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        connection: Connection,
        variant: ProtocolVariant,
        bind: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            bind: bind.into(),
            variant,
            dialect: dialect::for_variant(variant),
        }
    }

    /// Navigates to `url`, prepending the session's bind prefix.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get(&self, url: &str) -> Result<()> {
        let target = format!("{}{}", self.bind, url);
        debug!(url = %target, "Navigating");
        self.connection
            .request(Method::Post, "/url", Some(json!({ "url": target })))
            .await?;
        Ok(())
    }

    /// Returns the current URL.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_url(&self) -> Result<String> {
        let value = self.connection.request(Method::Get, "/url", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the page source.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_page_source(&self) -> Result<String> {
        let value = self.connection.request(Method::Get, "/source", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Finds one element by CSS selector.
    ///
    /// # Errors
    ///
    /// Returns a `no such element` error if nothing matches.
    pub async fn get_element(&self, selector: &str) -> Result<Element> {
        self.get_element_by(selector, SelectorType::Css).await
    }

    /// Finds one element with an explicit location strategy.
    ///
    /// # Errors
    ///
    /// Returns a `no such element` error if nothing matches.
    pub async fn get_element_by(
        &self,
        selector: &str,
        selector_type: SelectorType,
    ) -> Result<Element> {
        let value = self
            .connection
            .request(
                Method::Post,
                "/element",
                Some(json!({
                    "using": selector_type.as_str(),
                    "value": selector,
                })),
            )
            .await?;
        let id: String = serde_json::from_value(value)?;
        Ok(self.create_element(id))
    }

    /// Finds all elements matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors. No match is an empty list,
    /// not an error.
    pub async fn get_elements(&self, selector: &str) -> Result<Vec<Element>> {
        self.get_elements_by(selector, SelectorType::Css).await
    }

    /// Finds all elements with an explicit location strategy.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_elements_by(
        &self,
        selector: &str,
        selector_type: SelectorType,
    ) -> Result<Vec<Element>> {
        let value = self
            .connection
            .request(
                Method::Post,
                "/elements",
                Some(json!({
                    "using": selector_type.as_str(),
                    "value": selector,
                })),
            )
            .await?;
        let ids: Vec<String> = serde_json::from_value(value)?;
        Ok(ids.into_iter().map(|id| self.create_element(id)).collect())
    }

    /// Polls for an element until it appears or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns a wait-timeout error chaining the last `no such element`
    /// error once the deadline passes.
    pub async fn wait_for_element(&self, timeout: Duration, selector: &str) -> Result<Element> {
        wait(
            self.connection.transport().as_ref(),
            timeout,
            move || async move { self.get_element(selector).await.map(Some) },
            &[ErrorKind::NoSuchElement],
        )
        .await
    }

    /// Polls until no element matches `selector` or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns a wait-timeout error once the deadline passes.
    pub async fn wait_for_element_gone(&self, timeout: Duration, selector: &str) -> Result<()> {
        wait(
            self.connection.transport().as_ref(),
            timeout,
            move || async move {
                match self.get_element(selector).await {
                    Ok(_) => Ok(None),
                    Err(err) if err.is_kind(ErrorKind::NoSuchElement) => Ok(Some(())),
                    Err(err) => Err(err),
                }
            },
            &[],
        )
        .await
    }

    /// Installs a cookie.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        self.connection
            .request(Method::Post, "/cookie", Some(json!({ "cookie": cookie })))
            .await?;
        Ok(())
    }

    /// Returns a cookie by name.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_cookie(&self, name: &str) -> Result<Value> {
        self.connection
            .request(Method::Get, &format!("/cookie/{name}"), None)
            .await
    }

    /// Returns all cookies visible to the current page.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_all_cookies(&self) -> Result<Value> {
        self.connection.request(Method::Get, "/cookie", None).await
    }

    /// Deletes a cookie by name.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.connection
            .request(Method::Delete, &format!("/cookie/{name}"), None)
            .await?;
        Ok(())
    }

    /// Deletes all cookies.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn delete_all_cookies(&self) -> Result<()> {
        self.connection
            .request(Method::Delete, "/cookie", None)
            .await?;
        Ok(())
    }

    /// Executes synchronous JavaScript in the page.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors, including `javascript error`
    /// for script failures.
    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.connection
            .request(
                Method::Post,
                self.dialect.execute_url(),
                Some(json!({ "script": script, "args": args })),
            )
            .await
    }

    /// Resizes the current window.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn set_window_size(&self, width: u64, height: u64) -> Result<()> {
        self.dialect
            .set_window_size(&self.connection, width, height, "current")
            .await
    }

    /// Returns the current window size as `(width, height)`.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_window_size(&self) -> Result<(u64, u64)> {
        self.dialect
            .get_window_size(&self.connection, "current")
            .await
    }

    /// Returns the text of the open alert.
    ///
    /// # Errors
    ///
    /// Returns a `no such alert` error if no alert is open.
    pub async fn get_alert_text(&self) -> Result<String> {
        let value = self
            .connection
            .request(Method::Get, "/alert/text", None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Types into the open prompt.
    ///
    /// # Errors
    ///
    /// Returns a `no such alert` error if no alert is open.
    pub async fn send_alert_text(&self, text: &str) -> Result<()> {
        self.connection
            .request(Method::Post, "/alert/text", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    /// Dismisses the open alert.
    ///
    /// # Errors
    ///
    /// Returns a `no such alert` error if no alert is open.
    pub async fn dismiss_alert(&self) -> Result<()> {
        self.connection
            .request(Method::Post, "/alert/dismiss", None)
            .await?;
        Ok(())
    }

    /// Accepts the open alert.
    ///
    /// # Errors
    ///
    /// Returns a `no such alert` error if no alert is open.
    pub async fn accept_alert(&self) -> Result<()> {
        self.connection
            .request(Method::Post, "/alert/accept", None)
            .await?;
        Ok(())
    }

    /// Plays back an action chain through the session's dialect.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors; legacy sessions additionally
    /// return operation-not-supported for actions the old protocol
    /// cannot express.
    pub async fn perform_actions(&self, actions: &ActionChain) -> Result<()> {
        self.dialect.perform_actions(&self.connection, actions).await
    }

    /// Captures a screenshot of the current page as PNG bytes.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_screenshot(&self) -> Result<Vec<u8>> {
        let value = self
            .connection
            .request(Method::Get, "/screenshot", None)
            .await?;
        let encoded: String = serde_json::from_value(value)?;
        BASE64.decode(encoded.as_bytes()).map_err(|err| {
            Error::webdriver(
                ErrorKind::UnknownError,
                format!("invalid screenshot payload: {err}"),
            )
        })
    }

    /// Ends the session on the driver side.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn close(self) -> Result<()> {
        self.connection.request(Method::Delete, "", None).await?;
        Ok(())
    }

    /// Returns all window handles.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_window_handles(&self) -> Result<Vec<String>> {
        let value = self
            .connection
            .request(Method::Get, self.dialect.window_handles_url(), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the current window handle.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_window_handle(&self) -> Result<String> {
        let value = self
            .connection
            .request(Method::Get, self.dialect.window_handle_url(), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Switches to another window.
    ///
    /// Both the W3C and the legacy key are sent so either flavor of
    /// driver accepts the request.
    ///
    /// # Errors
    ///
    /// Returns a `no such window` error for an unknown handle.
    pub async fn switch_to_window(&self, handle: &str) -> Result<()> {
        self.connection
            .request(
                Method::Post,
                "/window",
                Some(json!({ "handle": handle, "name": handle })),
            )
            .await?;
        Ok(())
    }

    fn create_element(&self, id: String) -> Element {
        Element::new(id, self.connection.clone(), self.variant)
    }
}

// ============================================================================
// Element
// ============================================================================

/// A handle to an element within a session.
pub struct Element {
    id: String,
    connection: Connection,
    session: Connection,
    variant: ProtocolVariant,
    dialect: &'static dyn Dialect,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Element {
    /// `session` is the session-scoped connection; the element derives
    /// its own connection one level deeper and keeps the session one
    /// around for nested lookups.
    pub(crate) fn new(id: String, session: Connection, variant: ProtocolVariant) -> Self {
        let connection = session.prefixed(&format!("/element/{id}"));
        Self {
            id,
            connection,
            session,
            variant,
            dialect: dialect::for_variant(variant),
        }
    }

    /// Returns the driver-assigned element id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the rendered text.
    ///
    /// # Errors
    ///
    /// Returns a `stale element reference` error once the element has
    /// left the document.
    pub async fn get_text(&self) -> Result<String> {
        let value = self.connection.request(Method::Get, "/text", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Types into the element.
    ///
    /// Both the W3C `text` field and the legacy `value` character list
    /// are sent so either flavor of driver accepts the request.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn send_keys(&self, keys: &str) -> Result<()> {
        let chars: Vec<String> = keys.chars().map(String::from).collect();
        self.connection
            .request(
                Method::Post,
                "/value",
                Some(json!({ "value": chars, "text": keys })),
            )
            .await?;
        Ok(())
    }

    /// Clears the element's value.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn clear(&self) -> Result<()> {
        self.connection.request(Method::Post, "/clear", None).await?;
        Ok(())
    }

    /// Clicks the element.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn click(&self) -> Result<()> {
        self.connection.request(Method::Post, "/click", None).await?;
        Ok(())
    }

    /// Returns `true` if the element is displayed.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn is_displayed(&self) -> Result<bool> {
        let value = self
            .connection
            .request(Method::Get, "/displayed", None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns `true` if the element is enabled.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn is_enabled(&self) -> Result<bool> {
        let value = self
            .connection
            .request(Method::Get, "/enabled", None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns an attribute value, or `None` if the attribute is unset.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .connection
            .request(Method::Get, &format!("/attribute/{name}"), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns a computed CSS property value.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_css_value(&self, name: &str) -> Result<String> {
        let value = self
            .connection
            .request(Method::Get, &format!("/css/{name}"), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Clicks the `<option>` child with the given value.
    ///
    /// # Errors
    ///
    /// Returns a `no such element` error if no option matches.
    pub async fn select_by_value(&self, value: &str) -> Result<()> {
        let selector = format!("option[value={}]", escape_value(value));
        let option = self.get_element(&selector).await?;
        option.click().await
    }

    /// Finds one descendant element by CSS selector.
    ///
    /// # Errors
    ///
    /// Returns a `no such element` error if nothing matches.
    pub async fn get_element(&self, selector: &str) -> Result<Element> {
        self.get_element_by(selector, SelectorType::Css).await
    }

    /// Finds one descendant element with an explicit location strategy.
    ///
    /// # Errors
    ///
    /// Returns a `no such element` error if nothing matches.
    pub async fn get_element_by(
        &self,
        selector: &str,
        selector_type: SelectorType,
    ) -> Result<Element> {
        let value = self
            .connection
            .request(
                Method::Post,
                "/element",
                Some(json!({
                    "using": selector_type.as_str(),
                    "value": selector,
                })),
            )
            .await?;
        let id: String = serde_json::from_value(value)?;
        Ok(Element::new(id, self.session.clone(), self.variant))
    }

    /// Finds all descendant elements matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_elements(&self, selector: &str) -> Result<Vec<Element>> {
        self.get_elements_by(selector, SelectorType::Css).await
    }

    /// Finds all descendant elements with an explicit location strategy.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_elements_by(
        &self,
        selector: &str,
        selector_type: SelectorType,
    ) -> Result<Vec<Element>> {
        let value = self
            .connection
            .request(
                Method::Post,
                "/elements",
                Some(json!({
                    "using": selector_type.as_str(),
                    "value": selector,
                })),
            )
            .await?;
        let ids: Vec<String> = serde_json::from_value(value)?;
        Ok(ids
            .into_iter()
            .map(|id| Element::new(id, self.session.clone(), self.variant))
            .collect())
    }

    /// Returns the element's bounding rectangle.
    ///
    /// # Errors
    ///
    /// Propagates classified driver errors.
    pub async fn get_rect(&self) -> Result<Rect> {
        self.dialect.element_rect(self).await
    }
}

// ============================================================================
// Value Escaping
// ============================================================================

/// Quotes a value for use inside a selector.
///
/// Values containing both quote characters cannot be quoted directly
/// and are emitted as an XPath `concat()` expression.
fn escape_value(value: &str) -> String {
    if value.contains('"') && value.contains('\'') {
        let parts: Vec<String> = value
            .split('"')
            .map(|part| format!("\"{part}\""))
            .collect();
        format!("concat({})", parts.join(", '\"', "))
    } else if value.contains('"') {
        format!("'{value}'")
    } else {
        format!("\"{value}\"")
    }
}

// ============================================================================
// Tests
// ============================================================================
