//! Browser descriptors.
//!
//! A [`Browser`] is pure data: the desired capabilities plus the
//! protocol variant the matching driver speaks. The variant is chosen
//! here, once, and fixed for the lifetime of every session negotiated
//! from the descriptor.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, json};

// ============================================================================
// ProtocolVariant
// ============================================================================

/// Which flavor of the WebDriver protocol a session speaks.
///
/// Selected once at session creation from the browser descriptor;
/// never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVariant {
    /// Modern W3C WebDriver endpoints.
    W3c,
    /// Legacy JSON Wire Protocol endpoints ("Compat").
    Legacy,
}

// ============================================================================
// Browser
// ============================================================================

/// Desired-browser descriptor used for session negotiation.
#[derive(Debug, Clone)]
pub struct Browser {
    capabilities: Map<String, Value>,
    variant: ProtocolVariant,
}

impl Browser {
    /// Creates a descriptor from explicit capabilities and variant.
    #[must_use]
    pub fn new(capabilities: Map<String, Value>, variant: ProtocolVariant) -> Self {
        Self {
            capabilities,
            variant,
        }
    }

    /// Firefox over geckodriver (W3C).
    #[must_use]
    pub fn firefox() -> Self {
        let capabilities = json!({
            "browserName": "firefox",
            "acceptInsecureCerts": true,
        });
        Self {
            capabilities: into_map(capabilities),
            variant: ProtocolVariant::W3c,
        }
    }

    /// Chrome over chromedriver (W3C).
    #[must_use]
    pub fn chrome() -> Self {
        let capabilities = json!({
            "browserName": "chrome",
        });
        Self {
            capabilities: into_map(capabilities),
            variant: ProtocolVariant::W3c,
        }
    }

    /// PhantomJS (legacy protocol only).
    #[must_use]
    pub fn phantomjs() -> Self {
        let capabilities = json!({
            "browserName": "phantomjs",
        });
        Self {
            capabilities: into_map(capabilities),
            variant: ProtocolVariant::Legacy,
        }
    }

    /// Sets or overrides a single capability.
    #[must_use]
    pub fn capability(mut self, key: impl Into<String>, value: Value) -> Self {
        self.capabilities.insert(key.into(), value);
        self
    }

    /// Returns the capability map.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &Map<String, Value> {
        &self.capabilities
    }

    /// Returns the protocol variant this descriptor selects.
    #[inline]
    #[must_use]
    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    /// Builds the `POST /session` negotiation body.
    ///
    /// W3C drivers take `capabilities.alwaysMatch`; legacy drivers take
    /// `desiredCapabilities`. The caller's capabilities are copied into
    /// the request body.
    #[must_use]
    pub(crate) fn negotiation_body(&self) -> Value {
        match self.variant {
            ProtocolVariant::W3c => json!({
                "capabilities": { "alwaysMatch": self.capabilities },
            }),
            ProtocolVariant::Legacy => json!({
                "desiredCapabilities": self.capabilities,
            }),
        }
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firefox_negotiates_w3c_shape() {
        let body = Browser::firefox().negotiation_body();
        assert_eq!(
            body["capabilities"]["alwaysMatch"]["browserName"],
            json!("firefox")
        );
        assert!(body.get("desiredCapabilities").is_none());
    }

    #[test]
    fn test_phantomjs_negotiates_legacy_shape() {
        let body = Browser::phantomjs().negotiation_body();
        assert_eq!(body["desiredCapabilities"]["browserName"], json!("phantomjs"));
        assert!(body.get("capabilities").is_none());
    }

    #[test]
    fn test_capability_override() {
        let browser = Browser::firefox().capability("acceptInsecureCerts", json!(false));
        assert_eq!(
            browser.capabilities().get("acceptInsecureCerts"),
            Some(&json!(false))
        );
    }

    #[test]
    fn test_variant_is_fixed_per_descriptor() {
        assert_eq!(Browser::firefox().variant(), ProtocolVariant::W3c);
        assert_eq!(Browser::phantomjs().variant(), ProtocolVariant::Legacy);
    }
}
