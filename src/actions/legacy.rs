//! Legacy-protocol action translation.
//!
//! The legacy JSON Wire Protocol has no tick model. A chain is played
//! back as a flat list of single-shot commands, taking one action per
//! device per round so simultaneity degrades into interleaving. Pauses
//! only exist to align ticks and translate to nothing.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::transport::Method;

use super::{Action, ActionChain, Device, DeviceKind, Origin, PointerType};

// ============================================================================
// LegacyCommand
// ============================================================================

/// One flattened command, relative to the session URL.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LegacyCommand {
    pub url: &'static str,
    pub method: Method,
    pub body: Value,
}

// ============================================================================
// Translation
// ============================================================================

/// Flattens a chain into legacy commands, round-robin across devices.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] for keyboard actions and for
/// pointer moves with a viewport origin, neither of which has a legacy
/// equivalent.
pub(crate) fn translate(chain: &ActionChain) -> Result<Vec<LegacyCommand>> {
    let mut queues: Vec<(Device, VecDeque<Action>)> = chain
        .device_sequences()
        .into_iter()
        .map(|(device, actions)| (device, actions.into()))
        .collect();

    let mut commands = Vec::new();
    while queues.iter().any(|(_, queue)| !queue.is_empty()) {
        for (device, queue) in &mut queues {
            let Some(action) = queue.pop_front() else {
                continue;
            };
            if let Some(command) = translate_one(device, &action)? {
                commands.push(command);
            }
        }
    }
    Ok(commands)
}

fn translate_one(device: &Device, action: &Action) -> Result<Option<LegacyCommand>> {
    if matches!(action, Action::Pause { .. }) {
        return Ok(None);
    }
    let pointer_type = match device.kind() {
        DeviceKind::Pointer(pointer_type) => pointer_type,
        DeviceKind::Key => {
            return Err(Error::unsupported(
                "keyboard actions have no legacy equivalent",
            ));
        }
    };
    // Mouse pointers drive the button endpoints; touch and pen both go
    // through the touch endpoints.
    let mouse = pointer_type == PointerType::Mouse;
    let command = match action {
        Action::PointerDown { button } => LegacyCommand {
            url: if mouse { "/buttondown" } else { "/touch/down" },
            method: Method::Post,
            body: json!({ "button": button }),
        },
        Action::PointerUp { button } => LegacyCommand {
            url: if mouse { "/buttonup" } else { "/touch/up" },
            method: Method::Post,
            body: json!({ "button": button }),
        },
        Action::PointerMove { origin, x, y, .. } => {
            let body = match origin {
                Origin::Pointer => json!({ "xoffset": x, "yoffset": y }),
                Origin::Element(id) => json!({ "element": id }),
                Origin::Viewport => {
                    return Err(Error::unsupported(
                        "legacy pointer moves cannot use a viewport origin",
                    ));
                }
            };
            LegacyCommand {
                url: if mouse { "/moveto" } else { "/touch/move" },
                method: Method::Post,
                body,
            }
        }
        Action::KeyDown { .. } | Action::KeyUp { .. } => {
            return Err(Error::unsupported(
                "keyboard actions have no legacy equivalent",
            ));
        }
        Action::Pause { .. } => return Ok(None),
    };
    Ok(Some(command))
}

// ============================================================================
// Tests
// ============================================================================
