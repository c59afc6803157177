//! Multi-device input gestures.
//!
//! An input gesture is described as a sequence of time-aligned ticks.
//! A [`Tick`] assigns at most one action to each input device; ticks
//! for different devices can be merged with [`Tick::and`] so the
//! actions happen simultaneously. [`chain`] assembles ticks into an
//! [`ActionChain`] ready for [`Session::perform_actions`].
//!
//! # Example
//!
//! ```ignore
//! use webdriver_wire::actions::{Pointer, chain};
//!
//! let mouse = Pointer::mouse();
//! let drag = chain([
//!     mouse.move_to(&source),
//!     mouse.down(),
//!     mouse.move_by(100, 100),
//!     mouse.up(),
//! ]);
//! session.perform_actions(&drag).await?;
//! ```
//!
//! Encoding targets the W3C `/actions` payload. Drivers stuck on the
//! legacy protocol go through [`legacy`] instead, which flattens the
//! chain into single-shot commands.
//!
//! [`Session::perform_actions`]: crate::session::Session::perform_actions

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};

use crate::connection::WEB_ELEMENT;
use crate::error::{Error, Result};
use crate::session::Element;

pub(crate) mod legacy;

/// Default duration for pointer moves, in milliseconds.
const MOVE_DURATION: u64 = 250;

/// Source of unique device identities.
static DEVICE_KEYS: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// PointerType / Button
// ============================================================================

/// Kind of virtual pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerType {
    /// Mouse pointer.
    Mouse,
    /// Touch contact.
    Touch,
    /// Pen stylus.
    Pen,
}

impl PointerType {
    /// Returns the wire name of the pointer type.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Touch => "touch",
            Self::Pen => "pen",
        }
    }
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Primary button.
    Left,
    /// Middle button.
    Middle,
    /// Secondary button.
    Right,
}

impl Button {
    /// Returns the wire value of the button.
    #[inline]
    #[must_use]
    pub fn value(self) -> u64 {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
        }
    }
}

// ============================================================================
// Origin
// ============================================================================

/// Reference frame for a pointer move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Top-left corner of the viewport.
    Viewport,
    /// Current pointer position.
    Pointer,
    /// Center of an element, by element id.
    Element(String),
}

impl Origin {
    fn encode(&self) -> Value {
        match self {
            Self::Viewport => json!("viewport"),
            Self::Pointer => json!("pointer"),
            Self::Element(id) => json!({ WEB_ELEMENT: id }),
        }
    }
}

// ============================================================================
// Device
// ============================================================================

/// Internal device identity: a unique key plus type information.
#[derive(Debug, Clone)]
pub(crate) struct Device {
    key: u64,
    kind: DeviceKind,
    id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeviceKind {
    Pointer(PointerType),
    Key,
}

impl DeviceKind {
    fn type_str(self) -> &'static str {
        match self {
            Self::Pointer(_) => "pointer",
            Self::Key => "key",
        }
    }
}

impl Device {
    fn new(kind: DeviceKind) -> Self {
        Self {
            key: DEVICE_KEYS.fetch_add(1, Ordering::Relaxed),
            kind,
            id: None,
        }
    }

    pub(crate) fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Human-readable identity for error messages.
    fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}#{}", self.kind.type_str(), self.key),
        }
    }
}

// ============================================================================
// Action
// ============================================================================

/// One device action inside a tick.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    PointerMove {
        origin: Origin,
        x: i64,
        y: i64,
        duration: u64,
    },
    PointerDown {
        button: u64,
    },
    PointerUp {
        button: u64,
    },
    KeyDown {
        value: String,
    },
    KeyUp {
        value: String,
    },
    Pause {
        duration: u64,
    },
}

impl Action {
    pub(crate) fn encode(&self) -> Value {
        match self {
            Self::PointerMove {
                origin,
                x,
                y,
                duration,
            } => json!({
                "type": "pointerMove",
                "duration": duration,
                "origin": origin.encode(),
                "x": x,
                "y": y,
            }),
            Self::PointerDown { button } => json!({
                "type": "pointerDown",
                "duration": 0,
                "button": button,
            }),
            Self::PointerUp { button } => json!({
                "type": "pointerUp",
                "duration": 0,
                "button": button,
            }),
            Self::KeyDown { value } => json!({
                "type": "keyDown",
                "value": value,
            }),
            Self::KeyUp { value } => json!({
                "type": "keyUp",
                "value": value,
            }),
            Self::Pause { duration } => json!({
                "type": "pause",
                "duration": duration,
            }),
        }
    }
}

// ============================================================================
// Pointer
// ============================================================================

/// A virtual pointer device (mouse, touch contact or pen).
///
/// Every method yields a single-device [`Tick`]; combine ticks from
/// different devices with [`Tick::and`] for simultaneous input.
#[derive(Debug, Clone)]
pub struct Pointer {
    device: Device,
}

impl Pointer {
    /// Creates a mouse pointer.
    #[must_use]
    pub fn mouse() -> Self {
        Self {
            device: Device::new(DeviceKind::Pointer(PointerType::Mouse)),
        }
    }

    /// Creates a touch contact.
    #[must_use]
    pub fn touch() -> Self {
        Self {
            device: Device::new(DeviceKind::Pointer(PointerType::Touch)),
        }
    }

    /// Creates a pen stylus.
    #[must_use]
    pub fn pen() -> Self {
        Self {
            device: Device::new(DeviceKind::Pointer(PointerType::Pen)),
        }
    }

    /// Assigns an explicit device id instead of the generated one.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.device.id = Some(id.into());
        self
    }

    /// Moves to the center of `element` over 250 ms.
    #[must_use]
    pub fn move_to(&self, element: &Element) -> Tick {
        self.move_from_origin(Origin::Element(element.id().to_string()), 0, 0)
    }

    /// Moves by an offset relative to the current pointer position.
    #[must_use]
    pub fn move_by(&self, x: i64, y: i64) -> Tick {
        self.move_from_origin(Origin::Pointer, x, y)
    }

    /// Moves to absolute viewport coordinates.
    #[must_use]
    pub fn move_to_location(&self, x: i64, y: i64) -> Tick {
        self.move_from_origin(Origin::Viewport, x, y)
    }

    fn move_from_origin(&self, origin: Origin, x: i64, y: i64) -> Tick {
        Tick::single(
            self.device.clone(),
            Action::PointerMove {
                origin,
                x,
                y,
                duration: MOVE_DURATION,
            },
        )
    }

    /// Presses the primary button.
    #[must_use]
    pub fn down(&self) -> Tick {
        self.down_with(Button::Left)
    }

    /// Presses a specific button.
    #[must_use]
    pub fn down_with(&self, button: Button) -> Tick {
        Tick::single(
            self.device.clone(),
            Action::PointerDown {
                button: button.value(),
            },
        )
    }

    /// Releases the primary button.
    #[must_use]
    pub fn up(&self) -> Tick {
        self.up_with(Button::Left)
    }

    /// Releases a specific button.
    #[must_use]
    pub fn up_with(&self, button: Button) -> Tick {
        Tick::single(
            self.device.clone(),
            Action::PointerUp {
                button: button.value(),
            },
        )
    }

    /// Explicitly does nothing for `duration` milliseconds.
    #[must_use]
    pub fn pause(&self, duration: u64) -> Tick {
        Tick::single(self.device.clone(), Action::Pause { duration })
    }

    /// Returns the pointer type.
    #[inline]
    #[must_use]
    pub fn pointer_type(&self) -> PointerType {
        match self.device.kind {
            DeviceKind::Pointer(pointer_type) => pointer_type,
            // Pointer devices are only ever constructed with a pointer kind.
            DeviceKind::Key => unreachable!("pointer device with key kind"),
        }
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::mouse()
    }
}

// ============================================================================
// Keyboard
// ============================================================================

/// A virtual keyboard device.
#[derive(Debug, Clone)]
pub struct Keyboard {
    device: Device,
}

impl Keyboard {
    /// Creates a keyboard.
    #[must_use]
    pub fn new() -> Self {
        Self {
            device: Device::new(DeviceKind::Key),
        }
    }

    /// Assigns an explicit device id instead of the generated one.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.device.id = Some(id.into());
        self
    }

    /// Presses a key.
    #[must_use]
    pub fn key_down(&self, value: impl Into<String>) -> Tick {
        Tick::single(
            self.device.clone(),
            Action::KeyDown {
                value: value.into(),
            },
        )
    }

    /// Releases a key.
    #[must_use]
    pub fn key_up(&self, value: impl Into<String>) -> Tick {
        Tick::single(self.device.clone(), Action::KeyUp { value: value.into() })
    }

    /// Explicitly does nothing for `duration` milliseconds.
    #[must_use]
    pub fn pause(&self, duration: u64) -> Tick {
        Tick::single(self.device.clone(), Action::Pause { duration })
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tick
// ============================================================================

/// One synchronized time-slice across input devices.
#[derive(Debug, Clone)]
pub struct Tick {
    entries: Vec<(Device, Action)>,
}

impl Tick {
    fn single(device: Device, action: Action) -> Self {
        Self {
            entries: vec![(device, action)],
        }
    }

    /// Merges two ticks so their actions happen in the same time-slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionConflict`] if both ticks assign an action
    /// to the same device. The conflict is reported here, at chain
    /// construction, not at encode time.
    pub fn and(mut self, other: Tick) -> Result<Tick> {
        for (device, _) in &other.entries {
            if self.entries.iter().any(|(known, _)| known.key == device.key) {
                return Err(Error::ActionConflict {
                    device: device.label(),
                });
            }
        }
        self.entries.extend(other.entries);
        Ok(self)
    }

    fn action_for(&self, device: &Device) -> Option<&Action> {
        self.entries
            .iter()
            .find(|(known, _)| known.key == device.key)
            .map(|(_, action)| action)
    }
}

// ============================================================================
// ActionChain
// ============================================================================

/// An ordered sequence of ticks, ready for encoding.
#[derive(Debug, Clone)]
pub struct ActionChain {
    ticks: Vec<Tick>,
}

/// Assembles ticks into an [`ActionChain`].
pub fn chain(ticks: impl IntoIterator<Item = Tick>) -> ActionChain {
    ActionChain {
        ticks: ticks.into_iter().collect(),
    }
}

impl ActionChain {
    /// Devices referenced by the chain, in first-appearance order.
    fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = Vec::new();
        for tick in &self.ticks {
            for (device, _) in &tick.entries {
                if !devices.iter().any(|known| known.key == device.key) {
                    devices.push(device.clone());
                }
            }
        }
        devices
    }

    /// Per-device action timelines with pause fillers.
    ///
    /// Every timeline has one action per tick: the device's own action
    /// where assigned, a zero-duration pause otherwise.
    pub(crate) fn device_sequences(&self) -> Vec<(Device, Vec<Action>)> {
        self.devices()
            .into_iter()
            .map(|device| {
                let actions = self
                    .ticks
                    .iter()
                    .map(|tick| {
                        tick.action_for(&device)
                            .cloned()
                            .unwrap_or(Action::Pause { duration: 0 })
                    })
                    .collect();
                (device, actions)
            })
            .collect()
    }

    /// Encodes the chain as the W3C `/actions` request body.
    ///
    /// Device ids default to `{type}{index}` with a 1-based positional
    /// index unless the caller assigned one explicitly.
    #[must_use]
    pub fn encode(&self) -> Value {
        let actions: Vec<Value> = self
            .device_sequences()
            .into_iter()
            .enumerate()
            .map(|(index, (device, actions))| {
                let id = device
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{}{}", device.kind.type_str(), index + 1));
                let encoded: Vec<Value> = actions.iter().map(Action::encode).collect();
                match device.kind {
                    DeviceKind::Pointer(pointer_type) => json!({
                        "id": id,
                        "type": "pointer",
                        "parameters": { "pointerType": pointer_type.as_str() },
                        "actions": encoded,
                    }),
                    DeviceKind::Key => json!({
                        "id": id,
                        "type": "key",
                        "actions": encoded,
                    }),
                }
            })
            .collect();
        json!({ "actions": actions })
    }
}

// ============================================================================
// Tests
// ============================================================================
