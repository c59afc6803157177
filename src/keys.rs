//! Special-key constants for [`Element::send_keys`] and
//! [`Keyboard`](crate::actions::Keyboard).
//!
//! The WebDriver protocol encodes non-printable keys as code points in
//! the Unicode private use area. Append them to regular text:
//!
//! ```ignore
//! field.send_keys(&format!("admin{}", keys::ENTER)).await?;
//! ```
//!
//! [`Element::send_keys`]: crate::session::Element::send_keys

/// Null key, releases all modifiers.
pub const NULL: &str = "\u{e000}";
/// Cancel key.
pub const CANCEL: &str = "\u{e001}";
/// Help key.
pub const HELP: &str = "\u{e002}";
/// Backspace key.
pub const BACKSPACE: &str = "\u{e003}";
/// Tab key.
pub const TAB: &str = "\u{e004}";
/// Clear key.
pub const CLEAR: &str = "\u{e005}";
/// Return key.
pub const RETURN: &str = "\u{e006}";
/// Enter key.
pub const ENTER: &str = "\u{e007}";
/// Shift modifier.
pub const SHIFT: &str = "\u{e008}";
/// Control modifier.
pub const CONTROL: &str = "\u{e009}";
/// Alt modifier.
pub const ALT: &str = "\u{e00a}";
/// Pause key.
pub const PAUSE: &str = "\u{e00b}";
/// Escape key.
pub const ESCAPE: &str = "\u{e00c}";
/// Space key.
pub const SPACE: &str = "\u{e00d}";
/// Page Up key.
pub const PAGE_UP: &str = "\u{e00e}";
/// Page Down key.
pub const PAGE_DOWN: &str = "\u{e00f}";
/// End key.
pub const END: &str = "\u{e010}";
/// Home key.
pub const HOME: &str = "\u{e011}";
/// Left arrow key.
pub const LEFT: &str = "\u{e012}";
/// Up arrow key.
pub const UP: &str = "\u{e013}";
/// Right arrow key.
pub const RIGHT: &str = "\u{e014}";
/// Down arrow key.
pub const DOWN: &str = "\u{e015}";
/// Insert key.
pub const INSERT: &str = "\u{e016}";
/// Delete key.
pub const DELETE: &str = "\u{e017}";
/// Semicolon key.
pub const SEMICOLON: &str = "\u{e018}";
/// Equals key.
pub const EQUALS: &str = "\u{e019}";

/// Numeric keypad 0.
pub const NUMPAD0: &str = "\u{e01a}";
/// Numeric keypad 1.
pub const NUMPAD1: &str = "\u{e01b}";
/// Numeric keypad 2.
pub const NUMPAD2: &str = "\u{e01c}";
/// Numeric keypad 3.
pub const NUMPAD3: &str = "\u{e01d}";
/// Numeric keypad 4.
pub const NUMPAD4: &str = "\u{e01e}";
/// Numeric keypad 5.
pub const NUMPAD5: &str = "\u{e01f}";
/// Numeric keypad 6.
pub const NUMPAD6: &str = "\u{e020}";
/// Numeric keypad 7.
pub const NUMPAD7: &str = "\u{e021}";
/// Numeric keypad 8.
pub const NUMPAD8: &str = "\u{e022}";
/// Numeric keypad 9.
pub const NUMPAD9: &str = "\u{e023}";
/// Numeric keypad multiply.
pub const MULTIPLY: &str = "\u{e024}";
/// Numeric keypad add.
pub const ADD: &str = "\u{e025}";
/// Numeric keypad separator.
pub const SEPARATOR: &str = "\u{e026}";
/// Numeric keypad subtract.
pub const SUBTRACT: &str = "\u{e027}";
/// Numeric keypad decimal point.
pub const DECIMAL: &str = "\u{e028}";
/// Numeric keypad divide.
pub const DIVIDE: &str = "\u{e029}";

/// F1 key.
pub const F1: &str = "\u{e031}";
/// F2 key.
pub const F2: &str = "\u{e032}";
/// F3 key.
pub const F3: &str = "\u{e033}";
/// F4 key.
pub const F4: &str = "\u{e034}";
/// F5 key.
pub const F5: &str = "\u{e035}";
/// F6 key.
pub const F6: &str = "\u{e036}";
/// F7 key.
pub const F7: &str = "\u{e037}";
/// F8 key.
pub const F8: &str = "\u{e038}";
/// F9 key.
pub const F9: &str = "\u{e039}";
/// F10 key.
pub const F10: &str = "\u{e03a}";
/// F11 key.
pub const F11: &str = "\u{e03b}";
/// F12 key.
pub const F12: &str = "\u{e03c}";

/// Meta (Windows) modifier.
pub const META: &str = "\u{e03d}";
/// Command modifier (macOS alias for [`META`]).
pub const COMMAND: &str = META;
