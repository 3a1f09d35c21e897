//! Input event model.
//!
//! Events arrive from the host already translated into logical units; the
//! device-scale conversion is the host's responsibility. The router also
//! synthesizes [`InputEvent::PointerEnter`], [`InputEvent::PointerLeave`]
//! and [`InputEvent::GrabLost`] while dispatching.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifier state.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const CTRL  = 0b0001;
        const ALT   = 0b0010;
        const SHIFT = 0b0100;
        const LOGO  = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Which pointer buttons a listener is interested in.
///
/// `Any` is the all-buttons sentinel; events for non-matching buttons are
/// not dispatched to the listener at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonFilter {
    #[default]
    Any,
    Only(PointerButton),
}

impl ButtonFilter {
    pub fn matches(&self, button: PointerButton) -> bool {
        match self {
            ButtonFilter::Any => true,
            ButtonFilter::Only(b) => *b == button,
        }
    }
}

/// Named keys for keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    /// Character input (includes A-Z for Ctrl+A shortcuts)
    Char(char),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Pointer button pressed
    PointerPress {
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    },
    /// Pointer button released
    PointerRelease {
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    },
    /// Pointer moved
    PointerMotion { x: f32, y: f32 },
    /// Pointer entered a widget (synthesized by the router on hover change)
    PointerEnter { x: f32, y: f32 },
    /// Pointer left a widget (synthesized by the router on hover change)
    PointerLeave,
    /// The widget's pointer grab was revoked by a newer grab (synthesized)
    GrabLost,
    /// Key pressed
    KeyPress {
        /// The key that was pressed
        key: Key,
        /// Hardware keycode as reported by the host
        keycode: u32,
        /// Current modifier state
        modifiers: Modifiers,
    },
}

impl InputEvent {
    /// Get the coordinates from this event, if any
    pub fn coords(&self) -> Option<(f32, f32)> {
        match self {
            InputEvent::PointerPress { x, y, .. } => Some((*x, *y)),
            InputEvent::PointerRelease { x, y, .. } => Some((*x, *y)),
            InputEvent::PointerMotion { x, y } => Some((*x, *y)),
            InputEvent::PointerEnter { x, y } => Some((*x, *y)),
            InputEvent::PointerLeave | InputEvent::GrabLost | InputEvent::KeyPress { .. } => None,
        }
    }

    /// The button carried by this event, if any
    pub fn button(&self) -> Option<PointerButton> {
        match self {
            InputEvent::PointerPress { button, .. } | InputEvent::PointerRelease { button, .. } => {
                Some(*button)
            }
            _ => None,
        }
    }

    /// True for pointer-family events (routed by hit-test/grab rather than
    /// the focus chain).
    pub fn is_pointer(&self) -> bool {
        !matches!(self, InputEvent::KeyPress { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    Ignored,
    Handled,
}
