//! Explicit style configuration.
//!
//! The theme is a plain value handed to the builder through
//! [`FrameParams`](crate::renderer::FrameParams) and read by paint
//! callbacks at paint time. There is no ambient global style state; a
//! dark-mode switch is the host constructing a different `Theme` and
//! invalidating the frame.

use crate::widgets::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Whether this is a dark palette
    pub dark: bool,
    pub background: Color,
    pub foreground: Color,
    pub accent: Color,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            dark: false,
            background: Color::from_hex(0xFAFAFA),
            foreground: Color::from_hex(0x1A1A1A),
            accent: Color::from_hex(0x3366CC),
        }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            background: Color::from_hex(0x1A1A1E),
            foreground: Color::from_hex(0xEAEAEA),
            accent: Color::from_hex(0x5588EE),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
