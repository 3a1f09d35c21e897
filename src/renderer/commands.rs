//! Draw command definitions.
//!
//! A frame's commands form a flat ordered sequence; later commands paint
//! over earlier ones. Geometry is in root-logical space; the device-scale
//! factor is applied exactly once, when a renderer ingests the list.

use crate::renderer::text::GlyphRun;
use crate::renderer::texture::TextureHandle;
use crate::widgets::{Color, Point, Rect};

/// A single draw operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill a rectangle with a solid color.
    FillRect {
        /// Rectangle bounds in logical units
        rect: Rect,
        /// Fill color
        color: Color,
    },

    /// Open a rounded clip region. Must be balanced by a matching
    /// [`DrawCommand::ClipEnd`]; clips nest as a strict stack.
    RoundedClipBegin {
        /// Clip bounds in logical units
        rect: Rect,
        /// Corner radius in logical units
        radius: f32,
    },

    /// Close the innermost open clip region.
    ClipEnd,

    /// Draw a texture into a destination rectangle.
    ///
    /// The destination is in logical units; the texture's native pixel
    /// size never participates in layout.
    Texture {
        /// Opaque texture resource handle
        handle: TextureHandle,
        /// Destination rectangle in logical units
        dest_rect: Rect,
    },

    /// Draw a run of positioned glyphs.
    TextRun {
        /// Shaped glyphs, positioned relative to `origin`
        glyphs: GlyphRun,
        /// Baseline origin in logical units
        origin: Point,
        /// Text color
        color: Color,
    },

    /// Stroke an open polyline.
    StrokePath {
        /// Points in logical units
        points: Vec<Point>,
        /// Stroke width in logical units
        width: f32,
        /// Stroke color
        color: Color,
    },
}

/// The ordered, immutable set of draw operations built for one frame.
///
/// Lists are frame-scoped: built fresh each tick and consumed by value at
/// [`Renderer::render`](crate::renderer::Renderer::render), so a stale
/// list can never be replayed.
#[derive(Debug, Default)]
pub struct CommandList {
    commands: Vec<DrawCommand>,
}

impl CommandList {
    pub(crate) fn from_commands(commands: Vec<DrawCommand>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    pub fn get(&self, index: usize) -> Option<&DrawCommand> {
        self.commands.get(index)
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
