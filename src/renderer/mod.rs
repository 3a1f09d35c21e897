//! Frame rendering: command building and the two renderer backends.
//!
//! One contract, two interchangeable backends. The immediate backend
//! rasterizes directly into a software surface; the retained backend
//! translates into a scene graph for a hardware compositor and diffs
//! against the previous frame. Both apply clip commands as a strict stack
//! and both apply the device-scale factor exactly once at ingestion.

pub mod builder;
pub mod commands;
pub mod immediate;
pub mod retained;
pub mod stack;
pub mod text;
pub mod texture;

pub use builder::{DrawCommandBuilder, FrameParams, PaintCtx};
pub use commands::{CommandList, DrawCommand};
pub use immediate::ImmediateRenderer;
pub use retained::{Compositor, FrameDelta, RetainedRenderer, SceneClip, SceneNode, ScenePrimitive};
pub use stack::{RoundedClip, TransformClipStack};
pub use text::{FixedAdvanceShaper, FontDescription, FontStyle, Glyph, GlyphRun, Shaper};
pub use texture::{PixelFormat, TextureHandle};

use crate::error::RenderError;

/// Renderer contract shared by both backends.
///
/// The command list is consumed by value: lists are frame-scoped and must
/// never be replayed across frames.
pub trait Renderer {
    /// The rasterization target (a pixmap for the immediate backend, the
    /// compositor for the retained backend).
    type Surface;

    fn render(
        &mut self,
        list: CommandList,
        surface: &mut Self::Surface,
        device_scale: f32,
    ) -> Result<(), RenderError>;
}

/// Recoverable, per-frame renderer diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWarning {
    /// A texture handle had no uploaded pixels; a placeholder was drawn.
    MissingTexture { handle: u64 },
}
