//! Error types for the presentation engine.
//!
//! Stack imbalance and unbalanced clip pairs indicate builder logic errors,
//! not runtime data errors: they are surfaced immediately as `Err` values
//! and never recovered within the frame. Recoverable conditions (missing
//! textures) are reported as warnings instead, see
//! [`RenderWarning`](crate::renderer::RenderWarning).

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Transform/clip stack misuse
    #[error("stack error: {0}")]
    Stack(#[from] StackError),

    /// Draw-command build failure
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// Renderer failure
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Errors raised by the transform/clip stack.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// `restore` was called with no matching `save`.
    #[error("`restore` called with no matching `save`")]
    StackUnderflow,
}

/// Errors raised while building a frame's command list.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// The transform/clip stack was left imbalanced.
    #[error(transparent)]
    Stack(#[from] StackError),

    /// A paint callback emitted `ClipEnd` with no open `RoundedClipBegin`,
    /// or left a clip open past the end of its paint call.
    #[error("clip commands unbalanced within a paint callback")]
    UnbalancedClip,
}

/// Errors raised by renderer backends.
///
/// Balanced clip pairs are a builder invariant; these guards only trip on
/// hand-assembled command lists.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// `ClipEnd` with no open clip, or a clip left open at list end.
    #[error("clip commands unbalanced in command list")]
    UnbalancedClip,

    /// The target surface has a zero dimension.
    #[error("target surface has zero width or height")]
    InvalidSurface,
}
