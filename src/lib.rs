//! veduta: a standalone 2D presentation engine.
//!
//! The engine covers the drawing-and-input core of a UI toolkit,
//! independent of any windowing system: a transform/clip stack, a
//! per-frame draw-command builder, immediate (software raster) and
//! retained (scene graph) renderer backends, hit-testing with grab/focus
//! event routing, and a redraw scheduler that coalesces invalidations.
//!
//! The host owns the window, the event loop and the frame clock. Per
//! frame it hands input events (already in logical units) to the
//! [`router::EventRouter`], calls [`scheduler::RedrawScheduler::tick`],
//! and inside the frame callback builds a command list with
//! [`renderer::DrawCommandBuilder`] and feeds it to a
//! [`renderer::Renderer`] backend.
//!
//! Everything runs on one UI thread;
//! [`scheduler::InvalidationHandle::invalidate`] and
//! [`tasks::RemoteQueue::post`] are the only cross-thread entry points.

pub mod error;
pub mod input;
pub mod renderer;
pub mod router;
pub mod scheduler;
pub mod tasks;
pub mod theme;
pub mod transform;
pub mod tree;
pub mod widgets;

pub mod prelude {
    pub use crate::error::{BuildError, Error, RenderError, Result, StackError};
    pub use crate::input::{
        ButtonFilter, EventResponse, InputEvent, Key, Modifiers, PointerButton,
    };
    pub use crate::renderer::{
        CommandList, Compositor, DrawCommand, DrawCommandBuilder, FixedAdvanceShaper,
        FontDescription, FrameParams, ImmediateRenderer, PaintCtx, Renderer, RenderWarning,
        RetainedRenderer, Shaper, TextureHandle, TransformClipStack,
    };
    pub use crate::router::{EventCtx, EventRouter};
    pub use crate::scheduler::{InvalidationHandle, RedrawScheduler};
    pub use crate::tasks::{RemoteQueue, TaskHandle, TaskQueue};
    pub use crate::theme::Theme;
    pub use crate::transform::Transform;
    pub use crate::tree::{EventCallback, ListenerId, Tree, WidgetId, WidgetNode};
    pub use crate::widgets::{ClipShape, Color, Expand, Measurable, Paintable, Point, Rect, Size};
}
