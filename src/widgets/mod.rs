//! Geometry primitives and widget capability traits.

mod widget;

pub use widget::{ClipShape, Color, Expand, Measurable, Paintable, Point, Rect, Size};
