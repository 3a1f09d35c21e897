//! Per-frame draw-command building.
//!
//! [`DrawCommandBuilder::build`] walks the widget tree depth-first in
//! paint order and converts each visible widget's paint output into a
//! flat [`CommandList`]. Building is a pure read of the tree: paint
//! delegates take `&self` and can only emit commands.

use log::debug;

use crate::error::BuildError;
use crate::renderer::commands::{CommandList, DrawCommand};
use crate::renderer::stack::TransformClipStack;
use crate::theme::Theme;
use crate::tree::{Tree, WidgetId};
use crate::widgets::{Rect, Size};

/// Per-frame parameters flowing down through the builder.
///
/// Style configuration is passed explicitly rather than queried from
/// ambient global state; paint callbacks read it via [`PaintCtx::theme`].
#[derive(Debug, Clone, Default)]
pub struct FrameParams {
    pub theme: Theme,
}

/// The emit surface handed to paint callbacks.
///
/// Commands are emitted in the widget's local space (logical units) and
/// mapped into root space as they are recorded. Clip pairs emitted by a
/// callback must balance before the callback returns.
pub struct PaintCtx<'a> {
    stack: &'a TransformClipStack,
    out: &'a mut Vec<DrawCommand>,
    size: Size,
    theme: &'a Theme,
    /// Open clips emitted by the current paint callback
    open_clips: usize,
    error: Option<BuildError>,
}

impl PaintCtx<'_> {
    /// Logical size of the widget being painted.
    pub fn size(&self) -> Size {
        self.size
    }

    /// The frame's style configuration.
    pub fn theme(&self) -> &Theme {
        self.theme
    }

    /// Record a draw command.
    ///
    /// Geometry is interpreted in the widget's local space and mapped to
    /// root-logical space here; the device-scale factor is applied later,
    /// at renderer ingestion, never by the builder.
    pub fn emit(&mut self, command: DrawCommand) {
        if self.error.is_some() {
            return;
        }

        let mapped = match command {
            DrawCommand::FillRect { rect, color } => DrawCommand::FillRect {
                rect: self.stack.map_rect(rect),
                color,
            },
            DrawCommand::RoundedClipBegin { rect, radius } => {
                self.open_clips += 1;
                DrawCommand::RoundedClipBegin {
                    rect: self.stack.map_rect(rect),
                    radius: radius * self.stack.current_transform().scale_factor(),
                }
            }
            DrawCommand::ClipEnd => {
                if self.open_clips == 0 {
                    // ClipEnd with no open RoundedClipBegin: builder logic
                    // error, fails the frame
                    self.error = Some(BuildError::UnbalancedClip);
                    return;
                }
                self.open_clips -= 1;
                DrawCommand::ClipEnd
            }
            DrawCommand::Texture { handle, dest_rect } => DrawCommand::Texture {
                handle,
                dest_rect: self.stack.map_rect(dest_rect),
            },
            DrawCommand::TextRun {
                glyphs,
                origin,
                color,
            } => DrawCommand::TextRun {
                glyphs,
                origin: self.stack.to_device_space(origin),
                color,
            },
            DrawCommand::StrokePath {
                points,
                width,
                color,
            } => DrawCommand::StrokePath {
                points: points
                    .iter()
                    .map(|p| self.stack.to_device_space(*p))
                    .collect(),
                width: width * self.stack.current_transform().scale_factor(),
                color,
            },
        };

        self.out.push(mapped);
    }

    /// Convenience: fill the widget's own bounds.
    pub fn fill(&mut self, color: crate::widgets::Color) {
        let size = self.size;
        self.emit(DrawCommand::FillRect {
            rect: Rect::new(0.0, 0.0, size.width, size.height),
            color,
        });
    }

    fn finish(self) -> Result<(), BuildError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.open_clips != 0 {
            return Err(BuildError::UnbalancedClip);
        }
        Ok(())
    }
}

/// Builds one frame's command list from the widget tree.
pub struct DrawCommandBuilder;

impl DrawCommandBuilder {
    /// Build a command list for the subtree rooted at `root`.
    ///
    /// Pure with respect to widget state. Traversal is depth-first with
    /// siblings in ascending z-order (insertion order on ties); invisible
    /// subtrees are skipped entirely.
    pub fn build(
        tree: &Tree,
        root: WidgetId,
        params: &FrameParams,
    ) -> Result<CommandList, BuildError> {
        let mut stack = TransformClipStack::new();
        let mut out = Vec::new();
        let depth_before = stack.depth();

        Self::visit(tree, root, params, &mut stack, &mut out)?;

        // Stack depth returned to the pre-frame depth: every save had
        // exactly one matching restore
        debug_assert_eq!(stack.depth(), depth_before);

        debug!(
            "built frame: {} commands from {} widgets",
            out.len(),
            tree.widget_count()
        );

        Ok(CommandList::from_commands(out))
    }

    fn visit(
        tree: &Tree,
        id: WidgetId,
        params: &FrameParams,
        stack: &mut TransformClipStack,
        out: &mut Vec<DrawCommand>,
    ) -> Result<(), BuildError> {
        let node = match tree.node(id) {
            Some(n) => n,
            None => return Ok(()),
        };

        if !node.visible {
            return Ok(());
        }

        stack.save();
        stack.translate(node.bounds.x, node.bounds.y);

        // A degenerate clip rect clips nothing: a not-yet-laid-out
        // container must not silently hide its children
        let clip = node.clip.filter(|c| !c.rect.is_degenerate());
        if let Some(clip) = clip {
            stack.set_clip(clip.rect, clip.corner_radius);
            out.push(DrawCommand::RoundedClipBegin {
                rect: stack.map_rect(clip.rect),
                radius: clip.corner_radius * stack.current_transform().scale_factor(),
            });
        }

        if let Some(painter) = &node.painter {
            let mut ctx = PaintCtx {
                stack: &*stack,
                out: &mut *out,
                size: node.bounds.size(),
                theme: &params.theme,
                open_clips: 0,
                error: None,
            };
            painter.paint(&mut ctx);
            ctx.finish()?;
        }

        for child in tree.children_in_paint_order(id) {
            Self::visit(tree, child, params, stack, out)?;
        }

        if clip.is_some() {
            out.push(DrawCommand::ClipEnd);
        }

        stack.restore()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WidgetNode;
    use crate::widgets::{ClipShape, Color, Rect};

    fn fill_painter(color: Color) -> impl Fn(&mut PaintCtx<'_>) {
        move |ctx: &mut PaintCtx<'_>| ctx.fill(color)
    }

    #[test]
    fn test_build_maps_to_root_space() {
        let mut tree = Tree::new();
        let root = tree.insert(WidgetNode::new(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let _child = tree.insert_child(
            root,
            WidgetNode::new(Rect::new(10.0, 20.0, 30.0, 30.0))
                .with_painter(fill_painter(Color::WHITE)),
        );

        let list = DrawCommandBuilder::build(&tree, root, &FrameParams::default()).unwrap();
        assert_eq!(list.len(), 1);
        match list.get(0).unwrap() {
            DrawCommand::FillRect { rect, .. } => {
                assert_eq!(*rect, Rect::new(10.0, 20.0, 30.0, 30.0));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_build_is_pure_and_repeatable() {
        let mut tree = Tree::new();
        let root = tree.insert(
            WidgetNode::new(Rect::new(0.0, 0.0, 50.0, 50.0)).with_painter(fill_painter(Color::BLACK)),
        );

        let params = FrameParams::default();
        let a = DrawCommandBuilder::build(&tree, root, &params).unwrap();
        let b = DrawCommandBuilder::build(&tree, root, &params).unwrap();

        assert_eq!(a.len(), b.len());
        assert_eq!(a.get(0), b.get(0));
    }

    #[test]
    fn test_invisible_subtree_skipped() {
        let mut tree = Tree::new();
        let root = tree.insert(WidgetNode::new(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let hidden = tree.insert_child(
            root,
            WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_visible(false)
                .with_painter(fill_painter(Color::WHITE)),
        );
        let _hidden_child = tree.insert_child(
            hidden,
            WidgetNode::new(Rect::new(0.0, 0.0, 5.0, 5.0)).with_painter(fill_painter(Color::BLACK)),
        );

        let list = DrawCommandBuilder::build(&tree, root, &FrameParams::default()).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_siblings_in_z_order() {
        let mut tree = Tree::new();
        let root = tree.insert(WidgetNode::new(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let _top = tree.insert_child(
            root,
            WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_z_index(1)
                .with_painter(fill_painter(Color::WHITE)),
        );
        let _bottom = tree.insert_child(
            root,
            WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_z_index(0)
                .with_painter(fill_painter(Color::BLACK)),
        );

        let list = DrawCommandBuilder::build(&tree, root, &FrameParams::default()).unwrap();
        // z=0 paints first, z=1 paints over it
        match (list.get(0).unwrap(), list.get(1).unwrap()) {
            (
                DrawCommand::FillRect { color: first, .. },
                DrawCommand::FillRect { color: second, .. },
            ) => {
                assert_eq!(*first, Color::BLACK);
                assert_eq!(*second, Color::WHITE);
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn test_clip_pair_brackets_subtree() {
        let mut tree = Tree::new();
        let root = tree.insert(
            WidgetNode::new(Rect::new(0.0, 0.0, 100.0, 100.0))
                .with_clip(ClipShape::new(Rect::new(0.0, 0.0, 50.0, 50.0), 10.0)),
        );
        let _child = tree.insert_child(
            root,
            WidgetNode::new(Rect::new(0.0, 0.0, 100.0, 100.0))
                .with_painter(fill_painter(Color::WHITE)),
        );

        let list = DrawCommandBuilder::build(&tree, root, &FrameParams::default()).unwrap();
        assert_eq!(list.len(), 3);
        assert!(matches!(
            list.get(0),
            Some(DrawCommand::RoundedClipBegin { .. })
        ));
        assert!(matches!(list.get(1), Some(DrawCommand::FillRect { .. })));
        assert!(matches!(list.get(2), Some(DrawCommand::ClipEnd)));
    }

    #[test]
    fn test_degenerate_clip_emits_nothing() {
        let mut tree = Tree::new();
        // Zero-sized clip on a not-yet-laid-out container: children still
        // recurse and no clip pair is emitted
        let root = tree.insert(
            WidgetNode::new(Rect::new(0.0, 0.0, 0.0, 0.0))
                .with_clip(ClipShape::new(Rect::new(0.0, 0.0, 0.0, 0.0), 4.0)),
        );
        let _child = tree.insert_child(
            root,
            WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0)).with_painter(fill_painter(Color::WHITE)),
        );

        let list = DrawCommandBuilder::build(&tree, root, &FrameParams::default()).unwrap();
        assert_eq!(list.len(), 1);
        assert!(matches!(list.get(0), Some(DrawCommand::FillRect { .. })));
    }

    #[test]
    fn test_unbalanced_clip_end_fails() {
        let mut tree = Tree::new();
        let root = tree.insert(
            WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_painter(|ctx: &mut PaintCtx<'_>| ctx.emit(DrawCommand::ClipEnd)),
        );

        let err = DrawCommandBuilder::build(&tree, root, &FrameParams::default()).unwrap_err();
        assert_eq!(err, BuildError::UnbalancedClip);
    }

    #[test]
    fn test_open_clip_left_dangling_fails() {
        let mut tree = Tree::new();
        let root = tree.insert(
            WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0)).with_painter(
                |ctx: &mut PaintCtx<'_>| {
                    ctx.emit(DrawCommand::RoundedClipBegin {
                        rect: Rect::new(0.0, 0.0, 5.0, 5.0),
                        radius: 0.0,
                    });
                },
            ),
        );

        let err = DrawCommandBuilder::build(&tree, root, &FrameParams::default()).unwrap_err();
        assert_eq!(err, BuildError::UnbalancedClip);
    }
}
