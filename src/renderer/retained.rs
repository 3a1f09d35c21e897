//! Retained scene-graph backend.
//!
//! Translates a command list into a tree of [`SceneNode`]s suitable for a
//! hardware compositor: clip scopes become nodes, primitives hang off the
//! scope they were emitted in, and geometry is device-scaled during
//! translation (the single scale application point for this backend).
//!
//! The renderer owns the previous frame's tree and diffs the new one
//! against it so a compositor can re-submit unchanged subtrees cheaply.
//! The old tree is discarded before the new one is installed: a
//! single-owner swap, never a merge.

use log::debug;

use crate::error::RenderError;
use crate::renderer::commands::{CommandList, DrawCommand};
use crate::renderer::text::GlyphRun;
use crate::renderer::texture::TextureHandle;
use crate::renderer::Renderer;
use crate::widgets::{Color, Point, Rect};

/// Device-space rounded clip carried by a scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneClip {
    pub rect: Rect,
    pub radius: f32,
}

/// A leaf paint operation in device space.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenePrimitive {
    Rect {
        rect: Rect,
        color: Color,
    },
    Texture {
        handle: TextureHandle,
        dest_rect: Rect,
    },
    Text {
        glyphs: GlyphRun,
        origin: Point,
        color: Color,
    },
    Path {
        points: Vec<Point>,
        width: f32,
        color: Color,
    },
}

/// A node of the retained scene graph.
///
/// Children correspond to nested clip scopes; primitive order within a
/// node preserves paint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneNode {
    /// Clip applied to this node and its subtree (`None` for the root)
    pub clip: Option<SceneClip>,
    /// Primitives painted directly in this scope, in paint order
    pub primitives: Vec<ScenePrimitive>,
    /// Nested clip scopes, in paint order
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Total node count of this subtree (including self).
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SceneNode::subtree_len).sum::<usize>()
    }
}

/// Summary of how a new frame's tree relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameDelta {
    /// Nodes identical to their previous-frame counterpart (whole subtree
    /// unchanged, safe for cheap re-submission)
    pub reused: usize,
    /// Nodes that changed or are new this frame
    pub updated: usize,
}

/// The hardware compositing seam.
///
/// Receives each frame's scene tree plus the diff summary; command
/// submission specifics live behind this trait and are out of scope here.
pub trait Compositor {
    fn present(&mut self, root: &SceneNode, delta: &FrameDelta);
}

/// Renderer backend that retains the previous frame's scene tree.
pub struct RetainedRenderer {
    previous: Option<SceneNode>,
}

impl RetainedRenderer {
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// The currently retained tree, if a frame has been rendered.
    pub fn retained_tree(&self) -> Option<&SceneNode> {
        self.previous.as_ref()
    }

    /// Translate a command list into a scene tree, applying the device
    /// scale to all geometry.
    fn translate(list: &CommandList, device_scale: f32) -> Result<SceneNode, RenderError> {
        // Stack of open clip scopes; index 0 is the root
        let mut scopes: Vec<SceneNode> = vec![SceneNode::default()];

        for command in list {
            match command {
                DrawCommand::RoundedClipBegin { rect, radius } => {
                    scopes.push(SceneNode {
                        clip: Some(SceneClip {
                            rect: scale_rect(*rect, device_scale),
                            radius: radius * device_scale,
                        }),
                        primitives: Vec::new(),
                        children: Vec::new(),
                    });
                }

                DrawCommand::ClipEnd => {
                    if scopes.len() <= 1 {
                        return Err(RenderError::UnbalancedClip);
                    }
                    let finished = scopes.pop().expect("scope stack checked above");
                    scopes
                        .last_mut()
                        .expect("root scope always present")
                        .children
                        .push(finished);
                }

                DrawCommand::FillRect { rect, color } => {
                    current(&mut scopes).primitives.push(ScenePrimitive::Rect {
                        rect: scale_rect(*rect, device_scale),
                        color: *color,
                    });
                }

                DrawCommand::Texture { handle, dest_rect } => {
                    current(&mut scopes)
                        .primitives
                        .push(ScenePrimitive::Texture {
                            handle: *handle,
                            dest_rect: scale_rect(*dest_rect, device_scale),
                        });
                }

                DrawCommand::TextRun {
                    glyphs,
                    origin,
                    color,
                } => {
                    current(&mut scopes).primitives.push(ScenePrimitive::Text {
                        glyphs: glyphs.clone(),
                        origin: Point::new(origin.x * device_scale, origin.y * device_scale),
                        color: *color,
                    });
                }

                DrawCommand::StrokePath {
                    points,
                    width,
                    color,
                } => {
                    current(&mut scopes).primitives.push(ScenePrimitive::Path {
                        points: points
                            .iter()
                            .map(|p| Point::new(p.x * device_scale, p.y * device_scale))
                            .collect(),
                        width: width * device_scale,
                        color: *color,
                    });
                }
            }
        }

        if scopes.len() != 1 {
            return Err(RenderError::UnbalancedClip);
        }
        Ok(scopes.pop().expect("root scope always present"))
    }

    /// Count reusable vs. updated nodes between two trees.
    ///
    /// A node whose whole subtree equals its previous counterpart is
    /// reusable; otherwise it is updated and its children are compared
    /// pairwise by position.
    fn diff(previous: Option<&SceneNode>, next: &SceneNode) -> FrameDelta {
        let mut delta = FrameDelta::default();
        Self::diff_node(previous, next, &mut delta);
        delta
    }

    fn diff_node(previous: Option<&SceneNode>, next: &SceneNode, delta: &mut FrameDelta) {
        match previous {
            Some(prev) if prev == next => {
                delta.reused += next.subtree_len();
            }
            Some(prev) => {
                delta.updated += 1;
                for (i, child) in next.children.iter().enumerate() {
                    Self::diff_node(prev.children.get(i), child, delta);
                }
            }
            None => {
                delta.updated += 1;
                for child in &next.children {
                    Self::diff_node(None, child, delta);
                }
            }
        }
    }
}

impl Default for RetainedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn current(scopes: &mut [SceneNode]) -> &mut SceneNode {
    scopes.last_mut().expect("root scope always present")
}

fn scale_rect(rect: Rect, scale: f32) -> Rect {
    Rect::new(
        rect.x * scale,
        rect.y * scale,
        rect.width * scale,
        rect.height * scale,
    )
}

impl Renderer for RetainedRenderer {
    /// The compositor is the target "surface" of this backend.
    type Surface = Box<dyn Compositor>;

    fn render(
        &mut self,
        list: CommandList,
        surface: &mut Box<dyn Compositor>,
        device_scale: f32,
    ) -> Result<(), RenderError> {
        let next = Self::translate(&list, device_scale)?;
        let delta = Self::diff(self.previous.as_ref(), &next);

        debug!(
            "retained frame: {} nodes reused, {} updated",
            delta.reused, delta.updated
        );

        // Single-owner swap: drop the old tree before installing the new
        // one, never merge the two
        self.previous = None;
        surface.present(&next, &delta);
        self.previous = Some(next);

        Ok(())
    }
}
