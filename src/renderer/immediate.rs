//! Immediate software rasterization backend.
//!
//! Executes a command list strictly in order against a
//! [`tiny_skia::Pixmap`], O(commands) per frame, with no state retained
//! between frames. Clips form a stack of alpha masks; nested masks are
//! combined by per-pixel multiply so the effective clip is always the
//! intersection of every open clip.
//!
//! The device-scale factor is applied here, once, by routing all geometry
//! through a scale transform, so logical units never meet physical pixels
//! anywhere else.

use std::collections::HashMap;

use log::warn;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, MaskType, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

use crate::error::RenderError;
use crate::renderer::commands::{CommandList, DrawCommand};
use crate::renderer::{RenderWarning, Renderer};
use crate::widgets::{Color, Point, Rect};

/// Placeholder fill for missing textures.
const PLACEHOLDER_COLOR: Color = Color::rgba(0.8, 0.8, 0.8, 1.0);

/// Fraction of the font size used for the glyph-box text placeholder.
const GLYPH_ASCENT_RATIO: f32 = 0.8;

pub struct ImmediateRenderer {
    /// Uploaded texture pixels, keyed by handle id
    textures: HashMap<u64, Pixmap>,
    warnings: Vec<RenderWarning>,
}

impl ImmediateRenderer {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Upload texture pixels for a handle id.
    ///
    /// The pixmap holds the texture's native pixels; scaling to the
    /// logical destination rect happens at draw time.
    pub fn register_texture(&mut self, id: u64, pixels: Pixmap) {
        self.textures.insert(id, pixels);
    }

    /// Drop an uploaded texture.
    pub fn unregister_texture(&mut self, id: u64) {
        self.textures.remove(&id);
    }

    /// Recoverable failures recorded since the last call (missing
    /// textures). Draining does not affect rendered output.
    pub fn take_warnings(&mut self) -> Vec<RenderWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn fill_rect(
        surface: &mut Pixmap,
        rect: Rect,
        color: Color,
        scale: Transform,
        mask: Option<&Mask>,
    ) {
        if rect.is_degenerate() || color.a <= 0.0 {
            return;
        }

        if let Some(skia_rect) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
        {
            let path = PathBuilder::from_rect(skia_rect);
            let paint = make_paint(color);
            surface.fill_path(&path, &paint, FillRule::Winding, scale, mask);
        }
    }
}

impl Default for ImmediateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for ImmediateRenderer {
    type Surface = Pixmap;

    fn render(
        &mut self,
        list: CommandList,
        surface: &mut Pixmap,
        device_scale: f32,
    ) -> Result<(), RenderError> {
        if surface.width() == 0 || surface.height() == 0 {
            return Err(RenderError::InvalidSurface);
        }

        let scale = Transform::from_scale(device_scale, device_scale);
        let mut clip_stack: Vec<Mask> = Vec::new();

        for command in &list {
            let mask = clip_stack.last();
            match command {
                DrawCommand::FillRect { rect, color } => {
                    Self::fill_rect(surface, *rect, *color, scale, mask);
                }

                DrawCommand::RoundedClipBegin { rect, radius } => {
                    let combined = build_clip_mask(surface, *rect, *radius, scale, mask);
                    clip_stack.push(combined);
                }

                DrawCommand::ClipEnd => {
                    // Balanced pairs are a builder invariant; guard anyway
                    // for hand-assembled lists
                    clip_stack.pop().ok_or(RenderError::UnbalancedClip)?;
                }

                DrawCommand::Texture { handle, dest_rect } => {
                    match self.textures.get(&handle.id) {
                        Some(pixels) if pixels.width() > 0 && pixels.height() > 0 => {
                            // Map the texture's native pixels onto the
                            // logical destination, then through the device
                            // scale: the one and only scale application
                            let sx = dest_rect.width * device_scale / pixels.width() as f32;
                            let sy = dest_rect.height * device_scale / pixels.height() as f32;
                            let transform = Transform::from_row(
                                sx,
                                0.0,
                                0.0,
                                sy,
                                dest_rect.x * device_scale,
                                dest_rect.y * device_scale,
                            );
                            surface.draw_pixmap(
                                0,
                                0,
                                pixels.as_ref(),
                                &PixmapPaint::default(),
                                transform,
                                mask,
                            );
                        }
                        _ => {
                            // Recoverable: placeholder fill, report, keep
                            // going with the rest of the frame
                            warn!("texture {} missing, drawing placeholder", handle.id);
                            self.warnings
                                .push(RenderWarning::MissingTexture { handle: handle.id });
                            Self::fill_rect(surface, *dest_rect, PLACEHOLDER_COLOR, scale, mask);
                        }
                    }
                }

                DrawCommand::TextRun {
                    glyphs,
                    origin,
                    color,
                } => {
                    // Glyph-box placeholder; real rasterization lives in
                    // the host's text stack behind the shaping seam
                    for glyph in &glyphs.glyphs {
                        let rect = Rect::new(
                            origin.x + glyph.offset.x,
                            origin.y + glyph.offset.y - glyphs.size * GLYPH_ASCENT_RATIO,
                            glyph.advance * 0.85,
                            glyphs.size * 0.9,
                        );
                        Self::fill_rect(surface, rect, *color, scale, mask);
                    }
                }

                DrawCommand::StrokePath {
                    points,
                    width,
                    color,
                } => {
                    if let Some(path) = polyline_path(points) {
                        let paint = make_paint(*color);
                        let stroke = Stroke {
                            width: *width,
                            line_cap: LineCap::Round,
                            line_join: LineJoin::Round,
                            ..Stroke::default()
                        };
                        surface.stroke_path(&path, &paint, &stroke, scale, mask);
                    }
                }
            }
        }

        if !clip_stack.is_empty() {
            return Err(RenderError::UnbalancedClip);
        }

        Ok(())
    }
}

fn make_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(
        (color.r.clamp(0.0, 1.0) * 255.0) as u8,
        (color.g.clamp(0.0, 1.0) * 255.0) as u8,
        (color.b.clamp(0.0, 1.0) * 255.0) as u8,
        (color.a.clamp(0.0, 1.0) * 255.0) as u8,
    );
    paint.anti_alias = true;
    paint
}

fn polyline_path(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}

/// Rasterize a rounded clip rect into an alpha mask, intersected with the
/// currently innermost mask when one is open.
fn build_clip_mask(
    surface: &Pixmap,
    rect: Rect,
    radius: f32,
    scale: Transform,
    parent: Option<&Mask>,
) -> Mask {
    let mut mask_pixmap = Pixmap::new(surface.width(), surface.height())
        .expect("surface dimensions already validated");

    if let Some(path) = rounded_rect_path(rect, radius) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = true;
        mask_pixmap.fill_path(&path, &paint, FillRule::Winding, scale, None);
    }

    let mut mask = Mask::from_pixmap(mask_pixmap.as_ref(), MaskType::Alpha);
    if let Some(parent) = parent {
        intersect_masks(&mut mask, parent);
    }
    mask
}

/// Per-pixel multiply: the result admits a pixel only where both masks do.
fn intersect_masks(into: &mut Mask, other: &Mask) {
    if into.width() != other.width() || into.height() != other.height() {
        return;
    }

    for (dst, src) in into.data_mut().iter_mut().zip(other.data().iter()) {
        let multiplied = (*dst as u16 * *src as u16 + 127) / 255;
        *dst = multiplied as u8;
    }
}

/// Rounded rect outline with cubic-bezier corners.
fn rounded_rect_path(rect: Rect, radius: f32) -> Option<tiny_skia::Path> {
    if rect.is_degenerate() {
        return None;
    }

    let r = radius
        .max(0.0)
        .min(rect.width / 2.0)
        .min(rect.height / 2.0);

    if r <= 0.0 {
        let skia_rect = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)?;
        return Some(PathBuilder::from_rect(skia_rect));
    }

    // Cubic bezier circle-arc approximation: 4/3 * tan(π/8)
    const KAPPA: f32 = 0.552_284_8;
    let k = r * (1.0 - KAPPA);

    let left = rect.x;
    let top = rect.y;
    let right = rect.x + rect.width;
    let bottom = rect.y + rect.height;

    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.cubic_to(right - k, top, right, top + k, right, top + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - k, right - k, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.cubic_to(left + k, bottom, left, bottom - k, left, bottom - r);
    pb.line_to(left, top + r);
    pb.cubic_to(left, top + k, left + k, top, left + r, top);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::commands::CommandList;
    use crate::renderer::texture::{PixelFormat, TextureHandle};

    fn list(commands: Vec<DrawCommand>) -> CommandList {
        CommandList::from_commands(commands)
    }

    fn pixel_alpha(surface: &Pixmap, x: u32, y: u32) -> u8 {
        surface.pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
    }

    fn pixel_rgb(surface: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
        let p = surface.pixel(x, y).unwrap();
        (p.red(), p.green(), p.blue())
    }

    #[test]
    fn test_fill_rect_writes_pixels() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(100, 100).unwrap();

        let commands = list(vec![DrawCommand::FillRect {
            rect: Rect::new(10.0, 10.0, 20.0, 20.0),
            color: Color::rgb(1.0, 0.0, 0.0),
        }]);
        renderer.render(commands, &mut surface, 1.0).unwrap();

        assert_eq!(pixel_rgb(&surface, 15, 15), (255, 0, 0));
        assert_eq!(pixel_alpha(&surface, 50, 50), 0);
    }

    #[test]
    fn test_device_scale_applied_once() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(100, 100).unwrap();

        // Logical (10,10,20,20) at scale 2 covers physical (20,20)-(60,60)
        let commands = list(vec![DrawCommand::FillRect {
            rect: Rect::new(10.0, 10.0, 20.0, 20.0),
            color: Color::rgb(0.0, 1.0, 0.0),
        }]);
        renderer.render(commands, &mut surface, 2.0).unwrap();

        assert_eq!(pixel_alpha(&surface, 30, 30), 255);
        assert_eq!(pixel_alpha(&surface, 55, 55), 255);
        assert_eq!(pixel_alpha(&surface, 15, 15), 0);
        assert_eq!(pixel_alpha(&surface, 65, 65), 0);
    }

    #[test]
    fn test_rounded_clip_scenario() {
        // 100×100 container clipped to a 50×50 rounded rect (radius 10)
        // with a child filling (0,0,100,100): color only inside the
        // rounded region
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(100, 100).unwrap();

        let commands = list(vec![
            DrawCommand::RoundedClipBegin {
                rect: Rect::new(0.0, 0.0, 50.0, 50.0),
                radius: 10.0,
            },
            DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 100.0, 100.0),
                color: Color::rgb(0.0, 0.0, 1.0),
            },
            DrawCommand::ClipEnd,
        ]);
        renderer.render(commands, &mut surface, 1.0).unwrap();

        // Center of the clip: painted
        assert_eq!(pixel_alpha(&surface, 25, 25), 255);
        // Outside the 50×50 region: untouched
        assert_eq!(pixel_alpha(&surface, 75, 25), 0);
        assert_eq!(pixel_alpha(&surface, 25, 75), 0);
        // Sharp corner of the bounding box, outside the r=10 rounding
        assert_eq!(pixel_alpha(&surface, 1, 1), 0);
        // Just inside the corner arc
        assert_eq!(pixel_alpha(&surface, 10, 10), 255);
    }

    #[test]
    fn test_disjoint_nested_clips_suppress_draws() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(100, 100).unwrap();

        let commands = list(vec![
            DrawCommand::RoundedClipBegin {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                radius: 0.0,
            },
            DrawCommand::RoundedClipBegin {
                rect: Rect::new(50.0, 50.0, 10.0, 10.0),
                radius: 0.0,
            },
            DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 100.0, 100.0),
                color: Color::WHITE,
            },
            DrawCommand::ClipEnd,
            DrawCommand::ClipEnd,
        ]);
        renderer.render(commands, &mut surface, 1.0).unwrap();

        // Intersection of disjoint clips is empty: nothing painted
        assert_eq!(pixel_alpha(&surface, 5, 5), 0);
        assert_eq!(pixel_alpha(&surface, 55, 55), 0);
    }

    #[test]
    fn test_unbalanced_clip_end_rejected() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(10, 10).unwrap();

        let commands = list(vec![DrawCommand::ClipEnd]);
        let err = renderer.render(commands, &mut surface, 1.0).unwrap_err();
        assert_eq!(err, RenderError::UnbalancedClip);
    }

    #[test]
    fn test_dangling_clip_rejected() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(10, 10).unwrap();

        let commands = list(vec![DrawCommand::RoundedClipBegin {
            rect: Rect::new(0.0, 0.0, 5.0, 5.0),
            radius: 0.0,
        }]);
        let err = renderer.render(commands, &mut surface, 1.0).unwrap_err();
        assert_eq!(err, RenderError::UnbalancedClip);
    }

    #[test]
    fn test_missing_texture_placeholder() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(50, 50).unwrap();

        let handle = TextureHandle::new(42, 16, 16, PixelFormat::Rgba8Premultiplied);
        let commands = list(vec![DrawCommand::Texture {
            handle,
            dest_rect: Rect::new(0.0, 0.0, 20.0, 20.0),
        }]);
        renderer.render(commands, &mut surface, 1.0).unwrap();

        // Placeholder drawn, failure reported, frame not aborted
        assert!(pixel_alpha(&surface, 10, 10) > 0);
        let warnings = renderer.take_warnings();
        assert_eq!(warnings, vec![RenderWarning::MissingTexture { handle: 42 }]);
        assert!(renderer.take_warnings().is_empty());
    }

    #[test]
    fn test_registered_texture_drawn_at_logical_size() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(50, 50).unwrap();

        // 4×4 native texture stretched to a 20×20 logical destination:
        // native pixel size must not leak into placement
        let mut pixels = Pixmap::new(4, 4).unwrap();
        pixels.fill(tiny_skia::Color::from_rgba(1.0, 0.0, 0.0, 1.0).unwrap());
        renderer.register_texture(7, pixels);

        let handle = TextureHandle::new(7, 4, 4, PixelFormat::Rgba8Premultiplied);
        let commands = list(vec![DrawCommand::Texture {
            handle,
            dest_rect: Rect::new(10.0, 10.0, 20.0, 20.0),
        }]);
        renderer.render(commands, &mut surface, 1.0).unwrap();

        assert_eq!(pixel_alpha(&surface, 20, 20), 255);
        assert_eq!(pixel_alpha(&surface, 28, 28), 255);
        assert_eq!(pixel_alpha(&surface, 5, 5), 0);
        assert!(renderer.take_warnings().is_empty());
    }

    #[test]
    fn test_stroke_path() {
        let mut renderer = ImmediateRenderer::new();
        let mut surface = Pixmap::new(50, 50).unwrap();

        let commands = list(vec![DrawCommand::StrokePath {
            points: vec![Point::new(5.0, 25.0), Point::new(45.0, 25.0)],
            width: 4.0,
            color: Color::BLACK,
        }]);
        renderer.render(commands, &mut surface, 1.0).unwrap();

        assert_eq!(pixel_alpha(&surface, 25, 25), 255);
        assert_eq!(pixel_alpha(&surface, 25, 5), 0);
    }
}
