//! Nested transform and clip state for frame building.
//!
//! The stack starts with a single root entry (identity transform, no
//! clip). `save` pushes a copy of the top; mutations compose into the top
//! only; `restore` pops and discards them. Every `save` has exactly one
//! matching `restore`: popping the root entry is a
//! [`StackError::StackUnderflow`], a fatal builder logic error.

use crate::error::StackError;
use crate::transform::Transform;
use crate::widgets::{Point, Rect};

/// A rounded clip region in root-logical space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedClip {
    /// Axis-aligned clip bounds
    pub rect: Rect,
    /// Corner radius; the tighter radius survives intersection
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
struct StackEntry {
    /// Full composition from root space down to the current local space
    transform: Transform,
    /// Effective clip: the intersection of every clip from root to here
    clip: Option<RoundedClip>,
}

/// Maintains nested coordinate transforms and clip regions.
pub struct TransformClipStack {
    stack: Vec<StackEntry>,
}

impl TransformClipStack {
    pub fn new() -> Self {
        Self {
            stack: vec![StackEntry {
                transform: Transform::IDENTITY,
                clip: None,
            }],
        }
    }

    /// Current nesting depth (1 for a fresh stack).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn top(&self) -> &StackEntry {
        self.stack.last().expect("stack always holds the root entry")
    }

    fn top_mut(&mut self) -> &mut StackEntry {
        self.stack
            .last_mut()
            .expect("stack always holds the root entry")
    }

    /// Push a copy of the current transform+clip as the new top.
    pub fn save(&mut self) {
        let top = *self.top();
        self.stack.push(top);
    }

    /// Pop the top entry, discarding its mutations.
    pub fn restore(&mut self) -> Result<(), StackError> {
        if self.stack.len() <= 1 {
            return Err(StackError::StackUnderflow);
        }
        self.stack.pop();
        Ok(())
    }

    /// Compose a translation into the top entry.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        let top = self.top_mut();
        top.transform = top.transform.then(&Transform::translate(dx, dy));
    }

    /// Compose a scale into the top entry.
    pub fn scale(&mut self, sx: f32, sy: f32) {
        let top = self.top_mut();
        top.transform = top.transform.then(&Transform::scale_xy(sx, sy));
    }

    /// Compose a rotation (radians) into the top entry.
    pub fn rotate(&mut self, angle_radians: f32) {
        let top = self.top_mut();
        top.transform = top.transform.then(&Transform::rotate(angle_radians));
    }

    /// Intersect the current clip with a rounded rect given in the current
    /// local space.
    ///
    /// The rect is mapped into root space (axis-aligned bounding box when
    /// rotation is involved; conservative, nothing outside the clip ever
    /// shows) and the corner radius is scaled by the transform.
    pub fn set_clip(&mut self, rect: Rect, radius: f32) {
        let mapped = RoundedClip {
            rect: self.map_rect(rect),
            radius: radius * self.top().transform.scale_factor(),
        };

        let top = self.top_mut();
        top.clip = Some(match top.clip {
            Some(existing) => intersect_clips(&existing, &mapped),
            None => mapped,
        });
    }

    /// The intersection of clip rectangles from root to top, if any clip
    /// is active.
    pub fn current_clip(&self) -> Option<RoundedClip> {
        self.top().clip
    }

    /// The full composed transform from root space to the current local
    /// space.
    pub fn current_transform(&self) -> Transform {
        self.top().transform
    }

    /// Apply the full composed transform chain to a point.
    pub fn to_device_space(&self, point: Point) -> Point {
        let (x, y) = self.top().transform.transform_point(point.x, point.y);
        Point::new(x, y)
    }

    /// Map a local-space rect to its root-space axis-aligned bounding box.
    pub fn map_rect(&self, rect: Rect) -> Rect {
        let t = &self.top().transform;
        let corners = [
            t.transform_point(rect.x, rect.y),
            t.transform_point(rect.x + rect.width, rect.y),
            t.transform_point(rect.x, rect.y + rect.height),
            t.transform_point(rect.x + rect.width, rect.y + rect.height),
        ];

        let (min_x, max_x, min_y, max_y) = corners.iter().fold(
            (
                f32::INFINITY,
                f32::NEG_INFINITY,
                f32::INFINITY,
                f32::NEG_INFINITY,
            ),
            |(min_x, max_x, min_y, max_y), &(x, y)| {
                (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
            },
        );

        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

impl Default for TransformClipStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Intersection of two rounded clips: AABB intersection with the tighter
/// corner radius (clamps overlapping corners to the smaller rounding).
pub(crate) fn intersect_clips(a: &RoundedClip, b: &RoundedClip) -> RoundedClip {
    RoundedClip {
        rect: a.rect.intersection(&b.rect),
        radius: a.radius.min(b.radius),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_restore_balance() {
        let mut stack = TransformClipStack::new();
        let depth = stack.depth();

        stack.save();
        stack.save();
        assert_eq!(stack.depth(), depth + 2);

        stack.restore().unwrap();
        stack.restore().unwrap();
        assert_eq!(stack.depth(), depth);
    }

    #[test]
    fn test_restore_underflow() {
        let mut stack = TransformClipStack::new();
        assert_eq!(stack.restore(), Err(StackError::StackUnderflow));

        stack.save();
        stack.restore().unwrap();
        assert_eq!(stack.restore(), Err(StackError::StackUnderflow));
    }

    #[test]
    fn test_round_trip_identical() {
        let mut stack = TransformClipStack::new();
        stack.translate(3.0, 4.0);
        let before = stack.current_transform();

        stack.save();
        stack.translate(10.0, 20.0);
        stack.restore().unwrap();

        // Bit-for-bit: restore discards the copy, the original entry was
        // never touched
        assert_eq!(stack.current_transform().data, before.data);
    }

    #[test]
    fn test_translate_composes() {
        let mut stack = TransformClipStack::new();
        stack.translate(10.0, 0.0);
        stack.save();
        stack.translate(0.0, 5.0);

        let p = stack.to_device_space(Point::new(1.0, 1.0));
        assert_eq!((p.x, p.y), (11.0, 6.0));
    }

    #[test]
    fn test_clip_intersection_subset() {
        let mut stack = TransformClipStack::new();
        stack.set_clip(Rect::new(0.0, 0.0, 100.0, 100.0), 0.0);
        stack.save();
        stack.set_clip(Rect::new(10.0, 10.0, 20.0, 20.0), 0.0);

        // B ⊆ A yields effective clip B
        let clip = stack.current_clip().unwrap();
        assert_eq!(clip.rect, Rect::new(10.0, 10.0, 20.0, 20.0));

        // Popping restores A
        stack.restore().unwrap();
        assert_eq!(
            stack.current_clip().unwrap().rect,
            Rect::new(0.0, 0.0, 100.0, 100.0)
        );
    }

    #[test]
    fn test_clip_intersection_disjoint_is_empty() {
        let mut stack = TransformClipStack::new();
        stack.set_clip(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0);
        stack.set_clip(Rect::new(50.0, 50.0, 10.0, 10.0), 0.0);

        let clip = stack.current_clip().unwrap();
        assert!(clip.rect.is_degenerate());
    }

    #[test]
    fn test_clip_radius_clamps_to_tighter() {
        let mut stack = TransformClipStack::new();
        stack.set_clip(Rect::new(0.0, 0.0, 100.0, 100.0), 12.0);
        stack.set_clip(Rect::new(0.0, 0.0, 100.0, 100.0), 4.0);

        assert_eq!(stack.current_clip().unwrap().radius, 4.0);
    }

    #[test]
    fn test_clip_respects_transform() {
        let mut stack = TransformClipStack::new();
        stack.translate(100.0, 0.0);
        stack.set_clip(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0);

        let clip = stack.current_clip().unwrap();
        assert_eq!(clip.rect, Rect::new(100.0, 0.0, 10.0, 10.0));
        assert_eq!(clip.radius, 2.0);
    }

    #[test]
    fn test_clip_radius_scales() {
        let mut stack = TransformClipStack::new();
        stack.scale(2.0, 2.0);
        stack.set_clip(Rect::new(0.0, 0.0, 10.0, 10.0), 3.0);

        let clip = stack.current_clip().unwrap();
        assert_eq!(clip.rect, Rect::new(0.0, 0.0, 20.0, 20.0));
        assert!((clip.radius - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_map_rect_rotation_aabb() {
        let mut stack = TransformClipStack::new();
        stack.rotate(std::f32::consts::FRAC_PI_2);

        // Unit square rotated 90° CCW lands at x ∈ [-1, 0], y ∈ [0, 1]
        let mapped = stack.map_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!((mapped.x - -1.0).abs() < 1e-5);
        assert!(mapped.y.abs() < 1e-5);
        assert!((mapped.width - 1.0).abs() < 1e-5);
        assert!((mapped.height - 1.0).abs() < 1e-5);
    }
}
