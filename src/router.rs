//! Hit-testing and event routing.
//!
//! Pointer events go to the grab holder when a grab is active, otherwise
//! to the deepest widget under the point in reverse paint order: the
//! topmost thing painted at a point is the thing that gets clicked.
//! Keyboard events skip hit-testing entirely and bubble up the focus
//! chain until a handler claims them; reaching the root unhandled is not
//! an error, the event is silently dropped.
//!
//! Grab and focus state live on the router instance: one router per
//! window, persisting across frames until mutated by event handling.

use log::trace;

use crate::input::{EventResponse, InputEvent};
use crate::scheduler::RedrawScheduler;
use crate::tree::{Tree, WidgetId};

/// Side-effect requests collected while a handler runs and applied after
/// it returns, so handlers never mutate routing state mid-dispatch.
#[derive(Default)]
struct CtxRequests {
    grab: Option<GrabRequest>,
    focus: Option<FocusRequest>,
}

enum GrabRequest {
    Capture(WidgetId),
    Release,
}

enum FocusRequest {
    Focus(WidgetId),
    Clear,
}

/// Handler-side context for the widget currently receiving an event.
pub struct EventCtx<'a> {
    widget: WidgetId,
    tree: &'a mut Tree,
    scheduler: &'a RedrawScheduler,
    requests: &'a mut CtxRequests,
}

impl EventCtx<'_> {
    /// The widget this event was dispatched to.
    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    /// Mutable tree access for state changes from within a handler.
    pub fn tree(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    /// Invalidate the frame on behalf of this widget.
    pub fn request_redraw(&self) {
        self.scheduler.queue_draw(self.widget);
    }

    /// Route all pointer events to this widget until release, bypassing
    /// hit-testing. Acquiring while another widget holds the grab revokes
    /// it (last caller wins); the deposed holder receives a synthetic
    /// [`InputEvent::GrabLost`].
    pub fn capture_until_release(&mut self) {
        self.requests.grab = Some(GrabRequest::Capture(self.widget));
    }

    /// Explicitly drop the pointer grab.
    pub fn release_capture(&mut self) {
        self.requests.grab = Some(GrabRequest::Release);
    }

    /// Make this widget the keyboard focus leaf.
    pub fn request_focus(&mut self) {
        self.requests.focus = Some(FocusRequest::Focus(self.widget));
    }

    /// Clear keyboard focus entirely.
    pub fn release_focus(&mut self) {
        self.requests.focus = Some(FocusRequest::Clear);
    }
}

/// Routes input events through the widget tree with grab/focus semantics.
pub struct EventRouter {
    grab: Option<WidgetId>,
    hover: Option<WidgetId>,
    focus: Option<WidgetId>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            grab: None,
            hover: None,
            focus: None,
        }
    }

    /// The current pointer grab holder, if any.
    pub fn grab_holder(&self) -> Option<WidgetId> {
        self.grab
    }

    /// The widget currently under the pointer, if any.
    pub fn hovered(&self) -> Option<WidgetId> {
        self.hover
    }

    /// The keyboard focus leaf, if any.
    pub fn focused(&self) -> Option<WidgetId> {
        self.focus
    }

    /// Set the keyboard focus leaf directly (host-side focus changes).
    pub fn set_focus(&mut self, tree: &Tree, id: WidgetId) {
        if tree.contains(id) {
            self.focus = Some(id);
        }
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    /// Acquire the pointer grab for `widget`.
    ///
    /// Last caller wins: a grab held by another widget is implicitly
    /// revoked, and the deposed holder receives a synthetic
    /// [`InputEvent::GrabLost`] so it can reset local state. No error is
    /// raised.
    pub fn capture_until_release(
        &mut self,
        tree: &mut Tree,
        scheduler: &RedrawScheduler,
        widget: WidgetId,
    ) {
        if !tree.contains(widget) {
            return;
        }
        let previous = self.grab.replace(widget);
        if let Some(previous) = previous.filter(|p| *p != widget) {
            trace!("grab moved {:?} -> {:?}", previous, widget);
            if tree.contains(previous) {
                self.deliver_pointer(tree, scheduler, previous, &InputEvent::GrabLost);
            }
        }
    }

    /// Drop the pointer grab if `widget` holds it.
    pub fn release_capture(&mut self, widget: WidgetId) {
        if self.grab == Some(widget) {
            self.grab = None;
        }
    }

    /// Resolve the widget at a point, in reverse paint order.
    ///
    /// Walks topmost z-order first at each level; a widget is hit when the
    /// point lies within its bounding rect and inside every ancestor clip.
    /// The first hit at the deepest matching leaf wins, which mirrors
    /// paint order exactly. Empty or fully invisible trees resolve to
    /// `None`; not an error, the event is simply undelivered.
    pub fn hit_test(tree: &Tree, root: WidgetId, x: f32, y: f32) -> Option<WidgetId> {
        let node = tree.node(root)?;
        if !node.visible {
            return None;
        }

        // Children live in this widget's local space
        let local_x = x - node.bounds.x;
        let local_y = y - node.bounds.y;

        // A clipped ancestor prunes the whole subtree (degenerate clip
        // rects clip nothing, matching the builder)
        if let Some(clip) = node.clip.filter(|c| !c.rect.is_degenerate()) {
            if !clip
                .rect
                .contains_rounded(local_x, local_y, clip.corner_radius)
            {
                return None;
            }
        }

        for child in tree.children_in_paint_order(root).into_iter().rev() {
            if let Some(hit) = Self::hit_test(tree, child, local_x, local_y) {
                return Some(hit);
            }
        }

        node.bounds.contains(x, y).then_some(root)
    }

    /// Route one input event. Returns the widget the event was delivered
    /// to, or `None` if it was undelivered (no hit, no focus, or dropped
    /// at the root).
    ///
    /// Coordinates are logical units in root space; the host applies the
    /// device-scale conversion before handing events in.
    pub fn dispatch(
        &mut self,
        tree: &mut Tree,
        root: WidgetId,
        scheduler: &RedrawScheduler,
        event: &InputEvent,
    ) -> Option<WidgetId> {
        match event {
            InputEvent::PointerPress { x, y, .. } => {
                let target = self.pointer_target(tree, root, *x, *y)?;
                trace!("press -> {:?}", target);
                self.deliver_pointer(tree, scheduler, target, event);
                Some(target)
            }

            InputEvent::PointerRelease { x, y, .. } => {
                let target = self.pointer_target(tree, root, *x, *y)?;
                self.deliver_pointer(tree, scheduler, target, event);
                // A release clears the grab held by the releasing widget
                if self.grab == Some(target) {
                    self.grab = None;
                }
                Some(target)
            }

            InputEvent::PointerMotion { x, y } => {
                if let Some(grabbed) = self.live_grab(tree) {
                    // Grabs redirect motion regardless of hit-test result
                    self.deliver_pointer(tree, scheduler, grabbed, event);
                    return Some(grabbed);
                }

                let hit = Self::hit_test(tree, root, *x, *y);
                self.update_hover(tree, scheduler, hit, *x, *y);
                let target = hit?;
                self.deliver_pointer(tree, scheduler, target, event);
                Some(target)
            }

            InputEvent::KeyPress { .. } => {
                // Keyboard bypasses hit-testing: focus leaf first, then
                // bubble to each ancestor while unhandled
                let focused = self.focus.filter(|f| tree.contains(*f))?;
                for widget in tree.ancestor_chain(focused) {
                    if self.deliver_key(tree, scheduler, widget, event) == EventResponse::Handled {
                        return Some(widget);
                    }
                }
                None
            }

            // Synthetic events originate in the router; fed from outside
            // they are dropped
            InputEvent::PointerEnter { .. } | InputEvent::PointerLeave | InputEvent::GrabLost => {
                None
            }
        }
    }

    /// Grab holder if alive, else hit-test.
    fn pointer_target(
        &mut self,
        tree: &Tree,
        root: WidgetId,
        x: f32,
        y: f32,
    ) -> Option<WidgetId> {
        self.live_grab(tree)
            .or_else(|| Self::hit_test(tree, root, x, y))
    }

    fn live_grab(&mut self, tree: &Tree) -> Option<WidgetId> {
        if let Some(grabbed) = self.grab {
            if tree.contains(grabbed) {
                return Some(grabbed);
            }
            // Holder was removed from the tree; grab dies with it
            self.grab = None;
        }
        None
    }

    fn update_hover(
        &mut self,
        tree: &mut Tree,
        scheduler: &RedrawScheduler,
        new_hover: Option<WidgetId>,
        x: f32,
        y: f32,
    ) {
        if self.hover == new_hover {
            return;
        }

        if let Some(old) = self.hover.take() {
            if tree.contains(old) {
                self.deliver_pointer(tree, scheduler, old, &InputEvent::PointerLeave);
            }
        }
        if let Some(new) = new_hover {
            self.deliver_pointer(tree, scheduler, new, &InputEvent::PointerEnter { x, y });
        }
        self.hover = new_hover;
    }

    fn deliver_pointer(
        &mut self,
        tree: &mut Tree,
        scheduler: &RedrawScheduler,
        target: WidgetId,
        event: &InputEvent,
    ) -> EventResponse {
        let mut listeners = tree.take_pointer_listeners(target);
        let mut requests = CtxRequests::default();
        let mut response = EventResponse::Ignored;

        for listener in &mut listeners {
            // Button filtering applies only to events that carry a button
            if let Some(button) = event.button() {
                if !listener.filter.matches(button) {
                    continue;
                }
            }

            let mut ctx = EventCtx {
                widget: target,
                tree: &mut *tree,
                scheduler,
                requests: &mut requests,
            };
            if (listener.callback)(&mut ctx, event) == EventResponse::Handled {
                response = EventResponse::Handled;
            }
        }

        tree.restore_pointer_listeners(target, listeners);
        self.apply_requests(tree, scheduler, requests);
        response
    }

    fn deliver_key(
        &mut self,
        tree: &mut Tree,
        scheduler: &RedrawScheduler,
        target: WidgetId,
        event: &InputEvent,
    ) -> EventResponse {
        let mut listeners = tree.take_key_listeners(target);
        let mut requests = CtxRequests::default();
        let mut response = EventResponse::Ignored;

        for listener in &mut listeners {
            let mut ctx = EventCtx {
                widget: target,
                tree: &mut *tree,
                scheduler,
                requests: &mut requests,
            };
            if (listener.callback)(&mut ctx, event) == EventResponse::Handled {
                response = EventResponse::Handled;
            }
        }

        tree.restore_key_listeners(target, listeners);
        self.apply_requests(tree, scheduler, requests);
        response
    }

    fn apply_requests(
        &mut self,
        tree: &mut Tree,
        scheduler: &RedrawScheduler,
        requests: CtxRequests,
    ) {
        match requests.grab {
            Some(GrabRequest::Capture(widget)) => {
                self.capture_until_release(tree, scheduler, widget);
            }
            Some(GrabRequest::Release) => {
                self.grab = None;
            }
            None => {}
        }

        match requests.focus {
            Some(FocusRequest::Focus(widget)) => {
                self.focus = Some(widget);
            }
            Some(FocusRequest::Clear) => {
                self.focus = None;
            }
            None => {}
        }
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}
