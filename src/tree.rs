//! Arena-based widget storage.
//!
//! The tree stores all widget nodes in a dense Vec for cache-friendly
//! traversal, with a sparse map for O(1) lookup by [`WidgetId`].
//! Generational indices prevent stale ids from aliasing reused slots.
//!
//! Ownership follows the tree: removing a node releases its whole subtree.
//! The parent link is a non-owning back-reference used for focus-chain
//! walking; children are an ordered sequence, and paint order among
//! siblings is ascending z-index with insertion order breaking ties.
//!
//! Tree structure is mutated only on the UI thread. Cross-thread callers
//! interact with the engine through
//! [`InvalidationHandle`](crate::scheduler::InvalidationHandle) and
//! [`RemoteQueue`](crate::tasks::RemoteQueue) instead.

use crate::input::{ButtonFilter, EventResponse, InputEvent};
use crate::router::EventCtx;
use crate::widgets::{ClipShape, Expand, Measurable, Paintable, Rect, Size};

/// Unique identifier for a widget in the tree.
///
/// Uses a generational index design:
/// - `index`: position in the sparse array (reusable after removal)
/// - `generation`: version counter that increments when a slot is reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

impl WidgetId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Convert to a u64 for external use (e.g. scene node keys).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

/// Unique identifier for a registered event listener.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

/// Callback invoked when an event is dispatched to a widget.
///
/// The callback receives an [`EventCtx`] for grab/focus/redraw requests and
/// tree access. Returning [`EventResponse::Handled`] stops key bubbling.
pub type EventCallback = Box<dyn FnMut(&mut EventCtx<'_>, &InputEvent) -> EventResponse>;

pub(crate) struct PointerListener {
    pub(crate) id: ListenerId,
    pub(crate) filter: ButtonFilter,
    pub(crate) callback: EventCallback,
}

pub(crate) struct KeyListener {
    pub(crate) id: ListenerId,
    pub(crate) callback: EventCallback,
}

/// A node in the widget tree.
///
/// Geometry is in logical units, relative to the parent's local space.
pub struct WidgetNode {
    /// Bounding rectangle in the parent's local space
    pub bounds: Rect,
    /// Paint order among siblings (ascending; ties by insertion order)
    pub z_index: i32,
    /// Expand flags consulted by [`Tree::preferred_size`]
    pub expand: Expand,
    /// Invisible widgets and their subtrees are skipped by paint and
    /// hit-testing alike
    pub visible: bool,
    /// Optional rounded clip applied to this widget and its subtree
    pub clip: Option<ClipShape>,

    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: Vec<WidgetId>,
    pub(crate) painter: Option<Box<dyn Paintable>>,
    pub(crate) measurer: Option<Box<dyn Measurable>>,
    pub(crate) pointer_listeners: Vec<PointerListener>,
    pub(crate) key_listeners: Vec<KeyListener>,

    /// Back-pointer to sparse array index (for swap-remove fixup)
    sparse_index: u32,
}

impl WidgetNode {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            z_index: 0,
            expand: Expand::NONE,
            visible: true,
            clip: None,
            parent: None,
            children: Vec::new(),
            painter: None,
            measurer: None,
            pointer_listeners: Vec::new(),
            key_listeners: Vec::new(),
            sparse_index: 0,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_expand(mut self, expand: Expand) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_clip(mut self, clip: ClipShape) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn with_painter(mut self, painter: impl Paintable + 'static) -> Self {
        self.painter = Some(Box::new(painter));
        self
    }

    pub fn with_measurer(mut self, measurer: impl Measurable + 'static) -> Self {
        self.measurer = Some(Box::new(measurer));
        self
    }

    /// Parent back-reference (non-owning)
    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }
}

struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

/// Central widget storage using a sparse-set arena.
pub struct Tree {
    dense: Vec<WidgetNode>,
    sparse: Vec<Option<SparseEntry>>,
    free_indices: Vec<u32>,
    next_listener_id: u64,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            next_listener_id: 1,
        }
    }

    /// Insert a node into the tree and return its unique id.
    ///
    /// The node starts detached; attach it with [`Tree::set_parent`] or use
    /// [`Tree::insert_child`].
    pub fn insert(&mut self, mut node: WidgetNode) -> WidgetId {
        let (sparse_index, generation) = if let Some(idx) = self.free_indices.pop() {
            // Reuse a freed slot - increment generation
            let old_gen = self.sparse[idx as usize]
                .as_ref()
                .map(|e| e.generation)
                .unwrap_or(0);
            (idx, old_gen.wrapping_add(1))
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            (idx, 0)
        };

        let dense_index = self.dense.len();
        node.sparse_index = sparse_index;
        self.dense.push(node);

        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        WidgetId::new(sparse_index, generation)
    }

    /// Insert a node and attach it as the last child of `parent`.
    pub fn insert_child(&mut self, parent: WidgetId, node: WidgetNode) -> WidgetId {
        let id = self.insert(node);
        self.set_parent(id, parent);
        id
    }

    /// Remove a widget and its entire subtree (cascading ownership release).
    pub fn remove(&mut self, id: WidgetId) {
        if self.get_dense_index(id).is_none() {
            return; // invalid or stale id
        }

        // Detach from the parent's child sequence first
        if let Some(parent_id) = self.node(id).and_then(|n| n.parent) {
            if let Some(parent_dense) = self.get_dense_index(parent_id) {
                self.dense[parent_dense].children.retain(|&c| c != id);
            }
        }

        // Collect the subtree depth-first, then release each node
        let mut pending = vec![id];
        let mut subtree = Vec::new();
        while let Some(current) = pending.pop() {
            if let Some(node) = self.node(current) {
                pending.extend(node.children.iter().copied());
                subtree.push(current);
            }
        }

        for victim in subtree {
            self.release_slot(victim);
        }
    }

    /// Release a single node's slot (swap-remove with sparse fixup).
    fn release_slot(&mut self, id: WidgetId) {
        let dense_index = match self.get_dense_index(id) {
            Some(idx) => idx,
            None => return,
        };

        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);

        // Fix up the moved node's sparse entry (if we didn't remove the last element)
        if dense_index != last_dense_index && !self.dense.is_empty() {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(ref mut entry) = self.sparse[moved_sparse_idx as usize] {
                entry.dense_index = dense_index;
            }
        }

        self.sparse[id.index as usize] = None;
        self.free_indices.push(id.index);
        drop(removed);
    }

    fn get_dense_index(&self, id: WidgetId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.get_dense_index(id).is_some()
    }

    pub fn node(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.get_dense_index(id).map(|idx| &self.dense[idx])
    }

    pub fn node_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        self.get_dense_index(id).map(move |idx| &mut self.dense[idx])
    }

    /// Set the parent of a widget, appending it to the parent's child
    /// sequence if not already present.
    pub fn set_parent(&mut self, child_id: WidgetId, parent_id: WidgetId) {
        if let Some(child_dense) = self.get_dense_index(child_id) {
            self.dense[child_dense].parent = Some(parent_id);
        }

        if let Some(parent_dense) = self.get_dense_index(parent_id) {
            let children = &mut self.dense[parent_dense].children;
            if !children.contains(&child_id) {
                children.push(child_id);
            }
        }
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.node(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Children sorted for painting: ascending z-index, stable on ties so
    /// insertion order decides.
    pub fn children_in_paint_order(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut children = self.children(id);
        children.sort_by_key(|&c| self.node(c).map(|n| n.z_index).unwrap_or(0));
        children
    }

    /// Path from `id` up to the root (inclusive), leaf first.
    ///
    /// This is the focus chain used for keyboard bubbling.
    pub fn ancestor_chain(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            if !self.contains(c) {
                break;
            }
            chain.push(c);
            current = self.parent(c);
        }
        chain
    }

    /// Preferred size of a widget within the available space.
    ///
    /// Expand flags win over the `Measurable` delegate per axis; without
    /// either, the widget keeps its current bounds.
    pub fn preferred_size(&self, id: WidgetId, available: Size) -> Size {
        let node = match self.node(id) {
            Some(n) => n,
            None => return Size::zero(),
        };

        let measured = node
            .measurer
            .as_ref()
            .map(|m| m.measure(available))
            .unwrap_or_else(|| node.bounds.size());

        Size::new(
            if node.expand.horizontal {
                available.width
            } else {
                measured.width
            },
            if node.expand.vertical {
                available.height
            } else {
                measured.height
            },
        )
    }

    /// Register a pointer listener with a button filter.
    pub fn add_pointer_listener(
        &mut self,
        id: WidgetId,
        filter: ButtonFilter,
        callback: EventCallback,
    ) -> Option<ListenerId> {
        let listener_id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        let node = self.node_mut(id)?;
        node.pointer_listeners.push(PointerListener {
            id: listener_id,
            filter,
            callback,
        });
        Some(listener_id)
    }

    /// Register a keyboard listener.
    pub fn add_key_listener(&mut self, id: WidgetId, callback: EventCallback) -> Option<ListenerId> {
        let listener_id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        let node = self.node_mut(id)?;
        node.key_listeners.push(KeyListener {
            id: listener_id,
            callback,
        });
        Some(listener_id)
    }

    /// Unregister a listener. The observer never owns the widget; dropping
    /// a registration is always safe.
    pub fn remove_listener(&mut self, id: WidgetId, listener: ListenerId) {
        if let Some(node) = self.node_mut(id) {
            node.pointer_listeners.retain(|l| l.id != listener);
            node.key_listeners.retain(|l| l.id != listener);
        }
    }

    // Listener extraction for dispatch: callbacks need `&mut Tree`, so the
    // router temporarily takes the list out of the node and restores it
    // afterwards (same technique as extracting a widget for `&mut` access).

    pub(crate) fn take_pointer_listeners(&mut self, id: WidgetId) -> Vec<PointerListener> {
        self.node_mut(id)
            .map(|n| std::mem::take(&mut n.pointer_listeners))
            .unwrap_or_default()
    }

    pub(crate) fn restore_pointer_listeners(&mut self, id: WidgetId, listeners: Vec<PointerListener>) {
        if let Some(node) = self.node_mut(id) {
            let registered_during_dispatch = std::mem::replace(&mut node.pointer_listeners, listeners);
            node.pointer_listeners.extend(registered_during_dispatch);
        }
    }

    pub(crate) fn take_key_listeners(&mut self, id: WidgetId) -> Vec<KeyListener> {
        self.node_mut(id)
            .map(|n| std::mem::take(&mut n.key_listeners))
            .unwrap_or_default()
    }

    pub(crate) fn restore_key_listeners(&mut self, id: WidgetId, listeners: Vec<KeyListener>) {
        if let Some(node) = self.node_mut(id) {
            let registered_during_dispatch = std::mem::replace(&mut node.key_listeners, listeners);
            node.key_listeners.extend(registered_during_dispatch);
        }
    }

    pub fn widget_count(&self) -> usize {
        self.dense.len()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::Rect;

    fn leaf() -> WidgetNode {
        WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_tree_insert_remove() {
        let mut tree = Tree::new();
        let id = tree.insert(leaf());
        assert!(tree.contains(id));

        tree.remove(id);
        assert!(!tree.contains(id));
    }

    #[test]
    fn test_tree_generational_index() {
        let mut tree = Tree::new();

        let id1 = tree.insert(leaf());
        tree.remove(id1);

        // New widget reuses the slot with a bumped generation
        let id2 = tree.insert(leaf());
        assert!(!tree.contains(id1));
        assert!(tree.contains(id2));
        assert_eq!(id1.index, id2.index);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn test_tree_parent_child() {
        let mut tree = Tree::new();
        let parent_id = tree.insert(leaf());
        let child_id = tree.insert_child(parent_id, leaf());

        assert_eq!(tree.parent(child_id), Some(parent_id));
        assert_eq!(tree.children(parent_id), vec![child_id]);
    }

    #[test]
    fn test_tree_cascading_remove() {
        let mut tree = Tree::new();
        let root = tree.insert(leaf());
        let child = tree.insert_child(root, leaf());
        let grandchild = tree.insert_child(child, leaf());
        let sibling = tree.insert_child(root, leaf());

        tree.remove(child);

        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert!(tree.contains(root));
        assert!(tree.contains(sibling));
        assert_eq!(tree.children(root), vec![sibling]);
    }

    #[test]
    fn test_tree_paint_order() {
        let mut tree = Tree::new();
        let root = tree.insert(leaf());
        let a = tree.insert_child(root, leaf().with_z_index(1));
        let b = tree.insert_child(root, leaf().with_z_index(0));
        let c = tree.insert_child(root, leaf().with_z_index(1));

        // Ascending z; insertion order breaks the a/c tie
        assert_eq!(tree.children_in_paint_order(root), vec![b, a, c]);
    }

    #[test]
    fn test_tree_ancestor_chain() {
        let mut tree = Tree::new();
        let root = tree.insert(leaf());
        let child = tree.insert_child(root, leaf());
        let grandchild = tree.insert_child(child, leaf());

        assert_eq!(tree.ancestor_chain(grandchild), vec![grandchild, child, root]);
    }

    #[test]
    fn test_tree_swap_remove_fixup() {
        let mut tree = Tree::new();
        let id1 = tree.insert(leaf());
        let id2 = tree.insert(leaf());
        let id3 = tree.insert(leaf());

        tree.remove(id1);

        assert!(!tree.contains(id1));
        assert!(tree.contains(id2));
        assert!(tree.contains(id3));
        assert!(tree.node(id2).is_some());
        assert!(tree.node(id3).is_some());
    }

    #[test]
    fn test_preferred_size_expand_and_measure() {
        let mut tree = Tree::new();
        let fixed = tree.insert(leaf());
        assert_eq!(
            tree.preferred_size(fixed, Size::new(100.0, 100.0)),
            Size::new(10.0, 10.0)
        );

        let expanding = tree.insert(
            WidgetNode::new(Rect::new(0.0, 0.0, 10.0, 10.0)).with_expand(Expand {
                horizontal: true,
                vertical: false,
            }),
        );
        assert_eq!(
            tree.preferred_size(expanding, Size::new(100.0, 100.0)),
            Size::new(100.0, 10.0)
        );

        let measured = tree.insert(
            WidgetNode::new(Rect::new(0.0, 0.0, 0.0, 0.0))
                .with_measurer(|avail: Size| Size::new(avail.width / 2.0, 20.0)),
        );
        assert_eq!(
            tree.preferred_size(measured, Size::new(100.0, 100.0)),
            Size::new(50.0, 20.0)
        );
    }
}
