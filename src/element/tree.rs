//! The element tree: insert, mount, unmount, remove, walk.

use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};

use super::lifecycle::{LifecycleEvent, LifecycleTracker, MountFlag};
use super::node::{CaughtError, ElementData, ElementId};
use super::render::RenderQueue;
use crate::error::HookError;
use crate::hooks::debug::DebugEntry;

const EMPTY_CHILDREN: &[ElementId] = &[];

type Callback = Box<dyn FnOnce()>;

/// Arena of UI elements with attach/detach lifecycle.
///
/// Elements live in a single `SlotMap`; parent/child links, mount flags and
/// hook callbacks live in secondary maps keyed by the same id.
///
/// Two kinds of hook callbacks are kept per element:
/// - cleanups run on [`unmount`](Self::unmount), after the mount flag flips;
/// - disposers run on [`remove`](Self::remove), releasing state slots that
///   outlive the attached phase.
pub struct ElementTree {
    elements: SlotMap<ElementId, ElementData>,
    children: SecondaryMap<ElementId, Vec<ElementId>>,
    parent: SecondaryMap<ElementId, ElementId>,
    root: Option<ElementId>,
    flags: SecondaryMap<ElementId, MountFlag>,
    cleanups: SecondaryMap<ElementId, Vec<Callback>>,
    disposers: SecondaryMap<ElementId, Vec<Callback>>,
    pub(crate) debug: SecondaryMap<ElementId, Vec<DebugEntry>>,
    lifecycle: LifecycleTracker,
    renders: RenderQueue,
}

impl ElementTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            elements: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
            flags: SecondaryMap::new(),
            cleanups: SecondaryMap::new(),
            disposers: SecondaryMap::new(),
            debug: SecondaryMap::new(),
            lifecycle: LifecycleTracker::new(),
            renders: RenderQueue::new(),
        }
    }

    // ── Structure ────────────────────────────────────────────────────

    /// Insert a parentless element. The first one becomes the root.
    pub fn insert(&mut self, name: impl Into<String>) -> ElementId {
        let id = self.alloc(name.into());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert an element as the last child of `parent`.
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        name: impl Into<String>,
    ) -> Result<ElementId, HookError> {
        if !self.elements.contains_key(parent) {
            return Err(HookError::UnknownElement(parent));
        }
        let id = self.alloc(name.into());
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
        }
        Ok(id)
    }

    fn alloc(&mut self, name: String) -> ElementId {
        let id = self.elements.insert(ElementData::new(name));
        self.children.insert(id, Vec::new());
        self.flags.insert(id, MountFlag::new());
        id
    }

    /// Unmount (if attached) and delete an element with its whole subtree.
    ///
    /// Disposers registered by hooks run here. Returns the removed element's
    /// data, or `None` if it did not exist.
    pub fn remove(&mut self, id: ElementId) -> Option<ElementData> {
        if !self.elements.contains_key(id) {
            return None;
        }
        // Cannot fail: existence checked above.
        let _ = self.unmount(id);

        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }

        let mut to_remove = VecDeque::from([id]);
        let mut removed = None;
        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            self.flags.remove(current);
            self.cleanups.remove(current);
            self.debug.remove(current);
            if let Some(disposers) = self.disposers.remove(current) {
                disposers.into_iter().rev().for_each(|dispose| dispose());
            }
            let data = self.elements.remove(current);
            if current == id {
                removed = data;
            }
        }
        log::debug!(target: "hookstate::element", "removed {id:?}");
        removed
    }

    /// Get the parent of an element, if it has one.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parent.get(id).copied()
    }

    /// Children of an element (empty if none or unknown).
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors from the immediate parent up to the root, excluding `id`.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// `id` followed by its ancestors: the lookup path for contexts and
    /// error boundaries.
    pub fn path_to_root(&self, id: ElementId) -> Vec<ElementId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut path = vec![id];
        path.extend(self.ancestors(id));
        path
    }

    /// Immutable access to an element's data.
    pub fn get(&self, id: ElementId) -> Option<&ElementData> {
        self.elements.get(id)
    }

    /// Display name of an element, or `"<removed>"`.
    pub fn name(&self, id: ElementId) -> &str {
        self.elements
            .get(id)
            .map(|data| data.name.as_str())
            .unwrap_or("<removed>")
    }

    /// The root element, if set.
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the tree has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the element exists.
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    fn ensure(&self, id: ElementId) -> Result<(), HookError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(HookError::UnknownElement(id))
        }
    }

    /// Pre-order traversal of the subtree rooted at `id`.
    pub fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Attach `id` and its subtree, parents before children.
    ///
    /// Mount flags flip before this returns. An element that was unmounted
    /// earlier comes back as a new instance with a fresh flag; hooks created
    /// for the old instance stay detached.
    pub fn mount(&mut self, id: ElementId) -> Result<(), HookError> {
        self.ensure(id)?;
        if let Some(parent) = self.parent(id) {
            if !self.is_mounted(parent) {
                return Err(HookError::ParentNotMounted {
                    element: self.name(id).to_owned(),
                });
            }
        }
        for element in self.subtree(id) {
            if let Some(flag) = self.flags.get_mut(element) {
                if flag.is_detached() {
                    *flag = MountFlag::new();
                }
                flag.attach();
            }
            self.lifecycle.on_attach(element);
            log::debug!(target: "hookstate::element", "attached {} {element:?}", self.name(element));
        }
        Ok(())
    }

    /// Detach `id` and its subtree, children before parents.
    ///
    /// Each element's flag flips first, then its cleanups run in reverse
    /// registration order. Unattached elements are skipped.
    pub fn unmount(&mut self, id: ElementId) -> Result<(), HookError> {
        self.ensure(id)?;
        for element in self.subtree(id).into_iter().rev() {
            if !self.is_mounted(element) {
                continue;
            }
            if let Some(flag) = self.flags.get(element) {
                flag.detach();
            }
            if let Some(cleanups) = self.cleanups.get_mut(element) {
                std::mem::take(cleanups)
                    .into_iter()
                    .rev()
                    .for_each(|cleanup| cleanup());
            }
            self.lifecycle.on_detach(element);
            log::debug!(target: "hookstate::element", "detached {} {element:?}", self.name(element));
        }
        Ok(())
    }

    /// Whether the element is currently attached.
    pub fn is_mounted(&self, id: ElementId) -> bool {
        self.flags.get(id).is_some_and(MountFlag::is_mounted)
    }

    /// The element's current mount flag.
    pub fn mount_flag(&self, id: ElementId) -> Result<MountFlag, HookError> {
        self.flags
            .get(id)
            .cloned()
            .ok_or(HookError::UnknownElement(id))
    }

    /// Register a callback to run when the element unmounts.
    pub fn on_cleanup(&mut self, id: ElementId, f: impl FnOnce() + 'static) -> Result<(), HookError> {
        self.ensure(id)?;
        self.cleanups
            .entry(id)
            .map(|entry| entry.or_default().push(Box::new(f)))
            .ok_or(HookError::UnknownElement(id))
    }

    /// Register a callback to run when the element is removed.
    pub fn on_dispose(&mut self, id: ElementId, f: impl FnOnce() + 'static) -> Result<(), HookError> {
        self.ensure(id)?;
        self.disposers
            .entry(id)
            .map(|entry| entry.or_default().push(Box::new(f)))
            .ok_or(HookError::UnknownElement(id))
    }

    /// Drain pending lifecycle events.
    pub fn pending_events(&mut self) -> Vec<LifecycleEvent> {
        self.lifecycle.pending_events()
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Handle hooks use to schedule re-renders.
    pub fn render_queue(&self) -> RenderQueue {
        self.renders.clone()
    }

    /// Take the attached elements scheduled for re-render, recording an
    /// `Update` event for each. Detached or removed elements are dropped.
    pub fn drain_renders(&mut self) -> Vec<ElementId> {
        let due: Vec<ElementId> = self
            .renders
            .take()
            .into_iter()
            .filter(|&id| self.is_mounted(id))
            .collect();
        for &id in &due {
            self.lifecycle.on_update(id);
        }
        due
    }

    // ── Contexts ─────────────────────────────────────────────────────

    pub(crate) fn set_context(
        &mut self,
        id: ElementId,
        key: TypeId,
        value: Rc<dyn Any>,
    ) -> Result<(), HookError> {
        let data = self
            .elements
            .get_mut(id)
            .ok_or(HookError::UnknownElement(id))?;
        data.contexts.insert(key, value);
        Ok(())
    }

    /// Nearest context value of type `key` at or above `id`.
    pub(crate) fn find_context(&self, id: ElementId, key: TypeId) -> Option<Rc<dyn Any>> {
        self.path_to_root(id)
            .into_iter()
            .find_map(|element| self.elements.get(element)?.contexts.get(&key).cloned())
    }

    // ── Error boundaries ─────────────────────────────────────────────

    /// Make `id` catch errors raised in its subtree.
    pub fn set_error_boundary(&mut self, id: ElementId) -> Result<(), HookError> {
        let data = self
            .elements
            .get_mut(id)
            .ok_or(HookError::UnknownElement(id))?;
        data.boundary.get_or_insert_with(Vec::new);
        Ok(())
    }

    /// Raise an error from `source` to the nearest boundary at or above it.
    ///
    /// Returns the boundary that caught it, or [`HookError::Uncaught`] if
    /// there is none.
    pub fn raise(
        &mut self,
        source: ElementId,
        error: &dyn fmt::Display,
    ) -> Result<ElementId, HookError> {
        self.ensure(source)?;
        let message = error.to_string();
        let boundary = self
            .path_to_root(source)
            .into_iter()
            .find(|&id| self.elements.get(id).is_some_and(ElementData::is_boundary));

        let Some(id) = boundary else {
            return Err(HookError::Uncaught {
                element: self.name(source).to_owned(),
                message,
            });
        };
        log::debug!(target: "hookstate::element", "boundary {id:?} caught: {message}");
        if let Some(caught) = self.elements.get_mut(id).and_then(|data| data.boundary.as_mut()) {
            caught.push(CaughtError { source, message });
        }
        Ok(id)
    }

    /// Errors caught by a boundary, oldest first. Empty for non-boundaries.
    pub fn caught_errors(&self, id: ElementId) -> &[CaughtError] {
        self.elements
            .get(id)
            .and_then(|data| data.boundary.as_deref())
            .unwrap_or(&[])
    }

    /// Reset a boundary, returning what it had caught.
    pub fn clear_errors(&mut self, id: ElementId) -> Vec<CaughtError> {
        self.elements
            .get_mut(id)
            .and_then(|data| data.boundary.as_mut())
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementTree")
            .field("len", &self.elements.len())
            .field("root", &self.root)
            .field("attached", &self.lifecycle.attached_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// ```text
    ///       app
    ///      /   \
    ///    a       b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (ElementTree, [ElementId; 5]) {
        let mut tree = ElementTree::new();
        let app = tree.insert("App");
        let a = tree.insert_child(app, "A").unwrap();
        let b = tree.insert_child(app, "B").unwrap();
        let c = tree.insert_child(a, "C").unwrap();
        let d = tree.insert_child(a, "D").unwrap();
        (tree, [app, a, b, c, d])
    }

    #[test]
    fn insert_sets_root_and_links() {
        let (tree, [app, a, b, c, d]) = build_tree();
        assert_eq!(tree.root(), Some(app));
        assert_eq!(tree.children(app), &[a, b]);
        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.ancestors(d), vec![a, app]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn insert_child_of_unknown_parent_fails() {
        let (mut tree, [_, a, ..]) = build_tree();
        tree.remove(a);
        assert_eq!(tree.insert_child(a, "X"), Err(HookError::UnknownElement(a)));
    }

    #[test]
    fn subtree_is_preorder() {
        let (tree, [app, a, b, c, d]) = build_tree();
        assert_eq!(tree.subtree(app), vec![app, a, c, d, b]);
    }

    #[test]
    fn mount_attaches_subtree_parent_first() {
        let (mut tree, [app, a, b, c, d]) = build_tree();
        tree.mount(app).unwrap();
        for id in [app, a, b, c, d] {
            assert!(tree.is_mounted(id));
        }
        let attached: Vec<ElementId> = tree
            .pending_events()
            .into_iter()
            .filter_map(|event| match event {
                LifecycleEvent::Attach { element } => Some(element),
                _ => None,
            })
            .collect();
        assert_eq!(attached, vec![app, a, c, d, b]);
    }

    #[test]
    fn mount_under_detached_parent_fails() {
        let (mut tree, [_, a, _, c, _]) = build_tree();
        let err = tree.mount(c).unwrap_err();
        assert_eq!(err, HookError::ParentNotMounted { element: "C".into() });
        assert!(!tree.is_mounted(a));
    }

    #[test]
    fn unmount_detaches_children_first_and_runs_cleanups() {
        let (mut tree, [app, a, _, c, d]) = build_tree();
        tree.mount(app).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (id, label) in [(a, "a"), (c, "c"), (d, "d")] {
            let order = order.clone();
            tree.on_cleanup(id, move || order.borrow_mut().push(label)).unwrap();
        }
        tree.unmount(a).unwrap();
        assert_eq!(*order.borrow(), vec!["d", "c", "a"]);
        assert!(!tree.is_mounted(c));
        assert!(tree.is_mounted(app));
    }

    #[test]
    fn flag_is_false_inside_cleanup() {
        let (mut tree, [app, a, ..]) = build_tree();
        tree.mount(app).unwrap();
        let flag = tree.mount_flag(a).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let seen_c = seen.clone();
        let flag_c = flag.clone();
        tree.on_cleanup(a, move || *seen_c.borrow_mut() = Some(flag_c.is_mounted()))
            .unwrap();
        tree.unmount(a).unwrap();
        assert_eq!(*seen.borrow(), Some(false));
    }

    #[test]
    fn remount_gets_fresh_flag() {
        let (mut tree, [app, a, ..]) = build_tree();
        tree.mount(app).unwrap();
        let old = tree.mount_flag(a).unwrap();
        tree.unmount(a).unwrap();
        tree.mount(a).unwrap();
        let new = tree.mount_flag(a).unwrap();
        assert!(!old.is_mounted());
        assert!(new.is_mounted());
        assert!(!old.same_as(&new));
    }

    #[test]
    fn remove_runs_disposers_and_unlinks() {
        let (mut tree, [app, a, _, c, _]) = build_tree();
        tree.mount(app).unwrap();
        let disposed = Rc::new(RefCell::new(Vec::new()));
        let disposed_c = disposed.clone();
        tree.on_dispose(c, move || disposed_c.borrow_mut().push("c")).unwrap();
        let flag = tree.mount_flag(c).unwrap();

        let data = tree.remove(a).unwrap();
        assert_eq!(data.name, "A");
        assert_eq!(*disposed.borrow(), vec!["c"]);
        assert!(flag.is_detached());
        assert!(!tree.contains(c));
        assert_eq!(tree.len(), 2);
        assert!(tree.remove(a).is_none());
    }

    #[test]
    fn drain_renders_skips_detached() {
        let (mut tree, [app, a, b, ..]) = build_tree();
        tree.mount(app).unwrap();
        tree.pending_events();
        let queue = tree.render_queue();
        queue.schedule(a);
        queue.schedule(b);
        tree.unmount(b).unwrap();
        tree.pending_events();

        assert_eq!(tree.drain_renders(), vec![a]);
        assert_eq!(
            tree.pending_events(),
            vec![LifecycleEvent::Update { element: a }]
        );
    }

    #[test]
    fn raise_bubbles_to_nearest_boundary() {
        let (mut tree, [app, a, _, c, _]) = build_tree();
        tree.set_error_boundary(app).unwrap();
        tree.set_error_boundary(a).unwrap();

        assert_eq!(tree.raise(c, &"boom"), Ok(a));
        assert_eq!(
            tree.caught_errors(a),
            &[CaughtError { source: c, message: "boom".into() }]
        );
        assert!(tree.caught_errors(app).is_empty());
        assert_eq!(tree.clear_errors(a).len(), 1);
        assert!(tree.caught_errors(a).is_empty());
    }

    #[test]
    fn raise_without_boundary_is_uncaught() {
        let (mut tree, [_, _, b, ..]) = build_tree();
        let err = tree.raise(b, &"nope").unwrap_err();
        assert_eq!(
            err,
            HookError::Uncaught { element: "B".into(), message: "nope".into() }
        );
    }
}
