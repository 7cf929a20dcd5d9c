//! Element lifecycle: attach, detach, update.
//!
//! The [`LifecycleTracker`] records which elements are attached and queues
//! lifecycle events for the host loop. Each element also owns a [`MountFlag`]
//! that hooks capture, so a continuation running after teardown can see that
//! its element is gone.

use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::node::ElementId;

// ---------------------------------------------------------------------------
// MountFlag
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FlagState {
    attached: Cell<bool>,
    detached: Cell<bool>,
}

/// Shared attach/detach flag for one element (or one standalone controller).
///
/// Starts unattached. Detach is terminal: once detached, [`attach`](Self::attach)
/// has no effect. Clones share the same flag.
#[derive(Clone, Default)]
pub struct MountFlag(Rc<FlagState>);

impl MountFlag {
    /// Create a fresh, unattached flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the owner attached. Returns `false` if it was already detached.
    pub fn attach(&self) -> bool {
        if self.0.detached.get() {
            return false;
        }
        self.0.attached.set(true);
        true
    }

    /// Mark the owner detached, permanently.
    pub fn detach(&self) {
        self.0.attached.set(false);
        self.0.detached.set(true);
    }

    /// True while attached and not yet detached.
    pub fn is_mounted(&self) -> bool {
        self.0.attached.get() && !self.0.detached.get()
    }

    /// True once [`detach`](Self::detach) has run.
    pub fn is_detached(&self) -> bool {
        self.0.detached.get()
    }

    /// Whether two handles share the same underlying flag.
    pub fn same_as(&self, other: &MountFlag) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MountFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountFlag")
            .field("attached", &self.0.attached.get())
            .field("detached", &self.0.detached.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Events that occur during the element lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// An element was attached.
    Attach { element: ElementId },
    /// An element was detached.
    Detach { element: ElementId },
    /// An attached element's state changed and it was re-rendered.
    Update { element: ElementId },
}

// ---------------------------------------------------------------------------
// LifecycleTracker
// ---------------------------------------------------------------------------

/// Tracks which elements are attached and accumulates lifecycle events.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    attached: HashSet<ElementId>,
    pending: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    /// Create a new, empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attach. A duplicate attach produces no event.
    pub fn on_attach(&mut self, id: ElementId) {
        if self.attached.insert(id) {
            self.pending.push(LifecycleEvent::Attach { element: id });
        }
    }

    /// Record a detach. Detaching an unattached element produces no event.
    pub fn on_detach(&mut self, id: ElementId) {
        if self.attached.remove(&id) {
            self.pending.push(LifecycleEvent::Detach { element: id });
        }
    }

    /// Record an update. Ignored for unattached elements.
    pub fn on_update(&mut self, id: ElementId) {
        if self.attached.contains(&id) {
            self.pending.push(LifecycleEvent::Update { element: id });
        }
    }

    /// Check whether an element is attached.
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.attached.contains(&id)
    }

    /// The number of attached elements.
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Drain and return all pending lifecycle events, in order of occurrence.
    pub fn pending_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Whether there are any pending events.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn make_id(sm: &mut SlotMap<ElementId, ()>) -> ElementId {
        sm.insert(())
    }

    #[test]
    fn flag_starts_unattached() {
        let flag = MountFlag::new();
        assert!(!flag.is_mounted());
        assert!(!flag.is_detached());
    }

    #[test]
    fn flag_attach_then_detach() {
        let flag = MountFlag::new();
        assert!(flag.attach());
        assert!(flag.is_mounted());
        flag.detach();
        assert!(!flag.is_mounted());
        assert!(flag.is_detached());
    }

    #[test]
    fn detach_is_irreversible() {
        let flag = MountFlag::new();
        flag.attach();
        flag.detach();
        assert!(!flag.attach());
        assert!(!flag.is_mounted());
    }

    #[test]
    fn clones_share_state() {
        let flag = MountFlag::new();
        let other = flag.clone();
        flag.attach();
        assert!(other.is_mounted());
        assert!(flag.same_as(&other));
        assert!(!flag.same_as(&MountFlag::new()));
    }

    #[test]
    fn attach_produces_single_event() {
        let mut sm = SlotMap::with_key();
        let id = make_id(&mut sm);
        let mut tracker = LifecycleTracker::new();

        tracker.on_attach(id);
        tracker.on_attach(id);
        assert_eq!(tracker.attached_count(), 1);
        assert_eq!(
            tracker.pending_events(),
            vec![LifecycleEvent::Attach { element: id }]
        );
    }

    #[test]
    fn detach_unattached_is_noop() {
        let mut sm = SlotMap::with_key();
        let id = make_id(&mut sm);
        let mut tracker = LifecycleTracker::new();

        tracker.on_detach(id);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn update_requires_attach() {
        let mut sm = SlotMap::with_key();
        let id = make_id(&mut sm);
        let mut tracker = LifecycleTracker::new();

        tracker.on_update(id);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn full_lifecycle_sequence() {
        let mut sm = SlotMap::with_key();
        let id = make_id(&mut sm);
        let mut tracker = LifecycleTracker::new();

        tracker.on_attach(id);
        tracker.on_update(id);
        tracker.on_detach(id);

        assert_eq!(
            tracker.pending_events(),
            vec![
                LifecycleEvent::Attach { element: id },
                LifecycleEvent::Update { element: id },
                LifecycleEvent::Detach { element: id },
            ]
        );
        assert!(!tracker.is_attached(id));
        assert!(tracker.pending_events().is_empty());
    }
}
