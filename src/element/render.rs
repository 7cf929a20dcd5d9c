//! Re-render scheduling.
//!
//! Hooks hold a [`RenderQueue`] handle and schedule their element whenever
//! their state changes. The host drains the queue once per frame through
//! [`ElementTree::drain_renders`](super::ElementTree::drain_renders).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::node::ElementId;

/// Shared, deduplicating queue of elements awaiting a re-render.
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    inner: Rc<RefCell<VecDeque<ElementId>>>,
}

impl RenderQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `id` for re-render. Already-scheduled elements keep their slot.
    pub fn schedule(&self, id: ElementId) {
        let mut queue = self.inner.borrow_mut();
        if !queue.contains(&id) {
            log::trace!(target: "hookstate::render", "scheduled {id:?}");
            queue.push_back(id);
        }
    }

    /// Take every scheduled element in scheduling order.
    pub fn take(&self) -> Vec<ElementId> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Number of scheduled elements.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn schedule_dedupes_and_keeps_order() {
        let mut sm: SlotMap<ElementId, ()> = SlotMap::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        let queue = RenderQueue::new();

        queue.schedule(b);
        queue.schedule(a);
        queue.schedule(b);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.take(), vec![b, a]);
        assert!(queue.is_empty());
    }

    #[test]
    fn clones_share_queue() {
        let mut sm: SlotMap<ElementId, ()> = SlotMap::with_key();
        let a = sm.insert(());
        let queue = RenderQueue::new();
        queue.clone().schedule(a);
        assert_eq!(queue.take(), vec![a]);
    }
}
