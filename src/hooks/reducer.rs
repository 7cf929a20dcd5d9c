//! Reducer-style state: a signal updated by `reducer(&state, action)`.
//!
//! ```ignore
//! let (count, dispatch) = use_reducer(0, |n: &i32, step: i32| n + step);
//! dispatch.dispatch(2);
//! assert_eq!(count.get(), 2);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::element::{ElementId, ElementTree, MountFlag};
use crate::error::HookError;
use crate::reactive::{create_signal, dispose_effect, dispose_signal, watch, ReadSignal, WriteSignal};

/// Sends actions through a reducer into a state signal. Cheap to clone.
///
/// An element-owned dispatch is bound to the mount flag the element had
/// when the hook ran; once that flag detaches, every dispatch is dropped.
pub struct Dispatch<S: 'static, A> {
    state: WriteSignal<S>,
    reducer: Rc<dyn Fn(&S, A) -> S>,
    guard: Option<MountFlag>,
}

impl<S: 'static, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            reducer: Rc::clone(&self.reducer),
            guard: self.guard.clone(),
        }
    }
}

impl<S: 'static, A> fmt::Debug for Dispatch<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("state", &self.state)
            .field("guard", &self.guard)
            .finish()
    }
}

impl<S: 'static, A> Dispatch<S, A> {
    /// Apply `action` and notify subscribers.
    ///
    /// Returns `false`, dropping the action, if the owning element has
    /// detached or the state slot has been disposed.
    pub fn dispatch(&self, action: A) -> bool {
        if self.guard.as_ref().is_some_and(MountFlag::is_detached) {
            log::debug!(
                target: "hookstate::reducer",
                "dropped dispatch to {:?} after detach",
                self.state.id()
            );
            return false;
        }
        self.state.update(|state| {
            let next = (self.reducer)(state, action);
            *state = next;
        })
    }
}

/// Create reducer state that is not tied to an element.
///
/// The state slot lives until [`dispose_signal`] is called on it.
pub fn use_reducer<S, A>(
    initial: S,
    reducer: impl Fn(&S, A) -> S + 'static,
) -> (ReadSignal<S>, Dispatch<S, A>)
where
    S: 'static,
{
    let (read, write) = create_signal(initial);
    let dispatch = Dispatch {
        state: write,
        reducer: Rc::new(reducer),
        guard: None,
    };
    (read, dispatch)
}

/// Create reducer state owned by element `id`.
///
/// Every dispatch schedules the element for re-render. Dispatches are
/// dropped once the element unmounts; a remounted element runs the hook
/// again for fresh state. The slot stays readable until the element is
/// removed from the tree.
pub fn use_reducer_in<S, A>(
    tree: &mut ElementTree,
    id: ElementId,
    initial: S,
    reducer: impl Fn(&S, A) -> S + 'static,
) -> Result<(ReadSignal<S>, Dispatch<S, A>), HookError>
where
    S: 'static,
{
    let flag = tree.mount_flag(id)?;
    let (read, mut dispatch) = use_reducer(initial, reducer);
    dispatch.guard = Some(flag);

    let queue = tree.render_queue();
    let effect = watch(
        move || {
            read.try_with(|_| ());
        },
        move || queue.schedule(id),
    );
    tree.on_cleanup(id, move || dispose_effect(effect))?;
    tree.on_dispose(id, move || {
        dispose_effect(effect);
        dispose_signal(read.id());
    })?;
    Ok((read, dispatch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::runtime_stats;
    use crate::reactive::signal::reset_runtime;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        count: i64,
        step: i64,
    }

    enum CounterAction {
        Increment,
        Decrement,
        SetStep(i64),
        Reset,
    }

    fn counter(state: &Counter, action: CounterAction) -> Counter {
        match action {
            CounterAction::Increment => Counter { count: state.count + state.step, ..state.clone() },
            CounterAction::Decrement => Counter { count: state.count - state.step, ..state.clone() },
            CounterAction::SetStep(step) => Counter { step, ..state.clone() },
            CounterAction::Reset => Counter { count: 0, step: 1 },
        }
    }

    #[test]
    fn dispatch_applies_reducer() {
        reset_runtime();
        let (state, dispatch) = use_reducer(Counter { count: 0, step: 1 }, counter);
        dispatch.dispatch(CounterAction::Increment);
        dispatch.dispatch(CounterAction::SetStep(5));
        dispatch.dispatch(CounterAction::Increment);
        dispatch.dispatch(CounterAction::Decrement);
        assert_eq!(state.get(), Counter { count: 1, step: 5 });
        dispatch.dispatch(CounterAction::Reset);
        assert_eq!(state.get(), Counter { count: 0, step: 1 });
    }

    #[test]
    fn dispatch_after_dispose_is_dropped() {
        reset_runtime();
        let (state, dispatch) = use_reducer(0_i32, |n: &i32, d: i32| n + d);
        dispose_signal(state.id());
        assert!(!dispatch.dispatch(1));
    }

    #[test]
    fn element_reducer_schedules_render() {
        reset_runtime();
        let mut tree = ElementTree::new();
        let root = tree.insert("Counter");
        tree.mount(root).unwrap();
        let (state, dispatch) = use_reducer_in(&mut tree, root, 0_i32, |n: &i32, d: i32| n + d).unwrap();

        assert!(tree.drain_renders().is_empty());
        dispatch.dispatch(1);
        dispatch.clone().dispatch(1);
        assert_eq!(tree.drain_renders(), vec![root]);
        assert_eq!(state.get(), 2);
    }

    #[test]
    fn unmount_stops_renders_and_remove_frees_slot() {
        reset_runtime();
        let mut tree = ElementTree::new();
        let root = tree.insert("Counter");
        tree.mount(root).unwrap();
        let (state, dispatch) = use_reducer_in(&mut tree, root, 0_i32, |n: &i32, d: i32| n + d).unwrap();

        tree.unmount(root).unwrap();
        assert!(!dispatch.dispatch(1));
        assert!(tree.render_queue().is_empty());
        assert_eq!(state.get(), 0);

        tree.remove(root);
        assert_eq!(runtime_stats(), (0, 0));
        assert!(!dispatch.dispatch(1));
    }

    #[test]
    fn dispatch_before_mount_applies() {
        reset_runtime();
        let mut tree = ElementTree::new();
        let root = tree.insert("Counter");
        let (state, dispatch) = use_reducer_in(&mut tree, root, 0_i32, |n: &i32, d: i32| n + d).unwrap();
        assert!(dispatch.dispatch(3));
        assert_eq!(state.get(), 3);
    }

    #[test]
    fn remount_needs_fresh_reducer() {
        reset_runtime();
        let mut tree = ElementTree::new();
        let root = tree.insert("Counter");
        tree.mount(root).unwrap();
        let (stale, stale_dispatch) =
            use_reducer_in(&mut tree, root, 0_i32, |n: &i32, d: i32| n + d).unwrap();
        tree.unmount(root).unwrap();
        tree.mount(root).unwrap();

        assert!(!stale_dispatch.dispatch(1));
        assert_eq!(stale.get(), 0);
        assert!(tree.drain_renders().is_empty());

        let (state, dispatch) = use_reducer_in(&mut tree, root, 10_i32, |n: &i32, d: i32| n + d).unwrap();
        assert!(dispatch.dispatch(1));
        assert_eq!(state.get(), 11);
        assert_eq!(tree.drain_renders(), vec![root]);
    }
}
