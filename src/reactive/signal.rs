//! Signals, effects and the thread-local runtime that connects them.
//!
//! Signals hold hook state (an async controller's state slot, a reducer's
//! value). Effects auto-track the signals they read and re-run when one of
//! them is written, which is how a state change turns into a scheduled
//! re-render. Single-threaded and synchronous: writes notify subscribers
//! before returning, unless inside [`batch`].
//!
//! Slots live in slotmap arenas so they can be disposed when the element or
//! controller that owns them goes away. Writing to a disposed signal is a
//! silent no-op; reading one panics.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifies a signal slot inside the runtime.
    pub struct SignalId;

    /// Identifies an effect slot inside the runtime.
    pub struct EffectId;
}

// ---------------------------------------------------------------------------
// Runtime internals
// ---------------------------------------------------------------------------

type Slot = Rc<RefCell<Box<dyn Any>>>;

struct SignalState {
    /// Shared so readers and writers can release the runtime borrow before
    /// running user closures.
    value: Slot,
    subscribers: HashSet<EffectId>,
}

struct EffectState {
    /// Taken out while the effect runs so no runtime borrow is held across
    /// the user callback.
    callback: Option<Box<dyn FnMut()>>,
    dependencies: HashSet<SignalId>,
}

struct Runtime {
    signals: SlotMap<SignalId, SignalState>,
    effects: SlotMap<EffectId, EffectState>,
    /// Effect currently executing (for auto-tracking).
    tracking: Option<EffectId>,
    batch_depth: usize,
    pending_effects: Vec<EffectId>,
    running_effects: bool,
}

impl Runtime {
    fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            effects: SlotMap::with_key(),
            tracking: None,
            batch_depth: 0,
            pending_effects: Vec::new(),
            running_effects: false,
        }
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

// ---------------------------------------------------------------------------
// Signal creation / disposal
// ---------------------------------------------------------------------------

/// Create a reactive signal with the given initial value.
///
/// Returns a `(ReadSignal<T>, WriteSignal<T>)` pair. Reading inside an effect
/// subscribes that effect to later writes.
pub fn create_signal<T: 'static>(initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
    let id = RUNTIME.with(|rt| {
        rt.borrow_mut().signals.insert(SignalState {
            value: Rc::new(RefCell::new(Box::new(initial))),
            subscribers: HashSet::new(),
        })
    });

    (
        ReadSignal {
            id,
            _marker: PhantomData,
        },
        WriteSignal {
            id,
            _marker: PhantomData,
        },
    )
}

/// Drop a signal's value and unlink it from its subscribers.
///
/// Returns `false` if the signal was already disposed.
///
/// Safe to call from destructors during thread teardown; returns `false` once
/// the runtime itself is gone.
pub fn dispose_signal(id: SignalId) -> bool {
    // The value is dropped after the runtime borrow ends: it may own
    // handles whose destructors dispose other slots.
    let removed = RUNTIME
        .try_with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            let state = rt_ref.signals.remove(id)?;
            for eid in &state.subscribers {
                if let Some(effect) = rt_ref.effects.get_mut(*eid) {
                    effect.dependencies.remove(&id);
                }
            }
            Some(state)
        })
        .ok()
        .flatten();
    removed.is_some()
}

/// Whether the signal slot still exists.
pub fn signal_exists(id: SignalId) -> bool {
    RUNTIME.with(|rt| rt.borrow().signals.contains_key(id))
}

// ---------------------------------------------------------------------------
// ReadSignal
// ---------------------------------------------------------------------------

/// Read-half of a signal. `Copy`; only stores an id.
pub struct ReadSignal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

impl<T: 'static> Copy for ReadSignal<T> {}
impl<T: 'static> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal").field("id", &self.id).finish()
    }
}

impl<T: 'static> ReadSignal<T> {
    /// The runtime slot this signal reads from.
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Read the current value, subscribing the running effect (if any).
    ///
    /// # Panics
    ///
    /// Panics if the signal has been disposed.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Read by reference without cloning. Still subscribes the running effect.
    ///
    /// `f` may read any signal and write any other signal; writing this one
    /// from inside `f` panics.
    ///
    /// # Panics
    ///
    /// Panics if the signal has been disposed.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.try_with(f).expect("signal disposed")
    }

    /// Like [`with`](Self::with), but returns `None` for a disposed signal.
    pub fn try_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let slot = RUNTIME.with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            let tracking = rt_ref.tracking;
            let state = rt_ref.signals.get_mut(self.id)?;
            let slot = state.value.clone();
            if let Some(eid) = tracking {
                state.subscribers.insert(eid);
                if let Some(effect) = rt_ref.effects.get_mut(eid) {
                    effect.dependencies.insert(self.id);
                }
            }
            Some(slot)
        })?;
        Some(read_slot(&slot, f))
    }

    /// Read without tracking; will not subscribe any running effect.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.try_with_untracked(T::clone).expect("signal disposed")
    }

    /// Borrow without tracking. `None` for a disposed signal.
    pub fn try_with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let slot = RUNTIME.with(|rt| {
            rt.borrow()
                .signals
                .get(self.id)
                .map(|state| state.value.clone())
        })?;
        Some(read_slot(&slot, f))
    }
}

// ---------------------------------------------------------------------------
// WriteSignal
// ---------------------------------------------------------------------------

/// Write-half of a signal. `Copy`; only stores an id.
pub struct WriteSignal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

impl<T: 'static> Copy for WriteSignal<T> {}
impl<T: 'static> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSignal").field("id", &self.id).finish()
    }
}

impl<T: 'static> WriteSignal<T> {
    /// The runtime slot this signal writes to.
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Overwrite the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.update(|slot| *slot = value);
    }

    /// Mutate the value in place and notify subscribers.
    ///
    /// `f` may read other signals but must not touch this one. Returns
    /// `false` (without calling `f`) if the signal has been disposed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let slot = RUNTIME.with(|rt| {
            rt.borrow()
                .signals
                .get(self.id)
                .map(|state| state.value.clone())
        });
        let Some(slot) = slot else {
            log::trace!(target: "hookstate::reactive", "write to disposed signal {:?}", self.id);
            return false;
        };
        {
            let mut value = slot.borrow_mut();
            f(value.downcast_mut::<T>().expect("signal type mismatch"));
        }
        // Looked up again: `f` may have disposed the slot.
        let subs = RUNTIME.with(|rt| {
            rt.borrow()
                .signals
                .get(self.id)
                .map(|state| state.subscribers.iter().copied().collect::<Vec<_>>())
        });
        match subs {
            Some(subs) => {
                notify_subscribers(subs);
                true
            }
            None => {
                log::trace!(target: "hookstate::reactive", "signal {:?} disposed during write", self.id);
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Create a side effect that auto-tracks signal reads.
///
/// The closure runs once immediately (establishing its subscriptions) and
/// again whenever a tracked signal changes, until disposed.
pub fn create_effect(f: impl FnMut() + 'static) -> EffectId {
    let eid = RUNTIME.with(|rt| {
        rt.borrow_mut().effects.insert(EffectState {
            callback: Some(Box::new(f)),
            dependencies: HashSet::new(),
        })
    });
    run_effect(eid);
    eid
}

/// Stop an effect from re-running and unlink it from every signal.
pub fn dispose_effect(eid: EffectId) {
    let removed = RUNTIME
        .try_with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            let state = rt_ref.effects.remove(eid)?;
            for sid in &state.dependencies {
                if let Some(signal) = rt_ref.signals.get_mut(*sid) {
                    signal.subscribers.remove(&eid);
                }
            }
            Some(state)
        })
        .ok()
        .flatten();
    drop(removed);
}

/// Group several signal writes so dependent effects run once at the end.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    RUNTIME.with(|rt| rt.borrow_mut().batch_depth += 1);

    let result = f();

    let pending: Vec<EffectId> = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        rt_ref.batch_depth -= 1;
        if rt_ref.batch_depth > 0 {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        rt_ref
            .pending_effects
            .drain(..)
            .filter(|id| seen.insert(*id))
            .collect()
    });
    notify_subscribers(pending);
    result
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn read_slot<T: 'static, R>(slot: &Slot, f: impl FnOnce(&T) -> R) -> R {
    let value = slot.borrow();
    f(value.downcast_ref::<T>().expect("signal type mismatch"))
}

fn run_effect(eid: EffectId) {
    let maybe_cb = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let effect = rt_ref.effects.get_mut(eid)?;
        let old_deps: Vec<SignalId> = effect.dependencies.drain().collect();
        let cb = effect.callback.take();
        for sid in old_deps {
            if let Some(signal) = rt_ref.signals.get_mut(sid) {
                signal.subscribers.remove(&eid);
            }
        }
        cb
    });

    // Already running further up the stack, or disposed.
    let Some(mut cb) = maybe_cb else {
        return;
    };

    let prev_tracking = RUNTIME.with(|rt| rt.borrow_mut().tracking.replace(eid));

    cb();

    RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        rt_ref.tracking = prev_tracking;
        if let Some(effect) = rt_ref.effects.get_mut(eid) {
            effect.callback = Some(cb);
        }
    });
}

fn notify_subscribers(subs: Vec<EffectId>) {
    if subs.is_empty() {
        return;
    }

    let deferred = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        if rt_ref.batch_depth > 0 || rt_ref.running_effects {
            rt_ref.pending_effects.extend(subs.iter().copied());
            true
        } else {
            rt_ref.running_effects = true;
            false
        }
    });
    if deferred {
        return;
    }

    let mut queue = subs;
    while !queue.is_empty() {
        for eid in std::mem::take(&mut queue) {
            run_effect(eid);
        }
        RUNTIME.with(|rt| queue.append(&mut rt.borrow_mut().pending_effects));
    }

    RUNTIME.with(|rt| rt.borrow_mut().running_effects = false);
}

/// Number of live signals and effects, for leak checks in tests.
pub fn runtime_stats() -> (usize, usize) {
    RUNTIME.with(|rt| {
        let rt_ref = rt.borrow();
        (rt_ref.signals.len(), rt_ref.effects.len())
    })
}

#[cfg(test)]
pub(crate) fn reset_runtime() {
    RUNTIME.with(|rt| *rt.borrow_mut() = Runtime::new());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
