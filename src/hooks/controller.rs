//! Safe asynchronous state: run an operation, keep its outcome in a state
//! slot, and never write that slot after the owning element has detached.
//!
//! ```ignore
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let search = AsyncController::<Pokemon, FetchError>::new(AsyncOptions::new());
//!     search.attach();
//!     let settled = search.run(|| fetch_pokemon("pikachu"));
//!     assert!(search.state().is_pending());
//!     settled.await.unwrap();
//! }).await;
//! ```
//!
//! `run` writes `Pending` before it returns, then spawns the operation on the
//! current [`LocalSet`](tokio::task::LocalSet). The settlement is applied only
//! if the mount flag is still set at that moment. Nothing interrupts the
//! operation itself; a late result is simply dropped.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use tokio::task::{JoinHandle, LocalSet};

use super::async_state::{transition, AsyncAction, AsyncState, AsyncStatus};
use super::debug::use_debug_value;
use super::reducer::{use_reducer, Dispatch};
use crate::element::{ElementId, ElementTree, MountFlag};
use crate::error::HookError;
use crate::reactive::{dispose_effect, dispose_signal, watch, ReadSignal, SignalId};

// ---------------------------------------------------------------------------
// AsyncOptions
// ---------------------------------------------------------------------------

/// What happens when `run` is called again before an earlier run settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Every settlement is applied; whichever settles last wins, even if it
    /// came from an older run.
    #[default]
    LastSettled,
    /// Only the most recent run may settle. Results from superseded runs are
    /// dropped.
    LatestRun,
}

/// Configuration for an [`AsyncController`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsyncOptions {
    /// Starting status. Anything other than `Idle` starts as `Pending`.
    pub initial: AsyncStatus,
    /// Handling of overlapping runs.
    pub overlap: OverlapPolicy,
    /// Name used in log lines and element inspection.
    pub label: Option<String>,
}

impl AsyncOptions {
    /// Default options: idle, last-settled-wins, unlabelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial status (builder).
    pub fn with_initial(mut self, initial: AsyncStatus) -> Self {
        self.initial = initial;
        self
    }

    /// Set the overlap policy (builder).
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Set the debug label (builder).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// ---------------------------------------------------------------------------
// AsyncController
// ---------------------------------------------------------------------------

/// Releases the state slot when the last controller handle goes away.
struct SlotGuard(SignalId);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        dispose_signal(self.0);
    }
}

/// Tracks one asynchronous operation's lifecycle for one owner.
///
/// Clones are handles to the same controller. The spawned settlement task
/// holds one, so the state slot stays alive until every run has settled.
pub struct AsyncController<T: 'static, E: 'static> {
    state: ReadSignal<AsyncState<T, E>>,
    dispatch: Dispatch<AsyncState<T, E>, AsyncAction<T, E>>,
    flag: MountFlag,
    generation: Rc<Cell<u64>>,
    options: Rc<AsyncOptions>,
    _slot: Rc<SlotGuard>,
}

impl<T: 'static, E: 'static> Clone for AsyncController<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            dispatch: self.dispatch.clone(),
            flag: self.flag.clone(),
            generation: Rc::clone(&self.generation),
            options: Rc::clone(&self.options),
            _slot: Rc::clone(&self._slot),
        }
    }
}

impl<T: 'static, E: 'static> fmt::Debug for AsyncController<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncController")
            .field("label", &self.label())
            .field("status", &self.state.try_with_untracked(AsyncState::status))
            .field("flag", &self.flag)
            .field("generation", &self.generation.get())
            .finish()
    }
}

impl<T: 'static, E: 'static> AsyncController<T, E> {
    /// Create a standalone controller with its own, not yet attached, mount
    /// flag. Call [`attach`](Self::attach) once the owner is live.
    pub fn new(options: AsyncOptions) -> Self {
        Self::with_flag(options, MountFlag::new())
    }

    /// Create a controller guarded by an existing mount flag, typically an
    /// element's.
    pub fn with_flag(options: AsyncOptions, flag: MountFlag) -> Self {
        let (state, dispatch) = use_reducer(AsyncState::initial(options.initial), transition);
        Self {
            state,
            dispatch,
            flag,
            generation: Rc::new(Cell::new(0)),
            options: Rc::new(options),
            _slot: Rc::new(SlotGuard(state.id())),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Mark the owner attached. Has no effect after [`detach`](Self::detach).
    pub fn attach(&self) -> bool {
        self.flag.attach()
    }

    /// Mark the owner detached. Every later settlement is discarded.
    pub fn detach(&self) {
        self.flag.detach();
    }

    /// Whether settlements would currently be applied.
    pub fn is_mounted(&self) -> bool {
        self.flag.is_mounted()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Start `operation`.
    ///
    /// The state is `Pending` when this returns. The returned handle
    /// completes once the operation has settled and its outcome has been
    /// applied or discarded; dropping it does not cancel anything.
    ///
    /// # Panics
    ///
    /// Panics when called outside a [`LocalSet`] context. Use
    /// [`run_on`](Self::run_on) where that context is not guaranteed.
    pub fn run<F, Fut>(&self, operation: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        let ticket = self.begin();
        tokio::task::spawn_local(self.settlement(ticket, operation()))
    }

    /// Like [`run`](Self::run), but spawns onto `local` so it can be called
    /// from any context. The operation makes progress once `local` is
    /// driven.
    pub fn run_on<F, Fut>(&self, local: &LocalSet, operation: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        let ticket = self.begin();
        local.spawn_local(self.settlement(ticket, operation()))
    }

    /// Replace the state with `Resolved { data }`.
    pub fn set_data(&self, data: T) {
        self.apply(AsyncAction::Resolve(data));
    }

    /// Replace the state with `Rejected { error }`.
    pub fn set_error(&self, error: E) {
        self.apply(AsyncAction::Reject(error));
    }

    /// Return to `Idle`.
    pub fn reset(&self) {
        self.apply(AsyncAction::Reset);
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Snapshot of the current state. Subscribes a running effect.
    pub fn state(&self) -> AsyncState<T, E>
    where
        T: Clone,
        E: Clone,
    {
        self.state.get()
    }

    /// Borrow the current state without cloning. Subscribes a running effect.
    pub fn with_state<R>(&self, f: impl FnOnce(&AsyncState<T, E>) -> R) -> R {
        self.state.with(f)
    }

    /// Current status. Subscribes a running effect.
    pub fn status(&self) -> AsyncStatus {
        self.state.with(AsyncState::status)
    }

    /// Number of `run` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// The underlying state signal.
    pub fn signal(&self) -> ReadSignal<AsyncState<T, E>> {
        self.state
    }

    /// Options this controller was created with.
    pub fn options(&self) -> &AsyncOptions {
        &self.options
    }

    fn label(&self) -> &str {
        self.options.label.as_deref().unwrap_or("async")
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Take a ticket and go `Pending`.
    fn begin(&self) -> u64 {
        let ticket = self.generation.get() + 1;
        self.generation.set(ticket);
        self.apply(AsyncAction::Run);
        ticket
    }

    fn settlement<Fut>(&self, ticket: u64, pending: Fut) -> impl Future<Output = ()> + 'static
    where
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        let this = self.clone();
        async move {
            let action = match pending.await {
                Ok(data) => AsyncAction::Resolve(data),
                Err(error) => AsyncAction::Reject(error),
            };
            this.settle(ticket, action);
        }
    }

    /// Synchronous writes: refused only once detached, so a controller can
    /// go `Pending` while its element is still being built.
    fn apply(&self, action: AsyncAction<T, E>) {
        if self.flag.is_detached() {
            log::debug!(
                target: "hookstate::async",
                "{}: ignored {} after detach",
                self.label(),
                action.target()
            );
            return;
        }
        self.commit(action);
    }

    fn settle(&self, ticket: u64, action: AsyncAction<T, E>) {
        if !self.flag.is_mounted() {
            log::debug!(
                target: "hookstate::async",
                "{}: discarded {} from run #{ticket}, owner not mounted",
                self.label(),
                action.target()
            );
            return;
        }
        let latest = self.generation.get();
        if self.options.overlap == OverlapPolicy::LatestRun && ticket != latest {
            log::debug!(
                target: "hookstate::async",
                "{}: discarded {} from run #{ticket}, superseded by run #{latest}",
                self.label(),
                action.target()
            );
            return;
        }
        self.commit(action);
    }

    fn commit(&self, action: AsyncAction<T, E>) {
        let Some(from) = self.state.try_with_untracked(AsyncState::status) else {
            return;
        };
        let to = action.target();
        if self.dispatch.dispatch(action) {
            log::debug!(target: "hookstate::async", "{}: {from} -> {to}", self.label());
        }
    }
}

// ---------------------------------------------------------------------------
// use_async
// ---------------------------------------------------------------------------

/// Create an [`AsyncController`] owned by element `id`.
///
/// The controller shares the element's mount flag, so
/// [`ElementTree::mount`] and [`ElementTree::unmount`] attach and detach it
/// synchronously. Each state change schedules the element for re-render
/// while it is attached. A labelled controller also reports its status to
/// [`ElementTree::inspect`].
pub fn use_async<T: 'static, E: 'static>(
    tree: &mut ElementTree,
    id: ElementId,
    options: AsyncOptions,
) -> Result<AsyncController<T, E>, HookError> {
    let flag = tree.mount_flag(id)?;
    let controller = AsyncController::with_flag(options, flag);

    let state = controller.signal();
    let queue = tree.render_queue();
    let effect = watch(
        move || {
            state.try_with(|_| ());
        },
        move || queue.schedule(id),
    );
    tree.on_cleanup(id, move || dispose_effect(effect))?;
    tree.on_dispose(id, move || dispose_effect(effect))?;

    if let Some(label) = controller.options().label.clone() {
        let inspected = controller.clone();
        use_debug_value(tree, id, label, move || {
            inspected
                .state
                .try_with_untracked(|state| state.status().to_string())
                .unwrap_or_else(|| "disposed".to_owned())
        })?;
    }
    Ok(controller)
}
