//! Harness: a headless host for elements and their async hooks.
//!
//! The `Harness` owns an [`ElementTree`] and the [`LocalSet`] that hook
//! operations are spawned on, and lets a test mount, unmount, let work
//! settle and collect re-renders without a real UI loop.

use std::future::Future;

use tokio::task::{LocalEnterGuard, LocalSet};

use crate::element::{ElementId, ElementTree, LifecycleEvent};
use crate::error::HookError;

/// Rounds of yielding in [`Harness::settle`]. Each round lets every woken
/// local task run once.
pub const SETTLE_ROUNDS: usize = 16;

/// A headless element host for tests.
///
/// # Examples
///
/// ```ignore
/// let mut harness = Harness::new();
/// let _ctx = harness.enter();
/// let app = harness.mount_root("App")?;
/// let search = use_async::<u32, String>(harness.tree_mut(), app, AsyncOptions::new())?;
/// search.run(|| resolve_with(1));
/// harness.settle().await;
/// assert_eq!(harness.render(), vec![app]);
/// ```
pub struct Harness {
    tree: ElementTree,
    local: LocalSet,
}

impl Harness {
    /// Empty tree, empty task set.
    pub fn new() -> Self {
        Self {
            tree: ElementTree::new(),
            local: LocalSet::new(),
        }
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    /// Enter the task set so hooks can spawn. Hold the guard while calling
    /// `run` on controllers.
    pub fn enter(&self) -> LocalEnterGuard {
        self.local.enter()
    }

    // ── Elements ─────────────────────────────────────────────────────

    /// Insert a parentless element and attach it.
    pub fn mount_root(&mut self, name: &str) -> Result<ElementId, HookError> {
        let id = self.tree.insert(name);
        self.tree.mount(id)?;
        Ok(id)
    }

    /// Insert a child of `parent` and attach it.
    pub fn mount_child(&mut self, parent: ElementId, name: &str) -> Result<ElementId, HookError> {
        let id = self.tree.insert_child(parent, name)?;
        self.tree.mount(id)?;
        Ok(id)
    }

    pub fn unmount(&mut self, id: ElementId) -> Result<(), HookError> {
        self.tree.unmount(id)
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Let spawned operations that can make progress do so. Operations
    /// still waiting on an unsettled [`Deferred`](super::Deferred) stay
    /// pending.
    ///
    /// Runs [`SETTLE_ROUNDS`] rounds: enough for operations built from
    /// ready futures and deferreds. An operation that yields to the
    /// scheduler more often than that still looks pending afterwards; use
    /// [`settle_for`](Self::settle_for) or [`run_until`](Self::run_until)
    /// on its handle instead.
    pub async fn settle(&self) {
        self.settle_for(SETTLE_ROUNDS).await;
    }

    /// [`settle`](Self::settle) with an explicit number of rounds.
    pub async fn settle_for(&self, rounds: usize) {
        self.local
            .run_until(async {
                for _ in 0..rounds {
                    tokio::task::yield_now().await;
                }
            })
            .await;
    }

    /// Drive `future` to completion while local tasks run alongside it.
    pub async fn run_until<F: Future>(&self, future: F) -> F::Output {
        self.local.run_until(future).await
    }

    /// Elements re-rendered this frame (see [`ElementTree::drain_renders`]).
    pub fn render(&mut self) -> Vec<ElementId> {
        self.tree.drain_renders()
    }

    /// Drain lifecycle events.
    pub fn events(&mut self) -> Vec<LifecycleEvent> {
        self.tree.pending_events()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
