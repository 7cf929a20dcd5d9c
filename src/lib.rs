//! # hookstate
//!
//! Hook-style UI state for single-threaded element trees.
//!
//! The centerpiece is [`AsyncController`](hooks::AsyncController): it runs
//! an asynchronous operation, exposes `Idle` / `Pending` / `Resolved` /
//! `Rejected` state for rendering, and drops any settlement that arrives
//! after its element has been detached. Around it sit the pieces a small
//! component framework needs to host such hooks.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: signals and effects (Leptos-style auto-tracking)
//! - **[`element`]**: slotmap-backed element tree, attach/detach lifecycle,
//!   re-render queue, error boundaries
//! - **[`hooks`]**: async state, reducers, context, provider-scoped cache,
//!   debug values
//! - **[`testing`]**: deferred operations and a headless [`Harness`](testing::Harness)
//! - **[`error`]**: [`HookError`](error::HookError)
//!
//! Async operations are spawned with `tokio::task::spawn_local`, so they run
//! on the caller's thread inside a [`tokio::task::LocalSet`].

pub mod error;

// Reactivity and hosting
pub mod element;
pub mod reactive;

// Hooks
pub mod hooks;

// Test support
pub mod testing;

pub use error::HookError;
