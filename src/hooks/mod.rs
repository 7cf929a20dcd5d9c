//! Hooks: per-element state built on the reactive runtime.
//!
//! - [`use_async`] / [`AsyncController`]: safe asynchronous state.
//! - [`use_reducer`] / [`use_reducer_in`]: reducer-driven state.
//! - [`provide_context`] / [`use_context`]: values shared down the tree.
//! - [`provide_cache`] / [`use_cache`] / [`cached`]: provider-scoped cache.
//! - [`use_debug_value`]: labelled values for tree inspection.

pub mod async_state;
pub mod cache;
pub mod context;
pub mod controller;
pub mod debug;
pub mod reducer;

pub use async_state::{transition, AsyncAction, AsyncState, AsyncStatus};
pub use cache::{cached, provide_cache, use_cache, CacheStore, SharedCache};
pub use context::{provide_context, try_use_context, use_context};
pub use controller::{use_async, AsyncController, AsyncOptions, OverlapPolicy};
pub use debug::use_debug_value;
pub use reducer::{use_reducer, use_reducer_in, Dispatch};
