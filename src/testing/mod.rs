//! Test support: controllable operations and a headless element host.
//!
//! Use [`deferred`] for operations whose settlement the test decides, and
//! [`resolve_with`] / [`reject_with`] for ones that settle immediately. The
//! [`Harness`] hosts an element tree and the local task set hooks spawn on.

pub mod deferred;
pub mod harness;

pub use deferred::{deferred, reject_with, resolve_with, Deferred, Resolver};
pub use harness::{Harness, SETTLE_ROUNDS};
