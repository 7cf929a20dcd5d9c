//! Element host: arena tree, attach/detach lifecycle, re-render queue and
//! error boundaries.

pub mod lifecycle;
pub mod node;
pub mod render;
pub mod tree;

pub use lifecycle::{LifecycleEvent, LifecycleTracker, MountFlag};
pub use node::{CaughtError, ElementData, ElementId};
pub use render::RenderQueue;
pub use tree::ElementTree;
