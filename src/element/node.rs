//! Element types: ElementId, ElementData.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for an element in the tree. Copy, lightweight (u64).
    pub struct ElementId;
}

/// An error caught by an error boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaughtError {
    /// Element that raised the error.
    pub source: ElementId,
    /// Rendered error message.
    pub message: String,
}

/// Per-element data: a display name, the context values it provides and
/// error-boundary state.
pub struct ElementData {
    /// Component name (e.g. "SearchForm", "CacheProvider").
    pub name: String,
    pub(crate) contexts: HashMap<TypeId, Rc<dyn Any>>,
    pub(crate) boundary: Option<Vec<CaughtError>>,
}

impl ElementData {
    /// Create element data with the given name and no contexts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contexts: HashMap::new(),
            boundary: None,
        }
    }

    /// Whether this element provides a context value of type `T`.
    pub fn provides<T: 'static>(&self) -> bool {
        self.contexts.contains_key(&TypeId::of::<T>())
    }

    /// Whether this element is an error boundary.
    pub fn is_boundary(&self) -> bool {
        self.boundary.is_some()
    }
}

impl std::fmt::Debug for ElementData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementData")
            .field("name", &self.name)
            .field("contexts", &self.contexts.len())
            .field("boundary", &self.boundary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults() {
        let data = ElementData::new("Counter");
        assert_eq!(data.name, "Counter");
        assert!(!data.provides::<u32>());
        assert!(!data.is_boundary());
    }

    #[test]
    fn provides_checks_type() {
        let mut data = ElementData::new("Provider");
        data.contexts.insert(TypeId::of::<u32>(), Rc::new(7_u32));
        assert!(data.provides::<u32>());
        assert!(!data.provides::<i32>());
    }
}
