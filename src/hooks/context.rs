//! Shared context: a value provided by one element and read by any
//! descendant.
//!
//! Lookup walks from the consumer up to the root and returns the nearest
//! provider's value. A consumer with no provider above it fails fast with
//! [`HookError::MissingProvider`].

use std::any::{type_name, Any, TypeId};
use std::rc::Rc;

use crate::element::{ElementId, ElementTree};
use crate::error::HookError;

/// Provide `value` to element `id` and its subtree, replacing any value of
/// the same type it already provided. Returns the shared handle.
pub fn provide_context<T: 'static>(
    tree: &mut ElementTree,
    id: ElementId,
    value: T,
) -> Result<Rc<T>, HookError> {
    let shared = Rc::new(value);
    tree.set_context(id, TypeId::of::<T>(), shared.clone() as Rc<dyn Any>)?;
    log::trace!(target: "hookstate::context", "{} provides {}", tree.name(id), type_name::<T>());
    Ok(shared)
}

/// Read the nearest `T` provided at or above `id`.
pub fn use_context<T: 'static>(tree: &ElementTree, id: ElementId) -> Result<Rc<T>, HookError> {
    if !tree.contains(id) {
        return Err(HookError::UnknownElement(id));
    }
    try_use_context(tree, id).ok_or_else(|| HookError::MissingProvider {
        context: type_name::<T>(),
        element: tree.name(id).to_owned(),
    })
}

/// Like [`use_context`], but `None` when nothing provides `T`.
pub fn try_use_context<T: 'static>(tree: &ElementTree, id: ElementId) -> Option<Rc<T>> {
    tree.find_context(id, TypeId::of::<T>())?.downcast::<T>().ok()
}
