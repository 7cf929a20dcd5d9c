//! Errors raised by misuse of the element host and hooks.
//!
//! Operation failures never show up here: they become
//! [`AsyncState::Rejected`](crate::hooks::AsyncState::Rejected). A settlement
//! discarded after detach is not an error either.

use crate::element::ElementId;

/// Errors from element-tree and hook construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// A hook read a context that no element at or above it provides.
    #[error("`{context}` must be used within a provider (consumer: {element})")]
    MissingProvider {
        /// Type name of the requested context value.
        context: &'static str,
        /// Name of the consuming element.
        element: String,
    },

    /// The element id does not exist in the tree (never inserted or removed).
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    /// Attempted to mount an element whose parent is not attached.
    #[error("cannot mount `{element}`: parent is not mounted")]
    ParentNotMounted {
        /// Name of the element being mounted.
        element: String,
    },

    /// An error was raised with no error boundary at or above the source.
    #[error("uncaught error from `{element}`: {message}")]
    Uncaught {
        /// Name of the element that raised the error.
        element: String,
        /// Rendered error message.
        message: String,
    },
}
