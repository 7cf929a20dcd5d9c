//! The state of one asynchronous operation and its transition function.

use std::fmt;

/// Discriminant of an [`AsyncState`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AsyncStatus {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// An operation is in flight.
    Pending,
    /// The last applied settlement succeeded.
    Resolved,
    /// The last applied settlement failed.
    Rejected,
}

impl AsyncStatus {
    /// Lowercase name, as shown in debug output.
    pub fn as_str(self) -> &'static str {
        match self {
            AsyncStatus::Idle => "idle",
            AsyncStatus::Pending => "pending",
            AsyncStatus::Resolved => "resolved",
            AsyncStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AsyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one asynchronous operation. Exactly one variant is active, so
/// `data` and `error` can never both be present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AsyncState<T, E> {
    #[default]
    Idle,
    Pending,
    Resolved { data: T },
    Rejected { error: E },
}

impl<T, E> AsyncState<T, E> {
    /// State for a freshly initialized controller: `Idle` for
    /// [`AsyncStatus::Idle`], `Pending` for anything else.
    pub fn initial(status: AsyncStatus) -> Self {
        match status {
            AsyncStatus::Idle => AsyncState::Idle,
            _ => AsyncState::Pending,
        }
    }

    pub fn status(&self) -> AsyncStatus {
        match self {
            AsyncState::Idle => AsyncStatus::Idle,
            AsyncState::Pending => AsyncStatus::Pending,
            AsyncState::Resolved { .. } => AsyncStatus::Resolved,
            AsyncState::Rejected { .. } => AsyncStatus::Rejected,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            AsyncState::Resolved { data } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            AsyncState::Rejected { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AsyncState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncState::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, AsyncState::Resolved { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AsyncState::Rejected { .. })
    }

    /// The settled outcome, or `None` while idle or pending. Callers that
    /// render an error boundary propagate the `Err` side with `?`.
    pub fn as_result(&self) -> Option<Result<&T, &E>> {
        match self {
            AsyncState::Resolved { data } => Some(Ok(data)),
            AsyncState::Rejected { error } => Some(Err(error)),
            AsyncState::Idle | AsyncState::Pending => None,
        }
    }
}

/// Actions accepted by [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncAction<T, E> {
    /// An operation started.
    Run,
    /// An operation (or a direct `set_data`) produced a value.
    Resolve(T),
    /// An operation (or a direct `set_error`) produced an error.
    Reject(E),
    /// Back to `Idle`.
    Reset,
}

impl<T, E> AsyncAction<T, E> {
    /// The status the action leads to.
    pub fn target(&self) -> AsyncStatus {
        match self {
            AsyncAction::Run => AsyncStatus::Pending,
            AsyncAction::Resolve(_) => AsyncStatus::Resolved,
            AsyncAction::Reject(_) => AsyncStatus::Rejected,
            AsyncAction::Reset => AsyncStatus::Idle,
        }
    }
}

/// Pure, total reducer over [`AsyncState`]. Every action is legal from every
/// state; the new state depends on the action alone, and the previous
/// payload is dropped.
pub fn transition<T, E>(_state: &AsyncState<T, E>, action: AsyncAction<T, E>) -> AsyncState<T, E> {
    match action {
        AsyncAction::Run => AsyncState::Pending,
        AsyncAction::Resolve(data) => AsyncState::Resolved { data },
        AsyncAction::Reject(error) => AsyncState::Rejected { error },
        AsyncAction::Reset => AsyncState::Idle,
    }
}
