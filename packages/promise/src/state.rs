use std::fmt;

use crate::error::Rejection;

/// Settlement state of a promise.
#[derive(Debug, Clone)]
pub enum State<T> {
    /// Not settled yet. Moves to `Fulfilled` or `Rejected` exactly once.
    Pending,

    /// Settled with a value. Terminal.
    Fulfilled(T),

    /// Settled with a failure. Terminal.
    Rejected(Rejection),
}

impl<T> State<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, State::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, State::Rejected(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            State::Fulfilled(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Rejection> {
        match self {
            State::Rejected(error) => Some(error),
            _ => None,
        }
    }

    /// The outcome, or `None` while pending.
    pub fn as_result(&self) -> Option<Result<&T, &Rejection>> {
        match self {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value)),
            State::Rejected(error) => Some(Err(error)),
        }
    }
}

impl<T: Clone> State<T> {
    pub(crate) fn to_result(&self) -> Option<Result<T, Rejection>> {
        self.as_result()
            .map(|outcome| outcome.map(T::clone).map_err(Rejection::clone))
    }
}

impl<T: fmt::Debug> fmt::Display for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Pending => write!(f, "Pending"),
            State::Fulfilled(value) => write!(f, "Fulfilled ({:?})", value),
            State::Rejected(error) => write!(f, "Rejected ({})", error),
        }
    }
}
