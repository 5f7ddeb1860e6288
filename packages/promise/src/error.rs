use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Failures raised by the promise machinery itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromiseError {
    /// A `map`/`flat_map` transform panicked instead of returning.
    #[error("transform panicked: {message}")]
    TransformPanicked { message: String },

    /// Every resolver was dropped while the promise was still pending.
    #[error("promise abandoned before it was settled")]
    Abandoned,
}

/// The failure payload carried by a rejected promise.
///
/// Any error type converts into a `Rejection`, so transforms can use `?` on
/// whatever errors they produce. Cloning is cheap: every observer of a
/// rejected promise receives a handle to the same underlying error. Use
/// [`downcast_ref`](Rejection::downcast_ref) to classify it.
#[derive(Clone)]
pub struct Rejection(Arc<dyn StdError + Send + Sync + 'static>);

impl Rejection {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// A rejection carrying only a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new(Message(message.to_string()))
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.0.is::<E>()
    }

    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// True when both rejections share the same underlying error.
    pub fn ptr_eq(a: &Rejection, b: &Rejection) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl<E> From<E> for Rejection
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
struct Message(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_display_delegates() {
        let rejection = Rejection::new(PromiseError::Abandoned);
        assert_eq!(
            rejection.to_string(),
            "promise abandoned before it was settled"
        );
    }

    #[test]
    fn rejection_downcasts_to_source_type() {
        let rejection: Rejection = PromiseError::TransformPanicked {
            message: "boom".to_string(),
        }
        .into();
        assert!(rejection.is::<PromiseError>());
        assert_eq!(
            rejection.downcast_ref::<PromiseError>(),
            Some(&PromiseError::TransformPanicked {
                message: "boom".to_string()
            })
        );
        assert!(rejection.downcast_ref::<std::io::Error>().is_none());
    }

    #[test]
    fn rejection_from_io_error() {
        let rejection: Rejection =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        let io = rejection.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn rejection_msg() {
        let rejection = Rejection::msg("went wrong");
        assert_eq!(rejection.to_string(), "went wrong");
        assert!(!rejection.is::<PromiseError>());
    }

    #[test]
    fn clones_share_the_error() {
        let a = Rejection::msg("shared");
        let b = a.clone();
        assert!(Rejection::ptr_eq(&a, &b));
        assert!(!Rejection::ptr_eq(&a, &Rejection::msg("shared")));
    }
}
