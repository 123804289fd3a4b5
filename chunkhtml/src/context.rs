//! The execution context handed to components and deferred properties at render time.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::RenderError;

/// A cheaply-clonable, request-scoped execution context.
///
/// A context carries a cancellation flag and a chain of typed values. Children created with
/// [`Context::with_value`] see every value of their ancestors and share their cancellation
/// flag, so cancelling any context in a chain cancels the whole chain.
///
/// The rendering core never checks cancellation itself; components and deferred properties
/// that care can call [`Context::check`].
///
/// # Example
///
/// ```
/// use chunkhtml::Context;
///
/// struct Theme(&'static str);
///
/// let ctx = Context::background().with_value(Theme("dark"));
/// assert_eq!(ctx.value::<Theme>().map(|t| t.0), Some("dark"));
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: Arc<AtomicBool>,
    value: Option<(TypeId, Arc<dyn Any + Send + Sync>)>,
    parent: Option<Context>,
}

impl Context {
    /// Create a new cancellable root context.
    pub fn new() -> Self {
        Context {
            inner: Arc::new(Inner {
                cancelled: Arc::new(AtomicBool::new(false)),
                value: None,
                parent: None,
            }),
        }
    }

    /// A shared, never-cancelled context used when the caller does not supply one.
    pub fn background() -> &'static Context {
        static BACKGROUND: OnceLock<Context> = OnceLock::new();
        BACKGROUND.get_or_init(|| Context {
            inner: Arc::new(Inner {
                cancelled: Arc::new(AtomicBool::new(false)),
                value: None,
                parent: None,
            }),
        })
    }

    /// Derive a child context carrying `value`. Looking up `T` on the child (or any of its
    /// descendants) returns this value until shadowed by another `with_value::<T>`.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Context {
        Context {
            inner: Arc::new(Inner {
                cancelled: self.inner.cancelled.clone(),
                value: Some((TypeId::of::<T>(), Arc::new(value))),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Look up the nearest value of type `T`.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some((id, value)) = &ctx.inner.value {
                if *id == TypeId::of::<T>() {
                    return value.downcast_ref::<T>();
                }
            }
            current = ctx.inner.parent.as_ref();
        }
        None
    }

    /// Cancel this context and every context sharing its chain.
    ///
    /// Has no effect on [`Context::background`] or contexts derived from it.
    pub fn cancel(&self) {
        if Arc::ptr_eq(&self.inner.cancelled, &Context::background().inner.cancelled) {
            return;
        }
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Whether the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Return [`RenderError::Cancelled`] if the context has been cancelled.
    pub fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User(&'static str);
    struct Locale(&'static str);

    #[test]
    fn values_are_inherited_and_shadowed() {
        let root = Context::new().with_value(User("ada"));
        let child = root.with_value(Locale("en"));
        assert_eq!(child.value::<User>().map(|u| u.0), Some("ada"));
        assert_eq!(child.value::<Locale>().map(|l| l.0), Some("en"));
        assert!(root.value::<Locale>().is_none());

        let shadowed = child.with_value(User("grace"));
        assert_eq!(shadowed.value::<User>().map(|u| u.0), Some("grace"));
        assert_eq!(child.value::<User>().map(|u| u.0), Some("ada"));
    }

    #[test]
    fn cancellation_is_shared_along_the_chain() {
        let root = Context::new();
        let child = root.with_value(User("ada"));
        assert!(child.check().is_ok());
        child.cancel();
        assert!(root.is_cancelled());
        assert!(matches!(root.check(), Err(RenderError::Cancelled)));
    }

    #[test]
    fn background_cannot_be_cancelled() {
        Context::background().cancel();
        Context::background().with_value(User("ada")).cancel();
        assert!(!Context::background().is_cancelled());
    }
}
