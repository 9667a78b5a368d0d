//! Registered result callbacks

use parking_lot::RwLock;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

use super::types::BuildResult;

/// Handler invoked once per build result, in result order
pub type BuildCallback = Arc<dyn Fn(&BuildResult) + Send + Sync>;

/// Opaque registration token returned by `add`, required by `remove`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackHandle(u64);

impl CallbackHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Counts from one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub invoked: usize,
    pub failed: usize,
}

/// Ordered callback list. Registration order is invocation order; the same
/// closure may be registered more than once.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<(CallbackHandle, BuildCallback)>>,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registered", &self.len())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&BuildResult) + Send + Sync + 'static,
    {
        let handle = CallbackHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((handle, Arc::new(callback)));
        handle
    }

    /// Remove a registration. Returns `false` if the handle is unknown.
    pub fn remove(&self, handle: CallbackHandle) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|(h, _)| *h == handle) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback registered at call time.
    ///
    /// The list is copied and the lock released first, so a callback may
    /// add or remove registrations without deadlocking. A panicking
    /// callback is logged and skipped; the rest still run.
    pub fn invoke_all(&self, result: &BuildResult) -> CallbackOutcome {
        let callbacks: Vec<(CallbackHandle, BuildCallback)> = self.entries.read().clone();

        let mut outcome = CallbackOutcome::default();
        for (handle, callback) in callbacks {
            outcome.invoked += 1;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(result))) {
                outcome.failed += 1;
                error!(
                    callback_id = handle.id(),
                    component = %result.component,
                    panic_msg = %panic_message(panic.as_ref()),
                    "Result callback panicked"
                );
            }
        }
        outcome
    }
}

pub(super) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn result() -> BuildResult {
        BuildResult::success("sidebar", Duration::from_millis(3))
    }

    #[test]
    fn test_invocation_follows_registration_order() {
        let registry = CallbackRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            registry.add(move |_| order.lock().push(tag));
        }

        let outcome = registry.invoke_all(&result());

        assert_eq!(outcome, CallbackOutcome { invoked: 3, failed: 0 });
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let registry = CallbackRegistry::new();
        let calls = Arc::new(AtomicU64::new(0));
        let a = calls.clone();
        registry.add(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        registry.add(|_| panic!("live reload socket closed"));
        let c = calls.clone();
        registry.add(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = registry.invoke_all(&result());

        assert_eq!(outcome.failed, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_by_handle() {
        let registry = CallbackRegistry::new();
        let first = registry.add(|_| {});
        let second = registry.add(|_| {});
        assert_ne!(first, second);

        assert!(registry.remove(first));
        assert!(!registry.remove(first));
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_may_register_another_callback() {
        let registry = Arc::new(CallbackRegistry::new());
        let inner = registry.clone();
        registry.add(move |_| {
            inner.add(|_| {});
        });

        registry.invoke_all(&result());

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "Unknown panic");
    }
}
