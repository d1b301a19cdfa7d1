use alloc::{sync::Arc, vec::Vec};
use core::{
    fmt::{self, Debug, Formatter},
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::{debug, error};

use crate::{
    any::RcAny,
    errors::DisposalErrorKind,
    finalizer::{boxed_finalizer_factory, BoxedCloneFinalizer, FinalizeOutput},
    immutable::SharedList,
    service::Service as _,
};

#[derive(Clone)]
struct DisposalEntry {
    name: &'static str,
    instance: RcAny,
    finalizer: BoxedCloneFinalizer,
}

/// Ordered set of instances released together.
///
/// Instances are finalized in reverse registration order. A failing finalizer doesn't stop
/// the others: every failure is logged and returned at the end as [`DisposalErrorKind::Aggregate`].
/// Once disposed, the scope is closed and rejects new registrations.
#[derive(Default)]
pub struct DisposalScope {
    entries: SharedList<DisposalEntry>,
    closed: AtomicBool,
}

impl DisposalScope {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&self, name: &'static str, instance: RcAny, finalizer: BoxedCloneFinalizer) -> Result<(), DisposalErrorKind> {
        if self.is_closed() {
            return Err(DisposalErrorKind::Closed);
        }

        self.entries.thread_safe_add(DisposalEntry { name, instance, finalizer });
        debug!(instance = name, "Tracked for disposal");

        // Closed while we were adding: the entry would never be finalized otherwise
        if self.is_closed() {
            self.dispose_late(name);
            return Err(DisposalErrorKind::Closed);
        }
        Ok(())
    }

    fn dispose_late(&self, name: &'static str) {
        if let Err(err) = self.dispose() {
            error!(instance = name, "Late disposal failed: {}", err);
        }
    }

    /// Registers a cleanup callback that isn't bound to an instance.
    ///
    /// # Errors
    /// Returns [`DisposalErrorKind::Closed`] if the scope was already disposed.
    pub fn track_callback<F, Out>(&self, name: &'static str, mut callback: F) -> Result<(), DisposalErrorKind>
    where
        F: FnMut() -> Out + Clone + Send + Sync + 'static,
        Out: FinalizeOutput,
    {
        let finalizer = boxed_finalizer_factory(move |_: Arc<()>| callback().into_result());
        self.track(name, Arc::new(()), finalizer)
    }

    /// Finalizes every tracked instance, last registered first, and closes the scope.
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    /// Returns [`DisposalErrorKind::Aggregate`] with every failure, after all instances were processed.
    pub fn dispose(&self) -> Result<(), DisposalErrorKind> {
        self.closed.store(true, Ordering::Release);

        let entries = self.entries.thread_safe_empty();
        let mut failures = Vec::new();
        for entry in entries.iter() {
            let name = entry.name;
            match entry.finalizer.clone().call(entry.instance.clone()) {
                Ok(()) => debug!(instance = name, "Disposed"),
                Err(err) => {
                    error!(instance = name, "Disposal failed: {}", err);
                    failures.push(DisposalErrorKind::Failed { name, source: err });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DisposalErrorKind::Aggregate(failures))
        }
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Count of instances waiting for disposal.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for DisposalScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposalScope")
            .field("tracked", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Supplies the disposal scope of a new child scope.
pub trait DisposalScopeProvider: Send + Sync {
    fn provide(&self, scope_name: Option<&str>) -> Arc<DisposalScope>;
}

impl<F> DisposalScopeProvider for F
where
    F: Fn(Option<&str>) -> Arc<DisposalScope> + Send + Sync,
{
    #[inline]
    fn provide(&self, scope_name: Option<&str>) -> Arc<DisposalScope> {
        self(scope_name)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::{format, string::{String, ToString}};

    use super::DisposalScope;
    use crate::errors::DisposalErrorKind;

    use alloc::{sync::Arc, vec, vec::Vec};
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    fn record(order: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl FnMut() + Clone + Send + Sync + 'static {
        let order = order.clone();
        move || order.lock().push(name)
    }

    #[test]
    #[traced_test]
    fn test_reverse_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let scope = DisposalScope::new();

        scope.track_callback("a", record(&order, "a")).unwrap();
        scope.track_callback("b", record(&order, "b")).unwrap();
        scope.track_callback("c", record(&order, "c")).unwrap();
        scope.dispose().unwrap();

        assert_eq!(*order.lock(), vec!["c", "b", "a"]);
        assert!(scope.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_failures_are_collected() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let scope = DisposalScope::new();

        scope.track_callback("a", record(&order, "a")).unwrap();
        scope
            .track_callback("broken", || Err::<(), _>(anyhow::anyhow!("boom")))
            .unwrap();
        scope.track_callback("c", record(&order, "c")).unwrap();

        let Err(DisposalErrorKind::Aggregate(failures)) = scope.dispose() else {
            panic!("expected aggregate failure");
        };

        assert_eq!(failures.len(), 1);
        assert_eq!(*order.lock(), vec!["c", "a"]);
        assert!(logs_contain("Disposal failed"));
    }

    #[test]
    #[traced_test]
    fn test_closed_scope_rejects_and_is_idempotent() {
        let scope = DisposalScope::new();
        scope.dispose().unwrap();
        scope.dispose().unwrap();

        assert!(matches!(scope.track_callback("late", || ()), Err(DisposalErrorKind::Closed)));
        assert!(scope.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_late_disposal_failure_is_logged() {
        let scope = DisposalScope::new();
        scope
            .track_callback("broken", || Err::<(), _>(anyhow::anyhow!("boom")))
            .unwrap();

        // Entry added after a concurrent close
        scope.closed.store(true, core::sync::atomic::Ordering::Release);
        scope.dispose_late("broken");

        assert!(scope.is_empty());
        assert!(logs_contain("Late disposal failed"));
    }
}
