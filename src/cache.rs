use core::fmt::{self, Debug, Formatter};
use tracing::debug;

use crate::{any::Instance, errors::LocateError, immutable::SharedTree, lock::KeyedLocks, strategy::LocateKey};

/// Slot of a scope cache: one compiled plan, optionally split by key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey {
    plan: u64,
    key: Option<LocateKey>,
}

impl CacheKey {
    #[inline]
    #[must_use]
    pub const fn new(plan: u64, key: Option<LocateKey>) -> Self {
        Self { plan, key }
    }
}

/// Instances shared within one scope.
///
/// Reads are lock-free. The first caller of a missing slot materializes it under the slot's
/// lock, concurrent callers of the same slot wait and then read the stored instance.
#[derive(Default)]
pub struct ScopeCache {
    instances: SharedTree<CacheKey, Instance>,
    locks: KeyedLocks<CacheKey>,
}

impl ScopeCache {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Instance> {
        self.instances.get(key)
    }

    /// Returns the cached instance of `key`, materializing it at most once.
    ///
    /// # Errors
    /// Returns the error of `materialize`, nothing is cached in that case.
    pub fn get_or_materialize(
        &self,
        key: CacheKey,
        materialize: impl FnOnce() -> Result<Instance, LocateError>,
    ) -> Result<Instance, LocateError> {
        if let Some(instance) = self.instances.get(&key) {
            debug!("Found in cache");
            return Ok(instance);
        }

        let lock = self.locks.get(&key);
        let _guard = lock.lock();
        if let Some(instance) = self.instances.get(&key) {
            debug!("Found in cache after wait");
            return Ok(instance);
        }
        debug!("Not found in cache");

        let instance = materialize()?;
        self.instances.thread_safe_update(key.clone(), instance.clone());
        self.locks.release(&key);
        debug!("Cached");

        Ok(instance)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Drops every cached instance.
    #[inline]
    pub fn clear(&self) {
        self.instances.thread_safe_empty();
    }
}

impl Debug for ScopeCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::{format, string::{String, ToString}};

    use super::{CacheKey, ScopeCache};
    use crate::{
        any::Instance,
        errors::LocateErrorKind,
        strategy::{ExportKey, LocateKey},
    };

    use alloc::{sync::Arc, vec::Vec};
    use core::sync::atomic::{AtomicU8, Ordering};
    use std::{thread, time::Duration};
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_materializes_once_under_contention() {
        let cache = Arc::new(ScopeCache::new());
        let calls = Arc::new(AtomicU8::new(0));

        let handles = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                thread::spawn(move || {
                    cache
                        .get_or_materialize(CacheKey::new(1, None), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(10));
                            Ok(Instance::from_value(7_u32))
                        })
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();
        let instances = handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|instance| instance.ptr_eq(&instances[0])));
    }

    #[test]
    #[traced_test]
    fn test_failure_is_not_cached_and_keys_are_distinct() {
        let cache = ScopeCache::new();
        let failed = cache.get_or_materialize(CacheKey::new(1, None), || {
            Err(LocateErrorKind::CannotLocateExport {
                requested: ExportKey::of::<u8>(),
            }
            .into())
        });
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let first = cache
            .get_or_materialize(CacheKey::new(1, Some(LocateKey::Int(1))), || Ok(Instance::from_value(1_u8)))
            .unwrap();
        let second = cache
            .get_or_materialize(CacheKey::new(1, Some(LocateKey::Int(2))), || Ok(Instance::from_value(2_u8)))
            .unwrap();

        assert!(!first.ptr_eq(&second));
        assert_eq!(cache.len(), 2);
    }
}
