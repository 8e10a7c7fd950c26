use alloc::{string::String, sync::Arc};

mod memory;

#[cfg(feature = "fs")]
mod file;

pub use memory::MemoryCache;

#[cfg(feature = "fs")]
pub use file::FileCache;

/// String-keyed store for persisted constructor analyses.
///
/// Implementations must be usable from several threads at once.
/// Failures are reported through return values only: the analyzer treats the store as an optimization.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Returns `false` if the value wasn't stored
    fn set(&self, key: &str, value: &str) -> bool;

    /// No-op if the key is absent
    fn delete(&self, key: &str);

    fn clear(&self);
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    #[inline]
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> bool {
        (**self).set(key, value)
    }

    #[inline]
    fn delete(&self, key: &str) {
        (**self).delete(key);
    }

    #[inline]
    fn clear(&self) {
        (**self).clear();
    }
}
