use alloc::sync::Arc;
use tracing::{debug, debug_span, warn};

use crate::{
    analysis::{CacheEntry, ConstructorAnalysis, SourceMarker},
    cache::CacheStore,
    config::Config,
    errors::ReflectionErrorKind,
    reflection::Introspect,
};

/// Produces constructor analyses, memoized in a [`CacheStore`] and invalidated by the type's change marker.
///
/// A cached analysis is reused only while both the stored source location and version equal the observed ones.
/// Types without a change marker are analyzed on every call.
#[derive(Clone)]
pub struct Analyzer {
    introspector: Arc<dyn Introspect>,
    cache: Arc<dyn CacheStore>,
    config: Config,
}

impl Analyzer {
    #[inline]
    #[must_use]
    pub fn new(introspector: Arc<dyn Introspect>, cache: Arc<dyn CacheStore>) -> Self {
        Self::with_config(introspector, cache, Config::default())
    }

    #[inline]
    #[must_use]
    pub fn with_config(introspector: Arc<dyn Introspect>, cache: Arc<dyn CacheStore>, config: Config) -> Self {
        Self {
            introspector,
            cache,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the constructor analysis of `type_name`, from the cache store if it's still fresh.
    ///
    /// Failing to persist a fresh analysis isn't an error, it's only logged.
    ///
    /// # Errors
    /// Returns [`ReflectionErrorKind::UnknownType`] if the name doesn't denote a known type
    pub fn get_constructor_analysis(&self, type_name: &str) -> Result<ConstructorAnalysis, ReflectionErrorKind> {
        let span = debug_span!("analyze", type_name);
        let _guard = span.enter();

        let marker = if self.config.cache_analyses {
            self.introspector.source_marker(type_name)?
        } else {
            None
        };

        match &marker {
            Some(marker) => {
                if let Some(analysis) = self.read_fresh(type_name, marker) {
                    debug!("Found in cache");
                    return Ok(analysis);
                }
                debug!("Not found in cache");
            }
            None => debug!("No change marker, cache skipped"),
        }

        let analysis = self.introspector.introspect(type_name)?;
        if let Some(marker) = &marker {
            self.write(type_name, marker, &analysis);
        }
        Ok(analysis)
    }

    /// Removes the cached analysis of one type
    #[inline]
    pub fn invalidate(&self, type_name: &str) {
        self.cache.delete(cache_key(type_name));
        debug!(type_name, "Cache entry invalidated");
    }

    /// Clears the whole cache store, including entries not written by this analyzer
    #[inline]
    pub fn purge_all(&self) {
        self.cache.clear();
        debug!("Cache purged");
    }

    fn read_fresh(&self, type_name: &str, marker: &SourceMarker) -> Option<ConstructorAnalysis> {
        let raw = self.cache.get(cache_key(type_name))?;
        let Some(entry) = CacheEntry::decode(&raw) else {
            warn!("Cache entry can't be decoded");
            return None;
        };
        if entry.is_fresh(marker) {
            Some(entry.analysis)
        } else {
            debug!(
                cached_location = %entry.source_location,
                cached_version = entry.source_version,
                location = %marker.location,
                version = marker.version,
                "Cache entry is stale",
            );
            None
        }
    }

    fn write(&self, type_name: &str, marker: &SourceMarker, analysis: &ConstructorAnalysis) {
        let key = cache_key(type_name);
        let raw = match CacheEntry::new(marker, analysis.clone()).encode(key) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("{}", err);
                return;
            }
        };
        if self.cache.set(key, &raw) {
            debug!("Cached");
        } else {
            warn!("Cache store refused the entry");
        }
    }
}

/// Type names are unique within a registry, so they're used as keys as is
#[inline]
#[must_use]
fn cache_key(type_name: &str) -> &str {
    type_name
}

#[cfg(test)]
mod tests {
    use super::Analyzer;
    use crate::{
        analysis::{ConstructorAnalysis, SourceMarker},
        cache::{CacheStore, MemoryCache},
        config::Config,
        errors::ReflectionErrorKind,
        reflection::Introspect,
        registry::{Param, Source, TypeDef, TypeRegistry},
    };

    use alloc::{string::String, sync::Arc};
    use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use tracing_test::traced_test;

    struct Logger;
    struct AppConfig;

    /// Counts introspections and lets tests move the change marker
    struct Counting {
        registry: TypeRegistry,
        introspections: AtomicUsize,
        version: AtomicU64,
    }

    impl Counting {
        fn new(registry: TypeRegistry) -> Self {
            Self {
                registry,
                introspections: AtomicUsize::new(0),
                version: AtomicU64::new(1),
            }
        }

        fn introspections(&self) -> usize {
            self.introspections.load(Ordering::SeqCst)
        }

        fn touch(&self) {
            self.version.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Introspect for Counting {
        fn source_marker(&self, type_name: &str) -> Result<Option<SourceMarker>, ReflectionErrorKind> {
            Ok(self.registry.source_marker(type_name)?.map(|marker| SourceMarker {
                version: self.version.load(Ordering::SeqCst),
                ..marker
            }))
        }

        fn introspect(&self, type_name: &str) -> Result<ConstructorAnalysis, ReflectionErrorKind> {
            self.introspections.fetch_add(1, Ordering::SeqCst);
            self.registry.introspect(type_name)
        }
    }

    /// Store whose writes always fail
    struct ReadOnly;

    impl CacheStore for ReadOnly {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> bool {
            false
        }

        fn delete(&self, _key: &str) {}

        fn clear(&self) {}
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .register(TypeDef::new("Logger", || Ok(Logger)).source(Source::versioned("app/logger.rs", 1)))
            .register(TypeDef::new("Config", || Ok(AppConfig)).source(Source::versioned("app/config.rs", 1)))
            .register(
                TypeDef::with_constructor(
                    "OrderService",
                    [Param::typed("logger", "Logger"), Param::typed("config", "Config")],
                    |_| Ok(()),
                )
                .source(Source::versioned("app/order.rs", 1)),
            )
            .register(TypeDef::new("Dynamic", || Ok(())))
    }

    #[test]
    #[traced_test]
    fn test_cache_hit_skips_introspection() {
        let introspector = Arc::new(Counting::new(registry()));
        let analyzer = Analyzer::new(introspector.clone(), Arc::new(MemoryCache::new()));

        let first = analyzer.get_constructor_analysis("OrderService").unwrap();
        let second = analyzer.get_constructor_analysis("OrderService").unwrap();

        assert_eq!(first, second);
        assert_eq!(introspector.introspections(), 1);
        assert_eq!(second.parameters[0].name, "logger");
        assert_eq!(second.parameters[1].declared_type, "Config");
    }

    #[test]
    #[traced_test]
    fn test_changed_marker_recomputes() {
        let introspector = Arc::new(Counting::new(registry()));
        let analyzer = Analyzer::new(introspector.clone(), Arc::new(MemoryCache::new()));

        analyzer.get_constructor_analysis("Logger").unwrap();
        introspector.touch();
        analyzer.get_constructor_analysis("Logger").unwrap();
        analyzer.get_constructor_analysis("Logger").unwrap();

        assert_eq!(introspector.introspections(), 2);
        assert!(logs_contain("Cache entry is stale"));
    }

    #[test]
    #[traced_test]
    fn test_no_marker_never_cached() {
        let cache = Arc::new(MemoryCache::new());
        let introspector = Arc::new(Counting::new(registry()));
        let analyzer = Analyzer::new(introspector.clone(), cache.clone());

        analyzer.get_constructor_analysis("Dynamic").unwrap();
        analyzer.get_constructor_analysis("Dynamic").unwrap();

        assert_eq!(introspector.introspections(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_entry_stored_under_type_name() {
        let cache = Arc::new(MemoryCache::new());
        let analyzer = Analyzer::new(Arc::new(registry()), cache.clone());

        analyzer.get_constructor_analysis("Logger").unwrap();

        let raw = cache.get("Logger").unwrap();
        assert!(raw.contains(r#""sourceLocation":"app/logger.rs""#));
    }

    #[test]
    #[traced_test]
    fn test_corrupted_entry_recomputes() {
        let cache = Arc::new(MemoryCache::new());
        let introspector = Arc::new(Counting::new(registry()));
        let analyzer = Analyzer::new(introspector.clone(), cache.clone());

        cache.set("Logger", "{ not json");
        let analysis = analyzer.get_constructor_analysis("Logger").unwrap();

        assert!(!analysis.has_constructor);
        assert_eq!(introspector.introspections(), 1);
        assert!(logs_contain("Cache entry can't be decoded"));
    }

    #[test]
    #[traced_test]
    fn test_write_failure_is_not_fatal() {
        let introspector = Arc::new(Counting::new(registry()));
        let analyzer = Analyzer::new(introspector.clone(), Arc::new(ReadOnly));

        let analysis = analyzer.get_constructor_analysis("OrderService").unwrap();

        assert_eq!(analysis.parameters.len(), 2);
        assert!(logs_contain("Cache store refused the entry"));
    }

    #[test]
    #[traced_test]
    fn test_unknown_type() {
        let analyzer = Analyzer::new(Arc::new(registry()), Arc::new(MemoryCache::new()));

        assert!(matches!(
            analyzer.get_constructor_analysis("Missing"),
            Err(ReflectionErrorKind::UnknownType { type_name }) if type_name == "Missing"
        ));
    }

    #[test]
    #[traced_test]
    fn test_invalidate_and_purge() {
        let cache = Arc::new(MemoryCache::new());
        let introspector = Arc::new(Counting::new(registry()));
        let analyzer = Analyzer::new(introspector.clone(), cache.clone());

        analyzer.get_constructor_analysis("Logger").unwrap();
        analyzer.get_constructor_analysis("Config").unwrap();

        analyzer.invalidate("Logger");
        assert!(cache.get("Logger").is_none());
        assert!(cache.get("Config").is_some());

        analyzer.purge_all();
        assert!(cache.is_empty());

        analyzer.get_constructor_analysis("Config").unwrap();
        assert_eq!(introspector.introspections(), 3);
    }

    #[test]
    #[traced_test]
    fn test_caching_disabled() {
        let cache = Arc::new(MemoryCache::new());
        let introspector = Arc::new(Counting::new(registry()));
        let config = Config {
            cache_analyses: false,
            ..Config::default()
        };
        let analyzer = Analyzer::with_config(introspector.clone(), cache.clone(), config);

        analyzer.get_constructor_analysis("Logger").unwrap();
        analyzer.get_constructor_analysis("Logger").unwrap();

        assert_eq!(introspector.introspections(), 2);
        assert!(cache.is_empty());
    }
}
