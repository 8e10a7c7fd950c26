/// Config for the analyzer and the container
/// ## Fields
/// - `cache_analyses`:
///   If `true`, constructor analyses of types with a change marker are persisted to the cache store and reused
///   until the marker changes. If `false`, the cache store is never read or written.
///
/// - `max_depth`:
///   Maximum length of the chain of types being constructed at once.
///   Cycles are detected regardless of this limit.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub cache_analyses: bool,
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_analyses: true,
            max_depth: 1024,
        }
    }
}
