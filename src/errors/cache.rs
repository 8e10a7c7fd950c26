use alloc::string::String;
use std::io;

/// Errors raised by cache backends.
///
/// These never reach the container's callers: the analyzer logs them and
/// falls back to a freshly computed analysis.
#[derive(thiserror::Error, Debug)]
pub enum CacheErrorKind {
    #[error("Cache entry I/O failed for `{key}`: {source}")]
    Io { key: String, source: io::Error },
    #[error("Cache entry for `{key}` can't be encoded: {source}")]
    Encode { key: String, source: serde_json::Error },
}
