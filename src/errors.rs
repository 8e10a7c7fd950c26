mod cache;
mod instantiate;
mod reflection;
mod resolve;

pub use cache::CacheErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use reflection::ReflectionErrorKind;
pub use resolve::{DependencyPath, ResolveErrorKind};
