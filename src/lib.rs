//! Autowiring IoC container keyed by type names.
//!
//! Types are described once in a [`TypeRegistry`]. The [`Container`] resolves a requested name by applying its
//! binding, reusing the singleton if one was built, or analyzing the constructor with the [`Analyzer`] and building
//! every declared dependency first. Constructor analyses are persisted to a [`CacheStore`] and reused until the
//! type's change marker moves.
//!
//! ```
//! use autowire::{Container, MemoryCache, Param, TypeDef, TypeRegistry};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct StdoutLogger;
//!
//! impl Logger for StdoutLogger {
//!     fn log(&self, message: &str) {
//!         println!("{message}");
//!     }
//! }
//!
//! struct OrderService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let registry = TypeRegistry::new()
//!     .register(TypeDef::interface("Logger"))
//!     .register(
//!         TypeDef::new("StdoutLogger", || Ok(StdoutLogger))
//!             .exposes(|logger: Arc<StdoutLogger>| logger as Arc<dyn Logger>),
//!     )
//!     .register(TypeDef::with_constructor(
//!         "OrderService",
//!         [Param::typed("logger", "Logger")],
//!         |arguments| Ok(OrderService { logger: arguments.next()? }),
//!     ));
//!
//! let container = Container::new(registry, MemoryCache::new());
//! container.bind("Logger", "StdoutLogger");
//!
//! let service = container.get_as::<OrderService>("OrderService").unwrap();
//! service.logger.log("order placed");
//! ```

extern crate alloc;

pub(crate) mod analysis;
pub(crate) mod analyzer;
pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod errors;
pub(crate) mod instantiator;
pub(crate) mod reflection;
pub(crate) mod registry;

pub use analysis::{ConstructorAnalysis, ParameterSpec, SourceMarker};
pub use analyzer::Analyzer;
pub use any::Instance;
pub use cache::{CacheStore, MemoryCache};
pub use config::Config;
pub use container::{Container, Dump};
pub use errors::{CacheErrorKind, DependencyPath, InstantiateErrorKind, ReflectionErrorKind, ResolveErrorKind};
pub use instantiator::{Arguments, Construct};
pub use reflection::Introspect;
pub use registry::{Param, Source, TypeDef, TypeRegistry};

#[cfg(feature = "fs")]
pub use cache::FileCache;
