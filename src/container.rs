use alloc::{
    collections::BTreeMap,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use parking_lot::Mutex;
use tracing::{debug, debug_span, error, info_span, warn};

use crate::{
    analyzer::Analyzer,
    any::Instance,
    cache::CacheStore,
    config::Config,
    errors::{DependencyPath, ResolveErrorKind},
    instantiator::Construct,
    registry::TypeRegistry,
};

/// Autowiring container.
///
/// Resolves types by name, building their constructor dependencies recursively and keeping one instance
/// per resolved type name for the container's lifetime.
/// Clones share the same bindings and instances.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    analyzer: Analyzer,
    constructor: Arc<dyn Construct>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    bindings: BTreeMap<String, String>,
    singletons: BTreeMap<String, Instance>,
}

/// Snapshot of the container state for diagnostics
#[derive(Debug, Clone)]
pub struct Dump {
    /// Resolved type name to its instance
    pub singletons: BTreeMap<String, Instance>,
    /// Requested type name to implementation type name
    pub bindings: BTreeMap<String, String>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new(registry: TypeRegistry, cache: impl CacheStore + 'static) -> Self {
        Self::with_config(registry, cache, Config::default())
    }

    #[must_use]
    pub fn with_config(registry: TypeRegistry, cache: impl CacheStore + 'static, config: Config) -> Self {
        let registry = Arc::new(registry);
        let analyzer = Analyzer::with_config(registry.clone(), Arc::new(cache), config);
        Self::from_parts(analyzer, registry)
    }

    /// Creates container from a custom analyzer and constructor.
    /// Resolution depth is limited by the analyzer's config.
    #[inline]
    #[must_use]
    pub fn from_parts(analyzer: Analyzer, constructor: Arc<dyn Construct>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                analyzer,
                constructor,
                state: Mutex::new(State::default()),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn analyzer(&self) -> &Analyzer {
        &self.inner.analyzer
    }

    /// Binds `interface` to `implementation`, replacing a previous binding.
    ///
    /// # Notes
    /// Only lookups made after the call use the binding: instances already built keep the dependencies they got.
    /// Bindings aren't chained, `get(interface)` builds `implementation` even if it's bound itself.
    pub fn bind(&self, interface: impl Into<String>, implementation: impl Into<String>) {
        let interface = interface.into();
        let implementation = implementation.into();

        let mut state = self.inner.state.lock();
        match state.bindings.insert(interface.clone(), implementation.clone()) {
            Some(previous) if previous != implementation => {
                debug!(%interface, %previous, %implementation, "Binding replaced");
            }
            _ => debug!(%interface, %implementation, "Bound"),
        }
    }

    /// Gets the singleton instance of `type_name`, building it with its dependencies on first use.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Reflection`] if the type or one of its dependencies is unknown
    /// - Returns [`ResolveErrorKind::NotInstantiable`] if a type to build is an interface or abstract
    /// - Returns [`ResolveErrorKind::PrivateConstructor`] if a constructor to call is private
    /// - Returns [`ResolveErrorKind::UntypedParameter`] if a constructor parameter has no dependency type
    /// - Returns [`ResolveErrorKind::CyclicDependency`] if a type depends on itself
    /// - Returns [`ResolveErrorKind::DepthExceeded`] if the dependency chain is too long
    /// - Returns [`ResolveErrorKind::Instantiate`] if a factory fails
    ///
    /// Dependencies built before the failure stay cached, the failed type isn't cached.
    pub fn get(&self, type_name: &str) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("get", type_name);
        let _guard = span.enter();

        let mut state = self.inner.state.lock();
        Resolution {
            inner: &self.inner,
            state: &mut state,
            stack: Vec::new(),
        }
        .get(type_name)
    }

    /// Gets the singleton instance of `type_name` as `Arc<T>`, where `T` is its concrete type or an exposed view.
    ///
    /// # Errors
    /// Returns errors of [`Self::get`] and [`ResolveErrorKind::IncorrectType`] if the instance can't be viewed as `T`
    pub fn get_as<T: ?Sized + 'static>(&self, type_name: &str) -> Result<Arc<T>, ResolveErrorKind> {
        let instance = self.get(type_name)?;
        instance.downcast::<T>().ok_or_else(|| {
            let err = ResolveErrorKind::IncorrectType {
                type_name: type_name.to_string(),
                expected: core::any::type_name::<T>(),
                actual: instance.type_name().to_string(),
            };
            error!("{}", err);
            err
        })
    }

    /// Checks whether `type_name`, after applying its binding, already has an instance
    #[must_use]
    pub fn is_resolved(&self, type_name: &str) -> bool {
        let state = self.inner.state.lock();
        let resolved = state.bindings.get(type_name).map_or(type_name, String::as_str);
        state.singletons.contains_key(resolved)
    }

    /// Resets the container.
    ///
    /// # Warning
    /// This is a global operation, `type_name` is only logged: **all** instances and **all** bindings are dropped
    /// and the analyzer's cache store is purged. A removed binding may change whether dependents are instantiable,
    /// so nothing resolved before is kept.
    pub fn remove(&self, type_name: &str) {
        let mut state = self.inner.state.lock();
        let singletons = state.singletons.len();
        let bindings = state.bindings.len();
        state.singletons.clear();
        state.bindings.clear();
        self.inner.analyzer.purge_all();

        warn!(type_name, singletons, bindings, "Container reset");
    }

    /// Returns current instances and bindings
    #[must_use]
    pub fn get_dump(&self) -> Dump {
        let state = self.inner.state.lock();
        Dump {
            singletons: state.singletons.clone(),
            bindings: state.bindings.clone(),
        }
    }
}

/// One external `get` call: the state stays locked and `stack` holds the types being built
struct Resolution<'a> {
    inner: &'a ContainerInner,
    state: &'a mut State,
    stack: Vec<String>,
}

impl Resolution<'_> {
    fn get(&mut self, type_name: &str) -> Result<Instance, ResolveErrorKind> {
        let resolved = match self.state.bindings.get(type_name) {
            Some(implementation) => {
                debug!(type_name, %implementation, "Binding applied");
                implementation.clone()
            }
            None => type_name.to_string(),
        };

        if let Some(instance) = self.state.singletons.get(&resolved) {
            debug!(type_name = %resolved, "Found in singletons");
            return Ok(instance.clone());
        }

        if let Some(position) = self.stack.iter().position(|in_progress| *in_progress == resolved) {
            let mut path = self.stack[position..].to_vec();
            path.push(resolved);
            let err = ResolveErrorKind::CyclicDependency {
                path: DependencyPath(path.into_boxed_slice()),
            };
            error!("{}", err);
            return Err(err);
        }

        let max_depth = self.inner.analyzer.config().max_depth;
        if self.stack.len() >= max_depth {
            let err = ResolveErrorKind::DepthExceeded {
                type_name: resolved,
                depth: max_depth,
            };
            error!("{}", err);
            return Err(err);
        }

        self.stack.push(resolved.clone());
        let result = self.instantiate(&resolved);
        self.stack.pop();

        let instance = result?;
        self.state.singletons.insert(resolved, instance.clone());
        debug!("Cached");
        Ok(instance)
    }

    fn instantiate(&mut self, type_name: &str) -> Result<Instance, ResolveErrorKind> {
        let span = debug_span!("instantiate", type_name);
        let _guard = span.enter();

        let analysis = match self.inner.analyzer.get_constructor_analysis(type_name) {
            Ok(analysis) => analysis,
            Err(err) => {
                error!("{}", err);
                return Err(err.into());
            }
        };

        if !analysis.is_instantiable {
            let err = ResolveErrorKind::NotInstantiable {
                type_name: type_name.to_string(),
            };
            error!("{}", err);
            return Err(err);
        }
        if !analysis.has_constructor {
            debug!("No constructor, building without arguments");
            return self.inner.constructor.construct(type_name, Vec::new());
        }
        if analysis.constructor_is_private {
            let err = ResolveErrorKind::PrivateConstructor {
                type_name: type_name.to_string(),
            };
            error!("{}", err);
            return Err(err);
        }

        let mut dependencies = Vec::with_capacity(analysis.parameters.len());
        for parameter in analysis.parameters {
            if parameter.is_untyped() {
                let err = ResolveErrorKind::UntypedParameter {
                    type_name: type_name.to_string(),
                    parameter: parameter.name,
                };
                error!("{}", err);
                return Err(err);
            }
            dependencies.push(self.get(&parameter.declared_type)?);
        }

        let instance = self.inner.constructor.construct(type_name, dependencies)?;
        debug!("Constructed");
        Ok(instance)
    }
}
