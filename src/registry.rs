use alloc::{
    collections::BTreeMap,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use core::any::{type_name, TypeId};
use std::{fs, path::PathBuf, time::UNIX_EPOCH};
use tracing::debug;

use crate::{
    analysis::{ConstructorAnalysis, ParameterSpec, SourceMarker},
    any::{cast_view, self_view, Instance, Views},
    errors::{InstantiateErrorKind, ReflectionErrorKind, ResolveErrorKind},
    instantiator::{boxed_factory, Arguments, BoxedFactory, Construct},
    reflection::Introspect,
};

/// Where a type definition lives and how its change marker is observed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Source {
    /// No stable definition, so analyses are never cached
    #[default]
    Dynamic,
    /// Fixed location and version, e.g. a crate path and a build number.
    /// Version `0` means "unknown" and disables caching.
    Versioned { location: String, version: u64 },
    /// File whose modification time (in seconds) is the version.
    /// The time is read on every analysis, an unreadable file disables caching.
    File(PathBuf),
}

impl Source {
    #[inline]
    #[must_use]
    pub fn versioned(location: impl Into<String>, version: u64) -> Self {
        Self::Versioned {
            location: location.into(),
            version,
        }
    }

    #[inline]
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    #[must_use]
    pub(crate) fn observe(&self) -> Option<SourceMarker> {
        match self {
            Self::Dynamic => None,
            Self::Versioned { location, version } => (*version > 0).then(|| SourceMarker {
                location: location.clone(),
                version: *version,
            }),
            Self::File(path) => {
                let modified = match fs::metadata(path).and_then(|metadata| metadata.modified()) {
                    Ok(modified) => modified,
                    Err(err) => {
                        debug!(path = %path.display(), "Modification time unavailable: {err}");
                        return None;
                    }
                };
                let version = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
                (version > 0).then(|| SourceMarker {
                    location: path.display().to_string(),
                    version,
                })
            }
        }
    }
}

/// Constructor parameter declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    declared_type: Option<String>,
    builtin_type: Option<String>,
}

impl Param {
    /// Parameter autowired with the type registered (or bound) under `type_name`
    #[inline]
    #[must_use]
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: Some(type_name.into()),
            builtin_type: None,
        }
    }

    /// Parameter without a named dependency type, e.g. a primitive.
    /// Resolving a constructor with such a parameter fails.
    #[inline]
    #[must_use]
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            builtin_type: None,
        }
    }

    /// Parameter of a builtin type like `u32` or `&str`.
    /// The type is kept for debugging only, the parameter is untyped for autowiring.
    #[inline]
    #[must_use]
    pub fn builtin(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            builtin_type: Some(type_name.into()),
        }
    }
}

#[derive(Clone, Default)]
struct ConstructorDef {
    params: Vec<Param>,
    private: bool,
}

#[derive(Clone)]
struct FactoryDef {
    factory: BoxedFactory,
    type_name: &'static str,
}

/// Description of one type: its constructor, how to build it and which views of it dependents may ask for.
#[derive(Clone)]
pub struct TypeDef {
    name: String,
    instantiable: bool,
    constructor: Option<ConstructorDef>,
    factory: Option<FactoryDef>,
    views: Views,
    source: Source,
}

impl TypeDef {
    /// Interface: never instantiable, only usable through a binding
    #[inline]
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instantiable: false,
            constructor: None,
            factory: None,
            views: Views::new(),
            source: Source::Dynamic,
        }
    }

    /// Abstract type: not instantiable, may still declare constructor parameters with [`Self::with_params`]
    #[inline]
    #[must_use]
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self::interface(name)
    }

    /// Instantiable type without a constructor, built by a factory taking no arguments
    #[must_use]
    pub fn new<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        Self::instantiable::<T>(name, None, boxed_factory(move |_: &mut Arguments| factory()))
    }

    /// Instantiable type whose constructor takes `params`.
    /// The factory receives the resolved dependencies in the same order.
    #[must_use]
    pub fn with_constructor<T, F>(name: impl Into<String>, params: impl IntoIterator<Item = Param>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Arguments) -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        let constructor = ConstructorDef {
            params: params.into_iter().collect(),
            private: false,
        };
        Self::instantiable::<T>(name, Some(constructor), boxed_factory(factory))
    }

    #[must_use]
    fn instantiable<T: Send + Sync + 'static>(
        name: impl Into<String>,
        constructor: Option<ConstructorDef>,
        factory: BoxedFactory,
    ) -> Self {
        let mut views = Views::new();
        views.insert(TypeId::of::<T>(), self_view::<T>());

        Self {
            name: name.into(),
            instantiable: true,
            constructor,
            factory: Some(FactoryDef {
                factory,
                type_name: type_name::<T>(),
            }),
            views,
            source: Source::Dynamic,
        }
    }

    /// Declares constructor parameters, keeping the constructor visibility
    #[must_use]
    pub fn with_params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.constructor.get_or_insert_with(ConstructorDef::default).params = params.into_iter().collect();
        self
    }

    /// Marks the constructor as not callable from outside the type
    #[inline]
    #[must_use]
    pub fn private(mut self) -> Self {
        self.constructor.get_or_insert_with(ConstructorDef::default).private = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Lets dependents receive the instance as `Arc<U>`, usually a trait object of an interface it implements.
    ///
    /// # Example
    /// ```
    /// use autowire::{InstantiateErrorKind, TypeDef};
    /// use std::sync::Arc;
    ///
    /// trait Logger: Send + Sync {}
    /// struct StdoutLogger;
    /// impl Logger for StdoutLogger {}
    ///
    /// let def = TypeDef::new("StdoutLogger", || Ok::<_, InstantiateErrorKind>(StdoutLogger))
    ///     .exposes(|logger: Arc<StdoutLogger>| logger as Arc<dyn Logger>);
    /// # let _ = def;
    /// ```
    #[must_use]
    pub fn exposes<T, U, F>(mut self, cast: F) -> Self
    where
        T: Send + Sync + 'static,
        U: ?Sized + 'static,
        F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        self.views.insert(TypeId::of::<U>(), cast_view(cast));
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    fn analysis(&self) -> ConstructorAnalysis {
        let Some(constructor) = &self.constructor else {
            return ConstructorAnalysis {
                has_constructor: false,
                is_instantiable: self.instantiable,
                constructor_is_private: false,
                parameters: Vec::new(),
            };
        };

        ConstructorAnalysis {
            has_constructor: true,
            is_instantiable: self.instantiable,
            constructor_is_private: constructor.private,
            parameters: constructor
                .params
                .iter()
                .map(|Param { name, declared_type, .. }| {
                    ParameterSpec::new(name.clone(), declared_type.clone().unwrap_or_default())
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
struct Entry {
    def: TypeDef,
    views: Arc<Views>,
}

/// Types known by name, populated once at startup.
/// Registering a name again replaces the previous definition.
#[derive(Default, Clone)]
pub struct TypeRegistry {
    entries: BTreeMap<String, Entry>,
}

impl TypeRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn register(mut self, def: TypeDef) -> Self {
        self.add(def);
        self
    }

    /// Returns `true` if a definition with the same name was replaced
    pub fn add(&mut self, def: TypeDef) -> bool {
        let views = Arc::new(def.views.clone());
        self.entries.insert(def.name.clone(), Entry { def, views }).is_some()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

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

    fn entry(&self, type_name: &str) -> Result<&Entry, ReflectionErrorKind> {
        self.entries.get(type_name).ok_or_else(|| ReflectionErrorKind::UnknownType {
            type_name: type_name.to_string(),
        })
    }
}

impl Introspect for TypeRegistry {
    fn source_marker(&self, type_name: &str) -> Result<Option<SourceMarker>, ReflectionErrorKind> {
        self.entry(type_name).map(|entry| entry.def.source.observe())
    }

    fn introspect(&self, type_name: &str) -> Result<ConstructorAnalysis, ReflectionErrorKind> {
        self.entry(type_name).map(|entry| entry.def.analysis())
    }
}

impl Construct for TypeRegistry {
    fn construct(&self, type_name: &str, arguments: Vec<Instance>) -> Result<Instance, ResolveErrorKind> {
        let Entry { def, views } = self.entry(type_name)?;
        let Some(FactoryDef {
            factory,
            type_name: concrete_type_name,
        }) = &def.factory
        else {
            return Err(ResolveErrorKind::NotInstantiable {
                type_name: type_name.to_string(),
            });
        };

        let mut arguments = Arguments::new(arguments);
        match factory(&mut arguments) {
            Ok(value) => Ok(Instance::new(value, *concrete_type_name, views.clone())),
            Err(source) => Err(ResolveErrorKind::Instantiate {
                type_name: type_name.to_string(),
                source,
            }),
        }
    }
}
