use alloc::{boxed::Box, string::String};
use core::fmt::{self, Display, Formatter};

use super::{InstantiateErrorKind, ReflectionErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error(transparent)]
    Reflection(#[from] ReflectionErrorKind),
    #[error("Type is not instantiable: {type_name}")]
    NotInstantiable { type_name: String },
    #[error("Constructor is private: {type_name}")]
    PrivateConstructor { type_name: String },
    #[error("Parameter is not typed: {parameter} (constructor of {type_name})")]
    UntypedParameter { type_name: String, parameter: String },
    #[error("Cyclic dependency detected: {path}")]
    CyclicDependency { path: DependencyPath },
    #[error("Resolution depth {depth} exceeded while resolving {type_name}")]
    DepthExceeded { type_name: String, depth: usize },
    #[error("Instantiation of {type_name} failed: {source}")]
    Instantiate {
        type_name: String,
        #[source]
        source: InstantiateErrorKind,
    },
    #[error("Incorrect instance type for {type_name}. Actual: {actual}, expected: {expected}")]
    IncorrectType {
        type_name: String,
        expected: &'static str,
        actual: String,
    },
}

/// Chain of type names closing a cycle. The first and last entries are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPath(pub Box<[String]>);

impl DependencyPath {
    #[inline]
    #[must_use]
    pub fn types(&self) -> &[String] {
        &self.0
    }
}

impl Display for DependencyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
        }
        for type_name in iter {
            write!(f, " -> {type_name}")?;
        }
        Ok(())
    }
}
