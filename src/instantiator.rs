use alloc::{string::ToString as _, sync::Arc, vec, vec::Vec};
use core::any::type_name;

use crate::{
    any::{Instance, RcAny},
    errors::{InstantiateErrorKind, ResolveErrorKind},
};

pub(crate) type BoxedFactory = Arc<dyn Fn(&mut Arguments) -> Result<RcAny, InstantiateErrorKind> + Send + Sync>;

#[must_use]
pub(crate) fn boxed_factory<T, F>(factory: F) -> BoxedFactory
where
    T: Send + Sync + 'static,
    F: Fn(&mut Arguments) -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
{
    Arc::new(move |arguments: &mut Arguments| factory(arguments).map(|value| Arc::new(value) as RcAny))
}

/// Creates instances of registered types from their resolved constructor arguments.
pub trait Construct: Send + Sync {
    /// Calls the factory of `type_name` with `arguments` in constructor declaration order.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Reflection`] if the type is unknown
    /// - Returns [`ResolveErrorKind::NotInstantiable`] if the type has no factory
    /// - Returns [`ResolveErrorKind::Instantiate`] if the factory fails
    fn construct(&self, type_name: &str, arguments: Vec<Instance>) -> Result<Instance, ResolveErrorKind>;
}

/// Resolved constructor dependencies handed to a factory, in declaration order
pub struct Arguments {
    values: vec::IntoIter<Instance>,
    position: usize,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub(crate) fn new(values: Vec<Instance>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Takes the next argument as `Arc<T>`, where `T` is its concrete type or an exposed trait object.
    ///
    /// # Errors
    /// - Returns [`InstantiateErrorKind::MissingArgument`] if all arguments are taken
    /// - Returns [`InstantiateErrorKind::IncorrectType`] if the argument can't be viewed as `T`
    #[allow(clippy::should_implement_trait)]
    pub fn next<T: ?Sized + 'static>(&mut self) -> Result<Arc<T>, InstantiateErrorKind> {
        let instance = self.next_instance()?;
        instance.downcast::<T>().ok_or_else(|| InstantiateErrorKind::IncorrectType {
            expected: type_name::<T>(),
            actual: instance.type_name().to_string(),
        })
    }

    /// # Errors
    /// Returns [`InstantiateErrorKind::MissingArgument`] if all arguments are taken
    pub fn next_instance(&mut self) -> Result<Instance, InstantiateErrorKind> {
        let position = self.position;
        let instance = self.values.next().ok_or(InstantiateErrorKind::MissingArgument { position })?;
        self.position += 1;
        Ok(instance)
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
