use alloc::{boxed::Box, collections::BTreeMap, sync::Arc};
use core::{
    any::{Any, TypeId},
    fmt::{self, Debug, Formatter},
};

pub(crate) type RcAny = Arc<dyn Any + Send + Sync>;

/// Casts the erased value to a boxed `Arc<T>` for one `T` (the concrete type or a trait object it implements).
pub(crate) type BoxedView = Arc<dyn Fn(&RcAny) -> Option<Box<dyn Any>> + Send + Sync>;

pub(crate) type Views = BTreeMap<TypeId, BoxedView>;

#[must_use]
pub(crate) fn self_view<T: Send + Sync + 'static>() -> BoxedView {
    Arc::new(|value: &RcAny| {
        value
            .clone()
            .downcast::<T>()
            .ok()
            .map(|value| Box::new(value) as Box<dyn Any>)
    })
}

#[must_use]
pub(crate) fn cast_view<T, U, F>(cast: F) -> BoxedView
where
    T: Send + Sync + 'static,
    U: ?Sized + 'static,
    F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
{
    Arc::new(move |value: &RcAny| {
        value
            .clone()
            .downcast::<T>()
            .ok()
            .map(|value| Box::new(cast(value)) as Box<dyn Any>)
    })
}

/// Shared, type-erased handle to a constructed object.
///
/// Cloning is cheap and keeps identity: every clone points to the same object.
#[derive(Clone)]
pub struct Instance {
    value: RcAny,
    type_name: &'static str,
    views: Arc<Views>,
}

impl Instance {
    #[inline]
    #[must_use]
    pub(crate) fn new(value: RcAny, type_name: &'static str, views: Arc<Views>) -> Self {
        Self { value, type_name, views }
    }

    /// Returns the object as `Arc<T>`, where `T` is either its concrete type
    /// or a trait object registered with [`crate::TypeDef::exposes`].
    #[must_use]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        let view = self.views.get(&TypeId::of::<T>())?;
        view(&self.value)?.downcast::<Arc<T>>().ok().map(|value| *value)
    }

    /// Rust name of the concrete type behind this handle
    #[inline]
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.value).cast::<()>() == Arc::as_ptr(&other.value).cast::<()>()
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("address", &Arc::as_ptr(&self.value).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{cast_view, self_view, Instance, RcAny, Views};

    use alloc::sync::Arc;
    use core::any::{type_name, TypeId};

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "Hello"
        }
    }

    fn english() -> Instance {
        let mut views = Views::new();
        views.insert(TypeId::of::<English>(), self_view::<English>());
        views.insert(
            TypeId::of::<dyn Greeter>(),
            cast_view(|value: Arc<English>| value as Arc<dyn Greeter>),
        );

        Instance::new(Arc::new(English) as RcAny, type_name::<English>(), Arc::new(views))
    }

    #[test]
    fn test_downcast_concrete_and_view() {
        let instance = english();

        assert!(instance.downcast::<English>().is_some());
        assert_eq!(instance.downcast::<dyn Greeter>().unwrap().greet(), "Hello");
        assert!(instance.downcast::<u8>().is_none());
    }

    #[test]
    fn test_views_share_object() {
        let instance = english();

        let concrete = instance.downcast::<English>().unwrap();
        let greeter = instance.downcast::<dyn Greeter>().unwrap();

        assert_eq!(Arc::as_ptr(&concrete).cast::<()>(), Arc::as_ptr(&greeter).cast::<()>());
    }

    #[test]
    fn test_ptr_eq() {
        let instance = english();

        assert!(instance.ptr_eq(&instance.clone()));
        assert!(!instance.ptr_eq(&english()));
    }
}
