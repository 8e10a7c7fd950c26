use crate::{
    analysis::{ConstructorAnalysis, SourceMarker},
    errors::ReflectionErrorKind,
};

/// Describes types by name.
///
/// This is the metadata seam the [`crate::Analyzer`] consumes; [`crate::TypeRegistry`] is the stock implementation.
pub trait Introspect: Send + Sync {
    /// Observes where the type is defined and its current change marker.
    /// `Ok(None)` means the type has no marker, so its analysis must not be cached.
    ///
    /// # Errors
    /// Returns [`ReflectionErrorKind::UnknownType`] if the name doesn't denote a known type
    fn source_marker(&self, type_name: &str) -> Result<Option<SourceMarker>, ReflectionErrorKind>;

    /// Computes the constructor analysis from scratch.
    ///
    /// # Errors
    /// Returns [`ReflectionErrorKind::UnknownType`] if the name doesn't denote a known type
    fn introspect(&self, type_name: &str) -> Result<ConstructorAnalysis, ReflectionErrorKind>;
}
