use alloc::string::String;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReflectionErrorKind {
    #[error("Type `{type_name}` not found in registry")]
    UnknownType { type_name: String },
}
