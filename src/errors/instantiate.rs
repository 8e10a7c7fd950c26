use alloc::string::String;

#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("Incorrect argument type. Expected: {expected}, actual: {actual}")]
    IncorrectType { expected: &'static str, actual: String },
    #[error("Argument at position {position} not provided to factory")]
    MissingArgument { position: usize },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
