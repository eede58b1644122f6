//! Registry construction errors

/// Errors raised while populating a [`crate::HandlerRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A handler was already registered under this name
    #[error("simulator '{0}' is already registered")]
    DuplicateName(String),

    /// The name cannot be selected from a command line
    #[error("invalid simulator name '{0}': names must be non-empty, contain no whitespace and not start with '-'")]
    InvalidName(String),
}

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
