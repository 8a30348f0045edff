use cl_config::ConfigurationError;
use thiserror::Error;

// -----------------------------------------------------------------------------
// RuntimeError

fn at_position(position: &Option<usize>) -> String {
    match position {
        Some(position) => format!(" (at byte position: {position})"),
        None => String::new(),
    }
}

/// A failure while creating, accessing, encoding or decoding instances.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}{}", at_position(.position))]
pub struct RuntimeError {
    message: String,
    position: Option<usize>,
}

impl RuntimeError {
    #[cold]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    /// An error raised while decoding, at byte `position` of the input.
    #[cold]
    pub fn at(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    #[cold]
    pub(crate) fn property_not_found(name: &str) -> Self {
        Self::new(format!("Property '{name}' not found on an Entity"))
    }

    #[cold]
    pub(crate) fn type_not_found(name: &str) -> Self {
        Self::new(format!("Type '{name}' not found"))
    }
}

// -----------------------------------------------------------------------------
// InternalError

/// A broken invariant inside the codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Internal error: {0}")]
pub struct InternalError(pub String);

// -----------------------------------------------------------------------------
// ClutchError

#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ClutchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

// -----------------------------------------------------------------------------
// Tests
