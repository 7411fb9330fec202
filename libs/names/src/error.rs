//! Error types for name parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name string is empty.
    #[error("{kind} name cannot be empty")]
    Empty { kind: &'static str },

    /// The name contains whitespace.
    #[error("{kind} name contains whitespace: '{actual}'")]
    Whitespace { kind: &'static str, actual: String },

    /// The name contains a list separator.
    #[error("{kind} name contains a comma: '{actual}'")]
    ListSeparator { kind: &'static str, actual: String },
}

impl NameError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, NameError::Empty { .. })
    }

    /// Returns true if the input looked like an unsplit list.
    pub fn is_list(&self) -> bool {
        matches!(self, NameError::ListSeparator { .. })
    }
}
