//! Error types for tether_core

use thiserror::Error;

/// Name used in diagnostics for properties constructed without a name
pub(crate) const UNNAMED: &str = "<unnamed>";

/// Errors raised by properties and view models
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TetherError {
    /// A notifying operation was invoked on a property that has no view model
    #[error("property `{name}` of type `{type_name}` is not bound to a view model")]
    PropertyNotBound {
        name: String,
        type_name: &'static str,
    },

    /// A property was bound a second time
    #[error("property `{name}` is already bound to a view model")]
    PropertyAlreadyBound { name: String },

    /// A batch write targeted a property owned by another view model
    #[error("property `{name}` is bound to a different view model")]
    ForeignProperty { name: String },

    /// A view model was attached to a second owner
    #[error("view model `{view_model}` is attached to `{owner}`, not `{requested}`")]
    ViewModelAlreadyAttached {
        view_model: String,
        owner: String,
        requested: String,
    },

    /// Arithmetic on a nullable property whose value is absent
    #[error("property `{name}` has no value, cannot {operation}")]
    NullValue {
        name: String,
        operation: &'static str,
    },

    /// Integer division or modulo by zero
    #[error("integer division by zero on property `{name}`")]
    DivisionByZero { name: String },

    /// Index outside the bounds of a list or string
    #[error("index {index} out of range for length {len} on property `{name}`")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    /// Map update of an absent key without a fallback
    #[error("key {key} not present in property `{name}`")]
    MissingKey { name: String, key: String },

    /// No list element satisfied a predicate
    #[error("no element of property `{name}` matches the predicate")]
    NoMatchingElement { name: String },

    /// The view model has been disposed
    #[error("view model `{view_model}` has been disposed")]
    Disposed { view_model: String },
}

/// Result type for tether_core operations
pub type Result<T> = std::result::Result<T, TetherError>;
