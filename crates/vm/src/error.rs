//! Error types for the Ember VM crate.
//!
//! Every failure mode the interpreter can surface is a variant here. Handlers
//! return [`VmResult`]; the main loop converts an error into a single
//! `runtime error: line N: <message>` diagnostic using the current function's
//! line map and halts the machine.

use crate::types::TypeId;
use thiserror::Error;

/// VM execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// An instruction referenced an opcode with no registered handler
    #[error("unknown opcode {opcode:#06x}")]
    UnknownOpcode { opcode: u16 },

    /// The operand stack exceeded its fixed depth
    #[error("stack overflow")]
    StackOverflow,

    /// The call-frame stack exceeded its fixed depth
    #[error("frame stack overflow")]
    FrameStackOverflow,

    /// The for-range stack exceeded its fixed depth
    #[error("for stack overflow")]
    ForStackOverflow,

    /// Integer or fixed-point division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,

    /// An object operand was null where a value was required
    #[error("null reference")]
    NullReference,

    /// A container index was outside the valid range
    #[error("index {index} out of bounds: length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// A container index was negative
    #[error("negative index")]
    NegativeIndex,

    /// Metered execution crossed the configured charge limit
    #[error("Charge limit reached")]
    ChargeLimitReached,

    /// The parameter pack did not match the entrypoint's arity
    #[error("mismatched parameters: expected {expected} arguments, but got {actual}")]
    MismatchedParameters { expected: usize, actual: usize },

    /// A marshalled parameter had the wrong type
    #[error("mismatched parameters: expected argument {index} to be of type {expected} but got {actual}")]
    ParameterTypeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    /// A value had the wrong type for an operation
    #[error("type mismatch: expected {expected} but got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// An object type did not implement a contract hook the program used
    #[error("{operation}: operator not implemented")]
    OperatorNotImplemented { operation: &'static str },

    /// An object's serializer or deserializer reported failure
    #[error("serialization failed: {message}")]
    SerializationFailed { message: String },

    /// A type id had no registered construction path
    #[error("object of type {type_id} is not default constructible")]
    NotConstructible { type_id: TypeId },

    /// The requested function does not exist in the loaded executable
    #[error("unable to find function '{name}'")]
    FunctionNotFound { name: String },

    /// A host library explicitly raised an error
    #[error("{message}")]
    Runtime { message: String },
}

impl VmError {
    /// Creates a runtime error with the given message, the hook host
    /// libraries use for `panic`/`assert` intrinsics.
    pub fn runtime(message: impl Into<String>) -> Self {
        VmError::Runtime {
            message: message.into(),
        }
    }

    /// Creates an operator-not-implemented error for the named hook.
    pub fn operator_not_implemented(operation: &'static str) -> Self {
        VmError::OperatorNotImplemented { operation }
    }

    /// Creates a serialization failure with the given message.
    pub fn serialization(message: impl Into<String>) -> Self {
        VmError::SerializationFailed {
            message: message.into(),
        }
    }
}

impl From<ember_io::IoError> for VmError {
    fn from(err: ember_io::IoError) -> Self {
        VmError::SerializationFailed {
            message: err.to_string(),
        }
    }
}

/// Result type for VM operations.
pub type VmResult<T> = Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_the_diagnostic_format() {
        assert_eq!(VmError::DivisionByZero.to_string(), "division by zero");
        assert_eq!(VmError::NullReference.to_string(), "null reference");
        assert_eq!(
            VmError::ChargeLimitReached.to_string(),
            "Charge limit reached"
        );
        assert_eq!(
            VmError::operator_not_implemented("add").to_string(),
            "add: operator not implemented"
        );
    }
}
