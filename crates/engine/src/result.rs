//! Engine result types: the host-side tagged value, the shared
//! stage/code taxonomy, and the uniform result shape every engine
//! operation returns.

use ember_vm::{ChargeAmount, Fx128, Fx32, Fx64};
use std::fmt;

/// A host-side tagged value used for run parameters and outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value (void returns, lifecycle operations)
    Void,
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Fixed32(Fx32),
    Fixed64(Fx64),
    Fixed128(Fx128),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
}

impl Value {
    /// The printable kind of this value, used in type-mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "Void",
            Value::Bool(_) => "Bool",
            Value::Int8(_) => "Int8",
            Value::UInt8(_) => "UInt8",
            Value::Int16(_) => "Int16",
            Value::UInt16(_) => "UInt16",
            Value::Int32(_) => "Int32",
            Value::UInt32(_) => "UInt32",
            Value::Int64(_) => "Int64",
            Value::UInt64(_) => "UInt64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Fixed32(_) => "Fixed32",
            Value::Fixed64(_) => "Fixed64",
            Value::Fixed128(_) => "Fixed128",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_fixed64(&self) -> Option<Fx64> {
        match self {
            Value::Fixed64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

/// Where in the pipeline a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Engine,
    Running,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Compile => "COMPILE",
            Stage::Engine => "ENGINE",
            Stage::Running => "RUNNING",
        })
    }
}

/// The stable result code shared by the engine and the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Success,
    CompilationError,
    RuntimeError,
    SerializationError,
    BadExecutable,
    BadState,
    BadDestination,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Code::Success => "SUCCESS",
            Code::CompilationError => "COMPILATION_ERROR",
            Code::RuntimeError => "RUNTIME_ERROR",
            Code::SerializationError => "SERIALIZATION_ERROR",
            Code::BadExecutable => "BAD_EXECUTABLE",
            Code::BadState => "BAD_STATE",
            Code::BadDestination => "BAD_DESTINATION",
        })
    }
}

/// Status of one engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    pub stage: Stage,
    pub code: Code,
    pub message: String,
}

impl ExecutionError {
    pub fn new(stage: Stage, code: Code, message: impl Into<String>) -> Self {
        Self {
            stage,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.stage, self.code, self.message)
    }
}

/// What an engine operation produced: the output value, a status, the
/// captured stdout of the run, and the final charge total.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: Value,
    pub error: ExecutionError,
    pub console: String,
    pub charge_total: ChargeAmount,
}

impl ExecutionResult {
    /// Builds a result with no output.
    pub fn status(stage: Stage, code: Code, message: impl Into<String>) -> Self {
        Self {
            output: Value::Void,
            error: ExecutionError::new(stage, code, message),
            console: String::new(),
            charge_total: 0,
        }
    }

    /// Returns whether the operation succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.code == Code::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_their_stable_strings() {
        assert_eq!(Code::Success.to_string(), "SUCCESS");
        assert_eq!(Code::BadDestination.to_string(), "BAD_DESTINATION");
        assert_eq!(Stage::Running.to_string(), "RUNNING");
        let error = ExecutionError::new(Stage::Engine, Code::BadState, "no state named x");
        assert_eq!(error.to_string(), "ENGINE/BAD_STATE: no state named x");
    }
}
