//! # Ember Execution Engine
//!
//! The façade over the Ember VM: it owns named compiled executables and
//! named persistent state containers (key→bytes maps with deep copy), and
//! runs any (executable, entrypoint, state, parameters) tuple with stateful
//! isolation between runs. Every operation returns one uniform
//! [`ExecutionResult`] carrying the output value, a stage/code/message
//! status, the run's captured stdout, and the final charge total.
//!
//! A fresh VM is constructed per run, so nothing leaks between runs through
//! the operand stack or frame state. The engine is not internally
//! concurrent; callers may shard by name and hold one engine per shard.

#![warn(rustdoc::missing_crate_level_docs)]

/// The seam to the external compiler
pub mod compiler;
/// The execution engine façade
pub mod engine;
/// Result types shared by every engine operation
pub mod result;
/// The engine-owned persistent state container
pub mod state;

pub use compiler::{Compiler, SourceFile};
pub use engine::{ExecutionEngine, Params};
pub use result::{Code, ExecutionError, ExecutionResult, Stage, Value};
pub use state::MemoryState;
