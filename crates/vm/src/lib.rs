//! # Ember Virtual Machine
//!
//! A sandboxed, charge-metered bytecode virtual machine for the Ember
//! scripting language.
//!
//! The VM executes [`Executable`]s produced by the external compiler: a
//! stack-based interpreter with a registered type system, polymorphic
//! opcode dispatch over primitive and object operands, per-instruction
//! charge accounting, call frames with user-defined free, member, and
//! constructor functions, deterministic scoped destruction of live objects,
//! for-range iteration, parameter marshalling across the host/guest
//! boundary, and object serialization into a portable tagged byte stream.
//!
//! ## Architecture
//!
//! - **`Vm`**: the fetch/decode/dispatch loop with its operand, frame,
//!   for-range, and live-object stacks
//! - **`Module`**: registered types and host functions a VM is built from
//! - **`OpcodeTable`**: indexed dispatch — fixed built-ins plus one opcode
//!   per registered host function
//! - **`Object`**: the contract every host object type implements
//!   (operators, indexing, serialization, charge estimators)
//! - **`Executable` / `ExecutableBuilder`**: the immutable compiled unit and
//!   its programmatic assembly
//! - **`ChargeMeter`**: static per-opcode charges plus dynamic estimator
//!   charges, with limit enforcement
//! - **`IoObserver`**: the persistent key/value seam the state library uses
//!
//! ## Example
//!
//! ```rust
//! use ember_vm::{
//!     opcodes, type_ids, ExecutableBuilder, FunctionBuilder, Instruction, Module,
//!     ParameterPack, Primitive, Variant, Vm,
//! };
//! use std::rc::Rc;
//!
//! // function main() : Int32  return 1;  endfunction
//! let mut builder = ExecutableBuilder::new("demo");
//! let one = builder.add_constant(Variant::primitive(Primitive::from_i32(1), type_ids::INT32));
//! builder.add_function(
//!     FunctionBuilder::new("main", type_ids::INT32)
//!         .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(one))
//!         .emit(Instruction::new(opcodes::RETURN_VALUE))
//!         .build(),
//! );
//! let executable = Rc::new(builder.build());
//!
//! let module = Module::with_defaults();
//! let mut vm = Vm::new(&module);
//! let output = vm.execute(&executable, "main", ParameterPack::new()).unwrap();
//! assert_eq!(output.primitive_value().as_i32(), 1);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// Programmatic executable assembly
pub mod builder;
/// Charge accounting and limits
pub mod charge;
/// VM error types and result handling
pub mod error;
/// The compiled program model
pub mod executable;
/// Binary fixed-point scalars
pub mod fixed;
/// Built-in opcode handlers
pub mod handlers;
/// The persistent key/value observer contract
pub mod io_observer;
/// Host module: type and function registration
pub mod module;
/// The object contract
pub mod object;
/// The built-in object library
pub mod objects;
/// The opcode dispatch table
pub mod opcode_table;
/// Built-in opcode numbers
pub mod opcodes;
/// Parameter marshalling across the host/guest boundary
pub mod param;
/// The primitive machine word
pub mod primitive;
/// Variant ↔ tagged-stream conversion
pub mod serialize;
/// Type ids, type info, and the registered-type table
pub mod types;
/// The tagged stack value
pub mod variant;
/// The interpreter core
pub mod vm;

pub use builder::{ExecutableBuilder, FunctionBuilder};
pub use charge::{ChargeAmount, ChargeMeter};
pub use error::{VmError, VmResult};
pub use executable::{
    Contract, Executable, Function, FunctionKind, Instruction, LargeConstant, UserDefinedType,
    Variable,
};
pub use fixed::{Fx128, Fx32, Fx64};
pub use io_observer::{IoObserver, IoStatus};
pub use module::{HostFunction, Module};
pub use object::{new_object, with_object, with_object_mut, Object, ObjectRc};
pub use opcode_table::{OpcodeHandler, OpcodeInfo, OpcodeTable};
pub use param::{FromVariant, IntoVariant, ParameterPack};
pub use primitive::Primitive;
pub use types::{type_ids, TypeId, TypeInfo, TypeKind, TypeRegistry};
pub use variant::Variant;
pub use vm::{ContractInvocationHandler, OutputDevice, Vm, STDOUT};
