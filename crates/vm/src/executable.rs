//! The in-memory representation of a compiled program.
//!
//! An [`Executable`] is immutable once built: interned strings, constant
//! pools, functions, executable-local user-defined types, and external
//! contract descriptors. The external compiler produces this structure and
//! the VM consumes it; nothing here is persisted by the core.

use crate::fixed::Fx128;
use crate::types::{TypeId, TypeInfo};
use crate::variant::Variant;
use std::rc::Rc;

/// What calling convention a function uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    FreeFunction,
    MemberFunction,
    Constructor,
}

/// A parameter or local variable declaration.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub type_id: TypeId,
}

/// One decoded instruction.
///
/// `opcode` selects the handler; the remaining fields are handler-specific
/// and carry a branch target, a variable slot, a type id, or opaque data
/// such as a scope number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u16,
    pub type_id: TypeId,
    pub index: u16,
    pub data: u16,
}

impl Instruction {
    /// Creates an instruction with all operand fields zeroed.
    pub fn new(opcode: u16) -> Self {
        Self {
            opcode,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, type_id: TypeId) -> Self {
        self.type_id = type_id;
        self
    }

    pub fn with_index(mut self, index: u16) -> Self {
        self.index = index;
        self
    }

    pub fn with_data(mut self, data: u16) -> Self {
        self.data = data;
        self
    }
}

/// A compiled function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    pub return_type_id: TypeId,

    /// Leading entries of `variables`
    pub num_parameters: u16,

    /// Parameters plus locals; the function's stack window size
    pub num_variables: u16,

    pub variables: Vec<Variable>,
    pub instructions: Vec<Instruction>,

    /// Source line per instruction, parallel to `instructions`
    pub instruction_lines: Vec<u16>,
}

impl Function {
    /// Returns the source line for an instruction index, for diagnostics.
    pub fn find_line_number(&self, pc: u16) -> u16 {
        self.instruction_lines
            .get(usize::from(pc))
            .copied()
            .unwrap_or(0)
    }

    /// Number of locals beyond the parameters.
    pub fn num_locals(&self) -> u16 {
        self.num_variables - self.num_parameters
    }
}

/// A class defined by the executable: member variables plus the functions
/// (constructors and member functions) operating on them.
#[derive(Debug, Clone)]
pub struct UserDefinedType {
    pub info: TypeInfo,
    pub member_variables: Vec<Variable>,
    pub functions: Vec<Rc<Function>>,
}

/// An external contract descriptor for cross-contract calls. The functions
/// carry signatures only; their instruction streams are empty.
#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    pub functions: Vec<Rc<Function>>,
}

/// A constant too wide for the primitive constant pool.
#[derive(Debug, Clone, Copy)]
pub struct LargeConstant {
    pub type_id: TypeId,
    pub fp128: Fx128,
}

/// An immutable compiled unit.
#[derive(Clone, Default)]
pub struct Executable {
    pub name: String,
    pub strings: Vec<String>,
    pub constants: Vec<Variant>,
    pub large_constants: Vec<LargeConstant>,
    pub functions: Vec<Rc<Function>>,
    pub user_defined_types: Vec<UserDefinedType>,
    pub contracts: Vec<Contract>,
}

impl Executable {
    /// Looks up a free function by name.
    pub fn find_function(&self, name: &str) -> Option<&Rc<Function>> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl std::fmt::Debug for Executable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executable")
            .field("name", &self.name)
            .field("strings", &self.strings.len())
            .field("constants", &self.constants.len())
            .field("functions", &self.functions.len())
            .field("user_defined_types", &self.user_defined_types.len())
            .field("contracts", &self.contracts.len())
            .finish()
    }
}
