//! Programmatic executable assembly.
//!
//! The code generator that normally produces an [`Executable`] is an
//! external collaborator; this builder is the in-process way to construct
//! one, used by embedders and throughout the test suites.

use crate::executable::{
    Contract, Executable, Function, FunctionKind, Instruction, LargeConstant, UserDefinedType,
    Variable,
};
use crate::fixed::Fx128;
use crate::types::{type_ids, TypeId, TypeInfo, TypeKind};
use crate::variant::Variant;
use std::rc::Rc;

/// Assembles an [`Executable`] piece by piece.
#[derive(Default)]
pub struct ExecutableBuilder {
    executable: Executable,
}

impl ExecutableBuilder {
    /// Starts a new executable with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            executable: Executable {
                name: name.into(),
                ..Executable::default()
            },
        }
    }

    /// Interns a string constant, returning its pool index.
    pub fn intern_string(&mut self, value: &str) -> u16 {
        if let Some(pos) = self.executable.strings.iter().position(|s| s == value) {
            return pos as u16;
        }
        self.executable.strings.push(value.to_string());
        (self.executable.strings.len() - 1) as u16
    }

    /// Adds a small constant, returning its pool index.
    pub fn add_constant(&mut self, value: Variant) -> u16 {
        self.executable.constants.push(value);
        (self.executable.constants.len() - 1) as u16
    }

    /// Adds a 128-bit fixed-point constant, returning its pool index.
    pub fn add_large_constant(&mut self, value: Fx128) -> u16 {
        self.executable.large_constants.push(LargeConstant {
            type_id: type_ids::FIXED128,
            fp128: value,
        });
        (self.executable.large_constants.len() - 1) as u16
    }

    /// Adds a finished free function, returning its function index.
    pub fn add_function(&mut self, function: Function) -> u16 {
        self.executable.functions.push(Rc::new(function));
        (self.executable.functions.len() - 1) as u16
    }

    /// Adds a user-defined type, returning its index within the executable.
    /// At load time the type is assigned the next free registry id, so the
    /// code generator computes the eventual type id as
    /// `module type count + index`.
    pub fn add_user_defined_type(
        &mut self,
        name: impl Into<String>,
        member_variables: Vec<Variable>,
        functions: Vec<Function>,
    ) -> u16 {
        self.executable.user_defined_types.push(UserDefinedType {
            info: TypeInfo::new(name, TypeKind::UserDefined),
            member_variables,
            functions: functions.into_iter().map(Rc::new).collect(),
        });
        (self.executable.user_defined_types.len() - 1) as u16
    }

    /// Adds an external contract descriptor, returning its contract id.
    pub fn add_contract(&mut self, name: impl Into<String>, functions: Vec<Function>) -> u16 {
        self.executable.contracts.push(Contract {
            name: name.into(),
            functions: functions.into_iter().map(Rc::new).collect(),
        });
        (self.executable.contracts.len() - 1) as u16
    }

    /// Finishes the build.
    pub fn build(self) -> Executable {
        self.executable
    }
}

/// Assembles one [`Function`].
pub struct FunctionBuilder {
    name: String,
    kind: FunctionKind,
    return_type_id: TypeId,
    parameters: Vec<Variable>,
    locals: Vec<Variable>,
    instructions: Vec<Instruction>,
    instruction_lines: Vec<u16>,
    current_line: u16,
}

impl FunctionBuilder {
    /// Starts a free function.
    pub fn new(name: impl Into<String>, return_type_id: TypeId) -> Self {
        Self::with_kind(name, FunctionKind::FreeFunction, return_type_id)
    }

    /// Starts a member function.
    pub fn member(name: impl Into<String>, return_type_id: TypeId) -> Self {
        Self::with_kind(name, FunctionKind::MemberFunction, return_type_id)
    }

    /// Starts a constructor.
    pub fn constructor(name: impl Into<String>) -> Self {
        Self::with_kind(name, FunctionKind::Constructor, type_ids::VOID)
    }

    fn with_kind(name: impl Into<String>, kind: FunctionKind, return_type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            kind,
            return_type_id,
            parameters: Vec::new(),
            locals: Vec::new(),
            instructions: Vec::new(),
            instruction_lines: Vec::new(),
            current_line: 1,
        }
    }

    /// Declares the next parameter.
    pub fn param(mut self, name: impl Into<String>, type_id: TypeId) -> Self {
        self.parameters.push(Variable {
            name: name.into(),
            type_id,
        });
        self
    }

    /// Declares the next local variable slot.
    pub fn local(mut self, name: impl Into<String>, type_id: TypeId) -> Self {
        self.locals.push(Variable {
            name: name.into(),
            type_id,
        });
        self
    }

    /// Sets the source line attributed to subsequently emitted instructions.
    pub fn line(mut self, line: u16) -> Self {
        self.current_line = line;
        self
    }

    /// Emits one instruction.
    pub fn emit(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self.instruction_lines.push(self.current_line);
        self
    }

    /// Finishes the function.
    pub fn build(self) -> Function {
        let num_parameters = self.parameters.len() as u16;
        let mut variables = self.parameters;
        variables.extend(self.locals);
        Function {
            name: self.name,
            kind: self.kind,
            return_type_id: self.return_type_id,
            num_parameters,
            num_variables: variables.len() as u16,
            variables,
            instructions: self.instructions,
            instruction_lines: self.instruction_lines,
        }
    }
}
