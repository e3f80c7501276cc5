//! The interpreter core.
//!
//! A [`Vm`] is parameterised by a [`Module`] (registered types plus host
//! functions), binds at most one executable at a time, and runs one
//! entrypoint to completion per [`Vm::execute`] call. Execution is
//! single-threaded and cooperative: a run either completes, fails with a
//! runtime error, or crosses the charge limit. There is no suspension and no
//! re-entry into a running VM.

use crate::charge::{ChargeAmount, ChargeMeter};
use crate::error::{VmError, VmResult};
use crate::executable::{Contract, Executable, Function, Instruction, UserDefinedType};
use crate::io_observer::IoObserver;
use crate::module::Module;
use crate::object::{new_object, ObjectRc};
use crate::objects::string::Str;
use crate::opcode_table::OpcodeTable;
use crate::param::ParameterPack;
use crate::primitive::Primitive;
use crate::types::{TypeId, TypeRegistry};
use crate::variant::Variant;
use hashbrown::HashMap;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Conventional name of the standard output device.
pub const STDOUT: &str = "stdout";

pub(crate) const FRAME_STACK_SIZE: usize = 50;
pub(crate) const STACK_SIZE: usize = 1024;
pub(crate) const MAX_RANGE_LOOPS: usize = 16;

/// A named writer the VM can print to.
pub type OutputDevice = Rc<RefCell<dyn Write>>;

/// Synchronous host callback for cross-contract calls. Receives the contract
/// identity, descriptor, target function, and marshalled parameters; a
/// returned error string becomes a runtime error in the calling program.
pub type ContractInvocationHandler =
    Rc<dyn Fn(&str, &Contract, &Function, Vec<Variant>) -> Result<Variant, String>>;

/// A call activation record.
pub(crate) struct Frame {
    pub function: Rc<Function>,
    pub bsp: usize,
    pub pc: u16,
    pub self_value: Variant,
}

/// One active for-range loop.
#[derive(Clone, Copy, Default)]
pub(crate) struct ForRangeLoop {
    pub variable_index: u16,
    pub current: Primitive,
    pub target: Primitive,
    pub delta: Primitive,
}

/// An object awaiting deterministic destruction at scope or function exit.
pub(crate) struct LiveObjectInfo {
    pub frame_sp: i32,
    pub variable_index: u16,
    pub scope_number: u16,
}

/// The virtual machine.
pub struct Vm {
    pub(crate) registry: TypeRegistry,
    pub(crate) opcode_table: OpcodeTable,

    pub(crate) executable: Option<Rc<Executable>>,
    pub(crate) function: Option<Rc<Function>>,
    pub(crate) strings: Vec<ObjectRc>,
    local_type_base: usize,
    local_type_count: usize,

    pub(crate) stack: Vec<Variant>,
    pub(crate) sp: isize,
    pub(crate) bsp: usize,
    pub(crate) frames: Vec<Frame>,
    pub(crate) range_loops: Vec<ForRangeLoop>,
    pub(crate) live_objects: Vec<LiveObjectInfo>,

    pub(crate) pc: u16,
    pub(crate) instruction_pc: u16,
    pub(crate) instruction: Instruction,
    pub(crate) stop: bool,
    pub(crate) self_value: Variant,

    meter: ChargeMeter,
    io_observer: Option<Rc<RefCell<dyn IoObserver>>>,
    output_devices: HashMap<String, OutputDevice>,
    pub(crate) contract_handler: Option<ContractInvocationHandler>,
}

impl Vm {
    /// Creates a VM from a module's registered types and host functions.
    pub fn new(module: &Module) -> Self {
        let mut opcode_table = OpcodeTable::new();
        crate::handlers::register_builtins(&mut opcode_table);
        for host_function in module.host_functions() {
            opcode_table.register_function(
                host_function.unique_name.clone(),
                host_function.handler.clone(),
                host_function.static_charge,
            );
        }

        Self {
            registry: module.registry().clone(),
            opcode_table,
            executable: None,
            function: None,
            strings: Vec::new(),
            local_type_base: 0,
            local_type_count: 0,
            stack: std::iter::repeat_with(Variant::unknown)
                .take(STACK_SIZE)
                .collect(),
            sp: -1,
            bsp: 0,
            frames: Vec::with_capacity(FRAME_STACK_SIZE),
            range_loops: Vec::with_capacity(MAX_RANGE_LOOPS),
            live_objects: Vec::with_capacity(100),
            pc: 0,
            instruction_pc: 0,
            instruction: Instruction::default(),
            stop: false,
            self_value: Variant::unknown(),
            meter: ChargeMeter::new(),
            io_observer: None,
            output_devices: HashMap::new(),
            contract_handler: None,
        }
    }

    /// The registered types visible to this VM.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Printable name of a type id.
    pub fn type_name(&self, type_id: TypeId) -> String {
        self.registry.type_name(type_id)
    }

    // ---- charges ----

    /// Charge accumulated so far, reported after every run.
    pub fn charge_total(&self) -> ChargeAmount {
        self.meter.total()
    }

    /// The configured charge limit.
    pub fn charge_limit(&self) -> ChargeAmount {
        self.meter.limit()
    }

    /// Bounds execution; zero disables enforcement.
    pub fn set_charge_limit(&mut self, limit: ChargeAmount) {
        self.meter.set_limit(limit);
    }

    /// Adds a dynamic charge (an estimator result) and fails when the limit
    /// is crossed.
    pub fn apply_charge(&mut self, amount: ChargeAmount) -> VmResult<()> {
        debug_assert!(amount >= 1, "estimators must not return a charge of zero");
        self.meter.charge(amount)
    }

    /// Re-prices opcodes by unique name.
    pub fn update_charges(&mut self, charges: &HashMap<String, ChargeAmount>) {
        self.opcode_table.update_charges(charges);
    }

    /// Looks up the opcode assigned to a host function's unique name.
    pub fn find_opcode(&self, unique_name: &str) -> Option<u16> {
        self.opcode_table.find_opcode(unique_name)
    }

    // ---- host bindings ----

    /// Binds the persistent storage observer for subsequent runs.
    pub fn set_io_observer(&mut self, observer: Rc<RefCell<dyn IoObserver>>) {
        self.io_observer = Some(observer);
    }

    /// Removes the storage observer.
    pub fn clear_io_observer(&mut self) {
        self.io_observer = None;
    }

    /// The bound storage observer, if any.
    pub fn io_observer(&self) -> Option<Rc<RefCell<dyn IoObserver>>> {
        self.io_observer.clone()
    }

    /// Attaches a named output device. Attaching over an existing name is a
    /// programmer error.
    pub fn attach_output_device(&mut self, name: impl Into<String>, device: OutputDevice) {
        let name = name.into();
        let previous = self.output_devices.insert(name.clone(), device);
        assert!(previous.is_none(), "output device {name} already exists");
    }

    /// Detaches a named output device.
    pub fn detach_output_device(&mut self, name: &str) {
        let removed = self.output_devices.remove(name);
        assert!(removed.is_some(), "output device {name} does not exist");
    }

    /// Returns a named output device or a runtime error.
    pub fn output_device(&self, name: &str) -> VmResult<OutputDevice> {
        self.output_devices
            .get(name)
            .cloned()
            .ok_or_else(|| VmError::runtime(format!("output device {name} does not exist")))
    }

    /// Installs the host callback used by `InvokeContractFunction`.
    pub fn set_contract_invocation_handler(&mut self, handler: ContractInvocationHandler) {
        self.contract_handler = Some(handler);
    }

    // ---- executable lifecycle ----

    /// Attaches an executable: interns its strings as live string objects
    /// and appends its user-defined types to the live type table. At most
    /// one executable may be loaded; loading over one is a programmer error.
    pub fn load_executable(&mut self, executable: &Rc<Executable>) {
        assert!(
            self.executable.is_none(),
            "executable already loaded; unload first"
        );
        log::debug!("loading executable '{}'", executable.name);

        self.strings = executable
            .strings
            .iter()
            .map(|s| new_object(Str::new(s.clone())))
            .collect();

        self.local_type_base = self.registry.type_count();
        for user_type in &executable.user_defined_types {
            self.registry.append_local_type(user_type.info.clone());
        }
        self.local_type_count = executable.user_defined_types.len();
        self.executable = Some(Rc::clone(executable));
    }

    /// Detaches the loaded executable, reversing [`Vm::load_executable`].
    pub fn unload_executable(&mut self) {
        self.strings.clear();
        self.registry.truncate_local_types(self.local_type_count);
        self.local_type_count = 0;
        self.executable = None;
        self.function = None;
    }

    /// The user-defined type table entry behind an executable-local type id.
    pub(crate) fn user_defined_type(&self, type_id: TypeId) -> VmResult<&UserDefinedType> {
        let executable = self
            .executable
            .as_ref()
            .ok_or_else(|| VmError::runtime("no executable loaded"))?;
        usize::from(type_id)
            .checked_sub(self.local_type_base)
            .and_then(|index| executable.user_defined_types.get(index))
            .ok_or(VmError::NotConstructible { type_id })
    }

    // ---- execution ----

    /// Runs `entrypoint` with the given parameters against the loaded-or-
    /// provided executable. Parameters are verified against the function
    /// signature before any bytecode runs. On failure every stack slot and
    /// saved frame is reset and a single `runtime error: line N: <message>`
    /// diagnostic is returned.
    pub fn execute(
        &mut self,
        executable: &Rc<Executable>,
        entrypoint: &str,
        parameters: ParameterPack,
    ) -> VmResult<Variant> {
        let function = executable
            .find_function(entrypoint)
            .cloned()
            .ok_or_else(|| VmError::FunctionNotFound {
                name: entrypoint.to_string(),
            })?;

        let num_parameters = usize::from(function.num_parameters);
        if parameters.len() != num_parameters {
            return Err(VmError::MismatchedParameters {
                expected: num_parameters,
                actual: parameters.len(),
            });
        }

        let values = parameters.into_values();
        for (i, value) in values.iter().enumerate() {
            let expected = function.variables[i].type_id;
            if value.type_id != expected {
                for slot in &mut self.stack[..i] {
                    slot.reset();
                }
                return Err(VmError::ParameterTypeMismatch {
                    index: i,
                    expected: self.type_name(expected),
                    actual: self.type_name(value.type_id),
                });
            }
        }
        for (i, value) in values.into_iter().enumerate() {
            self.stack[i].assign(value);
        }

        self.load_executable(executable);
        self.function = Some(function);
        let outcome = self.run();
        self.unload_executable();
        outcome
    }

    fn run(&mut self) -> VmResult<Variant> {
        let function = self.function.clone().expect("entry function set");

        self.frames.clear();
        self.range_loops.clear();
        self.live_objects.clear();
        self.bsp = 0;
        self.sp = function.num_variables as isize - 1;
        self.pc = 0;
        self.instruction_pc = 0;
        self.stop = false;
        self.self_value.reset();

        let result = if self.sp >= STACK_SIZE as isize {
            Err(VmError::StackOverflow)
        } else {
            self.dispatch_loop()
        };

        match result {
            Ok(()) => {
                if self.sp == 0 {
                    // The function returned a value; transfer it out.
                    let output = self.stack[0].take();
                    self.sp = -1;
                    Ok(output)
                } else {
                    Ok(Variant::unknown())
                }
            }
            Err(error) => {
                let line = self
                    .function
                    .as_ref()
                    .map(|f| f.find_line_number(self.instruction_pc))
                    .unwrap_or(0);

                // Unwind: reset every stack slot and every saved frame.
                for slot in &mut self.stack {
                    slot.reset();
                }
                self.sp = -1;
                for frame in &mut self.frames {
                    frame.self_value.reset();
                }
                self.frames.clear();
                self.range_loops.clear();
                self.live_objects.clear();
                self.self_value.reset();

                Err(VmError::runtime(format!(
                    "runtime error: line {line}: {error}"
                )))
            }
        }
    }

    fn dispatch_loop(&mut self) -> VmResult<()> {
        while !self.stop {
            self.instruction_pc = self.pc;
            let instruction = {
                let function = self.function.as_ref().expect("function set while running");
                *function
                    .instructions
                    .get(usize::from(self.pc))
                    .ok_or_else(|| VmError::runtime("program counter out of range"))?
            };
            self.pc += 1;
            self.instruction = instruction;

            let (handler, static_charge) = match self.opcode_table.get(instruction.opcode) {
                Some(info) => (Rc::clone(&info.handler), info.static_charge),
                None => {
                    return Err(VmError::UnknownOpcode {
                        opcode: instruction.opcode,
                    })
                }
            };

            self.meter.charge(static_charge)?;
            handler(self)?;
        }
        Ok(())
    }

    // ---- operand stack ----

    pub(crate) fn push(&mut self, value: Variant) -> VmResult<()> {
        if self.sp + 1 >= STACK_SIZE as isize {
            return Err(VmError::StackOverflow);
        }
        self.sp += 1;
        self.stack[self.sp as usize] = value;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> VmResult<Variant> {
        if self.sp < 0 {
            return Err(VmError::runtime("stack underflow"));
        }
        let value = self.stack[self.sp as usize].take();
        self.sp -= 1;
        Ok(value)
    }

    pub(crate) fn top_mut(&mut self) -> VmResult<&mut Variant> {
        if self.sp < 0 {
            return Err(VmError::runtime("stack underflow"));
        }
        Ok(&mut self.stack[self.sp as usize])
    }

    /// Absolute stack index of a local variable slot in the current frame.
    pub(crate) fn local_index(&self, variable_index: u16) -> usize {
        self.bsp + usize::from(variable_index)
    }

    // ---- frames ----

    pub(crate) fn current_frame_depth(&self) -> i32 {
        self.frames.len() as i32 - 1
    }

    pub(crate) fn push_frame(&mut self) -> VmResult<()> {
        if self.frames.len() >= FRAME_STACK_SIZE {
            return Err(VmError::FrameStackOverflow);
        }
        self.frames.push(Frame {
            function: self.function.clone().expect("function set while running"),
            bsp: self.bsp,
            pc: self.pc,
            self_value: self.self_value.take(),
        });
        Ok(())
    }

    pub(crate) fn pop_frame(&mut self) {
        let frame = self.frames.pop().expect("frame stack not empty");
        self.function = Some(frame.function);
        self.bsp = frame.bsp;
        self.pc = frame.pc;
        self.self_value = frame.self_value;
    }

    // ---- live objects ----

    /// Records a declared object variable for destruction at scope exit.
    /// Later entries always belong to equal-or-deeper scopes within
    /// equal-or-newer frames.
    pub(crate) fn track_live_object(&mut self, variable_index: u16, scope_number: u16) {
        self.live_objects.push(LiveObjectInfo {
            frame_sp: self.current_frame_depth(),
            variable_index,
            scope_number,
        });
    }

    /// Destructs, in LIFO order, every live object of the current frame
    /// whose scope is at or inside `scope_number`.
    pub(crate) fn destruct(&mut self, scope_number: u16) {
        while let Some(info) = self.live_objects.last() {
            if info.frame_sp != self.current_frame_depth() || info.scope_number < scope_number {
                break;
            }
            let index = self.local_index(info.variable_index);
            self.stack[index].reset();
            self.live_objects.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ExecutableBuilder, FunctionBuilder};
    use crate::module::Module;
    use crate::opcodes;
    use crate::types::type_ids;

    #[test]
    fn load_is_exclusive_and_reversible() {
        let module = Module::with_defaults();
        let mut vm = Vm::new(&module);

        let mut builder = ExecutableBuilder::new("empty");
        builder.add_function(
            FunctionBuilder::new("main", type_ids::VOID)
                .emit(Instruction::new(opcodes::RETURN))
                .build(),
        );
        let executable = Rc::new(builder.build());

        let types_before = vm.registry().type_count();
        vm.load_executable(&executable);
        vm.unload_executable();
        assert_eq!(vm.registry().type_count(), types_before);
    }

    #[test]
    fn missing_entrypoint_is_reported() {
        let module = Module::with_defaults();
        let mut vm = Vm::new(&module);
        let executable = Rc::new(ExecutableBuilder::new("empty").build());
        let err = vm
            .execute(&executable, "absent", ParameterPack::new())
            .unwrap_err();
        assert!(matches!(err, VmError::FunctionNotFound { .. }));
    }
}
