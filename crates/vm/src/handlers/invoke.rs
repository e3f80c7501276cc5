//! Call handlers: user-defined functions, constructors, member functions,
//! array construction, and cross-contract invocation.
//!
//! Calling convention: parameters are pushed left-to-right before the call
//! opcode (receiver first for member calls). The call opcode saves the
//! current frame, points `bsp` at the first parameter, and extends the
//! stack by the callee's non-parameter locals.

use crate::error::{VmError, VmResult};
use crate::executable::Function;
use crate::object::{new_object, with_object};
use crate::objects::array::Array;
use crate::objects::string::Str;
use crate::objects::user_object::UserObject;
use crate::types::type_ids;
use crate::variant::Variant;
use crate::vm::{Vm, STACK_SIZE};
use std::rc::Rc;

fn setup_call(vm: &mut Vm, function: Rc<Function>, self_value: Variant) -> VmResult<()> {
    let num_parameters = function.num_parameters as isize;
    let num_locals = function.num_locals() as isize;
    if vm.sp + 1 < num_parameters {
        return Err(VmError::runtime("stack underflow"));
    }

    vm.push_frame()?;
    vm.bsp = (vm.sp - num_parameters + 1) as usize;
    vm.pc = 0;
    vm.self_value = self_value;
    vm.function = Some(function);

    vm.sp += num_locals;
    if vm.sp >= STACK_SIZE as isize {
        vm.sp -= num_locals;
        return Err(VmError::StackOverflow);
    }
    Ok(())
}

pub fn invoke_user_defined_free_function(vm: &mut Vm) -> VmResult<()> {
    let executable = vm
        .executable
        .clone()
        .ok_or_else(|| VmError::runtime("no executable loaded"))?;
    let function = executable
        .functions
        .get(usize::from(vm.instruction.index))
        .cloned()
        .ok_or_else(|| VmError::runtime("function index out of range"))?;
    setup_call(vm, function, Variant::unknown())
}

pub fn invoke_user_defined_constructor(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let (constructor, object) = {
        let user_type = vm.user_defined_type(type_id)?;
        let constructor = user_type
            .functions
            .get(usize::from(vm.instruction.index))
            .cloned()
            .ok_or_else(|| VmError::runtime("constructor index out of range"))?;
        let object = new_object(UserObject::new(type_id, &user_type.member_variables));
        (constructor, object)
    };
    let self_value = Variant::object(object, type_id);

    if constructor.instructions.is_empty() {
        // System-supplied default constructor: no user code, just the object.
        return vm.push(self_value);
    }
    setup_call(vm, constructor, self_value)
}

pub fn invoke_user_defined_member_function(vm: &mut Vm) -> VmResult<()> {
    let invoker_type_id = vm.instruction.data;
    let user_type = vm.user_defined_type(invoker_type_id)?;
    let function = user_type
        .functions
        .get(usize::from(vm.instruction.index))
        .cloned()
        .ok_or_else(|| VmError::runtime("member function index out of range"))?;

    // The receiver sits just below the parameters.
    let receiver_slot = vm.sp - function.num_parameters as isize;
    if receiver_slot < 0 {
        return Err(VmError::runtime("stack underflow"));
    }
    let self_value = vm.stack[receiver_slot as usize].take();
    if self_value.object_ref().is_none() {
        return Err(VmError::NullReference);
    }
    setup_call(vm, function, self_value)
}

pub fn initialise_array(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let length = usize::from(vm.instruction.data);
    let element_type_id = vm
        .registry
        .type_info(type_id)?
        .template_parameter_type_ids
        .first()
        .copied()
        .ok_or_else(|| VmError::runtime("array type has no element type"))?;

    let mut elements = Vec::with_capacity(length);
    for _ in 0..length {
        elements.push(vm.pop()?);
    }
    elements.reverse();

    let array = new_object(Array::with_elements(type_id, element_type_id, elements));
    vm.push(Variant::object(array, type_id))
}

pub fn contract_variable_declare_assign(vm: &mut Vm) -> VmResult<()> {
    let instruction = vm.instruction;
    let sv = vm.pop()?;
    let object = sv.object_value().ok_or(VmError::NullReference)?;
    let identity = with_object::<Str, _>(&object, |s| Ok(s.value().to_string()))?;

    // Clone the identity string into a fresh object owned by the variable.
    let index = vm.local_index(instruction.index);
    vm.stack[index] = Variant::object(new_object(Str::new(identity)), type_ids::STRING);
    vm.track_live_object(instruction.index, instruction.data);
    Ok(())
}

pub fn invoke_contract_function(vm: &mut Vm) -> VmResult<()> {
    let contract_id = usize::from(vm.instruction.data);
    let function_id = usize::from(vm.instruction.index);
    let executable = vm
        .executable
        .clone()
        .ok_or_else(|| VmError::runtime("no executable loaded"))?;
    let contract = executable
        .contracts
        .get(contract_id)
        .ok_or_else(|| VmError::runtime("contract id out of range"))?;
    let function = contract
        .functions
        .get(function_id)
        .cloned()
        .ok_or_else(|| VmError::runtime("contract function id out of range"))?;

    let num_parameters = usize::from(function.num_parameters);
    let mut parameters = Vec::with_capacity(num_parameters);
    for _ in 0..num_parameters {
        parameters.push(vm.pop()?);
    }
    parameters.reverse();

    let sv = vm.pop()?;
    let identity_object = sv.object_value().ok_or(VmError::NullReference)?;
    let identity = with_object::<Str, _>(&identity_object, |s| Ok(s.value().to_string()))?;

    let handler = vm.contract_handler.clone().ok_or_else(|| {
        VmError::runtime("contract-to-contract calls not supported: invocation handler is null")
    })?;

    let output = handler(&identity, contract, &function, parameters)
        .map_err(VmError::runtime)?;

    if function.return_type_id != type_ids::VOID {
        if output.type_id != function.return_type_id {
            return Err(VmError::runtime(format!(
                "call to {} in contract {} returned unexpected type",
                function.name, identity
            )));
        }
        vm.push(output)?;
    }
    Ok(())
}
