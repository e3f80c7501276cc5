//! Stack, constant, and variable handlers.

use crate::error::{VmError, VmResult};
use crate::object::new_object;
use crate::objects::fixed128::Fixed128;
use crate::primitive::Primitive;
use crate::types::{is_primitive, type_ids};
use crate::variant::Variant;
use crate::vm::{Vm, STACK_SIZE};

pub fn local_variable_declare(vm: &mut Vm) -> VmResult<()> {
    let instruction = vm.instruction;
    let index = vm.local_index(instruction.index);
    if is_primitive(instruction.type_id) {
        vm.stack[index] = Variant::primitive(Primitive::zero(), instruction.type_id);
    } else {
        vm.stack[index] = Variant::null_object(instruction.type_id);
        vm.track_live_object(instruction.index, instruction.data);
    }
    Ok(())
}

pub fn local_variable_declare_assign(vm: &mut Vm) -> VmResult<()> {
    let instruction = vm.instruction;
    let value = vm.pop()?;
    let index = vm.local_index(instruction.index);
    vm.stack[index].assign(value);
    if !is_primitive(instruction.type_id) {
        vm.track_live_object(instruction.index, instruction.data);
    }
    Ok(())
}

pub fn push_null(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    vm.push(Variant::null_object(type_id))
}

pub fn push_false(vm: &mut Vm) -> VmResult<()> {
    vm.push(Variant::bool_value(false))
}

pub fn push_true(vm: &mut Vm) -> VmResult<()> {
    vm.push(Variant::bool_value(true))
}

pub fn push_string(vm: &mut Vm) -> VmResult<()> {
    let index = usize::from(vm.instruction.index);
    let string = vm
        .strings
        .get(index)
        .cloned()
        .ok_or_else(|| VmError::runtime("string pool index out of range"))?;
    vm.push(Variant::object(string, type_ids::STRING))
}

pub fn push_constant(vm: &mut Vm) -> VmResult<()> {
    let index = usize::from(vm.instruction.index);
    let executable = vm
        .executable
        .clone()
        .ok_or_else(|| VmError::runtime("no executable loaded"))?;
    let constant = executable
        .constants
        .get(index)
        .cloned()
        .ok_or_else(|| VmError::runtime("constant pool index out of range"))?;
    vm.push(constant)
}

pub fn push_large_constant(vm: &mut Vm) -> VmResult<()> {
    let index = usize::from(vm.instruction.index);
    let executable = vm
        .executable
        .clone()
        .ok_or_else(|| VmError::runtime("no executable loaded"))?;
    let constant = executable
        .large_constants
        .get(index)
        .ok_or_else(|| VmError::runtime("large constant pool index out of range"))?;
    let object = new_object(Fixed128::new(constant.fp128));
    vm.push(Variant::object(object, type_ids::FIXED128))
}

pub fn push_local_variable(vm: &mut Vm) -> VmResult<()> {
    let index = vm.local_index(vm.instruction.index);
    let value = vm.stack[index].clone();
    vm.push(value)
}

pub fn pop_to_local_variable(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?;
    let index = vm.local_index(vm.instruction.index);
    vm.stack[index].assign(value);
    Ok(())
}

pub fn push_self(vm: &mut Vm) -> VmResult<()> {
    let value = vm.self_value.clone();
    vm.push(value)
}

pub fn duplicate(vm: &mut Vm) -> VmResult<()> {
    let count = vm.instruction.data as isize;
    if vm.sp + count >= STACK_SIZE as isize {
        return Err(VmError::StackOverflow);
    }
    if vm.sp + 1 < count {
        return Err(VmError::runtime("stack underflow"));
    }
    let start = (vm.sp + 1 - count) as usize;
    for offset in 0..count as usize {
        let value = vm.stack[start + offset].clone();
        vm.sp += 1;
        vm.stack[vm.sp as usize] = value;
    }
    Ok(())
}

pub fn duplicate_insert(vm: &mut Vm) -> VmResult<()> {
    let depth = vm.instruction.data as isize;
    if vm.sp + 1 >= STACK_SIZE as isize {
        return Err(VmError::StackOverflow);
    }
    if vm.sp < depth {
        return Err(VmError::runtime("stack underflow"));
    }
    let sp = vm.sp as usize;
    let end = sp - depth as usize;
    for position in (end..=sp).rev() {
        let moved = vm.stack[position].take();
        vm.stack[position + 1] = moved;
    }
    vm.sp += 1;
    let copy = vm.stack[vm.sp as usize].clone();
    vm.stack[end] = copy;
    Ok(())
}

pub fn discard(vm: &mut Vm) -> VmResult<()> {
    vm.pop()?;
    Ok(())
}
