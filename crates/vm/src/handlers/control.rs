//! Control-flow handlers: jumps, scoped destruction, returns, for-range
//! loops.

use crate::error::{VmError, VmResult};
use crate::executable::FunctionKind;
use crate::opcodes;
use crate::primitive::Primitive;
use crate::types::type_ids;
use crate::variant::Variant;
use crate::vm::{ForRangeLoop, Vm, MAX_RANGE_LOOPS};

pub fn destruct(vm: &mut Vm) -> VmResult<()> {
    let scope = vm.instruction.data;
    vm.destruct(scope);
    Ok(())
}

pub fn break_loop(vm: &mut Vm) -> VmResult<()> {
    let instruction = vm.instruction;
    vm.destruct(instruction.data);
    vm.pc = instruction.index;
    Ok(())
}

pub fn continue_loop(vm: &mut Vm) -> VmResult<()> {
    let instruction = vm.instruction;
    vm.destruct(instruction.data);
    vm.pc = instruction.index;
    Ok(())
}

pub fn jump(vm: &mut Vm) -> VmResult<()> {
    vm.pc = vm.instruction.index;
    Ok(())
}

pub fn jump_if_false(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?;
    if !value.as_condition() {
        vm.pc = vm.instruction.index;
    }
    Ok(())
}

pub fn jump_if_true(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?;
    if value.as_condition() {
        vm.pc = vm.instruction.index;
    }
    Ok(())
}

pub fn jump_if_false_or_pop(vm: &mut Vm) -> VmResult<()> {
    let target = vm.instruction.index;
    if !vm.top_mut()?.as_condition() {
        vm.pc = target;
    } else {
        vm.pop()?;
    }
    Ok(())
}

pub fn jump_if_true_or_pop(vm: &mut Vm) -> VmResult<()> {
    let target = vm.instruction.index;
    if vm.top_mut()?.as_condition() {
        vm.pc = target;
    } else {
        vm.pop()?;
    }
    Ok(())
}

/// `Return` and `ReturnValue` both route through here. Live objects of the
/// current frame are destructed, parameters (and the receiver, for member
/// functions) are reset, the return value is placed per the calling
/// convention, and the saved frame is restored; popping the outermost frame
/// stops the machine.
pub fn ret(vm: &mut Vm) -> VmResult<()> {
    vm.destruct(0);

    let function = vm.function.clone().expect("function set while running");
    let returns_value = vm.instruction.opcode == opcodes::RETURN_VALUE;
    if returns_value && vm.sp < 0 {
        return Err(VmError::runtime("stack underflow"));
    }
    let bsp = vm.bsp;
    let num_parameters = usize::from(function.num_parameters);

    match function.kind {
        FunctionKind::FreeFunction => {
            if returns_value {
                // Reset the 2nd and subsequent parameters; the first slot
                // receives the return value.
                for i in bsp + 1..bsp + num_parameters {
                    vm.stack[i].reset();
                }
                if vm.sp as usize != bsp {
                    let value = vm.stack[vm.sp as usize].take();
                    vm.stack[bsp] = value;
                }
                vm.sp = bsp as isize;
            } else {
                for slot in &mut vm.stack[bsp..bsp + num_parameters] {
                    slot.reset();
                }
                vm.sp = bsp as isize - 1;
            }
        }
        FunctionKind::MemberFunction => {
            if bsp == 0 {
                return Err(VmError::runtime("member return without a receiver slot"));
            }
            if returns_value {
                for slot in &mut vm.stack[bsp..bsp + num_parameters] {
                    slot.reset();
                }
                // The return value lands over the receiver slot.
                let receiver = bsp - 1;
                let value = vm.stack[vm.sp as usize].take();
                vm.stack[receiver] = value;
                vm.sp = receiver as isize;
            } else {
                for slot in &mut vm.stack[bsp - 1..bsp + num_parameters] {
                    slot.reset();
                }
                vm.sp = bsp as isize - 2;
            }
        }
        FunctionKind::Constructor => {
            for i in bsp + 1..bsp + num_parameters {
                vm.stack[i].reset();
            }
            // The constructed self lands where the first argument was.
            let constructed = vm.self_value.take();
            vm.stack[bsp] = constructed;
            vm.sp = bsp as isize;
        }
    }

    if vm.frames.is_empty() {
        vm.stop = true;
    } else {
        vm.pop_frame();
    }
    Ok(())
}

pub fn for_range_init(vm: &mut Vm) -> VmResult<()> {
    let instruction = vm.instruction;
    let mut range_loop = ForRangeLoop {
        variable_index: instruction.index,
        ..ForRangeLoop::default()
    };

    if instruction.data == 2 {
        let target = vm.pop()?;
        let start = vm.pop()?;
        range_loop.current = start.primitive_value();
        range_loop.target = target.primitive_value();
    } else {
        let delta = vm.pop()?;
        let target = vm.pop()?;
        let start = vm.pop()?;
        range_loop.current = start.primitive_value();
        range_loop.target = target.primitive_value();
        range_loop.delta = delta.primitive_value();
    }

    let index = vm.local_index(instruction.index);
    vm.stack[index] = Variant::primitive(Primitive::zero(), instruction.type_id);

    if vm.range_loops.len() >= MAX_RANGE_LOOPS {
        return Err(VmError::ForStackOverflow);
    }
    vm.range_loops.push(range_loop);
    Ok(())
}

pub fn for_range_iterate(vm: &mut Vm) -> VmResult<()> {
    let instruction = vm.instruction;
    let mut range_loop = *vm
        .range_loops
        .last()
        .ok_or_else(|| VmError::runtime("for-range stack is empty"))?;

    let index = vm.local_index(range_loop.variable_index);
    let type_id = vm.stack[index].type_id;
    let has_delta = instruction.data != 2;

    macro_rules! iterate_case {
        ($as:ident, $from:ident) => {{
            let value = range_loop.current.$as();
            let step = if has_delta {
                range_loop.delta.$as()
            } else {
                1
            };
            range_loop.current = Primitive::$from(value.wrapping_add(step));
            vm.stack[index].set_primitive(Primitive::$from(value));
            value >= range_loop.target.$as()
        }};
    }

    let finished = match type_id {
        type_ids::INT8 => iterate_case!(as_i8, from_i8),
        type_ids::UINT8 => iterate_case!(as_u8, from_u8),
        type_ids::INT16 => iterate_case!(as_i16, from_i16),
        type_ids::UINT16 => iterate_case!(as_u16, from_u16),
        type_ids::INT32 => iterate_case!(as_i32, from_i32),
        type_ids::UINT32 => iterate_case!(as_u32, from_u32),
        type_ids::INT64 => iterate_case!(as_i64, from_i64),
        type_ids::UINT64 => iterate_case!(as_u64, from_u64),
        other => {
            return Err(VmError::runtime(format!(
                "type {other} cannot drive a for-range loop"
            )))
        }
    };

    *vm.range_loops.last_mut().expect("checked above") = range_loop;

    if finished {
        vm.pc = instruction.index;
    }
    Ok(())
}

pub fn for_range_terminate(vm: &mut Vm) -> VmResult<()> {
    vm.range_loops
        .pop()
        .ok_or_else(|| VmError::runtime("for-range stack is empty"))?;
    Ok(())
}
