//! Primitive arithmetic, relational, and increment/decrement handlers.
//!
//! All primitive math is dispatched on the instruction's type id. Integer
//! arithmetic wraps; integer and fixed-point division and modulo by zero
//! raise `division by zero`; float division follows IEEE and never raises.

use crate::error::{VmError, VmResult};
use crate::primitive::Primitive;
use crate::types::{type_ids, TypeId};
use crate::variant::Variant;
use crate::vm::Vm;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithKind {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

fn non_numeric(type_id: TypeId) -> VmError {
    VmError::runtime(format!("type {type_id} is not numeric"))
}

/// Applies a wrapping binary arithmetic operation on two primitives of the
/// instruction's type.
pub(crate) fn numeric_binary(
    kind: ArithKind,
    type_id: TypeId,
    lhs: Primitive,
    rhs: Primitive,
) -> VmResult<Primitive> {
    macro_rules! int_case {
        ($as:ident, $from:ident) => {{
            let a = lhs.$as();
            let b = rhs.$as();
            let result = match kind {
                ArithKind::Add => a.wrapping_add(b),
                ArithKind::Subtract => a.wrapping_sub(b),
                ArithKind::Multiply => a.wrapping_mul(b),
                ArithKind::Divide => {
                    if b == 0 {
                        return Err(VmError::DivisionByZero);
                    }
                    a.wrapping_div(b)
                }
            };
            Primitive::$from(result)
        }};
    }

    macro_rules! float_case {
        ($as:ident, $from:ident) => {{
            let a = lhs.$as();
            let b = rhs.$as();
            let result = match kind {
                ArithKind::Add => a + b,
                ArithKind::Subtract => a - b,
                ArithKind::Multiply => a * b,
                ArithKind::Divide => a / b,
            };
            Primitive::$from(result)
        }};
    }

    macro_rules! fixed_case {
        ($as:ident, $from:ident) => {{
            let a = lhs.$as();
            let b = rhs.$as();
            let result = match kind {
                ArithKind::Add => a.wrapping_add(b),
                ArithKind::Subtract => a.wrapping_sub(b),
                ArithKind::Multiply => a.wrapping_mul(b),
                ArithKind::Divide => a.checked_div(b).ok_or(VmError::DivisionByZero)?,
            };
            Primitive::$from(result)
        }};
    }

    Ok(match type_id {
        type_ids::INT8 => int_case!(as_i8, from_i8),
        type_ids::UINT8 => int_case!(as_u8, from_u8),
        type_ids::INT16 => int_case!(as_i16, from_i16),
        type_ids::UINT16 => int_case!(as_u16, from_u16),
        type_ids::INT32 => int_case!(as_i32, from_i32),
        type_ids::UINT32 => int_case!(as_u32, from_u32),
        type_ids::INT64 => int_case!(as_i64, from_i64),
        type_ids::UINT64 => int_case!(as_u64, from_u64),
        type_ids::FLOAT32 => float_case!(as_f32, from_f32),
        type_ids::FLOAT64 => float_case!(as_f64, from_f64),
        type_ids::FIXED32 => fixed_case!(as_fx32, from_fx32),
        type_ids::FIXED64 => fixed_case!(as_fx64, from_fx64),
        other => return Err(non_numeric(other)),
    })
}

/// Integer modulo; zero divisor raises `division by zero`.
pub(crate) fn integral_modulo(type_id: TypeId, lhs: Primitive, rhs: Primitive) -> VmResult<Primitive> {
    macro_rules! mod_case {
        ($as:ident, $from:ident) => {{
            let b = rhs.$as();
            if b == 0 {
                return Err(VmError::DivisionByZero);
            }
            Primitive::$from(lhs.$as().wrapping_rem(b))
        }};
    }

    Ok(match type_id {
        type_ids::INT8 => mod_case!(as_i8, from_i8),
        type_ids::UINT8 => mod_case!(as_u8, from_u8),
        type_ids::INT16 => mod_case!(as_i16, from_i16),
        type_ids::UINT16 => mod_case!(as_u16, from_u16),
        type_ids::INT32 => mod_case!(as_i32, from_i32),
        type_ids::UINT32 => mod_case!(as_u32, from_u32),
        type_ids::INT64 => mod_case!(as_i64, from_i64),
        type_ids::UINT64 => mod_case!(as_u64, from_u64),
        other => return Err(non_numeric(other)),
    })
}

/// Negation of a numeric primitive.
pub(crate) fn numeric_negate(type_id: TypeId, value: Primitive) -> VmResult<Primitive> {
    Ok(match type_id {
        type_ids::INT8 => Primitive::from_i8(value.as_i8().wrapping_neg()),
        type_ids::UINT8 => Primitive::from_u8(value.as_u8().wrapping_neg()),
        type_ids::INT16 => Primitive::from_i16(value.as_i16().wrapping_neg()),
        type_ids::UINT16 => Primitive::from_u16(value.as_u16().wrapping_neg()),
        type_ids::INT32 => Primitive::from_i32(value.as_i32().wrapping_neg()),
        type_ids::UINT32 => Primitive::from_u32(value.as_u32().wrapping_neg()),
        type_ids::INT64 => Primitive::from_i64(value.as_i64().wrapping_neg()),
        type_ids::UINT64 => Primitive::from_u64(value.as_u64().wrapping_neg()),
        type_ids::FLOAT32 => Primitive::from_f32(-value.as_f32()),
        type_ids::FLOAT64 => Primitive::from_f64(-value.as_f64()),
        type_ids::FIXED32 => Primitive::from_fx32(value.as_fx32().wrapping_neg()),
        type_ids::FIXED64 => Primitive::from_fx64(value.as_fx64().wrapping_neg()),
        other => return Err(non_numeric(other)),
    })
}

/// Steps an integral primitive by ±1, for the inc/dec family.
pub(crate) fn integral_step(type_id: TypeId, value: Primitive, up: bool) -> VmResult<Primitive> {
    macro_rules! step_case {
        ($as:ident, $from:ident) => {{
            let v = value.$as();
            Primitive::$from(if up { v.wrapping_add(1) } else { v.wrapping_sub(1) })
        }};
    }

    Ok(match type_id {
        type_ids::INT8 => step_case!(as_i8, from_i8),
        type_ids::UINT8 => step_case!(as_u8, from_u8),
        type_ids::INT16 => step_case!(as_i16, from_i16),
        type_ids::UINT16 => step_case!(as_u16, from_u16),
        type_ids::INT32 => step_case!(as_i32, from_i32),
        type_ids::UINT32 => step_case!(as_u32, from_u32),
        type_ids::INT64 => step_case!(as_i64, from_i64),
        type_ids::UINT64 => step_case!(as_u64, from_u64),
        other => return Err(VmError::runtime(format!("type {other} is not integral"))),
    })
}

/// Compares two primitives of the instruction's type.
pub(crate) fn primitive_compare(
    op: RelOp,
    type_id: TypeId,
    lhs: Primitive,
    rhs: Primitive,
) -> VmResult<bool> {
    macro_rules! cmp_case {
        ($as:ident) => {{
            let a = lhs.$as();
            let b = rhs.$as();
            match op {
                RelOp::Equal => a == b,
                RelOp::NotEqual => a != b,
                RelOp::LessThan => a < b,
                RelOp::LessThanOrEqual => a <= b,
                RelOp::GreaterThan => a > b,
                RelOp::GreaterThanOrEqual => a >= b,
            }
        }};
    }

    Ok(match type_id {
        type_ids::BOOL => cmp_case!(as_u8),
        type_ids::INT8 => cmp_case!(as_i8),
        type_ids::UINT8 => cmp_case!(as_u8),
        type_ids::INT16 => cmp_case!(as_i16),
        type_ids::UINT16 => cmp_case!(as_u16),
        type_ids::INT32 => cmp_case!(as_i32),
        type_ids::UINT32 => cmp_case!(as_u32),
        type_ids::INT64 => cmp_case!(as_i64),
        type_ids::UINT64 => cmp_case!(as_u64),
        type_ids::FLOAT32 => cmp_case!(as_f32),
        type_ids::FLOAT64 => cmp_case!(as_f64),
        type_ids::FIXED32 => cmp_case!(as_fx32),
        type_ids::FIXED64 => cmp_case!(as_fx64),
        other => return Err(VmError::runtime(format!("type {other} is not comparable"))),
    })
}

fn binary_op(vm: &mut Vm, kind: ArithKind) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let rhs = vm.pop()?;
    let lhs = vm.top_mut()?.primitive_value();
    let result = numeric_binary(kind, type_id, lhs, rhs.primitive_value())?;
    vm.top_mut()?.set_primitive(result);
    Ok(())
}

fn relational_op(vm: &mut Vm, op: RelOp) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let rhs = vm.pop()?;
    let lhs = vm.top_mut()?.primitive_value();
    let result = primitive_compare(op, type_id, lhs, rhs.primitive_value())?;
    *vm.top_mut()? = Variant::bool_value(result);
    Ok(())
}

fn inplace_op(vm: &mut Vm, kind: ArithKind) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let index = vm.local_index(vm.instruction.index);
    let rhs = vm.pop()?;
    let lhs = vm.stack[index].primitive_value();
    let result = numeric_binary(kind, type_id, lhs, rhs.primitive_value())?;
    vm.stack[index].set_primitive(result);
    Ok(())
}

fn prefix_postfix_op(vm: &mut Vm, up: bool, prefix: bool) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let index = vm.local_index(vm.instruction.index);
    let old = vm.stack[index].primitive_value();
    let new = integral_step(type_id, old, up)?;
    vm.stack[index].set_primitive(new);
    vm.push(Variant::primitive(if prefix { new } else { old }, type_id))
}

// ---- handlers ----

pub fn primitive_add(vm: &mut Vm) -> VmResult<()> {
    binary_op(vm, ArithKind::Add)
}

pub fn primitive_subtract(vm: &mut Vm) -> VmResult<()> {
    binary_op(vm, ArithKind::Subtract)
}

pub fn primitive_multiply(vm: &mut Vm) -> VmResult<()> {
    binary_op(vm, ArithKind::Multiply)
}

pub fn primitive_divide(vm: &mut Vm) -> VmResult<()> {
    binary_op(vm, ArithKind::Divide)
}

pub fn primitive_modulo(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let rhs = vm.pop()?;
    let lhs = vm.top_mut()?.primitive_value();
    let result = integral_modulo(type_id, lhs, rhs.primitive_value())?;
    vm.top_mut()?.set_primitive(result);
    Ok(())
}

pub fn primitive_negate(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let value = vm.top_mut()?.primitive_value();
    let result = numeric_negate(type_id, value)?;
    vm.top_mut()?.set_primitive(result);
    Ok(())
}

pub fn not(vm: &mut Vm) -> VmResult<()> {
    let top = vm.top_mut()?;
    let flipped = !top.primitive_value().as_bool();
    top.set_primitive(Primitive::from_bool(flipped));
    Ok(())
}

pub fn inc(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let value = vm.top_mut()?.primitive_value();
    let result = integral_step(type_id, value, true)?;
    vm.top_mut()?.set_primitive(result);
    Ok(())
}

pub fn dec(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let value = vm.top_mut()?.primitive_value();
    let result = integral_step(type_id, value, false)?;
    vm.top_mut()?.set_primitive(result);
    Ok(())
}

pub fn primitive_equal(vm: &mut Vm) -> VmResult<()> {
    relational_op(vm, RelOp::Equal)
}

pub fn primitive_not_equal(vm: &mut Vm) -> VmResult<()> {
    relational_op(vm, RelOp::NotEqual)
}

pub fn primitive_less_than(vm: &mut Vm) -> VmResult<()> {
    relational_op(vm, RelOp::LessThan)
}

pub fn primitive_less_than_or_equal(vm: &mut Vm) -> VmResult<()> {
    relational_op(vm, RelOp::LessThanOrEqual)
}

pub fn primitive_greater_than(vm: &mut Vm) -> VmResult<()> {
    relational_op(vm, RelOp::GreaterThan)
}

pub fn primitive_greater_than_or_equal(vm: &mut Vm) -> VmResult<()> {
    relational_op(vm, RelOp::GreaterThanOrEqual)
}

pub fn local_variable_prefix_inc(vm: &mut Vm) -> VmResult<()> {
    prefix_postfix_op(vm, true, true)
}

pub fn local_variable_prefix_dec(vm: &mut Vm) -> VmResult<()> {
    prefix_postfix_op(vm, false, true)
}

pub fn local_variable_postfix_inc(vm: &mut Vm) -> VmResult<()> {
    prefix_postfix_op(vm, true, false)
}

pub fn local_variable_postfix_dec(vm: &mut Vm) -> VmResult<()> {
    prefix_postfix_op(vm, false, false)
}

pub fn local_variable_primitive_inplace_add(vm: &mut Vm) -> VmResult<()> {
    inplace_op(vm, ArithKind::Add)
}

pub fn local_variable_primitive_inplace_subtract(vm: &mut Vm) -> VmResult<()> {
    inplace_op(vm, ArithKind::Subtract)
}

pub fn local_variable_primitive_inplace_multiply(vm: &mut Vm) -> VmResult<()> {
    inplace_op(vm, ArithKind::Multiply)
}

pub fn local_variable_primitive_inplace_divide(vm: &mut Vm) -> VmResult<()> {
    inplace_op(vm, ArithKind::Divide)
}

pub fn local_variable_primitive_inplace_modulo(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let index = vm.local_index(vm.instruction.index);
    let rhs = vm.pop()?;
    let lhs = vm.stack[index].primitive_value();
    let result = integral_modulo(type_id, lhs, rhs.primitive_value())?;
    vm.stack[index].set_primitive(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_division_by_zero_is_an_error() {
        let err = numeric_binary(
            ArithKind::Divide,
            type_ids::INT32,
            Primitive::from_i32(1),
            Primitive::from_i32(0),
        )
        .unwrap_err();
        assert_eq!(err, VmError::DivisionByZero);

        let err = integral_modulo(
            type_ids::UINT64,
            Primitive::from_u64(1),
            Primitive::from_u64(0),
        )
        .unwrap_err();
        assert_eq!(err, VmError::DivisionByZero);
    }

    #[test]
    fn float_division_by_zero_is_ieee() {
        let r = numeric_binary(
            ArithKind::Divide,
            type_ids::FLOAT64,
            Primitive::from_f64(1.0),
            Primitive::from_f64(0.0),
        )
        .unwrap();
        assert!(r.as_f64().is_infinite());
    }

    #[test]
    fn fixed_point_arithmetic_dispatches() {
        use crate::fixed::Fx64;
        let r = numeric_binary(
            ArithKind::Add,
            type_ids::FIXED64,
            Primitive::from_fx64(Fx64::from_f64(4.5)),
            Primitive::from_fx64(Fx64::from_f64(5.5)),
        )
        .unwrap();
        assert_eq!(r.as_fx64().to_f64(), 10.0);
    }

    #[test]
    fn comparisons_respect_signedness() {
        assert!(primitive_compare(
            RelOp::LessThan,
            type_ids::INT8,
            Primitive::from_i8(-1),
            Primitive::from_i8(1),
        )
        .unwrap());
        // Same bits viewed unsigned compare the other way.
        assert!(!primitive_compare(
            RelOp::LessThan,
            type_ids::UINT8,
            Primitive::from_u8(0xff),
            Primitive::from_u8(1),
        )
        .unwrap());
    }
}
