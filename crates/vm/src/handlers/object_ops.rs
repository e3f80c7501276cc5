//! Object-operand handlers: contract-dispatched arithmetic, relational
//! operators, member variable access, and indexed container access.
//!
//! Null policy: a null left operand raises `null reference`; for mixed
//! left/right shapes the object side must be non-null. Equality and
//! inequality treat `null == null` as true and `null == non-null` as false
//! without invoking user code. Every contract operator is preceded by its
//! charge estimator; the estimate is added to the total before the operator
//! runs.

use crate::charge::ChargeAmount;
use crate::error::{VmError, VmResult};
use crate::handlers::arith::{integral_modulo, integral_step, numeric_binary, ArithKind};
use crate::object::{with_object, with_object_mut, ObjectRc};
use crate::objects::user_object::UserObject;
use crate::variant::Variant;
use crate::vm::Vm;
use std::rc::Rc;

fn object_binary(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<ChargeAmount>,
    apply: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<ObjectRc>,
) -> VmResult<()> {
    let rhsv = vm.pop()?;
    let lhs_type = vm.top_mut()?.type_id;
    let lhs = vm.top_mut()?.object_value().ok_or(VmError::NullReference)?;
    let rhs = rhsv.object_value().ok_or(VmError::NullReference)?;
    let amount = estimate(&lhs, &rhs)?;
    vm.apply_charge(amount)?;
    let result = apply(&lhs, &rhs)?;
    *vm.top_mut()? = Variant::object(result, lhs_type);
    Ok(())
}

fn object_left(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &Variant) -> VmResult<ChargeAmount>,
    apply: impl Fn(&ObjectRc, &Variant) -> VmResult<Variant>,
) -> VmResult<()> {
    let rhsv = vm.pop()?;
    let rhs = rhsv.object_value().ok_or(VmError::NullReference)?;
    let lhsv = vm.top_mut()?.clone();
    if !lhsv.is_primitive() && lhsv.object_ref().is_none() {
        return Err(VmError::NullReference);
    }
    let amount = estimate(&rhs, &lhsv)?;
    vm.apply_charge(amount)?;
    let result = apply(&rhs, &lhsv)?;
    *vm.top_mut()? = result;
    Ok(())
}

fn object_right(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &Variant) -> VmResult<ChargeAmount>,
    apply: impl Fn(&ObjectRc, &Variant) -> VmResult<Variant>,
) -> VmResult<()> {
    let rhsv = vm.pop()?;
    if !rhsv.is_primitive() && rhsv.object_ref().is_none() {
        return Err(VmError::NullReference);
    }
    let lhs = vm.top_mut()?.object_value().ok_or(VmError::NullReference)?;
    let amount = estimate(&lhs, &rhsv)?;
    vm.apply_charge(amount)?;
    let result = apply(&lhs, &rhsv)?;
    *vm.top_mut()? = result;
    Ok(())
}

// `x op= x` aliases the two operands on one RefCell; route through the
// non-mutating operator and rebind instead.
fn local_object_inplace(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<ChargeAmount>,
    apply_inplace: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<()>,
    apply_fresh: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<ObjectRc>,
) -> VmResult<()> {
    let index = vm.local_index(vm.instruction.index);
    let rhsv = vm.pop()?;
    let rhs = rhsv.object_value().ok_or(VmError::NullReference)?;
    let lhs = vm.stack[index].object_value().ok_or(VmError::NullReference)?;
    let amount = estimate(&lhs, &rhs)?;
    vm.apply_charge(amount)?;
    if Rc::ptr_eq(&lhs, &rhs) {
        let result = apply_fresh(&lhs, &rhs)?;
        vm.stack[index].set_object(result);
    } else {
        apply_inplace(&lhs, &rhs)?;
    }
    Ok(())
}

fn local_object_inplace_right(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &Variant) -> VmResult<ChargeAmount>,
    apply_inplace: impl Fn(&ObjectRc, &Variant) -> VmResult<()>,
    apply_fresh: impl Fn(&ObjectRc, &Variant) -> VmResult<Variant>,
) -> VmResult<()> {
    let index = vm.local_index(vm.instruction.index);
    let rhsv = vm.pop()?;
    if !rhsv.is_primitive() && rhsv.object_ref().is_none() {
        return Err(VmError::NullReference);
    }
    let lhs = vm.stack[index].object_value().ok_or(VmError::NullReference)?;
    let aliased = rhsv.object_ref().is_some_and(|r| Rc::ptr_eq(&lhs, r));
    let amount = estimate(&lhs, &rhsv)?;
    vm.apply_charge(amount)?;
    if aliased {
        let result = apply_fresh(&lhs, &rhsv)?;
        vm.stack[index].assign(result);
    } else {
        apply_inplace(&lhs, &rhsv)?;
    }
    Ok(())
}

fn member_object(receiver: &ObjectRc, member_index: u16) -> VmResult<ObjectRc> {
    with_object::<UserObject, _>(receiver, |o| o.variable(member_index).map(|v| v.object_value()))?
        .ok_or(VmError::NullReference)
}

fn member_object_inplace(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<ChargeAmount>,
    apply_inplace: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<()>,
    apply_fresh: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<ObjectRc>,
) -> VmResult<()> {
    let member_index = vm.instruction.index;
    let rhsv = vm.pop()?;
    let objectv = vm.pop()?;
    let rhs = rhsv.object_value().ok_or(VmError::NullReference)?;
    let receiver = objectv.object_value().ok_or(VmError::NullReference)?;
    let lhs = member_object(&receiver, member_index)?;
    let amount = estimate(&lhs, &rhs)?;
    vm.apply_charge(amount)?;
    if Rc::ptr_eq(&lhs, &rhs) {
        let result = apply_fresh(&lhs, &rhs)?;
        with_object_mut::<UserObject, _>(&receiver, |o| {
            o.variable_mut(member_index)?.set_object(result);
            Ok(())
        })?;
    } else {
        apply_inplace(&lhs, &rhs)?;
    }
    Ok(())
}

fn member_object_inplace_right(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &Variant) -> VmResult<ChargeAmount>,
    apply_inplace: impl Fn(&ObjectRc, &Variant) -> VmResult<()>,
    apply_fresh: impl Fn(&ObjectRc, &Variant) -> VmResult<Variant>,
) -> VmResult<()> {
    let member_index = vm.instruction.index;
    let rhsv = vm.pop()?;
    let objectv = vm.pop()?;
    if !rhsv.is_primitive() && rhsv.object_ref().is_none() {
        return Err(VmError::NullReference);
    }
    let receiver = objectv.object_value().ok_or(VmError::NullReference)?;
    let lhs = member_object(&receiver, member_index)?;
    let aliased = rhsv.object_ref().is_some_and(|r| Rc::ptr_eq(&lhs, r));
    let amount = estimate(&lhs, &rhsv)?;
    vm.apply_charge(amount)?;
    if aliased {
        let result = apply_fresh(&lhs, &rhsv)?;
        with_object_mut::<UserObject, _>(&receiver, |o| {
            o.variable_mut(member_index)?.assign(result);
            Ok(())
        })?;
    } else {
        apply_inplace(&lhs, &rhsv)?;
    }
    Ok(())
}

macro_rules! object_family {
    ($op:ident, $left:ident, $right:ident, $lv_inplace:ident, $lv_inplace_right:ident,
     $mv_inplace:ident, $mv_inplace_right:ident,
     $m:ident, $left_m:ident, $right_m:ident, $inplace_m:ident, $inplace_right_m:ident,
     $est:ident, $left_est:ident, $right_est:ident, $inplace_est:ident, $inplace_right_est:ident) => {
        pub fn $op(vm: &mut Vm) -> VmResult<()> {
            object_binary(vm, |l, r| l.borrow().$est(r), |l, r| l.borrow().$m(r))
        }

        pub fn $left(vm: &mut Vm) -> VmResult<()> {
            object_left(
                vm,
                |o, lhsv| o.borrow().$left_est(lhsv),
                |o, lhsv| o.borrow().$left_m(lhsv),
            )
        }

        pub fn $right(vm: &mut Vm) -> VmResult<()> {
            object_right(
                vm,
                |o, rhsv| o.borrow().$right_est(rhsv),
                |o, rhsv| o.borrow().$right_m(rhsv),
            )
        }

        pub fn $lv_inplace(vm: &mut Vm) -> VmResult<()> {
            local_object_inplace(
                vm,
                |l, r| l.borrow().$inplace_est(r),
                |l, r| l.borrow_mut().$inplace_m(r),
                |l, r| l.borrow().$m(r),
            )
        }

        pub fn $lv_inplace_right(vm: &mut Vm) -> VmResult<()> {
            local_object_inplace_right(
                vm,
                |l, v| l.borrow().$inplace_right_est(v),
                |l, v| l.borrow_mut().$inplace_right_m(v),
                |l, v| l.borrow().$right_m(v),
            )
        }

        pub fn $mv_inplace(vm: &mut Vm) -> VmResult<()> {
            member_object_inplace(
                vm,
                |l, r| l.borrow().$inplace_est(r),
                |l, r| l.borrow_mut().$inplace_m(r),
                |l, r| l.borrow().$m(r),
            )
        }

        pub fn $mv_inplace_right(vm: &mut Vm) -> VmResult<()> {
            member_object_inplace_right(
                vm,
                |l, v| l.borrow().$inplace_right_est(v),
                |l, v| l.borrow_mut().$inplace_right_m(v),
                |l, v| l.borrow().$right_m(v),
            )
        }
    };
}

object_family!(
    object_add,
    object_left_add,
    object_right_add,
    local_variable_object_inplace_add,
    local_variable_object_inplace_right_add,
    member_variable_object_inplace_add,
    member_variable_object_inplace_right_add,
    add,
    left_add,
    right_add,
    inplace_add,
    inplace_right_add,
    add_charge_estimator,
    left_add_charge_estimator,
    right_add_charge_estimator,
    inplace_add_charge_estimator,
    inplace_right_add_charge_estimator
);

object_family!(
    object_subtract,
    object_left_subtract,
    object_right_subtract,
    local_variable_object_inplace_subtract,
    local_variable_object_inplace_right_subtract,
    member_variable_object_inplace_subtract,
    member_variable_object_inplace_right_subtract,
    subtract,
    left_subtract,
    right_subtract,
    inplace_subtract,
    inplace_right_subtract,
    subtract_charge_estimator,
    left_subtract_charge_estimator,
    right_subtract_charge_estimator,
    inplace_subtract_charge_estimator,
    inplace_right_subtract_charge_estimator
);

object_family!(
    object_multiply,
    object_left_multiply,
    object_right_multiply,
    local_variable_object_inplace_multiply,
    local_variable_object_inplace_right_multiply,
    member_variable_object_inplace_multiply,
    member_variable_object_inplace_right_multiply,
    multiply,
    left_multiply,
    right_multiply,
    inplace_multiply,
    inplace_right_multiply,
    multiply_charge_estimator,
    left_multiply_charge_estimator,
    right_multiply_charge_estimator,
    inplace_multiply_charge_estimator,
    inplace_right_multiply_charge_estimator
);

object_family!(
    object_divide,
    object_left_divide,
    object_right_divide,
    local_variable_object_inplace_divide,
    local_variable_object_inplace_right_divide,
    member_variable_object_inplace_divide,
    member_variable_object_inplace_right_divide,
    divide,
    left_divide,
    right_divide,
    inplace_divide,
    inplace_right_divide,
    divide_charge_estimator,
    left_divide_charge_estimator,
    right_divide_charge_estimator,
    inplace_divide_charge_estimator,
    inplace_right_divide_charge_estimator
);

// ---- relational ----

pub fn object_equal(vm: &mut Vm) -> VmResult<()> {
    let rhsv = vm.pop()?;
    let lhs = vm.top_mut()?.object_value();
    let rhs = rhsv.object_value();
    let result = match (&lhs, &rhs) {
        (Some(l), Some(r)) => {
            let amount = l.borrow().is_equal_charge_estimator(r)?;
            vm.apply_charge(amount)?;
            l.borrow().is_equal(r)?
        }
        (None, None) => true,
        _ => false,
    };
    *vm.top_mut()? = Variant::bool_value(result);
    Ok(())
}

pub fn object_not_equal(vm: &mut Vm) -> VmResult<()> {
    let rhsv = vm.pop()?;
    let lhs = vm.top_mut()?.object_value();
    let rhs = rhsv.object_value();
    let result = match (&lhs, &rhs) {
        (Some(l), Some(r)) => {
            let amount = l.borrow().is_not_equal_charge_estimator(r)?;
            vm.apply_charge(amount)?;
            l.borrow().is_not_equal(r)?
        }
        (None, None) => false,
        _ => true,
    };
    *vm.top_mut()? = Variant::bool_value(result);
    Ok(())
}

fn object_relational(
    vm: &mut Vm,
    estimate: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<ChargeAmount>,
    apply: impl Fn(&ObjectRc, &ObjectRc) -> VmResult<bool>,
) -> VmResult<()> {
    let rhsv = vm.pop()?;
    let lhs = vm.top_mut()?.object_value().ok_or(VmError::NullReference)?;
    let rhs = rhsv.object_value().ok_or(VmError::NullReference)?;
    let amount = estimate(&lhs, &rhs)?;
    vm.apply_charge(amount)?;
    let result = apply(&lhs, &rhs)?;
    *vm.top_mut()? = Variant::bool_value(result);
    Ok(())
}

pub fn object_less_than(vm: &mut Vm) -> VmResult<()> {
    object_relational(
        vm,
        |l, r| l.borrow().is_less_than_charge_estimator(r),
        |l, r| l.borrow().is_less_than(r),
    )
}

pub fn object_less_than_or_equal(vm: &mut Vm) -> VmResult<()> {
    object_relational(
        vm,
        |l, r| l.borrow().is_less_than_or_equal_charge_estimator(r),
        |l, r| l.borrow().is_less_than_or_equal(r),
    )
}

pub fn object_greater_than(vm: &mut Vm) -> VmResult<()> {
    object_relational(
        vm,
        |l, r| l.borrow().is_greater_than_charge_estimator(r),
        |l, r| l.borrow().is_greater_than(r),
    )
}

pub fn object_greater_than_or_equal(vm: &mut Vm) -> VmResult<()> {
    object_relational(
        vm,
        |l, r| l.borrow().is_greater_than_or_equal_charge_estimator(r),
        |l, r| l.borrow().is_greater_than_or_equal(r),
    )
}

pub fn object_negate(vm: &mut Vm) -> VmResult<()> {
    let object = vm.top_mut()?.object_value().ok_or(VmError::NullReference)?;
    let amount = object.borrow().negate_charge_estimator()?;
    vm.apply_charge(amount)?;
    let result = object.borrow_mut().negate();
    result
}

// ---- member variables ----

pub fn push_member_variable(vm: &mut Vm) -> VmResult<()> {
    let member_index = vm.instruction.index;
    let receiver = vm.top_mut()?.object_value().ok_or(VmError::NullReference)?;
    let value =
        with_object::<UserObject, _>(&receiver, |o| o.variable(member_index).map(|v| v.clone()))?;
    *vm.top_mut()? = value;
    Ok(())
}

pub fn pop_to_member_variable(vm: &mut Vm) -> VmResult<()> {
    let member_index = vm.instruction.index;
    let rhsv = vm.pop()?;
    let objectv = vm.pop()?;
    let receiver = objectv.object_value().ok_or(VmError::NullReference)?;
    with_object_mut::<UserObject, _>(&receiver, |o| {
        o.variable_mut(member_index)?.assign(rhsv);
        Ok(())
    })
}

fn member_prefix_postfix(vm: &mut Vm, up: bool, prefix: bool) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let member_index = vm.instruction.index;
    let objectv = vm.pop()?;
    let receiver = objectv.object_value().ok_or(VmError::NullReference)?;
    let pushed = with_object_mut::<UserObject, _>(&receiver, |o| {
        let variable = o.variable_mut(member_index)?;
        let old = variable.primitive_value();
        let new = integral_step(type_id, old, up)?;
        variable.set_primitive(new);
        Ok(if prefix { new } else { old })
    })?;
    vm.push(Variant::primitive(pushed, type_id))
}

pub fn member_variable_prefix_inc(vm: &mut Vm) -> VmResult<()> {
    member_prefix_postfix(vm, true, true)
}

pub fn member_variable_prefix_dec(vm: &mut Vm) -> VmResult<()> {
    member_prefix_postfix(vm, false, true)
}

pub fn member_variable_postfix_inc(vm: &mut Vm) -> VmResult<()> {
    member_prefix_postfix(vm, true, false)
}

pub fn member_variable_postfix_dec(vm: &mut Vm) -> VmResult<()> {
    member_prefix_postfix(vm, false, false)
}

fn member_primitive_inplace(vm: &mut Vm, kind: ArithKind) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let member_index = vm.instruction.index;
    let rhsv = vm.pop()?;
    let objectv = vm.pop()?;
    let receiver = objectv.object_value().ok_or(VmError::NullReference)?;
    with_object_mut::<UserObject, _>(&receiver, |o| {
        let variable = o.variable_mut(member_index)?;
        let result = numeric_binary(kind, type_id, variable.primitive_value(), rhsv.primitive_value())?;
        variable.set_primitive(result);
        Ok(())
    })
}

pub fn member_variable_primitive_inplace_add(vm: &mut Vm) -> VmResult<()> {
    member_primitive_inplace(vm, ArithKind::Add)
}

pub fn member_variable_primitive_inplace_subtract(vm: &mut Vm) -> VmResult<()> {
    member_primitive_inplace(vm, ArithKind::Subtract)
}

pub fn member_variable_primitive_inplace_multiply(vm: &mut Vm) -> VmResult<()> {
    member_primitive_inplace(vm, ArithKind::Multiply)
}

pub fn member_variable_primitive_inplace_divide(vm: &mut Vm) -> VmResult<()> {
    member_primitive_inplace(vm, ArithKind::Divide)
}

pub fn member_variable_primitive_inplace_modulo(vm: &mut Vm) -> VmResult<()> {
    let type_id = vm.instruction.type_id;
    let member_index = vm.instruction.index;
    let rhsv = vm.pop()?;
    let objectv = vm.pop()?;
    let receiver = objectv.object_value().ok_or(VmError::NullReference)?;
    with_object_mut::<UserObject, _>(&receiver, |o| {
        let variable = o.variable_mut(member_index)?;
        let result = integral_modulo(type_id, variable.primitive_value(), rhsv.primitive_value())?;
        variable.set_primitive(result);
        Ok(())
    })
}

// ---- indexed access ----

pub fn push_indexed_value(vm: &mut Vm) -> VmResult<()> {
    let key_count = usize::from(vm.instruction.data);
    let mut keys = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        keys.push(vm.pop()?);
    }
    keys.reverse();
    let containerv = vm.pop()?;
    let container = containerv.object_value().ok_or(VmError::NullReference)?;
    let value = container.borrow().get_indexed_value(&keys)?;
    vm.push(value)
}

pub fn pop_to_indexed_value(vm: &mut Vm) -> VmResult<()> {
    let key_count = usize::from(vm.instruction.data);
    let value = vm.pop()?;
    let mut keys = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        keys.push(vm.pop()?);
    }
    keys.reverse();
    let containerv = vm.pop()?;
    let container = containerv.object_value().ok_or(VmError::NullReference)?;
    let result = container.borrow_mut().set_indexed_value(&keys, value);
    result
}
