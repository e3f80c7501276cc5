//! The object contract.
//!
//! Every host-registered object type implements [`Object`]. The contract is
//! one method per operator hook plus a paired charge estimator; the defaults
//! raise `operator not implemented` so a missing implementation is a visible
//! runtime error rather than silent fallback behaviour.
//!
//! Objects are shared-owned: an [`ObjectRc`] is a reference-counted handle
//! and equality of handles does not imply equality of values; value equality
//! goes through [`Object::is_equal`].

use crate::charge::ChargeAmount;
use crate::error::{VmError, VmResult};
use crate::types::{TypeId, TypeRegistry};
use crate::variant::Variant;
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// A shared, mutable handle to a VM object.
pub type ObjectRc = Rc<RefCell<dyn Object>>;

/// Wraps a concrete object into a shared handle.
pub fn new_object<T: Object>(object: T) -> ObjectRc {
    Rc::new(RefCell::new(object))
}

/// Runs `f` against the concrete type behind an object handle.
pub fn with_object<T: Object, R>(
    object: &ObjectRc,
    f: impl FnOnce(&T) -> VmResult<R>,
) -> VmResult<R> {
    let guard = object.borrow();
    match guard.as_any().downcast_ref::<T>() {
        Some(concrete) => f(concrete),
        None => Err(VmError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: format!("type id {:?}", Object::type_id(&*guard)),
        }),
    }
}

/// Runs `f` against the concrete type behind an object handle, mutably.
pub fn with_object_mut<T: Object, R>(
    object: &ObjectRc,
    f: impl FnOnce(&mut T) -> VmResult<R>,
) -> VmResult<R> {
    let mut guard = object.borrow_mut();
    let type_id = Object::type_id(&*guard);
    match guard.as_any_mut().downcast_mut::<T>() {
        Some(concrete) => f(concrete),
        None => Err(VmError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: format!("type id {type_id:?}"),
        }),
    }
}

fn not_implemented<T>(operation: &'static str) -> VmResult<T> {
    Err(VmError::operator_not_implemented(operation))
}

/// The hook set every object type provides.
///
/// "Left"/"Right" shapes allow a primitive to sit on the left or right of a
/// mixed operation; "Inplace" shapes mutate the receiver. The plain binary
/// shapes return a fresh object.
pub trait Object: Any {
    /// The registered type of this object.
    fn type_id(&self) -> TypeId;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    // ---- unary ----

    fn negate(&mut self) -> VmResult<()> {
        not_implemented("negate")
    }

    fn negate_charge_estimator(&self) -> VmResult<ChargeAmount> {
        not_implemented("negate estimator")
    }

    // ---- add ----

    fn add(&self, _rhs: &ObjectRc) -> VmResult<ObjectRc> {
        not_implemented("add")
    }

    fn left_add(&self, _lhsv: &Variant) -> VmResult<Variant> {
        not_implemented("left_add")
    }

    fn right_add(&self, _rhsv: &Variant) -> VmResult<Variant> {
        not_implemented("right_add")
    }

    fn inplace_add(&mut self, _rhs: &ObjectRc) -> VmResult<()> {
        not_implemented("inplace_add")
    }

    fn inplace_right_add(&mut self, _rhsv: &Variant) -> VmResult<()> {
        not_implemented("inplace_right_add")
    }

    fn add_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("add estimator")
    }

    fn left_add_charge_estimator(&self, _lhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("left_add estimator")
    }

    fn right_add_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("right_add estimator")
    }

    fn inplace_add_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("inplace_add estimator")
    }

    fn inplace_right_add_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("inplace_right_add estimator")
    }

    // ---- subtract ----

    fn subtract(&self, _rhs: &ObjectRc) -> VmResult<ObjectRc> {
        not_implemented("subtract")
    }

    fn left_subtract(&self, _lhsv: &Variant) -> VmResult<Variant> {
        not_implemented("left_subtract")
    }

    fn right_subtract(&self, _rhsv: &Variant) -> VmResult<Variant> {
        not_implemented("right_subtract")
    }

    fn inplace_subtract(&mut self, _rhs: &ObjectRc) -> VmResult<()> {
        not_implemented("inplace_subtract")
    }

    fn inplace_right_subtract(&mut self, _rhsv: &Variant) -> VmResult<()> {
        not_implemented("inplace_right_subtract")
    }

    fn subtract_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("subtract estimator")
    }

    fn left_subtract_charge_estimator(&self, _lhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("left_subtract estimator")
    }

    fn right_subtract_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("right_subtract estimator")
    }

    fn inplace_subtract_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("inplace_subtract estimator")
    }

    fn inplace_right_subtract_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("inplace_right_subtract estimator")
    }

    // ---- multiply ----

    fn multiply(&self, _rhs: &ObjectRc) -> VmResult<ObjectRc> {
        not_implemented("multiply")
    }

    fn left_multiply(&self, _lhsv: &Variant) -> VmResult<Variant> {
        not_implemented("left_multiply")
    }

    fn right_multiply(&self, _rhsv: &Variant) -> VmResult<Variant> {
        not_implemented("right_multiply")
    }

    fn inplace_multiply(&mut self, _rhs: &ObjectRc) -> VmResult<()> {
        not_implemented("inplace_multiply")
    }

    fn inplace_right_multiply(&mut self, _rhsv: &Variant) -> VmResult<()> {
        not_implemented("inplace_right_multiply")
    }

    fn multiply_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("multiply estimator")
    }

    fn left_multiply_charge_estimator(&self, _lhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("left_multiply estimator")
    }

    fn right_multiply_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("right_multiply estimator")
    }

    fn inplace_multiply_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("inplace_multiply estimator")
    }

    fn inplace_right_multiply_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("inplace_right_multiply estimator")
    }

    // ---- divide ----

    fn divide(&self, _rhs: &ObjectRc) -> VmResult<ObjectRc> {
        not_implemented("divide")
    }

    fn left_divide(&self, _lhsv: &Variant) -> VmResult<Variant> {
        not_implemented("left_divide")
    }

    fn right_divide(&self, _rhsv: &Variant) -> VmResult<Variant> {
        not_implemented("right_divide")
    }

    fn inplace_divide(&mut self, _rhs: &ObjectRc) -> VmResult<()> {
        not_implemented("inplace_divide")
    }

    fn inplace_right_divide(&mut self, _rhsv: &Variant) -> VmResult<()> {
        not_implemented("inplace_right_divide")
    }

    fn divide_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("divide estimator")
    }

    fn left_divide_charge_estimator(&self, _lhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("left_divide estimator")
    }

    fn right_divide_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("right_divide estimator")
    }

    fn inplace_divide_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("inplace_divide estimator")
    }

    fn inplace_right_divide_charge_estimator(&self, _rhsv: &Variant) -> VmResult<ChargeAmount> {
        not_implemented("inplace_right_divide estimator")
    }

    // ---- relational ----

    fn is_equal(&self, _other: &ObjectRc) -> VmResult<bool> {
        not_implemented("is_equal")
    }

    fn is_not_equal(&self, _other: &ObjectRc) -> VmResult<bool> {
        not_implemented("is_not_equal")
    }

    fn is_less_than(&self, _other: &ObjectRc) -> VmResult<bool> {
        not_implemented("is_less_than")
    }

    fn is_less_than_or_equal(&self, _other: &ObjectRc) -> VmResult<bool> {
        not_implemented("is_less_than_or_equal")
    }

    fn is_greater_than(&self, _other: &ObjectRc) -> VmResult<bool> {
        not_implemented("is_greater_than")
    }

    fn is_greater_than_or_equal(&self, _other: &ObjectRc) -> VmResult<bool> {
        not_implemented("is_greater_than_or_equal")
    }

    fn is_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("is_equal estimator")
    }

    fn is_not_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("is_not_equal estimator")
    }

    fn is_less_than_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("is_less_than estimator")
    }

    fn is_less_than_or_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("is_less_than_or_equal estimator")
    }

    fn is_greater_than_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        not_implemented("is_greater_than estimator")
    }

    fn is_greater_than_or_equal_charge_estimator(
        &self,
        _other: &ObjectRc,
    ) -> VmResult<ChargeAmount> {
        not_implemented("is_greater_than_or_equal estimator")
    }

    // ---- indexing ----

    fn get_indexed_value(&self, _keys: &[Variant]) -> VmResult<Variant> {
        not_implemented("get_indexed_value")
    }

    fn set_indexed_value(&mut self, _keys: &[Variant], _value: Variant) -> VmResult<()> {
        not_implemented("set_indexed_value")
    }

    // ---- serialization ----

    fn serialize_to(&self, _writer: &mut ValueWriter) -> VmResult<()> {
        Err(VmError::serialization("serializer not defined"))
    }

    /// Rebuilds the object's fields from the stream. Container types use the
    /// registry to construct their element objects.
    fn deserialize_from(&mut self, _reader: &mut ValueReader, _registry: &TypeRegistry) -> VmResult<()> {
        Err(VmError::serialization("deserializer not defined"))
    }

    // ---- hashing ----

    /// Hash for use as a map key. The default hashes the object's identity,
    /// so types wanting value semantics as keys must override it.
    fn hash_code(&self) -> u64 {
        self.as_any() as *const dyn Any as *const () as usize as u64
    }
}

/// Null-safe object equality: `null == null` is true, `null == non-null` is
/// false, and only two non-null operands invoke user code.
pub fn objects_equal(lhs: Option<&ObjectRc>, rhs: Option<&ObjectRc>) -> VmResult<bool> {
    match (lhs, rhs) {
        (Some(l), Some(r)) => l.borrow().is_equal(r),
        (None, None) => Ok(true),
        _ => Ok(false),
    }
}

/// Null-safe object inequality, the mirror of [`objects_equal`].
pub fn objects_not_equal(lhs: Option<&ObjectRc>, rhs: Option<&ObjectRc>) -> VmResult<bool> {
    match (lhs, rhs) {
        (Some(l), Some(r)) => l.borrow().is_not_equal(r),
        (None, None) => Ok(false),
        _ => Ok(true),
    }
}

/// Structural variant equality, used by the container types: primitives
/// compare by type and value, objects through the contract, nulls per the
/// null policy.
pub fn variants_equal(lhs: &Variant, rhs: &Variant) -> VmResult<bool> {
    if lhs.type_id != rhs.type_id {
        return Ok(false);
    }
    if lhs.is_primitive() {
        return crate::handlers::arith::primitive_compare(
            crate::handlers::arith::RelOp::Equal,
            lhs.type_id,
            lhs.primitive_value(),
            rhs.primitive_value(),
        );
    }
    objects_equal(lhs.object_ref(), rhs.object_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::type_ids;

    struct Bare;

    impl Object for Bare {
        fn type_id(&self) -> TypeId {
            type_ids::NUM_RESERVED
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn defaults_raise_operator_not_implemented() {
        let a = new_object(Bare);
        let b = new_object(Bare);
        assert!(matches!(
            a.borrow().add(&b),
            Err(VmError::OperatorNotImplemented { operation: "add" })
        ));
        assert!(matches!(
            a.borrow().is_less_than(&b),
            Err(VmError::OperatorNotImplemented { .. })
        ));
        let mut writer = ValueWriter::new();
        assert!(matches!(
            a.borrow().serialize_to(&mut writer),
            Err(VmError::SerializationFailed { .. })
        ));
    }

    #[test]
    fn null_equality_never_invokes_user_code() {
        let a = new_object(Bare);
        assert!(objects_equal(None, None).unwrap());
        assert!(!objects_equal(Some(&a), None).unwrap());
        assert!(objects_not_equal(None, Some(&a)).unwrap());
        // Both sides non-null reach the (unimplemented) contract hook.
        let b = new_object(Bare);
        assert!(objects_equal(Some(&a), Some(&b)).is_err());
    }

    #[test]
    fn identity_hash_differs_per_object() {
        let a = new_object(Bare);
        let b = new_object(Bare);
        assert_ne!(a.borrow().hash_code(), b.borrow().hash_code());
    }
}
