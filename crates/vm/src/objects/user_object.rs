//! Instances of classes defined by the executable.

use crate::error::{VmError, VmResult};
use crate::executable::Variable;
use crate::object::{variants_equal, with_object, Object, ObjectRc};
use crate::primitive::Primitive;
use crate::types::{is_primitive, TypeId};
use crate::variant::Variant;
use std::any::Any;

/// Member-variable storage for a user-defined type. Behaviour lives in the
/// type's member functions, which execute as ordinary bytecode with `self`
/// bound to one of these.
pub struct UserObject {
    type_id: TypeId,
    variables: Vec<Variant>,
}

impl UserObject {
    /// Creates an instance with default-initialised members: primitive
    /// members are zero, object members are typed nulls.
    pub fn new(type_id: TypeId, member_variables: &[Variable]) -> Self {
        let variables = member_variables
            .iter()
            .map(|member| {
                if is_primitive(member.type_id) {
                    Variant::primitive(Primitive::zero(), member.type_id)
                } else {
                    Variant::null_object(member.type_id)
                }
            })
            .collect();
        Self { type_id, variables }
    }

    pub fn variable(&self, index: u16) -> VmResult<&Variant> {
        self.variables
            .get(usize::from(index))
            .ok_or_else(|| VmError::runtime("member variable index out of range"))
    }

    pub fn variable_mut(&mut self, index: u16) -> VmResult<&mut Variant> {
        self.variables
            .get_mut(usize::from(index))
            .ok_or_else(|| VmError::runtime("member variable index out of range"))
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

impl Object for UserObject {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        with_object::<UserObject, _>(other, |rhs| {
            if self.type_id != rhs.type_id || self.variables.len() != rhs.variables.len() {
                return Ok(false);
            }
            for (a, b) in self.variables.iter().zip(rhs.variables.iter()) {
                if !variants_equal(a, b)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    fn is_not_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(!self.is_equal(other)?)
    }

    fn is_equal_charge_estimator(
        &self,
        _other: &ObjectRc,
    ) -> VmResult<crate::charge::ChargeAmount> {
        Ok(1 + self.variables.len() as crate::charge::ChargeAmount)
    }

    fn is_not_equal_charge_estimator(
        &self,
        other: &ObjectRc,
    ) -> VmResult<crate::charge::ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::type_ids;

    #[test]
    fn members_default_by_kind() {
        let members = vec![
            Variable {
                name: "count".to_string(),
                type_id: type_ids::INT32,
            },
            Variable {
                name: "label".to_string(),
                type_id: type_ids::STRING,
            },
        ];
        let object = UserObject::new(100, &members);
        assert_eq!(object.variable_count(), 2);
        assert_eq!(object.variable(0).unwrap().primitive_value().as_i32(), 0);
        assert!(object.variable(1).unwrap().is_null_object());
        assert!(object.variable(2).is_err());
    }
}
