//! The built-in array object.
//!
//! `Array<T>` is a template instantiation: the concrete element type is
//! recorded in the instantiation's type info and on the object itself, and
//! the index operator yields that element type. Equality is structural,
//! recursing through the contract for object elements.

use crate::charge::ChargeAmount;
use crate::error::{VmError, VmResult};
use crate::object::{variants_equal, with_object, Object, ObjectRc};
use crate::objects::index_from_variant;
use crate::primitive::Primitive;
use crate::serialize::{read_variant, write_variant};
use crate::types::{is_primitive, TypeId, TypeRegistry};
use crate::variant::Variant;
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;

/// A dynamically sized ordered sequence of one element type.
pub struct Array {
    type_id: TypeId,
    element_type_id: TypeId,
    elements: Vec<Variant>,
}

impl Array {
    /// Creates an array of `length` default-valued elements.
    pub fn new(type_id: TypeId, element_type_id: TypeId, length: usize) -> Self {
        let default = if is_primitive(element_type_id) {
            Variant::primitive(Primitive::zero(), element_type_id)
        } else {
            Variant::null_object(element_type_id)
        };
        Self {
            type_id,
            element_type_id,
            elements: vec![default; length],
        }
    }

    pub fn with_elements(type_id: TypeId, element_type_id: TypeId, elements: Vec<Variant>) -> Self {
        Self {
            type_id,
            element_type_id,
            elements,
        }
    }

    pub fn element_type_id(&self) -> TypeId {
        self.element_type_id
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Variant] {
        &self.elements
    }

    pub fn append(&mut self, value: Variant) {
        self.elements.push(value);
    }

    fn check_index(&self, keys: &[Variant]) -> VmResult<usize> {
        let [key] = keys else {
            return Err(VmError::runtime("array access takes exactly one index"));
        };
        let index = index_from_variant(key)?;
        if index >= self.elements.len() {
            return Err(VmError::IndexOutOfBounds {
                index,
                length: self.elements.len(),
            });
        }
        Ok(index)
    }
}

impl Object for Array {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn get_indexed_value(&self, keys: &[Variant]) -> VmResult<Variant> {
        let index = self.check_index(keys)?;
        Ok(self.elements[index].clone())
    }

    fn set_indexed_value(&mut self, keys: &[Variant], value: Variant) -> VmResult<()> {
        let index = self.check_index(keys)?;
        self.elements[index] = value;
        Ok(())
    }

    fn is_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        with_object::<Array, _>(other, |rhs| {
            if self.element_type_id != rhs.element_type_id
                || self.elements.len() != rhs.elements.len()
            {
                return Ok(false);
            }
            for (a, b) in self.elements.iter().zip(rhs.elements.iter()) {
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

    fn is_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1 + self.elements.len() as ChargeAmount)
    }

    fn is_not_equal_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn serialize_to(&self, writer: &mut ValueWriter) -> VmResult<()> {
        writer.write_array_header(self.elements.len());
        for element in &self.elements {
            write_variant(element, writer)?;
        }
        Ok(())
    }

    fn deserialize_from(
        &mut self,
        reader: &mut ValueReader,
        registry: &TypeRegistry,
    ) -> VmResult<()> {
        let length = reader.read_array_header()?;
        let mut elements = Vec::with_capacity(length);
        for _ in 0..length {
            elements.push(read_variant(self.element_type_id, reader, registry)?);
        }
        self.elements = elements;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::new_object;
    use crate::types::type_ids;

    const ARRAY_TID: TypeId = type_ids::NUM_RESERVED;

    fn int32(value: i32) -> Variant {
        Variant::primitive(Primitive::from_i32(value), type_ids::INT32)
    }

    #[test]
    fn indexing_returns_the_element_type() {
        let array = Array::with_elements(ARRAY_TID, type_ids::INT32, vec![int32(5), int32(7)]);
        let value = array.get_indexed_value(&[int32(1)]).unwrap();
        assert_eq!(value.type_id, type_ids::INT32);
        assert_eq!(value.primitive_value().as_i32(), 7);
    }

    #[test]
    fn equality_is_structural() {
        let a = new_object(Array::with_elements(
            ARRAY_TID,
            type_ids::INT32,
            vec![int32(1), int32(2)],
        ));
        let b = new_object(Array::with_elements(
            ARRAY_TID,
            type_ids::INT32,
            vec![int32(1), int32(2)],
        ));
        let c = new_object(Array::with_elements(
            ARRAY_TID,
            type_ids::INT32,
            vec![int32(1), int32(3)],
        ));
        assert!(a.borrow().is_equal(&b).unwrap());
        assert!(a.borrow().is_not_equal(&c).unwrap());
    }

    #[test]
    fn serialization_round_trip() {
        let registry = TypeRegistry::new();
        let original =
            Array::with_elements(ARRAY_TID, type_ids::INT32, vec![int32(3), int32(-4)]);
        let mut writer = ValueWriter::new();
        original.serialize_to(&mut writer).unwrap();

        let mut restored = Array::new(ARRAY_TID, type_ids::INT32, 0);
        let mut reader = ValueReader::new(writer.into_bytes());
        restored.deserialize_from(&mut reader, &registry).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.elements()[1].primitive_value().as_i32(), -4);
    }
}
