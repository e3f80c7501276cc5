//! The built-in byte-array object.

use crate::charge::ChargeAmount;
use crate::error::{VmError, VmResult};
use crate::object::{with_object, Object, ObjectRc};
use crate::objects::index_from_variant;
use crate::primitive::Primitive;
use crate::types::{type_ids, TypeId, TypeRegistry};
use crate::variant::Variant;
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;
use xxhash_rust::xxh3::xxh3_64;

/// A mutable byte array with u8 element access.
pub struct Buffer {
    type_id: TypeId,
    bytes: Vec<u8>,
}

impl Buffer {
    /// Creates a zero-filled buffer of the given length.
    pub fn new(type_id: TypeId, length: usize) -> Self {
        Self {
            type_id,
            bytes: vec![0u8; length],
        }
    }

    pub fn from_bytes(type_id: TypeId, bytes: Vec<u8>) -> Self {
        Self { type_id, bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn check_index(&self, keys: &[Variant]) -> VmResult<usize> {
        let [key] = keys else {
            return Err(VmError::runtime("buffer access takes exactly one index"));
        };
        let index = index_from_variant(key)?;
        if index >= self.bytes.len() {
            return Err(VmError::IndexOutOfBounds {
                index,
                length: self.bytes.len(),
            });
        }
        Ok(index)
    }
}

impl Object for Buffer {
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
        Ok(Variant::primitive(
            Primitive::from_u8(self.bytes[index]),
            type_ids::UINT8,
        ))
    }

    fn set_indexed_value(&mut self, keys: &[Variant], value: Variant) -> VmResult<()> {
        let index = self.check_index(keys)?;
        self.bytes[index] = value.primitive_value().as_u8();
        Ok(())
    }

    fn is_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        with_object::<Buffer, _>(other, |rhs| Ok(self.bytes == rhs.bytes))
    }

    fn is_not_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(!self.is_equal(other)?)
    }

    fn is_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1 + self.bytes.len() as ChargeAmount / 64)
    }

    fn is_not_equal_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn serialize_to(&self, writer: &mut ValueWriter) -> VmResult<()> {
        writer.write_bin(&self.bytes);
        Ok(())
    }

    fn deserialize_from(
        &mut self,
        reader: &mut ValueReader,
        _registry: &TypeRegistry,
    ) -> VmResult<()> {
        self.bytes = reader.read_bin()?;
        Ok(())
    }

    fn hash_code(&self) -> u64 {
        xxh3_64(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TID: TypeId = type_ids::NUM_RESERVED;

    #[test]
    fn indexing_is_bounds_checked() {
        let mut buffer = Buffer::new(TID, 4);
        let key = Variant::primitive(Primitive::from_i32(2), type_ids::INT32);
        buffer
            .set_indexed_value(
                std::slice::from_ref(&key),
                Variant::primitive(Primitive::from_u8(0xaa), type_ids::UINT8),
            )
            .unwrap();
        let value = buffer.get_indexed_value(std::slice::from_ref(&key)).unwrap();
        assert_eq!(value.primitive_value().as_u8(), 0xaa);

        let out = Variant::primitive(Primitive::from_i32(4), type_ids::INT32);
        assert!(matches!(
            buffer.get_indexed_value(std::slice::from_ref(&out)),
            Err(VmError::IndexOutOfBounds { index: 4, length: 4 })
        ));

        let negative = Variant::primitive(Primitive::from_i32(-1), type_ids::INT32);
        assert!(matches!(
            buffer.get_indexed_value(std::slice::from_ref(&negative)),
            Err(VmError::NegativeIndex)
        ));
    }
}
