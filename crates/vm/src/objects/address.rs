//! The built-in address object: a 32-byte opaque identity with ordered
//! comparison.

use crate::charge::ChargeAmount;
use crate::error::{VmError, VmResult};
use crate::object::{with_object, Object, ObjectRc};
use crate::types::{type_ids, TypeId, TypeRegistry};
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;
use xxhash_rust::xxh3::xxh3_64;

/// A 32-byte account/contract identity.
#[derive(Default)]
pub struct Address {
    bytes: [u8; Self::RAW_BYTES_SIZE],
}

impl Address {
    pub const RAW_BYTES_SIZE: usize = 32;

    pub fn new(bytes: [u8; Self::RAW_BYTES_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parses the base-16 display form.
    pub fn parse(text: &str) -> VmResult<Self> {
        let decoded = hex::decode(text)
            .map_err(|_| VmError::runtime("unable to parse address"))?;
        Self::from_bytes(&decoded)
    }

    pub fn from_bytes(data: &[u8]) -> VmResult<Self> {
        if data.len() != Self::RAW_BYTES_SIZE {
            return Err(VmError::runtime("invalid address format"));
        }
        let mut bytes = [0u8; Self::RAW_BYTES_SIZE];
        bytes.copy_from_slice(data);
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8; Self::RAW_BYTES_SIZE] {
        &self.bytes
    }

    /// The base-16 display form.
    pub fn display(&self) -> String {
        hex::encode(self.bytes)
    }

    fn compare(&self, other: &ObjectRc) -> VmResult<std::cmp::Ordering> {
        with_object::<Address, _>(other, |rhs| Ok(self.bytes.cmp(&rhs.bytes)))
    }
}

impl Object for Address {
    fn type_id(&self) -> TypeId {
        type_ids::ADDRESS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.compare(other)? == std::cmp::Ordering::Equal)
    }

    fn is_not_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.compare(other)? != std::cmp::Ordering::Equal)
    }

    fn is_less_than(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.compare(other)? == std::cmp::Ordering::Less)
    }

    fn is_less_than_or_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.compare(other)? != std::cmp::Ordering::Greater)
    }

    fn is_greater_than(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.compare(other)? == std::cmp::Ordering::Greater)
    }

    fn is_greater_than_or_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.compare(other)? != std::cmp::Ordering::Less)
    }

    fn is_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn is_not_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn is_less_than_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn is_less_than_or_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn is_greater_than_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn is_greater_than_or_equal_charge_estimator(
        &self,
        _other: &ObjectRc,
    ) -> VmResult<ChargeAmount> {
        Ok(1)
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
        let data = reader.read_bin()?;
        *self = Self::from_bytes(&data)?;
        Ok(())
    }

    fn hash_code(&self) -> u64 {
        xxh3_64(&self.bytes)
    }
}
