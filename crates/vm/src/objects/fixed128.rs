//! The 128-bit fixed-point object.
//!
//! Too wide for a primitive word, `Fixed128` lives behind an object handle;
//! literals load from the executable's large-constant pool.

use crate::charge::ChargeAmount;
use crate::error::{VmError, VmResult};
use crate::fixed::Fx128;
use crate::object::{new_object, with_object, Object, ObjectRc};
use crate::types::{type_ids, TypeId, TypeRegistry};
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;
use xxhash_rust::xxh3::xxh3_64;

/// A 64.64 fixed-point value.
#[derive(Default)]
pub struct Fixed128 {
    value: Fx128,
}

impl Fixed128 {
    pub fn new(value: Fx128) -> Self {
        Self { value }
    }

    pub fn value(&self) -> Fx128 {
        self.value
    }

    fn rhs_value(other: &ObjectRc) -> VmResult<Fx128> {
        with_object::<Fixed128, _>(other, |rhs| Ok(rhs.value))
    }
}

impl Object for Fixed128 {
    fn type_id(&self) -> TypeId {
        type_ids::FIXED128
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn negate(&mut self) -> VmResult<()> {
        self.value = self.value.wrapping_neg();
        Ok(())
    }

    fn negate_charge_estimator(&self) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn add(&self, rhs: &ObjectRc) -> VmResult<ObjectRc> {
        let other = Self::rhs_value(rhs)?;
        Ok(new_object(Fixed128::new(self.value.wrapping_add(other))))
    }

    fn subtract(&self, rhs: &ObjectRc) -> VmResult<ObjectRc> {
        let other = Self::rhs_value(rhs)?;
        Ok(new_object(Fixed128::new(self.value.wrapping_sub(other))))
    }

    fn multiply(&self, rhs: &ObjectRc) -> VmResult<ObjectRc> {
        let other = Self::rhs_value(rhs)?;
        Ok(new_object(Fixed128::new(self.value.wrapping_mul(other))))
    }

    fn divide(&self, rhs: &ObjectRc) -> VmResult<ObjectRc> {
        let other = Self::rhs_value(rhs)?;
        let result = self
            .value
            .checked_div(other)
            .ok_or(VmError::DivisionByZero)?;
        Ok(new_object(Fixed128::new(result)))
    }

    fn inplace_add(&mut self, rhs: &ObjectRc) -> VmResult<()> {
        self.value = self.value.wrapping_add(Self::rhs_value(rhs)?);
        Ok(())
    }

    fn inplace_subtract(&mut self, rhs: &ObjectRc) -> VmResult<()> {
        self.value = self.value.wrapping_sub(Self::rhs_value(rhs)?);
        Ok(())
    }

    fn inplace_multiply(&mut self, rhs: &ObjectRc) -> VmResult<()> {
        self.value = self.value.wrapping_mul(Self::rhs_value(rhs)?);
        Ok(())
    }

    fn inplace_divide(&mut self, rhs: &ObjectRc) -> VmResult<()> {
        self.value = self
            .value
            .checked_div(Self::rhs_value(rhs)?)
            .ok_or(VmError::DivisionByZero)?;
        Ok(())
    }

    fn add_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn subtract_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn multiply_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(2)
    }

    fn divide_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(2)
    }

    fn inplace_add_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn inplace_subtract_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1)
    }

    fn inplace_multiply_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(2)
    }

    fn inplace_divide_charge_estimator(&self, _rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(2)
    }

    fn is_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.value == Self::rhs_value(other)?)
    }

    fn is_not_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.value != Self::rhs_value(other)?)
    }

    fn is_less_than(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.value < Self::rhs_value(other)?)
    }

    fn is_less_than_or_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.value <= Self::rhs_value(other)?)
    }

    fn is_greater_than(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.value > Self::rhs_value(other)?)
    }

    fn is_greater_than_or_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(self.value >= Self::rhs_value(other)?)
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
        writer.write_bin(&self.value.to_base().to_be_bytes());
        Ok(())
    }

    fn deserialize_from(
        &mut self,
        reader: &mut ValueReader,
        _registry: &TypeRegistry,
    ) -> VmResult<()> {
        let data = reader.read_bin()?;
        let bytes: [u8; 16] = data
            .as_slice()
            .try_into()
            .map_err(|_| VmError::serialization("fixed128 payload must be 16 bytes"))?;
        self.value = Fx128::from_base(i128::from_be_bytes(bytes));
        Ok(())
    }

    fn hash_code(&self) -> u64 {
        xxh3_64(&self.value.to_base().to_be_bytes())
    }
}
