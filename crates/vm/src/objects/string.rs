//! The built-in string object.
//!
//! Strings are immutable UTF-8 values. The VM interns one `Str` per
//! executable string-pool entry, so identical literals share an object.

use crate::charge::ChargeAmount;
use crate::error::VmResult;
use crate::object::{with_object, Object, ObjectRc};
use crate::types::{type_ids, TypeId, TypeRegistry};
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;
use xxhash_rust::xxh3::xxh3_64;

/// An immutable string value.
pub struct Str {
    value: String,
}

impl Str {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Number of unicode scalar values, as reported by `length()`.
    pub fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn compare(&self, other: &ObjectRc) -> VmResult<std::cmp::Ordering> {
        with_object::<Str, _>(other, |rhs| Ok(self.value.as_str().cmp(rhs.value())))
    }
}

impl Object for Str {
    fn type_id(&self) -> TypeId {
        type_ids::STRING
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn add(&self, rhs: &ObjectRc) -> VmResult<ObjectRc> {
        with_object::<Str, _>(rhs, |other| {
            let mut joined = String::with_capacity(self.value.len() + other.value.len());
            joined.push_str(&self.value);
            joined.push_str(&other.value);
            Ok(crate::object::new_object(Str::new(joined)))
        })
    }

    fn add_charge_estimator(&self, rhs: &ObjectRc) -> VmResult<ChargeAmount> {
        let other_len = with_object::<Str, _>(rhs, |other| Ok(other.value.len()))?;
        Ok(1 + (self.value.len() + other_len) as ChargeAmount / 16)
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
        Ok(1 + self.value.len() as ChargeAmount / 16)
    }

    fn is_not_equal_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn is_less_than_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn is_less_than_or_equal_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn is_greater_than_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn is_greater_than_or_equal_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn serialize_to(&self, writer: &mut ValueWriter) -> VmResult<()> {
        writer.write_str(&self.value);
        Ok(())
    }

    fn deserialize_from(
        &mut self,
        reader: &mut ValueReader,
        _registry: &TypeRegistry,
    ) -> VmResult<()> {
        self.value = reader.read_str()?;
        Ok(())
    }

    fn hash_code(&self) -> u64 {
        xxh3_64(self.value.as_bytes())
    }
}
