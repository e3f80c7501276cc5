//! The built-in map object.
//!
//! `Map<K, V>` is an unordered mapping with unique keys. Key identity uses
//! the contract's `hash_code` as a prefilter and `is_equal` as the decider,
//! so object keys with value semantics must implement both.

use crate::charge::ChargeAmount;
use crate::error::{VmError, VmResult};
use crate::object::{variants_equal, with_object, Object, ObjectRc};
use crate::serialize::{read_variant, write_variant};
use crate::types::{TypeId, TypeRegistry};
use crate::variant::Variant;
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;
use xxhash_rust::xxh3::xxh3_64;

/// An unordered key→value mapping.
pub struct Map {
    type_id: TypeId,
    key_type_id: TypeId,
    value_type_id: TypeId,
    entries: Vec<(u64, Variant, Variant)>,
}

impl Map {
    pub fn new(type_id: TypeId, key_type_id: TypeId, value_type_id: TypeId) -> Self {
        Self {
            type_id,
            key_type_id,
            value_type_id,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn hash_key(key: &Variant) -> u64 {
        if key.is_primitive() {
            let mut seed = [0u8; 10];
            seed[..2].copy_from_slice(&key.type_id.to_le_bytes());
            seed[2..].copy_from_slice(&key.primitive_value().bits().to_le_bytes());
            xxh3_64(&seed)
        } else {
            match key.object_ref() {
                Some(object) => object.borrow().hash_code(),
                None => 0,
            }
        }
    }

    fn position(&self, hash: u64, key: &Variant) -> VmResult<Option<usize>> {
        for (index, (entry_hash, entry_key, _)) in self.entries.iter().enumerate() {
            if *entry_hash == hash && variants_equal(entry_key, key)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &Variant) -> VmResult<Option<&Variant>> {
        let hash = Self::hash_key(key);
        Ok(self.position(hash, key)?.map(|i| &self.entries[i].2))
    }

    /// Inserts or replaces a value, keeping keys unique.
    pub fn insert(&mut self, key: Variant, value: Variant) -> VmResult<()> {
        let hash = Self::hash_key(&key);
        match self.position(hash, &key)? {
            Some(index) => self.entries[index].2 = value,
            None => self.entries.push((hash, key, value)),
        }
        Ok(())
    }
}

impl Object for Map {
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
        let [key] = keys else {
            return Err(VmError::runtime("map access takes exactly one key"));
        };
        match self.get(key)? {
            Some(value) => Ok(value.clone()),
            None => Err(VmError::runtime("map key not found")),
        }
    }

    fn set_indexed_value(&mut self, keys: &[Variant], value: Variant) -> VmResult<()> {
        let [key] = keys else {
            return Err(VmError::runtime("map access takes exactly one key"));
        };
        self.insert(key.clone(), value)
    }

    fn is_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        with_object::<Map, _>(other, |rhs| {
            if self.key_type_id != rhs.key_type_id
                || self.value_type_id != rhs.value_type_id
                || self.entries.len() != rhs.entries.len()
            {
                return Ok(false);
            }
            for (hash, key, value) in &self.entries {
                match rhs.position(*hash, key)? {
                    Some(index) => {
                        if !variants_equal(value, &rhs.entries[index].2)? {
                            return Ok(false);
                        }
                    }
                    None => return Ok(false),
                }
            }
            Ok(true)
        })
    }

    fn is_not_equal(&self, other: &ObjectRc) -> VmResult<bool> {
        Ok(!self.is_equal(other)?)
    }

    fn is_equal_charge_estimator(&self, _other: &ObjectRc) -> VmResult<ChargeAmount> {
        Ok(1 + self.entries.len() as ChargeAmount)
    }

    fn is_not_equal_charge_estimator(&self, other: &ObjectRc) -> VmResult<ChargeAmount> {
        self.is_equal_charge_estimator(other)
    }

    fn serialize_to(&self, writer: &mut ValueWriter) -> VmResult<()> {
        writer.write_map_header(self.entries.len());
        for (_, key, value) in &self.entries {
            write_variant(key, writer)?;
            write_variant(value, writer)?;
        }
        Ok(())
    }

    fn deserialize_from(
        &mut self,
        reader: &mut ValueReader,
        registry: &TypeRegistry,
    ) -> VmResult<()> {
        let length = reader.read_map_header()?;
        self.entries.clear();
        for _ in 0..length {
            let key = read_variant(self.key_type_id, reader, registry)?;
            let value = read_variant(self.value_type_id, reader, registry)?;
            self.insert(key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::new_object;
    use crate::objects::string::Str;
    use crate::primitive::Primitive;
    use crate::types::type_ids;

    const MAP_TID: TypeId = type_ids::NUM_RESERVED;

    fn str_key(text: &str) -> Variant {
        Variant::object(new_object(Str::new(text)), type_ids::STRING)
    }

    fn int32(value: i32) -> Variant {
        Variant::primitive(Primitive::from_i32(value), type_ids::INT32)
    }

    #[test]
    fn keys_are_unique_by_value() {
        let mut map = Map::new(MAP_TID, type_ids::STRING, type_ids::INT32);
        map.insert(str_key("a"), int32(1)).unwrap();
        map.insert(str_key("a"), int32(2)).unwrap();
        assert_eq!(map.len(), 1);
        // Distinct string objects with equal contents hit the same slot.
        let value = map.get(&str_key("a")).unwrap().unwrap();
        assert_eq!(value.primitive_value().as_i32(), 2);
    }

    #[test]
    fn missing_key_on_read_is_an_error() {
        let map = Map::new(MAP_TID, type_ids::STRING, type_ids::INT32);
        assert!(map.get_indexed_value(&[str_key("absent")]).is_err());
    }

    #[test]
    fn serialization_round_trip() {
        let registry = TypeRegistry::new();
        let mut original = Map::new(MAP_TID, type_ids::STRING, type_ids::INT32);
        original.insert(str_key("x"), int32(10)).unwrap();
        original.insert(str_key("y"), int32(20)).unwrap();

        let mut writer = ValueWriter::new();
        original.serialize_to(&mut writer).unwrap();

        let mut restored = Map::new(MAP_TID, type_ids::STRING, type_ids::INT32);
        let mut reader = ValueReader::new(writer.into_bytes());
        restored.deserialize_from(&mut reader, &registry).unwrap();
        assert_eq!(restored.len(), 2);
        let value = restored.get(&str_key("y")).unwrap().unwrap();
        assert_eq!(value.primitive_value().as_i32(), 20);
    }
}
