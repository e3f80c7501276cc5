//! Persistent state library types.
//!
//! `State<T>` binds one persistent value to a key; `ShardedState<T>` binds a
//! family of values under a key prefix. Both read and write through the
//! host's I/O observer using the shared wire encoding, and both treat a
//! `PermissionDenied` read as "not present".

use crate::error::{VmError, VmResult};
use crate::io_observer::IoStatus;
use crate::object::Object;
use crate::types::{TypeId, TypeRegistry};
use crate::variant::Variant;
use crate::vm::Vm;
use ember_io::{ValueReader, ValueWriter};
use std::any::Any;

/// A persistent value bound to a single storage key.
pub struct StateObject {
    type_id: TypeId,
    value_type_id: TypeId,
    name: String,
}

impl StateObject {
    pub fn new(type_id: TypeId, value_type_id: TypeId, name: String) -> Self {
        Self {
            type_id,
            value_type_id,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type_id(&self) -> TypeId {
        self.value_type_id
    }
}

impl Object for StateObject {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A family of persistent values bound to a storage-key prefix.
pub struct ShardedStateObject {
    type_id: TypeId,
    value_type_id: TypeId,
    name: String,
}

impl ShardedStateObject {
    pub fn new(type_id: TypeId, value_type_id: TypeId, name: String) -> Self {
        Self {
            type_id,
            value_type_id,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type_id(&self) -> TypeId {
        self.value_type_id
    }

    /// Storage key for one shard.
    pub fn shard_key(&self, key: &str) -> String {
        format!("{}.{}", self.name, key)
    }
}

impl Object for ShardedStateObject {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Reads a raw value from the bound observer. `Ok(None)` means the key is
/// not present. A `BufferTooSmall` response carries the required size, so
/// the value is fetched with a second, correctly sized call.
pub(crate) fn observer_read(vm: &Vm, key: &str) -> VmResult<Option<Vec<u8>>> {
    let observer = vm
        .io_observer()
        .ok_or_else(|| VmError::runtime("no I/O observer is attached"))?;

    let mut size: u64 = 0;
    let status = observer.borrow().read(key, &mut [], &mut size);
    match status {
        IoStatus::Ok => Ok(Some(Vec::new())),
        IoStatus::PermissionDenied => Ok(None),
        IoStatus::BufferTooSmall => {
            let mut buffer = vec![0u8; size as usize];
            match observer.borrow().read(key, &mut buffer, &mut size) {
                IoStatus::Ok => {
                    buffer.truncate(size as usize);
                    Ok(Some(buffer))
                }
                _ => Err(VmError::runtime(format!("failed to read state '{key}'"))),
            }
        }
        IoStatus::Error => Err(VmError::runtime(format!("failed to read state '{key}'"))),
    }
}

/// Writes a raw value through the bound observer.
pub(crate) fn observer_write(vm: &Vm, key: &str, data: &[u8]) -> VmResult<()> {
    let observer = vm
        .io_observer()
        .ok_or_else(|| VmError::runtime("no I/O observer is attached"))?;
    let status = observer.borrow_mut().write(key, data);
    match status {
        IoStatus::Ok => Ok(()),
        _ => Err(VmError::runtime(format!("failed to write state '{key}'"))),
    }
}

/// Decodes a stored value of the given type.
pub(crate) fn decode_state_value(
    value_type_id: TypeId,
    data: Vec<u8>,
    registry: &TypeRegistry,
) -> VmResult<Variant> {
    let mut reader = ValueReader::new(data);
    crate::serialize::read_variant(value_type_id, &mut reader, registry)
}

/// Encodes a value for storage.
pub(crate) fn encode_state_value(value: &Variant) -> VmResult<Vec<u8>> {
    let mut writer = ValueWriter::new();
    crate::serialize::write_variant(value, &mut writer)?;
    Ok(writer.into_bytes())
}
