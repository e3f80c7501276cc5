//! The built-in object library.

pub mod address;
pub mod array;
pub mod buffer;
pub mod fixed128;
pub mod map;
pub mod state;
pub mod string;
pub mod user_object;

pub use address::Address;
pub use array::Array;
pub use buffer::Buffer;
pub use fixed128::Fixed128;
pub use map::Map;
pub use state::{ShardedStateObject, StateObject};
pub use string::Str;
pub use user_object::UserObject;

use crate::error::{VmError, VmResult};
use crate::types::type_ids;
use crate::variant::Variant;

/// Extracts a container index from a key variant: any integral type,
/// rejected when negative.
pub(crate) fn index_from_variant(key: &Variant) -> VmResult<usize> {
    let p = key.primitive_value();
    let signed = match key.type_id {
        type_ids::INT8 => i64::from(p.as_i8()),
        type_ids::UINT8 => return Ok(usize::from(p.as_u8())),
        type_ids::INT16 => i64::from(p.as_i16()),
        type_ids::UINT16 => return Ok(usize::from(p.as_u16())),
        type_ids::INT32 => i64::from(p.as_i32()),
        type_ids::UINT32 => return Ok(p.as_u32() as usize),
        type_ids::INT64 => p.as_i64(),
        type_ids::UINT64 => return Ok(p.as_u64() as usize),
        other => {
            return Err(VmError::TypeMismatch {
                expected: "an integral index".to_string(),
                actual: format!("type id {other}"),
            })
        }
    };
    if signed < 0 {
        return Err(VmError::NegativeIndex);
    }
    Ok(signed as usize)
}
