//! Variant ↔ tagged-stream conversion.
//!
//! The single place that maps typed values onto the wire: the state library,
//! container serialization, and the engine's parameter path all route
//! through these two functions so every producer and consumer agrees on the
//! encoding. Fixed-point scalars travel as their raw base integers.

use crate::error::{VmError, VmResult};
use crate::fixed::{Fx32, Fx64};
use crate::primitive::Primitive;
use crate::types::{is_primitive, type_ids, TypeId, TypeRegistry};
use crate::variant::Variant;
use ember_io::{ValueReader, ValueTag, ValueWriter};

/// Writes one variant to the stream.
pub fn write_variant(variant: &Variant, writer: &mut ValueWriter) -> VmResult<()> {
    if is_primitive(variant.type_id) {
        let p = variant.primitive_value();
        match variant.type_id {
            type_ids::BOOL => writer.write_bool(p.as_bool()),
            type_ids::INT8 => writer.write_i8(p.as_i8()),
            type_ids::UINT8 => writer.write_u8(p.as_u8()),
            type_ids::INT16 => writer.write_i16(p.as_i16()),
            type_ids::UINT16 => writer.write_u16(p.as_u16()),
            type_ids::INT32 => writer.write_i32(p.as_i32()),
            type_ids::UINT32 => writer.write_u32(p.as_u32()),
            type_ids::INT64 => writer.write_i64(p.as_i64()),
            type_ids::UINT64 => writer.write_u64(p.as_u64()),
            type_ids::FLOAT32 => writer.write_f32(p.as_f32()),
            type_ids::FLOAT64 => writer.write_f64(p.as_f64()),
            type_ids::FIXED32 => writer.write_i32(p.as_fx32().to_base()),
            type_ids::FIXED64 => writer.write_i64(p.as_fx64().to_base()),
            other => {
                return Err(VmError::serialization(format!(
                    "type {other} has no wire representation"
                )))
            }
        }
        return Ok(());
    }

    match variant.object_ref() {
        Some(object) => object.borrow().serialize_to(writer),
        None => {
            writer.write_nil();
            Ok(())
        }
    }
}

/// Reads one variant of the expected type from the stream.
pub fn read_variant(
    type_id: TypeId,
    reader: &mut ValueReader,
    registry: &TypeRegistry,
) -> VmResult<Variant> {
    if is_primitive(type_id) {
        let p = match type_id {
            type_ids::BOOL => Primitive::from_bool(reader.read_bool()?),
            type_ids::INT8 => Primitive::from_i8(reader.read_i8()?),
            type_ids::UINT8 => Primitive::from_u8(reader.read_u8()?),
            type_ids::INT16 => Primitive::from_i16(reader.read_i16()?),
            type_ids::UINT16 => Primitive::from_u16(reader.read_u16()?),
            type_ids::INT32 => Primitive::from_i32(reader.read_i32()?),
            type_ids::UINT32 => Primitive::from_u32(reader.read_u32()?),
            type_ids::INT64 => Primitive::from_i64(reader.read_i64()?),
            type_ids::UINT64 => Primitive::from_u64(reader.read_u64()?),
            type_ids::FLOAT32 => Primitive::from_f32(reader.read_f32()?),
            type_ids::FLOAT64 => Primitive::from_f64(reader.read_f64()?),
            type_ids::FIXED32 => Primitive::from_fx32(Fx32::from_base(reader.read_i32()?)),
            type_ids::FIXED64 => Primitive::from_fx64(Fx64::from_base(reader.read_i64()?)),
            other => {
                return Err(VmError::serialization(format!(
                    "type {other} has no wire representation"
                )))
            }
        };
        return Ok(Variant::primitive(p, type_id));
    }

    if reader.peek_tag()? == ValueTag::Nil {
        reader.read_nil()?;
        return Ok(Variant::null_object(type_id));
    }

    let object = registry.deserialize_construct(type_id)?;
    object.borrow_mut().deserialize_from(reader, registry)?;
    Ok(Variant::object(object, type_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_round_trip() {
        let registry = TypeRegistry::new();
        let mut writer = ValueWriter::new();
        let v = Variant::primitive(Primitive::from_i32(-9), type_ids::INT32);
        write_variant(&v, &mut writer).unwrap();
        let f = Variant::primitive(Primitive::from_fx64(Fx64::from_f64(2.5)), type_ids::FIXED64);
        write_variant(&f, &mut writer).unwrap();

        let mut reader = ValueReader::new(writer.into_bytes());
        let back = read_variant(type_ids::INT32, &mut reader, &registry).unwrap();
        assert_eq!(back.primitive_value().as_i32(), -9);
        let back = read_variant(type_ids::FIXED64, &mut reader, &registry).unwrap();
        assert_eq!(back.primitive_value().as_fx64().to_f64(), 2.5);
    }

    #[test]
    fn typed_null_round_trips_as_nil() {
        let registry = TypeRegistry::new();
        let mut writer = ValueWriter::new();
        write_variant(&Variant::null_object(type_ids::STRING), &mut writer).unwrap();
        let mut reader = ValueReader::new(writer.into_bytes());
        let back = read_variant(type_ids::STRING, &mut reader, &registry).unwrap();
        assert!(back.is_null_object());
    }
}
