//! Parameter marshalling across the host/guest boundary.
//!
//! A [`ParameterPack`] accumulates host values with their inferred type ids;
//! [`crate::Vm::execute`] verifies the pack against the entrypoint signature
//! before any bytecode runs. The [`FromVariant`]/[`IntoVariant`] traits are
//! the same seam in the other direction, used by registered host functions
//! to read their operands and produce their results.

use crate::error::{VmError, VmResult};
use crate::fixed::{Fx32, Fx64};
use crate::object::{new_object, Object, ObjectRc};
use crate::objects::string::Str;
use crate::primitive::Primitive;
use crate::types::{type_ids, TypeRegistry};
use crate::variant::Variant;

/// Converts a host value into a variant with its canonical type id.
pub trait IntoVariant {
    fn into_variant(self) -> Variant;
}

/// Extracts a host value from a variant, checking the type id.
pub trait FromVariant: Sized {
    fn from_variant(variant: &Variant) -> VmResult<Self>;
}

macro_rules! primitive_conversions {
    ($ty:ty, $type_id:expr, $from:ident, $as:ident, $name:literal) => {
        impl IntoVariant for $ty {
            fn into_variant(self) -> Variant {
                Variant::primitive(Primitive::$from(self), $type_id)
            }
        }

        impl FromVariant for $ty {
            fn from_variant(variant: &Variant) -> VmResult<Self> {
                if variant.type_id != $type_id {
                    return Err(VmError::TypeMismatch {
                        expected: $name.to_string(),
                        actual: format!("type id {}", variant.type_id),
                    });
                }
                Ok(variant.primitive_value().$as())
            }
        }
    };
}

primitive_conversions!(bool, type_ids::BOOL, from_bool, as_bool, "Bool");
primitive_conversions!(i8, type_ids::INT8, from_i8, as_i8, "Int8");
primitive_conversions!(u8, type_ids::UINT8, from_u8, as_u8, "UInt8");
primitive_conversions!(i16, type_ids::INT16, from_i16, as_i16, "Int16");
primitive_conversions!(u16, type_ids::UINT16, from_u16, as_u16, "UInt16");
primitive_conversions!(i32, type_ids::INT32, from_i32, as_i32, "Int32");
primitive_conversions!(u32, type_ids::UINT32, from_u32, as_u32, "UInt32");
primitive_conversions!(i64, type_ids::INT64, from_i64, as_i64, "Int64");
primitive_conversions!(u64, type_ids::UINT64, from_u64, as_u64, "UInt64");
primitive_conversions!(f32, type_ids::FLOAT32, from_f32, as_f32, "Float32");
primitive_conversions!(f64, type_ids::FLOAT64, from_f64, as_f64, "Float64");
primitive_conversions!(Fx32, type_ids::FIXED32, from_fx32, as_fx32, "Fixed32");
primitive_conversions!(Fx64, type_ids::FIXED64, from_fx64, as_fx64, "Fixed64");

/// Type-checked accumulation of call parameters.
#[derive(Default)]
pub struct ParameterPack {
    params: Vec<Variant>,
}

impl ParameterPack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Variant> {
        self.params.get(index)
    }

    pub(crate) fn into_values(self) -> Vec<Variant> {
        self.params
    }

    /// Adds a primitive or fixed-point value.
    pub fn add<T: IntoVariant>(&mut self, value: T) -> &mut Self {
        self.params.push(value.into_variant());
        self
    }

    /// Adds an already-typed variant unchanged.
    pub fn add_variant(&mut self, value: Variant) -> &mut Self {
        self.params.push(value);
        self
    }

    /// Adds a string, constructing the owning string object.
    pub fn add_string(&mut self, value: impl Into<String>) -> &mut Self {
        self.params.push(Variant::object(
            new_object(Str::new(value.into())),
            type_ids::STRING,
        ));
        self
    }

    /// Adds a registered object by reference.
    pub fn add_object(&mut self, object: ObjectRc) -> &mut Self {
        let type_id = Object::type_id(&*object.borrow());
        self.params.push(Variant::object(object, type_id));
        self
    }

    /// Copy-constructs an owning object from an external host value through
    /// the registered copy constructor.
    pub fn add_external<T: 'static>(
        &mut self,
        registry: &TypeRegistry,
        value: &T,
    ) -> VmResult<&mut Self> {
        let object = registry.copy_construct(value)?;
        let type_id = Object::type_id(&*object.borrow());
        self.params.push(Variant::object(object, type_id));
        Ok(self)
    }
}
