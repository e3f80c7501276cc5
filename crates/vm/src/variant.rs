//! The tagged value held in every stack slot.
//!
//! A [`Variant`] pairs a type id with either a primitive word or an owning
//! object reference. Invariant: when `type_id <= PRIMITIVE_MAX_ID` the
//! storage is the primitive word; otherwise it is an object reference that
//! may be null (a typed null).

use crate::object::ObjectRc;
use crate::primitive::Primitive;
use crate::types::{is_primitive, type_ids, TypeId};

/// A tagged value: a primitive word or an object handle.
#[derive(Clone, Default)]
pub struct Variant {
    /// The registered type of the stored value
    pub type_id: TypeId,

    prim: Primitive,
    obj: Option<ObjectRc>,
}

impl Variant {
    /// The reset value: type `Unknown`, zero word, no object.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Constructs a primitive-valued variant.
    pub fn primitive(value: Primitive, type_id: TypeId) -> Self {
        Self {
            type_id,
            prim: value,
            obj: None,
        }
    }

    /// Constructs an object-valued variant.
    pub fn object(object: ObjectRc, type_id: TypeId) -> Self {
        Self {
            type_id,
            prim: Primitive::zero(),
            obj: Some(object),
        }
    }

    /// Constructs a typed null.
    pub fn null_object(type_id: TypeId) -> Self {
        Self {
            type_id,
            prim: Primitive::zero(),
            obj: None,
        }
    }

    /// Constructs a boolean variant.
    pub fn bool_value(value: bool) -> Self {
        Self::primitive(Primitive::from_bool(value), type_ids::BOOL)
    }

    /// Returns whether this variant stores a primitive word.
    pub fn is_primitive(&self) -> bool {
        is_primitive(self.type_id)
    }

    /// Returns the primitive word. Zero for object variants.
    pub fn primitive_value(&self) -> Primitive {
        self.prim
    }

    /// Overwrites the primitive word, keeping the type id.
    pub fn set_primitive(&mut self, value: Primitive) {
        self.prim = value;
        self.obj = None;
    }

    /// Returns the object reference, if any.
    pub fn object_ref(&self) -> Option<&ObjectRc> {
        self.obj.as_ref()
    }

    /// Returns a clone of the object reference, if any.
    pub fn object_value(&self) -> Option<ObjectRc> {
        self.obj.clone()
    }

    /// Returns whether this is an object variant holding null.
    pub fn is_null_object(&self) -> bool {
        !self.is_primitive() && self.obj.is_none()
    }

    /// Replaces the stored object, keeping the type id.
    pub fn set_object(&mut self, object: ObjectRc) {
        self.prim = Primitive::zero();
        self.obj = Some(object);
    }

    /// The truthiness used by the conditional jump opcodes.
    pub fn as_condition(&self) -> bool {
        self.prim.as_bool()
    }

    /// Drops any object reference, zeroes the word, and tags as `Unknown`.
    pub fn reset(&mut self) {
        self.type_id = type_ids::UNKNOWN;
        self.prim = Primitive::zero();
        self.obj = None;
    }

    /// Moves the value out, leaving this slot reset.
    pub fn take(&mut self) -> Variant {
        std::mem::take(self)
    }

    /// Resets this slot and then takes ownership of `other`.
    pub fn assign(&mut self, other: Variant) {
        *self = other;
    }
}

impl std::fmt::Debug for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_primitive() {
            write!(
                f,
                "Variant(type={}, bits={:#x})",
                self.type_id,
                self.prim.bits()
            )
        } else if self.obj.is_some() {
            write!(f, "Variant(type={}, object)", self.type_id)
        } else {
            write!(f, "Variant(type={}, null)", self.type_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_leaves_the_slot_reset() {
        let mut v = Variant::primitive(Primitive::from_i32(7), type_ids::INT32);
        let moved = v.take();
        assert_eq!(moved.primitive_value().as_i32(), 7);
        assert_eq!(v.type_id, type_ids::UNKNOWN);
        assert_eq!(v.primitive_value().as_i64(), 0);
    }

    #[test]
    fn typed_null_is_an_object_variant() {
        let v = Variant::null_object(type_ids::STRING);
        assert!(!v.is_primitive());
        assert!(v.is_null_object());
        assert!(v.object_ref().is_none());
    }
}
