//! Type ids, type information, and the registered-type table.
//!
//! Type ids are small integers. The reserved low range enumerates the
//! built-in primitives up to [`type_ids::PRIMITIVE_MAX_ID`]; ids above that
//! boundary denote object types. Host modules register their object types at
//! VM construction time; loading an executable appends that executable's
//! user-defined types and unloading removes them again.

use crate::error::{VmError, VmResult};
use crate::object::ObjectRc;
use hashbrown::HashMap;
use std::any::Any;

/// A registered type identifier.
pub type TypeId = u16;

/// Reserved type ids for the built-in types.
pub mod type_ids {
    use super::TypeId;

    pub const UNKNOWN: TypeId = 0;
    pub const NULL: TypeId = 1;
    pub const VOID: TypeId = 2;
    pub const BOOL: TypeId = 3;
    pub const INT8: TypeId = 4;
    pub const UINT8: TypeId = 5;
    pub const INT16: TypeId = 6;
    pub const UINT16: TypeId = 7;
    pub const INT32: TypeId = 8;
    pub const UINT32: TypeId = 9;
    pub const INT64: TypeId = 10;
    pub const UINT64: TypeId = 11;
    pub const FLOAT32: TypeId = 12;
    pub const FLOAT64: TypeId = 13;
    pub const FIXED32: TypeId = 14;
    pub const FIXED64: TypeId = 15;

    /// Ids at or below this boundary hold a primitive word; ids above it
    /// hold an object reference.
    pub const PRIMITIVE_MAX_ID: TypeId = FIXED64;

    pub const STRING: TypeId = 16;
    pub const ADDRESS: TypeId = 17;
    pub const FIXED128: TypeId = 18;

    /// First id available to module-registered types.
    pub const NUM_RESERVED: TypeId = 19;
}

/// Returns whether values of `type_id` are stored as a primitive word.
pub fn is_primitive(type_id: TypeId) -> bool {
    type_id <= type_ids::PRIMITIVE_MAX_ID
}

/// The structural category of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Primitive,
    Object,
    TemplateInstantiation,
    UserDefined,
}

/// Everything the VM knows about one registered type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// Printable name, e.g. `Array<Int32>`
    pub name: String,

    /// Structural category
    pub kind: TypeKind,

    /// The template this type instantiates, or `UNKNOWN`
    pub template_type_id: TypeId,

    /// Concrete template parameter types, in declaration order
    pub template_parameter_type_ids: Vec<TypeId>,

    /// Opcodes of the operator/method handlers registered for this type
    pub handler_opcodes: Vec<u16>,
}

impl TypeInfo {
    /// Creates a plain (non-template) type info.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            template_type_id: type_ids::UNKNOWN,
            template_parameter_type_ids: Vec::new(),
            handler_opcodes: Vec::new(),
        }
    }

    /// Creates a template-instantiation type info.
    pub fn instantiation(
        name: impl Into<String>,
        template_type_id: TypeId,
        parameters: Vec<TypeId>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::TemplateInstantiation,
            template_type_id,
            template_parameter_type_ids: parameters,
            handler_opcodes: Vec::new(),
        }
    }
}

/// Rebuilds an object of the given type from a serialized stream; registered
/// per type (or per template parent) by the host module.
pub type DeserializeConstructor = fn(&TypeRegistry, TypeId) -> VmResult<ObjectRc>;

/// Copy-constructs an owning object from a host-side value.
pub type CopyConstructor = fn(&TypeRegistry, &dyn Any) -> VmResult<ObjectRc>;

/// Maps type ids to type information and construction hooks.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    infos: Vec<TypeInfo>,
    name_map: HashMap<String, TypeId>,
    deserialize_constructors: HashMap<TypeId, DeserializeConstructor>,
    copy_constructors: HashMap<std::any::TypeId, CopyConstructor>,
}

impl TypeRegistry {
    /// Creates a registry seeded with the reserved built-in types.
    pub fn new() -> Self {
        let mut registry = Self {
            infos: Vec::with_capacity(usize::from(type_ids::NUM_RESERVED)),
            name_map: HashMap::new(),
            deserialize_constructors: HashMap::new(),
            copy_constructors: HashMap::new(),
        };

        let primitives = [
            "Unknown", "Null", "Void", "Bool", "Int8", "UInt8", "Int16", "UInt16", "Int32",
            "UInt32", "Int64", "UInt64", "Float32", "Float64", "Fixed32", "Fixed64",
        ];
        for name in primitives {
            registry.push_registered(TypeInfo::new(name, TypeKind::Primitive));
        }
        for name in ["String", "Address", "Fixed128"] {
            registry.push_registered(TypeInfo::new(name, TypeKind::Object));
        }

        debug_assert_eq!(registry.infos.len(), usize::from(type_ids::NUM_RESERVED));
        registry
    }

    fn push_registered(&mut self, info: TypeInfo) -> TypeId {
        let id = self.infos.len() as TypeId;
        let previous = self.name_map.insert(info.name.clone(), id);
        assert!(
            previous.is_none(),
            "duplicate type registration: {}",
            info.name
        );
        self.infos.push(info);
        id
    }

    /// Registers a new type; duplicate names are a programmer error and panic.
    pub fn register_type(&mut self, info: TypeInfo) -> TypeId {
        self.push_registered(info)
    }

    /// Number of registered types; also the next id to be assigned.
    pub fn type_count(&self) -> usize {
        self.infos.len()
    }

    /// Appends an executable-local type without name uniqueness enforcement
    /// (the executable namespace is its own). Returns the assigned id.
    pub fn append_local_type(&mut self, info: TypeInfo) -> TypeId {
        let id = self.infos.len() as TypeId;
        self.infos.push(info);
        id
    }

    /// Removes the most recently appended `count` local types.
    pub fn truncate_local_types(&mut self, count: usize) {
        self.infos.truncate(self.infos.len() - count);
    }

    /// Looks up a type id by name.
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.name_map.get(name).copied()
    }

    /// Returns the info for a type id.
    pub fn type_info(&self, type_id: TypeId) -> VmResult<&TypeInfo> {
        self.infos
            .get(usize::from(type_id))
            .ok_or(VmError::NotConstructible { type_id })
    }

    /// Returns a mutable info handle, used while wiring member handlers.
    pub fn type_info_mut(&mut self, type_id: TypeId) -> Option<&mut TypeInfo> {
        self.infos.get_mut(usize::from(type_id))
    }

    /// Returns the printable name of a type id.
    pub fn type_name(&self, type_id: TypeId) -> String {
        match self.infos.get(usize::from(type_id)) {
            Some(info) => info.name.clone(),
            None => format!("Type{type_id}"),
        }
    }

    /// Registers the deserialize constructor for a type.
    pub fn register_deserialize_constructor(
        &mut self,
        type_id: TypeId,
        constructor: DeserializeConstructor,
    ) {
        let previous = self.deserialize_constructors.insert(type_id, constructor);
        assert!(
            previous.is_none(),
            "duplicate deserialize constructor for type {type_id}"
        );
    }

    fn resolve_deserialize_constructor(&self, type_id: TypeId) -> Option<DeserializeConstructor> {
        if let Some(ctor) = self.deserialize_constructors.get(&type_id) {
            return Some(*ctor);
        }
        // Template instantiations may inherit the parent's constructor.
        let info = self.infos.get(usize::from(type_id))?;
        if info.template_type_id == type_ids::UNKNOWN {
            return None;
        }
        self.deserialize_constructors
            .get(&info.template_type_id)
            .copied()
    }

    /// Returns whether an empty object of this type can be constructed for
    /// deserialization.
    pub fn is_deserialize_constructible(&self, type_id: TypeId) -> bool {
        self.resolve_deserialize_constructor(type_id).is_some()
    }

    /// Constructs an empty object of this type, ready to deserialize into.
    pub fn deserialize_construct(&self, type_id: TypeId) -> VmResult<ObjectRc> {
        match self.resolve_deserialize_constructor(type_id) {
            Some(ctor) => ctor(self, type_id),
            None => Err(VmError::NotConstructible { type_id }),
        }
    }

    /// Registers the copy constructor that turns a host value of type `T`
    /// into an owning object.
    pub fn register_copy_constructor<T: 'static>(&mut self, constructor: CopyConstructor) {
        let previous = self
            .copy_constructors
            .insert(std::any::TypeId::of::<T>(), constructor);
        assert!(previous.is_none(), "duplicate copy constructor");
    }

    /// Returns whether a copy constructor exists for host type `T`.
    pub fn has_copy_constructor<T: 'static>(&self) -> bool {
        self.copy_constructors
            .contains_key(&std::any::TypeId::of::<T>())
    }

    /// Copy-constructs an owning object from a host value.
    pub fn copy_construct<T: 'static>(&self, value: &T) -> VmResult<ObjectRc> {
        match self.copy_constructors.get(&std::any::TypeId::of::<T>()) {
            Some(ctor) => ctor(self, value),
            None => Err(VmError::runtime(
                "no copy constructor registered for host type",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_ids_are_stable() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.find_type("Bool"), Some(type_ids::BOOL));
        assert_eq!(registry.find_type("Fixed64"), Some(type_ids::FIXED64));
        assert_eq!(registry.find_type("String"), Some(type_ids::STRING));
        assert_eq!(registry.type_count(), usize::from(type_ids::NUM_RESERVED));
        assert!(is_primitive(type_ids::FIXED64));
        assert!(!is_primitive(type_ids::STRING));
    }

    #[test]
    fn registration_assigns_sequential_ids() {
        let mut registry = TypeRegistry::new();
        let id = registry.register_type(TypeInfo::new("Buffer", TypeKind::Object));
        assert_eq!(id, type_ids::NUM_RESERVED);
        assert_eq!(registry.type_name(id), "Buffer");
    }

    #[test]
    #[should_panic(expected = "duplicate type registration")]
    fn duplicate_registration_panics() {
        let mut registry = TypeRegistry::new();
        registry.register_type(TypeInfo::new("Bool", TypeKind::Primitive));
    }

    #[test]
    fn local_types_stack_and_unstack() {
        let mut registry = TypeRegistry::new();
        let base = registry.type_count();
        registry.append_local_type(TypeInfo::new("Account", TypeKind::UserDefined));
        assert_eq!(registry.type_name(base as TypeId), "Account");
        registry.truncate_local_types(1);
        assert_eq!(registry.type_count(), base);
    }
}
