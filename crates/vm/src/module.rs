//! Host module: type registration and the standard function library.
//!
//! A [`Module`] owns the registered-type table and the list of host
//! functions. Each host function becomes one opcode at or above
//! `NUM_RESERVED`, in registration order, so the code generator and the VM
//! agree on numbering by construction. [`Module::with_defaults`] registers
//! the standard library: printing, panic/assert, numeric casts, containers,
//! and the persistent-state types.

use crate::charge::{ChargeAmount, DEFAULT_STATIC_CHARGE};
use crate::error::{VmError, VmResult};
use crate::fixed::Fx128;
use crate::object::{new_object, with_object, with_object_mut, ObjectRc};
use crate::objects::state::{
    decode_state_value, encode_state_value, observer_read, observer_write,
};
use crate::objects::{Address, Array, Buffer, Fixed128, Map, ShardedStateObject, StateObject, Str};
use crate::opcode_table::OpcodeHandler;
use crate::opcodes;
use crate::param::{FromVariant, IntoVariant};
use crate::types::{type_ids, TypeId, TypeInfo, TypeKind, TypeRegistry};
use crate::variant::Variant;
use crate::vm::{Vm, STDOUT};
use std::rc::Rc;

/// One registered host function.
pub struct HostFunction {
    pub unique_name: String,
    pub handler: OpcodeHandler,
    pub static_charge: ChargeAmount,
}

/// Registered types plus host functions; the template every VM instance is
/// built from.
pub struct Module {
    registry: TypeRegistry,
    functions: Vec<HostFunction>,
}

/// Element types the container and state templates are instantiated for.
const ELEMENT_TYPES: [(&str, TypeId); 6] = [
    ("Int32", type_ids::INT32),
    ("Int64", type_ids::INT64),
    ("UInt64", type_ids::UINT64),
    ("Float64", type_ids::FLOAT64),
    ("Fixed64", type_ids::FIXED64),
    ("String", type_ids::STRING),
];

impl Module {
    /// Creates a module holding only the reserved built-in types.
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            functions: Vec::new(),
        }
    }

    /// Creates a module with the full standard library registered.
    pub fn with_defaults() -> Self {
        let mut module = Self::new();
        module.register_core_types();
        module.register_print_functions();
        module.register_core_functions();
        module.register_container_functions();
        module.register_state_functions();
        module
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn host_functions(&self) -> &[HostFunction] {
        &self.functions
    }

    /// Registers a host free function, returning its assigned opcode.
    pub fn register_free_function(
        &mut self,
        unique_name: impl Into<String>,
        handler: OpcodeHandler,
        static_charge: ChargeAmount,
    ) -> u16 {
        let opcode = opcodes::NUM_RESERVED + self.functions.len() as u16;
        self.functions.push(HostFunction {
            unique_name: unique_name.into(),
            handler,
            static_charge,
        });
        opcode
    }

    /// Registers a host member function (or constructor) and records its
    /// opcode on the owning type's info.
    pub fn register_member_function(
        &mut self,
        type_id: TypeId,
        unique_name: impl Into<String>,
        handler: OpcodeHandler,
        static_charge: ChargeAmount,
    ) -> u16 {
        let opcode = self.register_free_function(unique_name, handler, static_charge);
        if let Some(info) = self.registry.type_info_mut(type_id) {
            info.handler_opcodes.push(opcode);
        }
        opcode
    }

    /// Looks up the opcode assigned to a unique function name.
    pub fn opcode_of(&self, unique_name: &str) -> Option<u16> {
        self.functions
            .iter()
            .position(|f| f.unique_name == unique_name)
            .map(|index| opcodes::NUM_RESERVED + index as u16)
    }

    // ---- types ----

    fn register_core_types(&mut self) {
        let registry = &mut self.registry;

        registry.register_deserialize_constructor(type_ids::STRING, construct_string);
        registry.register_deserialize_constructor(type_ids::ADDRESS, construct_address);
        registry.register_deserialize_constructor(type_ids::FIXED128, construct_fixed128);

        let buffer = registry.register_type(TypeInfo::new("Buffer", TypeKind::Object));
        registry.register_deserialize_constructor(buffer, construct_buffer);

        let array = registry.register_type(TypeInfo::new("Array", TypeKind::Object));
        registry.register_deserialize_constructor(array, construct_array);

        let map = registry.register_type(TypeInfo::new("Map", TypeKind::Object));
        registry.register_deserialize_constructor(map, construct_map);

        let state = registry.register_type(TypeInfo::new("State", TypeKind::Object));
        let sharded_state = registry.register_type(TypeInfo::new("ShardedState", TypeKind::Object));

        for (name, element) in ELEMENT_TYPES {
            registry.register_type(TypeInfo::instantiation(
                format!("Array<{name}>"),
                array,
                vec![element],
            ));
            registry.register_type(TypeInfo::instantiation(
                format!("State<{name}>"),
                state,
                vec![element],
            ));
            registry.register_type(TypeInfo::instantiation(
                format!("ShardedState<{name}>"),
                sharded_state,
                vec![element],
            ));
        }
        for (key_name, key) in [("String", type_ids::STRING), ("Int32", type_ids::INT32)] {
            for (value_name, value) in [("Int32", type_ids::INT32), ("String", type_ids::STRING)] {
                registry.register_type(TypeInfo::instantiation(
                    format!("Map<{key_name},{value_name}>"),
                    map,
                    vec![key, value],
                ));
            }
        }

        registry.register_copy_constructor::<String>(copy_host_string);
        registry.register_copy_constructor::<Vec<u8>>(copy_host_bytes);
    }

    // ---- standard library ----

    fn register_print_functions(&mut self) {
        let scalars = [
            "String", "Bool", "Int8", "UInt8", "Int16", "UInt16", "Int32", "UInt32", "Int64",
            "UInt64", "Fixed32", "Fixed64",
        ];
        for name in scalars {
            self.register_free_function(
                format!("print({name})"),
                Rc::new(|vm: &mut Vm| print_value(vm, false)),
                DEFAULT_STATIC_CHARGE,
            );
            self.register_free_function(
                format!("printLn({name})"),
                Rc::new(|vm: &mut Vm| print_value(vm, true)),
                DEFAULT_STATIC_CHARGE,
            );
        }

        for (name, _) in ELEMENT_TYPES {
            self.register_free_function(
                format!("print(Array<{name}>)"),
                Rc::new(|vm: &mut Vm| print_array_value(vm, false)),
                DEFAULT_STATIC_CHARGE,
            );
            self.register_free_function(
                format!("printLn(Array<{name}>)"),
                Rc::new(|vm: &mut Vm| print_array_value(vm, true)),
                DEFAULT_STATIC_CHARGE,
            );
        }
    }

    fn register_core_functions(&mut self) {
        self.register_free_function("panic(String)", Rc::new(panic_intrinsic), 1);
        self.register_free_function("assert(Bool)", Rc::new(assert_intrinsic), 1);
        self.register_free_function(
            "assert(Bool,String)",
            Rc::new(assert_with_message_intrinsic),
            1,
        );

        self.register_free_function("toFixed64(Fixed32)", Rc::new(to_fixed64), 1);
        self.register_free_function("toFixed32(Fixed64)", Rc::new(to_fixed32), 1);
        self.register_free_function("toFixed128(Fixed64)", Rc::new(to_fixed128), 1);
        self.register_free_function("toInt64(Int32)", Rc::new(to_int64), 1);
        self.register_free_function("toInt32(Int64)", Rc::new(to_int32), 1);

        let buffer_tid = self
            .registry
            .find_type("Buffer")
            .expect("Buffer registered");
        self.register_free_function(
            "Buffer(Int32)",
            Rc::new(move |vm: &mut Vm| {
                let size = i32::from_variant(&vm.pop()?)?;
                if size < 0 {
                    return Err(VmError::NegativeIndex);
                }
                let object = new_object(Buffer::new(buffer_tid, size as usize));
                vm.push(Variant::object(object, buffer_tid))
            }),
            1,
        );

        self.register_free_function("Address(String)", Rc::new(address_constructor), 1);

        self.register_member_function(
            type_ids::STRING,
            "String::length()",
            Rc::new(string_length),
            1,
        );
    }

    fn register_container_functions(&mut self) {
        for (name, element) in ELEMENT_TYPES {
            let array_tid = self
                .registry
                .find_type(&format!("Array<{name}>"))
                .expect("array instantiation registered");

            self.register_member_function(
                array_tid,
                format!("Array<{name}>(Int32)"),
                Rc::new(move |vm: &mut Vm| {
                    let size = i32::from_variant(&vm.pop()?)?;
                    if size < 0 {
                        return Err(VmError::NegativeIndex);
                    }
                    let object = new_object(Array::new(array_tid, element, size as usize));
                    vm.push(Variant::object(object, array_tid))
                }),
                1,
            );

            self.register_member_function(
                array_tid,
                format!("Array<{name}>::append({name})"),
                Rc::new(move |vm: &mut Vm| {
                    let value = vm.pop()?;
                    if value.type_id != element {
                        return Err(VmError::TypeMismatch {
                            expected: vm.type_name(element),
                            actual: vm.type_name(value.type_id),
                        });
                    }
                    let receiver = vm.pop()?.object_value().ok_or(VmError::NullReference)?;
                    with_object_mut::<Array, _>(&receiver, |array| {
                        array.append(value);
                        Ok(())
                    })
                }),
                DEFAULT_STATIC_CHARGE,
            );

            self.register_member_function(
                array_tid,
                format!("Array<{name}>::count()"),
                Rc::new(|vm: &mut Vm| {
                    let receiver = vm.pop()?.object_value().ok_or(VmError::NullReference)?;
                    let length = with_object::<Array, _>(&receiver, |array| Ok(array.len()))?;
                    vm.push((length as i32).into_variant())
                }),
                DEFAULT_STATIC_CHARGE,
            );
        }

        for (key_name, key) in [("String", type_ids::STRING), ("Int32", type_ids::INT32)] {
            for (value_name, value) in [("Int32", type_ids::INT32), ("String", type_ids::STRING)] {
                let map_tid = self
                    .registry
                    .find_type(&format!("Map<{key_name},{value_name}>"))
                    .expect("map instantiation registered");
                self.register_member_function(
                    map_tid,
                    format!("Map<{key_name},{value_name}>()"),
                    Rc::new(move |vm: &mut Vm| {
                        let object = new_object(Map::new(map_tid, key, value));
                        vm.push(Variant::object(object, map_tid))
                    }),
                    1,
                );
            }
        }
    }

    fn register_state_functions(&mut self) {
        for (name, element) in ELEMENT_TYPES {
            let state_tid = self
                .registry
                .find_type(&format!("State<{name}>"))
                .expect("state instantiation registered");

            self.register_member_function(
                state_tid,
                format!("State<{name}>(String)"),
                Rc::new(move |vm: &mut Vm| {
                    let key = pop_string_value(vm)?;
                    let object = new_object(StateObject::new(state_tid, element, key));
                    vm.push(Variant::object(object, state_tid))
                }),
                1,
            );

            self.register_member_function(
                state_tid,
                format!("State<{name}>::get()"),
                Rc::new(state_get),
                1,
            );
            self.register_member_function(
                state_tid,
                format!("State<{name}>::get({name})"),
                Rc::new(state_get_with_default),
                1,
            );
            self.register_member_function(
                state_tid,
                format!("State<{name}>::set({name})"),
                Rc::new(state_set),
                1,
            );

            let sharded_tid = self
                .registry
                .find_type(&format!("ShardedState<{name}>"))
                .expect("sharded state instantiation registered");

            self.register_member_function(
                sharded_tid,
                format!("ShardedState<{name}>(String)"),
                Rc::new(move |vm: &mut Vm| {
                    let prefix = pop_string_value(vm)?;
                    let object = new_object(ShardedStateObject::new(sharded_tid, element, prefix));
                    vm.push(Variant::object(object, sharded_tid))
                }),
                1,
            );

            self.register_member_function(
                sharded_tid,
                format!("ShardedState<{name}>::get(String,{name})"),
                Rc::new(sharded_state_get_with_default),
                1,
            );
            self.register_member_function(
                sharded_tid,
                format!("ShardedState<{name}>::set(String,{name})"),
                Rc::new(sharded_state_set),
                1,
            );
        }
    }
}

// ---- deserialize constructors ----

fn construct_string(_registry: &TypeRegistry, _type_id: TypeId) -> VmResult<ObjectRc> {
    Ok(new_object(Str::new(String::new())))
}

fn construct_address(_registry: &TypeRegistry, _type_id: TypeId) -> VmResult<ObjectRc> {
    Ok(new_object(Address::default()))
}

fn construct_fixed128(_registry: &TypeRegistry, _type_id: TypeId) -> VmResult<ObjectRc> {
    Ok(new_object(Fixed128::default()))
}

fn construct_buffer(_registry: &TypeRegistry, type_id: TypeId) -> VmResult<ObjectRc> {
    Ok(new_object(Buffer::new(type_id, 0)))
}

fn construct_array(registry: &TypeRegistry, type_id: TypeId) -> VmResult<ObjectRc> {
    let element = registry
        .type_info(type_id)?
        .template_parameter_type_ids
        .first()
        .copied()
        .ok_or(VmError::NotConstructible { type_id })?;
    Ok(new_object(Array::new(type_id, element, 0)))
}

fn construct_map(registry: &TypeRegistry, type_id: TypeId) -> VmResult<ObjectRc> {
    let info = registry.type_info(type_id)?;
    let [key, value] = info.template_parameter_type_ids[..] else {
        return Err(VmError::NotConstructible { type_id });
    };
    Ok(new_object(Map::new(type_id, key, value)))
}

// ---- copy constructors ----

fn copy_host_string(_registry: &TypeRegistry, value: &dyn std::any::Any) -> VmResult<ObjectRc> {
    let text = value
        .downcast_ref::<String>()
        .ok_or_else(|| VmError::runtime("copy constructor host type mismatch"))?;
    Ok(new_object(Str::new(text.clone())))
}

fn copy_host_bytes(registry: &TypeRegistry, value: &dyn std::any::Any) -> VmResult<ObjectRc> {
    let bytes = value
        .downcast_ref::<Vec<u8>>()
        .ok_or_else(|| VmError::runtime("copy constructor host type mismatch"))?;
    let type_id = registry
        .find_type("Buffer")
        .ok_or_else(|| VmError::runtime("Buffer type is not registered"))?;
    Ok(new_object(Buffer::from_bytes(type_id, bytes.clone())))
}

// ---- shared handler helpers ----

fn pop_string_value(vm: &mut Vm) -> VmResult<String> {
    let variant = vm.pop()?;
    let object = variant.object_value().ok_or(VmError::NullReference)?;
    with_object::<Str, _>(&object, |s| Ok(s.value().to_string()))
}

fn format_value(vm: &Vm, variant: &Variant) -> VmResult<String> {
    let p = variant.primitive_value();
    Ok(match variant.type_id {
        type_ids::BOOL => if p.as_bool() { "true" } else { "false" }.to_string(),
        type_ids::INT8 => p.as_i8().to_string(),
        type_ids::UINT8 => p.as_u8().to_string(),
        type_ids::INT16 => p.as_i16().to_string(),
        type_ids::UINT16 => p.as_u16().to_string(),
        type_ids::INT32 => p.as_i32().to_string(),
        type_ids::UINT32 => p.as_u32().to_string(),
        type_ids::INT64 => p.as_i64().to_string(),
        type_ids::UINT64 => p.as_u64().to_string(),
        type_ids::FLOAT32 => p.as_f32().to_string(),
        type_ids::FLOAT64 => p.as_f64().to_string(),
        type_ids::FIXED32 => p.as_fx32().to_string(),
        type_ids::FIXED64 => p.as_fx64().to_string(),
        type_ids::STRING => {
            let object = variant.object_value().ok_or(VmError::NullReference)?;
            with_object::<Str, _>(&object, |s| Ok(s.value().to_string()))?
        }
        other => {
            return Err(VmError::runtime(format!(
                "{} is not printable",
                vm.type_name(other)
            )))
        }
    })
}

fn write_stdout(vm: &Vm, text: &str, newline: bool) -> VmResult<()> {
    let device = vm.output_device(STDOUT)?;
    let mut writer = device.borrow_mut();
    writer
        .write_all(text.as_bytes())
        .and_then(|()| if newline { writer.write_all(b"\n") } else { Ok(()) })
        .map_err(|e| VmError::runtime(format!("stdout write failed: {e}")))
}

fn print_value(vm: &mut Vm, newline: bool) -> VmResult<()> {
    let variant = vm.pop()?;
    let text = format_value(vm, &variant)?;
    write_stdout(vm, &text, newline)
}

fn print_array_value(vm: &mut Vm, newline: bool) -> VmResult<()> {
    let variant = vm.pop()?;
    let text = match variant.object_value() {
        None => "(nullptr)".to_string(),
        Some(object) => {
            let elements = with_object::<Array, _>(&object, |array| Ok(array.elements().to_vec()))?;
            vm.apply_charge(1 + elements.len() as ChargeAmount)?;
            let mut text = String::from("[");
            for (i, element) in elements.iter().enumerate() {
                if i != 0 {
                    text.push_str(", ");
                }
                text.push_str(&format_value(vm, element)?);
            }
            text.push(']');
            text
        }
    };
    write_stdout(vm, &text, newline)
}

fn panic_intrinsic(vm: &mut Vm) -> VmResult<()> {
    let message = pop_string_value(vm)?;
    Err(VmError::runtime(message))
}

fn assert_intrinsic(vm: &mut Vm) -> VmResult<()> {
    let condition = vm.pop()?;
    if condition.as_condition() {
        Ok(())
    } else {
        Err(VmError::runtime("assertion error"))
    }
}

fn assert_with_message_intrinsic(vm: &mut Vm) -> VmResult<()> {
    let message = pop_string_value(vm)?;
    let condition = vm.pop()?;
    if condition.as_condition() {
        Ok(())
    } else {
        Err(VmError::runtime(message))
    }
}

// ---- casts ----

fn to_fixed64(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?.primitive_value().as_fx32().widen();
    vm.push(value.into_variant())
}

fn to_fixed32(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?.primitive_value().as_fx64().narrow();
    vm.push(value.into_variant())
}

fn to_fixed128(vm: &mut Vm) -> VmResult<()> {
    let value: Fx128 = vm.pop()?.primitive_value().as_fx64().widen();
    let object = new_object(Fixed128::new(value));
    vm.push(Variant::object(object, type_ids::FIXED128))
}

fn to_int64(vm: &mut Vm) -> VmResult<()> {
    let value = i64::from(vm.pop()?.primitive_value().as_i32());
    vm.push(value.into_variant())
}

fn to_int32(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?.primitive_value().as_i64() as i32;
    vm.push(value.into_variant())
}

fn address_constructor(vm: &mut Vm) -> VmResult<()> {
    let text = pop_string_value(vm)?;
    let object = new_object(Address::parse(&text)?);
    vm.push(Variant::object(object, type_ids::ADDRESS))
}

fn string_length(vm: &mut Vm) -> VmResult<()> {
    let receiver = vm.pop()?.object_value().ok_or(VmError::NullReference)?;
    let length = with_object::<Str, _>(&receiver, |s| Ok(s.char_count()))?;
    vm.push((length as i32).into_variant())
}

// ---- persistent state ----

fn state_receiver(vm: &mut Vm) -> VmResult<(String, TypeId)> {
    let receiver = vm.pop()?.object_value().ok_or(VmError::NullReference)?;
    with_object::<StateObject, _>(&receiver, |s| {
        Ok((s.name().to_string(), s.value_type_id()))
    })
}

fn state_get(vm: &mut Vm) -> VmResult<()> {
    let (key, value_tid) = state_receiver(vm)?;
    match observer_read(vm, &key)? {
        Some(data) => {
            vm.apply_charge(1 + data.len() as ChargeAmount / 32)?;
            let value = decode_state_value(value_tid, data, vm.registry())?;
            vm.push(value)
        }
        None => Err(VmError::runtime(format!(
            "state '{key}' has no stored value"
        ))),
    }
}

fn state_get_with_default(vm: &mut Vm) -> VmResult<()> {
    let default_value = vm.pop()?;
    let (key, value_tid) = state_receiver(vm)?;
    match observer_read(vm, &key)? {
        Some(data) => {
            vm.apply_charge(1 + data.len() as ChargeAmount / 32)?;
            let value = decode_state_value(value_tid, data, vm.registry())?;
            vm.push(value)
        }
        None => vm.push(default_value),
    }
}

fn state_set(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?;
    let (key, _) = state_receiver(vm)?;
    let data = encode_state_value(&value)?;
    vm.apply_charge(1 + data.len() as ChargeAmount / 32)?;
    observer_write(vm, &key, &data)
}

fn sharded_state_receiver(vm: &mut Vm, key: &str) -> VmResult<(String, TypeId)> {
    let receiver = vm.pop()?.object_value().ok_or(VmError::NullReference)?;
    with_object::<ShardedStateObject, _>(&receiver, |s| {
        Ok((s.shard_key(key), s.value_type_id()))
    })
}

fn sharded_state_get_with_default(vm: &mut Vm) -> VmResult<()> {
    let default_value = vm.pop()?;
    let key = pop_string_value(vm)?;
    let (storage_key, value_tid) = sharded_state_receiver(vm, &key)?;
    match observer_read(vm, &storage_key)? {
        Some(data) => {
            vm.apply_charge(1 + data.len() as ChargeAmount / 32)?;
            let value = decode_state_value(value_tid, data, vm.registry())?;
            vm.push(value)
        }
        None => vm.push(default_value),
    }
}

fn sharded_state_set(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop()?;
    let key = pop_string_value(vm)?;
    let (storage_key, _) = sharded_state_receiver(vm, &key)?;
    let data = encode_state_value(&value)?;
    vm.apply_charge(1 + data.len() as ChargeAmount / 32)?;
    observer_write(vm, &storage_key, &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_the_standard_surface() {
        let module = Module::with_defaults();
        assert!(module.registry().find_type("Buffer").is_some());
        assert!(module.registry().find_type("Array<Int32>").is_some());
        assert!(module.registry().find_type("State<Int32>").is_some());
        assert!(module.opcode_of("print(String)").is_some());
        assert!(module.opcode_of("State<Int32>::set(Int32)").is_some());
        assert!(module.opcode_of("nonexistent()").is_none());
    }

    #[test]
    fn host_opcodes_are_sequential_from_the_reserved_boundary() {
        let module = Module::with_defaults();
        let first = module.host_functions()[0].unique_name.clone();
        assert_eq!(module.opcode_of(&first), Some(opcodes::NUM_RESERVED));
    }

    #[test]
    fn array_instantiations_deserialize_through_the_template_parent() {
        let module = Module::with_defaults();
        let array_tid = module.registry().find_type("Array<Int32>").unwrap();
        assert!(module.registry().is_deserialize_constructible(array_tid));
        let object = module.registry().deserialize_construct(array_tid).unwrap();
        assert_eq!(crate::object::Object::type_id(&*object.borrow()), array_tid);
    }
}
