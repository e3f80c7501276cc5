//! The execution engine façade.
//!
//! Owns named compiled executables and named persistent states, and runs any
//! (executable, entrypoint, state, parameters) tuple on a fresh VM. The
//! state bound to a run is the engine-owned state and is mutated in place;
//! a failed run is not rolled back — callers wanting transactional
//! semantics copy the state first and keep whichever copy they prefer.

use crate::compiler::{Compiler, SourceFile};
use crate::result::{Code, ExecutionError, ExecutionResult, Stage, Value};
use crate::state::MemoryState;
use ember_io::{IoError, ValueReader, ValueTag, ValueWriter};
use ember_vm::{
    new_object, type_ids, with_object, ChargeAmount, Executable, Function, ParameterPack,
    Primitive, TypeId, TypeRegistry, Variant, Vm, STDOUT,
};
use ember_vm::objects::{Fixed128, Str};
use ember_vm::{Fx32, Fx64, Module};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Run parameters.
pub type Params = Vec<Value>;

/// Multiplexes compiled executables against named persistent states.
pub struct ExecutionEngine {
    module: Rc<Module>,
    compiler: Box<dyn Compiler>,
    executables: HashMap<String, Rc<Executable>>,
    states: HashMap<String, Rc<RefCell<MemoryState>>>,
    charge_limit: ChargeAmount,
}

impl ExecutionEngine {
    /// Creates an engine around a module and the external compiler.
    pub fn new(module: Module, compiler: Box<dyn Compiler>) -> Self {
        Self {
            module: Rc::new(module),
            compiler,
            executables: HashMap::new(),
            states: HashMap::new(),
            charge_limit: 0,
        }
    }

    /// Bounds every subsequent run; zero disables enforcement.
    pub fn set_charge_limit(&mut self, limit: ChargeAmount) {
        self.charge_limit = limit;
    }

    pub fn has_executable(&self, name: &str) -> bool {
        self.executables.contains_key(name)
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    fn engine_error(&self, code: Code, message: impl Into<String>) -> ExecutionResult {
        ExecutionResult::status(Stage::Engine, code, message)
    }

    fn engine_success(&self, message: impl Into<String>) -> ExecutionResult {
        ExecutionResult::status(Stage::Engine, Code::Success, message)
    }

    /// Compiles `sources` and stores the executable under `name`.
    /// Recompiling an existing name is an error.
    pub fn create_executable(&mut self, name: &str, sources: &[SourceFile]) -> ExecutionResult {
        if self.has_executable(name) {
            return self.engine_error(
                Code::BadExecutable,
                format!("executable {name} already exists."),
            );
        }

        match self.compiler.compile(sources) {
            Ok(mut executable) => {
                executable.name = name.to_string();
                self.executables
                    .insert(name.to_string(), Rc::new(executable));
                log::debug!("created executable '{name}'");
                ExecutionResult::status(
                    Stage::Compile,
                    Code::Success,
                    format!("Created executable {name}"),
                )
            }
            Err(errors) => ExecutionResult::status(
                Stage::Compile,
                Code::CompilationError,
                errors.join("\n"),
            ),
        }
    }

    /// Removes a stored executable.
    pub fn delete_executable(&mut self, name: &str) -> ExecutionResult {
        if self.executables.remove(name).is_none() {
            return self.engine_error(
                Code::BadExecutable,
                format!("executable {name} does not exist."),
            );
        }
        self.engine_success(format!("Deleted executable {name}"))
    }

    /// Creates an empty named state.
    pub fn create_state(&mut self, name: &str) -> ExecutionResult {
        if self.has_state(name) {
            return self.engine_error(Code::BadState, format!("state {name} already exists."));
        }
        self.states
            .insert(name.to_string(), Rc::new(RefCell::new(MemoryState::new())));
        log::debug!("created state '{name}'");
        self.engine_success(format!("Created state {name}"))
    }

    /// Deep-copies state `src` into a new state `dst`.
    pub fn copy_state(&mut self, src: &str, dst: &str) -> ExecutionResult {
        let Some(source) = self.states.get(src) else {
            return self.engine_error(Code::BadState, format!("No state named {src}"));
        };
        if self.has_state(dst) {
            return self.engine_error(
                Code::BadDestination,
                format!("state {dst} already exists."),
            );
        }
        let copy = source.borrow().deep_copy();
        self.states
            .insert(dst.to_string(), Rc::new(RefCell::new(copy)));
        self.engine_success(format!("Copied state {src} to {dst}"))
    }

    /// Removes a named state.
    pub fn delete_state(&mut self, name: &str) -> ExecutionResult {
        if self.states.remove(name).is_none() {
            return self.engine_error(Code::BadState, format!("No state named {name}"));
        }
        self.engine_success(format!("Deleted state {name}"))
    }

    /// Runs `entrypoint` of a stored executable against a stored state.
    ///
    /// A fresh VM is constructed per run so nothing leaks between runs
    /// through the operand stack or frame state. Stdout is captured into the
    /// result and the final charge total is always reported.
    pub fn run(
        &mut self,
        exec_name: &str,
        state_name: &str,
        entrypoint: &str,
        params: Params,
    ) -> ExecutionResult {
        let Some(executable) = self.executables.get(exec_name).cloned() else {
            return self.engine_error(Code::BadExecutable, format!("Error: No executable {exec_name}"));
        };
        let Some(state) = self.states.get(state_name).cloned() else {
            return self.engine_error(Code::BadState, format!("Error: No state {state_name}"));
        };
        let Some(function) = executable.find_function(entrypoint).cloned() else {
            return self.engine_error(
                Code::RuntimeError,
                format!("Error: {entrypoint} does not exist"),
            );
        };

        let mut vm = Vm::new(&self.module);
        vm.set_charge_limit(self.charge_limit);
        vm.set_io_observer(state);

        let console: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        vm.attach_output_device(STDOUT, console.clone());

        let run_name = format!("Exec: {exec_name} State: {state_name}");
        let pack = match self.prep_input(&vm, &function, &params, &run_name) {
            Ok(pack) => pack,
            Err(error) => {
                return ExecutionResult {
                    output: Value::Void,
                    error,
                    console: String::new(),
                    charge_total: vm.charge_total(),
                }
            }
        };

        log::debug!("running {entrypoint} ({run_name})");
        let outcome = vm.execute(&executable, entrypoint, pack);
        let console_text = String::from_utf8_lossy(&console.borrow()).into_owned();
        let charge_total = vm.charge_total();

        match outcome {
            Ok(output) => {
                let (output, error) =
                    self.prep_output(&vm, &output, &format!("Exec:{exec_name} with state {state_name}"));
                ExecutionResult {
                    output,
                    error,
                    console: console_text,
                    charge_total,
                }
            }
            Err(error) => ExecutionResult {
                output: Value::Void,
                error: ExecutionError::new(Stage::Running, Code::RuntimeError, error.to_string()),
                console: console_text,
                charge_total,
            },
        }
    }

    fn prep_input(
        &self,
        vm: &Vm,
        function: &Function,
        params: &[Value],
        run_name: &str,
    ) -> Result<ParameterPack, ExecutionError> {
        let error_prefix = format!("Error( {run_name}): ");
        let num_parameters = usize::from(function.num_parameters);

        if params.len() != num_parameters {
            return Err(ExecutionError::new(
                Stage::Engine,
                Code::RuntimeError,
                format!(
                    "{error_prefix}Wrong number of parameters expected {num_parameters}; received {}",
                    params.len()
                ),
            ));
        }

        let registry = vm.registry();
        let mut pack = ParameterPack::new();
        for (i, value) in params.iter().enumerate() {
            let expected = function.variables[i].type_id;
            let variant = self.value_to_variant(registry, expected, value).map_err(
                |detail| {
                    ExecutionError::new(
                        Stage::Engine,
                        Code::RuntimeError,
                        format!(
                            "{error_prefix}expected argument {i} to be of type {} but got {}{detail}",
                            registry.type_name(expected),
                            value.kind_name(),
                        ),
                    )
                },
            )?;
            pack.add_variant(variant);
        }
        Ok(pack)
    }

    /// Converts one host value into a variant of the expected type. The
    /// primitive widths convert directly; `String` becomes an owning string
    /// object; any other object type is built through its registered
    /// deserialize constructor from the wire encoding of the value.
    fn value_to_variant(
        &self,
        registry: &TypeRegistry,
        expected: TypeId,
        value: &Value,
    ) -> Result<Variant, String> {
        let primitive = match (expected, value) {
            (type_ids::BOOL, Value::Bool(v)) => Some(Primitive::from_bool(*v)),
            (type_ids::INT8, Value::Int8(v)) => Some(Primitive::from_i8(*v)),
            (type_ids::UINT8, Value::UInt8(v)) => Some(Primitive::from_u8(*v)),
            (type_ids::INT16, Value::Int16(v)) => Some(Primitive::from_i16(*v)),
            (type_ids::UINT16, Value::UInt16(v)) => Some(Primitive::from_u16(*v)),
            (type_ids::INT32, Value::Int32(v)) => Some(Primitive::from_i32(*v)),
            (type_ids::UINT32, Value::UInt32(v)) => Some(Primitive::from_u32(*v)),
            (type_ids::INT64, Value::Int64(v)) => Some(Primitive::from_i64(*v)),
            (type_ids::UINT64, Value::UInt64(v)) => Some(Primitive::from_u64(*v)),
            (type_ids::FLOAT32, Value::Float32(v)) => Some(Primitive::from_f32(*v)),
            (type_ids::FLOAT64, Value::Float64(v)) => Some(Primitive::from_f64(*v)),
            (type_ids::FIXED32, Value::Fixed32(v)) => Some(Primitive::from_fx32(*v)),
            (type_ids::FIXED64, Value::Fixed64(v)) => Some(Primitive::from_fx64(*v)),
            _ => None,
        };
        if let Some(p) = primitive {
            return Ok(Variant::primitive(p, expected));
        }
        if ember_vm::types::is_primitive(expected) {
            return Err(String::new());
        }

        match (expected, value) {
            (type_ids::STRING, Value::String(text)) => Ok(Variant::object(
                new_object(Str::new(text.clone())),
                type_ids::STRING,
            )),
            (type_ids::FIXED128, Value::Fixed128(v)) => Ok(Variant::object(
                new_object(Fixed128::new(*v)),
                type_ids::FIXED128,
            )),
            _ => {
                if !registry.is_deserialize_constructible(expected) {
                    return Err(format!(
                        " (could not construct type {})",
                        registry.type_name(expected)
                    ));
                }
                let mut writer = ValueWriter::new();
                value_to_stream(value, &mut writer);
                let object = registry
                    .deserialize_construct(expected)
                    .map_err(|e| format!(" ({e})"))?;
                let mut reader = ValueReader::new(writer.into_bytes());
                object
                    .borrow_mut()
                    .deserialize_from(&mut reader, registry)
                    .map_err(|e| format!(" ({e})"))?;
                Ok(Variant::object(object, expected))
            }
        }
    }

    /// Converts the run's output variant into a host value. Primitives map
    /// directly; strings and 128-bit fixed-points unwrap their objects; any
    /// other object is serialized and generically decoded, with fixed-point
    /// array elements restored from the template parameter info.
    fn prep_output(
        &self,
        vm: &Vm,
        output: &Variant,
        id: &str,
    ) -> (Value, ExecutionError) {
        let success = ExecutionError::new(Stage::Running, Code::Success, format!("Ran {id}"));
        let serialization_error = |message: String| {
            ExecutionError::new(
                Stage::Engine,
                Code::SerializationError,
                format!("Error({id}) in output after running. {message}"),
            )
        };

        let p = output.primitive_value();
        let value = match output.type_id {
            type_ids::UNKNOWN | type_ids::VOID => Value::Void,
            type_ids::BOOL => Value::Bool(p.as_bool()),
            type_ids::INT8 => Value::Int8(p.as_i8()),
            type_ids::UINT8 => Value::UInt8(p.as_u8()),
            type_ids::INT16 => Value::Int16(p.as_i16()),
            type_ids::UINT16 => Value::UInt16(p.as_u16()),
            type_ids::INT32 => Value::Int32(p.as_i32()),
            type_ids::UINT32 => Value::UInt32(p.as_u32()),
            type_ids::INT64 => Value::Int64(p.as_i64()),
            type_ids::UINT64 => Value::UInt64(p.as_u64()),
            type_ids::FLOAT32 => Value::Float32(p.as_f32()),
            type_ids::FLOAT64 => Value::Float64(p.as_f64()),
            type_ids::FIXED32 => Value::Fixed32(p.as_fx32()),
            type_ids::FIXED64 => Value::Fixed64(p.as_fx64()),
            _ => {
                let Some(object) = output.object_value() else {
                    return (Value::Void, success);
                };
                if output.type_id == type_ids::STRING {
                    match with_object::<Str, _>(&object, |s| Ok(s.value().to_string())) {
                        Ok(text) => return (Value::String(text), success),
                        Err(e) => return (Value::Void, serialization_error(e.to_string())),
                    }
                }
                if output.type_id == type_ids::FIXED128 {
                    match with_object::<Fixed128, _>(&object, |f| Ok(f.value())) {
                        Ok(v) => return (Value::Fixed128(v), success),
                        Err(e) => return (Value::Void, serialization_error(e.to_string())),
                    }
                }

                let mut writer = ValueWriter::new();
                if let Err(e) = object.borrow().serialize_to(&mut writer) {
                    return (
                        Value::Void,
                        serialization_error(format!("Serializing output threw error {e}")),
                    );
                }
                let mut reader = ValueReader::new(writer.into_bytes());
                let decoded = match decode_stream(&mut reader) {
                    Ok(v) => v,
                    Err(e) => {
                        return (
                            Value::Void,
                            serialization_error(format!(
                                "Deserializing output after running. Threw error {e}"
                            )),
                        )
                    }
                };
                fix_up_fixed_point(decoded, innermost_element_type(vm.registry(), output.type_id))
            }
        };
        (value, success)
    }
}

/// Writes a host value in the wire encoding the object library reads.
/// Fixed-point scalars travel as their raw base integers.
fn value_to_stream(value: &Value, writer: &mut ValueWriter) {
    match value {
        Value::Void => writer.write_nil(),
        Value::Bool(v) => writer.write_bool(*v),
        Value::Int8(v) => writer.write_i8(*v),
        Value::UInt8(v) => writer.write_u8(*v),
        Value::Int16(v) => writer.write_i16(*v),
        Value::UInt16(v) => writer.write_u16(*v),
        Value::Int32(v) => writer.write_i32(*v),
        Value::UInt32(v) => writer.write_u32(*v),
        Value::Int64(v) => writer.write_i64(*v),
        Value::UInt64(v) => writer.write_u64(*v),
        Value::Float32(v) => writer.write_f32(*v),
        Value::Float64(v) => writer.write_f64(*v),
        Value::Fixed32(v) => writer.write_i32(v.to_base()),
        Value::Fixed64(v) => writer.write_i64(v.to_base()),
        Value::Fixed128(v) => writer.write_bin(&v.to_base().to_be_bytes()),
        Value::String(v) => writer.write_str(v),
        Value::Bytes(v) => writer.write_bin(v),
        Value::Array(elements) => {
            writer.write_array_header(elements.len());
            for element in elements {
                value_to_stream(element, writer);
            }
        }
    }
}

/// Decodes one value of any shape from the stream. Map payloads decode as
/// an array of two-element key/value arrays.
fn decode_stream(reader: &mut ValueReader) -> Result<Value, IoError> {
    Ok(match reader.peek_tag()? {
        ValueTag::Nil => {
            reader.read_nil()?;
            Value::Void
        }
        ValueTag::Bool => Value::Bool(reader.read_bool()?),
        ValueTag::Int => Value::Int64(reader.read_i64()?),
        ValueTag::Uint => {
            // Signed where it fits, so containers of small values decode
            // uniformly regardless of the compact encoding chosen.
            let raw = reader.read_u64()?;
            match i64::try_from(raw) {
                Ok(signed) => Value::Int64(signed),
                Err(_) => Value::UInt64(raw),
            }
        }
        ValueTag::Float32 => Value::Float32(reader.read_f32()?),
        ValueTag::Float64 => Value::Float64(reader.read_f64()?),
        ValueTag::Str => Value::String(reader.read_str()?),
        ValueTag::Bin => Value::Bytes(reader.read_bin()?),
        ValueTag::Array => {
            let length = reader.read_array_header()?;
            let mut elements = Vec::with_capacity(length);
            for _ in 0..length {
                elements.push(decode_stream(reader)?);
            }
            Value::Array(elements)
        }
        ValueTag::Map => {
            let length = reader.read_map_header()?;
            let mut pairs = Vec::with_capacity(length);
            for _ in 0..length {
                let key = decode_stream(reader)?;
                let value = decode_stream(reader)?;
                pairs.push(Value::Array(vec![key, value]));
            }
            Value::Array(pairs)
        }
    })
}

/// Walks single-parameter template instantiations down to the innermost
/// element type (`Array<Array<Fixed64>>` → `Fixed64`).
fn innermost_element_type(registry: &TypeRegistry, mut type_id: TypeId) -> TypeId {
    while let Ok(info) = registry.type_info(type_id) {
        match info.template_parameter_type_ids.as_slice() {
            [element] => type_id = *element,
            _ => break,
        }
    }
    type_id
}

/// Restores fixed-point leaves of a decoded container: the wire carries raw
/// base integers, so an array whose innermost element type is fixed-point
/// gets its integers reinterpreted.
fn fix_up_fixed_point(value: Value, element_type: TypeId) -> Value {
    match value {
        Value::Array(elements) => Value::Array(
            elements
                .into_iter()
                .map(|element| fix_up_fixed_point(element, element_type))
                .collect(),
        ),
        Value::Int64(raw) if element_type == type_ids::FIXED64 => {
            Value::Fixed64(Fx64::from_base(raw))
        }
        Value::UInt64(raw) if element_type == type_ids::FIXED64 => {
            Value::Fixed64(Fx64::from_base(raw as i64))
        }
        Value::Int64(raw) if element_type == type_ids::FIXED32 => {
            Value::Fixed32(Fx32::from_base(raw as i32))
        }
        Value::UInt64(raw) if element_type == type_ids::FIXED32 => {
            Value::Fixed32(Fx32::from_base(raw as i32))
        }
        other => other,
    }
}
