//! Object-library tests: containers, indexed access, the persistent state
//! types against a host observer, and the cast intrinsics.

use ember_vm::{
    opcodes, type_ids, ExecutableBuilder, FunctionBuilder, Fx32, Fx64, Instruction, IoObserver,
    IoStatus, Module, ParameterPack, Primitive, Variant, Vm,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn int32(value: i32) -> Variant {
    Variant::primitive(Primitive::from_i32(value), type_ids::INT32)
}

/// A minimal observer backing the state-library tests.
#[derive(Default)]
struct TestStore {
    entries: HashMap<String, Vec<u8>>,
}

impl IoObserver for TestStore {
    fn read(&self, key: &str, data: &mut [u8], size: &mut u64) -> IoStatus {
        let Some(value) = self.entries.get(key) else {
            return IoStatus::PermissionDenied;
        };
        if data.len() < value.len() {
            *size = value.len() as u64;
            return IoStatus::BufferTooSmall;
        }
        data[..value.len()].copy_from_slice(value);
        *size = value.len() as u64;
        IoStatus::Ok
    }

    fn write(&mut self, key: &str, data: &[u8]) -> IoStatus {
        self.entries.insert(key.to_string(), data.to_vec());
        IoStatus::Ok
    }

    fn exists(&self, key: &str) -> IoStatus {
        if self.entries.contains_key(key) {
            IoStatus::Ok
        } else {
            IoStatus::Error
        }
    }
}

#[test]
fn array_literal_and_indexing() {
    let module = Module::with_defaults();
    let array_tid = module.registry().find_type("Array<Int32>").unwrap();

    let mut builder = ExecutableBuilder::new("arrays");
    let ten = builder.add_constant(int32(10));
    let twenty = builder.add_constant(int32(20));
    let one = builder.add_constant(int32(1));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .local("a", array_tid)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(ten))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(twenty))
            .emit(
                Instruction::new(opcodes::INITIALISE_ARRAY)
                    .with_type(array_tid)
                    .with_data(2),
            )
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(0)
                    .with_type(array_tid),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(one))
            .emit(Instruction::new(opcodes::PUSH_INDEXED_VALUE).with_data(1))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let output = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(output.primitive_value().as_i32(), 20);
}

#[test]
fn array_index_out_of_bounds_is_reported() {
    let module = Module::with_defaults();
    let array_tid = module.registry().find_type("Array<Int32>").unwrap();

    let mut builder = ExecutableBuilder::new("arrays");
    let ten = builder.add_constant(int32(10));
    let five = builder.add_constant(int32(5));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(ten))
            .emit(
                Instruction::new(opcodes::INITIALISE_ARRAY)
                    .with_type(array_tid)
                    .with_data(1),
            )
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(five))
            .emit(Instruction::new(opcodes::PUSH_INDEXED_VALUE).with_data(1))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let error = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap_err();
    assert!(error.to_string().contains("index 5 out of bounds"));
}

#[test]
fn array_member_functions_append_and_count() {
    let module = Module::with_defaults();
    let array_tid = module.registry().find_type("Array<Int32>").unwrap();
    let ctor = module.opcode_of("Array<Int32>(Int32)").unwrap();
    let append = module.opcode_of("Array<Int32>::append(Int32)").unwrap();
    let count = module.opcode_of("Array<Int32>::count()").unwrap();

    let mut builder = ExecutableBuilder::new("append");
    let zero = builder.add_constant(int32(0));
    let seven = builder.add_constant(int32(7));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .local("a", array_tid)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(zero))
            .emit(Instruction::new(ctor))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(0)
                    .with_type(array_tid),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(seven))
            .emit(Instruction::new(append))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(count))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let output = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(output.primitive_value().as_i32(), 1);
}

#[test]
fn map_set_then_get() {
    let module = Module::with_defaults();
    let map_tid = module.registry().find_type("Map<String,Int32>").unwrap();
    let ctor = module.opcode_of("Map<String,Int32>()").unwrap();

    let mut builder = ExecutableBuilder::new("maps");
    let key = builder.intern_string("answer");
    let value = builder.add_constant(int32(42));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .local("m", map_tid)
            .emit(Instruction::new(ctor))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(0)
                    .with_type(map_tid),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(key))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(value))
            .emit(Instruction::new(opcodes::POP_TO_INDEXED_VALUE).with_data(1))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(key))
            .emit(Instruction::new(opcodes::PUSH_INDEXED_VALUE).with_data(1))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let output = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(output.primitive_value().as_i32(), 42);
}

/// persistent tick : Int32;
/// function main() : Int32
///   use tick;
///   var r = tick.get(0);
///   tick.set(r + 1);
///   return r;
/// endfunction
fn counter_executable(module: &Module) -> Rc<ember_vm::Executable> {
    let state_tid = module.registry().find_type("State<Int32>").unwrap();
    let ctor = module.opcode_of("State<Int32>(String)").unwrap();
    let get = module.opcode_of("State<Int32>::get(Int32)").unwrap();
    let set = module.opcode_of("State<Int32>::set(Int32)").unwrap();

    let mut builder = ExecutableBuilder::new("counter");
    let name = builder.intern_string("tick");
    let zero = builder.add_constant(int32(0));
    let one = builder.add_constant(int32(1));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .local("tick", state_tid)
            .local("r", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(name))
            .emit(Instruction::new(ctor))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(0)
                    .with_type(state_tid),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(zero))
            .emit(Instruction::new(get))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(1)
                    .with_type(type_ids::INT32),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(one))
            .emit(Instruction::new(opcodes::PRIMITIVE_ADD).with_type(type_ids::INT32))
            .emit(Instruction::new(set))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    Rc::new(builder.build())
}

#[test]
fn persistent_counter_reads_and_writes_through_the_observer() {
    let module = Module::with_defaults();
    let executable = counter_executable(&module);
    let store: Rc<RefCell<TestStore>> = Rc::new(RefCell::new(TestStore::default()));

    for expected in 0..3 {
        let mut vm = Vm::new(&module);
        vm.set_io_observer(store.clone());
        let output = vm
            .execute(&executable, "main", ParameterPack::new())
            .unwrap();
        assert_eq!(output.primitive_value().as_i32(), expected);
    }
    assert!(store.borrow().entries.contains_key("tick"));
}

#[test]
fn state_access_without_an_observer_fails() {
    let module = Module::with_defaults();
    let executable = counter_executable(&module);
    let mut vm = Vm::new(&module);
    let error = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap_err();
    assert!(error.to_string().contains("no I/O observer"));
}

#[test]
fn sharded_state_prefixes_its_keys() {
    let module = Module::with_defaults();
    let sharded_tid = module.registry().find_type("ShardedState<Int32>").unwrap();
    let ctor = module.opcode_of("ShardedState<Int32>(String)").unwrap();
    let set = module
        .opcode_of("ShardedState<Int32>::set(String,Int32)")
        .unwrap();
    let get = module
        .opcode_of("ShardedState<Int32>::get(String,Int32)")
        .unwrap();

    let mut builder = ExecutableBuilder::new("sharded");
    let prefix = builder.intern_string("balances");
    let shard = builder.intern_string("alice");
    let zero = builder.add_constant(int32(0));
    let amount = builder.add_constant(int32(250));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .local("balances", sharded_tid)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(prefix))
            .emit(Instruction::new(ctor))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(0)
                    .with_type(sharded_tid),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(shard))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(amount))
            .emit(Instruction::new(set))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(shard))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(zero))
            .emit(Instruction::new(get))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let store: Rc<RefCell<TestStore>> = Rc::new(RefCell::new(TestStore::default()));
    let mut vm = Vm::new(&module);
    vm.set_io_observer(store.clone());
    let output = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(output.primitive_value().as_i32(), 250);
    assert!(store.borrow().entries.contains_key("balances.alice"));
}

#[test]
fn fixed_point_widening_cast_adds_mixed_operands() {
    // function add(a : Fixed64, b : Fixed32) : Fixed64
    //   return a + toFixed64(b);
    // endfunction
    let module = Module::with_defaults();
    let widen = module.opcode_of("toFixed64(Fixed32)").unwrap();

    let mut builder = ExecutableBuilder::new("fixed");
    builder.add_function(
        FunctionBuilder::new("add", type_ids::FIXED64)
            .param("a", type_ids::FIXED64)
            .param("b", type_ids::FIXED32)
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(widen))
            .emit(Instruction::new(opcodes::PRIMITIVE_ADD).with_type(type_ids::FIXED64))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let mut pack = ParameterPack::new();
    pack.add(Fx64::from_f64(4.5)).add(Fx32::from_f64(5.5));
    let output = vm.execute(&executable, "add", pack).unwrap();
    assert_eq!(output.type_id, type_ids::FIXED64);
    assert_eq!(output.primitive_value().as_fx64().to_f64(), 10.0);
}

#[test]
fn large_constants_load_as_fixed128_objects() {
    let module = Module::with_defaults();
    let mut builder = ExecutableBuilder::new("large");
    let pi_ish = builder.add_large_constant(ember_vm::Fx128::from_f64(3.25));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::FIXED128)
            .emit(Instruction::new(opcodes::PUSH_LARGE_CONSTANT).with_index(pi_ish))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let output = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(output.type_id, type_ids::FIXED128);
    let object = output.object_value().unwrap();
    ember_vm::with_object::<ember_vm::objects::Fixed128, _>(&object, |f| {
        assert_eq!(f.value().to_f64(), 3.25);
        Ok(())
    })
    .unwrap();
}

#[test]
fn assert_intrinsic_passes_and_fails() {
    let module = Module::with_defaults();
    let assert_opcode = module.opcode_of("assert(Bool)").unwrap();

    let mut builder = ExecutableBuilder::new("asserts");
    builder.add_function(
        FunctionBuilder::new("passes", type_ids::VOID)
            .emit(Instruction::new(opcodes::PUSH_TRUE))
            .emit(Instruction::new(assert_opcode))
            .emit(Instruction::new(opcodes::RETURN))
            .build(),
    );
    builder.add_function(
        FunctionBuilder::new("fails", type_ids::VOID)
            .emit(Instruction::new(opcodes::PUSH_FALSE))
            .emit(Instruction::new(assert_opcode))
            .emit(Instruction::new(opcodes::RETURN))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    assert!(vm
        .execute(&executable, "passes", ParameterPack::new())
        .is_ok());

    let mut vm = Vm::new(&module);
    let error = vm
        .execute(&executable, "fails", ParameterPack::new())
        .unwrap_err();
    assert!(error.to_string().contains("assertion error"));
}

#[test]
fn external_host_values_marshal_through_copy_constructors() {
    let module = Module::with_defaults();

    // function length(s : String) : Int32  return s.length();  endfunction
    let length = module.opcode_of("String::length()").unwrap();
    let mut builder = ExecutableBuilder::new("external");
    builder.add_function(
        FunctionBuilder::new("length", type_ids::INT32)
            .param("s", type_ids::STRING)
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(length))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let mut pack = ParameterPack::new();
    pack.add_external(vm.registry(), &"hello".to_string())
        .unwrap();
    let output = vm.execute(&executable, "length", pack).unwrap();
    assert_eq!(output.primitive_value().as_i32(), 5);
}
