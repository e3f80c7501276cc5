//! End-to-end interpreter tests: hand-assembled executables run through a
//! fully-populated VM.

use ember_vm::{
    opcodes, type_ids, ExecutableBuilder, Executable, FunctionBuilder, Instruction, Module,
    ParameterPack, Primitive, Variant, Vm, STDOUT,
};
use std::cell::RefCell;
use std::rc::Rc;

fn int32(value: i32) -> Variant {
    Variant::primitive(Primitive::from_i32(value), type_ids::INT32)
}

fn run(
    executable: &Rc<Executable>,
    entrypoint: &str,
    parameters: ParameterPack,
) -> Result<Variant, String> {
    let module = Module::with_defaults();
    let mut vm = Vm::new(&module);
    vm.execute(executable, entrypoint, parameters)
        .map_err(|e| e.to_string())
}

/// function main() : Int32  return 1;  endfunction
fn return_constant_executable() -> Rc<Executable> {
    let mut builder = ExecutableBuilder::new("return_constant");
    let one = builder.add_constant(int32(1));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(one))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    Rc::new(builder.build())
}

/// function add(a : Int32, b : Int32) : Int32  return a + b;  endfunction
fn add_executable(type_id: u16) -> Rc<Executable> {
    let mut builder = ExecutableBuilder::new("adder");
    builder.add_function(
        FunctionBuilder::new("add", type_id)
            .param("a", type_id)
            .param("b", type_id)
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(opcodes::PRIMITIVE_ADD).with_type(type_id))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    Rc::new(builder.build())
}

#[test]
fn return_constant() {
    let output = run(&return_constant_executable(), "main", ParameterPack::new()).unwrap();
    assert_eq!(output.type_id, type_ids::INT32);
    assert_eq!(output.primitive_value().as_i32(), 1);
}

#[test]
fn add_two_parameters() {
    let mut pack = ParameterPack::new();
    pack.add(1i32).add(2i32);
    let output = run(&add_executable(type_ids::INT32), "add", pack).unwrap();
    assert_eq!(output.primitive_value().as_i32(), 3);
}

#[test]
fn add_widens_through_the_int64_variant() {
    let mut pack = ParameterPack::new();
    pack.add(0i64).add(i64::from(i32::MAX));
    let output = run(&add_executable(type_ids::INT64), "add", pack).unwrap();
    assert_eq!(output.primitive_value().as_i64(), i64::from(i32::MAX));
}

#[test]
fn parameter_count_is_checked_before_any_bytecode() {
    let module = Module::with_defaults();
    let mut vm = Vm::new(&module);
    let mut pack = ParameterPack::new();
    pack.add(1i32);
    let error = vm
        .execute(&add_executable(type_ids::INT32), "add", pack)
        .unwrap_err();
    assert!(error.to_string().contains("expected 2 arguments"));
    assert_eq!(vm.charge_total(), 0);
}

#[test]
fn parameter_types_are_checked_before_any_bytecode() {
    let module = Module::with_defaults();
    let mut vm = Vm::new(&module);
    let mut pack = ParameterPack::new();
    pack.add(true).add(2i32);
    let error = vm
        .execute(&add_executable(type_ids::INT32), "add", pack)
        .unwrap_err();
    let message = error.to_string();
    assert!(message.contains("Int32"));
    assert!(message.contains("Bool"));
    assert_eq!(vm.charge_total(), 0);
}

#[test]
fn division_by_zero_reports_the_source_line() {
    let mut builder = ExecutableBuilder::new("divider");
    builder.add_function(
        FunctionBuilder::new("div", type_ids::INT32)
            .param("a", type_ids::INT32)
            .param("b", type_ids::INT32)
            .line(7)
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(opcodes::PRIMITIVE_DIVIDE).with_type(type_ids::INT32))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut pack = ParameterPack::new();
    pack.add(1i32).add(0i32);
    let error = run(&executable, "div", pack).unwrap_err();
    assert_eq!(error, "runtime error: line 7: division by zero");
}

#[test]
fn modulo_by_zero_is_division_by_zero() {
    let mut builder = ExecutableBuilder::new("modulo");
    builder.add_function(
        FunctionBuilder::new("rem", type_ids::INT32)
            .param("a", type_ids::INT32)
            .param("b", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(opcodes::PRIMITIVE_MODULO).with_type(type_ids::INT32))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut pack = ParameterPack::new();
    pack.add(5i32).add(0i32);
    let error = run(&executable, "rem", pack).unwrap_err();
    assert!(error.contains("division by zero"));
}

#[test]
fn for_range_loop_sums_the_half_open_range() {
    // function sum(n : Int32) : Int32
    //   var total = 0;
    //   for (i in 0:n)  total += i;  endfor
    //   return total;
    // endfunction
    let mut builder = ExecutableBuilder::new("summer");
    let zero = builder.add_constant(int32(0));
    builder.add_function(
        FunctionBuilder::new("sum", type_ids::INT32)
            .param("n", type_ids::INT32)
            .local("total", type_ids::INT32)
            .local("i", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(zero))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(1)
                    .with_type(type_ids::INT32),
            )
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(zero))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(
                Instruction::new(opcodes::FOR_RANGE_INIT)
                    .with_index(2)
                    .with_type(type_ids::INT32)
                    .with_data(2),
            )
            .emit(
                Instruction::new(opcodes::FOR_RANGE_ITERATE)
                    .with_index(9)
                    .with_data(2),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(2))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_PRIMITIVE_INPLACE_ADD)
                    .with_index(1)
                    .with_type(type_ids::INT32),
            )
            .emit(Instruction::new(opcodes::JUMP).with_index(5))
            .emit(Instruction::new(opcodes::FOR_RANGE_TERMINATE))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut pack = ParameterPack::new();
    pack.add(5i32);
    let output = run(&executable, "sum", pack).unwrap();
    assert_eq!(output.primitive_value().as_i32(), 10);
}

#[test]
fn inner_free_function_call_balances_the_stack() {
    let mut builder = ExecutableBuilder::new("caller");
    let three = builder.add_constant(int32(3));
    let four = builder.add_constant(int32(4));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(three))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(four))
            .emit(Instruction::new(opcodes::INVOKE_USER_DEFINED_FREE_FUNCTION).with_index(1))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    builder.add_function(
        FunctionBuilder::new("helper", type_ids::INT32)
            .param("a", type_ids::INT32)
            .param("b", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(1))
            .emit(Instruction::new(opcodes::PRIMITIVE_ADD).with_type(type_ids::INT32))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());
    let output = run(&executable, "main", ParameterPack::new()).unwrap();
    assert_eq!(output.primitive_value().as_i32(), 7);
}

#[test]
fn unbounded_recursion_overflows_the_frame_stack() {
    let mut builder = ExecutableBuilder::new("recurse");
    builder.add_function(
        FunctionBuilder::new("main", type_ids::VOID)
            .emit(Instruction::new(opcodes::INVOKE_USER_DEFINED_FREE_FUNCTION).with_index(0))
            .emit(Instruction::new(opcodes::RETURN))
            .build(),
    );
    let executable = Rc::new(builder.build());
    let error = run(&executable, "main", ParameterPack::new()).unwrap_err();
    assert!(error.contains("frame stack overflow"));
}

#[test]
fn unbounded_pushing_overflows_the_operand_stack() {
    let mut builder = ExecutableBuilder::new("pusher");
    let one = builder.add_constant(int32(1));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::VOID)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(one))
            .emit(Instruction::new(opcodes::JUMP).with_index(0))
            .build(),
    );
    let executable = Rc::new(builder.build());
    let error = run(&executable, "main", ParameterPack::new()).unwrap_err();
    assert!(error.contains("stack overflow"));
}

#[test]
fn charge_limit_stops_execution_at_the_opcode_boundary() {
    let module = Module::with_defaults();
    let mut vm = Vm::new(&module);
    vm.set_charge_limit(1);
    let error = vm
        .execute(&return_constant_executable(), "main", ParameterPack::new())
        .unwrap_err();
    assert!(error.to_string().contains("Charge limit reached"));
    assert!(vm.charge_total() >= 1);
}

#[test]
fn charge_total_counts_static_charges() {
    let module = Module::with_defaults();
    let mut vm = Vm::new(&module);
    let mut pack = ParameterPack::new();
    pack.add(1i32).add(2i32);
    vm.execute(&add_executable(type_ids::INT32), "add", pack)
        .unwrap();
    // Four instructions at the default static charge of one each.
    assert_eq!(vm.charge_total(), 4);
}

#[test]
fn charges_are_updatable_by_opcode_name() {
    let module = Module::with_defaults();
    let mut vm = Vm::new(&module);
    let mut charges = hashbrown_map();
    charges.insert("PushConstant".to_string(), 5u64);
    vm.update_charges(&charges);
    vm.execute(&return_constant_executable(), "main", ParameterPack::new())
        .unwrap();
    // PushConstant (5) + ReturnValue (1).
    assert_eq!(vm.charge_total(), 6);
}

fn hashbrown_map() -> hashbrown::HashMap<String, u64> {
    hashbrown::HashMap::new()
}

#[test]
fn string_local_is_destructed_after_the_value_is_returned() {
    let mut builder = ExecutableBuilder::new("strings");
    let hi = builder.intern_string("hi");
    builder.add_function(
        FunctionBuilder::new("main", type_ids::STRING)
            .local("s", type_ids::STRING)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(hi))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(0)
                    .with_type(type_ids::STRING),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());
    let output = run(&executable, "main", ParameterPack::new()).unwrap();
    assert_eq!(output.type_id, type_ids::STRING);
    let object = output.object_value().unwrap();
    ember_vm::with_object::<ember_vm::objects::Str, _>(&object, |s| {
        assert_eq!(s.value(), "hi");
        Ok(())
    })
    .unwrap();
}

#[test]
fn null_equality_follows_the_null_policy() {
    // null == null
    let mut builder = ExecutableBuilder::new("nulls");
    builder.add_function(
        FunctionBuilder::new("both_null", type_ids::BOOL)
            .emit(Instruction::new(opcodes::PUSH_NULL).with_type(type_ids::STRING))
            .emit(Instruction::new(opcodes::PUSH_NULL).with_type(type_ids::STRING))
            .emit(Instruction::new(opcodes::OBJECT_EQUAL))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let hi = builder.intern_string("hi");
    builder.add_function(
        FunctionBuilder::new("null_vs_value", type_ids::BOOL)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(hi))
            .emit(Instruction::new(opcodes::PUSH_NULL).with_type(type_ids::STRING))
            .emit(Instruction::new(opcodes::OBJECT_NOT_EQUAL))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let output = run(&executable, "both_null", ParameterPack::new()).unwrap();
    assert!(output.primitive_value().as_bool());

    let output = run(&executable, "null_vs_value", ParameterPack::new()).unwrap();
    assert!(output.primitive_value().as_bool());
}

#[test]
fn arithmetic_on_a_null_object_is_a_null_reference() {
    let mut builder = ExecutableBuilder::new("null_add");
    let hi = builder.intern_string("hi");
    builder.add_function(
        FunctionBuilder::new("main", type_ids::STRING)
            .emit(Instruction::new(opcodes::PUSH_NULL).with_type(type_ids::STRING))
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(hi))
            .emit(Instruction::new(opcodes::OBJECT_ADD))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());
    let error = run(&executable, "main", ParameterPack::new()).unwrap_err();
    assert!(error.contains("null reference"));
}

#[test]
fn string_concatenation_and_ordering_run_through_the_contract() {
    let mut builder = ExecutableBuilder::new("strcat");
    let foo = builder.intern_string("foo");
    let bar = builder.intern_string("bar");
    builder.add_function(
        FunctionBuilder::new("concat", type_ids::STRING)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(foo))
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(bar))
            .emit(Instruction::new(opcodes::OBJECT_ADD))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    builder.add_function(
        FunctionBuilder::new("less", type_ids::BOOL)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(bar))
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(foo))
            .emit(Instruction::new(opcodes::OBJECT_LESS_THAN))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let output = run(&executable, "concat", ParameterPack::new()).unwrap();
    let object = output.object_value().unwrap();
    ember_vm::with_object::<ember_vm::objects::Str, _>(&object, |s| {
        assert_eq!(s.value(), "foobar");
        Ok(())
    })
    .unwrap();

    let output = run(&executable, "less", ParameterPack::new()).unwrap();
    assert!(output.primitive_value().as_bool()); // "bar" < "foo"
}

#[test]
fn user_defined_type_member_functions_see_self() {
    let module = Module::with_defaults();
    let counter_tid = module.registry().type_count() as u16;

    let mut builder = ExecutableBuilder::new("counter");
    builder.add_user_defined_type(
        "Counter",
        vec![ember_vm::Variable {
            name: "value".to_string(),
            type_id: type_ids::INT32,
        }],
        vec![
            FunctionBuilder::constructor("Counter").build(),
            FunctionBuilder::member("bump", type_ids::INT32)
                .emit(Instruction::new(opcodes::PUSH_SELF))
                .emit(
                    Instruction::new(opcodes::MEMBER_VARIABLE_PREFIX_INC)
                        .with_index(0)
                        .with_type(type_ids::INT32),
                )
                .emit(Instruction::new(opcodes::RETURN_VALUE))
                .build(),
        ],
    );
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .local("c", counter_tid)
            .emit(Instruction::new(opcodes::INVOKE_USER_DEFINED_CONSTRUCTOR).with_type(counter_tid))
            .emit(
                Instruction::new(opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN)
                    .with_index(0)
                    .with_type(counter_tid),
            )
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(
                Instruction::new(opcodes::INVOKE_USER_DEFINED_MEMBER_FUNCTION)
                    .with_index(1)
                    .with_data(counter_tid),
            )
            .emit(Instruction::new(opcodes::DISCARD))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(
                Instruction::new(opcodes::INVOKE_USER_DEFINED_MEMBER_FUNCTION)
                    .with_index(1)
                    .with_data(counter_tid),
            )
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let output = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap();
    // Two bumps against the same instance.
    assert_eq!(output.primitive_value().as_i32(), 2);
}

#[test]
fn member_call_on_a_null_receiver_is_a_null_reference() {
    let module = Module::with_defaults();
    let counter_tid = module.registry().type_count() as u16;

    let mut builder = ExecutableBuilder::new("null_receiver");
    builder.add_user_defined_type(
        "Counter",
        vec![ember_vm::Variable {
            name: "value".to_string(),
            type_id: type_ids::INT32,
        }],
        vec![
            FunctionBuilder::constructor("Counter").build(),
            FunctionBuilder::member("bump", type_ids::INT32)
                .emit(Instruction::new(opcodes::PUSH_SELF))
                .emit(
                    Instruction::new(opcodes::MEMBER_VARIABLE_PREFIX_INC)
                        .with_index(0)
                        .with_type(type_ids::INT32),
                )
                .emit(Instruction::new(opcodes::RETURN_VALUE))
                .build(),
        ],
    );
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_NULL).with_type(counter_tid))
            .emit(
                Instruction::new(opcodes::INVOKE_USER_DEFINED_MEMBER_FUNCTION)
                    .with_index(1)
                    .with_data(counter_tid),
            )
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let error = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap_err();
    assert!(error.to_string().contains("null reference"));
}

#[test]
fn print_writes_to_the_attached_stdout_device() {
    let module = Module::with_defaults();
    let print_opcode = module.opcode_of("print(String)").unwrap();

    let mut builder = ExecutableBuilder::new("printer");
    let hello = builder.intern_string("hello");
    builder.add_function(
        FunctionBuilder::new("main", type_ids::VOID)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(hello))
            .emit(Instruction::new(print_opcode))
            .emit(Instruction::new(opcodes::RETURN))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let console: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    vm.attach_output_device(STDOUT, console.clone());
    vm.execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(&*console.borrow(), b"hello");
}

#[test]
fn print_covers_narrow_integers_and_arrays() {
    let module = Module::with_defaults();
    let print_i8 = module.opcode_of("print(Int8)").unwrap();
    let print_ln_array = module.opcode_of("printLn(Array<Int32>)").unwrap();
    let array_tid = module.registry().find_type("Array<Int32>").unwrap();

    let mut builder = ExecutableBuilder::new("printer");
    let minus_five = builder.add_constant(Variant::primitive(
        Primitive::from_i8(-5),
        type_ids::INT8,
    ));
    let ten = builder.add_constant(int32(10));
    let twenty = builder.add_constant(int32(20));
    builder.add_function(
        FunctionBuilder::new("main", type_ids::VOID)
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(minus_five))
            .emit(Instruction::new(print_i8))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(ten))
            .emit(Instruction::new(opcodes::PUSH_CONSTANT).with_index(twenty))
            .emit(
                Instruction::new(opcodes::INITIALISE_ARRAY)
                    .with_type(array_tid)
                    .with_data(2),
            )
            .emit(Instruction::new(print_ln_array))
            .emit(Instruction::new(opcodes::PUSH_NULL).with_type(array_tid))
            .emit(Instruction::new(print_ln_array))
            .emit(Instruction::new(opcodes::RETURN))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let console: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    vm.attach_output_device(STDOUT, console.clone());
    vm.execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(&*console.borrow(), b"-5[10, 20]\n(nullptr)\n");
}

#[test]
fn panic_intrinsic_surfaces_as_a_runtime_error() {
    let module = Module::with_defaults();
    let panic_opcode = module.opcode_of("panic(String)").unwrap();

    let mut builder = ExecutableBuilder::new("panicker");
    let boom = builder.intern_string("boom");
    builder.add_function(
        FunctionBuilder::new("main", type_ids::VOID)
            .line(3)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(boom))
            .emit(Instruction::new(panic_opcode))
            .emit(Instruction::new(opcodes::RETURN))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    let error = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap_err();
    assert_eq!(error.to_string(), "runtime error: line 3: boom");
}

#[test]
fn unknown_opcode_is_reported() {
    let mut builder = ExecutableBuilder::new("bad");
    builder.add_function(
        FunctionBuilder::new("main", type_ids::VOID)
            .emit(Instruction::new(u16::MAX))
            .build(),
    );
    let executable = Rc::new(builder.build());
    let error = run(&executable, "main", ParameterPack::new()).unwrap_err();
    assert!(error.contains("unknown opcode"));
}

#[test]
fn contract_invocation_routes_through_the_host_handler() {
    let module = Module::with_defaults();
    let mut builder = ExecutableBuilder::new("cross");
    let identity = builder.intern_string("token_contract");
    builder.add_contract(
        "token",
        vec![FunctionBuilder::new("totalSupply", type_ids::INT32).build()],
    );
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .local("c", type_ids::STRING)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(identity))
            .emit(Instruction::new(opcodes::CONTRACT_VARIABLE_DECLARE_ASSIGN).with_index(0))
            .emit(Instruction::new(opcodes::PUSH_LOCAL_VARIABLE).with_index(0))
            .emit(
                Instruction::new(opcodes::INVOKE_CONTRACT_FUNCTION)
                    .with_index(0)
                    .with_data(0),
            )
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let mut vm = Vm::new(&module);
    vm.set_contract_invocation_handler(Rc::new(|identity, contract, function, parameters| {
        assert_eq!(identity, "token_contract");
        assert_eq!(contract.name, "token");
        assert_eq!(function.name, "totalSupply");
        assert!(parameters.is_empty());
        Ok(Variant::primitive(
            Primitive::from_i32(99),
            type_ids::INT32,
        ))
    }));
    let output = vm
        .execute(&executable, "main", ParameterPack::new())
        .unwrap();
    assert_eq!(output.primitive_value().as_i32(), 99);
}

#[test]
fn contract_invocation_without_a_handler_fails() {
    let mut builder = ExecutableBuilder::new("cross");
    let identity = builder.intern_string("token_contract");
    builder.add_contract(
        "token",
        vec![FunctionBuilder::new("totalSupply", type_ids::INT32).build()],
    );
    builder.add_function(
        FunctionBuilder::new("main", type_ids::INT32)
            .emit(Instruction::new(opcodes::PUSH_STRING).with_index(identity))
            .emit(
                Instruction::new(opcodes::INVOKE_CONTRACT_FUNCTION)
                    .with_index(0)
                    .with_data(0),
            )
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());
    let error = run(&executable, "main", ParameterPack::new()).unwrap_err();
    assert!(error.contains("invocation handler is null"));
}

#[test]
fn short_circuit_jumps_keep_or_pop_the_condition() {
    // false && <never evaluated>  →  false
    let mut builder = ExecutableBuilder::new("shortcircuit");
    builder.add_function(
        FunctionBuilder::new("and_false", type_ids::BOOL)
            .emit(Instruction::new(opcodes::PUSH_FALSE))
            .emit(Instruction::new(opcodes::JUMP_IF_FALSE_OR_POP).with_index(3))
            .emit(Instruction::new(opcodes::PUSH_TRUE))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    // true || <never evaluated>  →  true
    builder.add_function(
        FunctionBuilder::new("or_true", type_ids::BOOL)
            .emit(Instruction::new(opcodes::PUSH_TRUE))
            .emit(Instruction::new(opcodes::JUMP_IF_TRUE_OR_POP).with_index(3))
            .emit(Instruction::new(opcodes::PUSH_FALSE))
            .emit(Instruction::new(opcodes::RETURN_VALUE))
            .build(),
    );
    let executable = Rc::new(builder.build());

    let output = run(&executable, "and_false", ParameterPack::new()).unwrap();
    assert!(!output.primitive_value().as_bool());
    let output = run(&executable, "or_true", ParameterPack::new()).unwrap();
    assert!(output.primitive_value().as_bool());
}
