//! Built-in opcode handlers, split by family, plus the registration of the
//! complete built-in table.

pub mod arith;
pub mod control;
pub mod invoke;
pub mod object_ops;
pub mod stack;

use crate::charge::DEFAULT_STATIC_CHARGE;
use crate::opcode_table::OpcodeTable;
use crate::opcodes;
use std::rc::Rc;

macro_rules! builtin {
    ($table:expr, $opcode:expr, $name:literal, $handler:path) => {
        $table.set($opcode, $name, Rc::new($handler), DEFAULT_STATIC_CHARGE);
    };
}

/// Installs every built-in opcode handler. Each entry carries its unique
/// name so embedders can re-price it through `update_charges`.
pub fn register_builtins(table: &mut OpcodeTable) {
    builtin!(table, opcodes::LOCAL_VARIABLE_DECLARE, "LocalVariableDeclare", stack::local_variable_declare);
    builtin!(table, opcodes::LOCAL_VARIABLE_DECLARE_ASSIGN, "LocalVariableDeclareAssign", stack::local_variable_declare_assign);
    builtin!(table, opcodes::PUSH_NULL, "PushNull", stack::push_null);
    builtin!(table, opcodes::PUSH_FALSE, "PushFalse", stack::push_false);
    builtin!(table, opcodes::PUSH_TRUE, "PushTrue", stack::push_true);
    builtin!(table, opcodes::PUSH_STRING, "PushString", stack::push_string);
    builtin!(table, opcodes::PUSH_CONSTANT, "PushConstant", stack::push_constant);
    builtin!(table, opcodes::PUSH_LOCAL_VARIABLE, "PushLocalVariable", stack::push_local_variable);
    builtin!(table, opcodes::POP_TO_LOCAL_VARIABLE, "PopToLocalVariable", stack::pop_to_local_variable);
    builtin!(table, opcodes::INC, "Inc", arith::inc);
    builtin!(table, opcodes::DEC, "Dec", arith::dec);
    builtin!(table, opcodes::DUPLICATE, "Duplicate", stack::duplicate);
    builtin!(table, opcodes::DUPLICATE_INSERT, "DuplicateInsert", stack::duplicate_insert);
    builtin!(table, opcodes::DISCARD, "Discard", stack::discard);
    builtin!(table, opcodes::DESTRUCT, "Destruct", control::destruct);
    builtin!(table, opcodes::BREAK, "Break", control::break_loop);
    builtin!(table, opcodes::CONTINUE, "Continue", control::continue_loop);
    builtin!(table, opcodes::JUMP, "Jump", control::jump);
    builtin!(table, opcodes::JUMP_IF_FALSE, "JumpIfFalse", control::jump_if_false);
    builtin!(table, opcodes::JUMP_IF_TRUE, "JumpIfTrue", control::jump_if_true);
    builtin!(table, opcodes::RETURN, "Return", control::ret);
    builtin!(table, opcodes::RETURN_VALUE, "ReturnValue", control::ret);
    builtin!(table, opcodes::FOR_RANGE_INIT, "ForRangeInit", control::for_range_init);
    builtin!(table, opcodes::FOR_RANGE_ITERATE, "ForRangeIterate", control::for_range_iterate);
    builtin!(table, opcodes::FOR_RANGE_TERMINATE, "ForRangeTerminate", control::for_range_terminate);
    builtin!(table, opcodes::INVOKE_USER_DEFINED_FREE_FUNCTION, "InvokeUserDefinedFreeFunction", invoke::invoke_user_defined_free_function);
    builtin!(table, opcodes::LOCAL_VARIABLE_PREFIX_INC, "LocalVariablePrefixInc", arith::local_variable_prefix_inc);
    builtin!(table, opcodes::LOCAL_VARIABLE_PREFIX_DEC, "LocalVariablePrefixDec", arith::local_variable_prefix_dec);
    builtin!(table, opcodes::LOCAL_VARIABLE_POSTFIX_INC, "LocalVariablePostfixInc", arith::local_variable_postfix_inc);
    builtin!(table, opcodes::LOCAL_VARIABLE_POSTFIX_DEC, "LocalVariablePostfixDec", arith::local_variable_postfix_dec);
    builtin!(table, opcodes::JUMP_IF_FALSE_OR_POP, "JumpIfFalseOrPop", control::jump_if_false_or_pop);
    builtin!(table, opcodes::JUMP_IF_TRUE_OR_POP, "JumpIfTrueOrPop", control::jump_if_true_or_pop);
    builtin!(table, opcodes::NOT, "Not", arith::not);
    builtin!(table, opcodes::PRIMITIVE_EQUAL, "PrimitiveEqual", arith::primitive_equal);
    builtin!(table, opcodes::OBJECT_EQUAL, "ObjectEqual", object_ops::object_equal);
    builtin!(table, opcodes::PRIMITIVE_NOT_EQUAL, "PrimitiveNotEqual", arith::primitive_not_equal);
    builtin!(table, opcodes::OBJECT_NOT_EQUAL, "ObjectNotEqual", object_ops::object_not_equal);
    builtin!(table, opcodes::PRIMITIVE_LESS_THAN, "PrimitiveLessThan", arith::primitive_less_than);
    builtin!(table, opcodes::OBJECT_LESS_THAN, "ObjectLessThan", object_ops::object_less_than);
    builtin!(table, opcodes::PRIMITIVE_LESS_THAN_OR_EQUAL, "PrimitiveLessThanOrEqual", arith::primitive_less_than_or_equal);
    builtin!(table, opcodes::OBJECT_LESS_THAN_OR_EQUAL, "ObjectLessThanOrEqual", object_ops::object_less_than_or_equal);
    builtin!(table, opcodes::PRIMITIVE_GREATER_THAN, "PrimitiveGreaterThan", arith::primitive_greater_than);
    builtin!(table, opcodes::OBJECT_GREATER_THAN, "ObjectGreaterThan", object_ops::object_greater_than);
    builtin!(table, opcodes::PRIMITIVE_GREATER_THAN_OR_EQUAL, "PrimitiveGreaterThanOrEqual", arith::primitive_greater_than_or_equal);
    builtin!(table, opcodes::OBJECT_GREATER_THAN_OR_EQUAL, "ObjectGreaterThanOrEqual", object_ops::object_greater_than_or_equal);
    builtin!(table, opcodes::PRIMITIVE_NEGATE, "PrimitiveNegate", arith::primitive_negate);
    builtin!(table, opcodes::OBJECT_NEGATE, "ObjectNegate", object_ops::object_negate);
    builtin!(table, opcodes::PRIMITIVE_ADD, "PrimitiveAdd", arith::primitive_add);
    builtin!(table, opcodes::OBJECT_ADD, "ObjectAdd", object_ops::object_add);
    builtin!(table, opcodes::OBJECT_LEFT_ADD, "ObjectLeftAdd", object_ops::object_left_add);
    builtin!(table, opcodes::OBJECT_RIGHT_ADD, "ObjectRightAdd", object_ops::object_right_add);
    builtin!(table, opcodes::LOCAL_VARIABLE_PRIMITIVE_INPLACE_ADD, "LocalVariablePrimitiveInplaceAdd", arith::local_variable_primitive_inplace_add);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_ADD, "LocalVariableObjectInplaceAdd", object_ops::local_variable_object_inplace_add);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_ADD, "LocalVariableObjectInplaceRightAdd", object_ops::local_variable_object_inplace_right_add);
    builtin!(table, opcodes::PRIMITIVE_SUBTRACT, "PrimitiveSubtract", arith::primitive_subtract);
    builtin!(table, opcodes::OBJECT_SUBTRACT, "ObjectSubtract", object_ops::object_subtract);
    builtin!(table, opcodes::OBJECT_LEFT_SUBTRACT, "ObjectLeftSubtract", object_ops::object_left_subtract);
    builtin!(table, opcodes::OBJECT_RIGHT_SUBTRACT, "ObjectRightSubtract", object_ops::object_right_subtract);
    builtin!(table, opcodes::LOCAL_VARIABLE_PRIMITIVE_INPLACE_SUBTRACT, "LocalVariablePrimitiveInplaceSubtract", arith::local_variable_primitive_inplace_subtract);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_SUBTRACT, "LocalVariableObjectInplaceSubtract", object_ops::local_variable_object_inplace_subtract);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_SUBTRACT, "LocalVariableObjectInplaceRightSubtract", object_ops::local_variable_object_inplace_right_subtract);
    builtin!(table, opcodes::PRIMITIVE_MULTIPLY, "PrimitiveMultiply", arith::primitive_multiply);
    builtin!(table, opcodes::OBJECT_MULTIPLY, "ObjectMultiply", object_ops::object_multiply);
    builtin!(table, opcodes::OBJECT_LEFT_MULTIPLY, "ObjectLeftMultiply", object_ops::object_left_multiply);
    builtin!(table, opcodes::OBJECT_RIGHT_MULTIPLY, "ObjectRightMultiply", object_ops::object_right_multiply);
    builtin!(table, opcodes::LOCAL_VARIABLE_PRIMITIVE_INPLACE_MULTIPLY, "LocalVariablePrimitiveInplaceMultiply", arith::local_variable_primitive_inplace_multiply);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_MULTIPLY, "LocalVariableObjectInplaceMultiply", object_ops::local_variable_object_inplace_multiply);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_MULTIPLY, "LocalVariableObjectInplaceRightMultiply", object_ops::local_variable_object_inplace_right_multiply);
    builtin!(table, opcodes::PRIMITIVE_DIVIDE, "PrimitiveDivide", arith::primitive_divide);
    builtin!(table, opcodes::OBJECT_DIVIDE, "ObjectDivide", object_ops::object_divide);
    builtin!(table, opcodes::OBJECT_LEFT_DIVIDE, "ObjectLeftDivide", object_ops::object_left_divide);
    builtin!(table, opcodes::OBJECT_RIGHT_DIVIDE, "ObjectRightDivide", object_ops::object_right_divide);
    builtin!(table, opcodes::LOCAL_VARIABLE_PRIMITIVE_INPLACE_DIVIDE, "LocalVariablePrimitiveInplaceDivide", arith::local_variable_primitive_inplace_divide);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_DIVIDE, "LocalVariableObjectInplaceDivide", object_ops::local_variable_object_inplace_divide);
    builtin!(table, opcodes::LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_DIVIDE, "LocalVariableObjectInplaceRightDivide", object_ops::local_variable_object_inplace_right_divide);
    builtin!(table, opcodes::PRIMITIVE_MODULO, "PrimitiveModulo", arith::primitive_modulo);
    builtin!(table, opcodes::LOCAL_VARIABLE_PRIMITIVE_INPLACE_MODULO, "LocalVariablePrimitiveInplaceModulo", arith::local_variable_primitive_inplace_modulo);
    builtin!(table, opcodes::INITIALISE_ARRAY, "InitialiseArray", invoke::initialise_array);
    builtin!(table, opcodes::CONTRACT_VARIABLE_DECLARE_ASSIGN, "ContractVariableDeclareAssign", invoke::contract_variable_declare_assign);
    builtin!(table, opcodes::INVOKE_CONTRACT_FUNCTION, "InvokeContractFunction", invoke::invoke_contract_function);
    builtin!(table, opcodes::PUSH_LARGE_CONSTANT, "PushLargeConstant", stack::push_large_constant);
    builtin!(table, opcodes::PUSH_MEMBER_VARIABLE, "PushMemberVariable", object_ops::push_member_variable);
    builtin!(table, opcodes::POP_TO_MEMBER_VARIABLE, "PopToMemberVariable", object_ops::pop_to_member_variable);
    builtin!(table, opcodes::MEMBER_VARIABLE_PREFIX_INC, "MemberVariablePrefixInc", object_ops::member_variable_prefix_inc);
    builtin!(table, opcodes::MEMBER_VARIABLE_PREFIX_DEC, "MemberVariablePrefixDec", object_ops::member_variable_prefix_dec);
    builtin!(table, opcodes::MEMBER_VARIABLE_POSTFIX_INC, "MemberVariablePostfixInc", object_ops::member_variable_postfix_inc);
    builtin!(table, opcodes::MEMBER_VARIABLE_POSTFIX_DEC, "MemberVariablePostfixDec", object_ops::member_variable_postfix_dec);
    builtin!(table, opcodes::MEMBER_VARIABLE_PRIMITIVE_INPLACE_ADD, "MemberVariablePrimitiveInplaceAdd", object_ops::member_variable_primitive_inplace_add);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_ADD, "MemberVariableObjectInplaceAdd", object_ops::member_variable_object_inplace_add);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_ADD, "MemberVariableObjectInplaceRightAdd", object_ops::member_variable_object_inplace_right_add);
    builtin!(table, opcodes::MEMBER_VARIABLE_PRIMITIVE_INPLACE_SUBTRACT, "MemberVariablePrimitiveInplaceSubtract", object_ops::member_variable_primitive_inplace_subtract);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_SUBTRACT, "MemberVariableObjectInplaceSubtract", object_ops::member_variable_object_inplace_subtract);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_SUBTRACT, "MemberVariableObjectInplaceRightSubtract", object_ops::member_variable_object_inplace_right_subtract);
    builtin!(table, opcodes::MEMBER_VARIABLE_PRIMITIVE_INPLACE_MULTIPLY, "MemberVariablePrimitiveInplaceMultiply", object_ops::member_variable_primitive_inplace_multiply);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_MULTIPLY, "MemberVariableObjectInplaceMultiply", object_ops::member_variable_object_inplace_multiply);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_MULTIPLY, "MemberVariableObjectInplaceRightMultiply", object_ops::member_variable_object_inplace_right_multiply);
    builtin!(table, opcodes::MEMBER_VARIABLE_PRIMITIVE_INPLACE_DIVIDE, "MemberVariablePrimitiveInplaceDivide", object_ops::member_variable_primitive_inplace_divide);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_DIVIDE, "MemberVariableObjectInplaceDivide", object_ops::member_variable_object_inplace_divide);
    builtin!(table, opcodes::MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_DIVIDE, "MemberVariableObjectInplaceRightDivide", object_ops::member_variable_object_inplace_right_divide);
    builtin!(table, opcodes::MEMBER_VARIABLE_PRIMITIVE_INPLACE_MODULO, "MemberVariablePrimitiveInplaceModulo", object_ops::member_variable_primitive_inplace_modulo);
    builtin!(table, opcodes::PUSH_SELF, "PushSelf", stack::push_self);
    builtin!(table, opcodes::INVOKE_USER_DEFINED_CONSTRUCTOR, "InvokeUserDefinedConstructor", invoke::invoke_user_defined_constructor);
    builtin!(table, opcodes::INVOKE_USER_DEFINED_MEMBER_FUNCTION, "InvokeUserDefinedMemberFunction", invoke::invoke_user_defined_member_function);
    builtin!(table, opcodes::PUSH_INDEXED_VALUE, "PushIndexedValue", object_ops::push_indexed_value);
    builtin!(table, opcodes::POP_TO_INDEXED_VALUE, "PopToIndexedValue", object_ops::pop_to_indexed_value);
}
