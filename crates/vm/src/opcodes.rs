//! Built-in opcode numbers.
//!
//! The opcode space is open: entries below [`NUM_RESERVED`] are the fixed
//! built-ins enumerated here, and entries at or above it are assigned during
//! module setup, one per registered host function. That open upper range is
//! why opcodes are plain `u16` constants rather than a closed enum.

pub const UNKNOWN: u16 = 0;

// Declarations
pub const LOCAL_VARIABLE_DECLARE: u16 = 1;
pub const LOCAL_VARIABLE_DECLARE_ASSIGN: u16 = 2;

// Stack & variables
pub const PUSH_NULL: u16 = 3;
pub const PUSH_FALSE: u16 = 4;
pub const PUSH_TRUE: u16 = 5;
pub const PUSH_STRING: u16 = 6;
pub const PUSH_CONSTANT: u16 = 7;
pub const PUSH_LOCAL_VARIABLE: u16 = 8;
pub const POP_TO_LOCAL_VARIABLE: u16 = 9;
pub const INC: u16 = 10;
pub const DEC: u16 = 11;
pub const DUPLICATE: u16 = 12;
pub const DUPLICATE_INSERT: u16 = 13;
pub const DISCARD: u16 = 14;

// Control flow
pub const DESTRUCT: u16 = 15;
pub const BREAK: u16 = 16;
pub const CONTINUE: u16 = 17;
pub const JUMP: u16 = 18;
pub const JUMP_IF_FALSE: u16 = 19;
pub const JUMP_IF_TRUE: u16 = 20;
pub const RETURN: u16 = 21;
pub const RETURN_VALUE: u16 = 22;

// Loops
pub const FOR_RANGE_INIT: u16 = 23;
pub const FOR_RANGE_ITERATE: u16 = 24;
pub const FOR_RANGE_TERMINATE: u16 = 25;

pub const INVOKE_USER_DEFINED_FREE_FUNCTION: u16 = 26;

// Prefix/postfix
pub const LOCAL_VARIABLE_PREFIX_INC: u16 = 27;
pub const LOCAL_VARIABLE_PREFIX_DEC: u16 = 28;
pub const LOCAL_VARIABLE_POSTFIX_INC: u16 = 29;
pub const LOCAL_VARIABLE_POSTFIX_DEC: u16 = 30;

// Short-circuit jumps
pub const JUMP_IF_FALSE_OR_POP: u16 = 31;
pub const JUMP_IF_TRUE_OR_POP: u16 = 32;

// Unary
pub const NOT: u16 = 33;

// Relational
pub const PRIMITIVE_EQUAL: u16 = 34;
pub const OBJECT_EQUAL: u16 = 35;
pub const PRIMITIVE_NOT_EQUAL: u16 = 36;
pub const OBJECT_NOT_EQUAL: u16 = 37;
pub const PRIMITIVE_LESS_THAN: u16 = 38;
pub const OBJECT_LESS_THAN: u16 = 39;
pub const PRIMITIVE_LESS_THAN_OR_EQUAL: u16 = 40;
pub const OBJECT_LESS_THAN_OR_EQUAL: u16 = 41;
pub const PRIMITIVE_GREATER_THAN: u16 = 42;
pub const OBJECT_GREATER_THAN: u16 = 43;
pub const PRIMITIVE_GREATER_THAN_OR_EQUAL: u16 = 44;
pub const OBJECT_GREATER_THAN_OR_EQUAL: u16 = 45;

// Negation
pub const PRIMITIVE_NEGATE: u16 = 46;
pub const OBJECT_NEGATE: u16 = 47;

// Add
pub const PRIMITIVE_ADD: u16 = 48;
pub const OBJECT_ADD: u16 = 49;
pub const OBJECT_LEFT_ADD: u16 = 50;
pub const OBJECT_RIGHT_ADD: u16 = 51;
pub const LOCAL_VARIABLE_PRIMITIVE_INPLACE_ADD: u16 = 52;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_ADD: u16 = 53;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_ADD: u16 = 54;

// Subtract
pub const PRIMITIVE_SUBTRACT: u16 = 55;
pub const OBJECT_SUBTRACT: u16 = 56;
pub const OBJECT_LEFT_SUBTRACT: u16 = 57;
pub const OBJECT_RIGHT_SUBTRACT: u16 = 58;
pub const LOCAL_VARIABLE_PRIMITIVE_INPLACE_SUBTRACT: u16 = 59;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_SUBTRACT: u16 = 60;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_SUBTRACT: u16 = 61;

// Multiply
pub const PRIMITIVE_MULTIPLY: u16 = 62;
pub const OBJECT_MULTIPLY: u16 = 63;
pub const OBJECT_LEFT_MULTIPLY: u16 = 64;
pub const OBJECT_RIGHT_MULTIPLY: u16 = 65;
pub const LOCAL_VARIABLE_PRIMITIVE_INPLACE_MULTIPLY: u16 = 66;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_MULTIPLY: u16 = 67;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_MULTIPLY: u16 = 68;

// Divide
pub const PRIMITIVE_DIVIDE: u16 = 69;
pub const OBJECT_DIVIDE: u16 = 70;
pub const OBJECT_LEFT_DIVIDE: u16 = 71;
pub const OBJECT_RIGHT_DIVIDE: u16 = 72;
pub const LOCAL_VARIABLE_PRIMITIVE_INPLACE_DIVIDE: u16 = 73;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_DIVIDE: u16 = 74;
pub const LOCAL_VARIABLE_OBJECT_INPLACE_RIGHT_DIVIDE: u16 = 75;

// Modulo
pub const PRIMITIVE_MODULO: u16 = 76;
pub const LOCAL_VARIABLE_PRIMITIVE_INPLACE_MODULO: u16 = 77;

// Construction
pub const INITIALISE_ARRAY: u16 = 78;
pub const CONTRACT_VARIABLE_DECLARE_ASSIGN: u16 = 79;
pub const INVOKE_CONTRACT_FUNCTION: u16 = 80;
pub const PUSH_LARGE_CONSTANT: u16 = 81;

// Member variables
pub const PUSH_MEMBER_VARIABLE: u16 = 82;
pub const POP_TO_MEMBER_VARIABLE: u16 = 83;
pub const MEMBER_VARIABLE_PREFIX_INC: u16 = 84;
pub const MEMBER_VARIABLE_PREFIX_DEC: u16 = 85;
pub const MEMBER_VARIABLE_POSTFIX_INC: u16 = 86;
pub const MEMBER_VARIABLE_POSTFIX_DEC: u16 = 87;
pub const MEMBER_VARIABLE_PRIMITIVE_INPLACE_ADD: u16 = 88;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_ADD: u16 = 89;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_ADD: u16 = 90;
pub const MEMBER_VARIABLE_PRIMITIVE_INPLACE_SUBTRACT: u16 = 91;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_SUBTRACT: u16 = 92;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_SUBTRACT: u16 = 93;
pub const MEMBER_VARIABLE_PRIMITIVE_INPLACE_MULTIPLY: u16 = 94;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_MULTIPLY: u16 = 95;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_MULTIPLY: u16 = 96;
pub const MEMBER_VARIABLE_PRIMITIVE_INPLACE_DIVIDE: u16 = 97;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_DIVIDE: u16 = 98;
pub const MEMBER_VARIABLE_OBJECT_INPLACE_RIGHT_DIVIDE: u16 = 99;
pub const MEMBER_VARIABLE_PRIMITIVE_INPLACE_MODULO: u16 = 100;

pub const PUSH_SELF: u16 = 101;
pub const INVOKE_USER_DEFINED_CONSTRUCTOR: u16 = 102;
pub const INVOKE_USER_DEFINED_MEMBER_FUNCTION: u16 = 103;

// Indexed container access
pub const PUSH_INDEXED_VALUE: u16 = 104;
pub const POP_TO_INDEXED_VALUE: u16 = 105;

/// End of the built-in range; host-function opcodes start here.
pub const NUM_RESERVED: u16 = 106;
