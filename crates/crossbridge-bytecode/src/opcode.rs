//! Opcode table of the 3.11 wordcode format.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Opcodes at or above this value take an argument.
pub const HAVE_ARGUMENT: u8 = 90;

pub const CACHE: u8 = 0;
pub const EXTENDED_ARG: u8 = 144;

/// How an instruction's argument is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    None,
    Raw,
    Const,
    Name,
    /// `LOAD_GLOBAL`: name index shifted left once, low bit pushes `NULL`.
    GlobalName,
    Local,
    /// Index into locals, then cells, then free variables.
    Free,
    ForwardJump,
    BackwardJump,
    Compare,
    BinaryOp,
    FormatValue,
    MakeFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    pub code: u8,
    pub name: &'static str,
    /// Inline cache code units following the instruction.
    pub caches: u8,
    pub operand: Operand,
}

impl Opcode {
    pub fn has_arg(&self) -> bool {
        self.code >= HAVE_ARGUMENT
    }

    pub fn is_jump(&self) -> bool {
        matches!(self.operand, Operand::ForwardJump | Operand::BackwardJump)
    }

    /// Byte offset of the code unit after this instruction and its caches.
    pub fn next_offset(&self, offset: u32) -> u32 {
        offset + 2 + 2 * u32::from(self.caches)
    }

    /// Byte offset a jump at `offset` with argument `arg` lands on.
    pub fn jump_target(&self, offset: u32, arg: u32) -> Option<u32> {
        match self.operand {
            Operand::ForwardJump => Some(self.next_offset(offset) + arg * 2),
            Operand::BackwardJump => self.next_offset(offset).checked_sub(arg * 2),
            _ => None,
        }
    }
}

macro_rules! opcodes {
    ($($code:literal $name:ident $caches:literal $operand:ident;)*) => {
        const TABLE: &[Opcode] = &[
            $(Opcode { code: $code, name: stringify!($name), caches: $caches, operand: Operand::$operand },)*
        ];
    };
}

opcodes! {
    0 CACHE 0 None;
    1 POP_TOP 0 None;
    2 PUSH_NULL 0 None;
    9 NOP 0 None;
    10 UNARY_POSITIVE 0 None;
    11 UNARY_NEGATIVE 0 None;
    12 UNARY_NOT 0 None;
    15 UNARY_INVERT 0 None;
    25 BINARY_SUBSCR 4 None;
    30 GET_LEN 0 None;
    31 MATCH_MAPPING 0 None;
    32 MATCH_SEQUENCE 0 None;
    33 MATCH_KEYS 0 None;
    35 PUSH_EXC_INFO 0 None;
    36 CHECK_EXC_MATCH 0 None;
    37 CHECK_EG_MATCH 0 None;
    49 WITH_EXCEPT_START 0 None;
    50 GET_AITER 0 None;
    51 GET_ANEXT 0 None;
    52 BEFORE_ASYNC_WITH 0 None;
    53 BEFORE_WITH 0 None;
    54 END_ASYNC_FOR 0 None;
    60 STORE_SUBSCR 1 None;
    61 DELETE_SUBSCR 0 None;
    68 GET_ITER 0 None;
    69 GET_YIELD_FROM_ITER 0 None;
    70 PRINT_EXPR 0 None;
    71 LOAD_BUILD_CLASS 0 None;
    74 LOAD_ASSERTION_ERROR 0 None;
    75 RETURN_GENERATOR 0 None;
    82 LIST_TO_TUPLE 0 None;
    83 RETURN_VALUE 0 None;
    84 IMPORT_STAR 0 None;
    85 SETUP_ANNOTATIONS 0 None;
    86 YIELD_VALUE 0 None;
    87 ASYNC_GEN_WRAP 0 None;
    88 PREP_RERAISE_STAR 0 None;
    89 POP_EXCEPT 0 None;
    90 STORE_NAME 0 Name;
    91 DELETE_NAME 0 Name;
    92 UNPACK_SEQUENCE 1 Raw;
    93 FOR_ITER 0 ForwardJump;
    94 UNPACK_EX 0 Raw;
    95 STORE_ATTR 4 Name;
    96 DELETE_ATTR 0 Name;
    97 STORE_GLOBAL 0 Name;
    98 DELETE_GLOBAL 0 Name;
    99 SWAP 0 Raw;
    100 LOAD_CONST 0 Const;
    101 LOAD_NAME 0 Name;
    102 BUILD_TUPLE 0 Raw;
    103 BUILD_LIST 0 Raw;
    104 BUILD_SET 0 Raw;
    105 BUILD_MAP 0 Raw;
    106 LOAD_ATTR 4 Name;
    107 COMPARE_OP 2 Compare;
    108 IMPORT_NAME 0 Name;
    109 IMPORT_FROM 0 Name;
    110 JUMP_FORWARD 0 ForwardJump;
    111 JUMP_IF_FALSE_OR_POP 0 ForwardJump;
    112 JUMP_IF_TRUE_OR_POP 0 ForwardJump;
    114 POP_JUMP_FORWARD_IF_FALSE 0 ForwardJump;
    115 POP_JUMP_FORWARD_IF_TRUE 0 ForwardJump;
    116 LOAD_GLOBAL 5 GlobalName;
    117 IS_OP 0 Raw;
    118 CONTAINS_OP 0 Raw;
    119 RERAISE 0 Raw;
    120 COPY 0 Raw;
    122 BINARY_OP 1 BinaryOp;
    123 SEND 0 ForwardJump;
    124 LOAD_FAST 0 Local;
    125 STORE_FAST 0 Local;
    126 DELETE_FAST 0 Local;
    128 POP_JUMP_FORWARD_IF_NOT_NONE 0 ForwardJump;
    129 POP_JUMP_FORWARD_IF_NONE 0 ForwardJump;
    130 RAISE_VARARGS 0 Raw;
    131 GET_AWAITABLE 0 Raw;
    132 MAKE_FUNCTION 0 MakeFunction;
    133 BUILD_SLICE 0 Raw;
    134 JUMP_BACKWARD_NO_INTERRUPT 0 BackwardJump;
    135 MAKE_CELL 0 Free;
    136 LOAD_CLOSURE 0 Free;
    137 LOAD_DEREF 0 Free;
    138 STORE_DEREF 0 Free;
    139 DELETE_DEREF 0 Free;
    140 JUMP_BACKWARD 0 BackwardJump;
    142 CALL_FUNCTION_EX 0 Raw;
    144 EXTENDED_ARG 0 Raw;
    145 LIST_APPEND 0 Raw;
    146 SET_ADD 0 Raw;
    147 MAP_ADD 0 Raw;
    148 LOAD_CLASSDEREF 0 Free;
    149 COPY_FREE_VARS 0 Raw;
    151 RESUME 0 Raw;
    152 MATCH_CLASS 0 Raw;
    155 FORMAT_VALUE 0 FormatValue;
    156 BUILD_CONST_KEY_MAP 0 Raw;
    157 BUILD_STRING 0 Raw;
    160 LOAD_METHOD 10 Name;
    162 LIST_EXTEND 0 Raw;
    163 SET_UPDATE 0 Raw;
    164 DICT_MERGE 0 Raw;
    165 DICT_UPDATE 0 Raw;
    166 PRECALL 1 Raw;
    171 CALL 4 Raw;
    172 KW_NAMES 0 Const;
    173 POP_JUMP_BACKWARD_IF_NOT_NONE 0 BackwardJump;
    174 POP_JUMP_BACKWARD_IF_NONE 0 BackwardJump;
    175 POP_JUMP_BACKWARD_IF_FALSE 0 BackwardJump;
    176 POP_JUMP_BACKWARD_IF_TRUE 0 BackwardJump;
}

static BY_CODE: Lazy<[Option<Opcode>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    for opcode in TABLE {
        table[usize::from(opcode.code)] = Some(*opcode);
    }
    table
});

static BY_NAME: Lazy<FxHashMap<&'static str, Opcode>> =
    Lazy::new(|| TABLE.iter().map(|opcode| (opcode.name, *opcode)).collect());

pub fn by_code(code: u8) -> Option<Opcode> {
    BY_CODE[usize::from(code)]
}

pub fn by_name(name: &str) -> Option<Opcode> {
    BY_NAME.get(name).copied()
}

pub const COMPARE_OPS: [&str; 6] = ["<", "<=", "==", "!=", ">", ">="];

pub const BINARY_OPS: [&str; 26] = [
    "+", "&", "//", "<<", "@", "*", "%", "|", "**", ">>", "-", "/", "^", "+=", "&=", "//=", "<<=", "@=", "*=",
    "%=", "|=", "**=", ">>=", "-=", "/=", "^=",
];

pub const FORMAT_CONVERTERS: [&str; 4] = ["", "str", "repr", "ascii"];

pub const MAKE_FUNCTION_FLAGS: [&str; 4] = ["defaults", "kwdefaults", "annotations", "closure"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_agree() {
        for opcode in TABLE {
            assert_eq!(by_code(opcode.code), Some(*opcode));
            assert_eq!(by_name(opcode.name), Some(*opcode));
        }
        assert_eq!(by_code(255), None);
    }

    #[test]
    fn backward_jumps_count_from_the_next_instruction() {
        let jump = by_name("JUMP_BACKWARD").unwrap();
        assert_eq!(jump.jump_target(20, 4), Some(14));
        let call = by_name("CALL").unwrap();
        assert_eq!(call.next_offset(10), 20);
    }
}
