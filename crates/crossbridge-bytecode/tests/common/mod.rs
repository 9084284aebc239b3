#![allow(dead_code)]

use crossbridge_bytecode::{Assembler, CodecResult};
use crossbridge_object::source::CodeObject;
use crossbridge_object::SourceValue;

// --- Test Helpers ---

/// ```text
/// def safe_div(a, b):
///     try:
///         return a / b
///     except ZeroDivisionError:
///         return None
/// ```
pub fn safe_div_code() -> CodecResult<CodeObject> {
    let mut asm = Assembler::new();
    let body = asm.label();
    let handler = asm.label();
    let reraise = asm.label();

    asm.line(1);
    asm.emit("RESUME", 0)?;
    asm.line(2);
    asm.emit("NOP", 0)?;
    asm.bind(body)?;
    asm.line(3);
    asm.emit("LOAD_FAST", 0)?;
    asm.emit("LOAD_FAST", 1)?;
    asm.emit("BINARY_OP", 11)?;
    asm.emit("RETURN_VALUE", 0)?;
    asm.bind(handler)?;
    asm.line(4);
    asm.emit("PUSH_EXC_INFO", 0)?;
    asm.emit("LOAD_GLOBAL", 0)?;
    asm.emit("CHECK_EXC_MATCH", 0)?;
    asm.jump("POP_JUMP_FORWARD_IF_FALSE", reraise)?;
    asm.emit("POP_TOP", 0)?;
    asm.line(5);
    asm.emit("POP_EXCEPT", 0)?;
    asm.emit("LOAD_CONST", 0)?;
    asm.emit("RETURN_VALUE", 0)?;
    asm.bind(reraise)?;
    asm.emit("RERAISE", 0)?;

    asm.protect(body, handler, handler, 0, false);
    asm.protect(handler, reraise, reraise, 1, true);

    let mut code = CodeObject {
        name: "safe_div".into(),
        qualname: "safe_div".into(),
        filename: "calc.py".into(),
        first_line: 1,
        consts: vec![SourceValue::none()],
        names: vec!["ZeroDivisionError".into()],
        varnames: vec!["a".into(), "b".into()],
        argcount: 2,
        ..Default::default()
    };
    asm.finish()?.install(&mut code);
    Ok(code)
}

/// A counting loop whose jump runs backwards.
///
/// ```text
/// def count(n):
///     while n:
///         n -= 1
///     return n
/// ```
pub fn countdown_code() -> CodecResult<CodeObject> {
    let mut asm = Assembler::new();
    let head = asm.label();
    let exit = asm.label();

    asm.line(1);
    asm.emit("RESUME", 0)?;
    asm.bind(head)?;
    asm.line(2);
    asm.emit("LOAD_FAST", 0)?;
    asm.jump("POP_JUMP_FORWARD_IF_FALSE", exit)?;
    asm.line(3);
    asm.emit("LOAD_FAST", 0)?;
    asm.emit("LOAD_CONST", 1)?;
    asm.emit("BINARY_OP", 23)?;
    asm.emit("STORE_FAST", 0)?;
    asm.jump("JUMP_BACKWARD", head)?;
    asm.bind(exit)?;
    asm.line(4);
    asm.emit("LOAD_FAST", 0)?;
    asm.emit("RETURN_VALUE", 0)?;

    let mut code = CodeObject {
        name: "count".into(),
        qualname: "count".into(),
        consts: vec![SourceValue::none(), SourceValue::int(1)],
        varnames: vec!["n".into()],
        argcount: 1,
        ..Default::default()
    };
    asm.finish()?.install(&mut code);
    Ok(code)
}
