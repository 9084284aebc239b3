//! Wordcode disassembly into normalized instruction records.

use std::fmt::Write;

use crossbridge_object::source::CodeObject;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{CodecError, CodecResult};
use crate::exception_table;
use crate::instruction::InstructionRecord;
use crate::opcode::{self, Opcode, Operand, EXTENDED_ARG};

struct Unit {
    /// Byte offset.
    offset: u32,
    opcode: Opcode,
    arg: Option<u32>,
    is_cache: bool,
}

/// Disassembles `code`, one record per code unit.
///
/// Jump targets come from relative jumps and exception handlers; line
/// markers come from `line_starts`.
pub fn disassemble(code: &CodeObject) -> CodecResult<Vec<InstructionRecord>> {
    let entries = exception_table::parse(&code.exception_table)?;
    let units = decode_units(&code.code)?;

    let mut labels: FxHashSet<u32> = units
        .iter()
        .filter_map(|unit| unit.arg.and_then(|arg| unit.opcode.jump_target(unit.offset, arg)))
        .collect();
    labels.extend(entries.iter().map(|entry| entry.target * 2));

    let lines: FxHashMap<u32, u32> = code.line_starts.iter().copied().collect();
    let free_names = cell_and_free_names(code);

    let records: Vec<InstructionRecord> = units
        .iter()
        .map(|unit| {
            let name = if unit.is_cache { "CACHE" } else { unit.opcode.name };
            let mut record =
                InstructionRecord::at_offset(name, unit.offset / 2).with_jump_target(labels.contains(&unit.offset));
            if let Some(arg) = unit.arg {
                let argrepr =
                    if unit.is_cache { String::new() } else { render_arg(code, &free_names, unit, arg) };
                record = record.with_arg(arg, argrepr);
            }
            match lines.get(&unit.offset) {
                Some(&line) if line != 0 && !unit.is_cache => record.starting_line(line),
                _ => record,
            }
        })
        .collect();
    log::trace!("disassembled {} code units of {}", records.len(), code.qualname);
    Ok(records)
}

fn decode_units(bytes: &[u8]) -> CodecResult<Vec<Unit>> {
    if bytes.len() % 2 != 0 {
        return Err(CodecError::MalformedEncoding {
            offset: bytes.len() - 1,
            reason: "wordcode has an odd number of bytes".to_string(),
        });
    }
    let cache = opcode::by_code(opcode::CACHE).ok_or(CodecError::UnknownOpcode { opcode: opcode::CACHE, offset: 0 })?;
    let mut units = Vec::with_capacity(bytes.len() / 2);
    let mut extended: u32 = 0;
    let mut position = 0;
    while position < bytes.len() {
        let (code, raw) = (bytes[position], bytes[position + 1]);
        let opcode = opcode::by_code(code).ok_or(CodecError::UnknownOpcode { opcode: code, offset: position })?;
        let arg = opcode.has_arg().then(|| u32::from(raw) | extended);
        extended = match arg {
            Some(arg) if code == EXTENDED_ARG => arg << 8,
            _ => 0,
        };
        units.push(Unit { offset: position as u32, opcode, arg, is_cache: false });
        position += 2;
        for _ in 0..opcode.caches {
            if position >= bytes.len() {
                break;
            }
            units.push(Unit { offset: position as u32, opcode: cache, arg: Some(0), is_cache: true });
            position += 2;
        }
    }
    Ok(units)
}

/// Locals, then cells that are not also locals, then free variables.
fn cell_and_free_names(code: &CodeObject) -> Vec<&str> {
    let mut names: Vec<&str> = code.varnames.iter().map(String::as_str).collect();
    for cell in &code.cellvars {
        if !code.varnames.contains(cell) {
            names.push(cell);
        }
    }
    names.extend(code.freevars.iter().map(String::as_str));
    names
}

fn render_arg(code: &CodeObject, free_names: &[&str], unit: &Unit, arg: u32) -> String {
    let index = arg as usize;
    let lookup = |table: &[String], index: usize| table.get(index).cloned().unwrap_or_else(|| index.to_string());
    match unit.opcode.operand {
        Operand::None | Operand::Raw => String::new(),
        Operand::Const => code.consts.get(index).map(|c| c.repr()).unwrap_or_else(|| arg.to_string()),
        Operand::Name => lookup(&code.names, index),
        Operand::GlobalName => {
            let name = lookup(&code.names, index >> 1);
            if arg & 1 == 1 {
                format!("NULL + {name}")
            } else {
                name
            }
        }
        Operand::Local => lookup(&code.varnames, index),
        Operand::Free => free_names.get(index).map(|s| s.to_string()).unwrap_or_else(|| arg.to_string()),
        Operand::ForwardJump | Operand::BackwardJump => unit
            .opcode
            .jump_target(unit.offset, arg)
            .map(|target| format!("to {target}"))
            .unwrap_or_default(),
        Operand::Compare => opcode::COMPARE_OPS.get(index).map(|s| s.to_string()).unwrap_or_default(),
        Operand::BinaryOp => opcode::BINARY_OPS.get(index).map(|s| s.to_string()).unwrap_or_default(),
        Operand::FormatValue => {
            let mut out = opcode::FORMAT_CONVERTERS[index & 0x3].to_string();
            if arg & 0x4 != 0 {
                if !out.is_empty() {
                    out.push_str(", ");
                }
                out.push_str("with format");
            }
            out
        }
        Operand::MakeFunction => opcode::MAKE_FUNCTION_FLAGS
            .iter()
            .enumerate()
            .filter(|(bit, _)| arg & (1u32 << *bit) != 0)
            .map(|(_, flag)| *flag)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Human-readable listing in the style of the source runtime's `dis`.
pub fn format_listing(records: &[InstructionRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let line = record.starts_line.map(|l| l.to_string()).unwrap_or_default();
        let marker = if record.is_jump_target { ">>" } else { "" };
        let mut text = format!("{:<4}{:>2} {:>4} {:<24}", line, marker, record.offset, record.opname);
        if let Some(arg) = record.arg {
            let _ = write!(text, "{arg:>3}");
            if let Some(argrepr) = record.argrepr.as_deref().filter(|r| !r.is_empty()) {
                let _ = write!(text, " ({argrepr})");
            }
        }
        out.push_str(text.trim_end());
        out.push('\n');
    }
    out
}
