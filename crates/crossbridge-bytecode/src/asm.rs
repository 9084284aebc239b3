//! A small wordcode assembler.
//!
//! Hosts that synthesize code objects (and the test suites) use it to lay
//! out instructions with their inline caches, resolve jump labels and
//! encode the exception table.

use crossbridge_object::source::CodeObject;

use crate::error::{CodecError, CodecResult};
use crate::exception_table::{self, ExceptionTableEntry};
use crate::opcode::{self, Opcode, Operand, EXTENDED_ARG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

struct JumpFixup {
    /// Byte offset of the jump instruction.
    position: usize,
    opcode: Opcode,
    label: Label,
}

struct ProtectedRange {
    start: Label,
    end: Label,
    handler: Label,
    depth: u32,
    lasti: bool,
}

#[derive(Default)]
pub struct Assembler {
    code: Vec<u8>,
    /// Bound labels, as byte offsets.
    labels: Vec<Option<usize>>,
    fixups: Vec<JumpFixup>,
    ranges: Vec<ProtectedRange>,
    line_starts: Vec<(u32, u32)>,
    pending_line: Option<u32>,
}

/// Output of [`Assembler::finish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembled {
    pub code: Vec<u8>,
    pub line_starts: Vec<(u32, u32)>,
    pub exception_table: Vec<u8>,
}

impl Assembled {
    /// Installs the assembled body into `code`.
    pub fn install(self, code: &mut CodeObject) {
        code.code = self.code;
        code.line_starts = self.line_starts;
        code.exception_table = self.exception_table;
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    pub fn bind(&mut self, label: Label) -> CodecResult<()> {
        match self.labels.get_mut(label.0) {
            Some(slot @ None) => {
                *slot = Some(self.code.len());
                Ok(())
            }
            Some(Some(_)) => Err(CodecError::Assembly(format!("label {} bound twice", label.0))),
            None => Err(CodecError::Assembly(format!("label {} does not belong to this assembler", label.0))),
        }
    }

    /// The next instruction starts source line `line`.
    pub fn line(&mut self, line: u32) {
        self.pending_line = Some(line);
    }

    pub fn emit(&mut self, name: &str, arg: u32) -> CodecResult<()> {
        let opcode = lookup(name)?;
        if opcode.is_jump() {
            return Err(CodecError::Assembly(format!("{name} takes a label")));
        }
        if !opcode.has_arg() && arg != 0 {
            return Err(CodecError::Assembly(format!("{name} takes no argument")));
        }
        self.mark_line();
        for shift in [24u32, 16, 8] {
            if arg >> shift != 0 {
                self.code.extend([EXTENDED_ARG, (arg >> shift) as u8]);
            }
        }
        self.push_unit(opcode, arg as u8);
        Ok(())
    }

    pub fn jump(&mut self, name: &str, label: Label) -> CodecResult<()> {
        let opcode = lookup(name)?;
        if !opcode.is_jump() {
            return Err(CodecError::Assembly(format!("{name} is not a jump")));
        }
        self.mark_line();
        self.fixups.push(JumpFixup { position: self.code.len(), opcode, label });
        self.push_unit(opcode, 0);
        Ok(())
    }

    /// Routes exceptions raised between `start` (inclusive) and `end`
    /// (exclusive) to `handler`.
    pub fn protect(&mut self, start: Label, end: Label, handler: Label, depth: u32, lasti: bool) {
        self.ranges.push(ProtectedRange { start, end, handler, depth, lasti });
    }

    pub fn finish(mut self) -> CodecResult<Assembled> {
        for fixup in std::mem::take(&mut self.fixups) {
            let target = self.resolve(fixup.label)?;
            let next = fixup.opcode.next_offset(fixup.position as u32) as usize;
            let distance = match fixup.opcode.operand {
                Operand::BackwardJump => next.checked_sub(target),
                _ => target.checked_sub(next),
            }
            .ok_or_else(|| {
                CodecError::Assembly(format!("{} at byte {} jumps the wrong way", fixup.opcode.name, fixup.position))
            })?;
            let arg = u8::try_from(distance / 2).map_err(|_| {
                CodecError::Assembly(format!("{} at byte {} jumps too far", fixup.opcode.name, fixup.position))
            })?;
            self.code[fixup.position + 1] = arg;
        }

        let mut entries = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            let start = self.resolve(range.start)? / 2;
            let end = self.resolve(range.end)? / 2;
            if end <= start {
                return Err(CodecError::Assembly(format!("protected range {start}..{end} is empty")));
            }
            entries.push(ExceptionTableEntry {
                start: start as u32,
                end: end as u32 - 1,
                target: (self.resolve(range.handler)? / 2) as u32,
                depth: range.depth,
                lasti: range.lasti,
            });
        }

        Ok(Assembled {
            code: self.code,
            line_starts: self.line_starts,
            exception_table: exception_table::encode(&entries)?,
        })
    }

    fn resolve(&self, label: Label) -> CodecResult<usize> {
        self.labels
            .get(label.0)
            .copied()
            .flatten()
            .ok_or_else(|| CodecError::Assembly(format!("label {} is never bound", label.0)))
    }

    fn mark_line(&mut self) {
        if let Some(line) = self.pending_line.take() {
            if self.line_starts.last().map(|&(_, last)| last) != Some(line) {
                self.line_starts.push((self.code.len() as u32, line));
            }
        }
    }

    fn push_unit(&mut self, opcode: Opcode, arg: u8) {
        self.code.extend([opcode.code, arg]);
        self.code.extend(std::iter::repeat(0).take(2 * usize::from(opcode.caches)));
    }
}

fn lookup(name: &str) -> CodecResult<Opcode> {
    opcode::by_name(name).ok_or_else(|| CodecError::Assembly(format!("unknown instruction {name}")))
}
