//! Bytecode side of the bridge: decoding the source runtime's wordcode and
//! exception tables into the flat records the target translator consumes.

pub mod asm;
pub mod descriptor;
pub mod disasm;
pub mod error;
pub mod exception_table;
pub mod identifier;
pub mod instruction;
pub mod opcode;
pub mod varint;
pub mod version;

pub use asm::{Assembled, Assembler, Label};
pub use descriptor::{CodeListing, CompiledFunctionDescriptor, CODE_BODY_NAME};
pub use disasm::{disassemble, format_listing};
pub use error::{CodecError, CodecResult};
pub use exception_table::ExceptionTableEntry;
pub use instruction::InstructionRecord;
pub use version::{ReleaseLevel, RuntimeVersion, VersionWindow};
