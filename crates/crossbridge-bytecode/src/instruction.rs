use serde::{Deserialize, Serialize};

/// One code unit of a disassembled body.
///
/// `offset` counts code units (byte offset halved), the addressing the
/// target translator uses. Inline caches and `EXTENDED_ARG` prefixes get
/// their own records so every code unit is accounted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub opname: String,
    pub offset: u32,
    pub is_jump_target: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argrepr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_line: Option<u32>,
}

impl InstructionRecord {
    pub fn at_offset(opname: impl Into<String>, offset: u32) -> Self {
        InstructionRecord {
            opname: opname.into(),
            offset,
            is_jump_target: false,
            arg: None,
            argrepr: None,
            starts_line: None,
        }
    }

    pub fn with_arg(mut self, arg: u32, argrepr: impl Into<String>) -> Self {
        self.arg = Some(arg);
        self.argrepr = Some(argrepr.into());
        self
    }

    pub fn with_jump_target(mut self, is_jump_target: bool) -> Self {
        self.is_jump_target = is_jump_target;
        self
    }

    pub fn starting_line(mut self, line: u32) -> Self {
        self.starts_line = Some(line);
        self
    }

    pub fn is_cache(&self) -> bool {
        self.opname == "CACHE"
    }
}
