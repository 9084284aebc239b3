use std::cell::RefCell;
use std::fmt::Write;

use super::value::SourceValue;

/// One line of a rendered traceback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    pub filename: String,
    pub lineno: u32,
    pub name: String,
}

impl FrameSummary {
    pub fn new(filename: impl Into<String>, lineno: u32, name: impl Into<String>) -> Self {
        FrameSummary { filename: filename.into(), lineno, name: name.into() }
    }
}

/// A printable traceback: frames in call order, the exception line, and the
/// chain of causes that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackSummary {
    pub type_name: String,
    pub message: String,
    pub frames: Vec<FrameSummary>,
    pub cause: Option<Box<TracebackSummary>>,
}

impl TracebackSummary {
    pub fn format(&self) -> String {
        let mut out = String::new();
        self.format_into(&mut out);
        out
    }

    fn format_into(&self, out: &mut String) {
        if let Some(cause) = &self.cause {
            cause.format_into(out);
            out.push_str("\nThe above exception was the direct cause of the following exception:\n\n");
        }
        if !self.frames.is_empty() {
            out.push_str("Traceback (most recent call last):\n");
            for frame in &self.frames {
                let _ = writeln!(out, "  File \"{}\", line {}, in {}", frame.filename, frame.lineno, frame.name);
            }
        }
        if self.message.is_empty() {
            let _ = writeln!(out, "{}", self.type_name);
        } else {
            let _ = writeln!(out, "{}: {}", self.type_name, self.message);
        }
    }

    /// Number of exceptions in the chain, this one included.
    pub fn chain_len(&self) -> usize {
        1 + self.cause.as_ref().map_or(0, |cause| cause.chain_len())
    }
}

/// Display data attached to an exception rebuilt from the target runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedTrace {
    pub exception_name: String,
    pub message: String,
    pub traceback: TracebackSummary,
}

impl ReconstructedTrace {
    pub fn render(&self) -> String {
        format!("\n{}: {}\n{}", self.exception_name, self.message, self.traceback.format())
    }
}

/// A raised (or raisable) exception instance.
pub struct ExceptionObject {
    class: SourceValue,
    args: Vec<SourceValue>,
    cause: RefCell<Option<SourceValue>>,
    trace: Option<ReconstructedTrace>,
}

impl ExceptionObject {
    pub fn new(class: SourceValue, args: Vec<SourceValue>) -> Self {
        ExceptionObject { class, args, cause: RefCell::new(None), trace: None }
    }

    pub fn with_trace(mut self, trace: ReconstructedTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_cause(self, cause: Option<SourceValue>) -> Self {
        *self.cause.borrow_mut() = cause;
        self
    }

    pub fn class(&self) -> &SourceValue {
        &self.class
    }

    pub fn type_name(&self) -> String {
        self.class.as_type().map(|t| t.name().to_string()).unwrap_or_else(|| "BaseException".to_string())
    }

    pub fn args(&self) -> &[SourceValue] {
        &self.args
    }

    pub fn cause(&self) -> Option<SourceValue> {
        self.cause.borrow().clone()
    }

    pub fn set_cause(&self, cause: Option<SourceValue>) {
        *self.cause.borrow_mut() = cause;
    }

    pub fn trace(&self) -> Option<&ReconstructedTrace> {
        self.trace.as_ref()
    }

    /// The `str()` of the exception.
    pub fn message(&self) -> String {
        if let Some(trace) = &self.trace {
            return trace.render();
        }
        match self.args.as_slice() {
            [] => String::new(),
            [single] => single.to_string(),
            many => SourceValue::tuple(many.to_vec()).repr(),
        }
    }
}
