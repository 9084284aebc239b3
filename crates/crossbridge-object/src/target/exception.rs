use std::cell::RefCell;
use std::fmt::Write;

use super::types::TargetType;
use super::value::{TargetKind, TargetValue};
use crate::BuiltinKind;

/// One frame of a target-runtime stack trace. Any field may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFrame {
    pub class_name: Option<String>,
    pub method_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
}

impl StackFrame {
    pub fn new(class_name: &str, method_name: &str, file_name: &str, line_number: u32) -> Self {
        StackFrame {
            class_name: Some(class_name.to_string()),
            method_name: Some(method_name.to_string()),
            file_name: Some(file_name.to_string()),
            line_number: Some(line_number),
        }
    }

    /// A frame with no recoverable location.
    pub fn unknown() -> Self {
        StackFrame::default()
    }
}

/// A throwable of the target runtime.
///
/// Python-like exceptions carry their declared type and constructor
/// arguments; throwables raised by the runtime itself only have a class name.
///
/// Arguments and cause can be filled in after the exception is shared, so a
/// cause chain may loop back on itself.
#[derive(Debug, Clone)]
pub struct TargetException {
    class_name: String,
    python_type: Option<TargetType>,
    message: Option<String>,
    args: RefCell<Vec<TargetValue>>,
    cause: RefCell<Option<TargetValue>>,
    stack_trace: Vec<StackFrame>,
}

impl TargetException {
    /// A python-like exception of type `ty`, with `message` as its only argument.
    pub fn new(ty: TargetType, message: Option<&str>) -> Self {
        let args = message.map(|m| vec![TargetValue::string(m)]).unwrap_or_default();
        TargetException {
            class_name: ty.name().to_string(),
            python_type: Some(ty),
            message: message.map(str::to_string),
            args: RefCell::new(args),
            cause: RefCell::new(None),
            stack_trace: Vec::new(),
        }
    }

    pub fn builtin(kind: BuiltinKind, message: &str) -> Self {
        Self::new(TargetType::builtin(kind), Some(message))
    }

    /// A throwable of the runtime itself, identified by its class name.
    pub fn foreign(class_name: impl Into<String>, message: Option<&str>) -> Self {
        TargetException {
            class_name: class_name.into(),
            python_type: None,
            message: message.map(str::to_string),
            args: RefCell::new(Vec::new()),
            cause: RefCell::new(None),
            stack_trace: Vec::new(),
        }
    }

    pub fn with_args(self, args: Vec<TargetValue>) -> Self {
        self.set_args(args);
        self
    }

    pub fn with_cause(self, cause: TargetValue) -> Self {
        self.set_cause(Some(cause));
        self
    }

    pub fn set_args(&self, args: Vec<TargetValue>) {
        *self.args.borrow_mut() = args;
    }

    pub fn set_cause(&self, cause: Option<TargetValue>) {
        *self.cause.borrow_mut() = cause;
    }

    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stack_trace.push(frame);
        self
    }

    pub fn with_stack_trace(mut self, frames: Vec<StackFrame>) -> Self {
        self.stack_trace = frames;
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn simple_name(&self) -> &str {
        self.class_name.rsplit('.').next().unwrap_or(&self.class_name)
    }

    pub fn python_type(&self) -> Option<&TargetType> {
        self.python_type.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn args(&self) -> Vec<TargetValue> {
        self.args.borrow().clone()
    }

    pub fn cause(&self) -> Option<TargetValue> {
        self.cause.borrow().clone()
    }

    /// Innermost call first.
    pub fn stack_trace(&self) -> &[StackFrame] {
        &self.stack_trace
    }

    /// The runtime's own rendering: one `at` line per frame, then the causes.
    /// A cause already printed is shown as `[CIRCULAR REFERENCE]`.
    pub fn render_stack_trace(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, &mut Vec::new());
        out
    }

    fn render_into(&self, out: &mut String, seen: &mut Vec<*const TargetException>) {
        seen.push(self as *const TargetException);
        match &self.message {
            Some(message) => {
                let _ = writeln!(out, "{}: {}", self.class_name, message);
            }
            None => {
                let _ = writeln!(out, "{}", self.class_name);
            }
        }
        for frame in &self.stack_trace {
            let location = match (&frame.file_name, frame.line_number) {
                (Some(file), Some(line)) => format!("{}:{}", file, line),
                (Some(file), None) => file.clone(),
                _ => "Unknown Source".to_string(),
            };
            let _ = writeln!(
                out,
                "\tat {}.{}({})",
                frame.class_name.as_deref().unwrap_or("<unknown>"),
                frame.method_name.as_deref().unwrap_or("<unknown>"),
                location
            );
        }
        let cause = self.cause();
        if let Some(TargetKind::Exception(cause)) = cause.as_ref().map(TargetValue::kind) {
            out.push_str("Caused by: ");
            if seen.contains(&(cause as *const TargetException)) {
                let _ = writeln!(out, "[CIRCULAR REFERENCE: {}]", cause.class_name);
            } else {
                cause.render_into(out, seen);
            }
        }
    }
}
