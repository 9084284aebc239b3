//! Rebuilding exceptions raised on the target side, and moving raised
//! exceptions across in either direction.

use crossbridge_object::source::{builtin_type, ExceptionObject, FrameSummary, ReconstructedTrace, TracebackSummary};
use crossbridge_object::target::{StackFrame, TargetException};
use crossbridge_object::{BuiltinKind, SourceValue, TargetValue};
use log::debug;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::identity::{CloneMap, IdentityMap};

const UNKNOWN: &str = "<unknown>";

impl BridgeContext {
    /// Rebuilds a thrown target exception as a source exception carrying its
    /// arguments, its cause chain and a traceback made of the frames that ran
    /// translated source code.
    ///
    /// Throwables with no source exception class become a `SystemError`
    /// whose message is the target runtime's own rendering of the trace.
    pub(crate) fn exception_to_source_with(
        &self,
        value: &TargetValue,
        exception: &TargetException,
        clones: &CloneMap,
        default: Option<&SourceValue>,
    ) -> BridgeResult<SourceValue> {
        let Some(class) = self.exception_class(exception) else {
            debug!("no source exception class for {}, raising a SystemError", exception.class_name());
            let fallback = SourceValue::new_exception(BuiltinKind::SystemError, system_error_message(exception));
            clones.insert(value, &fallback);
            return Ok(fallback);
        };

        let args = exception
            .args()
            .iter()
            .map(|arg| self.to_source_with(arg, clones, default))
            .collect::<BridgeResult<Vec<_>>>()?;
        let trace = ReconstructedTrace {
            exception_name: exception.simple_name().to_string(),
            message: exception.message().unwrap_or_default().to_string(),
            traceback: self.traceback_summary(exception),
        };

        let converted = SourceValue::exception(ExceptionObject::new(class, args).with_trace(trace));
        clones.insert(value, &converted);
        if let Some(cause) = exception.cause() {
            let cause = self.to_source_with(&cause, clones, default)?;
            if let Some(shell) = converted.as_exception() {
                shell.set_cause(Some(cause));
            }
        }
        Ok(converted)
    }

    fn exception_class(&self, exception: &TargetException) -> Option<SourceValue> {
        let ty = exception.python_type()?;
        let base = builtin_type(BuiltinKind::BaseException);
        let mapped = self.registry.reverse_lookup(ty).or_else(|| ty.origin().cloned());
        match mapped {
            Some(class) if class.is_subclass(&base) => Some(class),
            _ => BuiltinKind::exception_named(ty.name()).map(builtin_type),
        }
    }

    /// The traceback of `exception` and of its causes, innermost cause first
    /// when formatted. A cause chain that loops back stops at the first
    /// repeated exception.
    pub fn traceback_summary(&self, exception: &TargetException) -> TracebackSummary {
        self.summarize(exception, &mut Vec::new())
    }

    fn summarize(&self, exception: &TargetException, seen: &mut Vec<*const TargetException>) -> TracebackSummary {
        seen.push(exception as *const TargetException);
        let cause = exception.cause();
        TracebackSummary {
            type_name: exception.python_type().map_or(exception.simple_name(), |ty| ty.name()).to_string(),
            message: exception.message().unwrap_or_default().to_string(),
            frames: self.source_frames(exception.stack_trace()),
            cause: cause
                .as_ref()
                .and_then(TargetValue::as_exception)
                .filter(|cause| !seen.contains(&(*cause as *const TargetException)))
                .map(|cause| Box::new(self.summarize(cause, seen))),
        }
    }

    /// Frames in call order, keeping only those from translated source files.
    /// When none qualifies every frame is kept.
    pub fn source_frames(&self, stack: &[StackFrame]) -> Vec<FrameSummary> {
        let is_source =
            |frame: &StackFrame| frame.file_name.as_deref().is_some_and(|file| self.config.is_source_file(file));
        let keep_all = !stack.iter().any(is_source);

        stack
            .iter()
            .rev()
            .filter(|frame| keep_all || is_source(*frame))
            .map(|frame| {
                let file = frame.file_name.clone().unwrap_or_else(|| UNKNOWN.to_string());
                let name = if self.config.is_source_file(&file) {
                    let class = frame.class_name.as_deref().unwrap_or(UNKNOWN);
                    let simple = class.rsplit('.').next().unwrap_or(class);
                    simple.split('$').next().unwrap_or(simple).to_string()
                } else {
                    frame.method_name.clone().unwrap_or_else(|| UNKNOWN.to_string())
                };
                FrameSummary::new(file, frame.line_number.unwrap_or(0), name)
            })
            .collect()
    }

    /// Converts a raised source exception for the target runtime. Bridge
    /// failures become a target `SystemError`.
    pub fn exception_to_target(&self, raised: &SourceValue) -> TargetValue {
        self.exception_to_target_with(raised, &IdentityMap::new()).unwrap_or_else(error_to_target)
    }

    /// Converts a thrown target value into a raisable source exception.
    /// Bridge failures become a source `SystemError`.
    pub fn thrown_to_source(&self, thrown: &TargetValue, clones: &CloneMap) -> SourceValue {
        self.to_source_with(thrown, clones, None).unwrap_or_else(BridgeError::into_source_exception)
    }
}

/// A target `SystemError` describing a bridge failure.
pub fn error_to_target(error: BridgeError) -> TargetValue {
    TargetValue::exception(TargetException::builtin(BuiltinKind::SystemError, &error.to_string()))
}

/// `"<SimpleName>:  <message>"` followed by the target runtime's trace.
pub fn system_error_message(exception: &TargetException) -> String {
    format!(
        "{}:  {}\n{}",
        exception.simple_name(),
        exception.message().unwrap_or_default(),
        exception.render_stack_trace()
    )
}
