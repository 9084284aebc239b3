use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::host::OpaqueRef;
use super::types::TargetType;
use super::value::TargetValue;

pub type TargetKwArgs = IndexMap<String, TargetValue>;

/// Entry point of translated code. The error side is the thrown exception.
pub trait TargetCallable {
    fn call(&self, args: &[TargetValue], kwargs: &TargetKwArgs) -> Result<TargetValue, TargetValue>;
}

impl<F> TargetCallable for F
where
    F: Fn(&[TargetValue], &TargetKwArgs) -> Result<TargetValue, TargetValue>,
{
    fn call(&self, args: &[TargetValue], kwargs: &TargetKwArgs) -> Result<TargetValue, TargetValue> {
        self(args, kwargs)
    }
}

/// A function produced by the bytecode translator.
#[derive(Clone)]
pub struct TargetFunction {
    qualified_name: String,
    module: Option<String>,
    class_name: String,
    interface: TargetType,
    callable: Rc<dyn TargetCallable>,
}

impl TargetFunction {
    pub fn new(
        qualified_name: impl Into<String>,
        module: Option<String>,
        class_name: impl Into<String>,
        interface: TargetType,
        callable: impl TargetCallable + 'static,
    ) -> Self {
        TargetFunction {
            qualified_name: qualified_name.into(),
            module,
            class_name: class_name.into(),
            interface,
            callable: Rc::new(callable),
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn name(&self) -> &str {
        self.qualified_name.rsplit('.').next().unwrap_or(&self.qualified_name)
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Binary name of the generated class.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The interface the function was translated against.
    pub fn interface(&self) -> &TargetType {
        &self.interface
    }

    pub fn call(&self, args: &[TargetValue], kwargs: &TargetKwArgs) -> Result<TargetValue, TargetValue> {
        self.callable.call(args, kwargs)
    }
}

impl fmt::Debug for TargetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetFunction({} as {})", self.qualified_name, self.class_name)
    }
}

/// A code object on the target side: either a translated code class or a
/// wrapper around the untranslated source code object.
#[derive(Debug, Clone)]
pub struct TargetCode {
    class_name: Option<String>,
    reference: Option<OpaqueRef>,
}

impl TargetCode {
    pub fn translated(class_name: impl Into<String>, reference: Option<OpaqueRef>) -> Self {
        TargetCode { class_name: Some(class_name.into()), reference }
    }

    pub fn wrapper(reference: OpaqueRef) -> Self {
        TargetCode { class_name: None, reference: Some(reference) }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn reference(&self) -> Option<&OpaqueRef> {
        self.reference.as_ref()
    }

    pub fn is_translated(&self) -> bool {
        self.class_name.is_some()
    }
}
