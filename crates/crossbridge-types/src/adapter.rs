use std::fmt;
use std::rc::Rc;

use crossbridge_object::target::TargetType;
use crossbridge_object::{SourceValue, TargetValue};

pub type ToTargetFn = dyn Fn(&SourceValue) -> TargetValue;
pub type ToSourceFn = dyn Fn(&TargetValue) -> SourceValue;

/// A user-supplied two-way conversion between one source class and one
/// target type. Takes precedence over structural marshaling.
#[derive(Clone)]
pub struct TypeAdapter {
    source_type: SourceValue,
    target_type: TargetType,
    to_target: Rc<ToTargetFn>,
    to_source: Rc<ToSourceFn>,
}

impl TypeAdapter {
    pub fn new<T, S>(source_type: SourceValue, target_type: TargetType, to_target: T, to_source: S) -> Self
    where
        T: Fn(&SourceValue) -> TargetValue + 'static,
        S: Fn(&TargetValue) -> SourceValue + 'static,
    {
        TypeAdapter { source_type, target_type, to_target: Rc::new(to_target), to_source: Rc::new(to_source) }
    }

    pub fn source_type(&self) -> &SourceValue {
        &self.source_type
    }

    pub fn target_type(&self) -> &TargetType {
        &self.target_type
    }

    pub fn to_target(&self, value: &SourceValue) -> TargetValue {
        (self.to_target)(value)
    }

    pub fn to_source(&self, value: &TargetValue) -> SourceValue {
        (self.to_source)(value)
    }
}

impl fmt::Debug for TypeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeAdapter")
            .field("source_type", &self.source_type)
            .field("target_type", &self.target_type)
            .finish()
    }
}
