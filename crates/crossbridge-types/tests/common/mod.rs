#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use crossbridge_object::source::ClassBuilder;
use crossbridge_object::target::TargetType;
use crossbridge_object::SourceValue;
use crossbridge_types::{ClassTranslation, TranslationError};

// --- Test Helpers ---

/// Class translator double that records every call.
#[derive(Default)]
pub struct RecordingTranslator {
    pub prepared: Cell<usize>,
    pub translated: RefCell<Vec<String>>,
    pub reject: Option<String>,
    pub opaque_module: Option<String>,
}

impl RecordingTranslator {
    pub fn rejecting(name: &str) -> Self {
        RecordingTranslator { reject: Some(name.to_string()), ..Default::default() }
    }

    pub fn with_opaque_module(module: &str) -> Self {
        RecordingTranslator { opaque_module: Some(module.to_string()), ..Default::default() }
    }

    pub fn translation_count(&self) -> usize {
        self.translated.borrow().len()
    }
}

impl ClassTranslation for RecordingTranslator {
    fn is_translatable(&self, class: &SourceValue) -> bool {
        self.opaque_module.is_none() || class.module_name() != self.opaque_module
    }

    fn prepare(&self, class: &SourceValue) -> TargetType {
        self.prepared.set(self.prepared.get() + 1);
        let name = class.as_type().map(|ty| ty.qualname().to_string()).unwrap_or_default();
        TargetType::translated(name.clone(), class.module_name(), format!("user.{name}"), Some(class.clone()))
    }

    fn translate(
        &self,
        class: &SourceValue,
        prepared: &TargetType,
        bases: Vec<TargetType>,
    ) -> Result<TargetType, TranslationError> {
        let name = prepared.name().to_string();
        if self.reject.as_deref() == Some(name.as_str()) {
            return Err(TranslationError::new(name, "rejected by test translator"));
        }
        assert!(prepared.origin().is_some_and(|origin| origin.is(class)));
        if !bases.is_empty() {
            prepared.set_supertypes(bases);
        }
        self.translated.borrow_mut().push(name);
        Ok(prepared.clone())
    }
}

pub fn class(name: &str) -> SourceValue {
    ClassBuilder::new(name).module("app.models").build()
}

pub fn subclass(name: &str, base: &SourceValue) -> SourceValue {
    ClassBuilder::new(name).module("app.models").base(base).build()
}
