use std::cell::RefCell;

use indexmap::IndexMap;

use super::builtins::builtin_type;
use super::value::{SourceKind, SourceValue};
use crate::BuiltinKind;

/// Flags describing where a class came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFlags {
    /// Defined by native code rather than bytecode.
    pub native: bool,
    /// A structural protocol; only its shape matters.
    pub protocol: bool,
}

/// A class object.
pub struct TypeObject {
    name: String,
    qualname: String,
    module: Option<String>,
    bases: Vec<SourceValue>,
    dict: RefCell<IndexMap<String, SourceValue>>,
    annotations: RefCell<IndexMap<String, SourceValue>>,
    builtin: Option<BuiltinKind>,
    flags: TypeFlags,
}

impl TypeObject {
    pub(crate) fn builtin(kind: BuiltinKind, bases: Vec<SourceValue>) -> Self {
        TypeObject {
            name: kind.name().to_string(),
            qualname: kind.name().to_string(),
            module: Some(kind.module().to_string()),
            bases,
            dict: RefCell::new(IndexMap::new()),
            annotations: RefCell::new(IndexMap::new()),
            builtin: Some(kind),
            flags: TypeFlags { native: true, protocol: false },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualname(&self) -> &str {
        &self.qualname
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn bases(&self) -> &[SourceValue] {
        &self.bases
    }

    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        self.builtin
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn is_protocol(&self) -> bool {
        self.flags.protocol
    }

    pub fn is_native(&self) -> bool {
        self.flags.native
    }

    /// Attribute stored directly on this class (no inheritance).
    pub fn attribute(&self, name: &str) -> Option<SourceValue> {
        self.dict.borrow().get(name).cloned()
    }

    pub fn attributes(&self) -> Vec<(String, SourceValue)> {
        self.dict.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn set_attribute(&self, name: &str, value: SourceValue) {
        self.dict.borrow_mut().insert(name.to_string(), value);
    }

    pub fn remove_attribute(&self, name: &str) -> Option<SourceValue> {
        self.dict.borrow_mut().shift_remove(name)
    }

    /// Class-level type hints in declaration order.
    pub fn annotations(&self) -> Vec<(String, SourceValue)> {
        self.annotations.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn set_annotation(&self, name: &str, hint: SourceValue) {
        self.annotations.borrow_mut().insert(name.to_string(), hint);
    }
}

/// Builds user-defined classes.
pub struct ClassBuilder {
    name: String,
    qualname: Option<String>,
    module: Option<String>,
    bases: Vec<SourceValue>,
    attributes: IndexMap<String, SourceValue>,
    annotations: IndexMap<String, SourceValue>,
    flags: TypeFlags,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ClassBuilder {
            name: name.into(),
            qualname: None,
            module: None,
            bases: Vec::new(),
            attributes: IndexMap::new(),
            annotations: IndexMap::new(),
            flags: TypeFlags::default(),
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = Some(qualname.into());
        self
    }

    pub fn base(mut self, base: &SourceValue) -> Self {
        self.bases.push(base.clone());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: SourceValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn annotation(mut self, name: impl Into<String>, hint: SourceValue) -> Self {
        self.annotations.insert(name.into(), hint);
        self
    }

    pub fn native(mut self) -> Self {
        self.flags.native = true;
        self
    }

    pub fn protocol(mut self) -> Self {
        self.flags.protocol = true;
        self
    }

    pub fn build(self) -> SourceValue {
        let bases = if self.bases.is_empty() {
            vec![builtin_type(BuiltinKind::Object)]
        } else {
            self.bases
        };
        SourceValue::new(SourceKind::Type(TypeObject {
            qualname: self.qualname.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            module: self.module,
            bases,
            dict: RefCell::new(self.attributes),
            annotations: RefCell::new(self.annotations),
            builtin: None,
            flags: self.flags,
        }))
    }
}

/// C3 linearization of a class. Non-type values linearize to themselves.
pub fn mro(ty: &SourceValue) -> Vec<SourceValue> {
    let Some(type_object) = ty.as_type() else {
        return vec![ty.clone()];
    };

    let mut sequences: Vec<Vec<SourceValue>> = type_object.bases().iter().map(mro).collect();
    sequences.push(type_object.bases().to_vec());

    let mut out = vec![ty.clone()];
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return out;
        }

        let head = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|candidate| {
                !sequences.iter().any(|seq| seq[1..].iter().any(|other| other.is(candidate)))
            })
            .cloned();

        let Some(head) = head else {
            // Inconsistent hierarchy: keep the remaining classes in depth-first order.
            for seq in sequences {
                for class in seq {
                    if !out.iter().any(|seen| seen.is(&class)) {
                        out.push(class);
                    }
                }
            }
            return out;
        };

        for seq in sequences.iter_mut() {
            if seq[0].is(&head) {
                seq.remove(0);
            }
        }
        out.push(head);
    }
}

/// Typing constructs that are not classes themselves.
pub enum HintForm {
    Any,
    /// A parameterized container such as `list[int]`.
    Generic { origin: SourceValue, args: Vec<SourceValue> },
    /// `Union[...]`; optional types carry `NoneType` as a member.
    Union(Vec<SourceValue>),
    ClassVar(SourceValue),
    Annotated { inner: SourceValue, metadata: Vec<SourceValue> },
    /// A hint written as a string.
    ForwardRef(String),
}

/// An instance of a user-defined class.
pub struct InstanceObject {
    class: SourceValue,
    dict: RefCell<IndexMap<String, SourceValue>>,
}

impl InstanceObject {
    pub fn new(class: SourceValue) -> Self {
        InstanceObject { class, dict: RefCell::new(IndexMap::new()) }
    }

    pub fn class(&self) -> &SourceValue {
        &self.class
    }

    pub fn get(&self, name: &str) -> Option<SourceValue> {
        self.dict.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: SourceValue) {
        self.dict.borrow_mut().insert(name.to_string(), value);
    }

    pub fn remove(&self, name: &str) -> Option<SourceValue> {
        self.dict.borrow_mut().shift_remove(name)
    }

    pub fn attributes(&self) -> Vec<(String, SourceValue)> {
        self.dict.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
