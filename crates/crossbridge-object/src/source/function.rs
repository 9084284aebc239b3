use std::cell::RefCell;
use std::fmt;
use std::ops::BitOr;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::{SourceKind, SourceValue};

/// Keyword arguments of a call, in call order.
pub type KwArgs = IndexMap<String, SourceValue>;

/// Code object flags (`co_flags`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CodeFlags(u32);

impl CodeFlags {
    pub const OPTIMIZED: CodeFlags = CodeFlags(0x0001);
    pub const NEWLOCALS: CodeFlags = CodeFlags(0x0002);
    pub const VARARGS: CodeFlags = CodeFlags(0x0004);
    pub const VARKEYWORDS: CodeFlags = CodeFlags(0x0008);
    pub const NESTED: CodeFlags = CodeFlags(0x0010);
    pub const GENERATOR: CodeFlags = CodeFlags(0x0020);
    pub const NOFREE: CodeFlags = CodeFlags(0x0040);
    pub const COROUTINE: CodeFlags = CodeFlags(0x0080);
    pub const ITERABLE_COROUTINE: CodeFlags = CodeFlags(0x0100);
    pub const ASYNC_GENERATOR: CodeFlags = CodeFlags(0x0200);

    pub const fn empty() -> Self {
        CodeFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        CodeFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: CodeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CodeFlags {
    type Output = CodeFlags;

    fn bitor(self, rhs: CodeFlags) -> CodeFlags {
        CodeFlags(self.0 | rhs.0)
    }
}

/// A compiled code body: wordcode plus the tables it indexes into.
#[derive(Default)]
pub struct CodeObject {
    pub name: String,
    pub qualname: String,
    pub filename: String,
    pub first_line: u32,
    /// Two bytes per instruction: opcode, then argument.
    pub code: Vec<u8>,
    pub consts: Vec<SourceValue>,
    pub names: Vec<String>,
    pub varnames: Vec<String>,
    pub cellvars: Vec<String>,
    pub freevars: Vec<String>,
    pub argcount: u32,
    pub posonlyargcount: u32,
    pub kwonlyargcount: u32,
    pub flags: CodeFlags,
    /// `(byte offset, line)` pairs, ascending by offset.
    pub line_starts: Vec<(u32, u32)>,
    /// Varint-encoded exception table.
    pub exception_table: Vec<u8>,
}

impl CodeObject {
    /// Name of the `*args` parameter, if the code accepts one.
    pub fn varargs_name(&self) -> Option<&str> {
        if !self.flags.contains(CodeFlags::VARARGS) {
            return None;
        }
        let index = (self.argcount + self.kwonlyargcount) as usize;
        self.varnames.get(index).map(String::as_str)
    }

    /// Name of the `**kwargs` parameter, if the code accepts one.
    pub fn varkeywords_name(&self) -> Option<&str> {
        if !self.flags.contains(CodeFlags::VARKEYWORDS) {
            return None;
        }
        let mut index = (self.argcount + self.kwonlyargcount) as usize;
        if self.flags.contains(CodeFlags::VARARGS) {
            index += 1;
        }
        self.varnames.get(index).map(String::as_str)
    }

    /// Names of the positional parameters, in order.
    pub fn positional_names(&self) -> &[String] {
        let end = (self.argcount as usize).min(self.varnames.len());
        &self.varnames[..end]
    }
}

impl fmt::Debug for CodeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeObject")
            .field("qualname", &self.qualname)
            .field("filename", &self.filename)
            .field("len", &self.code.len())
            .finish()
    }
}

/// How a function is bound when it lives in a class body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Plain function, or an instance method taking an implicit `self`.
    #[default]
    Virtual,
    Static,
    Class,
}

/// A bytecode function.
pub struct FunctionObject {
    name: String,
    qualname: String,
    module: Option<String>,
    code: Rc<CodeObject>,
    globals: SourceValue,
    closure: Vec<SourceValue>,
    defaults: Vec<SourceValue>,
    kwdefaults: IndexMap<String, SourceValue>,
    annotations: IndexMap<String, SourceValue>,
    method_kind: MethodKind,
    attributes: RefCell<IndexMap<String, SourceValue>>,
}

impl FunctionObject {
    /// A function over `code` whose globals are the dictionary `globals`.
    pub fn new(code: Rc<CodeObject>, globals: SourceValue) -> Self {
        let module = globals.dict_get("__name__").and_then(|name| name.as_str().map(str::to_string));
        FunctionObject {
            name: code.name.clone(),
            qualname: code.qualname.clone(),
            module,
            code,
            globals,
            closure: Vec::new(),
            defaults: Vec::new(),
            kwdefaults: IndexMap::new(),
            annotations: IndexMap::new(),
            method_kind: MethodKind::Virtual,
            attributes: RefCell::new(IndexMap::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_module(mut self, module: Option<String>) -> Self {
        self.module = module;
        self
    }

    /// Closure cells, one per free variable of the code.
    pub fn with_closure(mut self, cells: Vec<SourceValue>) -> Self {
        self.closure = cells;
        self
    }

    pub fn with_defaults(mut self, defaults: Vec<SourceValue>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_kwdefaults(mut self, kwdefaults: IndexMap<String, SourceValue>) -> Self {
        self.kwdefaults = kwdefaults;
        self
    }

    pub fn with_annotation(mut self, name: impl Into<String>, hint: SourceValue) -> Self {
        self.annotations.insert(name.into(), hint);
        self
    }

    pub fn with_method_kind(mut self, kind: MethodKind) -> Self {
        self.method_kind = kind;
        self
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

    pub fn code(&self) -> &Rc<CodeObject> {
        &self.code
    }

    pub fn globals(&self) -> &SourceValue {
        &self.globals
    }

    pub fn closure(&self) -> &[SourceValue] {
        &self.closure
    }

    pub fn defaults(&self) -> &[SourceValue] {
        &self.defaults
    }

    pub fn kwdefaults(&self) -> &IndexMap<String, SourceValue> {
        &self.kwdefaults
    }

    pub fn annotations(&self) -> &IndexMap<String, SourceValue> {
        &self.annotations
    }

    pub fn method_kind(&self) -> MethodKind {
        self.method_kind
    }

    pub fn attribute(&self, name: &str) -> Option<SourceValue> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.borrow().keys().cloned().collect()
    }

    pub fn set_attribute(&self, name: &str, value: SourceValue) {
        self.attributes.borrow_mut().insert(name.to_string(), value);
    }

    pub fn remove_attribute(&self, name: &str) -> Option<SourceValue> {
        self.attributes.borrow_mut().shift_remove(name)
    }

    /// Parameters that have a default value, paired with it.
    pub fn default_arguments(&self) -> IndexMap<String, SourceValue> {
        let positional = self.code.positional_names();
        let skip = positional.len().saturating_sub(self.defaults.len());
        let mut out: IndexMap<String, SourceValue> = positional[skip..]
            .iter()
            .cloned()
            .zip(self.defaults.iter().cloned())
            .collect();
        out.extend(self.kwdefaults.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }
}

/// Signature of a function implemented natively.
pub type NativeFn = dyn Fn(&[SourceValue], &KwArgs) -> Result<SourceValue, SourceValue>;

/// A builtin or extension function. Errors are raised exceptions.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    module: Option<String>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[SourceValue], &KwArgs) -> Result<SourceValue, SourceValue> + 'static,
    {
        NativeFunction { name: name.into(), module: None, func: Rc::new(func) }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn invoke(&self, args: &[SourceValue], kwargs: &KwArgs) -> Result<SourceValue, SourceValue> {
        (self.func)(args, kwargs)
    }
}

impl From<FunctionObject> for SourceValue {
    fn from(function: FunctionObject) -> Self {
        SourceValue::new(SourceKind::Function(function))
    }
}

impl From<NativeFunction> for SourceValue {
    fn from(function: NativeFunction) -> Self {
        SourceValue::new(SourceKind::Native(function))
    }
}
