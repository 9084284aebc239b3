use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;
use num_traits::FromPrimitive;

use super::builtins::{self, builtin_type};
use super::exception::ExceptionObject;
use super::function::{CodeObject, FunctionObject, KwArgs, NativeFunction};
use super::iter::SourceIterator;
use super::module::ModuleObject;
use super::repr;
use super::types::{mro, HintForm, InstanceObject, TypeObject};
use crate::temporal::{Date, DateTime, Time, TimeDelta};
use crate::{BuiltinKind, ObjectId, TargetValue};

/// Every shape a source-runtime object can take.
pub enum SourceKind {
    None,
    NotImplemented,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    /// Fixed-point decimal in its canonical text form.
    Decimal(String),
    Complex { real: f64, imag: f64 },
    Str(String),
    Bytes(Vec<u8>),
    ByteArray(RefCell<Vec<u8>>),
    Tuple(Vec<SourceValue>),
    List(RefCell<Vec<SourceValue>>),
    Set(RefCell<IndexSet<SourceValue>>),
    FrozenSet(IndexSet<SourceValue>),
    Dict(RefCell<IndexMap<SourceValue, SourceValue>>),
    Slice { start: SourceValue, stop: SourceValue, step: SourceValue },
    Range { start: SourceValue, stop: SourceValue, step: SourceValue },
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    TimeDelta(TimeDelta),
    Type(TypeObject),
    Hint(HintForm),
    Module(ModuleObject),
    Function(FunctionObject),
    Code(Rc<CodeObject>),
    Cell(RefCell<Option<SourceValue>>),
    Instance(InstanceObject),
    Exception(ExceptionObject),
    Iterator(Box<dyn SourceIterator>),
    Native(NativeFunction),
    /// A target-runtime value handed to the source runtime as is.
    Foreign(TargetValue),
}

/// A shared handle to a source-runtime object.
#[derive(Clone)]
pub struct SourceValue(Rc<SourceKind>);

impl SourceValue {
    pub fn new(kind: SourceKind) -> Self {
        SourceValue(Rc::new(kind))
    }

    pub fn kind(&self) -> &SourceKind {
        &self.0
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::of(&self.0)
    }

    /// Identity comparison.
    pub fn is(&self, other: &SourceValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // --- Constructors ---

    pub fn none() -> Self {
        builtins::none()
    }

    pub fn not_implemented() -> Self {
        builtins::not_implemented()
    }

    pub fn bool(value: bool) -> Self {
        builtins::boolean(value)
    }

    pub fn int(value: impl Into<BigInt>) -> Self {
        Self::new(SourceKind::Int(value.into()))
    }

    pub fn float(value: f64) -> Self {
        Self::new(SourceKind::Float(value))
    }

    pub fn decimal(text: impl Into<String>) -> Self {
        Self::new(SourceKind::Decimal(text.into()))
    }

    pub fn complex(real: f64, imag: f64) -> Self {
        Self::new(SourceKind::Complex { real, imag })
    }

    pub fn str(text: impl Into<String>) -> Self {
        Self::new(SourceKind::Str(text.into()))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::new(SourceKind::Bytes(data.into()))
    }

    pub fn bytearray(data: impl Into<Vec<u8>>) -> Self {
        Self::new(SourceKind::ByteArray(RefCell::new(data.into())))
    }

    pub fn tuple(items: Vec<SourceValue>) -> Self {
        Self::new(SourceKind::Tuple(items))
    }

    pub fn list(items: Vec<SourceValue>) -> Self {
        Self::new(SourceKind::List(RefCell::new(items)))
    }

    pub fn set(items: impl IntoIterator<Item = SourceValue>) -> Self {
        Self::new(SourceKind::Set(RefCell::new(items.into_iter().collect())))
    }

    pub fn frozenset(items: impl IntoIterator<Item = SourceValue>) -> Self {
        Self::new(SourceKind::FrozenSet(items.into_iter().collect()))
    }

    pub fn dict(entries: impl IntoIterator<Item = (SourceValue, SourceValue)>) -> Self {
        Self::new(SourceKind::Dict(RefCell::new(entries.into_iter().collect())))
    }

    pub fn slice(start: SourceValue, stop: SourceValue, step: SourceValue) -> Self {
        Self::new(SourceKind::Slice { start, stop, step })
    }

    pub fn range(start: SourceValue, stop: SourceValue, step: SourceValue) -> Self {
        Self::new(SourceKind::Range { start, stop, step })
    }

    pub fn date(value: Date) -> Self {
        Self::new(SourceKind::Date(value))
    }

    pub fn time(value: Time) -> Self {
        Self::new(SourceKind::Time(value))
    }

    pub fn datetime(value: DateTime) -> Self {
        Self::new(SourceKind::DateTime(value))
    }

    pub fn timedelta(value: TimeDelta) -> Self {
        Self::new(SourceKind::TimeDelta(value))
    }

    pub fn hint(form: HintForm) -> Self {
        Self::new(SourceKind::Hint(form))
    }

    pub fn cell(contents: Option<SourceValue>) -> Self {
        Self::new(SourceKind::Cell(RefCell::new(contents)))
    }

    pub fn code(code: Rc<CodeObject>) -> Self {
        Self::new(SourceKind::Code(code))
    }

    pub fn module(module: ModuleObject) -> Self {
        Self::new(SourceKind::Module(module))
    }

    /// A fresh instance of `class` with an empty dictionary.
    pub fn instance(class: &SourceValue) -> Self {
        Self::new(SourceKind::Instance(InstanceObject::new(class.clone())))
    }

    pub fn exception(exception: ExceptionObject) -> Self {
        Self::new(SourceKind::Exception(exception))
    }

    /// An instance of a builtin exception class carrying a single message.
    pub fn new_exception(kind: BuiltinKind, message: impl Into<String>) -> Self {
        Self::exception(ExceptionObject::new(builtin_type(kind), vec![SourceValue::str(message)]))
    }

    pub fn iterator(iterator: impl SourceIterator + 'static) -> Self {
        Self::new(SourceKind::Iterator(Box::new(iterator)))
    }

    pub fn foreign(value: TargetValue) -> Self {
        Self::new(SourceKind::Foreign(value))
    }

    pub fn builtin_type(kind: BuiltinKind) -> Self {
        builtin_type(kind)
    }

    // --- Accessors ---

    pub fn is_none(&self) -> bool {
        matches!(self.kind(), SourceKind::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            SourceKind::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self.kind() {
            SourceKind::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.kind() {
            SourceKind::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.kind() {
            SourceKind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Contents of `bytes` or `bytearray`.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self.kind() {
            SourceKind::Bytes(b) => Some(b.clone()),
            SourceKind::ByteArray(b) => Some(b.borrow().clone()),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[SourceValue]> {
        match self.kind() {
            SourceKind::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&RefCell<Vec<SourceValue>>> {
        match self.kind() {
            SourceKind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&RefCell<IndexSet<SourceValue>>> {
        match self.kind() {
            SourceKind::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&RefCell<IndexMap<SourceValue, SourceValue>>> {
        match self.kind() {
            SourceKind::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeObject> {
        match self.kind() {
            SourceKind::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_hint(&self) -> Option<&HintForm> {
        match self.kind() {
            SourceKind::Hint(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleObject> {
        match self.kind() {
            SourceKind::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match self.kind() {
            SourceKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&Rc<CodeObject>> {
        match self.kind() {
            SourceKind::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&RefCell<Option<SourceValue>>> {
        match self.kind() {
            SourceKind::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceObject> {
        match self.kind() {
            SourceKind::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_exception(&self) -> Option<&ExceptionObject> {
        match self.kind() {
            SourceKind::Exception(exception) => Some(exception),
            _ => None,
        }
    }

    pub fn as_iterator(&self) -> Option<&dyn SourceIterator> {
        match self.kind() {
            SourceKind::Iterator(iterator) => Some(iterator.as_ref()),
            _ => None,
        }
    }

    pub fn as_foreign(&self) -> Option<&TargetValue> {
        match self.kind() {
            SourceKind::Foreign(value) => Some(value),
            _ => None,
        }
    }

    /// Snapshot of the members of any collection (dictionary keys for dicts).
    pub fn items(&self) -> Option<Vec<SourceValue>> {
        match self.kind() {
            SourceKind::Tuple(items) => Some(items.clone()),
            SourceKind::List(items) => Some(items.borrow().clone()),
            SourceKind::Set(items) => Some(items.borrow().iter().cloned().collect()),
            SourceKind::FrozenSet(items) => Some(items.iter().cloned().collect()),
            SourceKind::Dict(entries) => Some(entries.borrow().keys().cloned().collect()),
            _ => None,
        }
    }

    // --- String-keyed dictionary helpers ---

    pub fn dict_get(&self, key: &str) -> Option<SourceValue> {
        self.as_dict()?.borrow().get(&SourceValue::str(key)).cloned()
    }

    /// Returns `false` when `self` is not a dictionary.
    pub fn dict_set(&self, key: &str, value: SourceValue) -> bool {
        match self.as_dict() {
            Some(entries) => {
                entries.borrow_mut().insert(SourceValue::str(key), value);
                true
            }
            None => false,
        }
    }

    pub fn dict_remove(&self, key: &str) -> Option<SourceValue> {
        self.as_dict()?.borrow_mut().shift_remove(&SourceValue::str(key))
    }

    /// Snapshot of the string-keyed entries of a dictionary.
    pub fn dict_items(&self) -> Vec<(String, SourceValue)> {
        match self.as_dict() {
            Some(entries) => entries
                .borrow()
                .iter()
                .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
                .collect(),
            None => Vec::new(),
        }
    }

    // --- Type relations ---

    pub fn type_of(&self) -> SourceValue {
        builtins::type_of(self)
    }

    pub fn type_name(&self) -> String {
        match self.type_of().as_type() {
            Some(ty) => ty.name().to_string(),
            None => "object".to_string(),
        }
    }

    /// `issubclass(self, other)`; false when `self` is not a class.
    pub fn is_subclass(&self, other: &SourceValue) -> bool {
        self.as_type().is_some() && mro(self).iter().any(|class| class.is(other))
    }

    pub fn is_instance(&self, class: &SourceValue) -> bool {
        self.type_of().is_subclass(class)
    }

    /// The `__module__` of functions, classes and instances.
    pub fn module_name(&self) -> Option<String> {
        match self.kind() {
            SourceKind::Function(function) => function.module().map(str::to_string),
            SourceKind::Type(ty) => ty.module().map(str::to_string),
            SourceKind::Native(native) => native.module().map(str::to_string),
            SourceKind::Module(module) => Some(module.name().to_string()),
            SourceKind::Instance(_) | SourceKind::Exception(_) => self.type_of().module_name(),
            _ => None,
        }
    }

    // --- Attribute protocol ---

    pub fn get_attr(&self, name: &str) -> Option<SourceValue> {
        match self.kind() {
            SourceKind::Instance(instance) => {
                instance.get(name).or_else(|| lookup_in_mro(instance.class(), name))
            }
            SourceKind::Type(ty) => match name {
                "__name__" => Some(SourceValue::str(ty.name())),
                "__qualname__" => Some(SourceValue::str(ty.qualname())),
                "__module__" => ty.module().map(SourceValue::str),
                "__bases__" => Some(SourceValue::tuple(ty.bases().to_vec())),
                "__mro__" => Some(SourceValue::tuple(mro(self))),
                _ => lookup_in_mro(self, name),
            },
            SourceKind::Module(module) => match name {
                "__dict__" => Some(module.dict().clone()),
                _ => module.get(name),
            },
            SourceKind::Function(function) => match name {
                "__name__" => Some(SourceValue::str(function.name())),
                "__qualname__" => Some(SourceValue::str(function.qualname())),
                "__module__" => Some(function.module().map(SourceValue::str).unwrap_or_else(SourceValue::none)),
                "__globals__" => Some(function.globals().clone()),
                "__code__" => Some(SourceValue::code(function.code().clone())),
                "__defaults__" => Some(if function.defaults().is_empty() {
                    SourceValue::none()
                } else {
                    SourceValue::tuple(function.defaults().to_vec())
                }),
                "__closure__" => Some(if function.closure().is_empty() {
                    SourceValue::none()
                } else {
                    SourceValue::tuple(function.closure().to_vec())
                }),
                "__annotations__" => Some(SourceValue::dict(
                    function.annotations().iter().map(|(k, v)| (SourceValue::str(k.clone()), v.clone())),
                )),
                _ => function.attribute(name),
            },
            SourceKind::Exception(exception) => match name {
                "args" => Some(SourceValue::tuple(exception.args().to_vec())),
                "__cause__" => Some(exception.cause().unwrap_or_else(SourceValue::none)),
                _ => lookup_in_mro(exception.class(), name),
            },
            SourceKind::Native(native) => match name {
                "__name__" => Some(SourceValue::str(native.name())),
                "__module__" => Some(native.module().map(SourceValue::str).unwrap_or_else(SourceValue::none)),
                _ => None,
            },
            SourceKind::Code(code) => match name {
                "co_name" => Some(SourceValue::str(code.name.clone())),
                "co_qualname" => Some(SourceValue::str(code.qualname.clone())),
                "co_filename" => Some(SourceValue::str(code.filename.clone())),
                "co_firstlineno" => Some(SourceValue::int(code.first_line)),
                _ => None,
            },
            SourceKind::Cell(cell) if name == "cell_contents" => cell.borrow().clone(),
            _ => lookup_in_mro(&self.type_of(), name),
        }
    }

    pub fn set_attr(&self, name: &str, value: SourceValue) -> Result<(), SourceValue> {
        match self.kind() {
            SourceKind::Instance(instance) => instance.set(name, value),
            SourceKind::Type(ty) if ty.builtin_kind().is_none() => ty.set_attribute(name, value),
            SourceKind::Module(module) => module.set(name, value),
            SourceKind::Function(function) => function.set_attribute(name, value),
            SourceKind::Exception(exception) if name == "__cause__" => {
                exception.set_cause(if value.is_none() { None } else { Some(value) })
            }
            SourceKind::Cell(cell) if name == "cell_contents" => *cell.borrow_mut() = Some(value),
            _ => return Err(self.attribute_error(name)),
        }
        Ok(())
    }

    pub fn del_attr(&self, name: &str) -> Result<(), SourceValue> {
        let removed = match self.kind() {
            SourceKind::Instance(instance) => instance.remove(name),
            SourceKind::Type(ty) if ty.builtin_kind().is_none() => ty.remove_attribute(name),
            SourceKind::Module(module) => module.remove(name),
            SourceKind::Function(function) => function.remove_attribute(name),
            SourceKind::Cell(cell) if name == "cell_contents" => cell.borrow_mut().take(),
            _ => None,
        };
        match removed {
            Some(_) => Ok(()),
            None => Err(self.attribute_error(name)),
        }
    }

    /// Sorted attribute names visible on the object.
    pub fn dir(&self) -> Vec<String> {
        let mut names: IndexSet<String> = IndexSet::new();
        match self.kind() {
            SourceKind::Instance(instance) => {
                names.extend(instance.attributes().into_iter().map(|(k, _)| k));
                names.extend(class_attribute_names(instance.class()));
            }
            SourceKind::Type(_) => names.extend(class_attribute_names(self)),
            SourceKind::Module(module) => names.extend(module.dict().dict_items().into_iter().map(|(k, _)| k)),
            SourceKind::Function(function) => {
                names.extend(
                    ["__name__", "__qualname__", "__module__", "__globals__", "__code__", "__defaults__"]
                        .iter()
                        .map(|s| s.to_string()),
                );
                names.extend(function.attribute_names());
            }
            _ => names.extend(class_attribute_names(&self.type_of())),
        }
        let mut out: Vec<String> = names.into_iter().collect();
        out.sort();
        out
    }

    /// Calls the object. The error side is the raised exception.
    pub fn call(&self, args: &[SourceValue], kwargs: &KwArgs) -> Result<SourceValue, SourceValue> {
        match self.kind() {
            SourceKind::Native(native) => native.invoke(args, kwargs),
            SourceKind::Type(ty) => {
                if self.is_subclass(&builtin_type(BuiltinKind::BaseException)) {
                    return Ok(SourceValue::exception(ExceptionObject::new(self.clone(), args.to_vec())));
                }
                if ty.builtin_kind().is_some() {
                    return Err(SourceValue::new_exception(
                        BuiltinKind::TypeError,
                        format!("cannot construct '{}' through the bridge", ty.name()),
                    ));
                }
                if !args.is_empty() {
                    return Err(SourceValue::new_exception(
                        BuiltinKind::TypeError,
                        format!("{}() takes no positional arguments", ty.name()),
                    ));
                }
                // Classes without a native initializer take their fields as keywords.
                let instance = SourceValue::instance(self);
                for (name, value) in kwargs {
                    instance.set_attr(name, value.clone())?;
                }
                Ok(instance)
            }
            _ => Err(SourceValue::new_exception(
                BuiltinKind::TypeError,
                format!("'{}' object is not callable", self.type_name()),
            )),
        }
    }

    fn attribute_error(&self, name: &str) -> SourceValue {
        SourceValue::new_exception(
            BuiltinKind::AttributeError,
            format!("'{}' object has no attribute '{}'", self.type_name(), name),
        )
    }

    pub fn repr(&self) -> String {
        repr::repr(self)
    }
}

fn lookup_in_mro(class: &SourceValue, name: &str) -> Option<SourceValue> {
    mro(class).iter().find_map(|ty| ty.as_type().and_then(|ty| ty.attribute(name)))
}

fn class_attribute_names(class: &SourceValue) -> Vec<String> {
    mro(class)
        .iter()
        .filter_map(|ty| ty.as_type())
        .flat_map(|ty| ty.attributes().into_iter().map(|(k, _)| k))
        .collect()
}

// --- Value semantics ---

enum Numeric {
    Int(BigInt),
    Float(f64),
}

impl Numeric {
    fn of(value: &SourceValue) -> Option<Numeric> {
        match value.kind() {
            SourceKind::Bool(b) => Some(Numeric::Int(BigInt::from(*b as u8))),
            SourceKind::Int(i) => Some(Numeric::Int(i.clone())),
            SourceKind::Float(f) => Some(Numeric::Float(*f)),
            _ => None,
        }
    }

    fn integral(f: f64) -> Option<BigInt> {
        if f.is_finite() && f.fract() == 0.0 {
            BigInt::from_f64(f)
        } else {
            None
        }
    }

    fn equals(&self, other: &Numeric) -> bool {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a == b,
            (Numeric::Float(a), Numeric::Float(b)) => a == b,
            (Numeric::Int(i), Numeric::Float(f)) | (Numeric::Float(f), Numeric::Int(i)) => {
                Numeric::integral(*f).as_ref() == Some(i)
            }
        }
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        match self {
            Numeric::Int(i) => i.hash(state),
            Numeric::Float(f) => match Numeric::integral(*f) {
                Some(i) => i.hash(state),
                None => f.to_bits().hash(state),
            },
        }
    }
}

fn set_members(value: &SourceValue) -> Option<IndexSet<SourceValue>> {
    match value.kind() {
        SourceKind::Set(items) => Some(items.borrow().clone()),
        SourceKind::FrozenSet(items) => Some(items.clone()),
        _ => None,
    }
}

impl PartialEq for SourceValue {
    fn eq(&self, other: &Self) -> bool {
        if self.is(other) {
            return true;
        }
        use SourceKind as K;
        match (self.kind(), other.kind()) {
            (K::None, K::None) | (K::NotImplemented, K::NotImplemented) => true,
            (K::Str(a), K::Str(b)) => a == b,
            (K::Decimal(a), K::Decimal(b)) => a == b,
            (K::Complex { real: ar, imag: ai }, K::Complex { real: br, imag: bi }) => ar == br && ai == bi,
            (K::Tuple(a), K::Tuple(b)) => a == b,
            (K::List(a), K::List(b)) => *a.borrow() == *b.borrow(),
            (K::Dict(a), K::Dict(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (K::Slice { start: a0, stop: a1, step: a2 }, K::Slice { start: b0, stop: b1, step: b2 })
            | (K::Range { start: a0, stop: a1, step: a2 }, K::Range { start: b0, stop: b1, step: b2 }) => {
                a0 == b0 && a1 == b1 && a2 == b2
            }
            (K::Date(a), K::Date(b)) => a == b,
            (K::Time(a), K::Time(b)) => a == b,
            (K::DateTime(a), K::DateTime(b)) => a == b,
            (K::TimeDelta(a), K::TimeDelta(b)) => a == b,
            (K::Foreign(a), K::Foreign(b)) => a == b,
            _ => {
                if let (Some(a), Some(b)) = (self.as_bytes(), other.as_bytes()) {
                    return a == b;
                }
                if let (Some(a), Some(b)) = (set_members(self), set_members(other)) {
                    return a.len() == b.len() && a.iter().all(|item| b.contains(item));
                }
                match (Numeric::of(self), Numeric::of(other)) {
                    (Some(a), Some(b)) => a.equals(&b),
                    _ => false,
                }
            }
        }
    }
}

impl Eq for SourceValue {}

impl Hash for SourceValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(number) = Numeric::of(self) {
            number.hash_into(state);
            return;
        }
        use SourceKind as K;
        match self.kind() {
            K::None => 0u8.hash(state),
            K::NotImplemented => 1u8.hash(state),
            K::Str(s) => s.hash(state),
            K::Decimal(d) => d.hash(state),
            K::Bytes(b) => b.hash(state),
            K::ByteArray(b) => b.borrow().hash(state),
            K::Complex { real, imag } => {
                real.to_bits().hash(state);
                imag.to_bits().hash(state);
            }
            K::Tuple(items) => items.hash(state),
            // Mutable containers and sets hash by size so that equal values agree.
            K::List(items) => items.borrow().len().hash(state),
            K::Set(items) => items.borrow().len().hash(state),
            K::FrozenSet(items) => items.len().hash(state),
            K::Dict(entries) => entries.borrow().len().hash(state),
            K::Slice { .. } => 2u8.hash(state),
            K::Range { .. } => 3u8.hash(state),
            K::Date(d) => d.hash(state),
            K::Time(t) => t.hash(state),
            K::DateTime(dt) => dt.hash(state),
            K::TimeDelta(td) => td.hash(state),
            K::Foreign(value) => value.hash(state),
            _ => self.id().hash(state),
        }
    }
}

impl fmt::Debug for SourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for SourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            SourceKind::Str(s) => f.write_str(s),
            SourceKind::Exception(exception) => f.write_str(&exception.message()),
            _ => f.write_str(&self.repr()),
        }
    }
}
