use std::cell::RefCell;
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use super::exception::TargetException;
use super::function::{TargetCode, TargetFunction};
use super::host::OpaqueRef;
use super::instance::TargetInstance;
use super::iter::TargetIterator;
use super::module::TargetModule;
use super::namespace::GlobalsMap;
use super::types::TargetType;
use crate::temporal::{Date, DateTime, Time, TimeDelta};
use crate::{BuiltinKind, ObjectId};

/// A raw object of the target runtime that is not python-like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeObject {
    pub class_name: String,
    pub display: String,
}

/// Every shape a target-runtime value can take.
pub enum TargetKind {
    None,
    NotImplemented,
    Boolean(bool),
    Integer(BigInt),
    Float(f64),
    Decimal(String),
    Complex { real: TargetValue, imag: TargetValue },
    String(String),
    Bytes(Vec<u8>),
    ByteArray(RefCell<Vec<u8>>),
    /// Filled in place while it is being bridged, then never mutated.
    Tuple(RefCell<Vec<TargetValue>>),
    List(RefCell<Vec<TargetValue>>),
    Set(RefCell<IndexSet<TargetValue>>),
    /// Filled in place while it is being bridged, then never mutated.
    FrozenSet(RefCell<IndexSet<TargetValue>>),
    Dict(RefCell<IndexMap<TargetValue, TargetValue>>),
    Slice { start: TargetValue, stop: TargetValue, step: TargetValue },
    Range { start: TargetValue, stop: TargetValue, step: TargetValue },
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    TimeDelta(TimeDelta),
    Type(TargetType),
    Module(TargetModule),
    Cell(RefCell<TargetValue>),
    Instance(TargetInstance),
    Function(TargetFunction),
    /// Stands for a function while it is still being translated.
    FunctionWrapper(RefCell<Option<TargetValue>>),
    Code(TargetCode),
    Exception(TargetException),
    Iterator(RefCell<Box<dyn TargetIterator>>),
    Namespace(GlobalsMap),
    Opaque(OpaqueRef),
    Native(NativeObject),
}

struct Singletons {
    none: TargetValue,
    not_implemented: TargetValue,
    true_: TargetValue,
    false_: TargetValue,
}

thread_local! {
    static SINGLETONS: Singletons = Singletons {
        none: TargetValue::new(TargetKind::None),
        not_implemented: TargetValue::new(TargetKind::NotImplemented),
        true_: TargetValue::new(TargetKind::Boolean(true)),
        false_: TargetValue::new(TargetKind::Boolean(false)),
    };
}

/// A shared handle to a target-runtime value.
#[derive(Clone)]
pub struct TargetValue(Rc<TargetKind>);

impl TargetValue {
    pub fn new(kind: TargetKind) -> Self {
        TargetValue(Rc::new(kind))
    }

    pub fn kind(&self) -> &TargetKind {
        &self.0
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::of(&self.0)
    }

    pub fn is(&self, other: &TargetValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // --- Constructors ---

    pub fn none() -> Self {
        SINGLETONS.with(|s| s.none.clone())
    }

    pub fn not_implemented() -> Self {
        SINGLETONS.with(|s| s.not_implemented.clone())
    }

    pub fn boolean(value: bool) -> Self {
        SINGLETONS.with(|s| if value { s.true_.clone() } else { s.false_.clone() })
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::new(TargetKind::Integer(value.into()))
    }

    pub fn float(value: f64) -> Self {
        Self::new(TargetKind::Float(value))
    }

    pub fn decimal(text: impl Into<String>) -> Self {
        Self::new(TargetKind::Decimal(text.into()))
    }

    pub fn complex(real: TargetValue, imag: TargetValue) -> Self {
        Self::new(TargetKind::Complex { real, imag })
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::new(TargetKind::String(text.into()))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::new(TargetKind::Bytes(data.into()))
    }

    pub fn bytearray(data: impl Into<Vec<u8>>) -> Self {
        Self::new(TargetKind::ByteArray(RefCell::new(data.into())))
    }

    pub fn tuple(items: Vec<TargetValue>) -> Self {
        Self::new(TargetKind::Tuple(RefCell::new(items)))
    }

    pub fn list(items: Vec<TargetValue>) -> Self {
        Self::new(TargetKind::List(RefCell::new(items)))
    }

    pub fn set(items: impl IntoIterator<Item = TargetValue>) -> Self {
        Self::new(TargetKind::Set(RefCell::new(items.into_iter().collect())))
    }

    pub fn frozenset(items: impl IntoIterator<Item = TargetValue>) -> Self {
        Self::new(TargetKind::FrozenSet(RefCell::new(items.into_iter().collect())))
    }

    pub fn dict(entries: impl IntoIterator<Item = (TargetValue, TargetValue)>) -> Self {
        Self::new(TargetKind::Dict(RefCell::new(entries.into_iter().collect())))
    }

    pub fn slice(start: TargetValue, stop: TargetValue, step: TargetValue) -> Self {
        Self::new(TargetKind::Slice { start, stop, step })
    }

    pub fn range(start: TargetValue, stop: TargetValue, step: TargetValue) -> Self {
        Self::new(TargetKind::Range { start, stop, step })
    }

    pub fn type_(ty: TargetType) -> Self {
        Self::new(TargetKind::Type(ty))
    }

    pub fn module(module: TargetModule) -> Self {
        Self::new(TargetKind::Module(module))
    }

    pub fn cell(contents: TargetValue) -> Self {
        Self::new(TargetKind::Cell(RefCell::new(contents)))
    }

    pub fn instance(instance: TargetInstance) -> Self {
        Self::new(TargetKind::Instance(instance))
    }

    pub fn function(function: TargetFunction) -> Self {
        Self::new(TargetKind::Function(function))
    }

    pub fn function_wrapper() -> Self {
        Self::new(TargetKind::FunctionWrapper(RefCell::new(None)))
    }

    pub fn code(code: TargetCode) -> Self {
        Self::new(TargetKind::Code(code))
    }

    pub fn exception(exception: TargetException) -> Self {
        Self::new(TargetKind::Exception(exception))
    }

    pub fn iterator(iterator: impl TargetIterator + 'static) -> Self {
        Self::new(TargetKind::Iterator(RefCell::new(Box::new(iterator))))
    }

    pub fn namespace(globals: GlobalsMap) -> Self {
        Self::new(TargetKind::Namespace(globals))
    }

    pub fn opaque(reference: OpaqueRef) -> Self {
        Self::new(TargetKind::Opaque(reference))
    }

    pub fn native(object: NativeObject) -> Self {
        Self::new(TargetKind::Native(object))
    }

    /// Builds `bytes` (or `bytearray` when `mutable`) from a tuple of integers
    /// in `0..=255`.
    pub fn from_int_tuple(tuple: &TargetValue, mutable: bool) -> Option<TargetValue> {
        let items = tuple.as_tuple()?;
        let data = items
            .iter()
            .map(|item| item.as_integer().and_then(|i| i.to_u8()))
            .collect::<Option<Vec<u8>>>()?;
        Some(if mutable { Self::bytearray(data) } else { Self::bytes(data) })
    }

    /// The contents of `bytes`/`bytearray` as a tuple of integers.
    pub fn as_int_tuple(&self) -> Option<TargetValue> {
        let data = self.as_bytes()?;
        Some(Self::tuple(data.into_iter().map(TargetValue::integer).collect()))
    }

    // --- Accessors ---

    pub fn is_none(&self) -> bool {
        matches!(self.kind(), TargetKind::None)
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self.kind() {
            TargetKind::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self.kind() {
            TargetKind::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.kind() {
            TargetKind::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self.kind() {
            TargetKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self.kind() {
            TargetKind::Bytes(b) => Some(b.clone()),
            TargetKind::ByteArray(b) => Some(b.borrow().clone()),
            _ => None,
        }
    }

    /// Snapshot of a tuple's items.
    pub fn as_tuple(&self) -> Option<Vec<TargetValue>> {
        match self.kind() {
            TargetKind::Tuple(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&RefCell<Vec<TargetValue>>> {
        match self.kind() {
            TargetKind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&RefCell<IndexMap<TargetValue, TargetValue>>> {
        match self.kind() {
            TargetKind::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TargetType> {
        match self.kind() {
            TargetKind::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&TargetModule> {
        match self.kind() {
            TargetKind::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&TargetInstance> {
        match self.kind() {
            TargetKind::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&TargetFunction> {
        match self.kind() {
            TargetKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_exception(&self) -> Option<&TargetException> {
        match self.kind() {
            TargetKind::Exception(exception) => Some(exception),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&GlobalsMap> {
        match self.kind() {
            TargetKind::Namespace(globals) => Some(globals),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueRef> {
        match self.kind() {
            TargetKind::Opaque(reference) => Some(reference),
            _ => None,
        }
    }

    /// Items of a tuple, list, set or frozenset (keys for dicts), as a snapshot.
    pub fn items(&self) -> Option<Vec<TargetValue>> {
        match self.kind() {
            TargetKind::Tuple(items) | TargetKind::List(items) => Some(items.borrow().clone()),
            TargetKind::Set(items) | TargetKind::FrozenSet(items) => Some(items.borrow().iter().cloned().collect()),
            TargetKind::Dict(entries) => Some(entries.borrow().keys().cloned().collect()),
            _ => None,
        }
    }

    /// Appends to a tuple, list, set or frozenset that is being filled.
    /// Returns `false` for any other value.
    pub fn push_item(&self, item: TargetValue) -> bool {
        match self.kind() {
            TargetKind::Tuple(items) | TargetKind::List(items) => items.borrow_mut().push(item),
            TargetKind::Set(items) | TargetKind::FrozenSet(items) => {
                items.borrow_mut().insert(item);
            }
            _ => return false,
        }
        true
    }

    /// Fills the wrapper registered for a function under translation.
    pub fn resolve_wrapper(&self, function: TargetValue) -> bool {
        match self.kind() {
            TargetKind::FunctionWrapper(slot) => {
                *slot.borrow_mut() = Some(function);
                true
            }
            _ => false,
        }
    }

    /// Inserts into a dict that is being filled. Returns `false` for any
    /// other value.
    pub fn dict_insert(&self, key: TargetValue, value: TargetValue) -> bool {
        match self.as_dict() {
            Some(entries) => {
                entries.borrow_mut().insert(key, value);
                true
            }
            None => false,
        }
    }

    pub fn set_cell(&self, contents: TargetValue) -> bool {
        match self.kind() {
            TargetKind::Cell(slot) => {
                *slot.borrow_mut() = contents;
                true
            }
            _ => false,
        }
    }

    fn builtin_kind(&self) -> Option<BuiltinKind> {
        let kind = match self.kind() {
            TargetKind::None => BuiltinKind::NoneType,
            TargetKind::NotImplemented => BuiltinKind::NotImplementedType,
            TargetKind::Boolean(_) => BuiltinKind::Bool,
            TargetKind::Integer(_) => BuiltinKind::Int,
            TargetKind::Float(_) => BuiltinKind::Float,
            TargetKind::Decimal(_) => BuiltinKind::Decimal,
            TargetKind::Complex { .. } => BuiltinKind::Complex,
            TargetKind::String(_) => BuiltinKind::Str,
            TargetKind::Bytes(_) => BuiltinKind::Bytes,
            TargetKind::ByteArray(_) => BuiltinKind::ByteArray,
            TargetKind::Tuple(_) => BuiltinKind::Tuple,
            TargetKind::List(_) => BuiltinKind::List,
            TargetKind::Set(_) => BuiltinKind::Set,
            TargetKind::FrozenSet(_) => BuiltinKind::FrozenSet,
            TargetKind::Dict(_) | TargetKind::Namespace(_) => BuiltinKind::Dict,
            TargetKind::Slice { .. } => BuiltinKind::Slice,
            TargetKind::Range { .. } => BuiltinKind::Range,
            TargetKind::Date(_) => BuiltinKind::Date,
            TargetKind::Time(_) => BuiltinKind::Time,
            TargetKind::DateTime(_) => BuiltinKind::DateTime,
            TargetKind::TimeDelta(_) => BuiltinKind::TimeDelta,
            TargetKind::Type(_) => BuiltinKind::Type,
            TargetKind::Module(_) => BuiltinKind::Module,
            TargetKind::Cell(_) => BuiltinKind::Cell,
            TargetKind::Function(_) | TargetKind::FunctionWrapper(_) => BuiltinKind::Function,
            TargetKind::Code(_) => BuiltinKind::Code,
            TargetKind::Iterator(_) => BuiltinKind::Iterator,
            TargetKind::Instance(_) | TargetKind::Exception(_) | TargetKind::Opaque(_) | TargetKind::Native(_) => {
                return None
            }
        };
        Some(kind)
    }

    /// The type descriptor of the value. Opaque references and raw runtime
    /// objects report the base type.
    pub fn target_type(&self) -> TargetType {
        match self.kind() {
            TargetKind::Instance(instance) => instance.ty().clone(),
            TargetKind::Exception(exception) => exception.python_type().cloned().unwrap_or_else(TargetType::base),
            _ => self.builtin_kind().map_or_else(TargetType::base, TargetType::builtin),
        }
    }

    /// Name of the value's type, for diagnostics.
    pub fn type_name(&self) -> String {
        if let Some(kind) = self.builtin_kind() {
            return kind.name().to_string();
        }
        match self.kind() {
            TargetKind::Instance(instance) => instance.ty().name().to_string(),
            TargetKind::Exception(exception) => exception.simple_name().to_string(),
            TargetKind::Opaque(reference) => reference.referent().type_name(),
            TargetKind::Native(object) => object.class_name.clone(),
            _ => BuiltinKind::Object.name().to_string(),
        }
    }
}

// --- Value semantics ---

fn integral(f: f64) -> Option<BigInt> {
    if f.is_finite() && f.fract() == 0.0 {
        BigInt::from_f64(f)
    } else {
        None
    }
}

fn numeric(value: &TargetValue) -> Option<Result<BigInt, f64>> {
    match value.kind() {
        TargetKind::Boolean(b) => Some(Ok(BigInt::from(*b as u8))),
        TargetKind::Integer(i) => Some(Ok(i.clone())),
        TargetKind::Float(f) => Some(integral(*f).ok_or(*f)),
        _ => None,
    }
}

fn set_snapshot(value: &TargetValue) -> Option<IndexSet<TargetValue>> {
    match value.kind() {
        TargetKind::Set(items) | TargetKind::FrozenSet(items) => Some(items.borrow().clone()),
        _ => None,
    }
}

impl PartialEq for TargetValue {
    fn eq(&self, other: &Self) -> bool {
        if self.is(other) {
            return true;
        }
        use TargetKind as K;
        match (self.kind(), other.kind()) {
            (K::None, K::None) | (K::NotImplemented, K::NotImplemented) => true,
            (K::String(a), K::String(b)) => a == b,
            (K::Decimal(a), K::Decimal(b)) => a == b,
            (K::Complex { real: ar, imag: ai }, K::Complex { real: br, imag: bi }) => ar == br && ai == bi,
            (K::Tuple(a), K::Tuple(b)) | (K::List(a), K::List(b)) => *a.borrow() == *b.borrow(),
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
            (K::Type(a), K::Type(b)) => a == b,
            (K::Opaque(a), K::Opaque(b)) => a == b,
            (K::Native(a), K::Native(b)) => a == b,
            _ => {
                if let (Some(a), Some(b)) = (self.as_bytes(), other.as_bytes()) {
                    return a == b;
                }
                if let (Some(a), Some(b)) = (set_snapshot(self), set_snapshot(other)) {
                    return a.len() == b.len() && a.iter().all(|item| b.contains(item));
                }
                match (numeric(self), numeric(other)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
        }
    }
}

impl Eq for TargetValue {}

impl Hash for TargetValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(number) = numeric(self) {
            match number {
                Ok(i) => i.hash(state),
                Err(f) => f.to_bits().hash(state),
            }
            return;
        }
        use TargetKind as K;
        match self.kind() {
            K::None => 0u8.hash(state),
            K::NotImplemented => 1u8.hash(state),
            K::String(s) => s.hash(state),
            K::Decimal(d) => d.hash(state),
            K::Bytes(b) => b.hash(state),
            K::ByteArray(b) => b.borrow().hash(state),
            K::Complex { real, imag } => {
                real.hash(state);
                imag.hash(state);
            }
            K::Tuple(items) => items.borrow().hash(state),
            K::List(items) => items.borrow().len().hash(state),
            K::Set(items) | K::FrozenSet(items) => items.borrow().len().hash(state),
            K::Dict(entries) => entries.borrow().len().hash(state),
            K::Slice { .. } => 2u8.hash(state),
            K::Range { .. } => 3u8.hash(state),
            K::Date(d) => d.hash(state),
            K::Time(t) => t.hash(state),
            K::DateTime(dt) => dt.hash(state),
            K::TimeDelta(td) => td.hash(state),
            K::Type(ty) => ty.hash(state),
            K::Opaque(reference) => reference.id().hash(state),
            K::Native(object) => object.class_name.hash(state),
            _ => self.id().hash(state),
        }
    }
}

// --- Rendering ---

fn write_seq(items: &[TargetValue], out: &mut String, seen: &mut Vec<ObjectId>) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_debug(item, out, seen);
    }
}

fn write_debug(value: &TargetValue, out: &mut String, seen: &mut Vec<ObjectId>) {
    let id = value.id();
    if seen.contains(&id) {
        out.push_str("...");
        return;
    }
    seen.push(id);
    use TargetKind as K;
    match value.kind() {
        K::None => out.push_str("None"),
        K::NotImplemented => out.push_str("NotImplemented"),
        K::Boolean(b) => out.push_str(if *b { "True" } else { "False" }),
        K::Integer(i) => {
            let _ = write!(out, "{}", i);
        }
        K::Float(f) => {
            let _ = write!(out, "{:?}", f);
        }
        K::Decimal(d) => {
            let _ = write!(out, "Decimal({})", d);
        }
        K::Complex { real, imag } => {
            out.push_str("complex(");
            write_seq(&[real.clone(), imag.clone()], out, seen);
            out.push(')');
        }
        K::String(s) => {
            let _ = write!(out, "{:?}", s);
        }
        K::Bytes(b) => {
            let _ = write!(out, "bytes{:?}", b);
        }
        K::ByteArray(b) => {
            let _ = write!(out, "bytearray{:?}", b.borrow());
        }
        K::Tuple(items) => {
            out.push('(');
            write_seq(&items.borrow().clone(), out, seen);
            out.push(')');
        }
        K::List(items) => {
            out.push('[');
            write_seq(&items.borrow().clone(), out, seen);
            out.push(']');
        }
        K::Set(items) | K::FrozenSet(items) => {
            out.push('{');
            let items: Vec<TargetValue> = items.borrow().iter().cloned().collect();
            write_seq(&items, out, seen);
            out.push('}');
        }
        K::Dict(entries) => {
            let entries: Vec<(TargetValue, TargetValue)> =
                entries.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_debug(k, out, seen);
                out.push_str(": ");
                write_debug(v, out, seen);
            }
            out.push('}');
        }
        K::Slice { start, stop, step } | K::Range { start, stop, step } => {
            out.push_str(if matches!(value.kind(), K::Slice { .. }) { "slice(" } else { "range(" });
            write_seq(&[start.clone(), stop.clone(), step.clone()], out, seen);
            out.push(')');
        }
        K::Date(d) => {
            let _ = write!(out, "date({})", d);
        }
        K::Time(t) => {
            let _ = write!(out, "time({})", t);
        }
        K::DateTime(dt) => {
            let _ = write!(out, "datetime({})", dt);
        }
        K::TimeDelta(td) => {
            let _ = write!(out, "timedelta({})", td);
        }
        K::Type(ty) => {
            let _ = write!(out, "{:?}", ty);
        }
        K::Module(module) => {
            let _ = write!(out, "<module {}>", module.name());
        }
        K::Cell(contents) => {
            out.push_str("cell(");
            let contents = contents.borrow().clone();
            write_debug(&contents, out, seen);
            out.push(')');
        }
        K::Instance(instance) => {
            let _ = write!(out, "<{} instance>", instance.ty().name());
        }
        K::Function(function) => {
            let _ = write!(out, "{:?}", function);
        }
        K::FunctionWrapper(slot) => match slot.borrow().as_ref() {
            Some(function) => {
                let _ = write!(out, "wrapper({:?})", function);
            }
            None => out.push_str("wrapper(<pending>)"),
        },
        K::Code(code) => {
            let _ = write!(out, "<code {}>", code.class_name().unwrap_or("<wrapped>"));
        }
        K::Exception(exception) => {
            let _ = write!(out, "{}({})", exception.class_name(), exception.message().unwrap_or(""));
        }
        K::Iterator(_) => out.push_str("<iterator>"),
        K::Namespace(globals) => {
            let _ = write!(out, "<globals of {}: {:?}>", globals.source_key(), globals.names());
        }
        K::Opaque(reference) => {
            let _ = write!(out, "<opaque {:?}>", reference.referent());
        }
        K::Native(object) => {
            let _ = write!(out, "<{} {}>", object.class_name, object.display);
        }
    }
    seen.pop();
}

impl fmt::Debug for TargetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_debug(self, &mut out, &mut Vec::new());
        f.write_str(&out)
    }
}
