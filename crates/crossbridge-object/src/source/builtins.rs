use super::types::TypeObject;
use super::value::{SourceKind, SourceValue};
use crate::BuiltinKind;

struct Singletons {
    none: SourceValue,
    not_implemented: SourceValue,
    true_: SourceValue,
    false_: SourceValue,
}

thread_local! {
    static SINGLETONS: Singletons = Singletons {
        none: SourceValue::new(SourceKind::None),
        not_implemented: SourceValue::new(SourceKind::NotImplemented),
        true_: SourceValue::new(SourceKind::Bool(true)),
        false_: SourceValue::new(SourceKind::Bool(false)),
    };

    static TYPES: Vec<SourceValue> = bootstrap_types();
}

fn bootstrap_types() -> Vec<SourceValue> {
    let mut table: Vec<SourceValue> = Vec::with_capacity(BuiltinKind::ALL.len());
    for kind in BuiltinKind::ALL {
        let bases = match kind.base() {
            Some(base) => vec![table[base.index()].clone()],
            None => Vec::new(),
        };
        table.push(SourceValue::new(SourceKind::Type(TypeObject::builtin(*kind, bases))));
    }
    table
}

pub(crate) fn none() -> SourceValue {
    SINGLETONS.with(|s| s.none.clone())
}

pub(crate) fn not_implemented() -> SourceValue {
    SINGLETONS.with(|s| s.not_implemented.clone())
}

pub(crate) fn boolean(value: bool) -> SourceValue {
    SINGLETONS.with(|s| if value { s.true_.clone() } else { s.false_.clone() })
}

/// The per-thread type object for a builtin kind.
pub fn builtin_type(kind: BuiltinKind) -> SourceValue {
    TYPES.with(|types| types[kind.index()].clone())
}

/// The builtin kind a type object stands for, if it is one of the builtins.
pub fn builtin_kind_of(ty: &SourceValue) -> Option<BuiltinKind> {
    ty.as_type().and_then(TypeObject::builtin_kind)
}

pub(crate) fn type_of(value: &SourceValue) -> SourceValue {
    let kind = match value.kind() {
        SourceKind::None => BuiltinKind::NoneType,
        SourceKind::NotImplemented => BuiltinKind::NotImplementedType,
        SourceKind::Bool(_) => BuiltinKind::Bool,
        SourceKind::Int(_) => BuiltinKind::Int,
        SourceKind::Float(_) => BuiltinKind::Float,
        SourceKind::Decimal(_) => BuiltinKind::Decimal,
        SourceKind::Complex { .. } => BuiltinKind::Complex,
        SourceKind::Str(_) => BuiltinKind::Str,
        SourceKind::Bytes(_) => BuiltinKind::Bytes,
        SourceKind::ByteArray(_) => BuiltinKind::ByteArray,
        SourceKind::Tuple(_) => BuiltinKind::Tuple,
        SourceKind::List(_) => BuiltinKind::List,
        SourceKind::Set(_) => BuiltinKind::Set,
        SourceKind::FrozenSet(_) => BuiltinKind::FrozenSet,
        SourceKind::Dict(_) => BuiltinKind::Dict,
        SourceKind::Slice { .. } => BuiltinKind::Slice,
        SourceKind::Range { .. } => BuiltinKind::Range,
        SourceKind::Date(_) => BuiltinKind::Date,
        SourceKind::Time(_) => BuiltinKind::Time,
        SourceKind::DateTime(_) => BuiltinKind::DateTime,
        SourceKind::TimeDelta(_) => BuiltinKind::TimeDelta,
        SourceKind::Type(_) => BuiltinKind::Type,
        SourceKind::Hint(_) => BuiltinKind::Object,
        SourceKind::Module(_) => BuiltinKind::Module,
        SourceKind::Function(_) => BuiltinKind::Function,
        SourceKind::Code(_) => BuiltinKind::Code,
        SourceKind::Cell(_) => BuiltinKind::Cell,
        SourceKind::Instance(instance) => return instance.class().clone(),
        SourceKind::Exception(exception) => return exception.class().clone(),
        SourceKind::Iterator(_) => BuiltinKind::Iterator,
        SourceKind::Native(_) => BuiltinKind::BuiltinFunction,
        SourceKind::Foreign(_) => BuiltinKind::Object,
    };
    builtin_type(kind)
}
