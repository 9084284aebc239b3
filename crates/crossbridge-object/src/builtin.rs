/// A builtin type that exists in both runtimes.
///
/// Declaration order matters: every kind is declared after its base, so the
/// per-thread type tables can be built in a single pass over [`BuiltinKind::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinKind {
    Object,
    Type,
    NoneType,
    NotImplementedType,
    Int,
    Bool,
    Float,
    Complex,
    Decimal,
    Str,
    Bytes,
    ByteArray,
    Tuple,
    List,
    Set,
    FrozenSet,
    Dict,
    Slice,
    Range,
    Date,
    Time,
    DateTime,
    TimeDelta,
    Module,
    Function,
    Code,
    Cell,
    BuiltinFunction,
    Iterator,
    BaseException,
    Exception,
    ArithmeticError,
    ZeroDivisionError,
    OverflowError,
    LookupError,
    KeyError,
    IndexError,
    ValueError,
    TypeError,
    AttributeError,
    NameError,
    RuntimeError,
    NotImplementedError,
    RecursionError,
    StopIteration,
    AssertionError,
    SystemError,
    ImportError,
    ModuleNotFoundError,
}

impl BuiltinKind {
    pub const ALL: &'static [BuiltinKind] = &[
        BuiltinKind::Object,
        BuiltinKind::Type,
        BuiltinKind::NoneType,
        BuiltinKind::NotImplementedType,
        BuiltinKind::Int,
        BuiltinKind::Bool,
        BuiltinKind::Float,
        BuiltinKind::Complex,
        BuiltinKind::Decimal,
        BuiltinKind::Str,
        BuiltinKind::Bytes,
        BuiltinKind::ByteArray,
        BuiltinKind::Tuple,
        BuiltinKind::List,
        BuiltinKind::Set,
        BuiltinKind::FrozenSet,
        BuiltinKind::Dict,
        BuiltinKind::Slice,
        BuiltinKind::Range,
        BuiltinKind::Date,
        BuiltinKind::Time,
        BuiltinKind::DateTime,
        BuiltinKind::TimeDelta,
        BuiltinKind::Module,
        BuiltinKind::Function,
        BuiltinKind::Code,
        BuiltinKind::Cell,
        BuiltinKind::BuiltinFunction,
        BuiltinKind::Iterator,
        BuiltinKind::BaseException,
        BuiltinKind::Exception,
        BuiltinKind::ArithmeticError,
        BuiltinKind::ZeroDivisionError,
        BuiltinKind::OverflowError,
        BuiltinKind::LookupError,
        BuiltinKind::KeyError,
        BuiltinKind::IndexError,
        BuiltinKind::ValueError,
        BuiltinKind::TypeError,
        BuiltinKind::AttributeError,
        BuiltinKind::NameError,
        BuiltinKind::RuntimeError,
        BuiltinKind::NotImplementedError,
        BuiltinKind::RecursionError,
        BuiltinKind::StopIteration,
        BuiltinKind::AssertionError,
        BuiltinKind::SystemError,
        BuiltinKind::ImportError,
        BuiltinKind::ModuleNotFoundError,
    ];

    /// Position of this kind in [`BuiltinKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Object => "object",
            BuiltinKind::Type => "type",
            BuiltinKind::NoneType => "NoneType",
            BuiltinKind::NotImplementedType => "NotImplementedType",
            BuiltinKind::Int => "int",
            BuiltinKind::Bool => "bool",
            BuiltinKind::Float => "float",
            BuiltinKind::Complex => "complex",
            BuiltinKind::Decimal => "Decimal",
            BuiltinKind::Str => "str",
            BuiltinKind::Bytes => "bytes",
            BuiltinKind::ByteArray => "bytearray",
            BuiltinKind::Tuple => "tuple",
            BuiltinKind::List => "list",
            BuiltinKind::Set => "set",
            BuiltinKind::FrozenSet => "frozenset",
            BuiltinKind::Dict => "dict",
            BuiltinKind::Slice => "slice",
            BuiltinKind::Range => "range",
            BuiltinKind::Date => "date",
            BuiltinKind::Time => "time",
            BuiltinKind::DateTime => "datetime",
            BuiltinKind::TimeDelta => "timedelta",
            BuiltinKind::Module => "module",
            BuiltinKind::Function => "function",
            BuiltinKind::Code => "code",
            BuiltinKind::Cell => "cell",
            BuiltinKind::BuiltinFunction => "builtin_function_or_method",
            BuiltinKind::Iterator => "iterator",
            BuiltinKind::BaseException => "BaseException",
            BuiltinKind::Exception => "Exception",
            BuiltinKind::ArithmeticError => "ArithmeticError",
            BuiltinKind::ZeroDivisionError => "ZeroDivisionError",
            BuiltinKind::OverflowError => "OverflowError",
            BuiltinKind::LookupError => "LookupError",
            BuiltinKind::KeyError => "KeyError",
            BuiltinKind::IndexError => "IndexError",
            BuiltinKind::ValueError => "ValueError",
            BuiltinKind::TypeError => "TypeError",
            BuiltinKind::AttributeError => "AttributeError",
            BuiltinKind::NameError => "NameError",
            BuiltinKind::RuntimeError => "RuntimeError",
            BuiltinKind::NotImplementedError => "NotImplementedError",
            BuiltinKind::RecursionError => "RecursionError",
            BuiltinKind::StopIteration => "StopIteration",
            BuiltinKind::AssertionError => "AssertionError",
            BuiltinKind::SystemError => "SystemError",
            BuiltinKind::ImportError => "ImportError",
            BuiltinKind::ModuleNotFoundError => "ModuleNotFoundError",
        }
    }

    /// Module the type is defined in.
    pub fn module(self) -> &'static str {
        match self {
            BuiltinKind::Decimal => "decimal",
            BuiltinKind::Date | BuiltinKind::Time | BuiltinKind::DateTime | BuiltinKind::TimeDelta => {
                "datetime"
            }
            _ => "builtins",
        }
    }

    /// Direct base type; `None` only for `object`.
    pub fn base(self) -> Option<BuiltinKind> {
        use BuiltinKind::*;
        match self {
            Object => None,
            Bool => Some(Int),
            DateTime => Some(Date),
            BaseException => Some(Object),
            Exception | StopIteration => Some(BaseException),
            ArithmeticError | LookupError | ValueError | TypeError | AttributeError | NameError
            | RuntimeError | AssertionError | SystemError | ImportError => Some(Exception),
            ZeroDivisionError | OverflowError => Some(ArithmeticError),
            KeyError | IndexError => Some(LookupError),
            NotImplementedError | RecursionError => Some(RuntimeError),
            ModuleNotFoundError => Some(ImportError),
            _ => Some(Object),
        }
    }

    pub fn is_exception(self) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == BuiltinKind::BaseException {
                return true;
            }
            current = kind.base();
        }
        false
    }

    /// Looks up a builtin exception class by its declared name.
    pub fn exception_named(name: &str) -> Option<BuiltinKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.is_exception() && kind.name() == name)
    }
}
