//! The source runtime's object model.
//!
//! Values are shared, reference-counted allocations. Identity is the address
//! of the allocation (see [`SourceValue::id`]); equality and hashing follow the
//! runtime's value semantics for scalars and containers and fall back to
//! identity for everything else.

mod builtins;
mod exception;
mod function;
mod iter;
mod module;
mod repr;
mod types;
mod value;

pub use builtins::{builtin_kind_of, builtin_type};
pub use exception::{ExceptionObject, FrameSummary, ReconstructedTrace, TracebackSummary};
pub use function::{CodeFlags, CodeObject, FunctionObject, KwArgs, MethodKind, NativeFn, NativeFunction};
pub use iter::SourceIterator;
pub use module::ModuleObject;
pub use types::{mro, ClassBuilder, HintForm, InstanceObject, TypeFlags, TypeObject};
pub use value::{SourceKind, SourceValue};
