//! The target runtime's object model.
//!
//! Target values are python-like objects living in the managed runtime that
//! executes translated code. Anything the bridge could not translate is held
//! behind an [`OpaqueRef`], and the target runtime reaches back through a
//! [`SourceHost`] to operate on it.

mod exception;
mod function;
mod host;
mod instance;
mod iter;
mod module;
mod namespace;
mod types;
mod value;

pub use exception::{StackFrame, TargetException};
pub use function::{TargetCallable, TargetCode, TargetFunction, TargetKwArgs};
pub use host::{OpaqueRef, SourceHost};
pub use instance::TargetInstance;
pub use iter::{SequenceIterator, TargetIterator};
pub use module::TargetModule;
pub use namespace::GlobalsMap;
pub use types::{DescriptorKind, TargetType, TypeHint};
pub use value::{NativeObject, TargetKind, TargetValue};
