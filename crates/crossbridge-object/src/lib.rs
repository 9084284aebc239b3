//! Object models for the two runtimes joined by crossbridge.
//!
//! The *source* runtime is dynamic and reference counted: every value is a
//! shared allocation whose identity is its address, containers are mutable in
//! place, and code is carried as wordcode. The *target* runtime executes
//! translated code and works on python-like values, type descriptors and
//! opaque references back into the source runtime.
//!
//! Neither model knows how to convert into the other; `crossbridge-marshal`
//! owns that.

mod builtin;
mod id;
pub mod source;
pub mod target;
pub mod temporal;

pub use builtin::BuiltinKind;
pub use id::ObjectId;
pub use source::{SourceKind, SourceValue};
pub use target::{TargetKind, TargetValue};
