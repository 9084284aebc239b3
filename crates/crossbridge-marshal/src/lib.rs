//! Moving live object graphs between the source and target runtimes.
//!
//! A [`BridgeContext`] owns everything that outlives a single conversion:
//! the type registry, the module table, lazily copied module namespaces and
//! memoized function translations. Conversions go outward with
//! [`BridgeContext::to_target`] and inward with [`BridgeContext::to_source`];
//! both keep shared references shared and terminate on cycles.
//!
//! Functions and code bodies are turned into [`CompiledFunctionDescriptor`]s
//! and handed to a [`BytecodeTranslator`]; user classes become
//! [`ClassDescriptor`]s for a [`ClassTranslator`]. Whatever cannot be
//! translated crosses as an opaque reference the target runtime can still
//! operate on through the bridge's `SourceHost` callbacks.
//!
//! [`CompiledFunctionDescriptor`]: crossbridge_bytecode::CompiledFunctionDescriptor

mod class;
mod collaborator;
mod config;
mod context;
mod error;
mod exception;
mod extract;
mod function;
mod host;
mod identity;
mod inward;
mod iter;
mod namespace;
mod outward;

pub use class::ClassDescriptor;
pub use collaborator::{BytecodeTranslator, ClassTranslator, NoTranslator};
pub use config::BridgeConfig;
pub use context::{Bridge, BridgeContext};
pub use error::{BridgeError, BridgeResult};
pub use exception::{error_to_target, system_error_message};
pub use identity::{CloneMap, IdentityMap};
pub use iter::ForeignIterator;
