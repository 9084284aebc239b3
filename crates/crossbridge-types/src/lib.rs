//! Mapping between source classes and target type descriptors.

mod adapter;
mod error;
mod hint;
mod registry;

pub use adapter::{ToSourceFn, ToTargetFn, TypeAdapter};
pub use error::{RegistryError, RegistryResult, TranslationError};
pub use hint::closest_common_ancestor;
pub use registry::{erase_generic_args, ClassTranslation, TypeMapping, TypeRegistry};
