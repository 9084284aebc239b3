use std::cell::RefCell;
use std::hash::BuildHasherDefault;

use crossbridge_object::source::{builtin_type, HintForm, SourceKind};
use crossbridge_object::target::TargetType;
use crossbridge_object::{BuiltinKind, ObjectId, SourceValue};
use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHasher;

use crate::adapter::TypeAdapter;
use crate::error::{RegistryError, RegistryResult, TranslationError};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// What a source class maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMapping {
    Mapped(TargetType),
    /// Registered as having no target counterpart; values of the class
    /// cross as opaque references.
    Untranslatable,
}

impl TypeMapping {
    pub fn target_type(&self) -> Option<&TargetType> {
        match self {
            TypeMapping::Mapped(ty) => Some(ty),
            TypeMapping::Untranslatable => None,
        }
    }
}

/// The class translator seen from the registry.
///
/// `prepare` returns a placeholder descriptor that is registered before the
/// bases are resolved, so self-referencing hierarchies terminate.
/// `translate` completes it once the resolved bases are known.
pub trait ClassTranslation {
    /// False for classes that must stay opaque (native or banned origin).
    fn is_translatable(&self, class: &SourceValue) -> bool {
        let _ = class;
        true
    }

    fn prepare(&self, class: &SourceValue) -> TargetType;

    fn translate(
        &self,
        class: &SourceValue,
        prepared: &TargetType,
        bases: Vec<TargetType>,
    ) -> Result<TargetType, TranslationError>;
}

struct Entry {
    class: SourceValue,
    mapping: TypeMapping,
}

/// Source class to target type descriptor, seeded with the builtins on
/// first use.
#[derive(Default)]
pub struct TypeRegistry {
    entries: RefCell<FxIndexMap<ObjectId, Entry>>,
    adapters: RefCell<Vec<TypeAdapter>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the builtin mappings unless the registry already holds entries.
    pub fn ensure_initialized(&self) {
        if !self.entries.borrow().is_empty() {
            return;
        }
        let mut entries = self.entries.borrow_mut();
        for kind in BuiltinKind::ALL {
            let class = builtin_type(*kind);
            entries.insert(class.id(), Entry { class, mapping: TypeMapping::Mapped(TargetType::builtin(*kind)) });
        }
        debug!("seeded type registry with {} builtin types", entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Maps `class` to `ty`, replacing any earlier mapping.
    pub fn register(&self, class: &SourceValue, ty: TargetType) {
        self.ensure_initialized();
        self.insert(class, TypeMapping::Mapped(ty));
    }

    pub fn register_untranslatable(&self, class: &SourceValue) {
        self.ensure_initialized();
        self.insert(class, TypeMapping::Untranslatable);
    }

    pub fn unregister(&self, class: &SourceValue) -> Option<TypeMapping> {
        self.entries.borrow_mut().shift_remove(&class.id()).map(|entry| entry.mapping)
    }

    /// Installs a custom adapter and maps its source class to its target type.
    pub fn register_adapter(&self, adapter: TypeAdapter) {
        self.register(adapter.source_type(), adapter.target_type().clone());
        let mut adapters = self.adapters.borrow_mut();
        adapters.retain(|existing| !existing.source_type().is(adapter.source_type()));
        adapters.push(adapter);
    }

    /// The adapter registered for `class` or one of its bases.
    pub fn adapter_for_source(&self, class: &SourceValue) -> Option<TypeAdapter> {
        self.adapters.borrow().iter().find(|adapter| class.is_subclass(adapter.source_type())).cloned()
    }

    pub fn adapter_for_target(&self, ty: &TargetType) -> Option<TypeAdapter> {
        self.adapters.borrow().iter().find(|adapter| ty.is_subtype_of(adapter.target_type())).cloned()
    }

    /// Direct mapping of `class` after erasing generic arguments.
    pub fn lookup(&self, class: &SourceValue) -> Option<TypeMapping> {
        self.ensure_initialized();
        let class = erase_generic_args(class);
        self.entries.borrow().get(&class.id()).map(|entry| entry.mapping.clone())
    }

    /// The source class registered for `ty`, scanning every entry.
    pub fn reverse_lookup(&self, ty: &TargetType) -> Option<SourceValue> {
        self.ensure_initialized();
        self.entries
            .borrow()
            .values()
            .find(|entry| entry.mapping.target_type() == Some(ty))
            .map(|entry| entry.class.clone())
    }

    /// Resolves `class` to its target descriptor, translating it through
    /// `translation` on first sight. Results are memoized.
    ///
    /// A class whose bases cannot all be translated degrades to an opaque
    /// descriptor. A failure of the class translator itself propagates.
    pub fn resolve(&self, class: &SourceValue, translation: &dyn ClassTranslation) -> RegistryResult<TypeMapping> {
        let class = erase_generic_args(class);
        if let Some(mapping) = self.lookup(&class) {
            return Ok(mapping);
        }
        let Some(type_object) = class.as_type() else {
            return Err(RegistryError::NotAType(class.repr()));
        };

        if type_object.is_protocol() || type_object.module() == Some("collections.abc") {
            debug!("{} is structural, mapping it to the base type", type_object.qualname());
            return Ok(self.memoize(&class, TargetType::base()));
        }
        if !translation.is_translatable(&class) {
            debug!("{} cannot be translated, using an opaque type", type_object.qualname());
            return Ok(self.memoize(&class, TargetType::opaque(&class)));
        }

        let prepared = translation.prepare(&class);
        self.insert(&class, TypeMapping::Mapped(prepared.clone()));

        let mut bases = Vec::with_capacity(type_object.bases().len());
        for base in type_object.bases() {
            match self.resolve(base, translation) {
                Ok(TypeMapping::Mapped(ty)) if !ty.is_opaque() => bases.push(ty),
                outcome => {
                    debug!(
                        "base {} of {} did not translate ({:?}), using an opaque type",
                        base.repr(),
                        type_object.qualname(),
                        outcome.err()
                    );
                    return Ok(self.memoize(&class, TargetType::opaque(&class)));
                }
            }
        }

        match translation.translate(&class, &prepared, bases) {
            Ok(ty) => {
                debug!("translated class {} as {:?}", type_object.qualname(), ty);
                Ok(self.memoize(&class, ty))
            }
            Err(error) => {
                self.entries.borrow_mut().shift_remove(&class.id());
                Err(error.into())
            }
        }
    }

    fn memoize(&self, class: &SourceValue, ty: TargetType) -> TypeMapping {
        let mapping = TypeMapping::Mapped(ty);
        self.insert(class, mapping.clone());
        mapping
    }

    fn insert(&self, class: &SourceValue, mapping: TypeMapping) {
        self.entries.borrow_mut().insert(class.id(), Entry { class: class.clone(), mapping });
    }
}

/// `list[int]` becomes `list`; anything else is returned unchanged.
pub fn erase_generic_args(class: &SourceValue) -> SourceValue {
    match class.kind() {
        SourceKind::Hint(HintForm::Generic { origin, .. }) => erase_generic_args(origin),
        _ => class.clone(),
    }
}
