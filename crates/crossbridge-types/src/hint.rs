//! Resolving type hints into target hints.

use std::collections::VecDeque;

use crossbridge_object::source::{builtin_type, mro, HintForm, SourceKind};
use crossbridge_object::target::{TargetType, TypeHint};
use crossbridge_object::{BuiltinKind, SourceValue};
use rustc_hash::FxHashMap;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::{erase_generic_args, ClassTranslation, TypeMapping, TypeRegistry};

impl TypeRegistry {
    /// Resolves an annotation to a target hint.
    ///
    /// Unions carry the closest common ancestor of every member and of the
    /// members other than `None`; parameterized containers resolve origin
    /// and arguments; anything unresolvable is "any".
    pub fn hint(&self, hint: &SourceValue, translation: &dyn ClassTranslation) -> RegistryResult<TypeHint> {
        match hint.kind() {
            SourceKind::None => Ok(TypeHint::of(TargetType::builtin(BuiltinKind::NoneType))),
            SourceKind::Type(_) => self.class_hint(hint, translation),
            SourceKind::Hint(HintForm::Any | HintForm::ForwardRef(_)) => Ok(TypeHint::any()),
            SourceKind::Hint(HintForm::ClassVar(inner) | HintForm::Annotated { inner, .. }) => {
                self.hint(inner, translation)
            }
            SourceKind::Hint(HintForm::Generic { origin, args }) => {
                let origin = self.class_hint(&erase_generic_args(origin), translation)?;
                let args = args.iter().map(|arg| self.hint(arg, translation)).collect::<RegistryResult<Vec<_>>>()?;
                Ok(TypeHint::generic(origin.ty().clone(), args))
            }
            SourceKind::Hint(HintForm::Union(members)) => {
                let none_type = builtin_type(BuiltinKind::NoneType);
                let including: Vec<SourceValue> = members.iter().map(member_class).collect();
                let excluding: Vec<SourceValue> =
                    including.iter().filter(|member| !member.is(&none_type)).cloned().collect();
                let including = self.class_hint(&closest_common_ancestor(&including), translation)?;
                let excluding = self.class_hint(&closest_common_ancestor(&excluding), translation)?;
                Ok(TypeHint::union(including.ty().clone(), excluding.ty().clone()))
            }
            _ => Ok(TypeHint::any()),
        }
    }

    fn class_hint(&self, class: &SourceValue, translation: &dyn ClassTranslation) -> RegistryResult<TypeHint> {
        match self.resolve(class, translation) {
            Ok(TypeMapping::Mapped(ty)) => Ok(TypeHint::of(ty)),
            Ok(TypeMapping::Untranslatable) | Err(RegistryError::NotAType(_)) => Ok(TypeHint::any()),
            Err(error) => Err(error),
        }
    }
}

fn member_class(member: &SourceValue) -> SourceValue {
    match member.kind() {
        SourceKind::None => builtin_type(BuiltinKind::NoneType),
        SourceKind::Type(_) => member.clone(),
        SourceKind::Hint(HintForm::Generic { .. }) => erase_generic_args(member),
        _ => builtin_type(BuiltinKind::Object),
    }
}

/// The first class that appears in the MRO of every class in `classes`,
/// walking the MROs in lockstep. `object` when there is none.
pub fn closest_common_ancestor(classes: &[SourceValue]) -> SourceValue {
    let mut lineages: Vec<VecDeque<SourceValue>> = classes.iter().map(|class| mro(class).into()).collect();
    let mut seen: FxHashMap<_, usize> = FxHashMap::default();
    while !lineages.is_empty() {
        for lineage in lineages.iter_mut() {
            let Some(current) = lineage.pop_front() else {
                continue;
            };
            let count = seen.entry(current.id()).or_insert(0);
            *count += 1;
            if *count == classes.len() {
                return current;
            }
        }
        lineages.retain(|lineage| !lineage.is_empty());
    }
    builtin_type(BuiltinKind::Object)
}
