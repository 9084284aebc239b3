mod common;

use common::{class, subclass, RecordingTranslator};
use crossbridge_object::source::{ClassBuilder, HintForm};
use crossbridge_object::target::{TargetType, TypeHint};
use crossbridge_object::{BuiltinKind, SourceValue, TargetValue};
use crossbridge_types::{closest_common_ancestor, RegistryError, TypeAdapter, TypeMapping, TypeRegistry};
use pretty_assertions::assert_eq;

fn mapped(mapping: TypeMapping) -> TargetType {
    match mapping {
        TypeMapping::Mapped(ty) => ty,
        TypeMapping::Untranslatable => panic!("expected a mapped type"),
    }
}

// --- Seeding and lookup ---

#[test]
fn test_builtins_are_seeded_lazily() {
    let registry = TypeRegistry::new();
    assert!(registry.is_empty());

    let int_class = SourceValue::builtin_type(BuiltinKind::Int);
    assert_eq!(registry.lookup(&int_class), Some(TypeMapping::Mapped(TargetType::builtin(BuiltinKind::Int))));
    assert_eq!(registry.len(), BuiltinKind::ALL.len());

    let str_class = registry.reverse_lookup(&TargetType::builtin(BuiltinKind::Str)).unwrap();
    assert!(str_class.is(&SourceValue::builtin_type(BuiltinKind::Str)));
}

#[test]
fn test_reverse_lookup_misses_unknown_types() {
    let registry = TypeRegistry::new();
    let stray = TargetType::translated("Stray", None, "user.Stray", None);
    assert!(registry.reverse_lookup(&stray).is_none());
}

// --- Resolution ---

#[test]
fn test_resolution_is_memoized() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    let point = class("Point");

    let first = mapped(registry.resolve(&point, &translator)?);
    let second = mapped(registry.resolve(&point, &translator)?);

    assert_eq!(first, second);
    assert_eq!(translator.translation_count(), 1);
    assert_eq!(translator.prepared.get(), 1);
    Ok(())
}

#[test]
fn test_bases_resolve_before_the_class() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    let shape = class("Shape");
    let circle = subclass("Circle", &shape);

    let circle_type = mapped(registry.resolve(&circle, &translator)?);
    let shape_type = mapped(registry.lookup(&shape).unwrap());

    assert_eq!(*translator.translated.borrow(), vec!["Shape".to_string(), "Circle".to_string()]);
    assert!(circle_type.is_subtype_of(&shape_type));
    assert!(circle_type.is_subtype_of(&TargetType::base()));
    Ok(())
}

#[test]
fn test_untranslatable_base_degrades_to_opaque() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::with_opaque_module("native_ext");
    let handle = ClassBuilder::new("Handle").module("native_ext").build();
    let wrapper = subclass("Wrapper", &handle);

    let wrapper_type = mapped(registry.resolve(&wrapper, &translator)?);
    assert!(wrapper_type.is_opaque());
    assert!(wrapper_type.origin().unwrap().is(&wrapper));
    assert_eq!(translator.translation_count(), 0);

    let again = mapped(registry.resolve(&wrapper, &translator)?);
    assert_eq!(again, wrapper_type);
    Ok(())
}

#[test]
fn test_translator_failure_propagates_and_is_not_cached() {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::rejecting("Broken");
    let broken = class("Broken");

    let error = registry.resolve(&broken, &translator).unwrap_err();
    assert!(matches!(error, RegistryError::Translation(ref e) if e.subject == "Broken"));
    assert_eq!(registry.lookup(&broken), None);

    assert!(registry.resolve(&broken, &translator).is_err());
    assert_eq!(translator.prepared.get(), 2);
}

#[test]
fn test_protocols_map_to_the_base_type() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    let sized = ClassBuilder::new("Sized").module("typing").protocol().build();
    let iterable = ClassBuilder::new("Iterable").module("collections.abc").build();

    assert_eq!(mapped(registry.resolve(&sized, &translator)?), TargetType::base());
    assert_eq!(mapped(registry.resolve(&iterable, &translator)?), TargetType::base());
    assert_eq!(translator.prepared.get(), 0);
    Ok(())
}

#[test]
fn test_generic_arguments_are_erased() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    let list_of_int = SourceValue::hint(HintForm::Generic {
        origin: SourceValue::builtin_type(BuiltinKind::List),
        args: vec![SourceValue::builtin_type(BuiltinKind::Int)],
    });

    assert_eq!(mapped(registry.resolve(&list_of_int, &translator)?), TargetType::builtin(BuiltinKind::List));
    Ok(())
}

#[test]
fn test_non_types_are_rejected() {
    let registry = TypeRegistry::new();
    let error = registry.resolve(&SourceValue::int(3), &RecordingTranslator::default()).unwrap_err();
    assert_eq!(error, RegistryError::NotAType("3".to_string()));
}

#[test]
fn test_later_registrations_win() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    let money = class("Money");
    let decimal = TargetType::builtin(BuiltinKind::Decimal);

    registry.register(&money, TargetType::builtin(BuiltinKind::Float));
    registry.register(&money, decimal.clone());
    assert_eq!(mapped(registry.resolve(&money, &translator)?), decimal);

    registry.register_untranslatable(&money);
    assert_eq!(registry.resolve(&money, &translator)?, TypeMapping::Untranslatable);
    assert!(registry.hint(&money, &translator)?.is_any());
    assert_eq!(translator.prepared.get(), 0);
    Ok(())
}

// --- Hints ---

#[test]
fn test_optional_hint_keeps_both_ancestors() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    let base = class("Base");
    let child = subclass("Child", &base);
    let hint = SourceValue::hint(HintForm::Union(vec![child, base.clone(), SourceValue::none()]));

    let resolved = registry.hint(&hint, &translator)?;
    let base_type = mapped(registry.lookup(&base).unwrap());
    assert_eq!(resolved.ty(), &TargetType::base());
    assert_eq!(resolved.non_null_type(), &base_type);
    Ok(())
}

#[test]
fn test_generic_hint_resolves_arguments() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    let hint = SourceValue::hint(HintForm::Generic {
        origin: SourceValue::builtin_type(BuiltinKind::Dict),
        args: vec![
            SourceValue::builtin_type(BuiltinKind::Str),
            SourceValue::hint(HintForm::Annotated {
                inner: SourceValue::builtin_type(BuiltinKind::Int),
                metadata: vec![SourceValue::str("positive")],
            }),
        ],
    });

    let resolved = registry.hint(&hint, &translator)?;
    assert_eq!(resolved.ty(), &TargetType::builtin(BuiltinKind::Dict));
    assert_eq!(
        resolved.generic_args(),
        &[TypeHint::of(TargetType::builtin(BuiltinKind::Str)), TypeHint::of(TargetType::builtin(BuiltinKind::Int))]
    );
    Ok(())
}

#[test]
fn test_unresolvable_hints_are_any() -> Result<(), RegistryError> {
    let registry = TypeRegistry::new();
    let translator = RecordingTranslator::default();
    assert!(registry.hint(&SourceValue::hint(HintForm::ForwardRef("Later".into())), &translator)?.is_any());
    assert!(registry.hint(&SourceValue::str("Later"), &translator)?.is_any());
    assert!(registry.hint(&SourceValue::hint(HintForm::Any), &translator)?.is_any());
    Ok(())
}

#[test]
fn test_closest_common_ancestor() {
    let bool_class = SourceValue::builtin_type(BuiltinKind::Bool);
    let int_class = SourceValue::builtin_type(BuiltinKind::Int);
    let str_class = SourceValue::builtin_type(BuiltinKind::Str);

    assert!(closest_common_ancestor(&[bool_class.clone(), int_class.clone()]).is(&int_class));
    assert!(closest_common_ancestor(&[bool_class, str_class])
        .is(&SourceValue::builtin_type(BuiltinKind::Object)));
    assert!(closest_common_ancestor(&[]).is(&SourceValue::builtin_type(BuiltinKind::Object)));
}

// --- Adapters ---

#[test]
fn test_adapters_cover_subclasses() {
    let registry = TypeRegistry::new();
    let money = class("Money");
    let euro = subclass("Euro", &money);
    let adapter = TypeAdapter::new(
        money.clone(),
        TargetType::builtin(BuiltinKind::Decimal),
        |value| TargetValue::decimal(value.get_attr("amount").map(|a| a.to_string()).unwrap_or_default()),
        |_| SourceValue::none(),
    );
    registry.register_adapter(adapter);

    let found = registry.adapter_for_source(&euro).expect("adapter for subclass");
    let instance = SourceValue::instance(&euro);
    instance.set_attr("amount", SourceValue::str("1.50")).unwrap();
    assert_eq!(found.to_target(&instance), TargetValue::decimal("1.50"));
    assert!(registry.adapter_for_target(&TargetType::builtin(BuiltinKind::Decimal)).is_some());
    assert_eq!(
        registry.lookup(&money),
        Some(TypeMapping::Mapped(TargetType::builtin(BuiltinKind::Decimal)))
    );
}
