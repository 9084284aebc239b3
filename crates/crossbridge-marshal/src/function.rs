//! Translating functions and exposing translated functions back to the
//! source runtime.

use crossbridge_object::source::{KwArgs, NativeFunction};
use crossbridge_object::target::{TargetException, TargetKwArgs, TargetType};
use crossbridge_object::{BuiltinKind, SourceValue, TargetKind, TargetValue};
use log::{debug, warn};

use crate::context::{BridgeContext, FunctionKey, TranslatedFunction};
use crate::error::{BridgeError, BridgeResult};
use crate::identity::{CloneMap, IdentityMap};

impl BridgeContext {
    /// Translates `function` against `interface` specialized with
    /// `type_args`.
    ///
    /// Results are memoized per function, interface and type arguments. The
    /// cache keeps all three alive so their identities cannot be reused.
    pub fn translate_function(
        &self,
        function: &SourceValue,
        interface: &TargetType,
        type_args: &[TargetType],
    ) -> BridgeResult<TargetValue> {
        let key: FunctionKey = (function.id(), interface.id(), type_args.iter().map(TargetType::id).collect());
        if let Some(entry) = self.functions.borrow().get(&key) {
            debug!(
                "reusing the {} translation of {} ({} type arguments)",
                entry.interface.name(),
                entry.function.repr(),
                entry.type_args.len()
            );
            return Ok(entry.translated.clone());
        }

        let descriptor = self.extract(function, None)?;
        let qualified_name = format!("{}.{}", descriptor.module, descriptor.qualified_name);
        match self.bytecode.translate_function(descriptor, interface, type_args) {
            Ok(translated) => {
                debug!("translated {} against {}", qualified_name, interface.name());
                self.functions.borrow_mut().insert(
                    key,
                    TranslatedFunction {
                        function: function.clone(),
                        interface: interface.clone(),
                        type_args: type_args.to_vec(),
                        translated: translated.clone(),
                    },
                );
                Ok(translated)
            }
            Err(error) => {
                warn!("could not translate {}: {}", qualified_name, error);
                Err(error.into())
            }
        }
    }

    /// A source callable that runs the translated form of `function`.
    ///
    /// Arguments are marshaled outward through one identity map per call, the
    /// result inward through a fresh clone map, and thrown target exceptions
    /// come back raised.
    pub fn as_untyped(&self, function: &SourceValue) -> BridgeResult<SourceValue> {
        let Some(source) = function.as_function() else {
            return Err(BridgeError::NotExtractable(function.repr()));
        };
        let translated = self.translate_function(function, &TargetType::builtin(BuiltinKind::Function), &[])?;

        let bridge = self.weak();
        let untyped = NativeFunction::new(source.name(), move |args: &[SourceValue], kwargs: &KwArgs| {
            let bridge = bridge.upgrade().ok_or_else(|| {
                SourceValue::new_exception(BuiltinKind::SystemError, "the bridge behind this function no longer exists")
            })?;

            let identity = IdentityMap::new();
            let target_args = args
                .iter()
                .map(|arg| bridge.to_target_with(arg, &identity))
                .collect::<BridgeResult<Vec<_>>>()
                .map_err(BridgeError::into_source_exception)?;
            let mut target_kwargs = TargetKwArgs::new();
            for (name, value) in kwargs {
                let value = bridge.to_target_with(value, &identity).map_err(BridgeError::into_source_exception)?;
                target_kwargs.insert(name.clone(), value);
            }

            let clones = CloneMap::new();
            match call_target(&translated, &target_args, &target_kwargs) {
                Ok(result) => bridge.to_source_with(&result, &clones, None).map_err(BridgeError::into_source_exception),
                Err(thrown) => Err(bridge.thrown_to_source(&thrown, &clones)),
            }
        });

        let untyped = match source.module() {
            Some(module) => untyped.with_module(module),
            None => untyped,
        };
        Ok(SourceValue::from(untyped))
    }
}

/// Calls a translated function, looking through a resolved wrapper.
pub(crate) fn call_target(
    callable: &TargetValue,
    args: &[TargetValue],
    kwargs: &TargetKwArgs,
) -> Result<TargetValue, TargetValue> {
    match callable.kind() {
        TargetKind::Function(function) => function.call(args, kwargs),
        TargetKind::FunctionWrapper(slot) => {
            let inner = slot.borrow().clone();
            match inner {
                Some(inner) => call_target(&inner, args, kwargs),
                None => Err(not_callable("function wrapper that was never resolved")),
            }
        }
        _ => Err(not_callable(&format!("'{}' object", callable.type_name()))),
    }
}

fn not_callable(what: &str) -> TargetValue {
    TargetValue::exception(TargetException::builtin(BuiltinKind::TypeError, &format!("{what} is not callable")))
}
