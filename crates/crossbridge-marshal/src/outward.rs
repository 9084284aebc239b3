//! Source to target marshaling.

use crossbridge_object::source::HintForm;
use crossbridge_object::target::{
    DescriptorKind, OpaqueRef, TargetCode, TargetException, TargetInstance, TargetModule, TargetType,
};
use crossbridge_object::{BuiltinKind, SourceKind, SourceValue, TargetKind, TargetValue};
use crossbridge_types::TypeMapping;
use log::{debug, trace};
use num_bigint::BigInt;
use num_traits::Num;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::identity::IdentityMap;

impl BridgeContext {
    /// Converts `value` into the target runtime with a fresh identity map.
    pub fn to_target(&self, value: &SourceValue) -> BridgeResult<TargetValue> {
        self.to_target_with(value, &IdentityMap::new())
    }

    /// Converts `value`, reusing every conversion already recorded in
    /// `identity`.
    ///
    /// Containers, cells, functions and instances are recorded before their
    /// children are converted, so cyclic graphs terminate and shared
    /// references stay shared. Values that cannot be translated cross as
    /// opaque references. Failures to translate a class object propagate.
    pub fn to_target_with(&self, value: &SourceValue, identity: &IdentityMap) -> BridgeResult<TargetValue> {
        if let Some(known) = identity.get(value) {
            return Ok(known);
        }
        if let SourceKind::Foreign(target) = value.kind() {
            return Ok(target.clone());
        }
        if let Some(adapter) = self.registry.adapter_for_source(&value.type_of()) {
            let converted = adapter.to_target(value);
            identity.insert(value, &converted);
            return Ok(converted);
        }
        trace!("marshaling {} to the target runtime", value.type_name());

        let converted = match value.kind() {
            SourceKind::None => TargetValue::none(),
            SourceKind::NotImplemented => TargetValue::not_implemented(),
            SourceKind::Bool(b) => TargetValue::boolean(*b),
            SourceKind::Int(i) => TargetValue::integer(copy_via_hex(i)),
            SourceKind::Float(f) => TargetValue::float(*f),
            SourceKind::Decimal(text) => TargetValue::decimal(text.clone()),
            SourceKind::Complex { real, imag } => {
                TargetValue::complex(TargetValue::float(*real), TargetValue::float(*imag))
            }
            SourceKind::Str(text) => TargetValue::string(text.clone()),
            SourceKind::Bytes(data) => bytes_via_int_tuple(data, false)?,
            SourceKind::ByteArray(data) => {
                let data = data.borrow().clone();
                bytes_via_int_tuple(&data, true)?
            }
            SourceKind::Tuple(_) | SourceKind::List(_) | SourceKind::Set(_) | SourceKind::FrozenSet(_) => {
                return self.sequence_to_target(value, identity);
            }
            SourceKind::Dict(entries) => {
                let converted = TargetValue::dict([]);
                identity.insert(value, &converted);
                let entries: Vec<(SourceValue, SourceValue)> =
                    entries.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                for (key, item) in entries {
                    let key = self.to_target_with(&key, identity)?;
                    let item = self.to_target_with(&item, identity)?;
                    converted.dict_insert(key, item);
                }
                return Ok(converted);
            }
            SourceKind::Slice { start, stop, step } => TargetValue::slice(
                self.to_target_with(start, identity)?,
                self.to_target_with(stop, identity)?,
                self.to_target_with(step, identity)?,
            ),
            SourceKind::Range { start, stop, step } => TargetValue::range(
                self.to_target_with(start, identity)?,
                self.to_target_with(stop, identity)?,
                self.to_target_with(step, identity)?,
            ),
            SourceKind::Date(date) => TargetValue::new(TargetKind::Date(*date)),
            SourceKind::Time(time) => TargetValue::new(TargetKind::Time(*time)),
            SourceKind::DateTime(datetime) => TargetValue::new(TargetKind::DateTime(*datetime)),
            SourceKind::TimeDelta(delta) => TargetValue::new(TargetKind::TimeDelta(*delta)),
            SourceKind::Type(_) | SourceKind::Hint(HintForm::Generic { .. }) => match self.registry.resolve(value, self)? {
                TypeMapping::Mapped(ty) => TargetValue::type_(ty),
                TypeMapping::Untranslatable => {
                    debug!("{} is registered as untranslatable", value.repr());
                    opaque(value)
                }
            },
            SourceKind::Module(module) => {
                if self.config.is_banned_module(module.name()) {
                    debug!("module {} is banned, passing it as an opaque reference", module.name());
                    opaque(value)
                } else {
                    TargetValue::module(TargetModule::new(module.name(), OpaqueRef::new(value.clone())))
                }
            }
            SourceKind::Code(code) => match self.extract(value, None).and_then(|descriptor| {
                self.bytecode.translate_code(descriptor).map_err(BridgeError::from)
            }) {
                Ok(translated) => TargetValue::code(translated),
                Err(error) => {
                    debug!("code object {} stays untranslated: {}", code.qualname, error);
                    TargetValue::code(TargetCode::wrapper(OpaqueRef::new(value.clone())))
                }
            },
            SourceKind::Cell(contents) => {
                let converted = TargetValue::cell(TargetValue::none());
                identity.insert(value, &converted);
                if let Some(contents) = contents.borrow().clone() {
                    converted.set_cell(self.to_target_with(&contents, identity)?);
                }
                return Ok(converted);
            }
            SourceKind::Function(_) => return self.function_to_target(value, identity),
            SourceKind::Instance(_) => return self.instance_to_target(value, identity),
            SourceKind::Exception(_) => return self.exception_to_target_with(value, identity),
            _ => {
                debug!("{} has no structural translation, passing it as an opaque reference", value.type_name());
                opaque(value)
            }
        };
        identity.insert(value, &converted);
        Ok(converted)
    }

    fn sequence_to_target(&self, value: &SourceValue, identity: &IdentityMap) -> BridgeResult<TargetValue> {
        let converted = match value.kind() {
            SourceKind::Tuple(_) => TargetValue::tuple(Vec::new()),
            SourceKind::List(_) => TargetValue::list(Vec::new()),
            SourceKind::Set(_) => TargetValue::set([]),
            _ => TargetValue::frozenset([]),
        };
        identity.insert(value, &converted);
        for item in value.items().unwrap_or_default() {
            converted.push_item(self.to_target_with(&item, identity)?);
        }
        Ok(converted)
    }

    fn function_to_target(&self, value: &SourceValue, identity: &IdentityMap) -> BridgeResult<TargetValue> {
        let banned = value.module_name().is_some_and(|module| self.config.is_banned_module(&module));
        if banned || self.is_native(value) {
            debug!("{} is native or banned, passing it as an opaque reference", value.repr());
            let converted = opaque(value);
            identity.insert(value, &converted);
            return Ok(converted);
        }
        // Extraction bridges globals through the shared map; a function that
        // refers to itself must find its wrapper there as well.
        if let Some(known) = self.shared_identity.get(value) {
            identity.insert(value, &known);
            return Ok(known);
        }

        let wrapper = TargetValue::function_wrapper();
        identity.insert(value, &wrapper);
        self.shared_identity.insert(value, &wrapper);

        let interface = TargetType::builtin(BuiltinKind::Function);
        let converted = match self.translate_function(value, &interface, &[]) {
            Ok(translated) => {
                wrapper.resolve_wrapper(translated.clone());
                translated
            }
            Err(error) => {
                debug!("{} stays untranslated: {}", value.repr(), error);
                opaque(value)
            }
        };
        identity.insert(value, &converted);
        self.shared_identity.insert(value, &converted);
        Ok(converted)
    }

    fn instance_to_target(&self, value: &SourceValue, identity: &IdentityMap) -> BridgeResult<TargetValue> {
        let Some(instance) = value.as_instance() else {
            return Ok(opaque(value));
        };
        let ty = match self.registry.resolve(instance.class(), self) {
            Ok(TypeMapping::Mapped(ty)) if matches!(ty.kind(), DescriptorKind::Translated { .. }) => Some(ty),
            Ok(_) => None,
            Err(error) => {
                debug!("class of {} did not translate: {}", value.repr(), error);
                None
            }
        };
        let Some(ty) = ty else {
            let converted = opaque(value);
            identity.insert(value, &converted);
            return Ok(converted);
        };

        let shell = TargetInstance::new(ty);
        shell.set_backing(OpaqueRef::new(value.clone()));
        let converted = TargetValue::instance(shell);
        identity.insert(value, &converted);
        if let Some(shell) = converted.as_instance() {
            for (name, attribute) in instance.attributes() {
                shell.set_attribute(&name, self.to_target_with(&attribute, identity)?);
            }
        }
        Ok(converted)
    }

    /// The exception is recorded before its arguments and cause are
    /// converted, so a cause chain that loops back terminates.
    pub(crate) fn exception_to_target_with(
        &self,
        value: &SourceValue,
        identity: &IdentityMap,
    ) -> BridgeResult<TargetValue> {
        let Some(exception) = value.as_exception() else {
            return Ok(opaque(value));
        };
        let ty = match self.registry.resolve(exception.class(), self) {
            Ok(TypeMapping::Mapped(ty)) => ty,
            outcome => {
                debug!("exception class {} is kept opaque ({:?})", exception.type_name(), outcome.err());
                TargetType::opaque(exception.class())
            }
        };
        // A rebuilt exception renders its whole traceback as its message.
        let message = match exception.trace() {
            Some(trace) => trace.message.clone(),
            None => exception.message(),
        };
        let converted =
            TargetValue::exception(TargetException::new(ty, (!message.is_empty()).then_some(message.as_str())));
        identity.insert(value, &converted);

        let args = exception
            .args()
            .iter()
            .map(|arg| self.to_target_with(arg, identity))
            .collect::<BridgeResult<Vec<_>>>()?;
        let cause = match exception.cause() {
            Some(cause) => Some(self.to_target_with(&cause, identity)?),
            None => None,
        };
        if let Some(shell) = converted.as_exception() {
            shell.set_args(args);
            shell.set_cause(cause);
        }
        Ok(converted)
    }
}

fn opaque(value: &SourceValue) -> TargetValue {
    TargetValue::opaque(OpaqueRef::new(value.clone()))
}

/// Copies an integer through its hexadecimal text, which holds any width.
pub(crate) fn copy_via_hex(value: &BigInt) -> BigInt {
    let hex = value.to_str_radix(16);
    BigInt::from_str_radix(&hex, 16).unwrap_or_else(|_| value.clone())
}

fn bytes_via_int_tuple(data: &[u8], mutable: bool) -> BridgeResult<TargetValue> {
    let ints = TargetValue::tuple(data.iter().map(|byte| TargetValue::integer(*byte)).collect());
    TargetValue::from_int_tuple(&ints, mutable)
        .ok_or_else(|| BridgeError::UnconvertibleValue(if mutable { "bytearray" } else { "bytes" }.to_string()))
}
