//! Target to source marshaling.

use crossbridge_object::source::builtin_type;
use crossbridge_object::target::{TargetFunction, TargetType};
use crossbridge_object::{BuiltinKind, SourceValue, TargetKind, TargetValue};
use log::{debug, trace};
use num_traits::ToPrimitive;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::identity::CloneMap;
use crate::iter::ForeignIterator;
use crate::outward::copy_via_hex;

impl BridgeContext {
    /// Converts `value` back into the source runtime with a fresh clone map.
    /// Values with no source counterpart are an error.
    pub fn to_source(&self, value: &TargetValue) -> BridgeResult<SourceValue> {
        self.to_source_with(value, &CloneMap::new(), None)
    }

    /// Converts `value`, reusing every reconstruction already recorded in
    /// `clones`. Values with no source counterpart become `default`, or
    /// [`BridgeError::UnconvertibleValue`] when there is none.
    pub fn to_source_with(
        &self,
        value: &TargetValue,
        clones: &CloneMap,
        default: Option<&SourceValue>,
    ) -> BridgeResult<SourceValue> {
        if let Some(known) = clones.get(value) {
            return Ok(known);
        }
        if let Some(adapter) = self.registry.adapter_for_target(&value.target_type()) {
            let converted = adapter.to_source(value);
            clones.insert(value, &converted);
            return Ok(converted);
        }
        trace!("marshaling {} to the source runtime", value.type_name());

        let converted = match value.kind() {
            TargetKind::Opaque(reference) => reference.referent().clone(),
            TargetKind::None => SourceValue::none(),
            TargetKind::NotImplemented => SourceValue::not_implemented(),
            TargetKind::Boolean(b) => SourceValue::bool(*b),
            TargetKind::Integer(i) => SourceValue::int(copy_via_hex(i)),
            TargetKind::Float(f) => SourceValue::float(*f),
            TargetKind::Decimal(text) => SourceValue::decimal(text.clone()),
            TargetKind::Complex { real, imag } => match (as_f64(real), as_f64(imag)) {
                (Some(real), Some(imag)) => SourceValue::complex(real, imag),
                _ => return self.unknown(value, clones, default),
            },
            TargetKind::String(text) => SourceValue::str(text.clone()),
            TargetKind::Bytes(data) => SourceValue::bytes(data.clone()),
            TargetKind::ByteArray(data) => SourceValue::bytearray(data.borrow().clone()),
            TargetKind::Tuple(_) | TargetKind::FrozenSet(_) => {
                let items = value
                    .items()
                    .unwrap_or_default()
                    .iter()
                    .map(|item| self.to_source_with(item, clones, default))
                    .collect::<BridgeResult<Vec<_>>>()?;
                if matches!(value.kind(), TargetKind::Tuple(_)) {
                    SourceValue::tuple(items)
                } else {
                    SourceValue::frozenset(items)
                }
            }
            TargetKind::List(items) => {
                let converted = SourceValue::list(Vec::new());
                clones.insert(value, &converted);
                let items = items.borrow().clone();
                for item in items {
                    let item = self.to_source_with(&item, clones, default)?;
                    if let Some(list) = converted.as_list() {
                        list.borrow_mut().push(item);
                    }
                }
                return Ok(converted);
            }
            TargetKind::Set(items) => {
                let converted = SourceValue::set([]);
                clones.insert(value, &converted);
                let items: Vec<TargetValue> = items.borrow().iter().cloned().collect();
                for item in items {
                    let item = self.to_source_with(&item, clones, default)?;
                    if let Some(set) = converted.as_set() {
                        set.borrow_mut().insert(item);
                    }
                }
                return Ok(converted);
            }
            TargetKind::Dict(entries) => {
                let converted = SourceValue::dict([]);
                clones.insert(value, &converted);
                let entries: Vec<(TargetValue, TargetValue)> =
                    entries.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                for (key, item) in entries {
                    let key = self.to_source_with(&key, clones, default)?;
                    let item = self.to_source_with(&item, clones, default)?;
                    if let Some(dict) = converted.as_dict() {
                        dict.borrow_mut().insert(key, item);
                    }
                }
                return Ok(converted);
            }
            TargetKind::Slice { start, stop, step } => SourceValue::slice(
                self.to_source_with(start, clones, default)?,
                self.to_source_with(stop, clones, default)?,
                self.to_source_with(step, clones, default)?,
            ),
            TargetKind::Range { start, stop, step } => SourceValue::range(
                self.to_source_with(start, clones, default)?,
                self.to_source_with(stop, clones, default)?,
                self.to_source_with(step, clones, default)?,
            ),
            TargetKind::Date(date) => SourceValue::date(*date),
            TargetKind::Time(time) => SourceValue::time(*time),
            TargetKind::DateTime(datetime) => SourceValue::datetime(*datetime),
            TargetKind::TimeDelta(delta) => SourceValue::timedelta(*delta),
            TargetKind::Type(ty) => self.type_to_source(ty)?,
            TargetKind::Module(module) => module.reference().referent().clone(),
            TargetKind::Cell(contents) => {
                let converted = SourceValue::cell(None);
                clones.insert(value, &converted);
                let contents = contents.borrow().clone();
                let contents = self.to_source_with(&contents, clones, default)?;
                if let Some(cell) = converted.as_cell() {
                    *cell.borrow_mut() = Some(contents);
                }
                return Ok(converted);
            }
            TargetKind::Instance(_) => return self.instance_to_source(value, clones, default),
            TargetKind::Function(function) => match self.function_to_source(function) {
                Some(source) => source,
                None => return self.unknown(value, clones, default),
            },
            TargetKind::FunctionWrapper(slot) => {
                let wrapped = slot.borrow().clone();
                match wrapped {
                    Some(function) => return self.to_source_with(&function, clones, default),
                    None => return self.unknown(value, clones, default),
                }
            }
            TargetKind::Code(code) => match code.reference() {
                Some(reference) => reference.referent().clone(),
                None => return self.unknown(value, clones, default),
            },
            TargetKind::Exception(exception) => {
                return self.exception_to_source_with(value, exception, clones, default);
            }
            TargetKind::Namespace(globals) => self.find_source_namespace(globals)?,
            TargetKind::Iterator(_) => {
                SourceValue::iterator(ForeignIterator::new(self.weak(), value.clone(), clones.clone(), default.cloned()))
            }
            TargetKind::Native(_) => SourceValue::foreign(value.clone()),
        };
        clones.insert(value, &converted);
        Ok(converted)
    }

    fn type_to_source(&self, ty: &TargetType) -> BridgeResult<SourceValue> {
        if ty.is_generic() {
            return Ok(builtin_type(BuiltinKind::Type));
        }
        if let Some(class) = self.registry.reverse_lookup(ty) {
            return Ok(class);
        }
        if ty.is_opaque() {
            if let Some(class) = ty.origin() {
                return Ok(class.clone());
            }
        }
        Err(BridgeError::UnresolvedType(ty.name().to_string()))
    }

    /// Instances made from a source object return that object with the
    /// target-side attributes written back; instances created on the target
    /// side become fresh instances of the class they were translated from.
    fn instance_to_source(
        &self,
        value: &TargetValue,
        clones: &CloneMap,
        default: Option<&SourceValue>,
    ) -> BridgeResult<SourceValue> {
        let Some(instance) = value.as_instance() else {
            return self.unknown(value, clones, default);
        };
        let converted = match (instance.backing(), instance.ty().origin()) {
            (Some(backing), _) => backing.referent().clone(),
            (None, Some(class)) if class.as_type().is_some() => SourceValue::instance(class),
            _ => return self.unknown(value, clones, default),
        };
        clones.insert(value, &converted);
        for (name, attribute) in instance.attributes() {
            let attribute = self.to_source_with(&attribute, clones, default)?;
            if let Err(error) = converted.set_attr(&name, attribute) {
                debug!("could not write {} back onto {}: {}", name, converted.type_name(), error);
            }
        }
        Ok(converted)
    }

    /// Looks a translated function up by the module and name encoded in its
    /// generated class name.
    fn function_to_source(&self, function: &TargetFunction) -> Option<SourceValue> {
        let class_name = function.class_name();
        let qualified = class_name.strip_prefix(self.config.user_package_base.as_str()).unwrap_or(class_name);
        let (module, name) = qualified.rsplit_once('.')?;
        self.module(module)?.get_attr(name)
    }

    fn unknown(
        &self,
        value: &TargetValue,
        clones: &CloneMap,
        default: Option<&SourceValue>,
    ) -> BridgeResult<SourceValue> {
        match default {
            Some(default) => {
                clones.insert(value, default);
                Ok(default.clone())
            }
            None => Err(BridgeError::UnconvertibleValue(value.type_name())),
        }
    }
}

fn as_f64(value: &TargetValue) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().and_then(|i| i.to_f64()))
}
