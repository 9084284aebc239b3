//! Structural descriptors of classes handed to the class translator.

use crossbridge_bytecode::CompiledFunctionDescriptor;
use crossbridge_object::source::{mro, MethodKind};
use crossbridge_object::target::{OpaqueRef, TargetType, TypeHint};
use crossbridge_object::{SourceValue, TargetValue};
use crossbridge_types::{ClassTranslation, TranslationError};
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::identity::IdentityMap;

/// Everything the class translator needs to build a target type.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub name: String,
    pub qualified_name: String,
    pub module: String,
    pub module_file_path: String,
    /// Resolved target types of the direct bases, in declaration order.
    pub superclasses: Vec<TargetType>,
    pub instance_methods: IndexMap<String, CompiledFunctionDescriptor>,
    pub static_methods: IndexMap<String, CompiledFunctionDescriptor>,
    pub class_methods: IndexMap<String, CompiledFunctionDescriptor>,
    pub static_attributes: IndexMap<String, TargetValue>,
    /// Class attributes holding instances of the class itself. They cannot
    /// be bridged before the class exists.
    pub self_instances: IndexMap<String, OpaqueRef>,
    /// Attributes that behave as descriptors, plus `__class__` and `__module__`.
    pub descriptor_names: IndexSet<String>,
    pub type_annotations: IndexMap<String, TypeHint>,
    /// The source class itself.
    pub binary_type: OpaqueRef,
}

impl BridgeContext {
    /// Describes `class`, extracting every method and bridging every class
    /// attribute defined directly on it.
    pub fn class_descriptor(&self, class: &SourceValue, superclasses: Vec<TargetType>) -> BridgeResult<ClassDescriptor> {
        let Some(ty) = class.as_type() else {
            return Err(BridgeError::UnresolvedType(class.repr()));
        };
        let module = ty.module().map(str::to_string);

        let mut descriptor = ClassDescriptor {
            name: ty.name().to_string(),
            qualified_name: ty.qualname().to_string(),
            module: module.clone().unwrap_or_else(|| "<unknown>".to_string()),
            module_file_path: self.module_file_path(module.as_deref()),
            superclasses,
            instance_methods: IndexMap::new(),
            static_methods: IndexMap::new(),
            class_methods: IndexMap::new(),
            static_attributes: IndexMap::new(),
            self_instances: IndexMap::new(),
            descriptor_names: ["__class__", "__module__"].iter().map(|name| name.to_string()).collect(),
            type_annotations: self.resolve_annotations(&ty.annotations(), &IndexMap::new(), None, None)?,
            binary_type: OpaqueRef::new(class.clone()),
        };

        let identity = IdentityMap::new();
        for (name, attribute) in ty.attributes() {
            if let Some(function) = attribute.as_function() {
                let extracted = self.extract(&attribute, Some(class))?;
                let methods = match function.method_kind() {
                    MethodKind::Static => &mut descriptor.static_methods,
                    MethodKind::Class => &mut descriptor.class_methods,
                    MethodKind::Virtual => &mut descriptor.instance_methods,
                };
                methods.insert(name, extracted);
            } else if attribute.is_instance(class) {
                descriptor.self_instances.insert(name, OpaqueRef::new(attribute));
            } else {
                let bridged = self.to_target_with(&attribute, &identity)?;
                descriptor.static_attributes.insert(name, bridged);
            }
        }

        for ancestor in mro(class).iter().filter_map(|ancestor| ancestor.as_type()) {
            for (name, attribute) in ancestor.attributes() {
                if attribute.as_function().is_none() && is_descriptor(&attribute) {
                    descriptor.descriptor_names.insert(name);
                }
            }
        }

        debug!(
            "described class {}: {} instance, {} static, {} class methods, {} attributes",
            descriptor.qualified_name,
            descriptor.instance_methods.len(),
            descriptor.static_methods.len(),
            descriptor.class_methods.len(),
            descriptor.static_attributes.len()
        );
        Ok(descriptor)
    }
}

fn is_descriptor(attribute: &SourceValue) -> bool {
    let has_protocol = |value: &SourceValue| value.get_attr("__get__").is_some() || value.get_attr("__set__").is_some();
    has_protocol(attribute) || has_protocol(&attribute.type_of())
}

impl ClassTranslation for BridgeContext {
    fn is_translatable(&self, class: &SourceValue) -> bool {
        let banned = class.module_name().is_some_and(|module| self.config.is_banned_module(&module));
        !banned && !self.is_native(class)
    }

    fn prepare(&self, class: &SourceValue) -> TargetType {
        self.classes.prepare_class(class)
    }

    fn translate(
        &self,
        class: &SourceValue,
        prepared: &TargetType,
        bases: Vec<TargetType>,
    ) -> Result<TargetType, TranslationError> {
        let descriptor = self.class_descriptor(class, bases).map_err(|error| match error {
            BridgeError::TranslationFailure(error) => error,
            other => TranslationError::new(class.repr(), other.to_string()),
        })?;
        self.classes.translate_class(descriptor, prepared)
    }
}
