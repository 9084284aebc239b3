use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossbridge_object::source::ModuleObject;
use crossbridge_object::target::TargetType;
use crossbridge_object::{ObjectId, SourceValue, TargetValue};
use crossbridge_types::TypeRegistry;
use indexmap::IndexMap;
use log::debug;
use once_cell::unsync::OnceCell;
use rustc_hash::FxHashMap;

use crate::collaborator::{BytecodeTranslator, ClassTranslator, NoTranslator};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::identity::IdentityMap;
use crate::namespace::NamespaceEntry;

/// Shared handle to a bridge. Values handed to the source runtime (iterator
/// adapters, untyped function wrappers) hold a weak reference back to it.
pub type Bridge = Rc<BridgeContext>;

/// Function identity, interface identity and type-argument identities.
pub(crate) type FunctionKey = (ObjectId, ObjectId, Vec<ObjectId>);

/// A memoized translation. Holds every object its key names so that no
/// identity in the key can be reused while the entry lives.
pub(crate) struct TranslatedFunction {
    pub(crate) function: SourceValue,
    pub(crate) interface: TargetType,
    pub(crate) type_args: Vec<TargetType>,
    pub(crate) translated: TargetValue,
}

/// All long-lived state of one bridge: the type registry, the namespace
/// cache, the module table, memoized translations and the collaborators.
///
/// Nothing here is global. Each context is independent, which keeps tests
/// isolated from one another.
pub struct BridgeContext {
    pub(crate) config: BridgeConfig,
    pub(crate) registry: TypeRegistry,
    pub(crate) namespaces: RefCell<FxHashMap<ObjectId, NamespaceEntry>>,
    pub(crate) modules: RefCell<IndexMap<String, SourceValue>>,
    pub(crate) functions: RefCell<FxHashMap<FunctionKey, TranslatedFunction>>,
    /// Identity map shared by every extraction.
    pub(crate) shared_identity: IdentityMap,
    pub(crate) bytecode: Rc<dyn BytecodeTranslator>,
    pub(crate) classes: Rc<dyn ClassTranslator>,
    version_check: OnceCell<Result<(), BridgeError>>,
    this: Weak<BridgeContext>,
}

impl BridgeContext {
    /// A bridge without translators: functions, code bodies and user
    /// classes cross as opaque references.
    pub fn new(config: BridgeConfig) -> Bridge {
        Self::with_translators(config, Rc::new(NoTranslator), Rc::new(NoTranslator))
    }

    pub fn with_translators(
        config: BridgeConfig,
        bytecode: Rc<dyn BytecodeTranslator>,
        classes: Rc<dyn ClassTranslator>,
    ) -> Bridge {
        Rc::new_cyclic(|this| BridgeContext {
            config,
            registry: TypeRegistry::new(),
            namespaces: RefCell::new(FxHashMap::default()),
            modules: RefCell::new(IndexMap::new()),
            functions: RefCell::new(FxHashMap::default()),
            shared_identity: IdentityMap::new(),
            bytecode,
            classes,
            version_check: OnceCell::new(),
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn weak(&self) -> Weak<BridgeContext> {
        self.this.clone()
    }

    /// Makes a loaded module known to the bridge and returns its value.
    ///
    /// Functions and classes whose module is not registered are treated as
    /// native code.
    pub fn register_module(&self, module: ModuleObject) -> SourceValue {
        let name = module.name().to_string();
        let value = SourceValue::module(module);
        debug!("registered module {name}");
        self.modules.borrow_mut().insert(name, value.clone());
        value
    }

    pub fn module(&self, name: &str) -> Option<SourceValue> {
        self.modules.borrow().get(name).cloned()
    }

    /// True when `value` was defined by native code rather than bytecode.
    pub fn is_native(&self, value: &SourceValue) -> bool {
        if let Some(ty) = value.as_type() {
            if ty.is_native() && ty.builtin_kind().is_none() {
                return true;
            }
        }
        let module = value.module_name().unwrap_or_default();
        if matches!(module.as_str(), "" | "__main__" | "builtins") {
            return false;
        }
        match self.module(&module) {
            Some(module) => module.as_module().map_or(true, ModuleObject::is_native),
            None => true,
        }
    }

    /// Checks the configured engine version against the supported window.
    /// Runs once per bridge.
    pub fn check_runtime_version(&self) -> BridgeResult<()> {
        self.version_check
            .get_or_init(|| {
                let outcome = self.config.supported_versions.check(&self.config.runtime_version);
                debug!(
                    "runtime {} checked against {}: {}",
                    self.config.runtime_version,
                    self.config.supported_versions,
                    if outcome.is_ok() { "supported" } else { "unsupported" }
                );
                outcome.map_err(BridgeError::from)
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use crossbridge_bytecode::RuntimeVersion;
    use crossbridge_object::source::ClassBuilder;

    use super::*;

    #[test]
    fn unregistered_modules_count_as_native() {
        let bridge = BridgeContext::new(BridgeConfig::default());
        let local = ClassBuilder::new("Point").module("geometry").build();
        assert!(bridge.is_native(&local));

        bridge.register_module(ModuleObject::new("geometry"));
        assert!(!bridge.is_native(&local));

        bridge.register_module(ModuleObject::new("_speedups").native());
        assert!(bridge.is_native(&ClassBuilder::new("Fast").module("_speedups").build()));
        assert!(!bridge.is_native(&ClassBuilder::new("Script").module("__main__").build()));
    }

    #[test]
    fn version_check_is_memoized() {
        let config = BridgeConfig { runtime_version: RuntimeVersion::new(3, 9, 0), ..BridgeConfig::default() };
        let bridge = BridgeContext::new(config);

        let first = bridge.check_runtime_version();
        assert!(matches!(first, Err(BridgeError::UnsupportedRuntimeVersion { .. })));
        assert_eq!(bridge.check_runtime_version(), first);
    }
}
