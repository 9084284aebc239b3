//! Lazily copied module globals.

use crossbridge_object::target::GlobalsMap;
use crossbridge_object::{SourceValue, TargetValue};
use log::debug;
use rustc_hash::FxHashSet;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};

/// The target view of one module dictionary.
pub(crate) struct NamespaceEntry {
    source: SourceValue,
    handle: TargetValue,
    copied: FxHashSet<String>,
    copies: usize,
}

impl BridgeContext {
    /// Returns the globals handle of `namespace`, copying every name in
    /// `referenced` that has not been copied yet.
    ///
    /// The handle is created on first sight of the dictionary, with
    /// `__name__` already in it. Names bound to `owner` (a class being
    /// translated), to its subclasses or to its instances are left out.
    pub fn bridge_namespace(
        &self,
        namespace: &SourceValue,
        referenced: &[String],
        owner: Option<&SourceValue>,
    ) -> BridgeResult<TargetValue> {
        let handle = self.namespace_handle(namespace)?;
        for name in referenced {
            let already_copied =
                self.namespaces.borrow().get(&namespace.id()).is_some_and(|entry| entry.copied.contains(name));
            if already_copied {
                continue;
            }
            let Some(value) = namespace.dict_get(name) else {
                continue;
            };
            if let Some(owner) = owner {
                if value.is_subclass(owner) || value.is_instance(owner) {
                    debug!("not copying global {} into the namespace of the class being translated", name);
                    continue;
                }
            }
            self.copy_global(namespace, &handle, name, &value)?;
        }
        Ok(handle)
    }

    fn namespace_handle(&self, namespace: &SourceValue) -> BridgeResult<TargetValue> {
        if let Some(entry) = self.namespaces.borrow().get(&namespace.id()) {
            return Ok(entry.handle.clone());
        }
        if namespace.as_dict().is_none() {
            return Err(BridgeError::UnconvertibleValue(namespace.type_name()));
        }
        let handle = TargetValue::namespace(GlobalsMap::new(namespace.id()));
        self.namespaces.borrow_mut().insert(
            namespace.id(),
            NamespaceEntry { source: namespace.clone(), handle: handle.clone(), copied: FxHashSet::default(), copies: 0 },
        );
        debug!("created globals handle for namespace {}", namespace.id());
        if let Some(module_name) = namespace.dict_get("__name__") {
            self.copy_global(namespace, &handle, "__name__", &module_name)?;
        }
        Ok(handle)
    }

    /// Marks `name` as copied before converting it, so recursive references
    /// to the same global do not copy it twice.
    fn copy_global(&self, namespace: &SourceValue, handle: &TargetValue, name: &str, value: &SourceValue) -> BridgeResult<()> {
        if let Some(entry) = self.namespaces.borrow_mut().get_mut(&namespace.id()) {
            entry.copied.insert(name.to_string());
            entry.copies += 1;
        }
        match self.to_target_with(value, &self.shared_identity) {
            Ok(converted) => {
                if let Some(globals) = handle.as_namespace() {
                    globals.insert(name, converted);
                }
                Ok(())
            }
            Err(error) => {
                if let Some(entry) = self.namespaces.borrow_mut().get_mut(&namespace.id()) {
                    entry.copied.remove(name);
                    entry.copies -= 1;
                }
                Err(error)
            }
        }
    }

    /// The dictionary a globals handle was made from.
    ///
    /// An empty handle that this bridge did not make stands for a fresh, empty
    /// namespace.
    pub fn find_source_namespace(&self, globals: &GlobalsMap) -> BridgeResult<SourceValue> {
        let found = self
            .namespaces
            .borrow()
            .values()
            .find(|entry| entry.handle.as_namespace().is_some_and(|handle| std::ptr::eq(handle, globals)))
            .map(|entry| entry.source.clone());
        match found {
            Some(source) => Ok(source),
            None if globals.is_empty() => Ok(SourceValue::dict([])),
            None => Err(BridgeError::UnknownNamespace(globals.source_key())),
        }
    }

    /// Copies a global that translated code asked for but the handle does
    /// not hold. `Ok(None)` when the module has no such name.
    pub fn fetch_global(&self, globals: &GlobalsMap, name: &str) -> BridgeResult<Option<TargetValue>> {
        if let Some(value) = globals.get(name) {
            return Ok(Some(value));
        }
        let entry = self
            .namespaces
            .borrow()
            .get(&globals.source_key())
            .map(|entry| (entry.source.clone(), entry.handle.clone()));
        let Some((namespace, handle)) = entry else {
            return Err(BridgeError::UnknownNamespace(globals.source_key()));
        };
        let Some(value) = namespace.dict_get(name) else {
            return Ok(None);
        };
        debug!("loading global {} on demand", name);
        self.copy_global(&namespace, &handle, name, &value)?;
        Ok(handle.as_namespace().and_then(|handle| handle.get(name)))
    }

    /// How many bindings have been copied out of `namespace` so far.
    pub fn namespace_copy_count(&self, namespace: &SourceValue) -> usize {
        self.namespaces.borrow().get(&namespace.id()).map_or(0, |entry| entry.copies)
    }

    /// Names copied out of `namespace`, sorted.
    pub fn copied_names(&self, namespace: &SourceValue) -> Vec<String> {
        let mut names: Vec<String> = self
            .namespaces
            .borrow()
            .get(&namespace.id())
            .map(|entry| entry.copied.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}
