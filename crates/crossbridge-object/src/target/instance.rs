use std::cell::RefCell;

use indexmap::IndexMap;

use super::host::OpaqueRef;
use super::types::TargetType;
use super::value::TargetValue;

/// An instance of a translated class.
///
/// Instances bridged from the source runtime remember the object they were
/// made from (`backing`), so that bridging back returns that same object.
pub struct TargetInstance {
    ty: TargetType,
    attributes: RefCell<IndexMap<String, TargetValue>>,
    backing: RefCell<Option<OpaqueRef>>,
}

impl TargetInstance {
    pub fn new(ty: TargetType) -> Self {
        TargetInstance { ty, attributes: RefCell::new(IndexMap::new()), backing: RefCell::new(None) }
    }

    pub fn ty(&self) -> &TargetType {
        &self.ty
    }

    pub fn get_attribute(&self, name: &str) -> Option<TargetValue> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn set_attribute(&self, name: &str, value: TargetValue) {
        self.attributes.borrow_mut().insert(name.to_string(), value);
    }

    pub fn attributes(&self) -> Vec<(String, TargetValue)> {
        self.attributes.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn backing(&self) -> Option<OpaqueRef> {
        self.backing.borrow().clone()
    }

    pub fn set_backing(&self, reference: OpaqueRef) {
        *self.backing.borrow_mut() = Some(reference);
    }
}
