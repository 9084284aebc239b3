use std::cell::RefCell;
use std::rc::Rc;

use crossbridge_object::{ObjectId, SourceValue, TargetValue};
use rustc_hash::FxHashMap;

/// Source identity to the target value made for it.
///
/// Entries keep both sides alive, so an identity can never be reused by a
/// new allocation while the map exists. Clones share the same table.
#[derive(Clone, Default)]
pub struct IdentityMap {
    entries: Rc<RefCell<FxHashMap<ObjectId, (SourceValue, TargetValue)>>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &SourceValue) -> Option<TargetValue> {
        self.entries.borrow().get(&source.id()).map(|(_, target)| target.clone())
    }

    /// Records `target` as the counterpart of `source`, replacing a
    /// placeholder registered earlier.
    pub fn insert(&self, source: &SourceValue, target: &TargetValue) {
        self.entries.borrow_mut().insert(source.id(), (source.clone(), target.clone()));
    }

    pub fn contains(&self, source: &SourceValue) -> bool {
        self.entries.borrow().contains_key(&source.id())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Target identity to the source value reconstructed for it.
///
/// Target handles hash by address, so one table is enough.
#[derive(Clone, Default)]
pub struct CloneMap {
    entries: Rc<RefCell<FxHashMap<ObjectId, (TargetValue, SourceValue)>>>,
}

impl CloneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &TargetValue) -> Option<SourceValue> {
        self.entries.borrow().get(&target.id()).map(|(_, source)| source.clone())
    }

    pub fn insert(&self, target: &TargetValue, source: &SourceValue) {
        self.entries.borrow_mut().insert(target.id(), (target.clone(), source.clone()));
    }

    pub fn contains(&self, target: &TargetValue) -> bool {
        self.entries.borrow().contains_key(&target.id())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
