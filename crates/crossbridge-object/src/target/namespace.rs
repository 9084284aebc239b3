use std::cell::RefCell;

use indexmap::IndexMap;

use super::host::SourceHost;
use super::value::TargetValue;
use crate::ObjectId;

/// The target side of a module's globals. Filled name by name as translated
/// code references them; `source_key` is the identity of the source dictionary.
pub struct GlobalsMap {
    source_key: ObjectId,
    entries: RefCell<IndexMap<String, TargetValue>>,
}

impl GlobalsMap {
    pub fn new(source_key: ObjectId) -> Self {
        GlobalsMap { source_key, entries: RefCell::new(IndexMap::new()) }
    }

    pub fn source_key(&self) -> ObjectId {
        self.source_key
    }

    pub fn get(&self, name: &str) -> Option<TargetValue> {
        self.entries.borrow().get(name).cloned()
    }

    pub fn insert(&self, name: &str, value: TargetValue) {
        self.entries.borrow_mut().insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Looks a global up, asking the host for names not copied yet.
    pub fn lookup(&self, name: &str, host: &dyn SourceHost) -> Result<Option<TargetValue>, TargetValue> {
        if let Some(value) = self.get(name) {
            return Ok(Some(value));
        }
        host.load_global(self, name)
    }
}
