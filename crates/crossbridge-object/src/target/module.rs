use std::cell::RefCell;

use indexmap::IndexMap;

use super::host::{OpaqueRef, SourceHost};
use super::value::TargetValue;

/// A source module seen from the target runtime. Attributes are fetched
/// through the host on first access and cached.
pub struct TargetModule {
    name: String,
    reference: OpaqueRef,
    attributes: RefCell<IndexMap<String, TargetValue>>,
}

impl TargetModule {
    pub fn new(name: impl Into<String>, reference: OpaqueRef) -> Self {
        TargetModule { name: name.into(), reference, attributes: RefCell::new(IndexMap::new()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &OpaqueRef {
        &self.reference
    }

    /// Names fetched so far.
    pub fn loaded_names(&self) -> Vec<String> {
        self.attributes.borrow().keys().cloned().collect()
    }

    pub fn get_attribute(&self, name: &str, host: &dyn SourceHost) -> Result<Option<TargetValue>, TargetValue> {
        let cached = self.attributes.borrow().get(name).cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        let fetched = host.get_attribute(&self.reference, name)?;
        if let Some(value) = &fetched {
            self.attributes.borrow_mut().insert(name.to_string(), value.clone());
        }
        Ok(fetched)
    }

    pub fn set_attribute(&self, name: &str, value: TargetValue, host: &dyn SourceHost) -> Result<(), TargetValue> {
        host.set_attribute(&self.reference, name, &value)?;
        self.attributes.borrow_mut().insert(name.to_string(), value);
        Ok(())
    }
}
