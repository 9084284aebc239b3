use std::fmt;

use indexmap::IndexMap;

use super::function::TargetKwArgs;
use super::namespace::GlobalsMap;
use super::value::TargetValue;
use crate::source::SourceValue;
use crate::ObjectId;

/// A handle the target runtime holds on a live source object it did not
/// translate.
#[derive(Clone)]
pub struct OpaqueRef(SourceValue);

impl OpaqueRef {
    pub fn new(referent: SourceValue) -> Self {
        OpaqueRef(referent)
    }

    pub fn referent(&self) -> &SourceValue {
        &self.0
    }

    pub fn id(&self) -> ObjectId {
        self.0.id()
    }
}

impl PartialEq for OpaqueRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.is(&other.0)
    }
}

impl Eq for OpaqueRef {}

impl fmt::Debug for OpaqueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueRef({:?})", self.0)
    }
}

/// Callbacks the target runtime invokes on opaque references.
///
/// The error side of every result is a target-runtime exception value.
pub trait SourceHost {
    fn object_id(&self, reference: &OpaqueRef) -> ObjectId {
        reference.id()
    }

    /// The referent's class, bridged into the target runtime.
    fn type_of(&self, reference: &OpaqueRef) -> Result<TargetValue, TargetValue>;

    /// Reads an attribute and bridges it; `Ok(None)` when it does not exist.
    fn get_attribute(&self, reference: &OpaqueRef, name: &str) -> Result<Option<TargetValue>, TargetValue>;

    /// Reads an attribute without bridging it.
    fn get_attribute_reference(&self, reference: &OpaqueRef, name: &str) -> Option<OpaqueRef>;

    fn set_attribute(&self, reference: &OpaqueRef, name: &str, value: &TargetValue) -> Result<(), TargetValue>;

    fn delete_attribute(&self, reference: &OpaqueRef, name: &str) -> Result<(), TargetValue>;

    /// The referent's visible attributes, each bridged.
    fn get_dict(&self, reference: &OpaqueRef) -> Result<IndexMap<String, TargetValue>, TargetValue>;

    fn call(
        &self,
        reference: &OpaqueRef,
        args: &[TargetValue],
        kwargs: &TargetKwArgs,
    ) -> Result<TargetValue, TargetValue>;

    fn import_module(&self, name: &str) -> Result<TargetValue, TargetValue>;

    /// Builds a function from a bridged code object and translates it.
    fn create_function(
        &self,
        code: &TargetValue,
        globals: &TargetValue,
        closure: &[TargetValue],
        name: &str,
    ) -> Result<TargetValue, TargetValue>;

    /// Resolves a global that translated code referenced but the namespace
    /// handle does not hold yet.
    fn load_global(&self, namespace: &GlobalsMap, name: &str) -> Result<Option<TargetValue>, TargetValue>;
}
