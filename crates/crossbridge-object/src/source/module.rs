use super::value::SourceValue;

/// A loaded module. Its dictionary doubles as the globals of every function
/// defined in it.
pub struct ModuleObject {
    name: String,
    file: Option<String>,
    dict: SourceValue,
    native: bool,
}

impl ModuleObject {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let dict = SourceValue::dict([(SourceValue::str("__name__"), SourceValue::str(name.clone()))]);
        ModuleObject { name, file: None, dict, native: false }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Marks the module as an extension module compiled to native code.
    pub fn native(mut self) -> Self {
        self.native = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn is_native(&self) -> bool {
        self.native
    }

    pub fn dict(&self) -> &SourceValue {
        &self.dict
    }

    pub fn get(&self, name: &str) -> Option<SourceValue> {
        self.dict.dict_get(name)
    }

    pub fn set(&self, name: &str, value: SourceValue) {
        self.dict.dict_set(name, value);
    }

    pub fn remove(&self, name: &str) -> Option<SourceValue> {
        self.dict.dict_remove(name)
    }
}
