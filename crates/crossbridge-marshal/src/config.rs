use std::path::Path;

use crossbridge_bytecode::{RuntimeVersion, VersionWindow};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Bridge settings, usually read from a `crossbridge.toml`.
///
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Version of the running source engine.
    pub runtime_version: RuntimeVersion,

    /// Engine versions the extractor accepts.
    pub supported_versions: VersionWindow,

    /// Module roots whose classes and modules are never translated.
    pub banned_modules: Vec<String>,

    /// Suffix of files holding translated source code.
    pub source_file_extension: String,

    /// Package prefix of generated target classes.
    pub user_package_base: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            runtime_version: RuntimeVersion::default(),
            supported_versions: VersionWindow::default(),
            banned_modules: default_banned_modules(),
            source_file_extension: ".py".to_string(),
            user_package_base: "org.jpyinterpreter.user.".to_string(),
        }
    }
}

pub fn default_banned_modules() -> Vec<String> {
    vec!["jpype".to_string(), "importlib".to_string(), "builtins".to_string()]
}

impl BridgeConfig {
    pub fn from_toml_str(text: &str) -> BridgeResult<Self> {
        toml::from_str(text).map_err(|e| BridgeError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// True for a banned root, the root with a leading underscore, and any
    /// submodule of either.
    pub fn is_banned_module(&self, module: &str) -> bool {
        self.banned_modules.iter().any(|banned| {
            let private = format!("_{banned}");
            [banned.as_str(), private.as_str()]
                .iter()
                .any(|root| module == *root || module.strip_prefix(root).is_some_and(|rest| rest.starts_with('.')))
        })
    }

    pub fn is_source_file(&self, file: &str) -> bool {
        file.ends_with(&self.source_file_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_roots_match_private_and_dotted_forms() {
        let config = BridgeConfig::default();
        for module in ["jpype", "_jpype", "jpype.imports", "_importlib.util", "builtins"] {
            assert!(config.is_banned_module(module), "{module} should be banned");
        }
        for module in ["jpypex", "app.jpype", "importlib_metadata", "__main__"] {
            assert!(!config.is_banned_module(module), "{module} should be allowed");
        }
    }
}
