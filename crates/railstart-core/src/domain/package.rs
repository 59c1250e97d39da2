//! `package.json` script entries.

use serde_json::{Map, Value};

use crate::domain::error::DomainError;

/// Set `scripts.<name>` to `command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageScript {
    pub name: String,
    pub command: String,
}

impl PackageScript {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// Compute the new manifest, or `None` when the script is already set.
    ///
    /// Key order of the existing document is preserved.
    pub fn apply_to(&self, manifest: &str) -> Result<Option<String>, DomainError> {
        let mut doc: Value =
            serde_json::from_str(manifest).map_err(|e| DomainError::MalformedPackageManifest {
                reason: e.to_string(),
            })?;

        let root = doc
            .as_object_mut()
            .ok_or_else(|| DomainError::MalformedPackageManifest {
                reason: "top-level value is not an object".into(),
            })?;

        let scripts = root
            .entry("scripts")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| DomainError::MalformedPackageManifest {
                reason: "\"scripts\" is not an object".into(),
            })?;

        if scripts.get(&self.name).and_then(Value::as_str) == Some(self.command.as_str()) {
            return Ok(None);
        }
        scripts.insert(self.name.clone(), Value::String(self.command.clone()));

        let mut out = serde_json::to_string_pretty(&doc).map_err(|e| {
            DomainError::MalformedPackageManifest {
                reason: e.to_string(),
            }
        })?;
        out.push('\n');
        Ok(Some(out))
    }
}
