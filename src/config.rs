use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::utils::{Result, TlError};

/// Default project config file name
pub const CONFIG_FILE: &str = "umatl.json";

/// Project configuration: a JSON object with one section per tool, e.g.
///
/// ```json
/// { "textprocess": { "targetLines": 4, "replaceMode": "all" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolConfig {
    sections: Map<String, Value>,
}

impl ToolConfig {
    /// Read a config file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_json(&text)
    }

    /// Parse a config document
    ///
    /// # Errors
    /// Invalid JSON, or a document that is not an object of sections.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Object(sections) => Ok(Self { sections }),
            _ => Err(TlError::InvalidShape("config must be a JSON object".to_string())),
        }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Deserialize one section; `None` when absent
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.sections
            .get(name)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(TlError::from)
    }
}
