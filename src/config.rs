use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::component::ConfigPayload;
use crate::error::{ConfigSyntaxError, MemtierError, Result};

/// Daemon configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// The policy to run. Required; kept optional so that its absence can be
    /// reported as a missing section rather than a parse error.
    #[serde(default)]
    pub policy: Option<PolicyDescriptor>,
    /// Routines, in start order
    #[serde(default)]
    pub routines: Vec<RoutineDescriptor>,
}

/// Names a policy and carries its configuration payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDescriptor {
    #[serde(default)]
    pub name: String,
    /// Free-form payload, validated only by the named policy
    #[serde(default)]
    pub config: ConfigPayload,
}

impl PolicyDescriptor {
    /// True for a section that sets neither a name nor a payload.
    pub fn is_zero(&self) -> bool {
        self.name.is_empty() && self.config.is_null()
    }
}

/// Names a routine and carries its configuration payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutineDescriptor {
    pub name: String,
    /// Free-form payload, validated only by the named routine
    #[serde(default)]
    pub config: ConfigPayload,
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from the file extension; YAML unless it says otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => ConfigFormat::Toml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| MemtierError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents, ConfigFormat::from_path(path)).map_err(|source| {
            MemtierError::ConfigParse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Parse configuration text in the given format.
    ///
    /// Component payloads are handed over exactly as written: key case and
    /// integer width are preserved. An empty document is an empty config.
    pub fn parse(
        contents: &str,
        format: ConfigFormat,
    ) -> std::result::Result<Self, ConfigSyntaxError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        match format {
            ConfigFormat::Yaml => {
                // A document holding only comments is null.
                let doc: serde_yaml::Value = serde_yaml::from_str(contents)?;
                if doc.is_null() {
                    return Ok(Self::default());
                }
                Ok(serde_yaml::from_value(doc)?)
            }
            ConfigFormat::Toml => Ok(toml::from_str(contents)?),
            ConfigFormat::Json => Ok(serde_json::from_str(contents)?),
        }
    }
}
