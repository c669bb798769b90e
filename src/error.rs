use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::component::ComponentKind;

/// Main error type for the daemon core
#[derive(Error, Debug)]
pub enum MemtierError {
    // Configuration errors
    #[error("cannot read {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error in {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: ConfigSyntaxError,
    },

    #[error("missing {0}")]
    ConfigurationMissing(String),

    #[error("error in {path:?}: {error}")]
    InConfigFile {
        path: PathBuf,
        error: Box<MemtierError>,
    },

    // Registry errors
    #[error("unknown {kind} {name:?} (registered: {})", known.join(", "))]
    UnknownComponent {
        kind: ComponentKind,
        name: String,
        known: Vec<String>,
    },

    // Component lifecycle errors
    #[error("{component}: invalid config: {source}")]
    InvalidConfig {
        component: ComponentRef,
        #[source]
        source: ComponentError,
    },

    #[error("{component}: cannot bind policy: {source}")]
    BindFailure {
        component: ComponentRef,
        #[source]
        source: ComponentError,
    },

    #[error("{component}: start failed: {source}")]
    StartFailure {
        component: ComponentRef,
        #[source]
        source: ComponentError,
    },

    // Command harness errors
    #[error("no {0} bound")]
    NotBound(&'static str),

    #[error("unknown command {0:?}, try \"help\"")]
    UnknownCommand(String),

    #[error("{0}")]
    InvalidCommand(String),

    #[error("no routine {index} (have {count})")]
    NoSuchRoutine { index: usize, count: usize },

    #[error("{component}: {source}")]
    Command {
        component: ComponentRef,
        #[source]
        source: ComponentError,
    },

    #[error("readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for MemtierError
pub type Result<T> = std::result::Result<T, MemtierError>;

/// Syntax or shape error from one of the configuration file formats
#[derive(Error, Debug)]
pub enum ConfigSyntaxError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors reported by policy and routine implementations
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("{0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("not configured")]
    NotConfigured,

    #[error("already started")]
    AlreadyStarted,

    #[error("no async runtime available")]
    NoRuntime,

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("{0}")]
    Failed(String),
}

/// Identifies the component an error is attributed to.
///
/// Routines are identified by their 1-based position in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentRef {
    Policy { name: String },
    Routine { ordinal: usize, name: String },
}

impl ComponentRef {
    pub fn policy(name: impl Into<String>) -> Self {
        Self::Policy { name: name.into() }
    }

    pub fn routine(ordinal: usize, name: impl Into<String>) -> Self {
        Self::Routine {
            ordinal,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Policy { name } | Self::Routine { name, .. } => name,
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Policy { name } => write!(f, "policy {name:?}"),
            Self::Routine { ordinal, name } => write!(f, "routine {ordinal} {name:?}"),
        }
    }
}
