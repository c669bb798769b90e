//! Policy and routine contracts
//!
//! A process runs exactly one policy and zero or more routines. Both are
//! created by name through the [`Registry`], configured once with a JSON
//! payload they validate themselves, and started once. Every method takes
//! `&self`: the command harness calls into components while their own
//! background tasks are running.

pub mod heartbeat;
pub mod noop;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::ComponentError;

pub use heartbeat::{HeartbeatConfig, HeartbeatRoutine};
pub use noop::{NoopPolicy, NoopRoutine};
pub use registry::{PolicyFactory, Registry, RoutineFactory};

/// Opaque per-component configuration payload.
pub type ConfigPayload = JsonValue;

/// Result of a component operation
pub type ComponentResult<T> = std::result::Result<T, ComponentError>;

// ============================================================================
// Contracts
// ============================================================================

/// The single resource-management policy of a process.
pub trait Policy: Send + Sync {
    /// Validate and apply the configuration payload.
    fn set_config(&self, config: &ConfigPayload) -> ComponentResult<()>;

    /// Effective configuration, in canonical form.
    fn config(&self) -> ConfigPayload;

    /// Start the policy's background work. Called at most once.
    fn start(&self) -> ComponentResult<()>;

    /// Execute a harness command addressed to this policy.
    fn dispatch(&self, args: &[String]) -> ComponentResult<String>;
}

/// An auxiliary component that may consult the policy.
pub trait Routine: Send + Sync {
    /// Validate and apply the configuration payload.
    fn set_config(&self, config: &ConfigPayload) -> ComponentResult<()>;

    /// Attach the running policy. Always called before [`Routine::start`].
    fn bind_policy(&self, policy: Arc<dyn Policy>) -> ComponentResult<()>;

    /// Start the routine's background work. Called at most once.
    fn start(&self) -> ComponentResult<()>;

    /// Execute a harness command addressed to this routine.
    fn dispatch(&self, args: &[String]) -> ComponentResult<String>;
}

// ============================================================================
// Kind / State
// ============================================================================

/// The two component families the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Policy,
    Routine,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Policy => write!(f, "policy"),
            ComponentKind::Routine => write!(f, "routine"),
        }
    }
}

/// Lifecycle state reported by built-in components.
///
/// There is no way back from `Running`: components are never stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Created by the registry, no configuration applied yet
    Created,
    /// Configuration accepted
    Configured,
    /// Started
    Running,
}

impl ComponentState {
    /// Whether a configuration may still be applied.
    pub fn accepts_config(&self) -> bool {
        !matches!(self, ComponentState::Running)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentState::Created => write!(f, "created"),
            ComponentState::Configured => write!(f, "configured"),
            ComponentState::Running => write!(f, "running"),
        }
    }
}

/// Normalize an absent payload to an empty object.
pub(crate) fn payload_or_empty(config: &ConfigPayload) -> ConfigPayload {
    if config.is_null() {
        JsonValue::Object(Default::default())
    } else {
        config.clone()
    }
}
