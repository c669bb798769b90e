//! No-op policy and routine.
//!
//! They accept any JSON object as configuration, keep it verbatim, and do no
//! background work. Useful for exercising the daemon without touching memory.

use std::sync::{Arc, RwLock};

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{payload_or_empty, ComponentResult, ComponentState, ConfigPayload, Policy, Routine};
use crate::error::ComponentError;

fn require_object(config: &ConfigPayload) -> ComponentResult<ConfigPayload> {
    let config = payload_or_empty(config);
    if config.is_object() {
        Ok(config)
    } else {
        Err(ComponentError::InvalidConfig(format!(
            "expected a JSON object, got {config}"
        )))
    }
}

fn unknown_command(args: &[String]) -> ComponentError {
    ComponentError::UnknownCommand(args.join(" "))
}

// ============================================================================
// NoopPolicy
// ============================================================================

#[derive(Debug)]
struct NoopPolicyInner {
    state: ComponentState,
    config: ConfigPayload,
}

/// Policy that makes no decisions.
#[derive(Debug)]
pub struct NoopPolicy {
    inner: RwLock<NoopPolicyInner>,
}

impl NoopPolicy {
    pub const NAME: &'static str = "noop";

    pub fn new() -> Self {
        Self {
            inner: RwLock::new(NoopPolicyInner {
                state: ComponentState::Created,
                config: JsonValue::Object(Default::default()),
            }),
        }
    }

    pub fn state(&self) -> ComponentState {
        self.inner.read().map(|inner| inner.state).unwrap_or(ComponentState::Created)
    }
}

impl Default for NoopPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for NoopPolicy {
    fn set_config(&self, config: &ConfigPayload) -> ComponentResult<()> {
        let config = require_object(config)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        if !inner.state.accepts_config() {
            return Err(ComponentError::AlreadyStarted);
        }
        inner.config = config;
        inner.state = ComponentState::Configured;
        Ok(())
    }

    fn config(&self) -> ConfigPayload {
        self.inner
            .read()
            .map(|inner| inner.config.clone())
            .unwrap_or(JsonValue::Null)
    }

    fn start(&self) -> ComponentResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        match inner.state {
            ComponentState::Running => Err(ComponentError::AlreadyStarted),
            _ => {
                inner.state = ComponentState::Running;
                debug!("noop policy running");
                Ok(())
            }
        }
    }

    fn dispatch(&self, args: &[String]) -> ComponentResult<String> {
        match args.first().map(String::as_str) {
            Some("config") => Ok(serde_json::to_string(&self.config())?),
            Some("state") => Ok(self.state().to_string()),
            _ => Err(unknown_command(args)),
        }
    }
}

// ============================================================================
// NoopRoutine
// ============================================================================

struct NoopRoutineInner {
    state: ComponentState,
    policy: Option<Arc<dyn Policy>>,
}

/// Routine that does nothing once started.
pub struct NoopRoutine {
    inner: RwLock<NoopRoutineInner>,
}

impl NoopRoutine {
    pub const NAME: &'static str = "noop-routine";

    pub fn new() -> Self {
        Self {
            inner: RwLock::new(NoopRoutineInner {
                state: ComponentState::Created,
                policy: None,
            }),
        }
    }

    pub fn state(&self) -> ComponentState {
        self.inner.read().map(|inner| inner.state).unwrap_or(ComponentState::Created)
    }

    pub fn has_policy(&self) -> bool {
        self.inner
            .read()
            .map(|inner| inner.policy.is_some())
            .unwrap_or(false)
    }
}

impl Default for NoopRoutine {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for NoopRoutine {
    fn set_config(&self, config: &ConfigPayload) -> ComponentResult<()> {
        require_object(config)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        if !inner.state.accepts_config() {
            return Err(ComponentError::AlreadyStarted);
        }
        inner.state = ComponentState::Configured;
        Ok(())
    }

    fn bind_policy(&self, policy: Arc<dyn Policy>) -> ComponentResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        inner.policy = Some(policy);
        Ok(())
    }

    fn start(&self) -> ComponentResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        if inner.state == ComponentState::Running {
            return Err(ComponentError::AlreadyStarted);
        }
        inner.state = ComponentState::Running;
        Ok(())
    }

    fn dispatch(&self, args: &[String]) -> ComponentResult<String> {
        match args.first().map(String::as_str) {
            Some("state") => Ok(self.state().to_string()),
            _ => Err(unknown_command(args)),
        }
    }
}
