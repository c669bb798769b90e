//! Heartbeat routine
//!
//! Counts ticks on a fixed interval in a background tokio task and logs
//! them at debug level. On start it reads the bound policy's configuration,
//! which makes it a convenient probe for the bind-before-start ordering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::{payload_or_empty, ComponentResult, ComponentState, ConfigPayload, Policy, Routine};
use crate::error::ComponentError;

/// Heartbeat configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatConfig {
    /// Milliseconds between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

struct HeartbeatInner {
    state: ComponentState,
    config: HeartbeatConfig,
    policy: Option<Arc<dyn Policy>>,
}

/// Routine that ticks in the background.
pub struct HeartbeatRoutine {
    inner: RwLock<HeartbeatInner>,
    ticks: Arc<AtomicU64>,
}

impl HeartbeatRoutine {
    pub const NAME: &'static str = "heartbeat";

    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HeartbeatInner {
                state: ComponentState::Created,
                config: HeartbeatConfig::default(),
                policy: None,
            }),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Ticks counted since start.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> ComponentState {
        self.inner.read().map(|inner| inner.state).unwrap_or(ComponentState::Created)
    }

    fn config_json(&self) -> ComponentResult<String> {
        let inner = self
            .inner
            .read()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        Ok(serde_json::to_string(&inner.config)?)
    }
}

impl Default for HeartbeatRoutine {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for HeartbeatRoutine {
    fn set_config(&self, config: &ConfigPayload) -> ComponentResult<()> {
        let parsed: HeartbeatConfig = serde_json::from_value(payload_or_empty(config))
            .map_err(|e| ComponentError::InvalidConfig(e.to_string()))?;
        if parsed.interval_ms == 0 {
            return Err(ComponentError::InvalidConfig(
                "interval_ms must be positive".to_string(),
            ));
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        if !inner.state.accepts_config() {
            return Err(ComponentError::AlreadyStarted);
        }
        inner.config = parsed;
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
        let handle = tokio::runtime::Handle::try_current().map_err(|_| ComponentError::NoRuntime)?;

        let mut inner = self
            .inner
            .write()
            .map_err(|e| ComponentError::Failed(e.to_string()))?;
        match inner.state {
            ComponentState::Created => return Err(ComponentError::NotConfigured),
            ComponentState::Running => return Err(ComponentError::AlreadyStarted),
            ComponentState::Configured => {}
        }

        match &inner.policy {
            Some(policy) => info!(
                interval_ms = inner.config.interval_ms,
                policy_config = %policy.config(),
                "heartbeat starting"
            ),
            None => info!(interval_ms = inner.config.interval_ms, "heartbeat starting without policy"),
        }

        let period = Duration::from_millis(inner.config.interval_ms);
        let ticks = Arc::clone(&self.ticks);
        handle.spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            timer.tick().await;
            loop {
                timer.tick().await;
                let count = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(ticks = count, "heartbeat");
            }
        });

        inner.state = ComponentState::Running;
        Ok(())
    }

    fn dispatch(&self, args: &[String]) -> ComponentResult<String> {
        match args.first().map(String::as_str) {
            Some("ticks") => Ok(self.ticks().to_string()),
            Some("state") => Ok(self.state().to_string()),
            Some("config") => self.config_json(),
            _ => Err(ComponentError::UnknownCommand(args.join(" "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::NoopPolicy;
    use serde_json::json;

    #[test]
    fn test_default_interval() {
        let routine = HeartbeatRoutine::new();
        routine.set_config(&json!({})).unwrap();
        assert_eq!(
            routine.dispatch(&["config".to_string()]).unwrap(),
            r#"{"interval_ms":1000}"#
        );
    }

    #[test]
    fn test_rejects_unknown_field() {
        let routine = HeartbeatRoutine::new();
        let err = routine.set_config(&json!({"interval": 5})).unwrap_err();
        assert!(err.to_string().contains("unknown field"), "{err}");
    }

    #[test]
    fn test_rejects_zero_interval() {
        let routine = HeartbeatRoutine::new();
        assert!(matches!(
            routine.set_config(&json!({"interval_ms": 0})),
            Err(ComponentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let routine = HeartbeatRoutine::new();
        routine.set_config(&json!({"interval_ms": 10})).unwrap();
        assert!(matches!(routine.start(), Err(ComponentError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_start_requires_config() {
        let routine = HeartbeatRoutine::new();
        assert!(matches!(routine.start(), Err(ComponentError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_ticks_in_background() {
        let routine = HeartbeatRoutine::new();
        routine.set_config(&json!({"interval_ms": 10})).unwrap();
        routine.bind_policy(Arc::new(NoopPolicy::new())).unwrap();
        routine.start().unwrap();
        assert_eq!(routine.state(), ComponentState::Running);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(routine.ticks() >= 2, "ticks = {}", routine.ticks());
        assert!(matches!(routine.start(), Err(ComponentError::AlreadyStarted)));
    }
}
