//! Component registry: name to factory tables for policies and routines.
//!
//! The table is filled once at process start and only read afterwards, so a
//! shared `&Registry` can be queried from any thread.

use std::collections::HashMap;
use std::sync::Arc;

use super::{ComponentKind, ConfigPayload, HeartbeatRoutine, NoopPolicy, NoopRoutine, Policy, Routine};
use crate::error::{ComponentRef, MemtierError, Result};

/// Builds a fresh, unconfigured policy.
pub type PolicyFactory = Arc<dyn Fn() -> Arc<dyn Policy> + Send + Sync>;

/// Builds a fresh, unconfigured routine.
pub type RoutineFactory = Arc<dyn Fn() -> Arc<dyn Routine> + Send + Sync>;

/// Compiled-in component implementations, keyed by name.
#[derive(Clone, Default)]
pub struct Registry {
    policies: HashMap<String, PolicyFactory>,
    routines: HashMap<String, RoutineFactory>,
}

impl Registry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The components shipped with the daemon.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register_policy(NoopPolicy::NAME, || Arc::new(NoopPolicy::new()));
        registry.register_routine(NoopRoutine::NAME, || Arc::new(NoopRoutine::new()));
        registry.register_routine(HeartbeatRoutine::NAME, || {
            Arc::new(HeartbeatRoutine::new())
        });
        registry
    }

    /// Register a policy factory. A later registration replaces an earlier one.
    pub fn register_policy<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Policy> + Send + Sync + 'static,
    {
        self.policies.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register a routine factory. A later registration replaces an earlier one.
    pub fn register_routine<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Routine> + Send + Sync + 'static,
    {
        self.routines.insert(name.into(), Arc::new(factory));
        self
    }

    /// Sorted names registered for `kind`.
    pub fn names(&self, kind: ComponentKind) -> Vec<String> {
        let mut names: Vec<String> = match kind {
            ComponentKind::Policy => self.policies.keys().cloned().collect(),
            ComponentKind::Routine => self.routines.keys().cloned().collect(),
        };
        names.sort();
        names
    }

    /// Instantiate the policy registered as `name`.
    pub fn create_policy(&self, name: &str) -> Result<Arc<dyn Policy>> {
        self.policies
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| self.unknown(ComponentKind::Policy, name))
    }

    /// Instantiate the routine registered as `name`.
    pub fn create_routine(&self, name: &str) -> Result<Arc<dyn Routine>> {
        self.routines
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| self.unknown(ComponentKind::Routine, name))
    }

    /// Apply `payload` to a policy; the policy owns the schema.
    pub fn apply_policy_config(
        &self,
        component: &ComponentRef,
        policy: &dyn Policy,
        payload: &ConfigPayload,
    ) -> Result<()> {
        policy
            .set_config(payload)
            .map_err(|source| MemtierError::InvalidConfig {
                component: component.clone(),
                source,
            })
    }

    /// Apply `payload` to a routine; the routine owns the schema.
    pub fn apply_routine_config(
        &self,
        component: &ComponentRef,
        routine: &dyn Routine,
        payload: &ConfigPayload,
    ) -> Result<()> {
        routine
            .set_config(payload)
            .map_err(|source| MemtierError::InvalidConfig {
                component: component.clone(),
                source,
            })
    }

    fn unknown(&self, kind: ComponentKind, name: &str) -> MemtierError {
        MemtierError::UnknownComponent {
            kind,
            name: name.to_string(),
            known: self.names(kind),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("policies", &self.names(ComponentKind::Policy))
            .field("routines", &self.names(ComponentKind::Routine))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_names() {
        let registry = Registry::builtin();
        assert_eq!(registry.names(ComponentKind::Policy), vec!["noop"]);
        assert_eq!(
            registry.names(ComponentKind::Routine),
            vec!["heartbeat", "noop-routine"]
        );
    }

    #[test]
    fn test_unknown_policy() {
        let registry = Registry::builtin();
        let err = registry.create_policy("heat").err().expect("should fail");
        match err {
            MemtierError::UnknownComponent { kind, name, known } => {
                assert_eq!(kind, ComponentKind::Policy);
                assert_eq!(name, "heat");
                assert_eq!(known, vec!["noop"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_routine() {
        let registry = Registry::builtin();
        assert!(matches!(
            registry.create_routine("noop"),
            Err(MemtierError::UnknownComponent {
                kind: ComponentKind::Routine,
                ..
            })
        ));
    }

    #[test]
    fn test_each_create_returns_fresh_instance() {
        let registry = Registry::builtin();
        let a = registry.create_policy("noop").unwrap();
        let b = registry.create_policy("noop").unwrap();
        a.set_config(&json!({"x": 1})).unwrap();
        assert_eq!(b.config(), json!({}));
    }

    #[test]
    fn test_invalid_config_is_attributed() {
        let registry = Registry::builtin();
        let routine = registry.create_routine("heartbeat").unwrap();
        let component = ComponentRef::routine(2, "heartbeat");
        let err = registry
            .apply_routine_config(&component, routine.as_ref(), &json!({"interval_ms": "soon"}))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("routine 2 \"heartbeat\": invalid config:"), "{msg}");
    }
}
