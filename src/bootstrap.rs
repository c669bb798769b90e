//! Bootstrap: turns a parsed configuration into running components.
//!
//! Two phases:
//! ```text
//! prepare: validate → create policy → configure policy → create+configure routines
//! start:   start policy → for each routine: bind policy → start routine
//! ```
//! `-config-dump-json` runs between the two. A failure in `start` leaves
//! whatever was already started running; there is no rollback.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::component::{Policy, Registry, Routine};
use crate::config::DaemonConfig;
use crate::error::{ComponentRef, MemtierError, Result};

/// A created and configured policy, not yet started.
pub struct PreparedPolicy {
    pub name: String,
    pub instance: Arc<dyn Policy>,
}

/// A created and configured routine, not yet started.
pub struct PreparedRoutine {
    /// 1-based position in the configuration
    pub ordinal: usize,
    pub name: String,
    pub instance: Arc<dyn Routine>,
}

/// Everything instantiated and configured; nothing started.
#[derive(Debug)]
pub struct PreparedSystem {
    pub policy: PreparedPolicy,
    pub routines: Vec<PreparedRoutine>,
}

impl std::fmt::Debug for PreparedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedPolicy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for PreparedRoutine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRoutine")
            .field("ordinal", &self.ordinal)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A started policy.
#[derive(Clone)]
pub struct RunningPolicy {
    pub name: String,
    pub instance: Arc<dyn Policy>,
    pub started_at: DateTime<Utc>,
}

/// A started routine.
#[derive(Clone)]
pub struct RunningRoutine {
    pub ordinal: usize,
    pub name: String,
    pub instance: Arc<dyn Routine>,
    pub started_at: DateTime<Utc>,
}

/// The live system after a successful bootstrap.
#[derive(Clone, Default)]
pub struct RunningSystem {
    pub policy: Option<RunningPolicy>,
    pub routines: Vec<RunningRoutine>,
}

/// Validate, instantiate and configure every component named in `config`.
pub fn prepare(config: &DaemonConfig, registry: &Registry) -> Result<PreparedSystem> {
    let descriptor = match &config.policy {
        Some(policy) if !policy.is_zero() => policy,
        _ => return Err(MemtierError::ConfigurationMissing("policy section".to_string())),
    };
    if descriptor.name.is_empty() {
        return Err(MemtierError::ConfigurationMissing("policy.name".to_string()));
    }

    let policy = registry.create_policy(&descriptor.name)?;
    let component = ComponentRef::policy(&descriptor.name);
    registry.apply_policy_config(&component, policy.as_ref(), &descriptor.config)?;
    debug!(policy = %descriptor.name, "policy configured");

    let mut routines = Vec::with_capacity(config.routines.len());
    for (idx, routine_cfg) in config.routines.iter().enumerate() {
        let ordinal = idx + 1;
        let routine = registry.create_routine(&routine_cfg.name)?;
        let component = ComponentRef::routine(ordinal, &routine_cfg.name);
        registry.apply_routine_config(&component, routine.as_ref(), &routine_cfg.config)?;
        debug!(ordinal, routine = %routine_cfg.name, "routine configured");

        routines.push(PreparedRoutine {
            ordinal,
            name: routine_cfg.name.clone(),
            instance: routine,
        });
    }

    Ok(PreparedSystem {
        policy: PreparedPolicy {
            name: descriptor.name.clone(),
            instance: policy,
        },
        routines,
    })
}

/// Load a configuration file and prepare it, attributing failures to the file.
pub fn prepare_from_file(path: &Path, registry: &Registry) -> Result<PreparedSystem> {
    let config = DaemonConfig::load_from(path)?;
    prepare(&config, registry).map_err(|error| MemtierError::InConfigFile {
        path: path.to_path_buf(),
        error: Box::new(error),
    })
}

impl PreparedSystem {
    /// The policy's effective configuration as one line of JSON.
    pub fn policy_config_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.policy.instance.config())?)
    }

    /// Start the policy, then bind and start each routine in order.
    pub fn start(self) -> Result<RunningSystem> {
        let PreparedSystem { policy, routines } = self;

        policy
            .instance
            .start()
            .map_err(|source| MemtierError::StartFailure {
                component: ComponentRef::policy(&policy.name),
                source,
            })?;
        info!(policy = %policy.name, "policy started");

        let policy = RunningPolicy {
            name: policy.name,
            instance: policy.instance,
            started_at: Utc::now(),
        };

        let mut running = Vec::with_capacity(routines.len());
        for routine in routines {
            let component = ComponentRef::routine(routine.ordinal, &routine.name);
            routine
                .instance
                .bind_policy(Arc::clone(&policy.instance))
                .map_err(|source| MemtierError::BindFailure {
                    component: component.clone(),
                    source,
                })?;
            routine
                .instance
                .start()
                .map_err(|source| MemtierError::StartFailure { component, source })?;
            info!(ordinal = routine.ordinal, routine = %routine.name, "routine started");

            running.push(RunningRoutine {
                ordinal: routine.ordinal,
                name: routine.name,
                instance: routine.instance,
                started_at: Utc::now(),
            });
        }

        Ok(RunningSystem {
            policy: Some(policy),
            routines: running,
        })
    }
}
