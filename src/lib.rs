pub mod bootstrap;
pub mod cli;
pub mod component;
pub mod config;
pub mod error;
pub mod harness;
pub mod lifetime;

pub use bootstrap::{prepare, prepare_from_file, PreparedSystem, RunningSystem};
pub use component::{ComponentKind, ComponentState, ConfigPayload, Policy, Registry, Routine};
pub use config::DaemonConfig;
pub use error::{ComponentError, ComponentRef, MemtierError, Result};
pub use harness::{Harness, HarnessSummary, InputMode, Session};
