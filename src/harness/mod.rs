//! Command harness: a line-oriented read-eval loop over the running system.
//!
//! One command at a time, on one thread. The harness holds shared handles to
//! the policy and routines and talks to them only through their public
//! operations; it never starts, stops or drops them.

pub mod command;
pub mod input;
pub mod mode;

use std::io::Write;

use tracing::debug;

use crate::bootstrap::{RunningPolicy, RunningRoutine, RunningSystem};
use crate::error::{ComponentRef, MemtierError, Result};

pub use command::{parse_line, GetTarget, HarnessCommand, Parsed};
pub use input::{EditorReader, LineEditor, LineReader, StreamReader};
pub use mode::{select_mode, InputMode, StdinProbe, TerminalProbe, PROMPT_LABEL};

// ============================================================================
// Session
// ============================================================================

/// Harness session state: prompt, echo and what is bound.
#[derive(Clone, Default)]
pub struct Session {
    prompt: String,
    echo: bool,
    policy: Option<RunningPolicy>,
    routines: Option<Vec<RunningRoutine>>,
}

impl Session {
    pub fn new(prompt: impl Into<String>, echo: bool) -> Self {
        Self {
            prompt: prompt.into(),
            echo,
            policy: None,
            routines: None,
        }
    }

    /// Session configured for `mode`, with nothing bound.
    pub fn for_mode(mode: &InputMode) -> Self {
        Self::new(mode.prompt_label(), mode.echo())
    }

    /// Session for `-prompt`: labelled, never echoes, nothing bound.
    pub fn standalone() -> Self {
        Self::new(PROMPT_LABEL, false)
    }

    pub fn bind_policy(&mut self, policy: RunningPolicy) -> &mut Self {
        self.policy = Some(policy);
        self
    }

    /// Bind routines. An empty list leaves routines unbound.
    pub fn bind_routines(&mut self, routines: Vec<RunningRoutine>) -> &mut Self {
        if !routines.is_empty() {
            self.routines = Some(routines);
        }
        self
    }

    /// Bind everything a bootstrap produced.
    pub fn bind_system(&mut self, system: RunningSystem) -> &mut Self {
        if let Some(policy) = system.policy {
            self.bind_policy(policy);
        }
        self.bind_routines(system.routines)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn echo(&self) -> bool {
        self.echo
    }

    /// Run one command line and return its output.
    pub fn execute(&self, line: &str) -> Result<String> {
        match parse_line(line)? {
            Parsed::Help(text) => Ok(text),
            Parsed::Run(HarnessCommand::Get {
                target: GetTarget::Policy,
            }) => self.describe_policy(),
            Parsed::Run(HarnessCommand::Get {
                target: GetTarget::Routines,
            }) => self.describe_routines(),
            Parsed::Run(HarnessCommand::Policy { args }) => {
                let policy = self.policy.as_ref().ok_or(MemtierError::NotBound("policy"))?;
                policy
                    .instance
                    .dispatch(&args)
                    .map_err(|source| MemtierError::Command {
                        component: ComponentRef::policy(&policy.name),
                        source,
                    })
            }
            Parsed::Run(HarnessCommand::Routine { index, args }) => {
                let routines = self.routines.as_ref().ok_or(MemtierError::NotBound("routines"))?;
                let routine = index
                    .checked_sub(1)
                    .and_then(|idx| routines.get(idx))
                    .ok_or(MemtierError::NoSuchRoutine {
                        index,
                        count: routines.len(),
                    })?;
                routine
                    .instance
                    .dispatch(&args)
                    .map_err(|source| MemtierError::Command {
                        component: ComponentRef::routine(routine.ordinal, &routine.name),
                        source,
                    })
            }
        }
    }

    fn describe_policy(&self) -> Result<String> {
        let policy = self.policy.as_ref().ok_or(MemtierError::NotBound("policy"))?;
        let config = serde_json::to_string(&policy.instance.config())?;
        Ok(format!(
            "name: {}\nstarted: {}\nconfig: {}",
            policy.name,
            policy.started_at.to_rfc3339(),
            config
        ))
    }

    fn describe_routines(&self) -> Result<String> {
        let routines = self.routines.as_ref().ok_or(MemtierError::NotBound("routines"))?;
        let mut out = format!("{:<4} {:<20} {}", "#", "NAME", "STARTED");
        for routine in routines {
            out.push_str(&format!(
                "\n{:<4} {:<20} {}",
                routine.ordinal,
                routine.name,
                routine.started_at.to_rfc3339()
            ));
        }
        Ok(out)
    }
}

// ============================================================================
// Harness loop
// ============================================================================

/// Counts of what a harness run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarnessSummary {
    pub commands: usize,
    pub failed: usize,
}

/// Read-eval loop binding a session to an input and an output sink.
pub struct Harness<R, W> {
    session: Session,
    reader: R,
    out: W,
}

impl<R: LineReader, W: Write> Harness<R, W> {
    pub fn new(session: Session, reader: R, out: W) -> Self {
        Self {
            session,
            reader,
            out,
        }
    }

    /// Process commands until input is exhausted.
    ///
    /// Command failures are written to the output and do not stop the loop;
    /// only input or output failures do.
    pub fn run(&mut self) -> Result<HarnessSummary> {
        let mut summary = HarnessSummary::default();

        while let Some(raw) = self.reader.read_line(self.session.prompt())? {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if self.session.echo() {
                writeln!(self.out, "{}{}", self.session.prompt(), line)?;
            }

            summary.commands += 1;
            match self.session.execute(line) {
                Ok(output) => {
                    if !output.is_empty() {
                        writeln!(self.out, "{output}")?;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    debug!(command = line, error = %e, "harness command failed");
                    writeln!(self.out, "error: {e}")?;
                }
            }
            self.out.flush()?;
        }

        debug!(
            commands = summary.commands,
            failed = summary.failed,
            "harness input exhausted"
        );
        Ok(summary)
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.out
    }
}
