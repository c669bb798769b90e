//! Process Lifetime Controller
//!
//! After bootstrap the process either runs the command harness until its
//! input is exhausted, or parks until it is killed. There is no shutdown
//! path: started components keep running until the process exits.

use std::convert::Infallible;
use std::io::{self, Cursor};

use tracing::info;

use crate::error::{MemtierError, Result};
use crate::harness::{EditorReader, Harness, HarnessSummary, InputMode, Session, StreamReader};

/// Wait forever without doing any work.
pub async fn park() -> Infallible {
    std::future::pending().await
}

/// Run the harness for `mode` to completion, or park if it is disabled.
///
/// The loop blocks on input, so it runs on the blocking pool while the
/// components' own tasks keep the async workers.
pub async fn run(mode: InputMode, session: Session) -> Result<HarnessSummary> {
    if mode.is_disabled() {
        info!("command harness disabled, parking");
        match park().await {}
    }

    tokio::task::spawn_blocking(move || run_blocking(mode, session))
        .await
        .map_err(|e| MemtierError::Internal(format!("command harness task: {e}")))?
}

/// Run the harness on the current thread against the process stdio.
pub fn run_blocking(mode: InputMode, session: Session) -> Result<HarnessSummary> {
    let stdout = io::stdout();
    match mode {
        InputMode::Interactive => Harness::new(session, EditorReader::new()?, stdout).run(),
        InputMode::Piped => Harness::new(session, StreamReader::new(io::stdin().lock()), stdout).run(),
        InputMode::Literal(commands) => {
            Harness::new(session, StreamReader::new(Cursor::new(commands)), stdout).run()
        }
        InputMode::Disabled => Ok(HarnessSummary::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_parks() {
        let parked = tokio::time::timeout(
            Duration::from_millis(50),
            run(InputMode::Disabled, Session::new("", false)),
        )
        .await;
        assert!(parked.is_err(), "disabled harness must never return");
    }

    #[tokio::test]
    async fn test_literal_runs_to_exhaustion() {
        let summary = run(
            InputMode::Literal("get policy\nquit".to_string()),
            Session::new("", true),
        )
        .await
        .unwrap();
        assert_eq!(summary.commands, 2);
        assert_eq!(summary.failed, 2);
    }
}
