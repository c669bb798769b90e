use std::process::ExitCode;

use anyhow::Result;
use memtierd::bootstrap;
use memtierd::cli::Cli;
use memtierd::component::Registry;
use memtierd::error::MemtierError;
use memtierd::harness::mode::STDIN_MARKER;
use memtierd::harness::{select_mode, Session, StdinProbe};
use memtierd::lifetime;
use tracing::debug;

mod main_runtime;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_normalized();
    main_runtime::init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("memtierd: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.prompt {
        let mode = select_mode(STDIN_MARKER, &StdinProbe);
        lifetime::run(mode, Session::standalone()).await?;
        return Ok(());
    }

    let Some(config_path) = cli.config.as_deref() else {
        return Err(MemtierError::ConfigurationMissing("-prompt or -config".to_string()).into());
    };

    let registry = Registry::builtin();
    let prepared = bootstrap::prepare_from_file(config_path, &registry)?;

    if cli.config_dump_json {
        println!("{}", prepared.policy_config_json()?);
        return Ok(());
    }

    let system = prepared.start()?;

    let mode = select_mode(&cli.command, &StdinProbe);
    debug!(?mode, "command harness mode selected");
    let mut session = Session::for_mode(&mode);
    session.bind_system(system);

    let summary = lifetime::run(mode, session).await?;
    debug!(
        commands = summary.commands,
        failed = summary.failed,
        "command harness finished"
    );
    Ok(())
}
