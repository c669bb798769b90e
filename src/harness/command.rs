//! Harness command vocabulary, parsed with clap like a shell line.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

use crate::error::{MemtierError, Result};

/// Internal CLI struct for harness line parsing.
#[derive(Parser, Debug)]
#[command(
    name = "memtierd",
    no_binary_name = true,
    disable_version_flag = true,
    override_usage = "<COMMAND> [ARGS]..."
)]
struct HarnessLine {
    #[command(subcommand)]
    command: HarnessCommand,
}

/// Commands understood by the harness.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HarnessCommand {
    /// Show the bound policy or routines
    Get {
        #[command(subcommand)]
        target: GetTarget,
    },
    /// Forward a command to the policy
    Policy {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Forward a command to routine N (1-based)
    Routine {
        index: usize,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

/// What `get` shows.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetTarget {
    /// Name, start time and configuration of the policy
    Policy,
    /// Started routines in order
    Routines,
}

/// A parsed line: either a command to run or text to show as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(HarnessCommand),
    Help(String),
}

fn is_known(word: &str) -> bool {
    word == "help"
        || HarnessLine::command()
            .get_subcommands()
            .any(|sub| sub.get_name() == word)
}

/// Parse one non-empty command line.
pub fn parse_line(line: &str) -> Result<Parsed> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = words.first() else {
        return Err(MemtierError::InvalidCommand("empty command".to_string()));
    };
    if !is_known(first) {
        return Err(MemtierError::UnknownCommand(first.to_string()));
    }

    match HarnessLine::try_parse_from(&words) {
        Ok(parsed) => Ok(Parsed::Run(parsed.command)),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Ok(Parsed::Help(e.render().to_string().trim_end().to_string()))
            }
            _ => Err(MemtierError::InvalidCommand(
                e.render().to_string().trim_end().to_string(),
            )),
        },
    }
}
