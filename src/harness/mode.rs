//! Input mode selection for the command harness.
//!
//! The mode is decided once, from the `-c` value and, only when that value
//! asks for standard input, from whether standard input is a terminal.

use crossterm::tty::IsTty;

/// `-c` value that selects standard input.
pub const STDIN_MARKER: &str = "-";

/// Prompt label shown before each read and in echoed transcripts.
pub const PROMPT_LABEL: &str = "memtierd> ";

/// Answers whether standard input is an interactive terminal.
pub trait TerminalProbe {
    fn stdin_is_terminal(&self) -> bool;
}

/// Probes the real process standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinProbe;

impl TerminalProbe for StdinProbe {
    fn stdin_is_terminal(&self) -> bool {
        std::io::stdin().is_tty()
    }
}

/// Where harness commands come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Terminal on stdin: prompt shown, no echo.
    Interactive,
    /// Pipe or file on stdin: commands echoed before their output.
    Piped,
    /// The `-c` string itself is the input.
    Literal(String),
    /// `-c ""`: no harness at all.
    Disabled,
}

impl InputMode {
    /// Label written before each command.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            InputMode::Interactive | InputMode::Piped => PROMPT_LABEL,
            InputMode::Literal(_) | InputMode::Disabled => "",
        }
    }

    /// Whether each consumed command is written back to the output.
    pub fn echo(&self) -> bool {
        matches!(self, InputMode::Piped | InputMode::Literal(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, InputMode::Disabled)
    }
}

/// Choose the harness input mode for a `-c` value.
pub fn select_mode(command: &str, probe: &dyn TerminalProbe) -> InputMode {
    match command {
        "" => InputMode::Disabled,
        STDIN_MARKER => {
            if probe.stdin_is_terminal() {
                InputMode::Interactive
            } else {
                InputMode::Piped
            }
        }
        literal => InputMode::Literal(literal.to_string()),
    }
}
