use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::harness::mode::STDIN_MARKER;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "memtierd")]
#[command(version)]
#[command(about = "Memory tiering daemon", long_about = None)]
pub struct Cli {
    /// Launch interactive prompt (ignore other parameters)
    #[arg(long)]
    pub prompt: bool,

    /// Launch non-interactive mode with config file
    #[arg(long, env = "MEMTIERD_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dump effective configuration in JSON
    #[arg(long = "config-dump-json")]
    pub config_dump_json: bool,

    /// Print debug output
    #[arg(long)]
    pub debug: bool,

    /// Run command string, "-": from stdin (the default), "": non-interactive
    #[arg(
        short = 'c',
        value_name = "STRING",
        default_value = STDIN_MARKER,
        allow_hyphen_values = true
    )]
    pub command: String,
}

/// Long options that are also accepted with a single dash.
const SINGLE_DASH_LONG: &[&str] = &[
    "prompt",
    "config",
    "config-dump-json",
    "debug",
    "help",
    "version",
];

/// Options whose next argument is their value.
const TAKES_VALUE: &[&str] = &["-c", "--config"];

impl Cli {
    /// Parse from process arguments, accepting `-config`-style long flags.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}

/// Rewrite single-dash long flags (`-config x`, `-debug`) to their
/// double-dash form. Option values and anything after `--` are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut value_next = false;
    let mut passthrough = false;

    for (idx, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if idx == 0 || passthrough || value_next {
            value_next = false;
            out.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };

        if text == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let rewritten = match text.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') => {
                let name = rest.split('=').next().unwrap_or(rest);
                SINGLE_DASH_LONG
                    .contains(&name)
                    .then(|| format!("--{rest}"))
            }
            _ => None,
        };
        let text = rewritten.unwrap_or_else(|| text.to_string());
        value_next = TAKES_VALUE.contains(&text.as_str());
        out.push(OsString::from(text));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(args: &[&str]) -> Vec<String> {
        normalize_args(args.iter().copied())
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_single_dash_long_flags() {
        assert_eq!(
            normalized(&["memtierd", "-config", "a.yaml", "-debug", "-config-dump-json"]),
            vec!["memtierd", "--config", "a.yaml", "--debug", "--config-dump-json"]
        );
        assert_eq!(
            normalized(&["memtierd", "-config=a.yaml"]),
            vec!["memtierd", "--config=a.yaml"]
        );
    }

    #[test]
    fn test_values_are_not_rewritten() {
        assert_eq!(
            normalized(&["memtierd", "-c", "-debug", "-config", "-prompt"]),
            vec!["memtierd", "-c", "-debug", "--config", "-prompt"]
        );
        assert_eq!(
            normalized(&["memtierd", "--", "-debug"]),
            vec!["memtierd", "--", "-debug"]
        );
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["memtierd"]);
        assert!(!cli.prompt);
        assert!(!cli.debug);
        assert!(!cli.config_dump_json);
        assert_eq!(cli.command, "-");
    }

    #[test]
    fn test_command_string_values() {
        assert_eq!(parse(&["memtierd", "-c", ""]).command, "");
        assert_eq!(parse(&["memtierd", "-c", "-"]).command, "-");
        assert_eq!(parse(&["memtierd", "-c", "get policy"]).command, "get policy");
    }

    #[test]
    fn test_config_flags() {
        let cli = parse(&["memtierd", "-config", "/etc/memtierd.yaml", "-config-dump-json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/memtierd.yaml")));
        assert!(cli.config_dump_json);
    }
}
