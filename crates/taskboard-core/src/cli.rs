use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskboard",
    version,
    about = "Taskboard: a small personal task list",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rc-file", global = true)]
    pub rc_file: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the visible task list
    List(ListArgs),
    /// Create a task
    Add(AddArgs),
    /// Flip a task between done and not done
    Toggle { id: u64 },
    /// Delete a task permanently
    Delete { id: u64 },
    /// Show every field of one task
    Info { id: u64 },
    /// Show the sidebar counters
    Counts,
    /// List the tags in use
    Tags,
    /// Print the whole collection as JSON
    Export,
    /// Show, set or toggle the colour theme
    Theme { value: Option<String> },
    /// Walk through the introduction
    Tour {
        #[arg(long)]
        skip: bool,
    },
    /// Interactive session; view settings live until you quit
    Shell,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// all, active, completed, today or high
    #[arg(short = 'f', long = "filter")]
    pub filter: Option<String>,

    /// Show tasks carrying this tag (overrides --filter)
    #[arg(short = 't', long = "tag")]
    pub tag: Option<String>,

    #[arg(short = 's', long = "search")]
    pub search: Option<String>,

    /// newest, oldest, dueDate or priority
    #[arg(long = "sort")]
    pub sort: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,

    #[arg(short = 'p', long = "priority")]
    pub priority: Option<String>,

    /// YYYY-MM-DD, today, tomorrow or +Nd
    #[arg(short = 'd', long = "due")]
    pub due: Option<String>,

    #[arg(short = 't', long = "tag")]
    pub tag: Option<String>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.KEY=VALUE` / `rc.KEY:VALUE` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> PreprocessedArgs {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest.split_once('=').or_else(|| rest.split_once(':'));
            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((format!("rc.{k}"), v.to_string()));
                continue;
            }
        }

        cleaned.push(arg);
    }

    PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::{Command, GlobalCli, preprocess_args};

    fn args(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&args(&["taskboard", "rc.color=off", "list", "rc.default.sort:oldest"]));
        assert_eq!(pre.cleaned_args, args(&["taskboard", "list"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.default.sort".to_string(), "oldest".to_string()),
            ]
        );
    }

    #[test]
    fn add_collects_multi_word_title() {
        let cli = GlobalCli::parse_from(["taskboard", "add", "Buy", "milk", "-p", "high", "--tag", "Home"]);
        match cli.command {
            Some(Command::Add(add)) => {
                assert_eq!(add.title.join(" "), "Buy milk");
                assert_eq!(add.priority.as_deref(), Some("high"));
                assert_eq!(add.tag.as_deref(), Some("Home"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = GlobalCli::parse_from(["taskboard", "-v"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 1);
    }
}
