use std::ffi::OsString;

pub use clap::Parser;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Subcommand};

use crate::op::Op;
use crate::ops::{ClientCommand, CoreCommand};
use crate::request::Options;
use crate::response::Encoding;

#[derive(Parser, Debug)]
#[command(name = "ipfs")]
#[command(about = "Global peer-to-peer content addressed file system")]
#[command(version, arg_required_else_help = true)]
pub struct Args {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Command,
}

/// Every command the binary understands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Commands that only ever run in this process
    #[command(flatten)]
    Client(ClientCommand),
    /// Commands served by the daemon when one is running
    #[command(flatten)]
    Core(CoreCommand),
}

impl Command {
    pub fn default_encoding(&self) -> Encoding {
        match self {
            Command::Client(cmd) => cmd.default_encoding(),
            Command::Core(cmd) => cmd.default_encoding(),
        }
    }

    pub fn is_client_only(&self) -> bool {
        matches!(self, Command::Client(_))
    }

    /// Whether the command refuses to run without an initialised config root.
    pub fn requires_config(&self) -> bool {
        !self.is_client_only()
    }
}

impl Args {
    /// Parse argv, also returning the resolved command path.
    pub fn try_parse_with_path<I, T>(argv: I) -> Result<(Self, Vec<String>), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(argv)?;
        let path = command_path(&matches);
        let args = Self::from_arg_matches(&matches)?;
        Ok((args, path))
    }
}

fn command_path(matches: &ArgMatches) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        path.push(name.to_string());
        current = sub;
    }
    path
}

/// Best-effort command path for an argv that failed to parse.
///
/// Walks leading tokens through the subcommand tree of `root` (which must be
/// built), skipping options and their values, and stops at the first token
/// that names no subcommand.
pub fn attempted_path<I, T>(root: &clap::Command, argv: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut path = Vec::new();
    let mut current = root;
    let mut tokens = argv
        .into_iter()
        .skip(1)
        .map(|t| t.into().to_string_lossy().into_owned());

    while let Some(token) = tokens.next() {
        if token == "--" {
            break;
        }
        if let Some(flag) = token.strip_prefix('-') {
            if !token.contains('=') && takes_value(current, flag) {
                tokens.next();
            }
            continue;
        }
        match current.find_subcommand(&token) {
            Some(sub) => {
                path.push(sub.get_name().to_string());
                current = sub;
            }
            None => break,
        }
    }
    path
}

fn takes_value(cmd: &clap::Command, flag: &str) -> bool {
    let arg = if let Some(long) = flag.strip_prefix('-') {
        cmd.get_arguments().find(|a| {
            a.get_long() == Some(long)
                || a.get_all_aliases()
                    .map(|aliases| aliases.contains(&long))
                    .unwrap_or(false)
        })
    } else {
        let mut chars = flag.chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => cmd.get_arguments().find(|a| a.get_short() == Some(short)),
            _ => None,
        }
    };
    arg.map(|a| a.get_action().takes_values()).unwrap_or(false)
}

/// True when argv passes a value to `--help`, which the flag never accepts.
pub fn help_given_value<I, T>(argv: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    argv.into_iter()
        .skip(1)
        .map(|t| t.into().to_string_lossy().into_owned())
        .take_while(|t| t != "--")
        .any(|t| t.starts_with("--help="))
}

/// True when argv asks for help anywhere before `--`.
pub fn help_requested<I, T>(argv: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    argv.into_iter()
        .skip(1)
        .map(|t| t.into().to_string_lossy().into_owned())
        .take_while(|t| t != "--")
        .any(|t| t == "-h" || t == "--help" || t.starts_with("--help="))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built() -> clap::Command {
        let mut cmd = Args::command();
        cmd.build();
        cmd
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_nested_path() {
        let (args, path) =
            Args::try_parse_with_path(["ipfs", "migrate", "fetch", "kubo/versions"]).unwrap();
        assert_eq!(path, ["migrate", "fetch"]);
        assert!(args.command.is_client_only());
        assert!(!args.command.requires_config());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let (args, path) =
            Args::try_parse_with_path(["ipfs", "cat", "abc", "--local", "--enc", "json"]).unwrap();
        assert_eq!(path, ["cat"]);
        assert!(args.options.local);
        assert_eq!(args.options.encoding, Some(Encoding::Json));
        assert!(args.command.requires_config());
    }

    #[test]
    fn test_default_encoding_follows_command() {
        let (args, _) = Args::try_parse_with_path(["ipfs", "id"]).unwrap();
        assert_eq!(args.command.default_encoding(), Encoding::Json);

        let (args, _) = Args::try_parse_with_path(["ipfs", "version"]).unwrap();
        assert_eq!(args.command.default_encoding(), Encoding::Text);
    }

    #[test]
    fn test_attempted_path_skips_option_values() {
        let root = built();
        let path = attempted_path(&root, ["ipfs", "-c", "/tmp/root", "add", "--bogus"]);
        assert_eq!(path, ["add"]);

        let path = attempted_path(&root, ["ipfs", "--config=/x", "migrate", "fetch"]);
        assert_eq!(path, ["migrate", "fetch"]);
    }

    #[test]
    fn test_attempted_path_stops_at_unknown_command() {
        let root = built();
        assert!(attempted_path(&root, ["ipfs", "frobnicate", "add"]).is_empty());
        assert_eq!(attempted_path(&root, ["ipfs", "migrate", "nope"]), ["migrate"]);
    }

    #[test]
    fn test_help_detection() {
        assert!(help_requested(["ipfs", "add", "--help"]));
        assert!(help_requested(["ipfs", "-h"]));
        assert!(!help_requested(["ipfs", "add", "--", "--help"]));
        assert!(help_given_value(["ipfs", "--help=maybe"]));
        assert!(!help_given_value(["ipfs", "--help"]));
    }
}
