use clap::CommandFactory;

use crate::args::Args;

/// Generates help text for any command path.
///
/// Built once per invocation and only read afterwards.
#[derive(Debug, Clone)]
pub struct HelpContext {
    root: clap::Command,
}

#[derive(Debug, thiserror::Error)]
pub enum HelpError {
    #[error("no help for unknown command '{0}'")]
    UnknownCommand(String),
}

impl Default for HelpContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpContext {
    pub fn new() -> Self {
        let mut root = Args::command();
        root.build();
        Self { root }
    }

    /// The built command tree.
    pub fn root(&self) -> &clap::Command {
        &self.root
    }

    /// Long help for the command at `path`; the empty path is the root.
    pub fn text(&self, path: &[String]) -> Result<String, HelpError> {
        let mut command = &self.root;
        for segment in path {
            command = command
                .find_subcommand(segment)
                .ok_or_else(|| HelpError::UnknownCommand(path.join(" ")))?;
        }
        Ok(command.clone().render_long_help().to_string())
    }
}
