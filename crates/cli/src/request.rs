use std::path::PathBuf;

use common::prelude::Config;

use crate::args::{Args, Command};
use crate::node::{Node, NodeError};
use crate::response::Encoding;
use crate::state::{self, StateError};

/// Options accepted by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Options {
    /// Path to the configuration root (defaults to ~/.ipfs)
    #[arg(short = 'c', long = "config", global = true, env = "IPFS_PATH")]
    pub config_root: Option<PathBuf>,

    /// Enable debug logging and write cpu.prof / ipfs.mprof on exit
    #[arg(short = 'D', long, global = true)]
    pub debug: bool,

    /// Run the command against an in-process node even if a daemon is running
    #[arg(short = 'L', long, global = true)]
    pub local: bool,

    /// Bring the in-process node online
    #[arg(long, global = true)]
    pub online: bool,

    /// Output encoding
    #[arg(long, visible_alias = "enc", global = true, value_enum)]
    pub encoding: Option<Encoding>,
}

/// Per-invocation state handed to every command.
pub struct Context {
    pub config_root: PathBuf,
    pub config: Config,
    node: Option<Box<dyn Node>>,
}

impl Context {
    pub fn new(config_root: PathBuf, config: Config) -> Self {
        Self {
            config_root,
            config,
            node: None,
        }
    }

    /// The attached node, for commands that need one.
    pub fn node(&self) -> Result<&dyn Node, NodeError> {
        self.node.as_deref().ok_or(NodeError::NotAttached)
    }

    pub fn has_node(&self) -> bool {
        self.node.is_some()
    }

    pub fn attach_node(&mut self, node: Box<dyn Node>) {
        if let Some(previous) = self.node.replace(node) {
            tracing::warn!(peer_id = previous.peer_id(), "replacing an attached node");
            let mut previous = previous;
            if let Err(e) = previous.close() {
                tracing::error!("failed to close replaced node: {}", e);
            }
        }
    }

    /// Close and detach the node, if one is attached. Safe to call repeatedly.
    pub fn release_node(&mut self) {
        if let Some(mut node) = self.node.take() {
            tracing::debug!(peer_id = node.peer_id(), "closing node");
            if let Err(e) = node.close() {
                tracing::error!("failed to close node: {}", e);
            }
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.release_node();
    }
}

/// A fully parsed invocation.
pub struct Request {
    /// Command path, e.g. `["migrate", "fetch"]`
    pub path: Vec<String>,
    pub options: Options,
    /// Resolved output encoding
    pub encoding: Encoding,
    pub command: Command,
    pub context: Context,
}

impl Request {
    /// Finalise options and load the configuration for a parsed invocation.
    pub fn new(args: Args, path: Vec<String>) -> Result<Self, StateError> {
        let Args { options, command } = args;

        let config_root = state::config_root(options.config_root.clone())?;
        let config = if command.requires_config() {
            state::load_config(&config_root)?
        } else {
            state::load_or_default(&config_root)?
        };

        let encoding = options
            .encoding
            .unwrap_or_else(|| command.default_encoding());

        Ok(Self {
            path,
            options,
            encoding,
            command,
            context: Context::new(config_root, config),
        })
    }
}
