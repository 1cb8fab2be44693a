pub mod client;
pub mod node;

/// Commands that always run in this process: they set up or repair a
/// config root, or talk to the distribution gateway directly.
pub type ClientCommand = client::Command;

/// Commands a running daemon serves, or an in-process node otherwise.
pub type CoreCommand = node::Command;
