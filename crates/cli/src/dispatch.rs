use common::prelude::{dial_args, AddrError};

use crate::args::Command;
use crate::client::{ApiClient, ApiError};
use crate::lock::LockProbe;
use crate::node::{NodeError, NodeFactory};
use crate::op::Op;
use crate::request::Request;
use crate::response::Response;

/// Where a dispatchable command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Forward to the daemon holding the config root
    Remote,
    /// Build a node in this process and run the command against it
    Local,
}

impl Route {
    /// Remote iff a daemon holds the lock and local execution was not requested.
    pub fn select(local: bool, locked: bool) -> Self {
        if locked && !local {
            Route::Remote
        } else {
            Route::Local
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid API address: {0}")]
    Addr(#[from] AddrError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to construct node: {0}")]
    Node(#[from] NodeError),
    #[error("cannot resolve path for the daemon: {0}")]
    Resolve(#[from] std::io::Error),
}

/// Chooses, once per invocation, between the daemon and an in-process node.
pub struct ExecutionRouter<'a> {
    probe: &'a dyn LockProbe,
    nodes: &'a dyn NodeFactory,
}

impl<'a> ExecutionRouter<'a> {
    pub fn new(probe: &'a dyn LockProbe, nodes: &'a dyn NodeFactory) -> Self {
        Self { probe, nodes }
    }

    /// Execute `request` and return its response.
    ///
    /// On the local path the constructed node is left attached to the
    /// request's context; the caller releases it after rendering.
    pub async fn dispatch(&self, request: &mut Request) -> Result<Response, DispatchError> {
        let path = request.path.clone();
        let encoding = request.encoding;

        let command = match &request.command {
            Command::Client(command) => {
                tracing::debug!(?path, "running client command");
                return Ok(command.call(&request.context, path, encoding).await);
            }
            Command::Core(command) => command.clone(),
        };

        let locked = self.probe.is_locked(&request.context.config_root);
        let route = Route::select(request.options.local, locked);
        tracing::debug!(?path, local = request.options.local, locked, ?route, "dispatching");

        match route {
            Route::Remote => {
                let dial = dial_args(&request.context.config.addresses.api)?;
                let client = ApiClient::from_dial_args(&dial)?;
                let command = command.for_remote()?;
                Ok(client.send(&path, encoding, &command).await?)
            }
            Route::Local => {
                let node = self.nodes.build(
                    &request.context.config_root,
                    &request.context.config,
                    request.options.online,
                )?;
                request.context.attach_node(node);
                Ok(command.call(&request.context, path, encoding).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_truth_table() {
        assert_eq!(Route::select(false, false), Route::Local);
        assert_eq!(Route::select(true, false), Route::Local);
        assert_eq!(Route::select(false, true), Route::Remote);
        assert_eq!(Route::select(true, true), Route::Local);
    }
}
