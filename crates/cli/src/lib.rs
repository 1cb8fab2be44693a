//! Command-line front end for an ipfs node.
//!
//! An invocation is parsed into a [`request::Request`], routed either to the
//! daemon serving the config root or to a node built in this process,
//! rendered to the terminal, and finished through a single termination
//! routine owned by [`lifecycle::Lifecycle`].

// CLI plumbing
pub mod args;
pub mod help;
pub mod logging;
pub mod op;
pub mod ops;
pub mod request;
pub mod response;
pub mod state;

// Execution
pub mod client;
pub mod dispatch;
pub mod lifecycle;
pub mod lock;
pub mod node;
pub mod render;

use std::ffi::OsString;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;

use clap::error::ErrorKind;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use args::Args;
use dispatch::ExecutionRouter;
use help::HelpContext;
use lifecycle::{ExitStatus, Lifecycle, RunConfig};
use lock::{FileLockProbe, LockProbe};
use node::{LocalNodeFactory, NodeFactory};
use request::Request;

/// The `ipfs` binary, with its collaborators injected.
pub struct Cli {
    probe: Box<dyn LockProbe>,
    nodes: Box<dyn NodeFactory>,
    profile_dir: PathBuf,
}

impl Cli {
    pub fn new(probe: Box<dyn LockProbe>, nodes: Box<dyn NodeFactory>) -> Self {
        Self {
            probe,
            nodes,
            profile_dir: PathBuf::from("."),
        }
    }

    /// Real lock file probe, local file-backed nodes, profiles in the working directory.
    pub fn system() -> Self {
        Self::new(Box::new(FileLockProbe), Box::new(LocalNodeFactory))
    }

    /// Directory `cpu.prof` and `ipfs.mprof` are written to in debug mode.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = dir.into();
        self
    }

    /// Run one invocation and return the status to exit with.
    ///
    /// Command output goes to `out`; errors, help after errors and logs go to
    /// `err`. If `interrupt` resolves first the command is abandoned and the
    /// invocation still ends successfully.
    pub async fn run<I, T, O, E, S>(
        &self,
        argv: I,
        out: &mut O,
        err: &mut E,
        interrupt: S,
    ) -> ExitStatus
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let help = HelpContext::new();

        let (args, path) = match parse(&argv, &help, out, err).await {
            Ok(parsed) => parsed,
            Err(status) => return Lifecycle::new(RunConfig::default()).terminate(status),
        };

        let run_config = RunConfig {
            debug: args.options.debug,
            profile_dir: self.profile_dir.clone(),
        };
        let guard = logging::init(run_config.debug);
        let mut lifecycle = Lifecycle::new(run_config).with_log_guard(guard);
        lifecycle.start();

        let status = lifecycle
            .run(self.execute(args, path, &help, out, err), interrupt)
            .await;
        lifecycle.terminate(status)
    }

    async fn execute<O, E>(
        &self,
        args: Args,
        path: Vec<String>,
        help: &HelpContext,
        out: &mut O,
        err: &mut E,
    ) -> ExitStatus
    where
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let mut request = match Request::new(args, path) {
            Ok(request) => request,
            Err(e) => {
                report(err, &e).await;
                return ExitStatus::Failure;
            }
        };

        let router = ExecutionRouter::new(self.probe.as_ref(), self.nodes.as_ref());
        let status = match router.dispatch(&mut request).await {
            Ok(response) => match render::render(response, help, out, err).await {
                Ok(status) => status,
                Err(e) => {
                    report(err, &e).await;
                    ExitStatus::Failure
                }
            },
            Err(e) => {
                report(err, &e).await;
                ExitStatus::Failure
            }
        };

        request.context.release_node();
        status
    }
}

/// Parse argv, writing help, version or usage errors when it does not
/// yield a runnable command.
async fn parse<O, E>(
    argv: &[OsString],
    help: &HelpContext,
    out: &mut O,
    err: &mut E,
) -> Result<(Args, Vec<String>), ExitStatus>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let error = match Args::try_parse_with_path(argv.iter().cloned()) {
        Ok(parsed) => return Ok(parsed),
        Err(error) => error,
    };

    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            write_best_effort(out, &error.to_string()).await;
            return Err(ExitStatus::Success);
        }
        ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            write_best_effort(err, &error.to_string()).await;
            return Err(ExitStatus::Failure);
        }
        _ => {}
    }

    // a value handed to --help is reported as-is, without help text
    if args::help_given_value(argv) {
        write_best_effort(err, &error.to_string()).await;
        return Err(ExitStatus::Failure);
    }

    let path = args::attempted_path(help.root(), argv);
    let mut text = String::new();
    if !path.is_empty() && !args::help_requested(argv) {
        text.push_str(&format!("ERROR: {}\n\n", first_line(&error)));
    }
    match help.text(&path) {
        Ok(help) => text.push_str(&help),
        Err(e) => text.push_str(&format!("{}\n", e)),
    }
    write_best_effort(err, &text).await;
    Err(ExitStatus::Failure)
}

fn first_line(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

async fn report<W: AsyncWrite + Unpin>(err: &mut W, error: &impl Display) {
    tracing::debug!("invocation failed: {}", error);
    write_best_effort(err, &format!("ERROR: {}\n", error)).await;
}

async fn write_best_effort<W: AsyncWrite + Unpin>(w: &mut W, text: &str) {
    let result = match w.write_all(text.as_bytes()).await {
        Ok(()) => w.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!("failed to write to terminal: {}", e);
    }
}
