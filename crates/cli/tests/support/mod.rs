//! Shared helpers for end-to-end invocations of the `ipfs` front end
#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use common::prelude::Config;
use ipfs_cli::client::ApiRequest;
use ipfs_cli::lifecycle::ExitStatus;
use ipfs_cli::lock::{FileLockProbe, LOCK_FILE};
use ipfs_cli::node::{LocalNodeFactory, Node, NodeError, NodeFactory};
use ipfs_cli::ops::CoreCommand;
use ipfs_cli::Cli;

pub const DAEMON_VERSION: &str = "0.0.0-daemon\n";

/// Captured result of one invocation.
#[derive(Debug)]
pub struct Outcome {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run `ipfs <args>` with no interrupt.
pub async fn run(cli: &Cli, args: &[&str]) -> Outcome {
    run_with_interrupt(cli, args, std::future::pending()).await
}

pub async fn run_with_interrupt<S>(cli: &Cli, args: &[&str], interrupt: S) -> Outcome
where
    S: std::future::Future<Output = ()>,
{
    let argv: Vec<String> = std::iter::once("ipfs")
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect();
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = cli.run(argv, &mut out, &mut err, interrupt).await;
    Outcome {
        status,
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    }
}

/// Initialise a config root under `dir`, pointing its API address at `api`.
pub fn init_root(dir: &Path, api: Option<&str>) -> PathBuf {
    let root = dir.join("root");
    let mut config = Config::default();
    if let Some(api) = api {
        config.addresses.api = api.to_string();
    }
    ipfs_cli::state::init(&root, config).unwrap();
    root
}

/// Take the daemon lock for `root` until the returned file is dropped.
#[cfg(unix)]
pub fn hold_lock(root: &Path) -> File {
    use std::os::unix::io::AsRawFd;

    let file = File::create(root.join(LOCK_FILE)).unwrap();
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    assert_eq!(rc, 0, "failed to take daemon lock");
    file
}

async fn version(Json(request): Json<ApiRequest>) -> (StatusCode, String) {
    match request.command {
        CoreCommand::Version(_) => (StatusCode::OK, DAEMON_VERSION.to_string()),
        other => (StatusCode::BAD_REQUEST, format!("unexpected command {:?}", other)),
    }
}

async fn cat() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "message": "invalid block hash: \"abc\"",
            "code": "client",
        })),
    )
}

async fn config() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn hang() -> &'static str {
    std::future::pending::<()>().await;
    "unreachable"
}

/// Spawn a fake daemon and return the multiaddr of its API.
pub async fn spawn_daemon() -> String {
    let router = Router::new()
        .route("/api/v0/version", post(version))
        .route("/api/v0/cat", post(cat))
        .route("/api/v0/config", post(config))
        .route("/api/v0/id", post(hang));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("/ip4/127.0.0.1/tcp/{}", addr.port())
}

/// Spawn a fake daemon that records the last `add` it receives.
pub async fn spawn_recording_daemon() -> (String, Arc<Mutex<Option<ApiRequest>>>) {
    let seen = Arc::new(Mutex::new(None));
    let recorder = seen.clone();
    let router = Router::new().route(
        "/api/v0/add",
        post(move |Json(request): Json<ApiRequest>| {
            let recorder = recorder.clone();
            async move {
                *recorder.lock().unwrap() = Some(request);
                "added\n"
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("/ip4/127.0.0.1/tcp/{}", addr.port()), seen)
}

/// A multiaddr nothing listens on.
pub async fn closed_daemon() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("/ip4/127.0.0.1/tcp/{}", port)
}

pub const DIST: &str = "/dist";

/// Spawn a fake distribution gateway and return its origin.
pub async fn spawn_gateway() -> String {
    let router = Router::new()
        .route("/dist/ok.txt", get(|| async { "hello world" }))
        .route("/env/ok.txt", get(|| async { "from env" }))
        .route("/config/ok.txt", get(|| async { "from config" }))
        .route(
            "/dist/missing",
            get(|| async { (StatusCode::NOT_FOUND, "not found") }),
        )
        .route(
            "/dist/kubo/versions",
            get(|| async { "v0.1.0\nv0.3.0-rc1\nv0.2.0\n" }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Local nodes whose closes are counted.
#[derive(Clone, Default)]
pub struct CountingNodes {
    pub built: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl CountingNodes {
    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

struct CountingNode {
    inner: Box<dyn Node>,
    closed: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Node for CountingNode {
    fn peer_id(&self) -> &str {
        self.inner.peer_id()
    }

    fn is_online(&self) -> bool {
        self.inner.is_online()
    }

    async fn put_block(&self, data: bytes::Bytes) -> Result<String, NodeError> {
        self.inner.put_block(data).await
    }

    async fn get_block(&self, hash: &str) -> Result<bytes::Bytes, NodeError> {
        self.inner.get_block(hash).await
    }

    fn close(&mut self) -> Result<(), NodeError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}

impl NodeFactory for CountingNodes {
    fn build(
        &self,
        config_root: &Path,
        config: &Config,
        online: bool,
    ) -> Result<Box<dyn Node>, NodeError> {
        let inner = LocalNodeFactory.build(config_root, config, online)?;
        self.built.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingNode {
            inner,
            closed: self.closed.clone(),
        }))
    }
}

/// A front end using the real lock probe and counting local nodes.
pub fn counting_cli(nodes: &CountingNodes) -> Cli {
    Cli::new(Box::new(FileLockProbe), Box::new(nodes.clone()))
}
