//! Process lifecycle: profiling setup, interrupt handling and the single
//! termination routine every exit path goes through.

pub mod alloc;
pub mod profiling;

use std::future::Future;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;

pub use profiling::{Profiler, ProfilingError, CPU_PROFILE, HEAP_PROFILE};

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

/// Settings fixed once arguments are parsed.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Debug logging plus CPU and heap profiling
    pub debug: bool,
    /// Directory the profiles are written to
    pub profile_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            debug: false,
            profile_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    Draining,
    Terminated,
}

pub struct Lifecycle {
    state: LifecycleState,
    config: RunConfig,
    profiler: Option<Box<dyn Profiler>>,
    log_guard: Option<WorkerGuard>,
}

impl Lifecycle {
    pub fn new(config: RunConfig) -> Self {
        Self {
            state: LifecycleState::Idle,
            config,
            profiler: None,
            log_guard: None,
        }
    }

    /// Use `profiler` instead of starting the CPU profiler in debug mode.
    pub fn with_profiler(mut self, profiler: Box<dyn Profiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// Keep the logging worker alive until termination.
    pub fn with_log_guard(mut self, guard: WorkerGuard) -> Self {
        self.log_guard = Some(guard);
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Begin profiling in debug mode. Failing to start is logged, not fatal.
    pub fn start(&mut self) {
        if !self.config.debug || self.profiler.is_some() {
            return;
        }
        match profiling::start_cpu_profiler(&self.config.profile_dir) {
            Ok(profiler) => self.profiler = Some(profiler),
            Err(e) => tracing::error!("failed to start cpu profiling: {}", e),
        }
    }

    /// Drive `main` to completion unless `interrupt` resolves first.
    ///
    /// An interrupt abandons `main` where it stands and yields success.
    pub async fn run<M, I>(&mut self, main: M, interrupt: I) -> ExitStatus
    where
        M: Future<Output = ExitStatus>,
        I: Future<Output = ()>,
    {
        self.state = LifecycleState::Running;
        let status = tokio::select! {
            status = main => status,
            _ = interrupt => {
                tracing::info!("Received interrupt signal, terminating...");
                ExitStatus::Success
            }
        };
        self.state = LifecycleState::Draining;
        status
    }

    /// Finish profiling, flush logs and hand back the status to exit with.
    pub fn terminate(mut self, status: ExitStatus) -> ExitStatus {
        self.state = LifecycleState::Draining;

        if let Some(mut profiler) = self.profiler.take() {
            if let Err(e) = profiler.stop() {
                tracing::error!("failed to write cpu profile: {}", e);
            }
            if let Err(e) = profiler.write_heap_snapshot() {
                tracing::error!("critical: failed to write heap profile: {}", e);
            }
        }

        self.state = LifecycleState::Terminated;
        tracing::debug!(code = status.code(), "terminating");
        drop(self.log_guard.take());
        status
    }
}
