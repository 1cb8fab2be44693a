use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::alloc::heap_stats;

/// CPU profile written in debug mode.
pub const CPU_PROFILE: &str = "cpu.prof";
/// Heap snapshot written in debug mode.
pub const HEAP_PROFILE: &str = "ipfs.mprof";

/// CPU sampling frequency, in Hz.
const SAMPLE_FREQUENCY: i32 = 100;

/// Profiling started before a command runs and finished at termination.
pub trait Profiler {
    /// Stop sampling and write the CPU profile. Later calls do nothing.
    fn stop(&mut self) -> Result<(), ProfilingError>;

    fn write_heap_snapshot(&mut self) -> Result<(), ProfilingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfilingError {
    #[error("profile io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(unix)]
    #[error("cpu profiler error: {0}")]
    Pprof(#[from] pprof::Error),
    #[error("cpu profiling is not supported on this platform")]
    Unsupported,
}

/// Write the allocation counters to `path`.
pub fn write_heap_snapshot(path: &Path) -> Result<(), ProfilingError> {
    let mut file = File::create(path)?;
    file.write_all(heap_stats().render().as_bytes())?;
    file.sync_all()?;
    tracing::debug!(path = %path.display(), "wrote heap profile");
    Ok(())
}

/// Samples the process with `pprof` and writes a protobuf profile.
#[cfg(unix)]
pub struct CpuProfiler {
    guard: Option<pprof::ProfilerGuard<'static>>,
    cpu_file: Option<File>,
    dir: PathBuf,
}

#[cfg(unix)]
impl CpuProfiler {
    /// Create `cpu.prof` in `dir` and begin sampling.
    pub fn start(dir: &Path) -> Result<Self, ProfilingError> {
        let cpu_file = File::create(dir.join(CPU_PROFILE))?;
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(SAMPLE_FREQUENCY)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()?;

        tracing::debug!(dir = %dir.display(), "cpu profiling started");
        Ok(Self {
            guard: Some(guard),
            cpu_file: Some(cpu_file),
            dir: dir.to_path_buf(),
        })
    }
}

#[cfg(unix)]
impl Profiler for CpuProfiler {
    fn stop(&mut self) -> Result<(), ProfilingError> {
        use pprof::protos::Message;

        let (Some(guard), Some(mut cpu_file)) = (self.guard.take(), self.cpu_file.take()) else {
            return Ok(());
        };

        let report = guard.report().build()?;
        // sampling ends once the guard is gone
        drop(guard);

        let profile = report.pprof()?;
        cpu_file.write_all(&profile.encode_to_vec())?;
        cpu_file.sync_all()?;
        tracing::debug!(dir = %self.dir.display(), "wrote cpu profile");
        Ok(())
    }

    fn write_heap_snapshot(&mut self) -> Result<(), ProfilingError> {
        write_heap_snapshot(&self.dir.join(HEAP_PROFILE))
    }
}

/// Start the platform's CPU profiler writing into `dir`.
pub fn start_cpu_profiler(dir: &Path) -> Result<Box<dyn Profiler>, ProfilingError> {
    #[cfg(unix)]
    {
        Ok(Box::new(CpuProfiler::start(dir)?))
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
        Err(ProfilingError::Unsupported)
    }
}
