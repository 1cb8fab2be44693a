use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize logging to stderr and the panic logger.
///
/// Warnings and errors are shown by default, everything from debug up with
/// `--debug`; `RUST_LOG` overrides both. The returned guard must outlive
/// the last log line. Installing a subscriber twice is a no-op.
pub fn init(debug: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let default_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter);

    if tracing_subscriber::registry().with(layer).try_init().is_ok() {
        register_panic_logger();
        report_build_info();
    }

    guard
}

/// Registers a panic hook that logs panics using the `tracing` crate.
///
/// The previously installed hook still runs afterwards, so the panic reaches
/// stderr even when the process aborts before the log worker flushes.
pub fn register_panic_logger() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        match panic.location() {
            Some(loc) => {
                tracing::error!(
                    message = %panic,
                    panic.file = loc.file(),
                    panic.line = loc.line(),
                    panic.column = loc.column(),
                );
            }
            None => tracing::error!(message = %panic),
        }
        previous(panic);
    }));
}

fn report_build_info() {
    let build = common::prelude::build_info();

    tracing::debug!(
        build_profile = build.build_profile,
        version = build.version,
        rust_version = build.rust_version,
        "ipfs starting up"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_panic_logger_keeps_previous_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        std::panic::set_hook(Box::new(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        }));

        register_panic_logger();
        let result = std::panic::catch_unwind(|| panic!("boom"));
        // back to the default hook
        drop(std::panic::take_hook());

        assert!(result.is_err());
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }
}
