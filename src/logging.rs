//! Structured logging setup.
//!
//! Replaces the original's bespoke `TeeStream` (stdout/stderr duplicated
//! into a per-run log file) with a `tracing-subscriber` registry that
//! fans out to the terminal and to `crawl.log` under the run directory,
//! following the pattern in
//! `cleanappio-cleanapp_back_end_v2/report-listener-v4/src/main.rs`.

use std::path::Path;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber: an `EnvFilter` (`RUST_LOG`,
/// defaulting to `info`), a terminal layer, and a non-ANSI file layer
/// writing to `run_dir/crawl.log`.
///
/// Returns the file appender's guard; dropping it flushes any buffered
/// lines, so callers must keep it alive for the process lifetime.
pub fn init(run_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(run_dir, "crawl.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    guard
}
