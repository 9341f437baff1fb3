//! Logging and tracing configuration
//!
//! Driver actions emit `tracing` events; these helpers install a subscriber
//! for a scenario run. Level is controlled by `RUST_LOG`.

use std::path::{Path, PathBuf};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::paths;

const DEFAULT_FILTER: &str = "shape_driver=info,warn";

/// Initialize tracing to stderr
///
/// Default level is INFO for this crate, WARN for dependencies.
/// Does nothing if a subscriber is already installed.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

/// Initialize tracing to stderr plus a run transcript file
///
/// The transcript goes to `dir/<name>.log`, or the platform log directory
/// (`~/.local/share/shape-driver/logs` on Linux) when `dir` is `None`.
/// Returns the transcript path, or `None` if only stderr logging could be
/// set up.
pub fn init_with_transcript(dir: Option<&Path>, name: &str) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shape_driver=debug,info"));

    let dir = match dir {
        Some(d) => std::fs::create_dir_all(d).ok().map(|_| d.to_path_buf()),
        None => paths::ensure_log_dir().ok().flatten(),
    };

    if let Some(dir) = dir {
        let log_file = dir.join(format!("{}.log", name));
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => {
                let file_layer = fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE);

                let stderr_layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .compact();

                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .with(stderr_layer)
                    .try_init();

                return Some(log_file);
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file: {}", e);
            }
        }
    }

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_with_transcript(Some(dir.path()), "poi-create-color").unwrap();
        assert_eq!(path, dir.path().join("poi-create-color.log"));
        assert!(path.exists());

        // A second call must not panic even though a subscriber is installed
        init();
    }
}
