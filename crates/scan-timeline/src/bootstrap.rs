use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.scan-timeline/` exists.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

/// Create `<base>/.scan-timeline/` including any missing parents.
pub fn ensure_directories_in(base: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(base.join(".scan-timeline"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` uses the CLI spelling (`DEBUG`, `INFO`, `WARNING`, `ERROR`,
/// `CRITICAL`). Unknown strings fall back to `"info"`. Output goes to stderr
/// so that reports on stdout stay machine-readable. When `log_file` is set,
/// the same events are also appended to that file without ANSI colours.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(tracing_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let file_subscriber = match log_file {
        Some(path) => Some(file_layer(open_log_file(path)?)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .with(file_subscriber)
        .init();

    Ok(())
}

type FileLayer<S> = fmt::Layer<S, DefaultFields, Format, Mutex<File>>;

/// Plain-text `fmt` layer writing to `file`.
fn file_layer<S>(file: File) -> FileLayer<S> {
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
}

/// Open `path` for appending, creating it and its parent directories.
fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

/// Map CLI log-level names to `tracing` directives.
fn tracing_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

// ── Input discovery ────────────────────────────────────────────────────────────

/// Locate an event log when none was given on the command line.
///
/// Checks, relative to `base`:
/// 1. `events.jsonl`
/// 2. `public/events.jsonl`
pub fn discover_events_file(base: &Path) -> Option<PathBuf> {
    let candidates = [
        base.join("events.jsonl"),
        base.join("public").join("events.jsonl"),
    ];
    candidates.into_iter().find(|p| p.is_file())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories_in() {
        let tmp = TempDir::new().expect("tempdir");
        ensure_directories_in(tmp.path()).expect("ensure_directories_in");
        assert!(tmp.path().join(".scan-timeline").is_dir());
        // Idempotent.
        ensure_directories_in(tmp.path()).expect("second call");
    }

    #[test]
    fn test_tracing_directive() {
        assert_eq!(tracing_directive("DEBUG"), "debug");
        assert_eq!(tracing_directive("info"), "info");
        assert_eq!(tracing_directive("WARNING"), "warn");
        assert_eq!(tracing_directive("CRITICAL"), "error");
        assert_eq!(tracing_directive("TRACE"), "trace");
    }

    #[test]
    fn test_discover_events_file_none_when_absent() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(discover_events_file(tmp.path()).is_none());
    }

    #[test]
    fn test_discover_events_file_prefers_root_jsonl() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("public")).unwrap();
        std::fs::write(tmp.path().join("public").join("events.jsonl"), "").unwrap();
        std::fs::write(tmp.path().join("events.jsonl"), "").unwrap();

        assert_eq!(
            discover_events_file(tmp.path()),
            Some(tmp.path().join("events.jsonl"))
        );
    }

    #[test]
    fn test_discover_events_file_public_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let public = tmp.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("events.jsonl"), "").unwrap();
        std::fs::write(tmp.path().join("events.json"), "[]").unwrap();

        assert_eq!(
            discover_events_file(tmp.path()),
            Some(public.join("events.jsonl"))
        );
    }

    #[test]
    fn test_discover_events_file_skips_json_array_files() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::write(tmp.path().join("events.json"), "[]").unwrap();
        assert!(discover_events_file(tmp.path()).is_none());
    }

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("logs").join("nested").join("scan-timeline.log");
        open_log_file(&path).expect("open_log_file");
        assert!(path.is_file());
    }

    #[test]
    fn test_file_layer_writes_events_without_ansi() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("scan-timeline.log");
        let layer = file_layer(open_log_file(&path).expect("open_log_file"));

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("loaded 3 completed scans");
        });

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert!(contents.contains("loaded 3 completed scans"));
        assert!(contents.contains("INFO"));
        assert!(!contents.contains('\u{1b}'));
    }

    #[test]
    fn test_open_log_file_appends() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("scan-timeline.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let layer = file_layer(open_log_file(&path).expect("open_log_file"));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || tracing::warn!("second run"));

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert!(contents.starts_with("earlier run\n"));
        assert!(contents.contains("second run"));
    }

    #[test]
    fn test_discover_events_file_ignores_directories() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("events.jsonl")).unwrap();
        assert!(discover_events_file(tmp.path()).is_none());
    }
}
