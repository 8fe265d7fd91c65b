//! View session holding the last successfully loaded dataset.
//!
//! A [`ScanSession`] owns one analysed event log plus the current
//! [`ViewConfig`]. Ingestion is all-or-nothing: a failed load records the
//! error and leaves the previous dataset in place, so a presentation layer
//! never sees half-applied state. Changing the view re-filters the cached
//! scans without re-reading the file.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use timeline_core::error::{Result, TimelineError};
use timeline_core::models::{
    CompletedScan, GroupingReport, RequestThroughput, Statistics, ViewConfig,
};
use timeline_data::analysis::{analyze_text, AnalysisResult};
use timeline_data::reader::InputFormat;

// ── TimelineSnapshot ──────────────────────────────────────────────────────────

/// What a presentation layer renders for the current view.
///
/// `scans` is the filtered selection; `statistics` and `throughput` always
/// describe the complete dataset.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineSnapshot {
    #[serde(rename = "file")]
    pub source: Option<String>,
    pub view: ViewConfig,
    pub scans: Vec<CompletedScan>,
    pub statistics: Statistics,
    pub throughput: RequestThroughput,
    pub report: GroupingReport,
}

// ── ScanSession ───────────────────────────────────────────────────────────────

/// In-memory state for one view session.
///
/// # Example
/// ```no_run
/// use timeline_runtime::session::ScanSession;
/// use timeline_core::models::ViewConfig;
///
/// # async fn demo() -> timeline_core::Result<()> {
/// let mut session = ScanSession::new(ViewConfig::default());
/// session.ingest_file("events.jsonl".as_ref()).await?;
/// if let Some(snapshot) = session.snapshot() {
///     println!("{} completed scans", snapshot.statistics.count);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ScanSession {
    /// Display selection applied by [`ScanSession::snapshot`].
    view: ViewConfig,
    /// Most recent successful analysis.
    dataset: Option<AnalysisResult>,
    /// When `dataset` was loaded.
    loaded_at: Option<Instant>,
    /// Message of the last failed ingestion, cleared on success.
    last_error: Option<String>,
}

impl ScanSession {
    pub fn new(view: ViewConfig) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }

    // ── Ingestion ─────────────────────────────────────────────────────────

    /// Read, parse and analyse the event log at `path`.
    ///
    /// The extension is validated before any I/O. The file is read
    /// asynchronously; parsing and grouping run synchronously afterwards.
    /// Read failures surface as [`TimelineError::FileRead`].
    pub async fn ingest_file(&mut self, path: &Path) -> Result<&AnalysisResult> {
        let outcome = load_and_analyze(path).await;
        self.commit(outcome)
    }

    /// Analyse text that was already read, using `file_name` to pick the
    /// format.
    pub fn ingest_str(&mut self, file_name: &str, text: &str) -> Result<&AnalysisResult> {
        let outcome = analyze_text(Path::new(file_name), text, 0.0);
        self.commit(outcome)
    }

    // ── View ──────────────────────────────────────────────────────────────

    /// Replace the view selection. The dataset is not reloaded.
    pub fn set_view(&mut self, view: ViewConfig) {
        tracing::debug!(top_n = %view.top_n, prefix = %view.path_prefix, "view updated");
        self.view = view;
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    /// The current view over the loaded dataset, or `None` before the first
    /// successful ingestion.
    pub fn snapshot(&self) -> Option<TimelineSnapshot> {
        let dataset = self.dataset.as_ref()?;
        Some(TimelineSnapshot {
            source: dataset.metadata.source.clone(),
            view: self.view.clone(),
            scans: dataset.view(&self.view),
            statistics: dataset.statistics.clone(),
            throughput: dataset.throughput.clone(),
            report: dataset.report.clone(),
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn dataset(&self) -> Option<&AnalysisResult> {
        self.dataset.as_ref()
    }

    /// Age of the loaded dataset, or `None` if nothing has been loaded.
    pub fn dataset_age(&self) -> Option<Duration> {
        self.loaded_at.map(|ts| ts.elapsed())
    }

    /// Message of the last failed ingestion, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Drop the loaded dataset and any recorded error.
    pub fn clear(&mut self) {
        self.dataset = None;
        self.loaded_at = None;
        self.last_error = None;
        tracing::debug!("session cleared");
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Swap in a successful result, or record the failure and keep the
    /// previous dataset.
    fn commit(&mut self, outcome: Result<AnalysisResult>) -> Result<&AnalysisResult> {
        match outcome {
            Ok(result) => {
                tracing::debug!(
                    completed = result.statistics.count,
                    incomplete = result.report.incomplete_scans,
                    "dataset replaced"
                );
                self.loaded_at = Some(Instant::now());
                self.last_error = None;
                Ok(&*self.dataset.insert(result))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept_previous = self.dataset.is_some(),
                    "ingestion failed"
                );
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// Read `path` asynchronously and run it through the analysis pipeline.
///
/// The extension is validated before any I/O.
async fn load_and_analyze(path: &Path) -> Result<AnalysisResult> {
    InputFormat::from_path(path)?;

    let load_start = Instant::now();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TimelineError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    analyze_text(path, &text, load_start.elapsed().as_secs_f64())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
