mod bootstrap;
mod report;

use anyhow::{Context, Result};
use timeline_core::settings::Settings;
use timeline_core::time_utils::TimezoneHandler;
use timeline_runtime::session::ScanSession;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("scan-timeline v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Top-N: {}, Path prefix: {:?}, Output: {}, Timezone: {}",
        settings.top_n,
        settings.path_prefix,
        settings.output,
        settings.timezone
    );

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let path = match settings.file.clone() {
        Some(p) => p,
        None => bootstrap::discover_events_file(&cwd).context(
            "no input file given and no events.jsonl found in ./ or ./public/",
        )?,
    };

    let mut session = ScanSession::new(settings.view_config());
    session
        .ingest_file(&path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))?;

    let snapshot = session
        .snapshot()
        .context("no dataset available after ingestion")?;

    let rendered = match settings.output.as_str() {
        "json" => report::render_json(&snapshot)?,
        _ => report::render_text(&snapshot, &TimezoneHandler::new(&settings.timezone)),
    };
    println!("{}", rendered);

    Ok(())
}
