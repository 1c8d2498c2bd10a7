//! Notification-driven batch run.

use docpipe::config::Config;
use docpipe::event::parse_event;

use crate::cli::helpers::{build_pipeline, read_payload, RecordReport};

/// Parse a notification, run every record and print one JSON line each.
pub async fn cmd_event(
    config: &Config,
    source: &str,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let payload = read_payload(source).await?;
    let references = parse_event(&payload)?;
    let pipeline = build_pipeline(config)?;
    let concurrency = concurrency.unwrap_or(config.batch_concurrency);

    tracing::info!(
        "Processing {} record(s) with concurrency {}",
        references.len(),
        concurrency
    );
    let outcomes = pipeline.run_batch(&references, concurrency).await;

    let mut failed = 0usize;
    for (reference, outcome) in references.iter().zip(&outcomes) {
        if !outcome.is_success() {
            failed += 1;
        }
        let line = RecordReport::new(reference, outcome.report());
        println!("{}", serde_json::to_string(&line)?);
    }

    if failed > 0 {
        anyhow::bail!("{} of {} record(s) failed", failed, outcomes.len());
    }
    Ok(())
}
