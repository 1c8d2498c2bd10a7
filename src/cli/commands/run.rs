//! Single-document run.

use std::path::Path;

use docpipe::config::Config;
use docpipe::DocumentReference;

use crate::cli::helpers::build_pipeline;

/// Process one object and print its report as JSON.
pub async fn cmd_run(
    config: &Config,
    container: &str,
    key: &str,
    text_out: Option<&Path>,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let reference = DocumentReference::new(container, key);

    let outcome = pipeline.run(&reference).await;
    println!("{}", serde_json::to_string_pretty(&outcome.report())?);

    if let (Some(path), Some(result)) = (text_out, outcome.result()) {
        tokio::fs::write(path, result.text()).await?;
        tracing::info!("Wrote {} characters to {}", result.char_count(), path.display());
    }

    match outcome.failure_kind() {
        Some(kind) if kind.is_retryable() => {
            anyhow::bail!("{} failed with {} (retryable)", reference, kind)
        }
        Some(kind) => anyhow::bail!("{} failed with {}", reference, kind),
        None => Ok(()),
    }
}
