//! Shared helper functions for CLI commands.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tokio::io::AsyncReadExt;

use docpipe::config::Config;
use docpipe::{DocumentReference, ExtractorRegistry, Pipeline, PipelineReport};

/// Load config from `path` or by discovery, then apply env overrides.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Build a pipeline with the configured backends and the default extractors.
pub fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let fetcher = config.storage.build()?;
    let scanner = config.scanner.build();
    Ok(Pipeline::new(
        fetcher,
        scanner,
        ExtractorRegistry::with_defaults(),
        config.pipeline_config(),
    ))
}

/// Read a payload from a file, or from stdin when `source` is `-`.
pub async fn read_payload(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut payload = String::new();
        tokio::io::stdin()
            .read_to_string(&mut payload)
            .await
            .context("Failed to read event from stdin")?;
        Ok(payload)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read event file {}", source))
    }
}

/// One output line of the `event` command.
#[derive(Debug, Serialize)]
pub struct RecordReport<'a> {
    pub container: &'a str,
    pub key: &'a str,
    pub report: PipelineReport,
}

impl<'a> RecordReport<'a> {
    pub fn new(reference: &'a DocumentReference, report: PipelineReport) -> Self {
        Self {
            container: reference.container_id(),
            key: reference.object_key(),
            report,
        }
    }
}
