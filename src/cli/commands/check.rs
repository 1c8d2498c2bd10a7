//! Backend status.

use console::style;
use docpipe::config::{Config, StorageConfig};
use docpipe::FileKind;

use crate::cli::helpers::build_pipeline;

/// Print configured backends and whether the scanner answers.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("docpipe status").bold());
    println!("{}", "-".repeat(50));

    match &config.source_path {
        Some(path) => println!("  {:<15} {}", "Config", path.display()),
        None => println!("  {:<15} {}", "Config", style("defaults").dim()),
    }

    println!("\n{}", style("Storage:").cyan());
    match &config.storage {
        StorageConfig::Local { root } => {
            let status = if root.is_dir() {
                style("✓ found").green()
            } else {
                style("✗ not found").red()
            };
            println!("  {:<15} {} {}", "local", root.display(), status);
        }
        StorageConfig::Http { base_url, .. } => println!("  {:<15} {}", "http", base_url),
    }

    let pipeline = build_pipeline(config)?;

    println!("\n{}", style("Scanner:").cyan());
    let scanner = pipeline.scanner();
    if scanner.is_available().await {
        println!("  {:<15} {}", scanner.name(), style("✓ available").green());
    } else {
        println!("  {:<15} {}", scanner.name(), style("✗ not available").red());
        println!(
            "                  {}",
            style(scanner.availability_hint()).dim()
        );
        println!(
            "  {}",
            style("Every run will fail with SCAN_ERROR until the scanner is reachable").yellow()
        );
    }

    println!("\n{}", style("Extractors:").cyan());
    for kind in [FileKind::Pdf, FileKind::Docx] {
        let status = match pipeline.registry().get(kind) {
            Some(extractor) => style(format!("✓ {}", extractor.name())).green(),
            None => style("✗ none".to_string()).red(),
        };
        println!("  {:<15} {}", kind.as_str(), status);
    }

    println!();
    Ok(())
}
