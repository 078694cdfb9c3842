use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use crate::domain::entities::traffic::TrafficSample;
use crate::domain::ports::store::TrafficStore;
use crate::domain::value_objects::platform::Platform;
use crate::infrastructure::collectors::json_file_collector::read_records;
use crate::presentation::cli::formatters::status_fmt::print_section_header;

/// Imports a JSON export, standardizing every record before storing it.
///
/// Returns the number of stored samples.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or saving fails.
pub async fn run_import(path: &Path, store: &dyn TrafficStore) -> anyhow::Result<usize> {
    let records = read_records(path)
        .await
        .with_context(|| format!("Failed to import {}", path.display()))?;
    let samples: Vec<TrafficSample> = records.into_iter().map(TrafficSample::from).collect();

    store
        .save_samples(&samples)
        .context("Failed to save imported samples")?;

    let mut by_platform: BTreeMap<Platform, usize> = BTreeMap::new();
    for sample in &samples {
        *by_platform.entry(sample.platform).or_insert(0) += 1;
    }
    let low_quality = samples.iter().filter(|s| s.is_low_quality()).count();
    tracing::info!(file = %path.display(), samples = samples.len(), "import finished");

    print_section_header(&format!("📄 Imported {}", path.display()));
    for (platform, count) in &by_platform {
        println!("  {platform:<12} {}", count.to_string().bold());
    }
    if low_quality > 0 {
        println!("  {}", format!("Low quality samples: {low_quality}").yellow());
    }
    println!();

    Ok(samples.len())
}
