use anyhow::Context;
use colored::Colorize;

use crate::domain::ports::store::{StorageStats, TrafficStore};
use crate::presentation::cli::formatters::status_fmt::{format_count, print_section_header};

/// Shows what the store currently holds.
///
/// # Errors
///
/// Returns an error if the store query fails or JSON serialization fails.
pub fn run_status(store: &dyn TrafficStore, json: bool) -> anyhow::Result<StorageStats> {
    let stats = store.stats().context("Failed to read storage statistics")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(stats);
    }

    println!("{}", "trafficwatch status".bold().cyan());
    println!("{}", "━".repeat(50));
    println!();

    print_section_header("🗄️  Storage");
    #[allow(clippy::cast_precision_loss)]
    let total = stats.total_samples as f64;
    println!("  Samples:    {}", format_count(total).bold());
    println!("  Baselines:  {}", stats.total_baselines);
    match (stats.oldest_sample, stats.newest_sample) {
        (Some(oldest), Some(newest)) => println!(
            "  Span:       {} → {}",
            oldest.format("%Y-%m-%d %H:%M"),
            newest.format("%Y-%m-%d %H:%M")
        ),
        _ => println!("  {}", "No traffic stored yet".dimmed()),
    }
    println!();

    if !stats.samples_by_platform.is_empty() {
        print_section_header("📦 Samples per platform");
        for (platform, count) in &stats.samples_by_platform {
            println!("  {:<10} {count:>8}", platform.as_str());
        }
        println!();
    }

    Ok(stats)
}
