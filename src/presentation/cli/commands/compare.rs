use colored::Colorize;

use crate::application::services::analysis::AnalysisService;
use crate::domain::entities::anomaly::BaselineComparison;
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;
use crate::presentation::cli::formatters::anomaly_fmt::format_comparison_table;
use crate::presentation::cli::formatters::status_fmt::print_section_header;

/// Compares the most recent stored sample with the stored baseline.
///
/// # Errors
///
/// Returns an error if storage fails or JSON serialization fails.
pub fn run_compare(
    service: &AnalysisService<'_>,
    platform: Platform,
    mode: BaselineMode,
    json: bool,
) -> anyhow::Result<Option<BaselineComparison>> {
    let comparison = service.compare_latest(platform, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(comparison);
    }

    match &comparison {
        Some(c) => {
            print_section_header(&format!("⚖️  Latest {platform} sample vs {mode} baseline"));
            println!("{}", format_comparison_table(c));
            println!();
            let verdict = if c.anomaly_detection.is_anomaly {
                format!(
                    "{} (confidence {:.0}%)",
                    c.anomaly_detection.description, c.anomaly_detection.confidence
                )
                .red()
                .bold()
            } else {
                c.anomaly_detection.description.green()
            };
            println!("  {verdict}");
            println!();
        }
        None => {
            println!();
            println!(
                "{}",
                format!("⚠️  Need both a {platform} sample and a {mode} baseline to compare")
                    .yellow()
            );
            println!();
        }
    }
    Ok(comparison)
}
