use colored::Colorize;

use crate::application::services::analysis::AnalysisService;
use crate::domain::entities::baseline::Baseline;
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::metric::Metric;
use crate::domain::value_objects::platform::Platform;
use crate::presentation::cli::commands::days_ago;
use crate::presentation::cli::formatters::status_fmt::{confidence_bar, print_section_header};

/// Recomputes and stores the baseline from the last `days` days of history.
///
/// # Errors
///
/// Returns an error if `days` is zero, storage fails or JSON serialization fails.
pub fn run_baseline(
    service: &AnalysisService<'_>,
    platform: Platform,
    mode: BaselineMode,
    days: u32,
    aggregate: bool,
    json: bool,
) -> anyhow::Result<Option<Baseline>> {
    let since = days_ago(days)?;
    let baseline = service.refresh_baseline(platform, mode, since, aggregate)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&baseline)?);
        return Ok(baseline);
    }

    match &baseline {
        Some(b) => print_baseline_human(b),
        None => {
            println!();
            println!(
                "{}",
                format!("⚠️  Not enough {platform} history for a {mode} baseline").yellow()
            );
            println!();
        }
    }
    Ok(baseline)
}

fn print_baseline_human(baseline: &Baseline) {
    print_section_header(&format!(
        "📐 {} baseline for {}",
        baseline.mode, baseline.platform
    ));
    println!(
        "  Period: {} → {}",
        baseline.period.start.format("%Y-%m-%d"),
        baseline.period.end.format("%Y-%m-%d")
    );
    println!("  Samples: {}", baseline.sample_size.to_string().bold());
    println!(
        "  Confidence: {} {:.0}%",
        confidence_bar(baseline.confidence, 20),
        baseline.confidence
    );
    println!();

    println!(
        "  {:<22} {:>12} {:>10} {:>12} {:>12}",
        "METRIC".dimmed(),
        "MEAN".dimmed(),
        "STDDEV".dimmed(),
        "LOWER".dimmed(),
        "UPPER".dimmed()
    );
    for metric in Metric::ALL {
        let lower = baseline.anomaly_threshold.lower.get(metric);
        let upper = baseline.anomaly_threshold.upper.get(metric);
        println!(
            "  {:<22} {:>12.1} {:>10.1} {:>12} {:>12}",
            metric.as_str(),
            baseline.mean(metric),
            baseline.stddev(metric),
            lower.map_or_else(|| "-".to_string(), |v| format!("{v:.1}")),
            upper.map_or_else(|| "-".to_string(), |v| format!("{v:.1}")),
        );
    }
    println!();
}
