use colored::Colorize;

use crate::application::services::analysis::{AnalysisService, ScanReport};
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;
use crate::presentation::cli::commands::days_ago;
use crate::presentation::cli::formatters::anomaly_fmt::{
    print_anomalies, print_no_anomalies, print_trends,
};
use crate::presentation::cli::formatters::status_fmt::print_section_header;

/// Checks the last `days` days against the stored baseline and for level shifts.
///
/// # Errors
///
/// Returns an error if `days` is zero, storage fails or JSON serialization fails.
pub fn run_detect(
    service: &AnalysisService<'_>,
    platform: Platform,
    mode: BaselineMode,
    days: u32,
    json: bool,
) -> anyhow::Result<ScanReport> {
    let since = days_ago(days)?;
    let report = service.scan(platform, mode, since)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report_human(&report, days);
    }
    Ok(report)
}

fn print_report_human(report: &ScanReport, days: u32) {
    print_section_header(&format!(
        "🔍 {} traffic, last {days} day(s)",
        report.platform
    ));
    println!("  Samples checked: {}", report.samples_checked);
    if report.baseline.is_none() {
        println!(
            "  {}",
            format!(
                "No {} baseline stored, run `trafficwatch baseline` first",
                report.mode
            )
            .yellow()
        );
    }

    if report.anomalies.is_empty() && report.trends.is_empty() {
        print_no_anomalies();
        return;
    }
    println!();

    if !report.anomalies.is_empty() {
        println!(
            "{}",
            format!("Anomalies ({})", report.anomalies.len())
                .bold()
                .underline()
        );
        print_anomalies(&report.anomalies);
    }
    if !report.trends.is_empty() {
        println!(
            "{}",
            format!("Level shifts ({})", report.trends.len())
                .bold()
                .underline()
        );
        print_trends(&report.trends);
    }
}
