use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use colored::Colorize;

use crate::application::services::report::{ReportService, TrafficReport};
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::presentation::cli::commands::days_ago;
use crate::presentation::cli::formatters::anomaly_fmt::{
    format_comparison_table, format_direction, print_anomalies,
};
use crate::presentation::cli::formatters::status_fmt::{
    colorize_change, format_count, print_section_header,
};

/// Generates a cross-platform report of the last `days` days.
///
/// With `output` set, the JSON report is also written to that file.
///
/// # Errors
///
/// Returns an error if `days` is zero, storage fails, JSON serialization
/// fails or the output file cannot be written.
pub fn run_report(
    service: &ReportService<'_>,
    mode: BaselineMode,
    days: u32,
    json: bool,
    output: Option<&Path>,
) -> anyhow::Result<TrafficReport> {
    let start = days_ago(days)?;
    let report = service.generate(mode, start, Utc::now())?;

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "report exported");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report_human(&report, days);
        if let Some(path) = output {
            println!("📄 Report written to {}", path.display());
        }
    }
    Ok(report)
}

fn print_report_human(report: &TrafficReport, days: u32) {
    println!("{}", report.title.bold().cyan());
    println!("{}", "━".repeat(50));
    println!(
        "  {} → {} ({days} day(s), {} baselines)",
        report.period_start.format("%Y-%m-%d"),
        report.period_end.format("%Y-%m-%d"),
        report.mode
    );
    println!();

    let overview = &report.overview;
    print_section_header("📈 Overview");
    println!("  Platforms:          {}", overview.platform_count);
    println!("  Page views:         {}", format_count(overview.total_page_views));
    println!(
        "  Unique visitors:    {}",
        format_count(overview.total_unique_visitors)
    );
    println!("  Sessions:           {}", format_count(overview.total_sessions));
    println!("  Avg bounce rate:    {:.1}%", overview.avg_bounce_rate);
    let quality = format!("{:.0}/100", overview.data_quality);
    let quality = if overview.data_quality < 80.0 {
        quality.yellow()
    } else {
        quality.green()
    };
    println!("  Data quality:       {quality}");
    println!();

    if !report.trends.is_empty() {
        print_section_header("🧭 Trends");
        for trend in &report.trends {
            println!(
                "  {:<10} {:<10} {:>8}  {}",
                trend.platform.as_str(),
                format_direction(trend.direction),
                colorize_change(trend.change_rate).to_string(),
                trend.description.dimmed()
            );
        }
        println!();
    }

    if let Some(comparisons) = report.baseline_comparisons.as_ref().filter(|c| !c.is_empty()) {
        for entry in comparisons {
            print_section_header(&format!("⚖️  {} vs {} baseline", entry.platform, report.mode));
            println!("{}", format_comparison_table(&entry.comparison));
            println!();
        }
    }

    if let Some(anomalies) = &report.anomalies {
        print_section_header(&format!("🚨 Anomalies ({})", anomalies.len()));
        if anomalies.is_empty() {
            println!("  {}", "None detected".green());
            println!();
        } else {
            print_anomalies(anomalies);
        }
    }

    if let Some(recommendations) = &report.recommendations {
        print_section_header("💡 Recommendations");
        for line in recommendations {
            println!("  • {line}");
        }
        println!();
    }
}
