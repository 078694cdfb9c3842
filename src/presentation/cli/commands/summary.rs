use chrono::Utc;
use colored::Colorize;

use crate::application::services::analysis::AnalysisService;
use crate::domain::entities::traffic::TrafficSummary;
use crate::domain::value_objects::platform::Platform;
use crate::presentation::cli::commands::days_ago;
use crate::presentation::cli::formatters::status_fmt::{format_count, print_section_header};

/// Summarizes the non-anomalous traffic of the last `days` days.
///
/// # Errors
///
/// Returns an error if `days` is zero, storage fails or JSON serialization fails.
pub fn run_summary(
    service: &AnalysisService<'_>,
    platform: Platform,
    days: u32,
    json: bool,
) -> anyhow::Result<TrafficSummary> {
    let start = days_ago(days)?;
    let summary = service.summary(platform, start, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(summary);
    }

    print_section_header(&format!("📊 {platform} summary, last {days} day(s)"));
    if summary.data_points == 0 {
        println!("  {}", "No traffic recorded in this period".dimmed());
        println!();
        return Ok(summary);
    }
    println!("  Data points:        {}", summary.data_points.to_string().bold());
    println!("  Page views:         {}", format_count(summary.total_page_views));
    println!(
        "  Unique visitors:    {}",
        format_count(summary.total_unique_visitors)
    );
    println!("  Sessions:           {}", format_count(summary.total_sessions));
    println!(
        "  Avg session:        {:.0}s",
        summary.avg_session_duration
    );
    println!("  Avg bounce rate:    {:.1}%", summary.avg_bounce_rate);
    println!();
    Ok(summary)
}
