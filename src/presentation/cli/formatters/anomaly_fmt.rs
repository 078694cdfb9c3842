use colored::Colorize;

use super::status_fmt::{colorize_change, colorize_deviation, format_count};
use crate::domain::engines::anomaly::DEVIATION_THRESHOLD;
use crate::domain::entities::anomaly::{BaselineComparison, BatchAnomaly, TrendEvent};
use crate::domain::value_objects::anomaly_kind::{AnomalyType, Direction, TrendDirection};
use crate::domain::value_objects::metric::Metric;

fn anomaly_badge(kind: AnomalyType) -> String {
    let label = format!(" {} ", kind.to_string().to_uppercase());
    match kind {
        AnomalyType::Spike => format!("{}", label.on_red().white().bold()),
        AnomalyType::Drop => format!("{}", label.on_blue().white().bold()),
        AnomalyType::Pattern => format!("{}", label.on_yellow().black()),
    }
}

fn trend_arrow(trend: TrendDirection) -> String {
    match trend {
        TrendDirection::SuddenIncrease => format!("{}", "▲".red().bold()),
        TrendDirection::SuddenDecrease => format!("{}", "▼".blue().bold()),
    }
}

/// Arrow and label for a platform's period-over-period movement.
#[must_use]
pub fn format_direction(direction: Direction) -> String {
    match direction {
        Direction::Up => format!("{}", "↑ up".green().bold()),
        Direction::Down => format!("{}", "↓ down".red().bold()),
        Direction::Stable => format!("{}", "→ stable".dimmed()),
    }
}

/// One line per flagged sample: time, badge, deviation, confidence and description.
#[must_use]
pub fn format_anomaly_line(anomaly: &BatchAnomaly) -> String {
    let time = anomaly.sample.timestamp.format("%Y-%m-%d %H:%M");
    let badge = anomaly
        .result
        .anomaly_type
        .map_or_else(String::new, anomaly_badge);
    format!(
        "{time}  {badge} {:>6.2}σ  {:>5.1}%  {}",
        anomaly.result.deviation,
        anomaly.result.confidence,
        anomaly.result.description
    )
}

#[must_use]
pub fn format_trend_line(event: &TrendEvent) -> String {
    format!(
        "{}  {} {}  {} → {}  ({})",
        event.timestamp.format("%Y-%m-%d %H:%M"),
        trend_arrow(event.trend),
        event.trend,
        format_count(event.mean_before),
        format_count(event.mean_after),
        colorize_change(event.magnitude * 100.0),
    )
}

/// Aligned table of current value, baseline mean, change and deviation per metric.
#[must_use]
pub fn format_comparison_table(comparison: &BaselineComparison) -> String {
    let header = format!(
        "{:<22} {:>12} {:>12} {:>10} {:>9}",
        "METRIC", "CURRENT", "BASELINE", "CHANGE", "DEV"
    );
    let separator = "─".repeat(header.chars().count());
    let mut rows = vec![header, separator];

    for metric in Metric::ALL {
        let flagged = comparison.anomaly_detection.anomalous_metrics.contains(&metric);
        let name = if flagged {
            format!("{:<22}", metric.as_str()).red().bold().to_string()
        } else {
            format!("{:<22}", metric.as_str())
        };
        rows.push(format!(
            "{name} {:>12.1} {:>12.1} {:>10} {:>9}",
            comparison.current.get(metric),
            comparison.baseline.get(metric),
            colorize_change(comparison.change_rate.get(metric)).to_string(),
            colorize_deviation(comparison.deviation.get(metric), DEVIATION_THRESHOLD).to_string(),
        ));
    }

    rows.join("\n")
}

pub fn print_anomalies(anomalies: &[BatchAnomaly]) {
    for anomaly in anomalies {
        println!("  {}", format_anomaly_line(anomaly));
    }
    println!();
}

pub fn print_trends(trends: &[TrendEvent]) {
    for event in trends {
        println!("  {}", format_trend_line(event));
    }
    println!();
}

pub fn print_no_anomalies() {
    println!();
    println!("{}", "✅ Traffic within normal range".green().bold());
    println!();
}
