use colored::{ColoredString, Colorize};

/// Renders a 0–100 confidence score as a bar, greener the more certain.
#[must_use]
pub fn confidence_bar(value: f64, width: usize) -> String {
    let ratio = (value / 100.0).clamp(0.0, 1.0);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let bar_filled = "█".repeat(filled);
    let bar_empty = "░".repeat(empty);

    let colored_bar = if value >= 90.0 {
        bar_filled.green().bold()
    } else if value >= 50.0 {
        bar_filled.yellow()
    } else {
        bar_filled.dimmed()
    };

    format!("{colored_bar}{bar_empty}")
}

/// Signed percentage change, red beyond ±50%, yellow beyond ±20%.
#[must_use]
pub fn colorize_change(rate: f64) -> ColoredString {
    let text = format!("{rate:+.1}%");
    let magnitude = rate.abs();
    if magnitude >= 50.0 {
        text.red().bold()
    } else if magnitude >= 20.0 {
        text.yellow()
    } else {
        text.green()
    }
}

/// Signed deviation in standard deviations, red past the detection threshold.
#[must_use]
pub fn colorize_deviation(deviation: f64, threshold: f64) -> ColoredString {
    let text = format!("{deviation:+.2}σ");
    if deviation.abs() > threshold {
        text.red().bold()
    } else {
        text.normal()
    }
}

/// Large counts with thousands separators, no decimals.
#[must_use]
pub fn format_count(value: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn print_section_header(title: &str) {
    println!("{}", title.bold().cyan());
    let display_width = title.chars().count();
    println!("{}", "─".repeat(display_width).cyan());
}
