use anyhow::Context;
use colored::Colorize;

use crate::domain::ports::store::TrafficStore;
use crate::presentation::cli::commands::days_ago;

/// Deletes samples recorded more than `days` days ago.
///
/// # Errors
///
/// Returns an error if `days` is zero or the deletion fails.
pub fn run_cleanup(store: &dyn TrafficStore, days: u32) -> anyhow::Result<usize> {
    let cutoff = days_ago(days)?;
    let removed = store
        .delete_samples_before(cutoff)
        .context("Failed to delete old samples")?;
    tracing::info!(removed, %cutoff, "old samples deleted");
    println!(
        "🧹 Removed {} sample(s) older than {days} day(s)",
        removed.to_string().bold()
    );
    Ok(removed)
}
