use clap::Parser;
use tracing_subscriber::EnvFilter;

use trafficwatch::application::config::AppConfig;
use trafficwatch::application::services::analysis::AnalysisService;
use trafficwatch::application::services::collection::RetryPolicy;
use trafficwatch::application::services::report::ReportService;
use trafficwatch::domain::engines::BaselineEngine;
use trafficwatch::infrastructure::collectors::mock_collector::MockCollector;
use trafficwatch::infrastructure::persistence::sqlite_store::SqliteStore;
use trafficwatch::presentation::cli::app::{Cli, Commands};
use trafficwatch::presentation::cli::commands::baseline::run_baseline;
use trafficwatch::presentation::cli::commands::cleanup::run_cleanup;
use trafficwatch::presentation::cli::commands::collect::run_collect;
use trafficwatch::presentation::cli::commands::compare::run_compare;
use trafficwatch::presentation::cli::commands::detect::run_detect;
use trafficwatch::presentation::cli::commands::import::run_import;
use trafficwatch::presentation::cli::commands::report::run_report;
use trafficwatch::presentation::cli::commands::status::run_status;
use trafficwatch::presentation::cli::commands::summary::run_summary;

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &AppConfig) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::new(&config.database.path)?;
    match store.cleanup_old(config.database.retention_days) {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "expired samples removed"),
        Err(e) => tracing::warn!("failed to remove expired samples: {e}"),
    }
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        AppConfig::load_from(path)?
    } else {
        AppConfig::load()?
    };

    // Manual DI: main.rs is the only place that knows concrete types
    let store = open_store(&config)?;
    let engine = BaselineEngine::new(config.baseline.clone());
    let default_mode = engine.config().mode;
    let trend_window = config.detection.trend_window_size;
    let service = AnalysisService::new(&store, &store, &engine, trend_window);

    match cli.command {
        Commands::Collect {
            platform,
            days,
            anomalies,
            seed,
        } => {
            let mut source = MockCollector::new(platform).with_anomalies(anomalies);
            if let Some(seed) = seed {
                source = source.with_seed(seed);
            }
            let policy = RetryPolicy::from(&config.collector);
            run_collect(&source, &store, &policy, days).await?;
        }
        Commands::Import { file } => {
            run_import(&file, &store).await?;
        }
        Commands::Baseline {
            platform,
            mode,
            days,
            aggregate,
            json,
        } => {
            run_baseline(
                &service,
                platform,
                mode.unwrap_or(default_mode),
                days,
                aggregate,
                json,
            )?;
        }
        Commands::Detect {
            platform,
            mode,
            days,
            window,
            json,
        } => {
            let trend_window = window.unwrap_or(trend_window);
            let service = AnalysisService::new(&store, &store, &engine, trend_window);
            run_detect(&service, platform, mode.unwrap_or(default_mode), days, json)?;
        }
        Commands::Compare {
            platform,
            mode,
            json,
        } => {
            run_compare(&service, platform, mode.unwrap_or(default_mode), json)?;
        }
        Commands::Summary {
            platform,
            days,
            json,
        } => {
            run_summary(&service, platform, days, json)?;
        }
        Commands::Report {
            mode,
            days,
            json,
            output,
        } => {
            let reports = ReportService::new(&store, &service, config.report.clone());
            run_report(
                &reports,
                mode.unwrap_or(default_mode),
                days,
                json,
                output.as_deref(),
            )?;
        }
        Commands::Status { json } => {
            run_status(&store, json)?;
        }
        Commands::Cleanup { days } => {
            run_cleanup(&store, days)?;
        }
    }

    Ok(())
}
