use clap::Parser;
use history_sync::{Config, HistorySync, OrderingMode, run_with_shutdown};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "history-sync")]
#[command(about = "Mirror completed generation jobs and their images into a local directory")]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listing order to walk: "new" or "top-all"
    #[arg(long)]
    ordering: Option<OrderingMode>,

    /// Job store root directory
    #[arg(long)]
    jobs_dir: Option<PathBuf>,

    /// Run one sync and exit instead of syncing on an interval
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(ordering) = cli.ordering {
        config.sync.ordering = ordering;
    }
    if let Some(jobs_dir) = cli.jobs_dir {
        config.store.jobs_dir = jobs_dir;
    }

    let service = match HistorySync::new(config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            return ExitCode::FAILURE;
        }
    };

    if cli.once {
        return match service.sync_now().await {
            Ok(report) => {
                tracing::info!(
                    stop = ?report.stop,
                    pages = report.pages_fetched,
                    downloaded = report.jobs_downloaded,
                    resumed = report.jobs_resumed,
                    skipped = report.jobs_skipped,
                    "Sync complete"
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Sync aborted");
                ExitCode::FAILURE
            }
        };
    }

    let scheduler = service.start_scheduler();

    // Initial on-demand run; the scheduler's first tick is one interval away
    let initial = {
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = service.sync_now().await {
                tracing::error!(error = %e, "Initial sync aborted");
            }
        })
    };

    match run_with_shutdown(&service, [scheduler, initial]).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(fatal) => {
            tracing::error!(code = fatal.code, "Exiting after fatal error: {}", fatal.message);
            ExitCode::FAILURE
        }
    }
}
