use crate::cli::Args;
use crate::components::google_calendar::{GoogleCalendarClient, TokenManager};
use crate::components::GradescopeClient;
use crate::config::Config;
use crate::error::{other_error, SyncResult};
use crate::sync::{self, ReconcileOptions};
use reqwest::Client;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit status when the run finished but some items failed
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,html5ever=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| other_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the config and apply command line overrides
pub fn load_config(args: &Args) -> SyncResult<Config> {
    let mut config = match Config::load(!args.cleanup) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            return Err(e);
        }
    };

    if let Some(name) = &args.calendar {
        config.calendar_name = name.clone();
        config.validate()?;
    }

    Ok(config)
}

fn calendar_client(config: &Config) -> SyncResult<GoogleCalendarClient> {
    let http = Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;
    let tokens = TokenManager::from_config(config, http.clone())?;
    GoogleCalendarClient::new(config, tokens, http)
}

/// Run the mode selected on the command line
pub async fn run(args: &Args, config: &Config) -> SyncResult<ExitCode> {
    let tz = config.tz()?;
    let calendar = calendar_client(config)?;

    if args.cleanup {
        info!("Cleaning up calendar '{}'", config.calendar_name);
        let report = sync::cleanup(&calendar, &config.calendar_name).await?;
        print!("{}", report.render());
        if report.aborted.is_some() {
            return Ok(ExitCode::FAILURE);
        }
        return Ok(exit_code(report.has_failures()));
    }

    let source = GradescopeClient::new(config)?;
    let options = ReconcileOptions {
        event_duration: config.event_duration(),
    };

    info!(
        "Syncing assignments to calendar '{}'{}",
        config.calendar_name,
        if args.dry_run { " (dry run)" } else { "" }
    );
    let report = sync::run_sync(
        &source,
        &calendar,
        &config.calendar_name,
        &options,
        args.dry_run,
    )
    .await?;

    print!("{}", report.render(&tz));
    if let Some(reason) = &report.aborted {
        error!("Sync stopped early: {}", reason);
        return Ok(ExitCode::FAILURE);
    }
    if report.has_failures() {
        warn!("Sync finished with failures, they will be retried on the next run");
    } else {
        info!("Sync completed successfully");
    }

    Ok(exit_code(report.has_failures()))
}

fn exit_code(has_failures: bool) -> ExitCode {
    if has_failures {
        ExitCode::from(EXIT_PARTIAL_FAILURE)
    } else {
        ExitCode::SUCCESS
    }
}
