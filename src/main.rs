use clap::Parser;
use gradesync::cli::Args;
use gradesync::startup;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    startup::init_logging()?;

    info!("Starting gradesync");

    // Load configuration
    let config = startup::load_config(&args)?;

    // Fatal errors surface here as a diagnostic and a non-zero exit
    Ok(startup::run(&args, &config).await?)
}
