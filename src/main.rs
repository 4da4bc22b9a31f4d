use anyhow::Result;
use clap::Parser;
use dive_sailthru::cli::{self, Cli};
use dive_sailthru::error::SailthruError;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Exit with proper code on error
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);

        // Recipient problems are worth calling out separately
        if let Some(SailthruError::UserEmail { code, .. }) = e.downcast_ref::<SailthruError>() {
            eprintln!("Sailthru rejected the recipient (error code {})", code);
        }

        eprintln!("\nFor help, run: dive-sailthru --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing with level based on verbose flag
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli::log_directives(cli.verbose)));

    // Logs go to stderr so stdout stays clean JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::debug!("dive-sailthru starting");

    cli::run(&cli).await?;
    Ok(())
}
