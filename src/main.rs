//! Network Diagnostic Orchestrator - Main CLI Application
//!
//! Runs geolocation lookup, bandwidth measurement and TCP port
//! reachability against a target host and prints one consolidated report.

use clap::Parser;
use netdiag::{app::App, cli::Cli, error::AppError};
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    // Load .env before clap resolves env-backed flags
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    if let Err(e) = run_application(cli).await {
        eprintln!("Error: {}", e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> netdiag::Result<()> {
    let app = App::new(cli)?;
    app.run().await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Verify endpoint URLs (must start with http:// or https://)");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Set the geolocation token via --geo-token or NETDIAG_GEO_TOKEN");
        }
        AppError::Validation(_) => {
            eprintln!();
            eprintln!("Usage help:");
            eprintln!("  - Provide a non-empty address (IP literal or hostname)");
            eprintln!("  - Run with --help for the full flag reference");
        }
        AppError::Network(_) | AppError::Lookup(_) | AppError::Probe(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check your internet connection");
            eprintln!("  - Verify firewall settings");
            eprintln!("  - Try overriding the endpoints with --geo-url / --bandwidth-url");
        }
        AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Timeout troubleshooting:");
            eprintln!("  - Increase the limit with --timeout");
            eprintln!("  - Reduce the payload with --bandwidth-payload-bytes");
        }
        _ => {}
    }
}
