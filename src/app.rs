//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, Config},
    error::Result,
    logging::{LogLevel, Logger},
    orchestrator::DiagnosticOrchestrator,
    output::{render_json, render_report, OutputFormatterFactory},
    probes::{HttpBandwidthProbe, HttpPortChecker, IpinfoClient, PortProbe, TcpConnectProbe},
    types::{DiagnosticReport, DiagnosticRequest},
};
use std::sync::Arc;
use tokio::sync::watch;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        Ok(Self { cli })
    }

    /// Run the application
    pub async fn run(self) -> Result<()> {
        let config = load_config(self.cli.clone())?;
        let logger = build_logger(&config);

        let warnings = validate_config(&config)?;
        if !config.json_output {
            for warning in &warnings {
                eprintln!("{}", warning.format(config.enable_color));
            }
        }

        if config.debug && !config.json_output {
            eprintln!("Configuration:");
            eprintln!("{}", display_config_summary(&config));
        }

        let orchestrator = build_orchestrator(&config, logger)?;
        let request = match config.port {
            Some(port) => DiagnosticRequest::with_port(&config.address, port),
            None => DiagnosticRequest::new(&config.address),
        };

        // Translate Ctrl-C into a cancellation signal so the report still
        // carries whatever steps had completed
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send(true);
            }
        });

        let report = orchestrator.run_with_cancel(request, cancel_rx).await?;
        self.display_report(&config, &report)?;

        Ok(())
    }

    fn display_report(&self, config: &Config, report: &DiagnosticReport) -> Result<()> {
        if config.json_output {
            println!("{}", render_json(report)?);
        } else {
            let formatter = OutputFormatterFactory::create_formatter(config.enable_color);
            print!("{}", render_report(formatter.as_ref(), report));
        }
        Ok(())
    }
}

fn build_logger(config: &Config) -> Logger {
    if config.debug {
        Logger::new(LogLevel::Debug, config.enable_color)
    } else if config.verbose {
        Logger::new(LogLevel::Info, config.enable_color)
    } else {
        Logger::disabled()
    }
}

/// Wire the configured endpoints into an orchestrator with real probes
fn build_orchestrator(config: &Config, logger: Logger) -> Result<DiagnosticOrchestrator> {
    let timeout = config.timeout();

    let geo = Arc::new(IpinfoClient::new(
        &config.geo_base_url,
        &config.geo_token,
        timeout,
    )?);

    let bandwidth = Arc::new(HttpBandwidthProbe::new(
        &config.bandwidth_url,
        config.bandwidth_payload_bytes,
        timeout,
    )?);

    let port: Arc<dyn PortProbe> = if config.direct_port_probe {
        Arc::new(TcpConnectProbe::new(timeout))
    } else {
        Arc::new(HttpPortChecker::new(&config.port_check_url, timeout)?)
    };

    Ok(DiagnosticOrchestrator::new(geo, bandwidth, port)
        .with_step_timeout(timeout)
        .with_logger(logger))
}
