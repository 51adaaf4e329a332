//! Output formatting and display system
//!
//! Renders a [`DiagnosticReport`] for the console, either as formatted
//! text (plain or colored) or as JSON for scripted consumption.

mod colored;
mod formatter;

pub use colored::ColoredFormatter;
pub use formatter::{OutputFormatter, PlainFormatter};

use crate::{
    error::Result,
    types::DiagnosticReport,
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool) -> Box<dyn OutputFormatter> {
        if enable_color {
            Box::new(ColoredFormatter::new())
        } else {
            Box::new(PlainFormatter::new())
        }
    }
}

/// Serialize a report as pretty-printed JSON
pub fn render_json(report: &DiagnosticReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render a complete report with the given formatter
pub fn render_report(formatter: &dyn OutputFormatter, report: &DiagnosticReport) -> String {
    let mut output = String::new();

    output.push_str(&formatter.format_header(&format!("Network Diagnostics ({})", report.run_id)));
    output.push('\n');

    output.push_str(&formatter.format_geo_section(report.geo.as_ref()));
    output.push('\n');

    output.push_str(&formatter.format_bandwidth_section(report.bandwidth.as_ref()));
    output.push('\n');

    if let Some(ref port) = report.port {
        output.push_str(&formatter.format_port_section(port));
        output.push('\n');
    }

    if !report.errors.is_empty() {
        output.push_str(&formatter.format_errors_section(&report.errors));
        output.push('\n');
    }

    output
}
