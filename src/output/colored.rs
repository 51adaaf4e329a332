//! Colored console formatting for diagnostic reports

use crate::{
    output::formatter::OutputFormatter,
    types::{
        AddressClassification, BandwidthSample, BandwidthTier, GeoRecord, PortResult, PortState,
        StepError,
    },
};
use colored::Colorize;

/// ANSI-colored formatter for interactive terminals
pub struct ColoredFormatter;

impl ColoredFormatter {
    pub fn new() -> Self {
        Self
    }

    fn tier_label(tier: BandwidthTier) -> colored::ColoredString {
        match tier {
            BandwidthTier::Poor => tier.as_str().red(),
            BandwidthTier::Moderate => tier.as_str().yellow(),
            BandwidthTier::Good => tier.as_str().green(),
        }
    }

    fn port_label(state: PortState) -> colored::ColoredString {
        match state {
            PortState::Open => state.as_str().green(),
            PortState::Closed => state.as_str().yellow(),
            PortState::ProbeFailed => state.as_str().red(),
        }
    }
}

impl Default for ColoredFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> String {
        format!(
            "{}\n{}\n",
            title.bold().cyan(),
            "=".repeat(title.len()).cyan()
        )
    }

    fn format_geo_section(&self, geo: Option<&GeoRecord>) -> String {
        let mut out = format!("{}\n", "IP Information".bold());
        match geo {
            Some(record) => {
                out.push_str(&format!("  Address:        {}\n", record.address.bold()));
                out.push_str(&format!(
                    "  Location:       {}, {}, {}\n",
                    record.city, record.region, record.country
                ));
                out.push_str(&format!("  Organization:   {}\n", record.organization));
                out.push_str(&format!("  Hostname:       {}\n", record.hostname));
                let classification = match record.classification {
                    AddressClassification::NonRoutable => {
                        record.classification.as_str().yellow()
                    }
                    AddressClassification::PotentiallyDynamicPublic => {
                        record.classification.as_str().normal()
                    }
                };
                out.push_str(&format!("  Classification: {}\n", classification));
            }
            None => out.push_str(&format!("  {}\n", "(unavailable)".dimmed())),
        }
        out
    }

    fn format_bandwidth_section(&self, bandwidth: Option<&BandwidthSample>) -> String {
        let mut out = format!("{}\n", "Download Bandwidth".bold());
        match bandwidth {
            Some(sample) => {
                out.push_str(&format!(
                    "  Throughput:     {:.2} Mbps ({})\n",
                    sample.mbps,
                    Self::tier_label(sample.tier)
                ));
            }
            None => out.push_str(&format!("  {}\n", "(unavailable)".dimmed())),
        }
        out
    }

    fn format_port_section(&self, port: &PortResult) -> String {
        format!(
            "{}\n  Port {}:       {}\n",
            "Port Reachability".bold(),
            port.port,
            Self::port_label(port.state)
        )
    }

    fn format_errors_section(&self, errors: &[StepError]) -> String {
        let mut out = format!("{}\n", "Errors".bold().red());
        for error in errors {
            out.push_str(&format!("  {} {}\n", "✗".red(), error));
        }
        out
    }
}
