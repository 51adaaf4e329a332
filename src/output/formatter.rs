//! Plain text formatting for diagnostic reports

use crate::types::{BandwidthSample, GeoRecord, PortResult, StepError, UNKNOWN_HOSTNAME};

/// Formats the sections of a diagnostic report for console display
pub trait OutputFormatter: Send + Sync {
    fn format_header(&self, title: &str) -> String;
    fn format_geo_section(&self, geo: Option<&GeoRecord>) -> String;
    fn format_bandwidth_section(&self, bandwidth: Option<&BandwidthSample>) -> String;
    fn format_port_section(&self, port: &PortResult) -> String;
    fn format_errors_section(&self, errors: &[StepError]) -> String;
}

/// Plain text formatter without ANSI codes, suitable for scripts and logs
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> String {
        format!("{}\n{}\n", title, "=".repeat(title.len()))
    }

    fn format_geo_section(&self, geo: Option<&GeoRecord>) -> String {
        let mut out = String::from("IP Information\n");
        match geo {
            Some(record) => {
                out.push_str(&format!("  Address:        {}\n", record.address));
                out.push_str(&format!(
                    "  Location:       {}, {}, {}\n",
                    record.city, record.region, record.country
                ));
                out.push_str(&format!("  Organization:   {}\n", record.organization));
                if record.hostname != UNKNOWN_HOSTNAME {
                    out.push_str(&format!("  Hostname:       {}\n", record.hostname));
                } else {
                    out.push_str("  Hostname:       unknown\n");
                }
                out.push_str(&format!(
                    "  Classification: {}\n",
                    record.classification.as_str()
                ));
            }
            None => out.push_str("  (unavailable)\n"),
        }
        out
    }

    fn format_bandwidth_section(&self, bandwidth: Option<&BandwidthSample>) -> String {
        let mut out = String::from("Download Bandwidth\n");
        match bandwidth {
            Some(sample) => {
                out.push_str(&format!(
                    "  Throughput:     {:.2} Mbps ({})\n",
                    sample.mbps,
                    sample.tier.as_str()
                ));
            }
            None => out.push_str("  (unavailable)\n"),
        }
        out
    }

    fn format_port_section(&self, port: &PortResult) -> String {
        format!(
            "Port Reachability\n  Port {}:       {}\n",
            port.port,
            port.state.as_str()
        )
    }

    fn format_errors_section(&self, errors: &[StepError]) -> String {
        let mut out = String::from("Errors\n");
        for error in errors {
            out.push_str(&format!("  {}\n", error));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AddressClassification, BandwidthSample, PortState};

    fn sample_geo() -> GeoRecord {
        GeoRecord {
            address: "8.8.8.8".to_string(),
            city: "Mountain View".to_string(),
            region: "California".to_string(),
            country: "US".to_string(),
            organization: "AS15169 Google LLC".to_string(),
            hostname: "dns.google".to_string(),
            classification: AddressClassification::PotentiallyDynamicPublic,
        }
    }

    #[test]
    fn test_header_underline_matches_title() {
        let formatter = PlainFormatter::new();
        let header = formatter.format_header("Report");
        assert_eq!(header, "Report\n======\n");
    }

    #[test]
    fn test_geo_section_fields() {
        let formatter = PlainFormatter::new();
        let section = formatter.format_geo_section(Some(&sample_geo()));
        assert!(section.contains("8.8.8.8"));
        assert!(section.contains("Mountain View, California, US"));
        assert!(section.contains("dns.google"));
        assert!(section.contains("potentially dynamic public"));
    }

    #[test]
    fn test_missing_geo_is_marked_unavailable() {
        let formatter = PlainFormatter::new();
        let section = formatter.format_geo_section(None);
        assert!(section.contains("(unavailable)"));
    }

    #[test]
    fn test_bandwidth_section_shows_tier() {
        let formatter = PlainFormatter::new();
        let section = formatter.format_bandwidth_section(Some(&BandwidthSample::new(88.0)));
        assert!(section.contains("88.00 Mbps"));
        assert!(section.contains("good"));
    }

    #[test]
    fn test_port_section_states() {
        let formatter = PlainFormatter::new();
        let open = formatter.format_port_section(&PortResult::new(22, PortState::Open));
        assert!(open.contains("Port 22"));
        assert!(open.contains("open"));

        let failed = formatter.format_port_section(&PortResult::new(22, PortState::ProbeFailed));
        assert!(failed.contains("probe failed"));
    }
}
