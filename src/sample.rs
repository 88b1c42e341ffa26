//! One network status snapshot and its fixed, pipe-delimited log line.
//!
//! ```text
//! 2026-10-16 09:30:00 | Network: Wi-Fi | Device Name: en0 | MAC Address: a4:83:e7:12:34:56 | IP: 203.0.113.7 | Status: Connected | Latency: 14.2ms
//! ```

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::error::ParseError;

/// Timestamp layout of every record
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder rendered for any field that could not be determined
pub const UNKNOWN: &str = "unknown";

/// Network label used when interfaces exist but none of them is active
pub const NO_ACTIVE_NETWORK: &str = "No Active Network";

const FIELD_SEPARATOR: &str = " | ";

/// Make free text safe to embed in a record field.
///
/// `|` would split the field when the line is parsed back, and a value equal
/// to the `unknown` placeholder would read back as absent, so both are
/// rewritten.
pub fn sanitize_field(value: &str) -> String {
    let cleaned = value.replace('|', "/");
    let cleaned = cleaned.trim();
    if cleaned == UNKNOWN {
        format!("{}?", cleaned)
    } else {
        cleaned.to_string()
    }
}

const LABELS: [&str; 6] = [
    "Network: ",
    "Device Name: ",
    "MAC Address: ",
    "IP: ",
    "Status: ",
    "Latency: ",
];

/// Reachability verdict for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    /// Probing disabled (no target host configured)
    Unknown,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConnectionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Connected" => Ok(Self::Connected),
            "Disconnected" => Ok(Self::Disconnected),
            "Unknown" => Ok(Self::Unknown),
            other => Err(ParseError::Status(other.to_string())),
        }
    }
}

/// One snapshot of the host's network status.
///
/// Built fresh on every tick and dropped once its line has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSample {
    pub timestamp: DateTime<Local>,
    /// Hardware port label of the active interface (e.g. "Wi-Fi")
    pub network_name: Option<String>,
    pub interface_name: Option<String>,
    pub mac_address: Option<String>,
    /// `None` when the lookup timed out or failed
    pub public_ip: Option<IpAddr>,
    pub connection_status: ConnectionStatus,
    pub latency_ms: Option<f64>,
}

impl NetworkSample {
    /// Render the fixed-format record line (no trailing newline).
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

fn or_unknown<T: fmt::Display>(value: Option<&T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => UNKNOWN.to_string(),
    }
}

impl fmt::Display for NetworkSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Network: {} | Device Name: {} | MAC Address: {} | IP: {} | Status: {} | Latency: ",
            self.timestamp.format(TIMESTAMP_FORMAT),
            or_unknown(self.network_name.as_ref()),
            or_unknown(self.interface_name.as_ref()),
            or_unknown(self.mac_address.as_ref()),
            or_unknown(self.public_ip.as_ref()),
            self.connection_status,
        )?;
        match self.latency_ms {
            Some(ms) => write!(f, "{}ms", ms),
            None => write!(f, "{}ms", UNKNOWN),
        }
    }
}

fn optional_text(value: &str) -> Option<String> {
    if value == UNKNOWN {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a record line back into a sample.
///
/// Inverse of [`NetworkSample::to_line`] for samples whose timestamp carries
/// whole-second precision and whose text fields went through
/// [`sanitize_field`] (no `|`, never the literal `unknown`).
pub fn parse_line(line: &str) -> Result<NetworkSample, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if parts.len() != LABELS.len() + 1 {
        return Err(ParseError::FieldCount(parts.len()));
    }

    let mut values = [""; 6];
    for (index, (part, label)) in parts[1..].iter().zip(LABELS).enumerate() {
        values[index] = part.strip_prefix(label).ok_or(ParseError::Label {
            index: index + 1,
            expected: label.trim_end(),
        })?;
    }

    let naive = NaiveDateTime::parse_from_str(parts[0], TIMESTAMP_FORMAT)
        .map_err(|_| ParseError::Timestamp(parts[0].to_string()))?;
    let timestamp = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ParseError::Timestamp(parts[0].to_string()))?;

    let [network, device, mac, ip, status, latency] = values;

    let public_ip = match ip {
        UNKNOWN => None,
        raw => Some(raw.parse().map_err(|_| ParseError::Ip(raw.to_string()))?),
    };

    let latency_ms = match latency {
        // Lines written before the unit was always appended lack the "ms"
        "unknown" | "unknownms" => None,
        raw => {
            let number = raw
                .strip_suffix("ms")
                .ok_or_else(|| ParseError::Latency(raw.to_string()))?;
            Some(
                number
                    .parse::<f64>()
                    .map_err(|_| ParseError::Latency(raw.to_string()))?,
            )
        }
    };

    Ok(NetworkSample {
        timestamp,
        network_name: optional_text(network),
        interface_name: optional_text(device),
        mac_address: optional_text(mac),
        public_ip,
        connection_status: status.parse()?,
        latency_ms,
    })
}
