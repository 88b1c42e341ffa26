//! Human labels for network interfaces ("Wi-Fi", "Ethernet", ...).
//!
//! macOS knows the real hardware port of every device through
//! `networksetup -listallhardwareports`. Other platforms get a label derived
//! from the interface name; Windows adapter names are already labels.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

/// Absolute path used on macOS
pub const NETWORKSETUP: &str = "/usr/sbin/networksetup";

/// Resolves interface names to hardware port labels
#[derive(Debug, Clone)]
pub struct HardwarePorts {
    use_networksetup: bool,
    timeout: Duration,
}

impl HardwarePorts {
    pub fn new(use_networksetup: bool, timeout: Duration) -> Self {
        Self {
            use_networksetup,
            timeout,
        }
    }

    /// Label for `device`, falling back to the name heuristic when the
    /// platform lookup is unavailable or fails.
    pub async fn label(&self, device: &str) -> String {
        if self.use_networksetup {
            match self.query_networksetup(device).await {
                Some(port) => return port,
                None => tracing::debug!(device, "networksetup gave no hardware port, using name heuristic"),
            }
        }
        label_from_name(device)
    }

    async fn query_networksetup(&self, device: &str) -> Option<String> {
        let mut cmd = Command::new(NETWORKSETUP);
        cmd.arg("-listallhardwareports")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(output)) => {
                tracing::debug!(status = %output.status, "networksetup exited with failure");
                return None;
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "failed to run networksetup");
                return None;
            }
            Err(_) => {
                tracing::debug!("networksetup timed out");
                return None;
            }
        };

        let text = String::from_utf8_lossy(&output.stdout);
        parse_hardware_ports(&text)
            .into_iter()
            .find(|(_, dev)| dev == device)
            .map(|(port, _)| port)
    }
}

/// Parse `networksetup -listallhardwareports` into (port, device) pairs.
pub fn parse_hardware_ports(output: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut current_port: Option<String> = None;

    for line in output.lines() {
        let line = line.trim();
        if let Some(port) = line.strip_prefix("Hardware Port:") {
            current_port = Some(port.trim().to_string());
        } else if let Some(device) = line.strip_prefix("Device:") {
            if let Some(port) = current_port.take() {
                pairs.push((port, device.trim().to_string()));
            }
        }
    }
    pairs
}

/// Name prefixes of software bridges and container/VM links
const BRIDGE_PREFIXES: [&str; 5] = ["br", "virbr", "docker", "veth", "bridge"];

/// Whether `name` looks like a software bridge rather than a physical port.
pub fn is_bridge_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    BRIDGE_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Guess a port label from conventional interface names.
pub fn label_from_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| lower.starts_with(p));

    let label = if lower.contains("wi-fi") || lower.contains("wireless") || has_prefix(&["wl", "ath", "ra"]) {
        "Wi-Fi"
    } else if has_prefix(&["eth", "en", "em"]) {
        "Ethernet"
    } else if has_prefix(&["ww", "rmnet", "pdp_ip"]) {
        "Cellular"
    } else if has_prefix(&["tun", "tap", "utun", "wg", "ppp", "ipsec"]) {
        "VPN"
    } else if has_prefix(&BRIDGE_PREFIXES) {
        "Bridge"
    } else {
        return name.to_string();
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Hardware Port: Ethernet
Device: en0
Ethernet Address: a4:83:e7:00:00:01

Hardware Port: Wi-Fi
Device: en1
Ethernet Address: a4:83:e7:00:00:02

Hardware Port: Thunderbolt Bridge
Device: bridge0
Ethernet Address: N/A

VLAN Configurations
===================
";

    #[test]
    fn parses_port_device_pairs() {
        let pairs = parse_hardware_ports(LISTING);
        assert_eq!(
            pairs,
            vec![
                ("Ethernet".to_string(), "en0".to_string()),
                ("Wi-Fi".to_string(), "en1".to_string()),
                ("Thunderbolt Bridge".to_string(), "bridge0".to_string()),
            ]
        );
    }

    #[test]
    fn device_without_port_is_skipped() {
        assert!(parse_hardware_ports("Device: en5\n").is_empty());
    }

    #[test]
    fn heuristic_labels() {
        assert_eq!(label_from_name("wlan0"), "Wi-Fi");
        assert_eq!(label_from_name("wlp3s0"), "Wi-Fi");
        assert_eq!(label_from_name("eth0"), "Ethernet");
        assert_eq!(label_from_name("enp0s31f6"), "Ethernet");
        assert_eq!(label_from_name("wwan0"), "Cellular");
        assert_eq!(label_from_name("wg0"), "VPN");
        assert_eq!(label_from_name("docker0"), "Bridge");
        assert_eq!(label_from_name("br-5f2a9c"), "Bridge");
        // Windows adapter names are kept as they are
        assert_eq!(label_from_name("Wi-Fi 2"), "Wi-Fi");
        assert_eq!(label_from_name("Local Area Connection"), "Local Area Connection");
    }

    #[test]
    fn bridge_names() {
        assert!(is_bridge_name("docker0"));
        assert!(is_bridge_name("br-5f2a9c"));
        assert!(is_bridge_name("virbr0"));
        assert!(is_bridge_name("veth12ab34"));
        assert!(!is_bridge_name("wlp3s0"));
        assert!(!is_bridge_name("eth0"));
    }

    #[tokio::test]
    async fn label_without_networksetup_uses_heuristic() {
        let ports = HardwarePorts::new(false, Duration::from_millis(100));
        assert_eq!(ports.label("eth0").await, "Ethernet");
    }
}
