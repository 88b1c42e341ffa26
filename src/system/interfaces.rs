//! Network interface enumeration and active-interface selection.
//!
//! The active interface is the one carrying the default route. When the
//! route table cannot be read, physical interfaces with a routable address
//! win over software bridges (`docker0`, `virbr0`, ...), first match first.

use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use sysinfo::Networks;
use tokio::process::Command;
use tokio::time::timeout;

use crate::system::hardware_port::is_bridge_name;

/// Linux kernel route table
const PROC_NET_ROUTE: &str = "/proc/net/route";

/// BSD/macOS `route` binary
pub const ROUTE: &str = "/sbin/route";

/// One OS network interface, as seen on this tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub name: String,
    /// `None` when the OS reports no hardware address (all zeroes)
    pub mac_address: Option<String>,
    pub addresses: Vec<IpAddr>,
    pub is_loopback: bool,
    /// Carries at least one routable (non-loopback, non-link-local) address
    pub is_active: bool,
    /// Software bridge or container link
    pub is_bridge: bool,
}

impl InterfaceRecord {
    /// Build a record and derive the loopback/active/bridge flags from name and addresses.
    pub fn new(name: impl Into<String>, mac_address: Option<String>, addresses: Vec<IpAddr>) -> Self {
        let name = name.into();
        let is_loopback = is_loopback_name(&name)
            || (!addresses.is_empty() && addresses.iter().all(|a| a.is_loopback()));
        let is_active = addresses.iter().any(is_routable);
        let is_bridge = is_bridge_name(&name);
        Self {
            name,
            mac_address,
            addresses,
            is_loopback,
            is_active,
            is_bridge,
        }
    }

    fn is_candidate(&self) -> bool {
        self.is_active && !self.is_loopback
    }
}

/// Source of interface records, refreshed on every call
#[allow(async_fn_in_trait)]
pub trait InterfaceSource {
    fn interfaces(&mut self) -> Vec<InterfaceRecord>;

    /// Name of the interface carrying the default route, if it can be found.
    async fn default_route(&self) -> Option<String> {
        None
    }
}

/// Interface enumeration backed by the `sysinfo` crate
pub struct SysinfoInterfaces {
    networks: Networks,
    route_timeout: Duration,
}

impl SysinfoInterfaces {
    /// `route_timeout` bounds the `route` subprocess on BSD/macOS.
    pub fn new(route_timeout: Duration) -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            route_timeout,
        }
    }

    async fn query_route_command(&self) -> Option<String> {
        let mut cmd = Command::new(ROUTE);
        cmd.args(["-n", "get", "default"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match timeout(self.route_timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                parse_route_get(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "failed to run route");
                None
            }
            Err(_) => {
                tracing::debug!("route timed out");
                None
            }
        }
    }
}

impl InterfaceSource for SysinfoInterfaces {
    fn interfaces(&mut self) -> Vec<InterfaceRecord> {
        // true = drop interfaces that disappeared since the last refresh
        self.networks.refresh(true);

        let mut records: Vec<InterfaceRecord> = self
            .networks
            .iter()
            .map(|(name, data)| {
                let mac = data.mac_address();
                let mac_address = if mac.is_unspecified() {
                    None
                } else {
                    Some(mac.to_string())
                };
                let addresses = data.ip_networks().iter().map(|net| net.addr).collect();
                InterfaceRecord::new(name.clone(), mac_address, addresses)
            })
            .collect();

        // sysinfo keeps interfaces in a hash map; name order keeps "first" stable
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    async fn default_route(&self) -> Option<String> {
        if cfg!(target_os = "linux") {
            match std::fs::read_to_string(PROC_NET_ROUTE) {
                Ok(table) => parse_proc_net_route(&table),
                Err(e) => {
                    tracing::debug!(error = %e, "cannot read {}", PROC_NET_ROUTE);
                    None
                }
            }
        } else if cfg!(any(
            target_os = "macos",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd"
        )) {
            self.query_route_command().await
        } else {
            None
        }
    }
}

/// Pick the active interface.
///
/// The default-route interface wins when it is up and not loopback. Otherwise
/// the first active non-loopback physical interface, then the first active
/// bridge.
pub fn select_active<'a>(records: &'a [InterfaceRecord], default_route: Option<&str>) -> Option<&'a InterfaceRecord> {
    if let Some(route_iface) = default_route {
        if let Some(record) = records.iter().find(|r| r.name == route_iface && r.is_candidate()) {
            return Some(record);
        }
    }
    records
        .iter()
        .find(|r| r.is_candidate() && !r.is_bridge)
        .or_else(|| records.iter().find(|r| r.is_candidate()))
}

/// Default-route interface from `/proc/net/route`; lowest metric wins.
pub fn parse_proc_net_route(table: &str) -> Option<String> {
    const RTF_UP: u32 = 0x1;

    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 8 {
                return None;
            }
            let flags = u32::from_str_radix(cols[3], 16).ok()?;
            let metric: u32 = cols[6].parse().ok()?;
            let is_default = cols[1] == "00000000" && cols[7] == "00000000";
            (is_default && flags & RTF_UP != 0).then(|| (metric, cols[0].to_string()))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface)
}

/// Interface line of `route -n get default`.
pub fn parse_route_get(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("interface:"))
        .map(|iface| iface.trim().to_string())
        .filter(|iface| !iface.is_empty())
}

fn is_loopback_name(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.to_ascii_lowercase().starts_with("loopback")
}

fn is_routable(addr: &IpAddr) -> bool {
    if addr.is_loopback() || addr.is_unspecified() {
        return false;
    }
    match addr {
        IpAddr::V4(v4) => !v4.is_link_local(),
        // fe80::/10
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) != 0xfe80,
    }
}
