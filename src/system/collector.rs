use chrono::Local;

use crate::error::{Error, Result};
use crate::sample::{sanitize_field, ConnectionStatus, NetworkSample, NO_ACTIVE_NETWORK};
use crate::system::hardware_port::HardwarePorts;
use crate::system::interfaces::{select_active, InterfaceRecord, InterfaceSource};
use crate::system::probe::ReachabilityProbe;
use crate::system::public_ip::PublicIpSource;

/// Gathers one [`NetworkSample`] per call from its field sources.
///
/// Every source failure degrades only its own field; `sample` never fails.
pub struct Sampler<I, L, P> {
    interfaces: I,
    ip_lookup: L,
    probe: P,
    ports: HardwarePorts,
    /// `None` disables reachability probing
    target_host: Option<String>,
}

impl<I, L, P> Sampler<I, L, P>
where
    I: InterfaceSource,
    L: PublicIpSource,
    P: ReachabilityProbe,
{
    pub fn new(interfaces: I, ip_lookup: L, probe: P, ports: HardwarePorts, target_host: Option<String>) -> Self {
        Self {
            interfaces,
            ip_lookup,
            probe,
            ports,
            target_host: target_host.filter(|h| !h.trim().is_empty()),
        }
    }

    /// Start-up check: the host must expose at least one interface.
    pub fn ensure_interfaces(&mut self) -> Result<usize> {
        let count = self.interfaces.interfaces().len();
        if count == 0 {
            return Err(Error::NoInterfaces);
        }
        tracing::debug!(count, "network interfaces found");
        Ok(count)
    }

    /// Take one snapshot. The remote lookups run concurrently and are joined
    /// before the sample is built.
    pub async fn sample(&mut self) -> NetworkSample {
        let timestamp = Local::now();

        let records = self.interfaces.interfaces();
        let default_route = self.interfaces.default_route().await;
        let active = select_active(&records, default_route.as_deref()).cloned();
        if active.is_none() {
            tracing::debug!(total = records.len(), "no active non-loopback interface");
        }

        let (network_name, public_ip, (connection_status, latency_ms)) = tokio::join!(
            self.collect_network_name(active.as_ref()),
            self.collect_public_ip(),
            self.collect_reachability(),
        );

        let (interface_name, mac_address) = match active {
            Some(record) => (Some(sanitize_field(&record.name)), record.mac_address),
            None => (None, None),
        };

        NetworkSample {
            timestamp,
            network_name: Some(sanitize_field(&network_name)),
            interface_name,
            mac_address,
            public_ip,
            connection_status,
            latency_ms,
        }
    }

    async fn collect_network_name(&self, active: Option<&InterfaceRecord>) -> String {
        match active {
            Some(record) => self.ports.label(&record.name).await,
            None => NO_ACTIVE_NETWORK.to_string(),
        }
    }

    async fn collect_public_ip(&self) -> Option<std::net::IpAddr> {
        match self.ip_lookup.lookup().await {
            Ok(ip) => Some(ip),
            Err(e) => {
                tracing::warn!(error = %e, "public IP lookup failed");
                None
            }
        }
    }

    async fn collect_reachability(&self) -> (ConnectionStatus, Option<f64>) {
        let Some(host) = self.target_host.as_deref() else {
            return (ConnectionStatus::Unknown, None);
        };

        match self.probe.probe(host).await {
            Ok(outcome) if outcome.reachable => (ConnectionStatus::Connected, outcome.latency_ms),
            Ok(_) => {
                tracing::debug!(host, "target did not answer");
                (ConnectionStatus::Disconnected, None)
            }
            Err(e) => {
                tracing::warn!(host, error = %e, "reachability probe failed");
                (ConnectionStatus::Disconnected, None)
            }
        }
    }
}
