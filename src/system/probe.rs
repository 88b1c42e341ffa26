//! Reachability probing via the platform `ping` command.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::ProbeError;

/// Program name looked up on PATH
pub const PING: &str = "ping";

/// Result of one reachability check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    pub reachable: bool,
    /// Round trip in milliseconds, when the output reported one
    pub latency_ms: Option<f64>,
}

impl ProbeOutcome {
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            latency_ms: None,
        }
    }
}

/// Capability: check whether `host` answers, and how fast.
#[allow(async_fn_in_trait)]
pub trait ReachabilityProbe {
    async fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError>;
}

/// Argument syntax family of the host's `ping`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingFlavor {
    Windows,
    Posix,
}

impl PingFlavor {
    /// Flavor of the OS this binary was built for.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Arguments for a single echo request to `host`.
    pub fn args(&self, host: &str, timeout: Duration) -> Vec<String> {
        match self {
            Self::Windows => vec![
                "-n".into(),
                "1".into(),
                "-w".into(),
                timeout.as_millis().to_string(),
                host.into(),
            ],
            // Wait flags differ between Linux (-W secs) and BSD (-W ms);
            // the subprocess timeout bounds the call instead.
            Self::Posix => vec!["-c".into(), "1".into(), host.into()],
        }
    }

    /// Turn exit status and stdout of a finished ping into an outcome.
    pub fn interpret(&self, success: bool, output: &str) -> ProbeOutcome {
        let reachable = match self {
            // Windows exits 0 for "Destination host unreachable" replies
            Self::Windows => success && output.contains("TTL="),
            Self::Posix => success,
        };
        if !reachable {
            return ProbeOutcome::unreachable();
        }
        ProbeOutcome {
            reachable,
            latency_ms: parse_latency(output),
        }
    }
}

const TIME_MARKERS: [&str; 5] = ["time=", "time<", "时间=", "時間=", "zeit="];

/// First round-trip time printed by `ping`, in milliseconds.
///
/// Localized Windows output arrives in the OEM code page, so the word for
/// "time" may be mangled by the lossy UTF-8 decode; the ASCII `<n>ms TTL=`
/// tail of a reply line is used as a fallback.
pub fn parse_latency(output: &str) -> Option<f64> {
    let lower = output.to_lowercase();
    let start = TIME_MARKERS
        .iter()
        .filter_map(|marker| lower.find(marker).map(|pos| pos + marker.len()))
        .min();

    match start {
        Some(start) => {
            let digits: String = lower[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()
        }
        None => latency_before_ttl(&lower),
    }
}

fn latency_before_ttl(lower: &str) -> Option<f64> {
    let head = &lower[..lower.find("ms ttl=")?];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, _)| i)?;
    head[start..].parse().ok()
}

/// [`ReachabilityProbe`] that shells out to the system `ping`
#[derive(Debug, Clone)]
pub struct PingProbe {
    program: String,
    flavor: PingFlavor,
    timeout: Duration,
}

impl PingProbe {
    pub fn new(flavor: PingFlavor, timeout: Duration) -> Self {
        Self {
            program: PING.to_string(),
            flavor,
            timeout,
        }
    }

    /// Probe using the flavor of the running OS.
    pub fn for_host_os(timeout: Duration) -> Self {
        Self::new(PingFlavor::detect(), timeout)
    }

    /// Run `program` instead of `ping` from PATH.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl ReachabilityProbe for PingProbe {
    async fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.flavor.args(host, self.timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.flavor.interpret(output.status.success(), &stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_REPLY: &str = "\
PING google.com (142.250.74.46) 56(84) bytes of data.
64 bytes from arn09s22-in-f14.1e100.net (142.250.74.46): icmp_seq=1 ttl=117 time=14.2 ms

--- google.com ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 14.213/14.213/14.213/0.000 ms
";

    const WINDOWS_REPLY: &str = "\
Pinging google.com [142.250.74.46] with 32 bytes of data:
Reply from 142.250.74.46: bytes=32 time=23ms TTL=117

Ping statistics for 142.250.74.46:
    Packets: Sent = 1, Received = 1, Lost = 0 (0% loss),
";

    const WINDOWS_UNREACHABLE: &str = "\
Pinging 10.255.255.1 with 32 bytes of data:
Reply from 192.168.1.1: Destination host unreachable.
";

    const WINDOWS_CHINESE: &str = "来自 142.250.74.46 的回复: 字节=32 时间=31ms TTL=117\n";

    #[test]
    fn args_follow_os_family() {
        let t = Duration::from_millis(2000);
        assert_eq!(
            PingFlavor::Windows.args("example.com", t),
            vec!["-n", "1", "-w", "2000", "example.com"]
        );
        assert_eq!(PingFlavor::Posix.args("example.com", t), vec!["-c", "1", "example.com"]);
    }

    #[test]
    fn posix_reply_is_connected_with_latency() {
        let outcome = PingFlavor::Posix.interpret(true, LINUX_REPLY);
        assert!(outcome.reachable);
        assert_eq!(outcome.latency_ms, Some(14.2));
    }

    #[test]
    fn posix_failure_is_unreachable() {
        let outcome = PingFlavor::Posix.interpret(false, "1 packets transmitted, 0 received, 100% packet loss");
        assert_eq!(outcome, ProbeOutcome::unreachable());
    }

    #[test]
    fn windows_reply_is_connected_with_latency() {
        let outcome = PingFlavor::Windows.interpret(true, WINDOWS_REPLY);
        assert!(outcome.reachable);
        assert_eq!(outcome.latency_ms, Some(23.0));
    }

    #[test]
    fn windows_unreachable_despite_exit_zero() {
        let outcome = PingFlavor::Windows.interpret(true, WINDOWS_UNREACHABLE);
        assert_eq!(outcome, ProbeOutcome::unreachable());
    }

    #[test]
    fn localized_and_sub_millisecond_times() {
        assert_eq!(parse_latency(WINDOWS_CHINESE), Some(31.0));
        assert_eq!(parse_latency("Reply from 127.0.0.1: bytes=32 time<1ms TTL=128"), Some(1.0));
        assert_eq!(parse_latency("no timing here"), None);
    }

    #[test]
    fn oem_codepage_reply_falls_back_to_ttl_tail() {
        // GBK "时间=31ms" after a lossy UTF-8 decode
        let mangled = "\u{FFFD}\u{FFFD} 142.250.74.46 \u{FFFD}\u{FFFD}: \u{FFFD}\u{FFFD}=32 \u{FFFD}\u{FFFD}=31ms TTL=117\n";
        assert_eq!(parse_latency(mangled), Some(31.0));
        let outcome = PingFlavor::Windows.interpret(true, mangled);
        assert!(outcome.reachable);
        assert_eq!(outcome.latency_ms, Some(31.0));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let probe = PingProbe::new(PingFlavor::Posix, Duration::from_secs(1))
            .with_program("netpulse-test-no-such-ping");
        match probe.probe("127.0.0.1").await {
            Err(ProbeError::Spawn { program, .. }) => assert_eq!(program, "netpulse-test-no-such-ping"),
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_program_is_killed_at_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-ping");
        std::fs::write(&script, "#!/bin/sh\nsleep 10\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let probe = PingProbe::new(PingFlavor::Posix, Duration::from_millis(100))
            .with_program(script.to_string_lossy());
        let started = std::time::Instant::now();
        let mut result = probe.probe("127.0.0.1").await;
        // ETXTBSY: another test's fork may briefly hold the script open for writing
        for _ in 0..5 {
            let busy = matches!(
                &result,
                Err(ProbeError::Spawn { source, .. }) if source.raw_os_error() == Some(26)
            );
            if !busy {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            result = probe.probe("127.0.0.1").await;
        }

        assert!(matches!(result, Err(ProbeError::Timeout(100))), "{result:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn reachable_without_time_has_no_latency() {
        let outcome = PingFlavor::Posix.interpret(true, "1 packets transmitted, 1 received");
        assert!(outcome.reachable);
        assert_eq!(outcome.latency_ms, None);
    }
}
