//! netpulse configuration (htoprc-style key=value file plus CLI overrides)
//!
//! Default location: `<config dir>/netpulse/netpulserc`, e.g.
//! `~/.config/netpulse/netpulserc` on Linux or `%APPDATA%\netpulse\netpulserc`
//! on Windows.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::system::public_ip::DEFAULT_LOOKUP_URL;

const INTERVAL_RANGE: (u64, u64) = (1, 86_400);
const TIMEOUT_RANGE_MS: (u64, u64) = (100, 60_000);

/// Default rc file path, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("netpulse").join("netpulserc"))
}

/// Settings for one monitoring session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub log_file: PathBuf,
    /// Empty string disables the reachability probe
    pub target_host: String,
    pub ip_lookup_url: String,
    pub http_timeout_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            log_file: PathBuf::from("network_monitor.log"),
            target_host: "google.com".to_string(),
            ip_lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            http_timeout_ms: 5_000,
            probe_timeout_ms: 3_000,
        }
    }
}

fn clamp((min, max): (u64, u64), value: u64) -> u64 {
    value.clamp(min, max)
}

impl MonitorConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse rc-file content. Unknown keys and unparsable values are ignored.
    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!(line, "ignoring rc line without '='");
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "interval_secs" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.interval_secs = clamp(INTERVAL_RANGE, v);
                    }
                }
                "log_file" if !value.is_empty() => cfg.log_file = PathBuf::from(value),
                "target_host" => cfg.target_host = value.to_string(),
                "ip_lookup_url" if !value.is_empty() => cfg.ip_lookup_url = value.to_string(),
                "http_timeout_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.http_timeout_ms = clamp(TIMEOUT_RANGE_MS, v);
                    }
                }
                "probe_timeout_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.probe_timeout_ms = clamp(TIMEOUT_RANGE_MS, v);
                    }
                }
                _ => tracing::debug!(key, "ignoring unknown rc key"),
            }
        }

        cfg
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = cli.interval {
            self.interval_secs = clamp(INTERVAL_RANGE, v);
        }
        if let Some(path) = &cli.log_file {
            self.log_file = path.clone();
        }
        if let Some(host) = &cli.target {
            self.target_host = host.trim().to_string();
        }
        if let Some(url) = &cli.ip_lookup_url {
            self.ip_lookup_url = url.clone();
        }
        if let Some(v) = cli.http_timeout_ms {
            self.http_timeout_ms = clamp(TIMEOUT_RANGE_MS, v);
        }
        if let Some(v) = cli.probe_timeout_ms {
            self.probe_timeout_ms = clamp(TIMEOUT_RANGE_MS, v);
        }
    }

    /// Reject settings that would only fail later, inside the loop.
    pub fn validate(&self) -> Result<()> {
        if !(self.ip_lookup_url.starts_with("http://") || self.ip_lookup_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "ip_lookup_url must be an http(s) URL, got {:?}",
                self.ip_lookup_url
            )));
        }
        if self.target_host.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "target_host must be a single host name, got {:?}",
                self.target_host
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// `None` when probing is disabled
    pub fn target(&self) -> Option<&str> {
        Some(self.target_host.as_str()).filter(|h| !h.is_empty())
    }

    /// Render as rc-file content.
    pub fn to_rc(&self) -> String {
        let mut lines = Vec::new();
        lines.push("# netpulse configuration file".to_string());
        lines.push("# key=value, one per line; unknown keys are ignored".to_string());
        lines.push(String::new());
        lines.push(format!("interval_secs={}", self.interval_secs));
        lines.push(format!("log_file={}", self.log_file.display()));
        lines.push(format!("target_host={}", self.target_host));
        lines.push(format!("ip_lookup_url={}", self.ip_lookup_url));
        lines.push(format!("http_timeout_ms={}", self.http_timeout_ms));
        lines.push(format!("probe_timeout_ms={}", self.probe_timeout_ms));
        lines.join("\n") + "\n"
    }

    /// Save to `path`, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(self.to_rc().as_bytes())?;
        Ok(())
    }
}
