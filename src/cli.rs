//! Command-line flags. Every value is optional so that unset flags leave the
//! rc-file / default value in place.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "netpulse", version, about = "Log public IP, active interface, MAC address and reachability on a fixed interval")]
pub struct Cli {
    /// Seconds between samples
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Append-only record file
    #[arg(short = 'o', long, value_name = "PATH", env = "NETPULSE_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Host to ping; an empty value disables the probe
    #[arg(short, long, value_name = "HOST")]
    pub target: Option<String>,

    /// Plain-text public IP echo service
    #[arg(long, value_name = "URL")]
    pub ip_lookup_url: Option<String>,

    /// Timeout for the public IP request
    #[arg(long, value_name = "MS")]
    pub http_timeout_ms: Option<u64>,

    /// Timeout for the reachability probe
    #[arg(long, value_name = "MS")]
    pub probe_timeout_ms: Option<u64>,

    /// rc file to read instead of the default location
    #[arg(short, long, value_name = "PATH", env = "NETPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Save the effective configuration to the rc file and exit
    #[arg(long)]
    pub write_config: bool,

    /// Take a single sample and exit
    #[arg(long)]
    pub once: bool,

    /// Diagnostics verbosity (error, warn, info, debug, trace); RUST_LOG wins when set
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "netpulse",
            "--interval",
            "5",
            "--log-file",
            "/tmp/net.log",
            "--target",
            "1.1.1.1",
            "--once",
        ])
        .unwrap();
        assert_eq!(cli.interval, Some(5));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/net.log")));
        assert_eq!(cli.target.as_deref(), Some("1.1.1.1"));
        assert!(cli.once);
        assert!(!cli.write_config);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn rejects_non_numeric_interval() {
        assert!(Cli::try_parse_from(["netpulse", "--interval", "soon"]).is_err());
    }
}
