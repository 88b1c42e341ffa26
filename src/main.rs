//! netpulse: log public IP, active interface, MAC address and reachability
//! of this host on a fixed interval.
//!
//! Records go to stdout and an append-only file; diagnostics go to stderr.
//! Stop with Ctrl-C (or SIGTERM).

use anyhow::{Context, Result};
use clap::Parser;

use netpulse::cli::Cli;
use netpulse::config::{default_config_path, MonitorConfig};
use netpulse::monitor::{shutdown_signal, Monitor};
use netpulse::sink::{FileSink, SinkSet, StdoutSink};
use netpulse::system::collector::Sampler;
use netpulse::system::hardware_port::{HardwarePorts, NETWORKSETUP};
use netpulse::system::interfaces::SysinfoInterfaces;
use netpulse::system::probe::PingProbe;
use netpulse::system::public_ip::HttpIpLookup;
use netpulse::{logging, preflight};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = logging::init(&cli.log_level)
        .context("failed to set up logging")
        .and_then(|()| {
            // Single-threaded scheduler: one tick at a time, I/O interleaved
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(run(cli))
        });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Load settings, run start-up checks, then sample until a shutdown signal.
async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().or_else(default_config_path);
    let mut config = match &config_path {
        Some(path) => MonitorConfig::load_from(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    config.apply_cli(&cli);
    config.validate()?;

    if cli.write_config {
        let path = config_path.context("no config directory on this platform; pass --config")?;
        config.save_to(&path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let capabilities = preflight::required_capabilities(config.target().is_some());
    let found = preflight::check(&capabilities)?;

    let ip_lookup = HttpIpLookup::new(config.ip_lookup_url.clone(), config.http_timeout())?;
    tracing::debug!(url = ip_lookup.url(), "public IP lookup service");
    let probe = PingProbe::for_host_os(config.probe_timeout());
    let ports = HardwarePorts::new(found.has(NETWORKSETUP), config.probe_timeout());
    let mut sampler = Sampler::new(
        SysinfoInterfaces::new(config.probe_timeout()),
        ip_lookup,
        probe,
        ports,
        config.target().map(str::to_string),
    );
    sampler.ensure_interfaces()?;

    let file = FileSink::open(&config.log_file)?;
    let sinks = SinkSet::new().with(StdoutSink).with(file);
    let mut monitor = Monitor::new(sampler, sinks, config.interval());

    if cli.once {
        monitor.tick().await;
        return Ok(());
    }

    tracing::info!(
        interval_secs = config.interval_secs,
        log_file = %config.log_file.display(),
        host = config.target().unwrap_or("-"),
        "starting network monitoring"
    );
    monitor.run(shutdown_signal()).await;
    Ok(())
}
