//! The sampling loop: one sample per tick, written to every sink.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::sample::NetworkSample;
use crate::sink::SinkSet;
use crate::system::collector::Sampler;
use crate::system::interfaces::InterfaceSource;
use crate::system::probe::ReachabilityProbe;
use crate::system::public_ip::PublicIpSource;

/// Sampler/reporter loop
pub struct Monitor<I, L, P> {
    sampler: Sampler<I, L, P>,
    sinks: SinkSet,
    interval: Duration,
}

impl<I, L, P> Monitor<I, L, P>
where
    I: InterfaceSource,
    L: PublicIpSource,
    P: ReachabilityProbe,
{
    pub fn new(sampler: Sampler<I, L, P>, sinks: SinkSet, interval: Duration) -> Self {
        Self {
            sampler,
            sinks,
            interval,
        }
    }

    /// Take one sample and write its line to every sink.
    pub async fn tick(&mut self) -> NetworkSample {
        let sample = self.sampler.sample().await;
        let line = sample.to_line();
        let written = self.sinks.write_line(&line);
        if written < self.sinks.len() {
            tracing::debug!(written, total = self.sinks.len(), "record reached only some sinks");
        }
        sample
    }

    /// Tick until `shutdown` resolves; returns the number of ticks taken.
    ///
    /// The first tick fires immediately. A tick that overruns the interval
    /// delays the next one instead of overlapping it. Shutdown is observed
    /// between ticks.
    pub async fn run<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick().await;
                    ticks += 1;
                }
            }
        }
        tracing::info!(ticks, "monitoring stopped");
        ticks
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
