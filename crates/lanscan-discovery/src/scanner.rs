//! Discovery scanner that runs the strategy chain

use chrono::Local;
use lanscan_core::{normalize, Device, RawDevice};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::DiscoveryError;
use crate::strategy::{
    DiscoveryStrategy, NeighborTable, PassiveArpCache, PingSweep, PrivilegedArpScan, ScanContext,
    StrategyKind,
};

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Whether the process may run privileged tools (arp-scan)
    pub privileged: bool,
    /// How long a single ping waits for an echo reply, in milliseconds
    pub probe_timeout_ms: u64,
    /// Upper bound for any other tool run, in seconds
    pub command_timeout_secs: u64,
    /// Upper bound for one reverse DNS lookup, in milliseconds
    pub hostname_timeout_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            privileged: false,
            probe_timeout_ms: 1000,
            command_timeout_secs: 30,
            hostname_timeout_ms: 2000,
        }
    }
}

/// Result of one scan cycle
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Canonical device list
    pub devices: Vec<Device>,
    /// Strategy whose results were used, if any produced devices
    pub strategy: Option<StrategyKind>,
}

/// Runs discovery strategies in priority order
///
/// The first strategy returning a non-empty list wins; later strategies are
/// not run. Strategy failures are logged and treated as empty results, so a
/// scan always produces a (possibly empty) device list.
pub struct DiscoveryScanner {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl DiscoveryScanner {
    /// Create the standard strategy chain for the context's platform
    pub fn from_context(config: &ScannerConfig, ctx: ScanContext) -> Self {
        let mut strategies: Vec<Box<dyn DiscoveryStrategy>> = vec![
            Box::new(PrivilegedArpScan::new(ctx.clone(), config.privileged)),
            Box::new(PassiveArpCache::new(ctx.clone())),
        ];
        if ctx.platform.has_neighbor_table() {
            strategies.push(Box::new(NeighborTable::new(ctx.clone())));
        }
        strategies.push(Box::new(PingSweep::new(
            ctx,
            Duration::from_millis(config.probe_timeout_ms),
        )));

        Self::with_strategies(strategies)
    }

    /// Create a scanner with an explicit strategy order
    pub fn with_strategies(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Strategy order this scanner will try
    pub fn strategy_order(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Run a single discovery scan and return the canonical device list
    pub async fn scan(&self) -> Vec<Device> {
        self.scan_report().await.devices
    }

    /// Run a single discovery scan, reporting which strategy was used
    pub async fn scan_report(&self) -> ScanReport {
        let mut raw: Vec<RawDevice> = Vec::new();
        let mut used = None;

        for strategy in &self.strategies {
            let kind = strategy.kind();
            match strategy.attempt().await {
                Ok(found) if !found.is_empty() => {
                    info!(strategy = %kind, found = found.len(), "Strategy found devices");
                    raw = found;
                    used = Some(kind);
                    break;
                }
                Ok(_) => debug!(strategy = %kind, "Strategy found no devices"),
                Err(e) => log_strategy_error(kind, &e),
            }
        }

        let devices = normalize(&raw, Local::now());
        if devices.len() < raw.len() {
            debug!(
                raw = raw.len(),
                kept = devices.len(),
                "Dropped invalid or duplicate records"
            );
        }

        ScanReport {
            devices,
            strategy: used,
        }
    }
}

fn log_strategy_error(kind: StrategyKind, e: &DiscoveryError) {
    match e {
        DiscoveryError::ExecutionFailure { .. } => {
            warn!(strategy = %kind, error = %e, "Strategy failed")
        }
        _ => debug!(strategy = %kind, reason = %e, "Strategy skipped"),
    }
}
