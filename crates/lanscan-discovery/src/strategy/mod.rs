//! Discovery strategies
//!
//! Each strategy runs one platform tool and parses its text output into raw
//! device records. They are tried in a fixed order, cheapest and most
//! authoritative first:
//! - [`PrivilegedArpScan`]: `arp-scan --localnet`, needs root
//! - [`PassiveArpCache`]: the kernel ARP cache via `arp`
//! - [`NeighborTable`]: `ip neigh`, Linux only
//! - [`PingSweep`]: ICMP echo over the local /24, then per-host ARP lookup

mod arp_cache;
mod arp_scan;
mod neighbor;
mod ping_sweep;

pub use arp_cache::PassiveArpCache;
pub use arp_scan::PrivilegedArpScan;
pub use neighbor::NeighborTable;
pub use ping_sweep::PingSweep;

use async_trait::async_trait;
use lanscan_core::{parse_ipv4, RawDevice, UNKNOWN_HOSTNAME};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::command::{CommandOutput, CommandRunner, SystemCommandRunner, ToolCommand};
use crate::error::DiscoveryError;
use crate::hostname::{HostnameResolver, SystemHostnameResolver};
use crate::interface::InterfaceResolver;
use crate::platform::Platform;

/// Number of output lines logged at debug level per tool run
const OUTPUT_SAMPLE_LINES: usize = 5;

/// Identifies a discovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    PrivilegedArpScan,
    PassiveArpCache,
    NeighborTable,
    PingSweep,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyKind::PrivilegedArpScan => "arp-scan",
            StrategyKind::PassiveArpCache => "arp-cache",
            StrategyKind::NeighborTable => "ip-neigh",
            StrategyKind::PingSweep => "ping-sweep",
        };
        write!(f, "{}", name)
    }
}

/// One way of finding devices on the local segment
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Run the strategy once.
    ///
    /// `Err` explains why nothing was found (missing tool, no privilege,
    /// failed run) and is treated like an empty result by the scanner.
    async fn attempt(&self) -> Result<Vec<RawDevice>, DiscoveryError>;
}

/// Shared collaborators handed to every strategy
#[derive(Clone)]
pub struct ScanContext {
    pub platform: Platform,
    pub runner: Arc<dyn CommandRunner>,
    pub interfaces: Arc<InterfaceResolver>,
    pub hostnames: Arc<dyn HostnameResolver>,
    /// Upper bound on a single tool run (not ping probes)
    pub command_timeout: Duration,
}

impl ScanContext {
    /// Context backed by real processes and the system resolver
    pub fn system(platform: Platform, command_timeout: Duration, hostname_timeout: Duration) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
        let interfaces = InterfaceResolver::new(platform, runner.clone(), command_timeout);

        Self {
            platform,
            runner,
            interfaces: Arc::new(interfaces),
            hostnames: Arc::new(SystemHostnameResolver::new(hostname_timeout)),
            command_timeout,
        }
    }

    /// Run a tool under the context's command timeout, logging an output sample
    pub(crate) async fn run(&self, command: &ToolCommand) -> Result<CommandOutput, DiscoveryError> {
        debug!(command = %command, "Running command");
        let output = self
            .runner
            .run_with_timeout(command, self.command_timeout)
            .await?;

        let sample: Vec<&str> = output.stdout.lines().take(OUTPUT_SAMPLE_LINES).collect();
        debug!(tool = %command.program, status = ?output.status, sample = ?sample, "Command output");
        Ok(output)
    }

    /// Fail with `ToolUnavailable` unless `tool` is installed
    pub(crate) async fn require_tool(&self, tool: &str) -> Result<(), DiscoveryError> {
        if self.runner.is_available(tool).await {
            Ok(())
        } else {
            Err(DiscoveryError::ToolUnavailable(tool.to_string()))
        }
    }

    /// Attach reverse-resolved hostnames to `(ip, mac)` pairs
    pub(crate) async fn with_hostnames(&self, pairs: Vec<(String, String)>) -> Vec<RawDevice> {
        let mut devices = Vec::with_capacity(pairs.len());
        for (ip, mac) in pairs {
            let hostname = match parse_ipv4(&ip) {
                Some(addr) => self.hostnames.resolve(addr).await,
                None => UNKNOWN_HOSTNAME.to_string(),
            };
            devices.push(RawDevice::new(ip, mac, hostname));
        }
        devices
    }
}

/// Fail with `ExecutionFailure` unless the exit status is one of `accepted`
pub(crate) fn check_status(
    tool: &str,
    output: &CommandOutput,
    accepted: &[i32],
) -> Result<(), DiscoveryError> {
    match output.status {
        Some(code) if accepted.contains(&code) => Ok(()),
        status => Err(DiscoveryError::ExecutionFailure {
            tool: tool.to_string(),
            reason: format!(
                "exit status {}: {}",
                status.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                output.stderr.trim()
            ),
        }),
    }
}
