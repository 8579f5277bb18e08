//! Last-resort ping sweep of the local /24
//!
//! Every host address is probed one at a time, so a sweep costs up to 254
//! probe timeouts. Responders are then looked up individually in the ARP
//! cache, which the echo exchange has just populated.

use async_trait::async_trait;
use lanscan_core::{is_valid_mac, RawDevice};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, trace};

use super::{DiscoveryStrategy, ScanContext, StrategyKind};
use crate::command::ToolCommand;
use crate::error::{CommandError, DiscoveryError};
use crate::platform::Platform;

/// Extra time a probe may take beyond its echo wait before it is killed
const PROBE_GRACE: Duration = Duration::from_millis(500);

/// ICMP echo over every host of the default interface's /24
pub struct PingSweep {
    ctx: ScanContext,
    echo_wait: Duration,
}

impl PingSweep {
    /// `echo_wait` is how long `ping` waits for a reply
    pub fn new(ctx: ScanContext, echo_wait: Duration) -> Self {
        Self { ctx, echo_wait }
    }

    /// Hard bound on a single probe, even if `ping` itself hangs
    pub fn probe_timeout(&self) -> Duration {
        self.echo_wait + PROBE_GRACE
    }

    fn ping_command(&self, ip: Ipv4Addr) -> ToolCommand {
        let wait = match self.ctx.platform {
            // iputils takes whole seconds
            Platform::Linux => self.echo_wait.as_secs().max(1).to_string(),
            // BSD ping takes milliseconds
            Platform::MacOs => self.echo_wait.as_millis().max(1).to_string(),
        };
        ToolCommand::new("ping", ["-c".to_string(), "1".to_string(), "-W".to_string(), wait, ip.to_string()])
    }

    fn arp_lookup_command(&self, ip: Ipv4Addr) -> ToolCommand {
        let flag = match self.ctx.platform {
            Platform::MacOs => "-n",
            Platform::Linux => "-a",
        };
        ToolCommand::new("arp", [flag.to_string(), ip.to_string()])
    }

    /// Whether a single echo to `ip` is answered
    async fn probe(&self, ip: Ipv4Addr) -> bool {
        let command = self.ping_command(ip);
        match self.ctx.runner.run_with_timeout(&command, self.probe_timeout()).await {
            Ok(output) => output.success(),
            Err(CommandError::Timeout { .. }) => {
                trace!(ip = %ip, "Ping timed out");
                false
            }
            Err(e) => {
                debug!(ip = %ip, error = %e, "Ping failed");
                false
            }
        }
    }

    /// MAC for a responding host, from a single-address ARP lookup
    async fn lookup_mac(&self, ip: Ipv4Addr) -> Option<String> {
        let command = self.arp_lookup_command(ip);
        match self.ctx.runner.run_with_timeout(&command, self.ctx.command_timeout).await {
            Ok(output) => parse_arp_lookup(&output.stdout),
            Err(e) => {
                debug!(ip = %ip, error = %e, "ARP lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl DiscoveryStrategy for PingSweep {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PingSweep
    }

    async fn attempt(&self) -> Result<Vec<RawDevice>, DiscoveryError> {
        let iface = self
            .ctx
            .interfaces
            .resolve()
            .await
            .ok_or(DiscoveryError::InterfaceNotFound)?;

        let [a, b, c] = iface.prefix();
        info!(interface = %iface.name, "Performing ping sweep on network {}.{}.{}.0/24", a, b, c);

        let mut active = Vec::new();
        for host in 1..=254u8 {
            let ip = Ipv4Addr::new(a, b, c, host);
            if self.probe(ip).await {
                trace!(ip = %ip, "Host answered ping");
                active.push(ip);
            }
        }

        debug!("Ping sweep found {} active hosts", active.len());

        let mut pairs = Vec::with_capacity(active.len());
        for ip in active {
            match self.lookup_mac(ip).await {
                Some(mac) => pairs.push((ip.to_string(), mac)),
                None => debug!(ip = %ip, "No MAC in ARP cache for active host"),
            }
        }

        Ok(self.ctx.with_hostnames(pairs).await)
    }
}

/// Extract the MAC from a single-address `arp` lookup
///
/// Both platforms print `? (192.168.1.5) at aa:bb:cc:dd:ee:ff ...` for a hit.
pub(crate) fn parse_arp_lookup(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let at_idx = parts.iter().position(|&p| p == "at")?;
        let mac = parts.get(at_idx + 1)?;
        is_valid_mac(mac).then(|| mac.to_string())
    })
}
