//! Passive read of the kernel ARP cache with `arp`

use async_trait::async_trait;
use lanscan_core::{is_valid_ipv4, is_valid_mac, RawDevice, UNKNOWN_HOSTNAME};
use tracing::info;

use super::{check_status, DiscoveryStrategy, ScanContext, StrategyKind};
use crate::command::ToolCommand;
use crate::error::DiscoveryError;
use crate::platform::Platform;

const ARP: &str = "arp";

/// Lists the ARP cache; needs no privileges and sends no traffic
pub struct PassiveArpCache {
    ctx: ScanContext,
}

impl PassiveArpCache {
    pub fn new(ctx: ScanContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl DiscoveryStrategy for PassiveArpCache {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PassiveArpCache
    }

    async fn attempt(&self) -> Result<Vec<RawDevice>, DiscoveryError> {
        self.ctx.require_tool(ARP).await?;

        info!("Scanning network with arp cache");

        match self.ctx.platform {
            Platform::MacOs => {
                let output = self.ctx.run(&ToolCommand::new(ARP, ["-a"])).await?;
                check_status(ARP, &output, &[0])?;
                Ok(parse_bsd_arp_output(&output.stdout))
            }
            Platform::Linux => {
                let output = self.ctx.run(&ToolCommand::new(ARP, ["-n"])).await?;
                check_status(ARP, &output, &[0])?;
                let pairs = parse_linux_arp_output(&output.stdout);
                Ok(self.ctx.with_hostnames(pairs).await)
            }
        }
    }
}

/// Parse BSD-style `arp -a` output
///
/// ```text
/// router.lan (192.168.1.1) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]
/// ? (192.168.1.7) at 0:1b:63:84:45:e6 on en0 ifscope [ethernet]
/// ? (192.168.1.9) at (incomplete) on en0 ifscope [ethernet]
/// ```
///
/// The hostname column is optional; `?` means the name is unknown.
pub(crate) fn parse_bsd_arp_output(output: &str) -> Vec<RawDevice> {
    output.lines().filter_map(parse_bsd_arp_line).collect()
}

pub(crate) fn parse_bsd_arp_line(line: &str) -> Option<RawDevice> {
    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;
    let ip = &line[open + 1..close];

    let mut rest = line[close + 1..].split_whitespace();
    if rest.next()? != "at" {
        return None;
    }
    let mac = rest.next()?;

    if !is_valid_ipv4(ip) || !is_valid_mac(mac) {
        return None;
    }

    let hostname = match line[..open].trim() {
        "" | "?" => UNKNOWN_HOSTNAME,
        name => name,
    };

    Some(RawDevice::new(ip, mac, hostname))
}

/// Parse net-tools `arp -n` output into `(ip, mac)` pairs
///
/// ```text
/// Address                  HWtype  HWaddress           Flags Mask            Iface
/// 192.168.1.1              ether   aa:bb:cc:dd:ee:ff   C                     eth0
/// 192.168.1.7                      (incomplete)                              eth0
/// ```
pub(crate) fn parse_linux_arp_output(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let (ip, mac) = (*parts.first()?, *parts.get(2)?);
            (is_valid_ipv4(ip) && is_valid_mac(mac)).then(|| (ip.to_string(), mac.to_string()))
        })
        .collect()
}
