//! Active subnet scan with `arp-scan`

use async_trait::async_trait;
use lanscan_core::{is_valid_ipv4, is_valid_mac, RawDevice, UNKNOWN_HOSTNAME};
use tracing::info;

use super::{check_status, DiscoveryStrategy, ScanContext, StrategyKind};
use crate::command::ToolCommand;
use crate::error::DiscoveryError;

const ARP_SCAN: &str = "arp-scan";

/// Banner lines printed before the results
const HEADER_LINES: usize = 2;
/// Summary lines printed after the results
const FOOTER_LINES: usize = 3;

/// `arp-scan --localnet` on the default interface
pub struct PrivilegedArpScan {
    ctx: ScanContext,
    privileged: bool,
}

impl PrivilegedArpScan {
    pub fn new(ctx: ScanContext, privileged: bool) -> Self {
        Self { ctx, privileged }
    }
}

#[async_trait]
impl DiscoveryStrategy for PrivilegedArpScan {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PrivilegedArpScan
    }

    async fn attempt(&self) -> Result<Vec<RawDevice>, DiscoveryError> {
        if !self.privileged {
            return Err(DiscoveryError::InsufficientPrivilege);
        }
        self.ctx.require_tool(ARP_SCAN).await?;

        let interface = self
            .ctx
            .interfaces
            .default_interface()
            .await
            .ok_or(DiscoveryError::InterfaceNotFound)?;

        info!(interface = %interface, "Scanning network with arp-scan");

        let command = ToolCommand::new(ARP_SCAN, ["--interface", interface.as_str(), "--localnet"]);
        let output = self.ctx.run(&command).await?;

        // arp-scan exits 1 on some versions when hosts responded
        check_status(ARP_SCAN, &output, &[0, 1])?;

        Ok(parse_arp_scan_output(&output.stdout))
    }
}

/// Parse `arp-scan` output
///
/// ```text
/// Interface: eth0, type: EN10MB, MAC: 02:42:ac:11:00:02, IPv4: 192.168.1.10
/// Starting arp-scan 1.10.0 with 256 hosts (https://github.com/royhills/arp-scan)
/// 192.168.1.1     aa:bb:cc:dd:ee:ff       NETGEAR
///
/// 3 packets received by filter, 0 packets dropped by kernel
/// Ending arp-scan 1.10.0: 256 hosts scanned in 1.9 seconds (134.74 hosts/sec). 1 responded
/// ```
///
/// The footer is only stripped when there are more than five lines in total.
/// Lines without a valid IP and MAC in the first two columns are skipped.
pub(crate) fn parse_arp_scan_output(output: &str) -> Vec<RawDevice> {
    let lines: Vec<&str> = output.lines().collect();
    let end = if lines.len() > HEADER_LINES + FOOTER_LINES {
        lines.len() - FOOTER_LINES
    } else {
        lines.len()
    };

    lines
        .get(HEADER_LINES..end)
        .unwrap_or_default()
        .iter()
        .filter_map(|line| parse_arp_scan_line(line))
        .collect()
}

fn parse_arp_scan_line(line: &str) -> Option<RawDevice> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (ip, mac) = (*parts.first()?, *parts.get(1)?);

    if !is_valid_ipv4(ip) || !is_valid_mac(mac) {
        return None;
    }

    let hostname = if parts.len() > 2 {
        parts[2..].join(" ")
    } else {
        UNKNOWN_HOSTNAME.to_string()
    };

    Some(RawDevice::new(ip, mac, hostname))
}
