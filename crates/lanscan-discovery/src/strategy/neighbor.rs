//! Kernel neighbor table via `ip neigh show`

use async_trait::async_trait;
use lanscan_core::RawDevice;
use std::net::Ipv4Addr;
use tracing::{debug, info};

use super::{check_status, DiscoveryStrategy, ScanContext, StrategyKind};
use crate::command::ToolCommand;
use crate::error::DiscoveryError;

const IP: &str = "ip";

/// One IPv4 row of the neighbor table
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Neighbor {
    pub ip: Ipv4Addr,
    /// Link-layer address; absent for INCOMPLETE and FAILED rows
    pub mac: Option<String>,
    pub reachable: bool,
}

/// Reads `REACHABLE` entries from the neighbor table
///
/// Stale or incomplete entries are ignored even when they carry a MAC; the
/// host behind them may have left the network.
pub struct NeighborTable {
    ctx: ScanContext,
}

impl NeighborTable {
    pub fn new(ctx: ScanContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl DiscoveryStrategy for NeighborTable {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NeighborTable
    }

    async fn attempt(&self) -> Result<Vec<RawDevice>, DiscoveryError> {
        self.ctx.require_tool(IP).await?;

        info!("Scanning network with ip neigh");

        let output = self.ctx.run(&ToolCommand::new(IP, ["neigh", "show"])).await?;
        check_status(IP, &output, &[0])?;

        let neighbors = parse_ip_neigh_output(&output.stdout);
        debug!("Found {} neighbor entries", neighbors.len());

        let pairs = neighbors
            .into_iter()
            .filter(|n| n.reachable)
            .filter_map(|n| Some((n.ip.to_string(), n.mac?)))
            .collect();

        Ok(self.ctx.with_hostnames(pairs).await)
    }
}

pub(crate) fn parse_ip_neigh_output(output: &str) -> Vec<Neighbor> {
    output.lines().filter_map(parse_neighbor).collect()
}

/// `192.168.1.1 dev eth0 lladdr aa:bb:cc:dd:ee:ff router REACHABLE`
///
/// The state is always the final token. IPv6 rows and rows without a
/// `dev` clause are rejected.
fn parse_neighbor(line: &str) -> Option<Neighbor> {
    let mut tokens = line.split_whitespace();
    let ip: Ipv4Addr = tokens.next()?.parse().ok()?;

    let rest: Vec<&str> = tokens.collect();
    let state = *rest.last()?;
    if !rest.contains(&"dev") || state == "dev" {
        return None;
    }

    let mac = rest
        .windows(2)
        .find(|pair| pair[0] == "lladdr")
        .map(|pair| pair[1].to_string());

    Some(Neighbor {
        ip,
        mac,
        reachable: state.eq_ignore_ascii_case("REACHABLE"),
    })
}
