//! Default outbound interface and address resolution
//!
//! Lookups are best-effort. Any tool failure or unexpected output is logged
//! at debug level and reported as `None`; callers only lose the strategies
//! that need a network scope.

use lanscan_core::parse_ipv4;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::command::{CommandRunner, ToolCommand};
use crate::platform::Platform;

/// Public address used to ask the kernel for its outbound route
const ROUTE_PROBE_ADDR: &str = "8.8.8.8";

/// An interface and the IPv4 address bound to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub ip: Ipv4Addr,
}

impl InterfaceInfo {
    /// First three octets of the bound address, the `/24` scanned by a sweep
    pub fn prefix(&self) -> [u8; 3] {
        let [a, b, c, _] = self.ip.octets();
        [a, b, c]
    }
}

/// Resolves the default interface using the host's own tools
pub struct InterfaceResolver {
    platform: Platform,
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    enumerate_system: bool,
}

impl InterfaceResolver {
    pub fn new(platform: Platform, runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self {
            platform,
            runner,
            timeout,
            enumerate_system: true,
        }
    }

    /// Disable the last-resort enumeration of the host's interfaces
    pub fn without_system_enumeration(mut self) -> Self {
        self.enumerate_system = false;
        self
    }

    /// Name of the interface carrying the default route
    pub async fn default_interface(&self) -> Option<String> {
        let (query, parse): (ToolCommand, fn(&str) -> Option<String>) = match self.platform {
            Platform::MacOs => (
                ToolCommand::new("route", ["get", "default"]),
                parse_route_get_interface,
            ),
            Platform::Linux => (
                ToolCommand::new("ip", ["route", "get", ROUTE_PROBE_ADDR]),
                parse_ip_route_dev,
            ),
        };

        if let Some(name) = self.query(&query).await.as_deref().and_then(parse) {
            return Some(name);
        }

        let (listing, parse): (ToolCommand, fn(&str) -> Option<String>) = match self.platform {
            Platform::MacOs => (
                ToolCommand::new("networksetup", ["-listallhardwareports"]),
                parse_hardware_port_device,
            ),
            Platform::Linux => (
                ToolCommand::new("ip", ["link", "show", "up"]),
                parse_ip_link_first_non_loopback,
            ),
        };

        if let Some(name) = self.query(&listing).await.as_deref().and_then(parse) {
            return Some(name);
        }

        if self.enumerate_system {
            if let Some(iface) = first_system_interface() {
                return Some(iface.name);
            }
        }

        debug!("No default interface found");
        None
    }

    /// IPv4 address bound to an interface
    pub async fn interface_ipv4(&self, name: &str) -> Option<Ipv4Addr> {
        let (query, parse): (ToolCommand, fn(&str) -> Option<Ipv4Addr>) = match self.platform {
            Platform::MacOs => (
                ToolCommand::new("ipconfig", ["getifaddr", name]),
                parse_first_ipv4,
            ),
            Platform::Linux => (
                ToolCommand::new("ip", ["-4", "addr", "show", name]),
                parse_inet_address,
            ),
        };

        if let Some(ip) = self.query(&query).await.as_deref().and_then(parse) {
            return Some(ip);
        }

        if self.enumerate_system {
            if let Some(ip) = system_interface_ipv4(name) {
                return Some(ip);
            }
        }

        debug!(interface = %name, "No IPv4 address found for interface");
        None
    }

    /// Default interface together with its address
    pub async fn resolve(&self) -> Option<InterfaceInfo> {
        let name = self.default_interface().await?;
        let ip = self.interface_ipv4(&name).await?;
        Some(InterfaceInfo { name, ip })
    }

    /// Run a query and return its stdout, or `None` on any failure
    async fn query(&self, command: &ToolCommand) -> Option<String> {
        match self.runner.run_with_timeout(command, self.timeout).await {
            Ok(output) if output.success() => Some(output.stdout),
            Ok(output) => {
                debug!(command = %command, status = ?output.status, "Interface query failed");
                None
            }
            Err(e) => {
                debug!(command = %command, error = %e, "Interface query failed");
                None
            }
        }
    }
}

/// `route get default` on macOS: `   interface: en0`
fn parse_route_get_interface(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "interface")
            .then(|| value.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// `networksetup -listallhardwareports`: first `Device: en0` entry
fn parse_hardware_port_device(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let value = line.trim().strip_prefix("Device:")?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// `ip route get 8.8.8.8`: `8.8.8.8 via 192.168.1.1 dev eth0 src ...`
fn parse_ip_route_dev(output: &str) -> Option<String> {
    let parts: Vec<&str> = output.split_whitespace().collect();
    let dev_idx = parts.iter().position(|&p| p == "dev")?;
    parts.get(dev_idx + 1).map(|s| s.to_string())
}

/// `ip link show up`: first interface header not flagged LOOPBACK
///
/// Header lines look like `2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 ...`
/// and are followed by an indented `link/...` line.
fn parse_ip_link_first_non_loopback(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .filter(|line| !line.to_uppercase().contains("LOOPBACK"))
        .find_map(|line| {
            let name = line.split_whitespace().nth(1)?.trim_end_matches(':');
            let name = name.split('@').next()?;
            (!name.is_empty()).then(|| name.to_string())
        })
}

/// First IPv4 literal anywhere in the output (`ipconfig getifaddr en0`)
fn parse_first_ipv4(output: &str) -> Option<Ipv4Addr> {
    output.split_whitespace().find_map(parse_ipv4)
}

/// `ip -4 addr show eth0`: address following `inet`, without its prefix length
fn parse_inet_address(output: &str) -> Option<Ipv4Addr> {
    let parts: Vec<&str> = output.split_whitespace().collect();
    parts
        .windows(2)
        .filter(|pair| pair[0] == "inet")
        .find_map(|pair| parse_ipv4(pair[1].split('/').next()?))
}

/// Host interfaces with an IPv4 address, loopback and container bridges excluded
fn system_interfaces() -> Vec<InterfaceInfo> {
    use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};

    NetworkInterface::show()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|iface| {
            iface.addr.iter().find_map(|addr| match addr {
                Addr::V4(v4) => Some(InterfaceInfo {
                    name: iface.name.clone(),
                    ip: v4.ip,
                }),
                Addr::V6(_) => None,
            })
        })
        .filter(|iface| {
            !iface.name.starts_with("lo")
                && !iface.name.starts_with("docker")
                && !iface.name.starts_with("br-")
                && !iface.name.starts_with("veth")
                && !iface.ip.is_loopback()
        })
        .collect()
}

fn first_system_interface() -> Option<InterfaceInfo> {
    system_interfaces().into_iter().next()
}

fn system_interface_ipv4(name: &str) -> Option<Ipv4Addr> {
    system_interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .map(|iface| iface.ip)
}
