//! lanscan Discovery - Layered LAN device discovery
//!
//! This crate finds devices on the local IPv4 segment by running the host's
//! own networking tools and parsing their output:
//! - `arp-scan` when running privileged
//! - the kernel ARP cache via `arp`
//! - the neighbor table via `ip neigh` (Linux)
//! - a ping sweep of the local /24 as a last resort
//!
//! [`DiscoveryScanner`] tries these in order and normalizes the first
//! non-empty result.

pub mod command;
pub mod error;
pub mod hostname;
pub mod interface;
pub mod platform;
pub mod scanner;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner, ToolCommand};
pub use error::{CommandError, DiscoveryError};
pub use hostname::{HostnameResolver, SystemHostnameResolver};
pub use interface::{InterfaceInfo, InterfaceResolver};
pub use platform::Platform;
pub use scanner::{DiscoveryScanner, ScanReport, ScannerConfig};
pub use strategy::{DiscoveryStrategy, ScanContext, StrategyKind};
