//! Best-effort reverse DNS for discovered addresses

use async_trait::async_trait;
use lanscan_core::UNKNOWN_HOSTNAME;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::trace;

/// Resolves an address to a hostname, or `"Unknown"`
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    async fn resolve(&self, ip: Ipv4Addr) -> String;
}

/// Blocking reverse lookup run on tokio's blocking pool
type ReverseLookup = fn(&IpAddr) -> io::Result<String>;

/// Reverse lookup through the system resolver
#[derive(Debug, Clone)]
pub struct SystemHostnameResolver {
    timeout: Duration,
    lookup: ReverseLookup,
}

impl SystemHostnameResolver {
    pub fn new(timeout: Duration) -> Self {
        Self::with_lookup(timeout, dns_lookup::lookup_addr)
    }

    pub(crate) fn with_lookup(timeout: Duration, lookup: ReverseLookup) -> Self {
        Self { timeout, lookup }
    }
}

#[async_trait]
impl HostnameResolver for SystemHostnameResolver {
    async fn resolve(&self, ip: Ipv4Addr) -> String {
        let lookup = self.lookup;
        let lookup = tokio::task::spawn_blocking(move || lookup(&IpAddr::V4(ip)));

        let name = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(Ok(name))) => name,
            Ok(Ok(Err(e))) => {
                trace!(ip = %ip, error = %e, "Reverse lookup failed");
                return UNKNOWN_HOSTNAME.to_string();
            }
            Ok(Err(e)) => {
                trace!(ip = %ip, error = %e, "Reverse lookup task failed");
                return UNKNOWN_HOSTNAME.to_string();
            }
            Err(_) => {
                trace!(ip = %ip, "Reverse lookup timed out");
                return UNKNOWN_HOSTNAME.to_string();
            }
        };

        accept_hostname(ip, &name)
    }
}

/// Map a lookup result to the reported hostname
///
/// Resolvers echo the address back when there is no PTR record.
pub(crate) fn accept_hostname(ip: Ipv4Addr, name: &str) -> String {
    let name = name.trim().trim_end_matches('.');
    if name.is_empty() || name == ip.to_string() {
        UNKNOWN_HOSTNAME.to_string()
    } else {
        name.to_string()
    }
}
